//! Recursive removal that tolerates missing paths.
//!
//! POSIX hosts use the native primitives. On Windows, read-only and in-use
//! files make `remove_dir_all` unreliable, so removal shells out to `cmd.exe`,
//! which needs `rmdir` for directories and `del` for files.

use crate::platform::PlatformIdentifiers;
use std::fs;
use std::io;
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// What a removal call found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    Removed,
    Absent,
}

/// A way of deleting a file or a whole directory tree.
pub trait RemoveAll {
    /// Delete `path`. A path that doesn't exist is `Ok(Removal::Absent)`;
    /// every other failure is an error.
    fn remove_all(&self, path: &Path) -> io::Result<Removal>;
}

impl<R: RemoveAll + ?Sized> RemoveAll for &R {
    fn remove_all(&self, path: &Path) -> io::Result<Removal> {
        (**self).remove_all(path)
    }
}

impl<R: RemoveAll + ?Sized> RemoveAll for Box<R> {
    fn remove_all(&self, path: &Path) -> io::Result<Removal> {
        (**self).remove_all(path)
    }
}

/// Stat without following symlinks; `None` when nothing is there.
fn existing_metadata(path: &Path) -> io::Result<Option<fs::Metadata>> {
    match fs::symlink_metadata(path) {
        Ok(metadata) => Ok(Some(metadata)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err),
    }
}

/// Standard library removal, for POSIX-like hosts.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeRemover;

impl RemoveAll for NativeRemover {
    fn remove_all(&self, path: &Path) -> io::Result<Removal> {
        let Some(metadata) = existing_metadata(path)? else {
            return Ok(Removal::Absent);
        };

        // A symlink to a directory is removed as a link, never followed
        let result = if metadata.is_dir() {
            fs::remove_dir_all(path)
        } else {
            fs::remove_file(path)
        };

        match result {
            Ok(()) => Ok(Removal::Removed),
            // Lost a race with something else deleting it
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Removal::Absent),
            Err(err) => Err(err),
        }
    }
}

/// `cmd.exe` mediated removal, for the Windows family.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellRemover;

/// What `cmd.exe` is asked to delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShellTarget {
    Tree,
    /// A symlink or junction to a directory. `del` would empty the target.
    DirLink,
    File,
}

impl ShellTarget {
    fn of(path: &Path, metadata: &fs::Metadata) -> Self {
        if metadata.is_dir() {
            ShellTarget::Tree
        } else if metadata.file_type().is_symlink()
            && fs::metadata(path).is_ok_and(|target| target.is_dir())
        {
            ShellTarget::DirLink
        } else {
            ShellTarget::File
        }
    }

    fn verb(self) -> &'static str {
        match self {
            ShellTarget::Tree | ShellTarget::DirLink => "rmdir",
            ShellTarget::File => "del",
        }
    }
}

impl ShellRemover {
    fn command(path: &Path, target: ShellTarget) -> Command {
        let mut cmd = Command::new("cmd.exe");
        match target {
            ShellTarget::Tree => cmd.args(["/C", "rmdir", "/Q", "/S"]),
            // Without /S only the link goes
            ShellTarget::DirLink => cmd.args(["/C", "rmdir", "/Q"]),
            ShellTarget::File => cmd.args(["/C", "del", "/Q", "/F", "/S"]),
        };
        cmd.arg(path);
        cmd
    }
}

impl RemoveAll for ShellRemover {
    fn remove_all(&self, path: &Path) -> io::Result<Removal> {
        let Some(metadata) = existing_metadata(path)? else {
            return Ok(Removal::Absent);
        };

        let target = ShellTarget::of(path, &metadata);
        let status = Self::command(path, target).status()?;
        if !status.success() {
            return Err(io::Error::other(format!(
                "cmd.exe {} exited with {status}",
                target.verb()
            )));
        }
        Ok(Removal::Removed)
    }
}

/// Reports removals without performing them.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunRemover;

impl RemoveAll for DryRunRemover {
    fn remove_all(&self, path: &Path) -> io::Result<Removal> {
        match existing_metadata(path)? {
            Some(_) => {
                println!("Would remove: {}", path.display());
                Ok(Removal::Removed)
            }
            None => Ok(Removal::Absent),
        }
    }
}

/// Pick the removal strategy for the host, once.
pub fn host_remover(platform: &PlatformIdentifiers) -> Box<dyn RemoveAll> {
    if platform.is_windows() {
        debug!("using cmd.exe removal for {}", platform);
        Box::new(ShellRemover)
    } else {
        debug!("using native removal for {}", platform);
        Box::new(NativeRemover)
    }
}
