//! Fetching and building the toolchain source tree.
//!
//! Both steps inherit stdout/stderr so git and the build script report
//! progress directly. No timeouts: a hung clone or build hangs the run.

use crate::platform::PlatformIdentifiers;
use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Canonical upstream repository.
pub const DEFAULT_REPO: &str = "https://go.googlesource.com/go";

/// Directory inside the checkout holding the build scripts.
pub const SOURCE_DIR: &str = "src";

/// Refuse to touch a destination that already exists, even as a dangling symlink.
pub fn ensure_absent(dest: &Path) -> Result<()> {
    if fs::symlink_metadata(dest).is_ok() {
        bail!("destination {} already exists; won't overwrite", dest.display());
    }
    Ok(())
}

fn clone_command(repo: &str, dest: &Path) -> Command {
    let mut cmd = Command::new("git");
    cmd.arg("clone").arg(repo).arg(dest);
    cmd
}

/// Clone `repo` into `dest`.
pub fn clone(repo: &str, dest: &Path) -> Result<()> {
    let mut cmd = clone_command(repo, dest);
    debug!("running {:?}", cmd);
    let status = cmd
        .status()
        .with_context(|| format!("cloning {repo}: failed to run git"))?;
    if !status.success() {
        bail!("cloning {}: git exited with {}", repo, status);
    }
    Ok(())
}

/// The build entry point and the directory it runs in.
fn build_command(dest: &Path, platform: &PlatformIdentifiers) -> Command {
    // Windows resolves a relative program against our cwd, not the child's
    let mut cmd = if platform.is_windows() {
        let mut cmd = Command::new("cmd.exe");
        cmd.args(["/C", "make.bat"]);
        cmd
    } else {
        Command::new("./make.bash")
    };
    cmd.current_dir(source_dir(dest));
    cmd
}

pub fn source_dir(dest: &Path) -> PathBuf {
    dest.join(SOURCE_DIR)
}

/// Run the platform build script inside `dest/src`.
pub fn build(dest: &Path, platform: &PlatformIdentifiers) -> Result<()> {
    let src = source_dir(dest);
    let mut cmd = build_command(dest, platform);
    debug!("running {:?} in {}", cmd, src.display());
    let status = cmd.status().with_context(|| {
        format!(
            "building toolchain in {}: failed to start build script",
            src.display()
        )
    })?;
    if !status.success() {
        bail!(
            "building toolchain in {}: build script exited with {}",
            src.display(),
            status
        );
    }
    Ok(())
}
