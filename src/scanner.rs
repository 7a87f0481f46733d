//! Test artifact discovery under a source tree.

use crate::patterns::ScanRules;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("scan root {} is not accessible", path.display())]
    Root {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("scan root {} is not a directory", path.display())]
    NotADirectory { path: PathBuf },

    #[error("walking {}", path.display())]
    Entry {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// How the walk treats I/O errors on individual entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanPolicy {
    /// Skip unreadable entries and keep walking instead of yielding the error.
    pub ignore_entry_errors: bool,
}

impl ScanPolicy {
    /// Cleanup is advisory: an unreadable entry is left behind.
    pub const BEST_EFFORT: Self = Self {
        ignore_entry_errors: true,
    };
    pub const STRICT: Self = Self {
        ignore_entry_errors: false,
    };
}

impl Default for ScanPolicy {
    fn default() -> Self {
        Self::BEST_EFFORT
    }
}

/// Lazy, one-shot sequence of test artifact paths.
///
/// Test data directories are yielded once and never descended into, so
/// nothing inside them is yielded separately.
pub struct TestArtifacts {
    walker: walkdir::IntoIter,
    rules: ScanRules,
    policy: ScanPolicy,
    root: PathBuf,
    excluded: Vec<PathBuf>,
}

/// Start a depth-first scan of `root`.
///
/// Only a root that can't be opened fails here; later problems surface per
/// entry according to `policy`.
pub fn scan(
    root: &Path,
    rules: &ScanRules,
    policy: ScanPolicy,
) -> Result<TestArtifacts, ScanError> {
    let metadata = fs::metadata(root).map_err(|source| ScanError::Root {
        path: root.to_path_buf(),
        source,
    })?;
    if !metadata.is_dir() {
        return Err(ScanError::NotADirectory {
            path: root.to_path_buf(),
        });
    }

    Ok(TestArtifacts {
        walker: WalkDir::new(root).follow_links(false).into_iter(),
        rules: rules.clone(),
        policy,
        root: root.to_path_buf(),
        excluded: Vec::new(),
    })
}

impl TestArtifacts {
    /// Leave out `paths` and everything beneath them.
    pub fn excluding(mut self, paths: impl IntoIterator<Item = PathBuf>) -> Self {
        self.excluded.extend(paths);
        self
    }

    fn is_excluded(&self, entry: &walkdir::DirEntry) -> bool {
        self.excluded.iter().any(|path| entry.path().starts_with(path))
    }

    fn is_marker_dir(&self, entry: &walkdir::DirEntry) -> bool {
        entry.file_type().is_dir()
            && entry.file_name().to_str() == Some(self.rules.marker.as_str())
    }

    fn is_test_source(&self, entry: &walkdir::DirEntry) -> bool {
        entry.file_type().is_file()
            && entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.ends_with(self.rules.suffix.as_str()))
    }
}

impl Iterator for TestArtifacts {
    type Item = Result<PathBuf, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.walker.next()? {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| self.root.clone());
                    if self.policy.ignore_entry_errors {
                        debug!("skipping unreadable entry {}: {}", path.display(), err);
                        continue;
                    }
                    return Some(Err(ScanError::Entry { path, source: err }));
                }
            };

            if self.is_excluded(&entry) {
                if entry.file_type().is_dir() {
                    self.walker.skip_current_dir();
                }
                continue;
            }
            if self.is_marker_dir(&entry) {
                self.walker.skip_current_dir();
                return Some(Ok(entry.into_path()));
            }
            if self.is_test_source(&entry) {
                return Some(Ok(entry.into_path()));
            }
        }
    }
}
