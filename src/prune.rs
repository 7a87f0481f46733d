//! Removal plan execution: the static deny-list first, then the test artifact scan.

use crate::patterns::DenyList;
use crate::platform::PlatformIdentifiers;
use crate::remove::{Removal, RemoveAll};
use crate::scanner::{scan, ScanError, ScanPolicy};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum PruneError {
    #[error("removing {}", path.display())]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("looking for test data")]
    Scan(#[from] ScanError),
}

impl PruneError {
    /// The path the failure is about.
    pub fn path(&self) -> &Path {
        match self {
            PruneError::Remove { path, .. } => path.as_path(),
            PruneError::Scan(
                ScanError::Root { path, .. }
                | ScanError::NotADirectory { path }
                | ScanError::Entry { path, .. },
            ) => path.as_path(),
        }
    }
}

/// Counts from a finished run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PruneReport {
    pub static_removed: usize,
    pub static_absent: usize,
    pub test_artifacts_removed: usize,
}

/// Prunes one built tree. Any failure ends the run; nothing is rolled back.
pub struct Pruner<'a, R> {
    root: PathBuf,
    platform: PlatformIdentifiers,
    denylist: &'a DenyList,
    remover: R,
    keep: Vec<String>,
    policy: ScanPolicy,
}

impl<'a, R: RemoveAll> Pruner<'a, R> {
    pub fn new(
        root: impl Into<PathBuf>,
        platform: PlatformIdentifiers,
        denylist: &'a DenyList,
        remover: R,
    ) -> Self {
        Self {
            root: root.into(),
            platform,
            denylist,
            remover,
            keep: Vec::new(),
            policy: ScanPolicy::BEST_EFFORT,
        }
    }

    /// Preserve the named optional groups. Names are expected to have passed
    /// [`DenyList::check_keep`].
    pub fn keep(mut self, groups: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.keep = groups.into_iter().map(Into::into).collect();
        self
    }

    pub fn scan_policy(mut self, policy: ScanPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Every static path this run would remove, in order.
    pub fn static_plan(&self) -> Vec<PathBuf> {
        self.denylist
            .active_groups(&self.keep)
            .flat_map(|group| group.patterns.iter())
            .map(|pattern| pattern.resolve(&self.root, &self.platform))
            .collect()
    }

    pub fn scan_root(&self) -> PathBuf {
        let mut path = self.root.clone();
        let segments = self.denylist.scan.root.split('/');
        for segment in segments.filter(|s| !s.is_empty() && *s != ".") {
            path.push(segment);
        }
        path
    }

    pub fn run(&self) -> Result<PruneReport, PruneError> {
        let mut report = PruneReport::default();
        let mut removed = Vec::new();

        for group in self.denylist.active_groups(&self.keep) {
            if group.uncertain {
                warn!(
                    "removing '{}', which may still be needed; pass --keep {} to preserve it",
                    group.name, group.name
                );
            }
            debug!("removing group '{}'", group.name);
            for pattern in &group.patterns {
                let path = pattern.resolve(&self.root, &self.platform);
                match self.remove(&path)? {
                    Removal::Removed => {
                        report.static_removed += 1;
                        removed.push(path);
                    }
                    Removal::Absent => report.static_absent += 1,
                }
            }
        }
        info!(
            "removed {} static paths ({} already absent)",
            report.static_removed, report.static_absent
        );

        let scan_root = self.scan_root();
        info!("looking for test data under {}", scan_root.display());
        // Collect before deleting so the walk never sees its own removals.
        // Statically removed paths are skipped even when they are still on
        // disk, as in a dry run.
        let found = scan(&scan_root, &self.denylist.scan, self.policy)?
            .excluding(removed)
            .collect::<Result<Vec<_>, _>>()?;

        for path in found {
            if self.remove(&path)? == Removal::Removed {
                report.test_artifacts_removed += 1;
            }
        }
        info!("removed {} test artifacts", report.test_artifacts_removed);

        Ok(report)
    }

    fn remove(&self, path: &Path) -> Result<Removal, PruneError> {
        match self.remover.remove_all(path) {
            Ok(removal) => {
                if removal == Removal::Removed {
                    debug!("removed {}", path.display());
                }
                Ok(removal)
            }
            Err(source) => Err(PruneError::Remove {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}
