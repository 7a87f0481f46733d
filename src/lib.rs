//! slimgo - Minimal Go Toolchain Builder
//!
//! slimgo clones the Go repository, builds it, then prunes the result down to
//! what is needed to compile and run Go programs.
//!
//! ## Pruning
//!
//! Pruning happens in two passes over the built tree:
//! - a static deny-list (`denylist.toml`) of paths relative to the tree root,
//!   with `{os}`/`{arch}` placeholders expanded for the host
//! - a scan of `src` for `testdata` directories and `_test.go` files
//!
//! Missing paths are skipped. The first path that exists but can't be removed
//! stops the run.

pub mod driver;
pub mod patterns;
pub mod platform;
pub mod prune;
pub mod remove;
pub mod scanner;

// Re-export commonly used items
pub use patterns::{DenyList, PatternGroup, RemovalPattern, ScanRules};
pub use platform::PlatformIdentifiers;
pub use prune::{PruneError, PruneReport, Pruner};
pub use remove::{host_remover, DryRunRemover, NativeRemover, Removal, RemoveAll, ShellRemover};
pub use scanner::{scan, ScanError, ScanPolicy, TestArtifacts};
