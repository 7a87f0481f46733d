//! Host platform identification in the Go build system's vocabulary.

use std::fmt;

/// The `(os, arch)` pair of the executing host, spelled the way GOOS and
/// GOARCH spell them (`linux`/`amd64`, `darwin`/`arm64`, `windows`/`386`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformIdentifiers {
    pub os: String,
    pub arch: String,
}

impl PlatformIdentifiers {
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            arch: arch.into(),
        }
    }

    /// Identify the host this process is running on.
    pub fn host() -> Self {
        Self::from_rust_target(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Translate Rust's target names into Go's.
    /// Names without a known translation pass through unchanged.
    pub fn from_rust_target(os: &str, arch: &str) -> Self {
        let os = match os {
            "macos" => "darwin",
            other => other,
        };
        let arch = match arch {
            "x86_64" => "amd64",
            "x86" => "386",
            "aarch64" => "arm64",
            "powerpc64" => "ppc64",
            "loongarch64" => "loong64",
            other => other,
        };
        // Go distinguishes little-endian ppc64; Rust reports it through target_endian.
        let arch = if arch == "ppc64" && cfg!(target_endian = "little") {
            "ppc64le"
        } else {
            arch
        };
        Self::new(os, arch)
    }

    /// Whether deletion on this host has to go through `cmd.exe`.
    pub fn is_windows(&self) -> bool {
        self.os == "windows"
    }
}

impl fmt::Display for PlatformIdentifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.os, self.arch)
    }
}
