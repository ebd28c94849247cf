//! Platform detection and default on-disk locations.

use crate::error::{Error, Result};
use std::path::PathBuf;

/// Platforms Trivy publishes 64-bit release archives for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux,
    MacOS,
}

impl Platform {
    /// Normalizes a raw OS identifier.
    ///
    /// `linux` maps to [`Platform::Linux`]; `darwin` (and `macos`, which is
    /// what `std::env::consts::OS` reports) map to [`Platform::MacOS`].
    ///
    /// # Example
    ///
    /// ```
    /// use trivy_issue::platform::Platform;
    ///
    /// assert_eq!(Platform::from_os("darwin").unwrap().as_str(), "macOS");
    /// assert!(Platform::from_os("windows").is_err());
    /// ```
    pub fn from_os(raw: &str) -> Result<Self> {
        match raw {
            "linux" => Ok(Platform::Linux),
            "darwin" | "macos" => Ok(Platform::MacOS),
            other => Err(Error::UnsupportedPlatform(other.to_string())),
        }
    }

    pub fn current() -> Result<Self> {
        Self::from_os(std::env::consts::OS)
    }

    /// The OS segment used in release asset filenames.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Linux => "Linux",
            Platform::MacOS => "macOS",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns the directory the trivy executable is cached in.
///
/// Platform-specific locations:
/// - Linux: `~/.cache/trivy-issue/bin/`
/// - macOS: `~/Library/Caches/trivy-issue/bin/`
///
/// Falls back to `/tmp/trivy-issue/bin/` if no cache directory can be determined.
pub fn default_bin_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("trivy-issue")
        .join("bin")
}
