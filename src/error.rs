//! Error type shared by every stage of the scan pipeline.
//!
//! Each variant is terminal for the run: nothing in this crate retries.
//! The binary turns any of these into a non-zero exit code.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    // Configuration
    #[error("Trivy option error: {0} is unknown severity")]
    InvalidSeverity(String),

    #[error("Trivy option error: {0} is unknown vuln-type")]
    InvalidVulnType(String),

    #[error("Trivy option error: template file not found: {}", .0.display())]
    TemplateNotFound(PathBuf),

    #[error("Trivy option error: template is not a file: {}", .0.display())]
    TemplateNotFile(PathBuf),

    #[error("an image reference is required")]
    MissingImage,

    #[error("a GitHub token is required to create or update issues")]
    MissingToken,

    #[error("a repository (owner/name) is required to create or update issues")]
    MissingRepository,

    #[error("invalid repository '{0}', expected owner/name")]
    InvalidRepository(String),

    #[error("failed to parse config file: {0}")]
    Config(#[from] toml::de::Error),

    #[error("failed to write config file: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    // Platform
    #[error("{0} is not supported")]
    UnsupportedPlatform(String),

    // Release resolution
    #[error("could not find trivy asset for version {version} and os {os}")]
    AssetNotFound { version: String, os: String },

    // Download / extraction
    #[error("failed to download {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to extract trivy into {}", .0.display())]
    ExtractionFailed(PathBuf),

    // Scan
    #[error("failed to parse trivy output: {0}")]
    ScanOutputParse(#[source] serde_json::Error),

    #[error("scan task failed: {0}")]
    ScanTask(#[from] tokio::task::JoinError),

    #[error("trivy produced no result\nstdout: {stdout}\nstderr: {stderr}\nerror: {}", .error.as_deref().unwrap_or("none"))]
    EmptyScanOutput {
        stdout: String,
        stderr: String,
        error: Option<String>,
    },

    // Issue tracker
    #[error("GitHub API returned {status}: {body}")]
    GitHubApi { status: u16, body: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn github_status(status: reqwest::StatusCode, body: String) -> Self {
        Self::GitHubApi {
            status: status.as_u16(),
            body,
        }
    }
}
