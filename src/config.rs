//! Configuration file handling.
//!
//! Settings come from three layers, later ones winning: built-in defaults,
//! a TOML file, and command-line flags (which GitHub Actions feeds through
//! `INPUT_*` environment variables). The binary assembles a [`Config`]
//! once at startup; library code only ever receives it by reference.
//!
//! # Configuration Location
//!
//! The configuration file is stored at:
//! - Linux: `~/.config/trivy-issue/config.toml`
//! - macOS: `~/Library/Application Support/trivy-issue/config.toml`
//!
//! # Example Configuration
//!
//! ```toml
//! trivy_version = "latest"
//! severity = "HIGH,CRITICAL"
//! vuln_type = "os,library"
//! ignore_unfixed = false
//!
//! [issue]
//! enabled = true
//! title = "Security Alert"
//! labels = ["trivy", "vulnerability"]
//! assignees = []
//! ```

use crate::error::Result;
use crate::github::DEFAULT_API_URL;
use crate::model::{OutputFormat, ScanOption};
use crate::platform::default_bin_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Application configuration.
///
/// # Example
///
/// ```no_run
/// use trivy_issue::Config;
///
/// // Load from file (or use defaults if file doesn't exist)
/// let config = Config::load().unwrap();
///
/// println!("Trivy version: {}", config.trivy_version);
/// println!("Severity: {}", config.severity);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Trivy release to run: an exact version such as `0.18.3`, or `latest`.
    ///
    /// Default: "latest"
    pub trivy_version: String,

    /// Comma-separated severities to report.
    ///
    /// Default: "HIGH,CRITICAL"
    pub severity: String,

    /// Comma-separated vulnerability types (`os`, `library`).
    ///
    /// Default: "os,library"
    pub vuln_type: String,

    /// Skip vulnerabilities that have no fixed version yet.
    pub ignore_unfixed: bool,

    /// Trivy output template, passed as `--template @<path>`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<PathBuf>,

    /// Where the trivy executable is cached between runs.
    ///
    /// Default: the platform cache directory (see [`default_bin_dir`]).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bin_dir: Option<PathBuf>,

    /// GitHub REST API base URL.
    ///
    /// Default: "https://api.github.com"
    pub api_url: String,

    /// Exit non-zero when the report contains findings.
    pub fail_on_vulnerabilities: bool,

    /// Issue creation settings.
    pub issue: IssueConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IssueConfig {
    /// Open or update a GitHub issue instead of printing a status report.
    ///
    /// Default: true
    pub enabled: bool,

    /// Title used when a new issue is created.
    pub title: String,

    /// Labels applied to new issues, also used to find existing ones.
    pub labels: Vec<String>,

    pub assignees: Vec<String>,
}

impl Default for IssueConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            title: "Security Alert".to_string(),
            labels: vec!["trivy".to_string(), "vulnerability".to_string()],
            assignees: Vec::new(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            trivy_version: "latest".to_string(),
            severity: "HIGH,CRITICAL".to_string(),
            vuln_type: "os,library".to_string(),
            ignore_unfixed: false,
            template: None,
            bin_dir: None,
            api_url: DEFAULT_API_URL.to_string(),
            fail_on_vulnerabilities: false,
            issue: IssueConfig::default(),
        }
    }
}

impl Config {
    /// Loads configuration from the default config file.
    ///
    /// If the config file doesn't exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Loads configuration from `path`, falling back to defaults when the
    /// file is absent.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Saves the configuration to `path`.
    ///
    /// Creates the parent directory if it doesn't exist.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Returns the path to the configuration file.
    ///
    /// # Example
    ///
    /// ```
    /// use trivy_issue::Config;
    ///
    /// let path = Config::config_path();
    /// assert!(path.ends_with("trivy-issue/config.toml"));
    /// ```
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("trivy-issue")
            .join("config.toml")
    }

    /// Generates a string containing the default configuration.
    pub fn generate_default_config() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }

    /// Directory the trivy executable lives in.
    pub fn bin_dir(&self) -> PathBuf {
        self.bin_dir.clone().unwrap_or_else(default_bin_dir)
    }

    /// Scan options derived from this configuration.
    ///
    /// Issue mode needs structured records, so it always asks for JSON;
    /// status reports use the human-readable table.
    pub fn scan_option(&self) -> ScanOption {
        let format = if self.issue.enabled {
            OutputFormat::Json
        } else {
            OutputFormat::Table
        };
        ScanOption::new(&self.severity, &self.vuln_type, format)
            .with_ignore_unfixed(self.ignore_unfixed)
            .with_template(self.template.clone())
    }
}

/// Splits a comma-separated input such as `trivy,vulnerability`, dropping
/// blanks.
pub fn parse_list(csv: &str) -> Vec<String> {
    csv.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
