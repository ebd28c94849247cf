use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    #[default]
    Unknown,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 5] = [
        Severity::Unknown,
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Unknown => "UNKNOWN",
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        }
    }
}

impl FromStr for Severity {
    type Err = ();

    /// Case-sensitive: `high` is not a severity.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Severity::ALL
            .into_iter()
            .find(|severity| severity.as_str() == s)
            .ok_or(())
    }
}

/// Severities Trivy reports but this crate does not know decode as
/// [`Severity::Unknown`].
impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(raw.parse().unwrap_or_default())
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VulnType {
    Os,
    Library,
}

impl VulnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VulnType::Os => "os",
            VulnType::Library => "library",
        }
    }
}

impl FromStr for VulnType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "os" => Ok(VulnType::Os),
            "library" => Ok(VulnType::Library),
            _ => Err(()),
        }
    }
}

/// Output format requested from Trivy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Structured records, used for issue bodies
    Json,
    /// Human-readable table, printed as-is
    #[default]
    Table,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Table => "table",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "table" => Ok(OutputFormat::Table),
            _ => Err(format!("Unknown format: {}. Use 'json' or 'table'", s)),
        }
    }
}

/// Options passed through to a single Trivy invocation.
///
/// `severity` and `vuln_type` are kept as the comma-joined strings the user
/// supplied so that validation errors can echo them back verbatim. Call
/// [`crate::validate::validate`] before handing one to the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOption {
    pub severity: String,
    pub vuln_type: String,
    pub ignore_unfixed: bool,
    pub format: OutputFormat,
    pub template: Option<PathBuf>,
}

impl ScanOption {
    pub fn new(severity: impl Into<String>, vuln_type: impl Into<String>, format: OutputFormat) -> Self {
        Self {
            severity: severity.into(),
            vuln_type: vuln_type.into(),
            ignore_unfixed: false,
            format,
            template: None,
        }
    }

    pub fn with_ignore_unfixed(mut self, ignore_unfixed: bool) -> Self {
        self.ignore_unfixed = ignore_unfixed;
        self
    }

    pub fn with_template(mut self, template: Option<PathBuf>) -> Self {
        self.template = template;
        self
    }
}
