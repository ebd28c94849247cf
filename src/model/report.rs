use super::Severity;
use serde::{Deserialize, Serialize};

/// A single vulnerability reported by Trivy.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Finding {
    #[serde(rename = "VulnerabilityID", default)]
    pub vulnerability_id: String,
    #[serde(default)]
    pub pkg_name: String,
    #[serde(default)]
    pub installed_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub references: Option<Vec<String>>,
}

/// Findings for one scan target (an OS layer or a lockfile).
///
/// `vulnerabilities` is `None` when Trivy found nothing for the target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetResult {
    #[serde(rename = "Target")]
    pub target: String,
    #[serde(rename = "Type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(rename = "Vulnerabilities", default)]
    pub vulnerabilities: Option<Vec<Finding>>,
}

impl TargetResult {
    pub fn new(target: impl Into<String>, vulnerabilities: Option<Vec<Finding>>) -> Self {
        Self {
            target: target.into(),
            kind: None,
            vulnerabilities,
        }
    }
}

/// Decoded `trivy --format json` output, in target order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct VulnerabilityReport {
    pub results: Vec<TargetResult>,
}

/// Trivy has emitted two JSON layouts: a bare array of targets, and
/// (schema version 2 onwards) an object wrapping them in `Results`.
#[derive(Deserialize)]
#[serde(untagged)]
enum TrivyJson {
    Legacy(Vec<TargetResult>),
    Schema {
        #[serde(rename = "Results", default)]
        results: Option<Vec<TargetResult>>,
    },
}

impl VulnerabilityReport {
    pub fn new(results: Vec<TargetResult>) -> Self {
        Self { results }
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        let results = match serde_json::from_str::<TrivyJson>(text)? {
            TrivyJson::Legacy(results) => results,
            TrivyJson::Schema { results } => results.unwrap_or_default(),
        };
        Ok(Self { results })
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Total number of findings across all targets.
    pub fn finding_count(&self) -> usize {
        self.results
            .iter()
            .filter_map(|r| r.vulnerabilities.as_ref())
            .map(Vec::len)
            .sum()
    }
}

/// What a Trivy run produced, depending on the requested format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutput {
    Structured(VulnerabilityReport),
    Raw(String),
}
