use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
}

/// An issue as returned by the tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRecord {
    pub number: u64,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub labels: Vec<Label>,
    pub html_url: String,
    /// Present when the record is a pull request; the issues endpoint
    /// lists both.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull_request: Option<serde_json::Value>,
}

impl IssueRecord {
    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }
}

/// Content for a created or updated issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueOption {
    pub title: String,
    pub body: String,
    pub labels: Vec<String>,
    pub assignees: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueResponse {
    pub issue_number: u64,
    pub html_url: String,
}

impl From<&IssueRecord> for IssueResponse {
    fn from(issue: &IssueRecord) -> Self {
        Self {
            issue_number: issue.number,
            html_url: issue.html_url.clone(),
        }
    }
}
