//! Core data types for scan options, Trivy reports and issues.
//!
//! - [`ScanOption`] - What Trivy should look for
//! - [`Severity`] / [`VulnType`] - Allowed option tokens
//! - [`VulnerabilityReport`] - Decoded Trivy JSON output
//! - [`ScanOutput`] - Structured report or raw table text
//! - [`IssueRecord`] / [`IssueOption`] - Issue tracker payloads
//!
//! # Example
//!
//! ```
//! use trivy_issue::model::{OutputFormat, ScanOption};
//!
//! let option = ScanOption::new("HIGH,CRITICAL", "os,library", OutputFormat::Json);
//! assert_eq!(option.severity, "HIGH,CRITICAL");
//! ```

mod issue;
mod option;
mod report;

pub use issue::*;
pub use option::*;
pub use report::*;
