//! Markdown rendering of a Trivy report, used as the issue body.

use crate::model::{Finding, TargetResult, VulnerabilityReport};

const NOT_AVAILABLE: &str = "N/A";
const TABLE_HEADER: &str =
    "|Title|Severity|CVE|Package Name|Installed Version|Fixed Version|References|";
const TABLE_ALIGNMENT: &str = "|:--:|:--:|:--:|:--:|:--:|:--:|:--|";
const REFERENCE_SEPARATOR: &str = "<br>";

/// Renders one section per target that has findings.
///
/// Returns an empty string when no target has findings; callers treat that
/// as "nothing to report".
///
/// # Example
///
/// ```
/// use trivy_issue::model::{TargetResult, VulnerabilityReport};
/// use trivy_issue::output::format_markdown;
///
/// let clean = VulnerabilityReport::new(vec![TargetResult::new("alpine:3.10", None)]);
/// assert_eq!(format_markdown("alpine:3.10", &clean), "");
/// ```
pub fn format_markdown(image: &str, report: &VulnerabilityReport) -> String {
    let sections: Vec<String> = report.results.iter().filter_map(target_section).collect();

    if sections.is_empty() {
        return String::new();
    }

    format!(
        "_Vulnerabilities found in image: `{}`_\n\n{}",
        image,
        sections.join("\n")
    )
}

fn target_section(result: &TargetResult) -> Option<String> {
    let findings = result.vulnerabilities.as_ref()?;

    let mut section = format!("## {}\n{}\n{}\n", result.target, TABLE_HEADER, TABLE_ALIGNMENT);
    for finding in findings {
        section.push_str(&finding_row(finding));
        section.push('\n');
    }
    Some(section)
}

fn finding_row(finding: &Finding) -> String {
    let references = finding
        .references
        .as_deref()
        .filter(|refs| !refs.is_empty())
        .map(|refs| {
            refs.iter()
                .map(|r| cell(Some(r.as_str())))
                .collect::<Vec<_>>()
                .join(REFERENCE_SEPARATOR)
        })
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    format!(
        "|{}|{}|{}|{}|{}|{}|{}|",
        cell(finding.title.as_deref()),
        cell(Some(finding.severity.as_str())),
        cell(Some(finding.vulnerability_id.as_str())),
        cell(Some(finding.pkg_name.as_str())),
        cell(Some(finding.installed_version.as_str())),
        cell(finding.fixed_version.as_deref()),
        references,
    )
}

/// Table cell text: `N/A` for missing or blank values, pipes escaped and
/// line breaks flattened so a value cannot split the row.
fn cell(value: Option<&str>) -> String {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => v.replace('|', "\\|").replace(['\r', '\n'], " "),
        None => NOT_AVAILABLE.to_string(),
    }
}
