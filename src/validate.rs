//! Fail-fast checks on a [`ScanOption`].
//!
//! Run before any download or subprocess so that a typo in the workflow
//! file is reported immediately.

use crate::error::{Error, Result};
use crate::model::{ScanOption, Severity, VulnType};
use std::str::FromStr;

/// Validates severities, vulnerability types and the template path.
///
/// On an unknown token the error carries every supplied token, not just
/// the offending one.
///
/// # Example
///
/// ```
/// use trivy_issue::model::{OutputFormat, ScanOption};
/// use trivy_issue::validate::validate;
///
/// let ok = ScanOption::new("HIGH,CRITICAL", "os", OutputFormat::Json);
/// assert!(validate(&ok).is_ok());
///
/// let bad = ScanOption::new("HIGH,SEVERE", "os", OutputFormat::Json);
/// assert!(validate(&bad).is_err());
/// ```
pub fn validate(option: &ScanOption) -> Result<()> {
    if !all_tokens_parse::<Severity>(&option.severity) {
        return Err(Error::InvalidSeverity(option.severity.clone()));
    }

    if !all_tokens_parse::<VulnType>(&option.vuln_type) {
        return Err(Error::InvalidVulnType(option.vuln_type.clone()));
    }

    if let Some(template) = &option.template {
        if !template.exists() {
            return Err(Error::TemplateNotFound(template.clone()));
        }
        if !template.is_file() {
            return Err(Error::TemplateNotFile(template.clone()));
        }
    }

    Ok(())
}

fn all_tokens_parse<T: FromStr>(csv: &str) -> bool {
    csv.split(',').all(|token| token.parse::<T>().is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::OutputFormat;
    use std::fs;

    fn option(severity: &str, vuln_type: &str) -> ScanOption {
        ScanOption::new(severity, vuln_type, OutputFormat::Json)
    }

    #[test]
    fn test_validate_accepts_every_severity_in_any_order() {
        let inputs = [
            "UNKNOWN",
            "LOW",
            "CRITICAL,HIGH",
            "HIGH,CRITICAL",
            "UNKNOWN,LOW,MEDIUM,HIGH,CRITICAL",
            "CRITICAL,MEDIUM,UNKNOWN,LOW,HIGH",
        ];
        for severity in inputs {
            assert!(validate(&option(severity, "os")).is_ok(), "{}", severity);
        }
    }

    #[test]
    fn test_validate_rejects_unknown_severity_and_lists_all_tokens() {
        let err = validate(&option("HIGH,SEVERE,LOW", "os")).unwrap_err();
        match err {
            Error::InvalidSeverity(tokens) => assert_eq!(tokens, "HIGH,SEVERE,LOW"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_validate_severity_is_case_sensitive() {
        assert!(matches!(
            validate(&option("high", "os")),
            Err(Error::InvalidSeverity(_))
        ));
    }

    #[test]
    fn test_validate_rejects_empty_severity() {
        assert!(matches!(
            validate(&option("", "os")),
            Err(Error::InvalidSeverity(_))
        ));
        assert!(matches!(
            validate(&option("HIGH,", "os")),
            Err(Error::InvalidSeverity(_))
        ));
    }

    #[test]
    fn test_validate_vuln_types() {
        for vuln_type in ["os", "library", "os,library", "library,os"] {
            assert!(validate(&option("HIGH", vuln_type)).is_ok(), "{}", vuln_type);
        }

        let err = validate(&option("HIGH", "library,binary")).unwrap_err();
        match err {
            Error::InvalidVulnType(tokens) => assert_eq!(tokens, "library,binary"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_validate_severity_checked_before_vuln_type() {
        assert!(matches!(
            validate(&option("NOPE", "nope")),
            Err(Error::InvalidSeverity(_))
        ));
    }

    #[test]
    fn test_validate_template_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.tpl");
        let opt = option("HIGH", "os").with_template(Some(missing.clone()));

        match validate(&opt).unwrap_err() {
            Error::TemplateNotFound(path) => assert_eq!(path, missing),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_validate_template_must_be_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let opt = option("HIGH", "os").with_template(Some(dir.path().to_path_buf()));

        assert!(matches!(validate(&opt), Err(Error::TemplateNotFile(_))));
    }

    #[test]
    fn test_validate_template_file_ok() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("html.tpl");
        fs::write(&template, "{{ range . }}{{ end }}").unwrap();

        let opt = option("HIGH", "os").with_template(Some(template));
        assert!(validate(&opt).is_ok());
    }
}
