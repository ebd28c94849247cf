//! Invoke the trivy executable against a container image.

use crate::error::{Error, Result};
use crate::model::{OutputFormat, ScanOption, ScanOutput, VulnerabilityReport};
use crate::validate::validate;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

pub struct Trivy {
    path: PathBuf,
}

impl Trivy {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Scans `image` and decodes the result according to `option.format`.
    ///
    /// Blocks until trivy exits. The exit status is not inspected on its
    /// own: a run counts as failed only when it yields no usable output.
    pub fn scan(&self, image: &str, option: &ScanOption) -> Result<ScanOutput> {
        validate(option)?;

        let args = build_args(image, option);
        info!(image, format = option.format.as_str(), "scanning image");
        debug!(path = %self.path.display(), ?args, "running trivy");

        let (stdout, stderr, error) = match Command::new(&self.path).args(&args).output() {
            Ok(output) => {
                let error = (!output.status.success()).then(|| output.status.to_string());
                (
                    String::from_utf8_lossy(&output.stdout).into_owned(),
                    String::from_utf8_lossy(&output.stderr).into_owned(),
                    error,
                )
            }
            Err(e) => (String::new(), String::new(), Some(e.to_string())),
        };

        interpret(option.format, stdout, stderr, error)
    }
}

/// Command-line arguments for a scan, image last.
pub fn build_args(image: &str, option: &ScanOption) -> Vec<String> {
    let mut args = vec![
        "--severity".to_string(),
        option.severity.clone(),
        "--vuln-type".to_string(),
        option.vuln_type.clone(),
        "--format".to_string(),
        option.format.as_str().to_string(),
        "--quiet".to_string(),
        "--no-progress".to_string(),
    ];

    if option.ignore_unfixed {
        args.push("--ignore-unfixed".to_string());
    }

    if let Some(template) = &option.template {
        args.push("--template".to_string());
        args.push(format!("@{}", template.display()));
    }

    args.push(image.to_string());
    args
}

/// Turns captured process output into a [`ScanOutput`].
///
/// `error` is any process-level failure (spawn error or non-zero exit);
/// it is only surfaced when there is nothing else to return.
pub fn interpret(
    format: OutputFormat,
    stdout: String,
    stderr: String,
    error: Option<String>,
) -> Result<ScanOutput> {
    if !stdout.trim().is_empty() {
        let output = match format {
            OutputFormat::Json => ScanOutput::Structured(
                VulnerabilityReport::from_json(&stdout).map_err(Error::ScanOutputParse)?,
            ),
            OutputFormat::Table => ScanOutput::Raw(stdout.clone()),
        };

        let empty = match &output {
            ScanOutput::Structured(report) => report.is_empty(),
            ScanOutput::Raw(text) => text.trim().is_empty(),
        };
        if !empty {
            return Ok(output);
        }
    }

    Err(Error::EmptyScanOutput {
        stdout,
        stderr,
        error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = r#"[{"Target":"alpine:3.10 (alpine 3.10.9)","Vulnerabilities":null}]"#;

    #[test]
    fn test_build_args_order() {
        let option = ScanOption::new("HIGH,CRITICAL", "os,library", OutputFormat::Json);
        assert_eq!(
            build_args("alpine:3.10", &option),
            vec![
                "--severity",
                "HIGH,CRITICAL",
                "--vuln-type",
                "os,library",
                "--format",
                "json",
                "--quiet",
                "--no-progress",
                "alpine:3.10",
            ]
        );
    }

    #[test]
    fn test_build_args_optional_flags() {
        let option = ScanOption::new("LOW", "os", OutputFormat::Table)
            .with_ignore_unfixed(true)
            .with_template(Some(PathBuf::from("contrib/html.tpl")));
        let args = build_args("nginx:latest", &option);

        assert_eq!(args[5], "table");
        assert_eq!(
            &args[8..],
            &["--ignore-unfixed", "--template", "@contrib/html.tpl", "nginx:latest"]
        );
    }

    #[test]
    fn test_interpret_json() {
        let output = interpret(OutputFormat::Json, REPORT.to_string(), String::new(), None).unwrap();
        match output {
            ScanOutput::Structured(report) => assert_eq!(report.results.len(), 1),
            other => panic!("unexpected output: {other:?}"),
        }
    }

    #[test]
    fn test_interpret_table_is_verbatim() {
        let table = "alpine:3.10 (alpine 3.10.9)\n===\nTotal: 0\n".to_string();
        let output = interpret(OutputFormat::Table, table.clone(), String::new(), None).unwrap();
        assert_eq!(output, ScanOutput::Raw(table));
    }

    #[test]
    fn test_interpret_invalid_json() {
        let err = interpret(OutputFormat::Json, "FATAL error".to_string(), String::new(), None)
            .unwrap_err();
        assert!(matches!(err, Error::ScanOutputParse(_)));
    }

    #[test]
    fn test_interpret_empty_stdout_reports_diagnostics() {
        let err = interpret(
            OutputFormat::Json,
            String::new(),
            "unable to initialize a scanner".to_string(),
            Some("exit status: 1".to_string()),
        )
        .unwrap_err();

        match &err {
            Error::EmptyScanOutput { stderr, error, .. } => {
                assert_eq!(stderr, "unable to initialize a scanner");
                assert_eq!(error.as_deref(), Some("exit status: 1"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("unable to initialize a scanner"));
    }

    #[test]
    fn test_interpret_empty_report() {
        let err = interpret(OutputFormat::Json, "[]".to_string(), String::new(), None).unwrap_err();
        match err {
            Error::EmptyScanOutput { stdout, .. } => assert_eq!(stdout, "[]"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_scan_revalidates_option() {
        let trivy = Trivy::new("/nonexistent/trivy");
        let option = ScanOption::new("SEVERE", "os", OutputFormat::Json);
        assert!(matches!(
            trivy.scan("alpine:3.10", &option),
            Err(Error::InvalidSeverity(_))
        ));
    }

    #[test]
    fn test_scan_missing_executable() {
        let trivy = Trivy::new("/nonexistent/trivy");
        let option = ScanOption::new("HIGH", "os", OutputFormat::Json);
        match trivy.scan("alpine:3.10", &option) {
            Err(Error::EmptyScanOutput { stdout, error, .. }) => {
                assert!(stdout.is_empty());
                assert!(error.is_some());
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
