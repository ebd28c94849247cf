//! End-to-end run: validate, fetch trivy, scan, then report or file an issue.
//!
//! Stages run strictly in sequence and the first failure aborts the run.

use crate::config::{Config, IssueConfig};
use crate::error::{Error, Result};
use crate::fetch::{exists, Downloader, EXECUTABLE_NAME};
use crate::github::{GitHubClient, GitHubIssues, IssueManager, IssueTracker, ReleaseClient};
use crate::model::{IssueOption, IssueResponse, ScanOption, ScanOutput, VulnerabilityReport};
use crate::output::format_markdown;
use crate::platform::Platform;
use crate::scanner::Trivy;
use crate::validate::validate;
use std::path::PathBuf;
use tracing::{debug, info};

/// Everything a single run needs, assembled once by the caller.
#[derive(Debug, Clone)]
pub struct Run {
    pub image: String,
    /// `owner/name` of the repository issues are filed in.
    pub repository: Option<String>,
    pub token: Option<String>,
    pub config: Config,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Issue mode, and no target had findings.
    Clean,
    /// Issue creation disabled; the scan output is the report.
    Reported(ScanOutput),
    /// An issue was created or updated.
    Issue {
        response: IssueResponse,
        findings: usize,
    },
}

impl Outcome {
    pub fn has_findings(&self) -> bool {
        match self {
            Outcome::Clean => false,
            Outcome::Reported(ScanOutput::Structured(report)) => report.finding_count() > 0,
            Outcome::Reported(ScanOutput::Raw(_)) => false,
            Outcome::Issue { findings, .. } => *findings > 0,
        }
    }
}

pub async fn execute(run: &Run) -> Result<Outcome> {
    if run.image.trim().is_empty() {
        return Err(Error::MissingImage);
    }

    let option = run.config.scan_option();
    validate(&option)?;

    let platform = Platform::current()?;
    let api = GitHubClient::new(&run.config.api_url, run.token.clone());

    let issues = if run.config.issue.enabled {
        let repository = run.repository.as_deref().ok_or(Error::MissingRepository)?;
        Some(IssueManager::new(GitHubIssues::new(api.clone(), repository)?))
    } else {
        None
    };

    let trivy = ensure_trivy(
        &run.config,
        platform,
        &ReleaseClient::new(api),
        &Downloader::new(),
    )
    .await?;

    let output = scan(trivy, &run.image, &option).await?;

    match (output, issues) {
        (ScanOutput::Structured(report), Some(manager)) => {
            publish(&run.image, &report, &manager, &run.config.issue).await
        }
        (output, _) => Ok(Outcome::Reported(output)),
    }
}

/// Returns the cached trivy executable, downloading it first if needed.
pub async fn ensure_trivy(
    config: &Config,
    platform: Platform,
    releases: &ReleaseClient,
    downloader: &Downloader,
) -> Result<PathBuf> {
    let bin_dir = config.bin_dir();
    if exists(&bin_dir) {
        debug!(dir = %bin_dir.display(), "using cached trivy");
        return Ok(bin_dir.join(EXECUTABLE_NAME));
    }

    let url = releases
        .resolve_download_url(&config.trivy_version, platform)
        .await?;
    downloader.fetch(&url, &bin_dir).await
}

/// Runs trivy on the blocking pool; a scan can take minutes.
pub async fn scan(trivy: PathBuf, image: &str, option: &ScanOption) -> Result<ScanOutput> {
    let image = image.to_string();
    let option = option.clone();
    tokio::task::spawn_blocking(move || Trivy::new(trivy).scan(&image, &option)).await?
}

/// Files the report as an issue, unless it has nothing to say.
pub async fn publish<T: IssueTracker>(
    image: &str,
    report: &VulnerabilityReport,
    manager: &IssueManager<T>,
    issue: &IssueConfig,
) -> Result<Outcome> {
    let body = format_markdown(image, report);
    if body.is_empty() {
        info!(image, "no vulnerabilities found");
        return Ok(Outcome::Clean);
    }

    let option = IssueOption {
        title: issue.title.clone(),
        body,
        labels: issue.labels.clone(),
        assignees: issue.assignees.clone(),
    };
    let response = manager.create_or_update(image, &option).await?;

    Ok(Outcome::Issue {
        response,
        findings: report.finding_count(),
    })
}
