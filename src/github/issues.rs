use super::GitHubClient;
use crate::error::{Error, Result};
use crate::model::{IssueOption, IssueRecord, IssueResponse};
use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

/// The subset of an issue tracker the manager needs.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    async fn list_open_issues(&self, labels: &[String]) -> Result<Vec<IssueRecord>>;
    async fn create_issue(&self, issue: &IssueOption) -> Result<IssueRecord>;
    async fn update_issue_body(&self, number: u64, body: &str) -> Result<IssueRecord>;
}

/// Issues of a single GitHub repository.
pub struct GitHubIssues {
    api: GitHubClient,
    owner: String,
    repo: String,
}

impl GitHubIssues {
    /// `repository` is in `owner/name` form, as in `GITHUB_REPOSITORY`.
    pub fn new(api: GitHubClient, repository: &str) -> Result<Self> {
        if !api.has_token() {
            return Err(Error::MissingToken);
        }
        let (owner, repo) = repository
            .split_once('/')
            .filter(|(owner, repo)| !owner.is_empty() && !repo.is_empty() && !repo.contains('/'))
            .ok_or_else(|| Error::InvalidRepository(repository.to_string()))?;

        Ok(Self {
            api,
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }

    fn issues_path(&self) -> String {
        format!("/repos/{}/{}/issues", self.owner, self.repo)
    }
}

const PAGE_SIZE: usize = 100;

#[derive(Serialize)]
struct CreateIssue<'a> {
    title: &'a str,
    body: &'a str,
    labels: &'a [String],
    assignees: &'a [String],
}

#[derive(Serialize)]
struct UpdateIssue<'a> {
    body: &'a str,
}

#[async_trait]
impl IssueTracker for GitHubIssues {
    /// Reads every page of open issues carrying all of `labels`.
    async fn list_open_issues(&self, labels: &[String]) -> Result<Vec<IssueRecord>> {
        let labels = labels.join(",");
        let per_page = PAGE_SIZE.to_string();
        let mut issues = Vec::new();

        for page in 1.. {
            let page = page.to_string();
            let batch: Vec<IssueRecord> = self
                .api
                .get_json(
                    &self.issues_path(),
                    &[
                        ("state", "open"),
                        ("labels", &labels),
                        ("per_page", &per_page),
                        ("page", &page),
                    ],
                )
                .await?;
            let last = batch.len() < PAGE_SIZE;
            issues.extend(batch);
            if last {
                break;
            }
        }

        Ok(issues)
    }

    async fn create_issue(&self, issue: &IssueOption) -> Result<IssueRecord> {
        let body = CreateIssue {
            title: &issue.title,
            body: &issue.body,
            labels: &issue.labels,
            assignees: &issue.assignees,
        };
        self.api
            .send_json(reqwest::Method::POST, &self.issues_path(), &body)
            .await
    }

    async fn update_issue_body(&self, number: u64, body: &str) -> Result<IssueRecord> {
        let path = format!("{}/{}", self.issues_path(), number);
        self.api
            .send_json(reqwest::Method::PATCH, &path, &UpdateIssue { body })
            .await
    }
}

/// Hidden comment identifying the image an issue was opened for.
pub fn issue_marker(image: &str) -> String {
    format!("<!-- trivy-issue image=\"{}\" -->", image)
}

/// Keeps one open issue per scanned image.
///
/// "Same issue" is decided heuristically: an open issue carrying the
/// configured labels whose body mentions the image. Bodies written by this
/// manager start with [`issue_marker`], and marked issues win over plain
/// mentions. Pull requests are never candidates. Two images whose references overlap as substrings can still
/// collide when they share labels.
pub struct IssueManager<T: IssueTracker> {
    tracker: T,
}

impl<T: IssueTracker> IssueManager<T> {
    pub fn new(tracker: T) -> Self {
        Self { tracker }
    }

    pub fn tracker(&self) -> &T {
        &self.tracker
    }

    /// Updates the body of the matching open issue, or opens a new one.
    ///
    /// On update only the body changes; title, labels and assignees stay
    /// as they are.
    pub async fn create_or_update(&self, image: &str, option: &IssueOption) -> Result<IssueResponse> {
        let body = format!("{}\n{}", issue_marker(image), option.body);

        let issues = self.tracker.list_open_issues(&option.labels).await?;
        if let Some(existing) = find_existing(&issues, image) {
            let updated = self.tracker.update_issue_body(existing.number, &body).await?;
            info!(number = updated.number, url = %updated.html_url, "updated issue");
            return Ok(IssueResponse::from(&updated));
        }

        let created = self
            .tracker
            .create_issue(&IssueOption {
                body,
                ..option.clone()
            })
            .await?;
        info!(number = created.number, url = %created.html_url, "created issue");
        Ok(IssueResponse::from(&created))
    }
}

fn find_existing<'a>(issues: &'a [IssueRecord], image: &str) -> Option<&'a IssueRecord> {
    let marker = issue_marker(image);
    let candidates = || issues.iter().filter(|issue| !issue.is_pull_request());

    candidates()
        .find(|issue| body_of(issue).contains(&marker))
        .or_else(|| candidates().find(|issue| body_of(issue).contains(image)))
}

fn body_of(issue: &IssueRecord) -> &str {
    issue.body.as_deref().unwrap_or_default()
}
