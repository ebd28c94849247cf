use super::GitHubClient;
use crate::error::{Error, Result};
use crate::platform::Platform;
use serde::Deserialize;
use tracing::{debug, error, warn};

pub const TRIVY_REPOSITORY: &str = "aquasecurity/trivy";

#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    pub tag_name: String,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    pub browser_download_url: String,
}

/// Name of the 64-bit archive Trivy publishes for `version` on `os`.
///
/// # Example
///
/// ```
/// use trivy_issue::github::asset_filename;
/// use trivy_issue::platform::Platform;
///
/// assert_eq!(
///     asset_filename("0.18.3", Platform::MacOS),
///     "trivy_0.18.3_macOS-64bit.tar.gz"
/// );
/// ```
pub fn asset_filename(version: &str, os: Platform) -> String {
    format!("trivy_{}_{}-64bit.tar.gz", version, os.as_str())
}

/// Resolves Trivy release assets through the GitHub releases API.
pub struct ReleaseClient {
    api: GitHubClient,
}

impl ReleaseClient {
    pub fn new(api: GitHubClient) -> Self {
        Self { api }
    }

    /// Returns the download URL of the archive for `version` on `os`.
    ///
    /// `version` is either an exact release (`0.18.3` or `v0.18.3`) or
    /// `latest`. Every failure collapses into [`Error::AssetNotFound`];
    /// the underlying cause is logged.
    pub async fn resolve_download_url(&self, version: &str, os: Platform) -> Result<String> {
        match self.find_asset(version, os).await {
            Ok(asset) => {
                debug!(asset = %asset.name, url = %asset.browser_download_url, "resolved trivy asset");
                Ok(asset.browser_download_url)
            }
            Err(e) => {
                error!(version, os = %os, error = %e, "failed to resolve trivy release asset");
                Err(Error::AssetNotFound {
                    version: version.to_string(),
                    os: os.to_string(),
                })
            }
        }
    }

    async fn find_asset(&self, version: &str, os: Platform) -> Result<ReleaseAsset> {
        let (release, version) = if version == "latest" {
            let release = self.latest_release().await?;
            let version = release.tag_name.trim_start_matches('v').to_string();
            (release, version)
        } else {
            let version = normalize_version(version);
            (self.release_by_tag(&format!("v{}", version)).await?, version.to_string())
        };

        let filename = asset_filename(&version, os);
        release
            .assets
            .into_iter()
            .find(|asset| asset.name == filename)
            .ok_or(Error::AssetNotFound {
                version,
                os: os.to_string(),
            })
    }

    pub async fn latest_release(&self) -> Result<Release> {
        let path = format!("/repos/{}/releases/latest", TRIVY_REPOSITORY);
        self.api.get_json(&path, &[]).await
    }

    pub async fn release_by_tag(&self, tag: &str) -> Result<Release> {
        let path = format!("/repos/{}/releases/tags/{}", TRIVY_REPOSITORY, tag);
        self.api.get_json(&path, &[]).await
    }
}

fn normalize_version(version: &str) -> &str {
    let version = version.trim_start_matches('v');
    if semver::Version::parse(version).is_err() {
        warn!(version, "trivy version is not a semantic version");
    }
    version
}
