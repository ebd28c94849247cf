//! Download and unpack the trivy executable from a release archive.

use crate::error::{Error, Result};
use flate2::read::GzDecoder;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

pub const EXECUTABLE_NAME: &str = "trivy";

pub struct Downloader {
    client: reqwest::Client,
}

impl Downloader {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Downloads the `.tar.gz` at `url` and extracts only the trivy
    /// executable into `dest_dir`, returning its path.
    ///
    /// A corrupt archive, or one without the executable, is
    /// [`Error::ExtractionFailed`]; the cause is logged.
    pub async fn fetch(&self, url: &str, dest_dir: &Path) -> Result<PathBuf> {
        info!(url, dest = %dest_dir.display(), "downloading trivy");

        let download_error = |source| Error::Download {
            url: url.to_string(),
            source,
        };
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(download_error)?;
        let archive = response.bytes().await.map_err(download_error)?;
        debug!(bytes = archive.len(), "downloaded archive");

        if let Err(e) = extract_executable(&archive[..], dest_dir) {
            error!(dest = %dest_dir.display(), error = %e, "failed to extract trivy archive");
            return Err(Error::ExtractionFailed(dest_dir.to_path_buf()));
        }

        if !exists(dest_dir) {
            return Err(Error::ExtractionFailed(dest_dir.to_path_buf()));
        }
        Ok(dest_dir.join(EXECUTABLE_NAME))
    }
}

impl Default for Downloader {
    fn default() -> Self {
        Self::new()
    }
}

/// Unpacks the top-level `trivy` entry of a gzip tar stream into `dest_dir`.
///
/// All other entries (license, readme, contrib templates) are skipped.
/// Finding no such entry is not an error here; callers check [`exists`].
pub fn extract_executable<R: Read>(reader: R, dest_dir: &Path) -> Result<()> {
    fs::create_dir_all(dest_dir)?;

    let mut archive = tar::Archive::new(GzDecoder::new(reader));
    for entry in archive.entries()? {
        let mut entry = entry?;
        let is_executable = entry.header().entry_type().is_file() && {
            let path = entry.path()?;
            path.strip_prefix("./").unwrap_or(path.as_ref()) == Path::new(EXECUTABLE_NAME)
        };

        if is_executable {
            entry.unpack(dest_dir.join(EXECUTABLE_NAME))?;
            debug!(dest = %dest_dir.display(), "extracted trivy");
            break;
        }
    }

    Ok(())
}

/// True when `dir` holds exactly one entry named `trivy`.
///
/// A missing or unreadable directory counts as not present.
pub fn exists(dir: &Path) -> bool {
    match fs::read_dir(dir) {
        Ok(entries) => {
            entries
                .flatten()
                .filter(|entry| entry.file_name() == EXECUTABLE_NAME)
                .count()
                == 1
        }
        Err(_) => false,
    }
}
