use chrono::{DateTime, Utc};
use futures::StreamExt;
use oxiguard_domain::DomainError;
use reqwest::header::{IF_MODIFIED_SINCE, LAST_MODIFIED};
use reqwest::StatusCode;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::parse::ListValidator;

/// Result of fetching one filter list into its canonical location.
#[derive(Debug, Clone)]
pub struct FetchedList {
    pub rule_count: u64,
    /// Validator from the `Last-Modified` response header, when present.
    pub last_modified: Option<String>,
    pub last_updated: DateTime<Utc>,
    /// Canonical path the content was renamed to; `None` means the server
    /// answered 304 and the existing file is still current.
    pub path: Option<PathBuf>,
}

/// Fetches filter lists from HTTP(S) URLs or absolute local paths, validating
/// the byte stream while staging it to a temp file in the destination
/// directory, then renaming atomically over `dest`.
pub struct Downloader {
    client: reqwest::Client,
}

impl Downloader {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Download `url` into `dest`. `last_modified` is the stored validator
    /// from the previous download; empty disables the conditional request.
    pub async fn fetch(
        &self,
        url: &str,
        last_modified: &str,
        dest: &Path,
    ) -> Result<FetchedList, DomainError> {
        debug!(url = %url, "downloading filter list");

        let dir = dest
            .parent()
            .ok_or_else(|| DomainError::Io(format!("no parent directory: {}", dest.display())))?;
        // Staged in the same directory so the final rename stays on one
        // filesystem. Dropped (and unlinked) automatically on any error path.
        let staging = NamedTempFile::new_in(dir).map_err(|e| DomainError::Io(e.to_string()))?;

        if Path::new(url).is_absolute() {
            self.fetch_local(url, staging, dest)
        } else {
            self.fetch_remote(url, last_modified, staging, dest).await
        }
    }

    fn fetch_local(
        &self,
        url: &str,
        mut staging: NamedTempFile,
        dest: &Path,
    ) -> Result<FetchedList, DomainError> {
        let mut file = std::fs::File::open(url)
            .map_err(|e| DomainError::Io(format!("open file: {url}: {e}")))?;

        let mut validator = ListValidator::new();
        let mut buf = vec![0u8; 64 * 1024];
        loop {
            let n = file.read(&mut buf).map_err(|e| DomainError::Io(e.to_string()))?;
            if n == 0 {
                break;
            }
            validator.push(&buf[..n])?;
            staging
                .as_file_mut()
                .write_all(&buf[..n])
                .map_err(|e| DomainError::Io(e.to_string()))?;
        }

        let rule_count = validator.finish()?;
        persist(staging, dest)?;

        debug!(url = %url, path = %dest.display(), rules = rule_count, "saved filter list");
        Ok(FetchedList {
            rule_count,
            last_modified: None,
            last_updated: Utc::now(),
            path: Some(dest.to_path_buf()),
        })
    }

    async fn fetch_remote(
        &self,
        url: &str,
        last_modified: &str,
        mut staging: NamedTempFile,
        dest: &Path,
    ) -> Result<FetchedList, DomainError> {
        let mut request = self.client.get(url);
        if !last_modified.is_empty() {
            request = request.header(IF_MODIFIED_SINCE, last_modified);
        }

        let response = request
            .send()
            .await
            .map_err(|e| DomainError::Network(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_MODIFIED => {
                debug!(url = %url, since = %last_modified, "filter list not modified");
                return Ok(FetchedList {
                    rule_count: 0,
                    last_modified: None,
                    last_updated: Utc::now(),
                    path: None,
                });
            }
            StatusCode::OK => {}
            status => return Err(DomainError::HttpStatus(status.as_u16())),
        }

        let new_validator = response
            .headers()
            .get(LAST_MODIFIED)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        let mut validator = ListValidator::new();
        let mut total = 0usize;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| DomainError::Network(e.to_string()))?;
            total += chunk.len();
            validator.push(&chunk)?;
            staging
                .as_file_mut()
                .write_all(&chunk)
                .map_err(|e| DomainError::Io(e.to_string()))?;
        }

        let rule_count = validator.finish()?;
        persist(staging, dest)?;

        debug!(url = %url, path = %dest.display(), bytes = total, rules = rule_count, "saved filter list");
        Ok(FetchedList {
            rule_count,
            last_modified: new_validator,
            last_updated: Utc::now(),
            path: Some(dest.to_path_buf()),
        })
    }
}

/// Close the staging file, then rename it over the destination. Closing
/// before the rename is required on some filesystems.
fn persist(staging: NamedTempFile, dest: &Path) -> Result<(), DomainError> {
    let staged_path = staging.into_temp_path();
    staged_path
        .persist(dest)
        .map_err(|e| DomainError::Io(e.to_string()))
}
