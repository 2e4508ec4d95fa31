//! File-backed feed source for development without network access.
//!
//! Serves a saved upstream response as if it were live. The content type is
//! inferred from the file extension so the normalizer sees the same
//! declared type the real endpoint would send.

use std::path::PathBuf;

use super::error::FeedError;
use super::source::RawResponse;

/// A saved upstream response on disk.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Content type implied by the extension; `None` leaves it to sniffing.
    fn content_type(&self) -> Option<String> {
        let ext = self.path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some("application/json".to_string()),
            "csv" => Some("text/csv".to_string()),
            _ => None,
        }
    }

    /// Read the file. A missing or unreadable file is a transport failure.
    pub async fn fetch(&self) -> Result<RawResponse, FeedError> {
        let body = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| FeedError::TransportFailure {
                status: None,
                message: format!("failed to read {}: {e}", self.path.display()),
            })?;

        Ok(RawResponse {
            status: 200,
            content_type: self.content_type(),
            body,
        })
    }

    pub fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}
