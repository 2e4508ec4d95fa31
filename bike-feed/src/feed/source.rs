//! Raw upstream responses and the sources that produce them.

use std::future::Future;

use super::client::FeedClient;
use super::error::FeedError;
use super::file::FileSource;

/// An upstream response as received, before any interpretation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    /// HTTP status (200 for file-backed sources).
    pub status: u16,
    /// `Content-Type` header, if any.
    pub content_type: Option<String>,
    /// Response body decoded as text.
    pub body: String,
}

impl RawResponse {
    /// A JSON response with status 200.
    pub fn json(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            content_type: Some("application/json".to_string()),
            body: body.into(),
        }
    }

    /// A CSV response with status 200.
    pub fn csv(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            content_type: Some("text/csv".to_string()),
            body: body.into(),
        }
    }

    /// How the body should be decoded.
    ///
    /// The declared content type wins. Without one, the first non-blank
    /// byte decides: `[` or `{` means JSON, anything else CSV.
    pub fn content_kind(&self) -> ContentKind {
        match self.content_type.as_deref() {
            Some(ct) if ct.to_ascii_lowercase().contains("json") => ContentKind::Json,
            Some(_) => ContentKind::Csv,
            None => match self.body.trim_start().as_bytes().first() {
                Some(b'[') | Some(b'{') => ContentKind::Json,
                _ => ContentKind::Csv,
            },
        }
    }
}

/// Body encoding of a [`RawResponse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Json,
    Csv,
}

/// Anything that can produce a raw station feed response.
pub trait StationSource {
    /// Fetch one raw response. Implementations never retry.
    fn fetch(&self) -> impl Future<Output = Result<RawResponse, FeedError>> + Send;

    /// Human-readable description for logs.
    fn describe(&self) -> String;
}

/// The sources the server can be configured with.
#[derive(Debug, Clone)]
pub enum FeedSource {
    /// Live HTTP endpoint.
    Http(FeedClient),
    /// Local fixture file, for offline development.
    File(FileSource),
}

impl StationSource for FeedSource {
    async fn fetch(&self) -> Result<RawResponse, FeedError> {
        match self {
            FeedSource::Http(client) => client.fetch().await,
            FeedSource::File(file) => file.fetch().await,
        }
    }

    fn describe(&self) -> String {
        match self {
            FeedSource::Http(client) => client.describe(),
            FeedSource::File(file) => file.describe(),
        }
    }
}
