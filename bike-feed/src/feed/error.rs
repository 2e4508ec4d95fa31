//! Feed error types.

use std::collections::BTreeSet;

/// How much of an offending body is kept for diagnostics.
pub const DIAGNOSTIC_CHARS: usize = 500;

/// Errors that can occur while fetching or normalizing a station feed.
///
/// None of these are fatal to the caller: each one means "no usable table
/// this cycle", and the caller decides whether to degrade, skip or retry on
/// its next tick.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FeedError {
    /// Network error, timeout or non-2xx status.
    #[error("transport failure{}: {message}", status_suffix(.status))]
    TransportFailure {
        status: Option<u16>,
        message: String,
    },

    /// Body (or an embedded `retVal` payload) is not the JSON/CSV it claims to be.
    #[error("decode failure: {message} (body starts: {snippet})")]
    DecodeFailure { message: String, snippet: String },

    /// Decoded rows lack fields every station needs.
    #[error(
        "schema mismatch: missing fields [{}], observed fields [{}]",
        join(.missing),
        join(.observed)
    )]
    SchemaMismatch {
        missing: BTreeSet<String>,
        observed: BTreeSet<String>,
    },

    /// Structurally valid, but no station survived validation.
    #[error("feed contained no usable station records")]
    EmptyFeed,
}

impl FeedError {
    /// Short machine-readable kind, for logs and API payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            FeedError::TransportFailure { .. } => "transport_failure",
            FeedError::DecodeFailure { .. } => "decode_failure",
            FeedError::SchemaMismatch { .. } => "schema_mismatch",
            FeedError::EmptyFeed => "empty_feed",
        }
    }

    pub(crate) fn decode(message: impl Into<String>, text: &str) -> Self {
        FeedError::DecodeFailure {
            message: message.into(),
            snippet: snippet(text),
        }
    }
}

impl From<reqwest::Error> for FeedError {
    fn from(err: reqwest::Error) -> Self {
        FeedError::TransportFailure {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

/// First [`DIAGNOSTIC_CHARS`] characters of `text`.
pub(crate) fn snippet(text: &str) -> String {
    text.chars().take(DIAGNOSTIC_CHARS).collect()
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

fn join(fields: &BTreeSet<String>) -> String {
    fields.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}
