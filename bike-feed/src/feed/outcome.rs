//! Degraded-mode view of a fetch result.

use chrono::{DateTime, Utc};

use crate::domain::StationRecord;

use super::error::FeedError;

/// Records plus an optional diagnostic, for consumers that always render
/// something: a failed fetch becomes an empty table and the reason why.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedOutcome {
    pub records: Vec<StationRecord>,
    /// When the records were fetched; `None` on failure
    pub fetched_at: Option<DateTime<Utc>>,
    pub diagnostic: Option<FeedError>,
}

impl FeedOutcome {
    /// A successful fetch.
    pub fn fetched(records: Vec<StationRecord>, fetched_at: DateTime<Utc>) -> Self {
        Self {
            records,
            fetched_at: Some(fetched_at),
            diagnostic: None,
        }
    }

    /// A failed fetch: no records, and why.
    pub fn failed(error: FeedError) -> Self {
        Self {
            records: Vec::new(),
            fetched_at: None,
            diagnostic: Some(error),
        }
    }

    /// The diagnostic rendered for display.
    pub fn error_message(&self) -> Option<String> {
        self.diagnostic.as_ref().map(ToString::to_string)
    }
}
