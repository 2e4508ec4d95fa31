//! Application state for the web layer.

use std::sync::Arc;

use crate::cache::CachedFeed;
use crate::feed::FeedSource;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Station feed behind its freshness window
    pub feed: Arc<CachedFeed<FeedSource>>,
}

impl AppState {
    pub fn new(feed: CachedFeed<FeedSource>) -> Self {
        Self {
            feed: Arc::new(feed),
        }
    }
}
