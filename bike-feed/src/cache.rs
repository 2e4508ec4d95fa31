//! Freshness-window caching for the station feed.
//!
//! The upstream refreshes roughly once a minute, so re-fetching on every
//! request is wasted work. `CachedFeed` keeps the last successful snapshot
//! for a fixed window and serves it until the window lapses.
//!
//! Concurrent requests that arrive while a refresh is in flight wait on
//! that one fetch rather than starting their own. Failures are never
//! cached: the next request fetches again.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use moka::future::Cache as MokaCache;
use tracing::{debug, info, warn};

use crate::domain::StationRecord;
use crate::feed::{FeedError, FeedOutcome, NormalizeOptions, StationSource, normalize};

/// Default freshness window.
pub const DEFAULT_FRESHNESS: Duration = Duration::from_secs(60);

/// There is one snapshot per feed.
type SnapshotKey = ();

/// Configuration for the cache.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// How long a successful snapshot is served without re-fetching.
    pub freshness: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            freshness: DEFAULT_FRESHNESS,
        }
    }
}

/// A successfully normalized table and when it was fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedSnapshot {
    pub records: Vec<StationRecord>,
    pub fetched_at: DateTime<Utc>,
}

impl FeedSnapshot {
    pub fn new(records: Vec<StationRecord>, fetched_at: DateTime<Utc>) -> Self {
        Self {
            records,
            fetched_at,
        }
    }

    /// Time elapsed since the fetch, clamped at zero.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.fetched_at).to_std().unwrap_or(Duration::ZERO)
    }

    /// Whether the snapshot is still within `window` at `now`.
    pub fn is_fresh(&self, now: DateTime<Utc>, window: Duration) -> bool {
        self.age(now) < window
    }
}

/// Station source with a freshness window in front of it.
pub struct CachedFeed<S> {
    source: S,
    options: NormalizeOptions,
    snapshots: MokaCache<SnapshotKey, Arc<FeedSnapshot>>,
    freshness: Duration,
}

impl<S: StationSource> CachedFeed<S> {
    /// Create a new cached feed.
    pub fn new(source: S, options: NormalizeOptions, config: &CacheConfig) -> Self {
        let snapshots = MokaCache::builder()
            .time_to_live(config.freshness)
            .max_capacity(1)
            .build();

        Self {
            source,
            options,
            snapshots,
            freshness: config.freshness,
        }
    }

    /// The current snapshot, fetching if there is no fresh one.
    pub async fn snapshot(&self) -> Result<Arc<FeedSnapshot>, FeedError> {
        let snapshot = self.load().await?;
        if snapshot.is_fresh(Utc::now(), self.freshness) {
            return Ok(snapshot);
        }
        // Expiry is applied lazily, so an entry can outlive the window slightly.
        debug!(fetched_at = %snapshot.fetched_at, "discarding stale snapshot");
        self.snapshots.invalidate(&()).await;
        self.load().await
    }

    /// The current snapshot as an always-renderable outcome.
    pub async fn outcome(&self) -> FeedOutcome {
        match self.snapshot().await {
            Ok(snapshot) => FeedOutcome::fetched(snapshot.records.clone(), snapshot.fetched_at),
            Err(e) => FeedOutcome::failed(e),
        }
    }

    async fn load(&self) -> Result<Arc<FeedSnapshot>, FeedError> {
        self.snapshots
            .try_get_with((), self.refresh())
            .await
            .map_err(|e| (*e).clone())
    }

    async fn refresh(&self) -> Result<Arc<FeedSnapshot>, FeedError> {
        let source = self.source.describe();
        let result = match self.source.fetch().await {
            Ok(raw) => normalize(&raw, &self.options),
            Err(e) => Err(e),
        };

        match result {
            Ok(records) => {
                info!(%source, stations = records.len(), "refreshed station feed");
                Ok(Arc::new(FeedSnapshot::new(records, Utc::now())))
            }
            Err(e) => {
                warn!(%source, kind = e.kind(), error = %e, "station feed refresh failed");
                Err(e)
            }
        }
    }
}
