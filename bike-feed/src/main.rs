use bike_feed::cache::CachedFeed;
use bike_feed::config::{AppConfig, SourceConfig};
use bike_feed::feed::{FeedClient, FeedSource, FileSource, NormalizeOptions, StationSource};
use bike_feed::web::{AppState, create_router};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "bike_feed=info,tower_http=info";

#[tokio::main]
async fn main() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = AppConfig::from_env().expect("Invalid configuration");

    let source = match config.source {
        SourceConfig::Http(feed_config) => FeedSource::Http(
            FeedClient::new(feed_config).expect("Failed to create feed client"),
        ),
        SourceConfig::Fixture(path) => FeedSource::File(FileSource::new(path)),
    };
    info!(source = %source.describe(), freshness = ?config.cache.freshness, "station feed configured");

    let feed = CachedFeed::new(source, NormalizeOptions::default(), &config.cache);

    // Warm the cache; a failure here is not fatal, requests retry
    match feed.snapshot().await {
        Ok(snapshot) => info!(stations = snapshot.records.len(), "loaded station feed"),
        Err(e) => warn!(kind = e.kind(), error = %e, "initial station feed fetch failed"),
    }

    let app = create_router(AppState::new(feed));

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .expect("Failed to bind listener");
    info!(addr = %config.bind, "bike feed server listening");
    info!("endpoints: /health /api/stations /api/areas /api/nearest /api/summary");

    axum::serve(listener, app).await.expect("Server error");
}
