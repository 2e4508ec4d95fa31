//! Open-data HTTP client.

use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use super::error::{FeedError, snippet};
use super::source::RawResponse;

/// Taichung City open-data download endpoint.
pub const TAICHUNG_OPEN_DATA_URL: &str =
    "https://newdatacenter.taichung.gov.tw/api/v1/no-auth/resource.download";

/// Resource id of the YouBike 2.0 real-time station table.
pub const TAICHUNG_YOUBIKE_RESOURCE_ID: &str = "7d7dade7-2f75-4cf9-8467-6c26c447c6ca";

/// YouBike's own Taichung feed.
pub const YOUBIKE_TAICHUNG_URL: &str = "https://ybjson02.youbike.com.tw:60008/yb2/taichung/gwjs.json";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Configuration for the feed client.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedConfig {
    /// Endpoint URL
    pub url: String,
    /// Resource identifier, sent as `rid`
    pub resource_id: Option<String>,
    /// Row limit, sent as `limit`
    pub limit: Option<u32>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Skip TLS certificate verification
    pub accept_invalid_certs: bool,
}

impl FeedConfig {
    /// Create a config for an endpoint with no query parameters.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            resource_id: None,
            limit: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            accept_invalid_certs: false,
        }
    }

    /// The Taichung open-data platform's YouBike table.
    ///
    /// The platform has served an incomplete certificate chain, so
    /// verification is off.
    pub fn taichung_open_data() -> Self {
        Self::new(TAICHUNG_OPEN_DATA_URL)
            .with_resource_id(TAICHUNG_YOUBIKE_RESOURCE_ID)
            .with_limit(1000)
            .with_accept_invalid_certs(true)
    }

    /// YouBike's official Taichung JSON feed.
    pub fn youbike_official() -> Self {
        Self::new(YOUBIKE_TAICHUNG_URL).with_accept_invalid_certs(true)
    }

    pub fn with_resource_id(mut self, rid: impl Into<String>) -> Self {
        self.resource_id = Some(rid.into());
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Query parameters sent with every request.
    pub fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(rid) = &self.resource_id {
            query.push(("rid", rid.clone()));
        }
        if let Some(limit) = self.limit {
            query.push(("limit", limit.to_string()));
        }
        query
    }
}

/// Client for a station status endpoint.
///
/// Performs exactly one GET per [`FeedClient::fetch`]; retry policy belongs
/// to the caller.
#[derive(Debug, Clone)]
pub struct FeedClient {
    http: reqwest::Client,
    config: FeedConfig,
}

impl FeedClient {
    /// Create a new feed client.
    pub fn new(config: FeedConfig) -> Result<Self, FeedError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;

        Ok(Self { http, config })
    }

    /// Fetch the raw feed.
    ///
    /// Network errors, timeouts and non-2xx statuses all come back as
    /// [`FeedError::TransportFailure`]; the body of a failed response is
    /// truncated into the message.
    pub async fn fetch(&self) -> Result<RawResponse, FeedError> {
        let response = self
            .http
            .get(&self.config.url)
            .query(&self.config.query())
            .send()
            .await?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FeedError::TransportFailure {
                status: Some(status.as_u16()),
                message: snippet(&body),
            });
        }

        let body = response.text().await?;
        debug!(
            status = status.as_u16(),
            content_type = content_type.as_deref().unwrap_or("-"),
            bytes = body.len(),
            "fetched station feed"
        );

        Ok(RawResponse {
            status: status.as_u16(),
            content_type,
            body,
        })
    }

    pub fn describe(&self) -> String {
        match &self.config.resource_id {
            Some(rid) => format!("{} (rid {rid})", self.config.url),
            None => self.config.url.clone(),
        }
    }
}
