//! Server configuration from environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::CacheConfig;
use crate::feed::FeedConfig;

/// Default listen address.
pub const DEFAULT_BIND: &str = "127.0.0.1:3000";

/// Errors from reading configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed
    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    /// `BIKE_FEED_PRESET` names no known feed
    #[error("unknown feed preset {0:?} (expected \"taichung\" or \"youbike\")")]
    UnknownPreset(String),
}

/// Where station data comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceConfig {
    Http(FeedConfig),
    Fixture(PathBuf),
}

/// Everything the server binary needs.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub source: SourceConfig,
    pub cache: CacheConfig,
    pub bind: SocketAddr,
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary variable lookup.
    ///
    /// Recognized variables:
    /// - `BIKE_FEED_FIXTURE`: serve this file instead of fetching
    /// - `BIKE_FEED_PRESET`: `taichung` (default) or `youbike`
    /// - `BIKE_FEED_URL`: endpoint, overriding the preset's
    /// - `BIKE_FEED_RID`, `BIKE_FEED_LIMIT`: query parameters
    /// - `BIKE_FEED_TIMEOUT_SECS`: request timeout
    /// - `BIKE_FEED_INSECURE_TLS`: `true`/`false`
    /// - `BIKE_FEED_FRESHNESS_SECS`: cache window
    /// - `BIKE_FEED_BIND`: listen address
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let source = match var("BIKE_FEED_FIXTURE") {
            Some(path) => SourceConfig::Fixture(PathBuf::from(path)),
            None => SourceConfig::Http(feed_config(&var)?),
        };

        let mut cache = CacheConfig::default();
        if let Some(secs) = parse_seconds("BIKE_FEED_FRESHNESS_SECS", var("BIKE_FEED_FRESHNESS_SECS"))? {
            cache.freshness = Duration::from_secs(secs);
        }

        let bind = parse::<SocketAddr>("BIKE_FEED_BIND", var("BIKE_FEED_BIND"))?;
        let bind = match bind {
            Some(addr) => addr,
            None => DEFAULT_BIND.parse().map_err(|e: std::net::AddrParseError| {
                ConfigError::InvalidValue {
                    key: "BIKE_FEED_BIND",
                    value: DEFAULT_BIND.to_string(),
                    reason: e.to_string(),
                }
            })?,
        };

        Ok(Self {
            source,
            cache,
            bind,
        })
    }
}

fn feed_config(var: &impl Fn(&str) -> Option<String>) -> Result<FeedConfig, ConfigError> {
    let mut config = match var("BIKE_FEED_PRESET").as_deref().map(str::trim) {
        None | Some("taichung") => FeedConfig::taichung_open_data(),
        Some("youbike") => FeedConfig::youbike_official(),
        Some(other) => return Err(ConfigError::UnknownPreset(other.to_string())),
    };

    if let Some(url) = var("BIKE_FEED_URL") {
        config.url = url;
    }
    if let Some(rid) = var("BIKE_FEED_RID") {
        config.resource_id = Some(rid);
    }
    if let Some(limit) = parse::<u32>("BIKE_FEED_LIMIT", var("BIKE_FEED_LIMIT"))? {
        config.limit = Some(limit);
    }
    if let Some(secs) = parse_seconds("BIKE_FEED_TIMEOUT_SECS", var("BIKE_FEED_TIMEOUT_SECS"))? {
        config.timeout_secs = secs;
    }
    if let Some(insecure) = parse::<bool>("BIKE_FEED_INSECURE_TLS", var("BIKE_FEED_INSECURE_TLS"))? {
        config.accept_invalid_certs = insecure;
    }

    Ok(config)
}

fn parse<T>(key: &'static str, value: Option<String>) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .map(|v| {
            v.trim().parse::<T>().map_err(|e| ConfigError::InvalidValue {
                key,
                value: v.clone(),
                reason: e.to_string(),
            })
        })
        .transpose()
}

/// A positive number of seconds.
fn parse_seconds(key: &'static str, value: Option<String>) -> Result<Option<u64>, ConfigError> {
    match parse::<u64>(key, value.clone())? {
        Some(0) => Err(ConfigError::InvalidValue {
            key,
            value: value.unwrap_or_default(),
            reason: "must be at least 1 second".to_string(),
        }),
        secs => Ok(secs),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{TAICHUNG_OPEN_DATA_URL, YOUBIKE_TAICHUNG_URL};
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(
            config.source,
            SourceConfig::Http(FeedConfig::taichung_open_data())
        );
        assert_eq!(config.cache, CacheConfig::default());
        assert_eq!(config.bind, "127.0.0.1:3000".parse().unwrap());
    }

    #[test]
    fn youbike_preset_with_overrides() {
        let config = config(&[
            ("BIKE_FEED_PRESET", "youbike"),
            ("BIKE_FEED_TIMEOUT_SECS", "10"),
            ("BIKE_FEED_INSECURE_TLS", "false"),
            ("BIKE_FEED_FRESHNESS_SECS", "30"),
            ("BIKE_FEED_BIND", "0.0.0.0:8080"),
        ])
        .unwrap();

        let SourceConfig::Http(feed) = config.source else {
            panic!("expected HTTP source");
        };
        assert_eq!(feed.url, YOUBIKE_TAICHUNG_URL);
        assert_eq!(feed.timeout_secs, 10);
        assert!(!feed.accept_invalid_certs);
        assert_eq!(config.cache.freshness, Duration::from_secs(30));
        assert_eq!(config.bind, "0.0.0.0:8080".parse().unwrap());
    }

    #[test]
    fn custom_endpoint() {
        let config = config(&[
            ("BIKE_FEED_URL", "http://localhost:9000/download"),
            ("BIKE_FEED_RID", "8be7c670-3f42-4764-ad44-28e28eeaa0a7"),
            ("BIKE_FEED_LIMIT", "2000"),
        ])
        .unwrap();

        let SourceConfig::Http(feed) = config.source else {
            panic!("expected HTTP source");
        };
        assert_eq!(feed.url, "http://localhost:9000/download");
        assert_ne!(feed.url, TAICHUNG_OPEN_DATA_URL);
        assert_eq!(
            feed.resource_id.as_deref(),
            Some("8be7c670-3f42-4764-ad44-28e28eeaa0a7")
        );
        assert_eq!(feed.limit, Some(2000));
    }

    #[test]
    fn fixture_source_wins() {
        let config = config(&[
            ("BIKE_FEED_FIXTURE", "fixtures/taichung_sample.json"),
            ("BIKE_FEED_PRESET", "bogus"),
        ])
        .unwrap();
        assert_eq!(
            config.source,
            SourceConfig::Fixture(PathBuf::from("fixtures/taichung_sample.json"))
        );
    }

    #[test]
    fn blank_values_are_unset() {
        let config = config(&[("BIKE_FEED_LIMIT", "  "), ("BIKE_FEED_FIXTURE", "")]).unwrap();
        assert_eq!(
            config.source,
            SourceConfig::Http(FeedConfig::taichung_open_data())
        );
    }

    #[test]
    fn invalid_values() {
        let err = config(&[("BIKE_FEED_LIMIT", "lots")]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: "BIKE_FEED_LIMIT",
                ..
            }
        ));

        let err = config(&[("BIKE_FEED_BIND", "nowhere")]).unwrap_err();
        assert!(err.to_string().contains("BIKE_FEED_BIND"));

        for key in ["BIKE_FEED_TIMEOUT_SECS", "BIKE_FEED_FRESHNESS_SECS"] {
            let err = config(&[(key, "0")]).unwrap_err();
            assert_eq!(
                err,
                ConfigError::InvalidValue {
                    key,
                    value: "0".into(),
                    reason: "must be at least 1 second".into(),
                }
            );
        }

        let err = config(&[("BIKE_FEED_PRESET", "taipei")]).unwrap_err();
        assert_eq!(err, ConfigError::UnknownPreset("taipei".into()));
    }
}
