//! Configuration loading and representation.

use std::time::Duration;

use thiserror::Error;
use tracing::warn;

pub const REDIS_URL_VAR: &str = "DEPOT_REDIS_URL";
pub const DATABASE_URL_VAR: &str = "DEPOT_DATABASE_URL";
pub const CACHE_TTL_VAR: &str = "DEPOT_CACHE_TTL_SECS";
pub const TOPIC_PREFIX_VAR: &str = "DEPOT_TOPIC_PREFIX";

pub const DEFAULT_TOPIC_PREFIX: &str = "depot";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got '{value}'")]
    Invalid {
        var: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// Backend selection and tuning for the mutation pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepotConfig {
    /// Redis for the cache and the broker; in-memory when absent.
    pub redis_url: Option<String>,
    /// Postgres for the stores; in-memory when absent.
    pub database_url: Option<String>,
    /// Expiry applied to every cache write; no expiry when absent.
    pub cache_ttl: Option<Duration>,
    /// Namespace for broker keys and channels.
    pub topic_prefix: String,
}

impl Default for DepotConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            database_url: None,
            cache_ttl: None,
            topic_prefix: DEFAULT_TOPIC_PREFIX.to_string(),
        }
    }
}

impl DepotConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read the configuration through `lookup` (variable name → value).
    ///
    /// Empty values count as absent.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let redis_url = get(REDIS_URL_VAR);
        if redis_url.is_none() {
            warn!("{REDIS_URL_VAR} not set; cache and broker are in-memory");
        }

        let database_url = get(DATABASE_URL_VAR);
        if database_url.is_none() {
            warn!("{DATABASE_URL_VAR} not set; stores are in-memory and not durable");
        }

        let cache_ttl = match get(CACHE_TTL_VAR) {
            Some(raw) => {
                let secs = raw.trim().parse::<u64>().map_err(|_| ConfigError::Invalid {
                    var: CACHE_TTL_VAR,
                    value: raw.clone(),
                    expected: "a whole number of seconds",
                })?;
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        let topic_prefix = get(TOPIC_PREFIX_VAR).unwrap_or_else(|| DEFAULT_TOPIC_PREFIX.to_string());

        Ok(Self {
            redis_url,
            database_url,
            cache_ttl,
            topic_prefix,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = DepotConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, DepotConfig::default());
    }

    #[test]
    fn reads_every_variable() {
        let config = DepotConfig::from_lookup(lookup(&[
            (REDIS_URL_VAR, "redis://localhost:6379"),
            (DATABASE_URL_VAR, "postgres://localhost/depot"),
            (CACHE_TTL_VAR, "300"),
            (TOPIC_PREFIX_VAR, "warehouse"),
        ]))
        .unwrap();

        assert_eq!(config.redis_url.as_deref(), Some("redis://localhost:6379"));
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/depot"));
        assert_eq!(config.cache_ttl, Some(Duration::from_secs(300)));
        assert_eq!(config.topic_prefix, "warehouse");
    }

    #[test]
    fn blank_values_count_as_absent() {
        let config = DepotConfig::from_lookup(lookup(&[(REDIS_URL_VAR, "  ")])).unwrap();
        assert_eq!(config.redis_url, None);
    }

    #[test]
    fn malformed_ttl_is_rejected() {
        let err = DepotConfig::from_lookup(lookup(&[(CACHE_TTL_VAR, "soon")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: CACHE_TTL_VAR, .. }));
    }
}
