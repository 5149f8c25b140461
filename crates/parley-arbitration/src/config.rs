//! Arbitration Configuration
//!
//! Process-wide defaults for arbitration requests with environment variable
//! overrides. Malformed values are ignored with a warning.

use parley_core::{ArbitrationRequest, ArbitrationStrategy, DiscoveryScope};
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// Defaults applied to every request built through [`ArbitrationConfig::request`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArbitrationConfig {
    /// Total budget per arbitration (env: PARLEY_DISCOVERY_TIMEOUT_MS)
    pub discovery_timeout: Duration,

    /// Wait between unsuccessful attempts (env: PARLEY_RETRY_INTERVAL_MS)
    pub retry_interval: Duration,

    /// Oldest cached entry a lookup may return (env: PARLEY_CACHE_MAX_AGE_MS)
    pub cache_max_age: Duration,

    /// (env: PARLEY_DISCOVERY_SCOPE)
    pub discovery_scope: DiscoveryScope,

    /// Backends to query (env: PARLEY_GBIDS, comma-separated)
    pub gbids: Vec<String>,
}

impl Default for ArbitrationConfig {
    fn default() -> Self {
        Self {
            discovery_timeout: Duration::from_millis(600_000),
            retry_interval: Duration::from_millis(10_000),
            cache_max_age: Duration::ZERO,
            discovery_scope: DiscoveryScope::LocalThenGlobal,
            gbids: Vec::new(),
        }
    }
}

impl ArbitrationConfig {
    /// Create configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(ms) = parse_var::<u64, _>(&lookup, "PARLEY_DISCOVERY_TIMEOUT_MS") {
            config.discovery_timeout = Duration::from_millis(ms);
        }

        match parse_var::<u64, _>(&lookup, "PARLEY_RETRY_INTERVAL_MS") {
            Some(0) => {
                warn!(variable = "PARLEY_RETRY_INTERVAL_MS", "Ignoring zero retry interval");
            }
            Some(ms) => config.retry_interval = Duration::from_millis(ms),
            None => {}
        }

        if let Some(ms) = parse_var::<u64, _>(&lookup, "PARLEY_CACHE_MAX_AGE_MS") {
            config.cache_max_age = Duration::from_millis(ms);
        }

        if let Some(scope) = parse_var::<DiscoveryScope, _>(&lookup, "PARLEY_DISCOVERY_SCOPE") {
            config.discovery_scope = scope;
        }

        if let Some(gbids) = lookup("PARLEY_GBIDS") {
            config.gbids = gbids
                .split(',')
                .map(str::trim)
                .filter(|g| !g.is_empty())
                .map(String::from)
                .collect();
        }

        config
    }

    /// A request for `strategy` carrying these defaults.
    pub fn request(&self, strategy: ArbitrationStrategy) -> ArbitrationRequest {
        ArbitrationRequest::new(strategy)
            .with_discovery_timeout(self.discovery_timeout)
            .with_retry_interval(self.retry_interval)
            .with_cache_max_age(self.cache_max_age)
            .with_discovery_scope(self.discovery_scope)
    }
}

fn parse_var<T, F>(lookup: &F, name: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(name)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(variable = name, value = %raw, "Ignoring malformed configuration value");
            None
        }
    }
}
