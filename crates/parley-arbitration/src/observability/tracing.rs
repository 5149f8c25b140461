//! Log Subscriber Setup
//!
//! Installs the global `tracing` subscriber used by parley binaries.
//!
//! Environment variables:
//! - `RUST_LOG` - filter directives (default: `info`)
//! - `LOG_FORMAT` - Set to `json` for JSON output (default: `text`)

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Configuration for tracing initialization
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
    /// Directive applied when `RUST_LOG` is unset
    pub default_level: LevelFilter,
    /// Write logs to stderr so stdout stays machine readable
    pub to_stderr: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            log_format: std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string()),
            default_level: LevelFilter::INFO,
            to_stderr: true,
        }
    }
}

impl TracingConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    pub fn with_default_level(mut self, level: LevelFilter) -> Self {
        self.default_level = level;
        self
    }

    pub fn is_json(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }
}

/// Initialize the tracing subscriber.
///
/// Fails if a global subscriber was already installed.
pub fn init_tracing(config: TracingConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter = EnvFilter::builder()
        .with_default_directive(config.default_level.into())
        .from_env_lossy();

    // The layer types differ per branch, so each builds its own registry.
    match (config.is_json(), config.to_stderr) {
        (true, true) => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?,
        (true, false) => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json())
            .try_init()?,
        (false, true) => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init()?,
        (false, false) => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer())
            .try_init()?,
    }

    tracing::debug!(format = %config.log_format, "Tracing initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracing_config_format() {
        let config = TracingConfig {
            log_format: "JSON".to_string(),
            ..TracingConfig::default()
        };
        assert!(config.is_json());
        assert_eq!(config.default_level, LevelFilter::INFO);

        let text = TracingConfig {
            log_format: "text".to_string(),
            ..TracingConfig::default()
        }
        .with_default_level(LevelFilter::DEBUG);
        assert!(!text.is_json());
        assert_eq!(text.default_level, LevelFilter::DEBUG);
    }
}
