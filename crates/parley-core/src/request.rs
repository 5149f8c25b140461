//! Arbitration Requests
//!
//! What a consumer asks for when it needs a provider: the selection strategy,
//! the time budget, and the parameters forwarded to each discovery lookup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use strum::{Display, EnumString};

/// Custom parameter holding the keyword matched by [`ArbitrationStrategy::Keyword`].
pub const KEYWORD_PARAMETER: &str = "keyword";

/// Custom parameter holding the participant id used by
/// [`ArbitrationStrategy::FixedParticipant`].
pub const FIXED_PARTICIPANT_PARAMETER: &str = "fixedParticipantId";

/// Which discovery backends a lookup may consult.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscoveryScope {
    LocalOnly,
    #[default]
    LocalThenGlobal,
    LocalAndGlobal,
    GlobalOnly,
}

/// Parameters sent along with every discovery lookup.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryQos {
    pub cache_max_age_ms: i64,
    pub discovery_timeout_ms: i64,
    pub discovery_scope: DiscoveryScope,
    pub provider_must_support_on_change: bool,
}

/// Policy used to pick one provider among the compatible candidates.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq, Hash, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ArbitrationStrategy {
    /// Resolve one known participant id.
    FixedParticipant,
    /// First provider whose `keyword` custom parameter matches.
    Keyword,
    /// Provider with the highest registered priority.
    #[default]
    HighestPriority,
    /// Provider seen alive most recently.
    LastSeen,
}

/// A consumer's request for a provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArbitrationRequest {
    pub strategy: ArbitrationStrategy,
    /// Total wall-clock budget for the arbitration.
    pub discovery_timeout: Duration,
    /// Wait between unsuccessful attempts.
    pub retry_interval: Duration,
    pub cache_max_age: Duration,
    pub discovery_scope: DiscoveryScope,
    pub provider_must_support_on_change: bool,
    pub custom_parameters: HashMap<String, String>,
}

impl Default for ArbitrationRequest {
    fn default() -> Self {
        Self {
            strategy: ArbitrationStrategy::default(),
            discovery_timeout: Duration::from_millis(600_000),
            retry_interval: Duration::from_millis(10_000),
            cache_max_age: Duration::ZERO,
            discovery_scope: DiscoveryScope::default(),
            provider_must_support_on_change: false,
            custom_parameters: HashMap::new(),
        }
    }
}

impl ArbitrationRequest {
    pub fn new(strategy: ArbitrationStrategy) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }

    pub fn with_discovery_timeout(mut self, timeout: Duration) -> Self {
        self.discovery_timeout = timeout;
        self
    }

    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    pub fn with_cache_max_age(mut self, max_age: Duration) -> Self {
        self.cache_max_age = max_age;
        self
    }

    pub fn with_discovery_scope(mut self, scope: DiscoveryScope) -> Self {
        self.discovery_scope = scope;
        self
    }

    pub fn with_provider_must_support_on_change(mut self, required: bool) -> Self {
        self.provider_must_support_on_change = required;
        self
    }

    pub fn with_custom_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_parameters.insert(name.into(), value.into());
        self
    }

    /// Shorthand for the keyword strategy's parameter.
    pub fn with_keyword(self, keyword: impl Into<String>) -> Self {
        self.with_custom_parameter(KEYWORD_PARAMETER, keyword)
    }

    /// Shorthand for the fixed-participant strategy's parameter.
    pub fn with_fixed_participant(self, participant_id: impl Into<String>) -> Self {
        self.with_custom_parameter(FIXED_PARTICIPANT_PARAMETER, participant_id)
    }

    pub fn custom_parameter(&self, name: &str) -> Option<&str> {
        self.custom_parameters.get(name).map(String::as_str)
    }

    /// Lookup parameters for a lookup issued with `remaining` budget left.
    pub fn lookup_qos(&self, remaining: Duration) -> DiscoveryQos {
        DiscoveryQos {
            cache_max_age_ms: duration_to_ms(self.cache_max_age),
            discovery_timeout_ms: duration_to_ms(remaining),
            discovery_scope: self.discovery_scope,
            provider_must_support_on_change: self.provider_must_support_on_change,
        }
    }
}

fn duration_to_ms(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_request() {
        let request = ArbitrationRequest::default();
        assert_eq!(request.strategy, ArbitrationStrategy::HighestPriority);
        assert_eq!(request.discovery_timeout, Duration::from_secs(600));
        assert_eq!(request.retry_interval, Duration::from_secs(10));
        assert_eq!(request.discovery_scope, DiscoveryScope::LocalThenGlobal);
    }

    #[test]
    fn test_strategy_literals() {
        assert_eq!(ArbitrationStrategy::LastSeen.to_string(), "LAST_SEEN");
        assert_eq!(
            "FIXED_PARTICIPANT".parse::<ArbitrationStrategy>().unwrap(),
            ArbitrationStrategy::FixedParticipant
        );
        assert!("MOST_POPULAR".parse::<ArbitrationStrategy>().is_err());
    }

    #[test]
    fn test_lookup_qos_carries_remaining_budget() {
        let request = ArbitrationRequest::new(ArbitrationStrategy::LastSeen)
            .with_cache_max_age(Duration::from_millis(250))
            .with_discovery_scope(DiscoveryScope::GlobalOnly)
            .with_provider_must_support_on_change(true);
        let qos = request.lookup_qos(Duration::from_millis(1_500));
        assert_eq!(qos.cache_max_age_ms, 250);
        assert_eq!(qos.discovery_timeout_ms, 1_500);
        assert_eq!(qos.discovery_scope, DiscoveryScope::GlobalOnly);
        assert!(qos.provider_must_support_on_change);
    }

    #[test]
    fn test_keyword_shorthand() {
        let request = ArbitrationRequest::new(ArbitrationStrategy::Keyword).with_keyword("fm");
        assert_eq!(request.custom_parameter(KEYWORD_PARAMETER), Some("fm"));
        assert_eq!(request.custom_parameter(FIXED_PARTICIPANT_PARAMETER), None);
    }
}
