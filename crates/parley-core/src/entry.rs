//! Discovery Entries
//!
//! Provider registration records as returned by the discovery service. These are
//! the candidates an arbitration chooses between.

use crate::version::Version;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Visibility of a provider registration.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ProviderScope {
    /// Only reachable from the local cluster controller.
    Local,
    /// Registered with the global discovery directory.
    #[default]
    Global,
}

/// Free-form key/value attribute attached to a provider registration.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct CustomParameter {
    pub name: String,
    pub value: String,
}

impl CustomParameter {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Quality-of-service attributes a provider registered with.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProviderQos {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_parameters: Vec<CustomParameter>,

    /// Higher wins under the highest-priority strategy.
    #[serde(default)]
    pub priority: i64,

    #[serde(default)]
    pub scope: ProviderScope,

    #[serde(default)]
    pub supports_on_change_subscriptions: bool,
}

impl ProviderQos {
    /// Value of the first custom parameter called `name`.
    pub fn custom_parameter(&self, name: &str) -> Option<&str> {
        self.custom_parameters
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }
}

/// A provider registration.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryEntry {
    pub provider_version: Version,
    pub domain: String,
    pub interface_name: String,
    pub participant_id: String,

    #[serde(default)]
    pub qos: ProviderQos,

    /// Milliseconds since the Unix epoch at which the provider was last seen alive.
    #[serde(default)]
    pub last_seen_date_ms: i64,

    /// Milliseconds since the Unix epoch after which the registration is stale.
    #[serde(default = "never_expires")]
    pub expiry_date_ms: i64,

    #[serde(default)]
    pub public_key_id: String,

    /// Whether the provider is registered with the local cluster controller.
    #[serde(default)]
    pub is_local: bool,
}

fn never_expires() -> i64 {
    i64::MAX
}

impl DiscoveryEntry {
    /// Minimal registration; the remaining attributes take their defaults.
    pub fn new(
        domain: impl Into<String>,
        interface_name: impl Into<String>,
        participant_id: impl Into<String>,
        provider_version: Version,
    ) -> Self {
        Self {
            provider_version,
            domain: domain.into(),
            interface_name: interface_name.into(),
            participant_id: participant_id.into(),
            qos: ProviderQos::default(),
            last_seen_date_ms: 0,
            expiry_date_ms: never_expires(),
            public_key_id: String::new(),
            is_local: false,
        }
    }

    pub fn with_qos(mut self, qos: ProviderQos) -> Self {
        self.qos = qos;
        self
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.qos.priority = priority;
        self
    }

    pub fn with_last_seen(mut self, last_seen_date_ms: i64) -> Self {
        self.last_seen_date_ms = last_seen_date_ms;
        self
    }

    pub fn with_expiry(mut self, expiry_date_ms: i64) -> Self {
        self.expiry_date_ms = expiry_date_ms;
        self
    }

    pub fn with_custom_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.qos.custom_parameters.push(CustomParameter::new(name, value));
        self
    }

    pub fn with_on_change_support(mut self, supported: bool) -> Self {
        self.qos.supports_on_change_subscriptions = supported;
        self
    }

    pub fn local(mut self, is_local: bool) -> Self {
        self.is_local = is_local;
        self
    }

    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        self.expiry_date_ms < now_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_deserialize_with_defaults() {
        let json = r#"{
            "providerVersion": { "major": 1, "minor": 4 },
            "domain": "vehicle",
            "interfaceName": "radio",
            "participantId": "radio-provider-1",
            "qos": {
                "priority": 12,
                "customParameters": [{ "name": "keyword", "value": "fm" }]
            }
        }"#;
        let entry: DiscoveryEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.provider_version, Version::new(1, 4));
        assert_eq!(entry.qos.priority, 12);
        assert_eq!(entry.qos.scope, ProviderScope::Global);
        assert_eq!(entry.qos.custom_parameter("keyword"), Some("fm"));
        assert_eq!(entry.expiry_date_ms, i64::MAX);
        assert!(!entry.is_local);
    }

    #[test]
    fn test_custom_parameter_first_wins() {
        let entry = DiscoveryEntry::new("d", "i", "p", Version::new(0, 0))
            .with_custom_parameter("keyword", "first")
            .with_custom_parameter("keyword", "second");
        assert_eq!(entry.qos.custom_parameter("keyword"), Some("first"));
        assert_eq!(entry.qos.custom_parameter("missing"), None);
    }

    #[test]
    fn test_expiry() {
        let entry = DiscoveryEntry::new("d", "i", "p", Version::new(0, 0)).with_expiry(1_000);
        assert!(!entry.is_expired_at(999));
        assert!(!entry.is_expired_at(1_000));
        assert!(entry.is_expired_at(1_001));
    }

    #[test]
    fn test_provider_scope_literals() {
        assert_eq!(ProviderScope::Local.to_string(), "LOCAL");
        assert_eq!("GLOBAL".parse::<ProviderScope>().unwrap(), ProviderScope::Global);
    }
}
