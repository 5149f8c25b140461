//! Discovery Fixtures
//!
//! YAML files describing the provider registrations an in-memory discovery
//! service answers with.
//!
//! ```yaml
//! knownGbids: [joynrdefaultgbid]
//! entries:
//!   - providerVersion: { major: 1, minor: 2 }
//!     domain: vehicle
//!     interfaceName: radio
//!     participantId: radio-fm
//!     qos: { priority: 5 }
//! ```

use anyhow::Context;
use parley_arbitration::InMemoryDiscovery;
use parley_core::{DiscoveryEntry, Version, KEYWORD_PARAMETER};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Fixture {
    /// Backends the fixture answers for. Absent means any non-empty gbid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub known_gbids: Option<Vec<String>>,

    #[serde(default)]
    pub entries: Vec<DiscoveryEntry>,
}

impl Fixture {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading fixture {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("parsing fixture {}", path.display()))
    }

    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(raw)?)
    }

    pub fn into_discovery(self) -> InMemoryDiscovery {
        let discovery = InMemoryDiscovery::with_entries(self.entries);
        match self.known_gbids {
            Some(gbids) => discovery.with_known_gbids(gbids),
            None => discovery,
        }
    }

    /// A small fixture with two radio providers, seen at `now_ms`.
    pub fn example(now_ms: i64) -> Self {
        Self {
            known_gbids: Some(vec!["joynrdefaultgbid".to_string()]),
            entries: vec![
                DiscoveryEntry::new("vehicle", "radio", "radio-fm", Version::new(1, 2))
                    .with_priority(5)
                    .with_last_seen(now_ms)
                    .with_custom_parameter(KEYWORD_PARAMETER, "fm")
                    .local(true),
                DiscoveryEntry::new("vehicle", "radio", "radio-dab", Version::new(1, 4))
                    .with_priority(9)
                    .with_last_seen(now_ms - 60_000)
                    .with_custom_parameter(KEYWORD_PARAMETER, "dab")
                    .with_on_change_support(true),
            ],
        }
    }

    pub fn example_yaml() -> anyhow::Result<String> {
        let now_ms = chrono::Utc::now().timestamp_millis();
        Ok(serde_yaml::to_string(&Self::example(now_ms))?)
    }
}
