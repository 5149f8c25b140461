//! In-Memory Discovery
//!
//! A [`DiscoveryService`] backed by a local registry of entries. Used by the CLI to
//! resolve providers from a fixture file and by tests that need realistic lookups.

use super::{DiscoveryService, LookupError, LookupResult};
use futures::future::BoxFuture;
use parley_core::{DiscoveryEntry, DiscoveryErrorCode, DiscoveryQos, DiscoveryScope};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, trace};

/// Registry of provider entries answering discovery lookups.
#[derive(Clone, Default)]
pub struct InMemoryDiscovery {
    entries: Arc<RwLock<Vec<DiscoveryEntry>>>,
    /// Backends this registry answers for (None = accept any non-empty gbid)
    known_gbids: Option<Vec<String>>,
}

impl InMemoryDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: Vec<DiscoveryEntry>) -> Self {
        Self {
            entries: Arc::new(RwLock::new(entries)),
            known_gbids: None,
        }
    }

    /// Restrict lookups to the given backends; any other gbid is rejected.
    pub fn with_known_gbids(mut self, gbids: Vec<String>) -> Self {
        self.known_gbids = Some(gbids);
        self
    }

    /// Add or replace the registration with the same participant id.
    pub async fn register(&self, entry: DiscoveryEntry) {
        let mut entries = self.entries.write().await;
        entries.retain(|e| e.participant_id != entry.participant_id);
        debug!(
            participant_id = %entry.participant_id,
            domain = %entry.domain,
            interface = %entry.interface_name,
            version = %entry.provider_version,
            "Registering provider"
        );
        entries.push(entry);
    }

    /// Remove a registration. Returns whether it existed.
    pub async fn unregister(&self, participant_id: &str) -> bool {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|e| e.participant_id != participant_id);
        before != entries.len()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    fn validate_gbids(&self, gbids: &[String]) -> Result<(), DiscoveryErrorCode> {
        for gbid in gbids {
            if gbid.trim().is_empty() {
                return Err(DiscoveryErrorCode::InvalidGbid);
            }
            if let Some(known) = &self.known_gbids {
                if !known.contains(gbid) {
                    return Err(DiscoveryErrorCode::UnknownGbid);
                }
            }
        }
        Ok(())
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Apply the discovery scope to the matching, unexpired entries.
fn apply_scope(matches: Vec<DiscoveryEntry>, scope: DiscoveryScope) -> Vec<DiscoveryEntry> {
    match scope {
        DiscoveryScope::LocalOnly => matches.into_iter().filter(|e| e.is_local).collect(),
        DiscoveryScope::GlobalOnly => matches.into_iter().filter(|e| !e.is_local).collect(),
        DiscoveryScope::LocalThenGlobal => {
            if matches.iter().any(|e| e.is_local) {
                matches.into_iter().filter(|e| e.is_local).collect()
            } else {
                matches
            }
        }
        DiscoveryScope::LocalAndGlobal => matches,
    }
}

impl DiscoveryService for InMemoryDiscovery {
    fn lookup(
        &self,
        domains: Vec<String>,
        interface_name: String,
        qos: DiscoveryQos,
        gbids: Vec<String>,
    ) -> BoxFuture<'_, LookupResult<Vec<DiscoveryEntry>>> {
        Box::pin(async move {
            self.validate_gbids(&gbids)
                .map_err(LookupError::Application)?;

            let now = now_ms();
            let matches: Vec<DiscoveryEntry> = self
                .entries
                .read()
                .await
                .iter()
                .filter(|e| e.interface_name == interface_name && domains.contains(&e.domain))
                .filter(|e| !e.is_expired_at(now))
                .cloned()
                .collect();

            let result = apply_scope(matches, qos.discovery_scope);
            trace!(
                domains = ?domains,
                interface = %interface_name,
                scope = %qos.discovery_scope,
                found = result.len(),
                "In-memory lookup"
            );
            Ok(result)
        })
    }

    fn lookup_by_participant(
        &self,
        participant_id: String,
        interface_name: String,
        qos: DiscoveryQos,
        gbids: Vec<String>,
    ) -> BoxFuture<'_, LookupResult<DiscoveryEntry>> {
        Box::pin(async move {
            self.validate_gbids(&gbids)
                .map_err(LookupError::Application)?;

            let now = now_ms();
            let found = self
                .entries
                .read()
                .await
                .iter()
                .find(|e| {
                    e.participant_id == participant_id
                        && e.interface_name == interface_name
                        && !e.is_expired_at(now)
                })
                .cloned();

            let in_scope = found
                .map(|e| apply_scope(vec![e], qos.discovery_scope))
                .and_then(|mut v| v.pop());

            trace!(
                participant_id = %participant_id,
                found = in_scope.is_some(),
                "In-memory participant lookup"
            );
            in_scope.ok_or(LookupError::Application(DiscoveryErrorCode::NoEntryForParticipant))
        })
    }
}
