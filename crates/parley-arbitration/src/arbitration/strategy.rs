//! Selection Strategies
//!
//! Each strategy picks at most one winner out of the version-compatible candidates
//! of a single discovery attempt. Compatibility filtering happens before any
//! strategy sees the candidates, see [`partition_by_version`].

use parley_core::{ArbitrationStrategy, DiscoveryEntry, Version, KEYWORD_PARAMETER};
use std::collections::BTreeSet;

/// A configured selection policy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StrategyFunction {
    HighestPriority { must_support_on_change: bool },
    LastSeen,
    Keyword { keyword: String },
    FixedParticipant { participant_id: String },
}

impl StrategyFunction {
    pub fn strategy(&self) -> ArbitrationStrategy {
        match self {
            StrategyFunction::HighestPriority { .. } => ArbitrationStrategy::HighestPriority,
            StrategyFunction::LastSeen => ArbitrationStrategy::LastSeen,
            StrategyFunction::Keyword { .. } => ArbitrationStrategy::Keyword,
            StrategyFunction::FixedParticipant { .. } => ArbitrationStrategy::FixedParticipant,
        }
    }

    /// Pick the winner among `candidates`. Ties go to the first candidate encountered.
    pub fn select<'a>(&self, candidates: &'a [DiscoveryEntry]) -> Option<&'a DiscoveryEntry> {
        match self {
            StrategyFunction::HighestPriority {
                must_support_on_change,
            } => first_max_by(
                candidates
                    .iter()
                    .filter(|e| !must_support_on_change || e.qos.supports_on_change_subscriptions),
                |e| e.qos.priority,
            ),
            StrategyFunction::LastSeen => first_max_by(candidates.iter(), |e| e.last_seen_date_ms),
            StrategyFunction::Keyword { keyword } => candidates.iter().find(|e| {
                e.qos
                    .custom_parameters
                    .iter()
                    .any(|p| p.name == KEYWORD_PARAMETER && p.value == *keyword)
            }),
            StrategyFunction::FixedParticipant { participant_id } => {
                candidates.iter().find(|e| e.participant_id == *participant_id)
            }
        }
    }
}

// Iterator::max_by_key keeps the last maximum; arbitration wants the first.
fn first_max_by<'a, I, F>(candidates: I, key: F) -> Option<&'a DiscoveryEntry>
where
    I: Iterator<Item = &'a DiscoveryEntry>,
    F: Fn(&DiscoveryEntry) -> i64,
{
    let mut best: Option<(&DiscoveryEntry, i64)> = None;
    for entry in candidates {
        let value = key(entry);
        match best {
            Some((_, current)) if current >= value => {}
            _ => best = Some((entry, value)),
        }
    }
    best.map(|(entry, _)| entry)
}

/// Split `entries` into the candidates compatible with `required` and the distinct
/// versions of the ones that are not.
pub fn partition_by_version(
    entries: Vec<DiscoveryEntry>,
    required: &Version,
) -> (Vec<DiscoveryEntry>, BTreeSet<Version>) {
    let mut incompatible = BTreeSet::new();
    let compatible = entries
        .into_iter()
        .filter(|e| {
            let ok = e.provider_version.is_compatible_with(required);
            if !ok {
                incompatible.insert(e.provider_version);
            }
            ok
        })
        .collect();
    (compatible, incompatible)
}
