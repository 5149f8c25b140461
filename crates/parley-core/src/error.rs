//! Arbitration Errors
//!
//! Error codes reported by the discovery service and the failures an arbitration
//! can end with.

use crate::version::Version;
use std::collections::BTreeSet;
use std::fmt;
use strum::EnumString;
use thiserror::Error;

/// Typed error replied by the discovery service.
#[derive(Clone, Debug, PartialEq, Eq, Hash, EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscoveryErrorCode {
    NoEntryForParticipant,
    NoEntryForSelectedBackends,
    UnknownGbid,
    InvalidGbid,
    InternalError,
    /// Any code this build does not know about.
    #[strum(default)]
    Unknown(String),
}

impl DiscoveryErrorCode {
    /// Retryable codes may clear up on a later attempt; everything else aborts
    /// the arbitration.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DiscoveryErrorCode::NoEntryForParticipant | DiscoveryErrorCode::NoEntryForSelectedBackends
        )
    }
}

impl fmt::Display for DiscoveryErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscoveryErrorCode::NoEntryForParticipant => write!(f, "NO_ENTRY_FOR_PARTICIPANT"),
            DiscoveryErrorCode::NoEntryForSelectedBackends => {
                write!(f, "NO_ENTRY_FOR_SELECTED_BACKENDS")
            }
            DiscoveryErrorCode::UnknownGbid => write!(f, "UNKNOWN_GBID"),
            DiscoveryErrorCode::InvalidGbid => write!(f, "INVALID_GBID"),
            DiscoveryErrorCode::InternalError => write!(f, "INTERNAL_ERROR"),
            DiscoveryErrorCode::Unknown(code) => write!(f, "{code}"),
        }
    }
}

/// What an arbitration is trying to resolve.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArbitrationTarget {
    /// Any provider of `interface_name` in one of `domains`.
    Interface {
        domains: Vec<String>,
        interface_name: String,
    },
    /// One specific registration.
    Participant {
        participant_id: String,
        interface_name: String,
    },
}

impl ArbitrationTarget {
    pub fn interface_name(&self) -> &str {
        match self {
            ArbitrationTarget::Interface { interface_name, .. }
            | ArbitrationTarget::Participant { interface_name, .. } => interface_name,
        }
    }
}

impl fmt::Display for ArbitrationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArbitrationTarget::Interface {
                domains,
                interface_name,
            } => write!(f, "domain: [{}], interface: {}", domains.join(", "), interface_name),
            ArbitrationTarget::Participant { participant_id, .. } => {
                write!(f, "participantId: {participant_id}")
            }
        }
    }
}

/// Why an arbitration did not produce a provider.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ArbitrationError {
    #[error("No entries found for {target}")]
    NoEntries { target: ArbitrationTarget },

    #[error(
        "Unable to find a provider with a compatible version for {target}. {} incompatible versions found: {}",
        .versions.len(),
        join_versions(.versions)
    )]
    NoCompatibleProvider {
        target: ArbitrationTarget,
        versions: BTreeSet<Version>,
    },

    #[error("{message}")]
    LookupFailed { message: String },

    #[error("Arbitration could not be finished in time.")]
    TimedOut,

    #[error("Shutting Down Arbitration for interface: {interface_name}")]
    Cancelled { interface_name: String },

    #[error("invalid arbitration configuration: {0}")]
    InvalidConfiguration(String),

    #[error("arbitration has already been started")]
    AlreadyStarted,

    #[error("no async runtime available to drive the arbitration")]
    NoRuntime,
}

impl ArbitrationError {
    /// Versions seen on the last attempt that returned only incompatible providers.
    pub fn incompatible_versions(&self) -> Option<&BTreeSet<Version>> {
        match self {
            ArbitrationError::NoCompatibleProvider { versions, .. } => Some(versions),
            _ => None,
        }
    }

    /// Whether this is a discovery failure (as opposed to a usage or configuration error).
    pub fn is_discovery_exception(&self) -> bool {
        !matches!(
            self,
            ArbitrationError::InvalidConfiguration(_)
                | ArbitrationError::AlreadyStarted
                | ArbitrationError::NoRuntime
        )
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ArbitrationError::Cancelled { .. })
    }
}

fn join_versions(versions: &BTreeSet<Version>) -> String {
    versions
        .iter()
        .map(Version::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
