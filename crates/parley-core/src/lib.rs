//! Core shared types for parley
//!
//! Value types exchanged between consumers, the arbitration engine and the
//! discovery service: provider registrations, interface versions, lookup
//! parameters and arbitration errors.

mod entry;
mod error;
mod request;
mod version;

pub use entry::{CustomParameter, DiscoveryEntry, ProviderQos, ProviderScope};
pub use error::{ArbitrationError, ArbitrationTarget, DiscoveryErrorCode};
pub use request::{
    ArbitrationRequest, ArbitrationStrategy, DiscoveryQos, DiscoveryScope,
    FIXED_PARTICIPANT_PARAMETER, KEYWORD_PARAMETER,
};
pub use version::Version;
