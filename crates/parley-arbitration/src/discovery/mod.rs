//! Discovery Service
//!
//! The arbitration engine does not store provider registrations itself. It asks a
//! discovery service through [`DiscoveryService`], which offers two lookup shapes:
//!
//! - bulk lookup of every provider of an interface in a set of domains
//! - single lookup of one registration by participant id
//!
//! Both resolve asynchronously and report failures on the same channel: either a
//! typed [`DiscoveryErrorCode`] replied by the service, or a runtime error when the
//! call itself could not be completed.

mod memory;

pub use memory::InMemoryDiscovery;

use futures::future::BoxFuture;
use parley_core::{DiscoveryEntry, DiscoveryErrorCode, DiscoveryQos};
use thiserror::Error;

/// Failure of a single discovery lookup.
#[derive(Debug, Error)]
pub enum LookupError {
    /// The service answered with a typed error code.
    #[error("discovery error {0}")]
    Application(DiscoveryErrorCode),
    /// The call did not complete (transport failure, service unavailable, ...).
    #[error(transparent)]
    Runtime(#[from] anyhow::Error),
}

pub type LookupResult<T> = Result<T, LookupError>;

/// Asynchronous provider lookup.
///
/// Implementations may complete the returned future on any task. An arbitration
/// keeps at most one lookup outstanding and drops the future without awaiting it
/// when the arbitration is stopped or runs out of time.
pub trait DiscoveryService: Send + Sync {
    /// All registrations of `interface_name` in any of `domains`.
    fn lookup(
        &self,
        domains: Vec<String>,
        interface_name: String,
        qos: DiscoveryQos,
        gbids: Vec<String>,
    ) -> BoxFuture<'_, LookupResult<Vec<DiscoveryEntry>>>;

    /// The registration of `participant_id`.
    fn lookup_by_participant(
        &self,
        participant_id: String,
        interface_name: String,
        qos: DiscoveryQos,
        gbids: Vec<String>,
    ) -> BoxFuture<'_, LookupResult<DiscoveryEntry>>;
}
