//! Parley Arbitration Library
//!
//! Resolves a logical provider reference (domains, interface, required version)
//! into one concrete provider registration by querying a discovery service,
//! retrying within a time budget and selecting among compatible candidates.

pub mod arbitration;
pub mod config;
pub mod discovery;
pub mod observability;

pub use arbitration::{ArbitrationPhase, Arbitrator, ArbitratorFactory, StrategyFunction};
pub use config::ArbitrationConfig;
pub use discovery::{DiscoveryService, InMemoryDiscovery, LookupError, LookupResult};
