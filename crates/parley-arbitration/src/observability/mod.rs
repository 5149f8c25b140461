//! Observability Module
//!
//! - `metrics`: Prometheus metrics for arbitrations
//! - `events`: Structured event logging with consistent fields
//! - `tracing`: subscriber setup for binaries

pub mod events;
pub mod metrics;
pub mod tracing;

pub use self::metrics::{init_metrics, MetricsState};
pub use self::tracing::{init_tracing, TracingConfig};
