//! One-shot provider resolution against a fixture.

use crate::fixture::Fixture;
use clap::Args;
use parley_arbitration::{ArbitrationConfig, ArbitratorFactory};
use parley_core::{ArbitrationError, ArbitrationStrategy, DiscoveryEntry, DiscoveryScope, Version};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Arguments of `parley resolve`
#[derive(Args, Debug, Clone)]
pub struct ResolveArgs {
    /// YAML fixture with the provider registrations to arbitrate between
    #[arg(long, env = "PARLEY_FIXTURE")]
    pub fixture: PathBuf,

    /// Domain to search (repeatable)
    #[arg(long = "domain", required = true)]
    pub domains: Vec<String>,

    /// Interface name the provider must implement
    #[arg(long)]
    pub interface: String,

    /// Interface version the consumer was built against, as MAJOR.MINOR
    #[arg(long)]
    pub version: Version,

    #[arg(long, default_value_t = ArbitrationStrategy::HighestPriority)]
    pub strategy: ArbitrationStrategy,

    /// Keyword for the KEYWORD strategy
    #[arg(long)]
    pub keyword: Option<String>,

    /// Participant id for the FIXED_PARTICIPANT strategy
    #[arg(long)]
    pub participant_id: Option<String>,

    /// Discovery backend to query (repeatable, default: PARLEY_GBIDS)
    #[arg(long = "gbid")]
    pub gbids: Vec<String>,

    /// Total arbitration budget (default: PARLEY_DISCOVERY_TIMEOUT_MS)
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Wait between attempts (default: PARLEY_RETRY_INTERVAL_MS)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub retry_ms: Option<u64>,

    #[arg(long)]
    pub scope: Option<DiscoveryScope>,

    /// Only accept providers supporting on-change subscriptions
    #[arg(long)]
    pub require_on_change: bool,

    /// Print Prometheus metrics to stderr when done
    #[arg(long)]
    pub metrics: bool,
}

/// Arbitrate once over the providers in `fixture`.
///
/// Ctrl-C stops the arbitration; the outcome is then the cancellation error.
pub async fn resolve(
    args: &ResolveArgs,
    fixture: Fixture,
    config: &ArbitrationConfig,
) -> Result<DiscoveryEntry, ArbitrationError> {
    let mut request = config.request(args.strategy);
    if let Some(ms) = args.timeout_ms {
        request = request.with_discovery_timeout(Duration::from_millis(ms));
    }
    if let Some(ms) = args.retry_ms {
        request = request.with_retry_interval(Duration::from_millis(ms));
    }
    if let Some(scope) = args.scope {
        request = request.with_discovery_scope(scope);
    }
    if let Some(keyword) = &args.keyword {
        request = request.with_keyword(keyword.clone());
    }
    if let Some(participant_id) = &args.participant_id {
        request = request.with_fixed_participant(participant_id.clone());
    }
    request = request.with_provider_must_support_on_change(args.require_on_change);

    let gbids = if args.gbids.is_empty() {
        config.gbids.clone()
    } else {
        args.gbids.clone()
    };

    let arbitrator = ArbitratorFactory::create_arbitrator(
        args.domains.clone(),
        args.interface.clone(),
        args.version,
        Arc::new(fixture.into_discovery()),
        request,
        gbids,
    )?;
    info!(arbitration_id = %arbitrator.id(), lookup_target = %arbitrator.target(), "Resolving provider");

    let stopper = arbitrator.clone();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            stopper.stop_arbitration();
        }
    });

    let outcome = arbitrator.arbitrate().await;
    interrupt.abort();
    outcome
}
