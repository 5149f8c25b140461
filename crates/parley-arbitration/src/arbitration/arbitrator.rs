//! Arbitrator
//!
//! Drives one arbitration: repeated discovery lookups, each filtered for version
//! compatibility and handed to the configured strategy, until a provider wins,
//! the time budget runs out, a fatal discovery error arrives, or the caller stops
//! it. The outcome is delivered exactly once.
//!
//! ```text
//! Idle ──start──> Attempting ──winner──────> Succeeded
//!   │                 │ ├─────give up/fatal─> Failed
//!   └──stop──┐        │ └───stop────────────> Cancelled
//!            └────────┴─────────────────────> Cancelled
//! ```

use super::strategy::{partition_by_version, StrategyFunction};
use crate::discovery::{DiscoveryService, LookupError, LookupResult};
use crate::observability::{events, metrics};
use parley_core::{ArbitrationError, ArbitrationRequest, ArbitrationTarget, DiscoveryEntry, Version};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::time::{sleep, sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info_span, Instrument};
use uuid::Uuid;

/// Used when `start + discovery_timeout` is not representable.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

type Completion = Box<dyn FnOnce(Result<DiscoveryEntry, ArbitrationError>) + Send>;

/// Lifecycle of an [`Arbitrator`]. The last three are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArbitrationPhase {
    Idle,
    Attempting,
    Succeeded,
    Failed,
    Cancelled,
}

impl ArbitrationPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ArbitrationPhase::Succeeded | ArbitrationPhase::Failed | ArbitrationPhase::Cancelled
        )
    }
}

/// Why the most recent completed attempt did not produce a winner.
#[derive(Clone, Debug, PartialEq, Eq)]
enum FailureCause {
    NoEntries,
    Incompatible,
    LookupFailed(String),
}

enum AttemptOutcome {
    Selected(DiscoveryEntry),
    Fatal(ArbitrationError),
    Retry,
}

struct ArbitrationState {
    phase: ArbitrationPhase,
    completion: Option<Completion>,
    /// Versions from the latest discovery reply, when all its candidates were incompatible.
    incompatible_versions: BTreeSet<Version>,
    last_cause: Option<FailureCause>,
    attempts: u32,
    started_at: Option<Instant>,
}

struct ArbitratorInner {
    id: Uuid,
    target: ArbitrationTarget,
    required_version: Version,
    strategy: StrategyFunction,
    request: ArbitrationRequest,
    gbids: Vec<String>,
    discovery: Arc<dyn DiscoveryService>,
    cancel: CancellationToken,
    state: Mutex<ArbitrationState>,
}

/// Handle to one arbitration. Clones share the same arbitration.
#[derive(Clone)]
pub struct Arbitrator {
    inner: Arc<ArbitratorInner>,
}

impl Arbitrator {
    pub(crate) fn new(
        target: ArbitrationTarget,
        required_version: Version,
        strategy: StrategyFunction,
        request: ArbitrationRequest,
        gbids: Vec<String>,
        discovery: Arc<dyn DiscoveryService>,
    ) -> Self {
        Self {
            inner: Arc::new(ArbitratorInner {
                id: Uuid::new_v4(),
                target,
                required_version,
                strategy,
                request,
                gbids,
                discovery,
                cancel: CancellationToken::new(),
                state: Mutex::new(ArbitrationState {
                    phase: ArbitrationPhase::Idle,
                    completion: None,
                    incompatible_versions: BTreeSet::new(),
                    last_cause: None,
                    attempts: 0,
                    started_at: None,
                }),
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn target(&self) -> &ArbitrationTarget {
        &self.inner.target
    }

    pub fn required_version(&self) -> Version {
        self.inner.required_version
    }

    pub fn strategy(&self) -> &StrategyFunction {
        &self.inner.strategy
    }

    pub fn phase(&self) -> ArbitrationPhase {
        self.inner.lock_state().phase
    }

    /// Number of discovery lookups issued so far.
    pub fn attempts(&self) -> u32 {
        self.inner.lock_state().attempts
    }

    /// Start arbitrating in the background.
    ///
    /// Exactly one of the continuations runs, once. Must be called from within a
    /// tokio runtime. Usage errors (already started, stopped before start, no
    /// runtime) go to this call's `on_error` and leave a running arbitration alone.
    pub fn start_arbitration<S, E>(&self, on_success: S, on_error: E)
    where
        S: FnOnce(DiscoveryEntry) + Send + 'static,
        E: FnOnce(ArbitrationError) + Send + 'static,
    {
        self.start_with(Box::new(move |result| match result {
            Ok(entry) => on_success(entry),
            Err(error) => on_error(error),
        }));
    }

    /// Start arbitrating and wait for the outcome.
    pub async fn arbitrate(&self) -> Result<DiscoveryEntry, ArbitrationError> {
        let (tx, rx) = oneshot::channel();
        self.start_with(Box::new(move |result| {
            let _ = tx.send(result);
        }));
        rx.await.unwrap_or_else(|_| Err(self.inner.cancelled_error()))
    }

    /// Stop the arbitration.
    ///
    /// Wakes a pending retry wait and discards any lookup still in flight. If the
    /// arbitration had not finished, its error continuation runs on the calling
    /// thread before this returns. Safe to call repeatedly.
    pub fn stop_arbitration(&self) {
        let inner = &self.inner;
        inner.cancel.cancel();

        let (completion, attempts, started_at) = {
            let mut state = inner.lock_state();
            if state.phase.is_terminal() {
                return;
            }
            state.phase = ArbitrationPhase::Cancelled;
            (state.completion.take(), state.attempts, state.started_at)
        };

        events::arbitration_cancelled(
            &inner.id.to_string(),
            inner.target.interface_name(),
            attempts,
        );
        if let Some(started_at) = started_at {
            metrics::record_outcome("cancelled", started_at.elapsed());
        }
        if let Some(completion) = completion {
            completion(Err(inner.cancelled_error()));
        }
    }

    fn start_with(&self, completion: Completion) {
        let runtime = match Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                completion(Err(ArbitrationError::NoRuntime));
                return;
            }
        };

        let inner = &self.inner;
        let started_at = Instant::now();
        let rejected = {
            let mut state = inner.lock_state();
            match state.phase {
                ArbitrationPhase::Idle => {
                    state.phase = ArbitrationPhase::Attempting;
                    state.completion = Some(completion);
                    state.started_at = Some(started_at);
                    None
                }
                ArbitrationPhase::Cancelled => Some((completion, inner.cancelled_error())),
                _ => Some((completion, ArbitrationError::AlreadyStarted)),
            }
        };
        if let Some((completion, error)) = rejected {
            debug!(arbitration_id = %inner.id, error = %error, "Rejected arbitration start");
            completion(Err(error));
            return;
        }

        let strategy = inner.strategy.strategy().to_string();
        events::arbitration_started(
            &inner.id.to_string(),
            &inner.target.to_string(),
            &strategy,
            &inner.required_version.to_string(),
            inner.request.discovery_timeout.as_millis(),
        );
        metrics::record_arbitration_started(&strategy);

        let span = info_span!(
            "arbitration",
            arbitration_id = %inner.id,
            interface = %inner.target.interface_name(),
            strategy = %strategy,
        );
        runtime.spawn(Arc::clone(inner).run(started_at).instrument(span));
    }
}

impl fmt::Debug for Arbitrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arbitrator")
            .field("id", &self.inner.id)
            .field("target", &self.inner.target)
            .field("required_version", &self.inner.required_version)
            .field("strategy", &self.inner.strategy)
            .field("phase", &self.phase())
            .finish()
    }
}

impl ArbitratorInner {
    fn lock_state(&self) -> MutexGuard<'_, ArbitrationState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn cancelled_error(&self) -> ArbitrationError {
        ArbitrationError::Cancelled {
            interface_name: self.target.interface_name().to_string(),
        }
    }

    async fn run(self: Arc<Self>, started_at: Instant) {
        let deadline = started_at
            .checked_add(self.request.discovery_timeout)
            .unwrap_or_else(|| started_at + FAR_FUTURE);
        let retry_interval = self.request.retry_interval;

        loop {
            let attempt = self.begin_attempt();
            let remaining = deadline.saturating_duration_since(Instant::now());

            let result = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return,
                _ = sleep_until(deadline) => {
                    debug!(attempt, "Deadline passed with a lookup in flight");
                    self.give_up(started_at);
                    return;
                }
                result = self.lookup(remaining) => result,
            };

            // stop_arbitration may have won the race with the lookup
            if self.cancel.is_cancelled() {
                return;
            }

            match self.evaluate(attempt, result) {
                AttemptOutcome::Selected(entry) => {
                    self.finish(Ok(entry), started_at);
                    return;
                }
                AttemptOutcome::Fatal(error) => {
                    self.finish(Err(error), started_at);
                    return;
                }
                AttemptOutcome::Retry => {}
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining <= retry_interval {
                self.give_up(started_at);
                return;
            }

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return,
                _ = sleep(retry_interval) => {}
            }
        }
    }

    fn begin_attempt(&self) -> u32 {
        let attempt = {
            let mut state = self.lock_state();
            state.attempts += 1;
            state.attempts
        };
        metrics::record_attempt(&self.strategy.strategy().to_string());
        attempt
    }

    async fn lookup(&self, remaining: Duration) -> LookupResult<Vec<DiscoveryEntry>> {
        let qos = self.request.lookup_qos(remaining);
        match &self.target {
            ArbitrationTarget::Interface {
                domains,
                interface_name,
            } => {
                self.discovery
                    .lookup(domains.clone(), interface_name.clone(), qos, self.gbids.clone())
                    .await
            }
            ArbitrationTarget::Participant {
                participant_id,
                interface_name,
            } => self
                .discovery
                .lookup_by_participant(
                    participant_id.clone(),
                    interface_name.clone(),
                    qos,
                    self.gbids.clone(),
                )
                .await
                .map(|entry| vec![entry]),
        }
    }

    fn evaluate(&self, attempt: u32, result: LookupResult<Vec<DiscoveryEntry>>) -> AttemptOutcome {
        let entries = match result {
            Ok(entries) => entries,
            Err(LookupError::Application(code)) if !code.is_retryable() => {
                let message = self.lookup_failure_message(&format!("DiscoveryError: {code}"));
                self.attempt_failed(attempt, &format!("{message}, giving up."), false);
                return AttemptOutcome::Fatal(ArbitrationError::LookupFailed {
                    message: format!("{message}, giving up."),
                });
            }
            Err(LookupError::Application(code)) => {
                let message = self.lookup_failure_message(&format!("DiscoveryError: {code}"));
                return self.retry_after(attempt, FailureCause::LookupFailed(message));
            }
            Err(LookupError::Runtime(error)) => {
                let message = self.lookup_failure_message(&error.to_string());
                return self.retry_after(attempt, FailureCause::LookupFailed(message));
            }
        };

        // Only the latest discovery reply counts; failed lookups leave the set alone.
        self.lock_state().incompatible_versions.clear();

        if entries.is_empty() {
            return self.retry_after(attempt, FailureCause::NoEntries);
        }

        let (compatible, incompatible) = partition_by_version(entries, &self.required_version);
        if compatible.is_empty() {
            debug!(
                attempt,
                versions = ?incompatible,
                required = %self.required_version,
                "Only incompatible providers found"
            );
            self.lock_state().incompatible_versions = incompatible;
            return self.retry_after(attempt, FailureCause::Incompatible);
        }

        match self.strategy.select(&compatible) {
            Some(winner) => AttemptOutcome::Selected(winner.clone()),
            None => self.retry_after(attempt, FailureCause::NoEntries),
        }
    }

    fn lookup_failure_message(&self, error: &str) -> String {
        format!(
            "Unable to lookup provider ({}, gbids: [{}]) from discovery. Error: {}",
            self.target,
            self.gbids.join(", "),
            error
        )
    }

    fn retry_after(&self, attempt: u32, cause: FailureCause) -> AttemptOutcome {
        let description = match &cause {
            FailureCause::NoEntries => format!("No entries found for {}", self.target),
            FailureCause::Incompatible => "No compatible provider version".to_string(),
            FailureCause::LookupFailed(message) => format!("{message}, continuing."),
        };
        self.attempt_failed(attempt, &description, true);
        self.lock_state().last_cause = Some(cause);
        AttemptOutcome::Retry
    }

    fn attempt_failed(&self, attempt: u32, cause: &str, will_retry: bool) {
        events::attempt_failed(&self.id.to_string(), attempt, cause, will_retry);
    }

    fn give_up(&self, started_at: Instant) {
        let error = {
            let state = self.lock_state();
            match &state.last_cause {
                None => ArbitrationError::TimedOut,
                Some(_) if !state.incompatible_versions.is_empty() => {
                    ArbitrationError::NoCompatibleProvider {
                        target: self.target.clone(),
                        versions: state.incompatible_versions.clone(),
                    }
                }
                Some(FailureCause::LookupFailed(message)) => ArbitrationError::LookupFailed {
                    message: format!("{message}, continuing."),
                },
                Some(_) => ArbitrationError::NoEntries {
                    target: self.target.clone(),
                },
            }
        };
        self.finish(Err(error), started_at);
    }

    fn finish(&self, result: Result<DiscoveryEntry, ArbitrationError>, started_at: Instant) {
        let (completion, attempts) = {
            let mut state = self.lock_state();
            if state.phase.is_terminal() {
                return;
            }
            state.phase = if result.is_ok() {
                ArbitrationPhase::Succeeded
            } else {
                ArbitrationPhase::Failed
            };
            (state.completion.take(), state.attempts)
        };

        let elapsed = started_at.elapsed();
        let id = self.id.to_string();
        match &result {
            Ok(entry) => {
                events::arbitration_succeeded(
                    &id,
                    &entry.participant_id,
                    &entry.provider_version.to_string(),
                    attempts,
                    elapsed.as_millis(),
                );
                metrics::record_outcome("succeeded", elapsed);
            }
            Err(error) => {
                events::arbitration_failed(&id, &error.to_string(), attempts, elapsed.as_millis());
                metrics::record_outcome(outcome_label(error), elapsed);
            }
        }

        if let Some(completion) = completion {
            completion(result);
        }
    }
}

fn outcome_label(error: &ArbitrationError) -> &'static str {
    match error {
        ArbitrationError::NoEntries { .. } => "no_entries",
        ArbitrationError::NoCompatibleProvider { .. } => "no_compatible_provider",
        ArbitrationError::LookupFailed { .. } => "lookup_failed",
        ArbitrationError::TimedOut => "timed_out",
        ArbitrationError::Cancelled { .. } => "cancelled",
        ArbitrationError::InvalidConfiguration(_)
        | ArbitrationError::AlreadyStarted
        | ArbitrationError::NoRuntime => "rejected",
    }
}
