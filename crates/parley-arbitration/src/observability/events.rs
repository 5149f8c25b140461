//! Structured Events
//!
//! One function per arbitration lifecycle event, so every record carries the
//! same field names.
//!
//! Event types:
//! - `arbitration_started` - an arbitrator issued its first lookup
//! - `attempt_failed` - one lookup did not produce a winner
//! - `arbitration_succeeded` - a provider was selected
//! - `arbitration_failed` - the arbitration gave up
//! - `arbitration_cancelled` - the arbitration was stopped before finishing

use tracing::{info, warn};

/// Emit an arbitration started event
pub fn arbitration_started(
    arbitration_id: &str,
    target: &str,
    strategy: &str,
    required_version: &str,
    timeout_ms: u128,
) {
    info!(
        target: "parley::arbitration",
        event_type = "arbitration_started",
        arbitration_id = %arbitration_id,
        lookup_target = %target,
        strategy = %strategy,
        required_version = %required_version,
        timeout_ms = timeout_ms as u64,
        "Arbitration started"
    );
}

/// Emit an attempt failed event
pub fn attempt_failed(arbitration_id: &str, attempt: u32, cause: &str, will_retry: bool) {
    info!(
        target: "parley::arbitration",
        event_type = "attempt_failed",
        arbitration_id = %arbitration_id,
        attempt = attempt,
        cause = %cause,
        will_retry = will_retry,
        "Arbitration attempt failed"
    );
}

/// Emit an arbitration succeeded event
pub fn arbitration_succeeded(
    arbitration_id: &str,
    participant_id: &str,
    provider_version: &str,
    attempts: u32,
    elapsed_ms: u128,
) {
    info!(
        target: "parley::arbitration",
        event_type = "arbitration_succeeded",
        arbitration_id = %arbitration_id,
        participant_id = %participant_id,
        provider_version = %provider_version,
        attempts = attempts,
        elapsed_ms = elapsed_ms as u64,
        "Arbitration succeeded"
    );
}

/// Emit an arbitration failed event
pub fn arbitration_failed(arbitration_id: &str, error: &str, attempts: u32, elapsed_ms: u128) {
    warn!(
        target: "parley::arbitration",
        event_type = "arbitration_failed",
        arbitration_id = %arbitration_id,
        error = %error,
        attempts = attempts,
        elapsed_ms = elapsed_ms as u64,
        "Arbitration failed"
    );
}

/// Emit an arbitration cancelled event
pub fn arbitration_cancelled(arbitration_id: &str, interface: &str, attempts: u32) {
    info!(
        target: "parley::arbitration",
        event_type = "arbitration_cancelled",
        arbitration_id = %arbitration_id,
        interface = %interface,
        attempts = attempts,
        "Arbitration cancelled"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_functions_dont_panic() {
        arbitration_started("a-1", "domain: [vehicle], interface: radio", "HIGHEST_PRIORITY", "1.2", 600_000);
        attempt_failed("a-1", 1, "No entries found", true);
        arbitration_succeeded("a-1", "radio-7", "1.3", 2, 10_250);
        arbitration_failed("a-1", "Arbitration could not be finished in time.", 0, 600_000);
        arbitration_cancelled("a-1", "radio", 3);
    }
}
