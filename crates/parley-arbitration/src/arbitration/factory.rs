//! Arbitrator construction.
//!
//! Validates a request and turns it into an [`Arbitrator`] with the matching
//! lookup shape and strategy. Nothing here touches the discovery service.

use super::arbitrator::Arbitrator;
use super::strategy::StrategyFunction;
use crate::discovery::DiscoveryService;
use parley_core::{
    ArbitrationError, ArbitrationRequest, ArbitrationStrategy, ArbitrationTarget, Version,
    FIXED_PARTICIPANT_PARAMETER, KEYWORD_PARAMETER,
};
use std::sync::Arc;
use tracing::debug;

pub struct ArbitratorFactory;

impl ArbitratorFactory {
    /// Build an arbitrator for `interface_name` in `domains`.
    ///
    /// `FIXED_PARTICIPANT` resolves the participant named by the request's
    /// `fixedParticipantId` parameter; every other strategy looks up all providers
    /// in `domains`.
    pub fn create_arbitrator(
        domains: Vec<String>,
        interface_name: impl Into<String>,
        required_version: Version,
        discovery: Arc<dyn DiscoveryService>,
        request: ArbitrationRequest,
        gbids: Vec<String>,
    ) -> Result<Arbitrator, ArbitrationError> {
        let interface_name = interface_name.into();

        let (target, strategy) = match request.strategy {
            ArbitrationStrategy::FixedParticipant => {
                let participant_id = required_parameter(&request, FIXED_PARTICIPANT_PARAMETER)?;
                (
                    ArbitrationTarget::Participant {
                        participant_id: participant_id.clone(),
                        interface_name,
                    },
                    StrategyFunction::FixedParticipant { participant_id },
                )
            }
            ArbitrationStrategy::Keyword => {
                let keyword = required_parameter(&request, KEYWORD_PARAMETER)?;
                (
                    interface_target(domains, interface_name)?,
                    StrategyFunction::Keyword { keyword },
                )
            }
            ArbitrationStrategy::HighestPriority => (
                interface_target(domains, interface_name)?,
                StrategyFunction::HighestPriority {
                    must_support_on_change: request.provider_must_support_on_change,
                },
            ),
            ArbitrationStrategy::LastSeen => (
                interface_target(domains, interface_name)?,
                StrategyFunction::LastSeen,
            ),
        };

        debug!(
            lookup_target = %target,
            strategy = %request.strategy,
            required_version = %required_version,
            "Creating arbitrator"
        );
        Ok(Arbitrator::new(
            target,
            required_version,
            strategy,
            request,
            gbids,
            discovery,
        ))
    }
}

fn required_parameter(request: &ArbitrationRequest, name: &str) -> Result<String, ArbitrationError> {
    request
        .custom_parameter(name)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            ArbitrationError::InvalidConfiguration(format!(
                "strategy {} requires the custom parameter {name}",
                request.strategy
            ))
        })
}

fn interface_target(
    domains: Vec<String>,
    interface_name: String,
) -> Result<ArbitrationTarget, ArbitrationError> {
    if domains.is_empty() {
        return Err(ArbitrationError::InvalidConfiguration(format!(
            "no domains given for interface {interface_name}"
        )));
    }
    Ok(ArbitrationTarget::Interface {
        domains,
        interface_name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arbitration::ArbitrationPhase;
    use crate::discovery::InMemoryDiscovery;
    use parley_core::DiscoveryEntry;
    use std::time::Duration;

    fn discovery() -> Arc<InMemoryDiscovery> {
        Arc::new(InMemoryDiscovery::with_entries(vec![
            DiscoveryEntry::new("vehicle", "radio", "radio-1", Version::new(1, 0))
                .with_priority(3)
                .with_last_seen(500)
                .with_custom_parameter(KEYWORD_PARAMETER, "am"),
            DiscoveryEntry::new("vehicle", "radio", "radio-2", Version::new(1, 1))
                .with_priority(8)
                .with_last_seen(100)
                .with_custom_parameter(KEYWORD_PARAMETER, "fm"),
            DiscoveryEntry::new("vehicle", "radio", "radio-3", Version::new(2, 0)).with_priority(20),
        ]))
    }

    fn create(request: ArbitrationRequest) -> Result<Arbitrator, ArbitrationError> {
        ArbitratorFactory::create_arbitrator(
            vec!["vehicle".to_string()],
            "radio",
            Version::new(1, 0),
            discovery(),
            request.with_discovery_timeout(Duration::from_millis(500)),
            vec![],
        )
    }

    #[test]
    fn test_missing_keyword_is_rejected() {
        let err = create(ArbitrationRequest::new(ArbitrationStrategy::Keyword)).unwrap_err();
        assert!(matches!(err, ArbitrationError::InvalidConfiguration(_)));
        assert!(err.to_string().contains("keyword"));
    }

    #[test]
    fn test_missing_fixed_participant_is_rejected() {
        let err = create(ArbitrationRequest::new(ArbitrationStrategy::FixedParticipant)).unwrap_err();
        assert!(matches!(err, ArbitrationError::InvalidConfiguration(_)));
        assert!(err.to_string().contains(FIXED_PARTICIPANT_PARAMETER));

        let empty = create(
            ArbitrationRequest::new(ArbitrationStrategy::FixedParticipant).with_fixed_participant(""),
        );
        assert!(empty.is_err());
    }

    #[test]
    fn test_empty_domains_are_rejected() {
        let err = ArbitratorFactory::create_arbitrator(
            vec![],
            "radio",
            Version::new(1, 0),
            discovery(),
            ArbitrationRequest::default(),
            vec![],
        )
        .unwrap_err();
        assert!(matches!(err, ArbitrationError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_strategy_and_target_selection() {
        let fixed = create(
            ArbitrationRequest::new(ArbitrationStrategy::FixedParticipant).with_fixed_participant("radio-2"),
        )
        .unwrap();
        assert_eq!(
            fixed.target(),
            &ArbitrationTarget::Participant {
                participant_id: "radio-2".to_string(),
                interface_name: "radio".to_string(),
            }
        );
        assert_eq!(fixed.strategy().strategy(), ArbitrationStrategy::FixedParticipant);

        let on_change = create(
            ArbitrationRequest::new(ArbitrationStrategy::HighestPriority)
                .with_provider_must_support_on_change(true),
        )
        .unwrap();
        assert_eq!(
            on_change.strategy(),
            &StrategyFunction::HighestPriority {
                must_support_on_change: true
            }
        );
        assert_eq!(on_change.phase(), ArbitrationPhase::Idle);
    }

    #[tokio::test]
    async fn test_end_to_end_with_in_memory_discovery() {
        let highest = create(ArbitrationRequest::new(ArbitrationStrategy::HighestPriority))
            .unwrap()
            .arbitrate()
            .await
            .unwrap();
        assert_eq!(highest.participant_id, "radio-2");

        let last_seen = create(ArbitrationRequest::new(ArbitrationStrategy::LastSeen))
            .unwrap()
            .arbitrate()
            .await
            .unwrap();
        assert_eq!(last_seen.participant_id, "radio-1");

        let keyword = create(ArbitrationRequest::new(ArbitrationStrategy::Keyword).with_keyword("fm"))
            .unwrap()
            .arbitrate()
            .await
            .unwrap();
        assert_eq!(keyword.participant_id, "radio-2");

        let fixed = create(
            ArbitrationRequest::new(ArbitrationStrategy::FixedParticipant).with_fixed_participant("radio-1"),
        )
        .unwrap()
        .arbitrate()
        .await
        .unwrap();
        assert_eq!(fixed.participant_id, "radio-1");
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixed_participant_with_incompatible_version() {
        let err = create(
            ArbitrationRequest::new(ArbitrationStrategy::FixedParticipant)
                .with_fixed_participant("radio-3")
                .with_retry_interval(Duration::from_millis(100)),
        )
        .unwrap()
        .arbitrate()
        .await
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unable to find a provider with a compatible version for participantId: radio-3. \
             1 incompatible versions found: 2.0"
        );
    }
}
