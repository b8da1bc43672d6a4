// In crates/engine/src/state.rs

use database::MetricsDocument;
use serde::{Deserialize, Serialize};

/// Why an evaluation is answered from the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CachedReason {
    AccountFailed,
    BridgeUnreachable,
}

/// Which data an evaluation is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationState {
    /// Fresh data from the bridge, merged into the cache.
    Live,
    /// The stored document, returned as is.
    CachedOnly { reason: CachedReason },
    /// Cache-only was required but nothing is stored. Terminal for the request.
    NoCache,
}

/// Outcome of trying to reach the account through the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeStatus {
    /// The bridge was not contacted, because the cached account is already failed.
    NotContacted,
    Connected,
    Unreachable,
}

/// A failed account never goes back to the bridge. Otherwise a connected bridge means
/// a live evaluation, and an unreachable one falls back to whatever is cached.
pub fn decide_state(cached: Option<&MetricsDocument>, bridge: BridgeStatus) -> EvaluationState {
    match (cached, bridge) {
        (Some(doc), _) if doc.is_failed() => EvaluationState::CachedOnly {
            reason: CachedReason::AccountFailed,
        },
        (_, BridgeStatus::Connected) => EvaluationState::Live,
        (Some(_), _) => EvaluationState::CachedOnly {
            reason: CachedReason::BridgeUnreachable,
        },
        (None, _) => EvaluationState::NoCache,
    }
}

/// Whether the bridge needs to be contacted at all before the state can be decided.
pub fn needs_bridge(cached: Option<&MetricsDocument>) -> bool {
    !cached.is_some_and(MetricsDocument::is_failed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use core_types::{AccountStatus, AccountSummary, MetricsSnapshot, ObjectiveSet, ProgramType};
    use rust_decimal_macros::dec;

    fn cached(status: AccountStatus) -> MetricsDocument {
        MetricsDocument {
            account_id: "acc".into(),
            owner_fingerprint: None,
            account_status: status,
            program_type: ProgramType::Standard,
            starting_balance: dec!(100000),
            metrics: MetricsSnapshot::default(),
            account: AccountSummary::default(),
            trades: Vec::new(),
            equity_chart: Vec::new(),
            objectives: ObjectiveSet::default(),
            last_updated: Utc::now(),
        }
    }

    #[test]
    fn failed_accounts_are_always_served_from_cache() {
        let doc = cached(AccountStatus::Failed);
        assert!(!needs_bridge(Some(&doc)));
        for bridge in [BridgeStatus::NotContacted, BridgeStatus::Connected, BridgeStatus::Unreachable] {
            assert_eq!(
                decide_state(Some(&doc), bridge),
                EvaluationState::CachedOnly { reason: CachedReason::AccountFailed }
            );
        }
    }

    #[test]
    fn connected_bridge_means_live() {
        let doc = cached(AccountStatus::Active);
        assert!(needs_bridge(Some(&doc)));
        assert!(needs_bridge(None));
        assert_eq!(decide_state(Some(&doc), BridgeStatus::Connected), EvaluationState::Live);
        assert_eq!(decide_state(None, BridgeStatus::Connected), EvaluationState::Live);
    }

    #[test]
    fn unreachable_bridge_falls_back_to_cache_or_nothing() {
        let doc = cached(AccountStatus::Active);
        assert_eq!(
            decide_state(Some(&doc), BridgeStatus::Unreachable),
            EvaluationState::CachedOnly { reason: CachedReason::BridgeUnreachable }
        );
        assert_eq!(decide_state(None, BridgeStatus::Unreachable), EvaluationState::NoCache);
    }
}
