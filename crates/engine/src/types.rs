// In crates/engine/src/types.rs

use crate::error::{Error, Result};
use crate::state::CachedReason;
use chrono::{DateTime, Utc};
use core_types::{
    AccountStatus, AccountSummary, ChartPoint, Credentials, DataSource, MetricsSnapshot,
    ObjectiveSet, ProgramType, TradeView,
};
use database::MetricsDocument;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One request to evaluate an account against a funding program.
#[derive(Debug, Clone)]
pub struct EvaluationRequest {
    pub credentials: Credentials,
    pub program_type: ProgramType,
    pub starting_balance: Decimal,
    /// Skips the ownership check.
    pub admin_override: bool,
}

impl EvaluationRequest {
    pub fn new(
        credentials: Credentials,
        program_type: ProgramType,
        starting_balance: Decimal,
        admin_override: bool,
    ) -> Self {
        Self {
            credentials,
            program_type,
            starting_balance,
            admin_override,
        }
    }

    pub fn account_id(&self) -> &str {
        &self.credentials.account_id
    }

    /// Rejects requests that must never reach the bridge or the store.
    pub fn validate(&self) -> Result<()> {
        if self.credentials.account_id.trim().is_empty() {
            return Err(Error::InvalidRequest("accountId is required".into()));
        }
        if self.credentials.token.trim().is_empty() {
            return Err(Error::InvalidRequest("token is required".into()));
        }
        if self.starting_balance <= Decimal::ZERO {
            return Err(Error::InvalidRequest(
                "startingBalance must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// What an evaluation hands back, whichever state produced it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResponse {
    pub metrics: MetricsSnapshot,
    pub account: AccountSummary,
    pub trades: Vec<TradeView>,
    pub equity_chart: Vec<ChartPoint>,
    pub objectives: ObjectiveSet,
    pub source: DataSource,
    pub is_historical: bool,
    pub account_status: AccountStatus,
    /// Set only on cached responses: `accountFailed` or `bridgeUnreachable`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_reason: Option<CachedReason>,
    pub last_updated: DateTime<Utc>,
}

impl EvaluationResponse {
    pub fn from_document(
        document: MetricsDocument,
        source: DataSource,
        account_status: AccountStatus,
    ) -> Self {
        Self {
            metrics: document.metrics,
            account: document.account,
            trades: document.trades,
            equity_chart: document.equity_chart,
            objectives: document.objectives,
            source,
            is_historical: source == DataSource::Cache,
            account_status,
            cache_reason: None,
            last_updated: document.last_updated,
        }
    }

    pub fn with_cache_reason(mut self, reason: CachedReason) -> Self {
        self.cache_reason = Some(reason);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn request(account_id: &str, token: &str, balance: Decimal) -> EvaluationRequest {
        EvaluationRequest::new(
            Credentials::new(account_id, token),
            ProgramType::Standard,
            balance,
            false,
        )
    }

    #[test]
    fn blank_fields_and_non_positive_balances_are_rejected() {
        assert!(request("acc", "tok", dec!(100000)).validate().is_ok());
        assert!(matches!(
            request("  ", "tok", dec!(100000)).validate(),
            Err(Error::InvalidRequest(_))
        ));
        assert!(matches!(
            request("acc", "", dec!(100000)).validate(),
            Err(Error::InvalidRequest(_))
        ));
        assert!(matches!(
            request("acc", "tok", dec!(0)).validate(),
            Err(Error::InvalidRequest(_))
        ));
    }
}
