// In crates/database/src/types.rs

use chrono::{DateTime, Utc};
use core_types::{
    AccountStatus, AccountSummary, ChartPoint, MetricsSnapshot, ObjectiveSet, ProgramType,
    TradeView,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// The one cached document kept per account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MetricsDocument {
    pub account_id: String,
    /// SHA-256 of the credential that first evaluated the account.
    #[serde(default)]
    pub owner_fingerprint: Option<String>,
    #[serde(default)]
    pub account_status: AccountStatus,
    pub program_type: ProgramType,
    pub starting_balance: Decimal,
    pub metrics: MetricsSnapshot,
    pub account: AccountSummary,
    #[serde(default)]
    pub trades: Vec<TradeView>,
    #[serde(default)]
    pub equity_chart: Vec<ChartPoint>,
    pub objectives: ObjectiveSet,
    pub last_updated: DateTime<Utc>,
}

impl MetricsDocument {
    pub fn max_daily_drawdown(&self) -> f64 {
        self.metrics.max_daily_drawdown
    }

    pub fn is_failed(&self) -> bool {
        self.account_status == AccountStatus::Failed
    }

    /// Whether `token` belongs to the account's recorded owner. Unowned documents accept anyone.
    pub fn is_owned_by(&self, token: &str) -> bool {
        self.owner_fingerprint
            .as_deref()
            .is_none_or(|owner| owner == credential_fingerprint(token))
    }
}

pub fn credential_fingerprint(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Folds an incoming document into what is already stored.
///
/// The incoming document replaces the stored one wholesale except for three fields:
/// the maximum daily drawdown keeps the larger of the two values, a failed status
/// stays failed, and the first recorded owner stays the owner.
pub fn merge_documents(stored: Option<&MetricsDocument>, mut incoming: MetricsDocument) -> MetricsDocument {
    let Some(stored) = stored else {
        return incoming;
    };

    incoming.metrics.max_daily_drawdown = incoming
        .metrics
        .max_daily_drawdown
        .max(stored.metrics.max_daily_drawdown);
    if stored.is_failed() {
        incoming.account_status = AccountStatus::Failed;
    }
    if stored.owner_fingerprint.is_some() {
        incoming.owner_fingerprint = stored.owner_fingerprint.clone();
    }
    incoming
}
