// In crates/analytics/src/types.rs

use core_types::{AccountState, ClassifiedTrade, EquitySample, PlatformMetrics};
use rust_decimal::Decimal;
use serde::Serialize;

/// Everything the bridge handed back for one evaluation.
///
/// A sub-fetch that failed shows up as `None` (account state), the default value
/// (platform metrics) or an empty slice (trades, equity).
#[derive(Debug, Clone, Copy)]
pub struct SnapshotInputs<'a> {
    pub account: Option<&'a AccountState>,
    pub platform: &'a PlatformMetrics,
    pub trades: &'a [ClassifiedTrade],
    pub equity: &'a [EquitySample],
    pub starting_balance: Decimal,
}

/// Statistics over the real, closed trades of an account.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TradeStats {
    pub total: u32,
    pub won: u32,
    pub lost: u32,
    pub gross_profit: Decimal,
    pub gross_loss: Decimal,
    pub average_win: Decimal,
    pub average_loss: Decimal,
    pub expectancy: Decimal,
    pub profit_factor: Option<f64>,
    pub lots: Decimal,
    pub commissions: Decimal,
}
