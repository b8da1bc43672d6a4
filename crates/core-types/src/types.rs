// In crates/core-types/src/types.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// The funding program an account is being evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgramType {
    Standard,
    Instant,
}

impl FromStr for ProgramType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(ProgramType::Standard),
            "instant" => Ok(ProgramType::Instant),
            other => Err(Error::UnknownProgramType(other.to_string())),
        }
    }
}

impl fmt::Display for ProgramType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgramType::Standard => write!(f, "standard"),
            ProgramType::Instant => write!(f, "instant"),
        }
    }
}

/// Normalized trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Buy,
    Sell,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    #[default]
    Active,
    Failed,
}

/// Where the data in a response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Live,
    Cache,
}

/// The opaque account identifier plus the credential used to reach it through the bridge.
#[derive(Clone)]
pub struct Credentials {
    pub account_id: String,
    pub token: String,
}

impl Credentials {
    pub fn new(account_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            token: token.into(),
        }
    }
}

// The token never ends up in logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("account_id", &self.account_id)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Account metadata returned once the bridge has deployed and connected the account.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub broker: Option<String>,
    #[serde(default)]
    pub server: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub deployment_state: Option<String>,
    #[serde(default)]
    pub connection_status: Option<String>,
}

/// Live account state as reported by the bridge.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AccountState {
    #[serde(default)]
    pub id: String,
    pub balance: Decimal,
    pub equity: Decimal,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub leverage: u32,
    #[serde(default)]
    pub connection_status: Option<String>,
}

/// A single deal or position as the broker reports it. The type tag is free-form.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawTrade {
    pub id: String,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(rename = "type", default)]
    pub type_tag: String,
    #[serde(default)]
    pub volume: Decimal,
    #[serde(default)]
    pub open_price: Option<Decimal>,
    #[serde(default)]
    pub close_price: Option<Decimal>,
    #[serde(default)]
    pub profit: Decimal,
    #[serde(default)]
    pub open_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub close_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub commission: Decimal,
    #[serde(default)]
    pub swap: Decimal,
    #[serde(default)]
    pub is_open: bool,
}

/// A `RawTrade` plus the classification derived from it. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedTrade {
    pub trade: RawTrade,
    pub is_real: bool,
    pub direction: Direction,
}

/// One hourly bucket of the bridge's equity series.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EquitySample {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Broker-local timestamp of the bucket, e.g. `2024-03-01 10:00:00.000`.
    #[serde(default, alias = "startBrokerTime")]
    pub broker_time: Option<String>,
    #[serde(default)]
    pub start_equity: Option<Decimal>,
    #[serde(default, alias = "lastEquity")]
    pub end_equity: Option<Decimal>,
    #[serde(default)]
    pub average_equity: Option<Decimal>,
    #[serde(default)]
    pub start_balance: Option<Decimal>,
    #[serde(default, alias = "lastBalance")]
    pub end_balance: Option<Decimal>,
    #[serde(default)]
    pub average_balance: Option<Decimal>,
}

impl EquitySample {
    /// The last known equity of the bucket.
    ///
    /// Preference order: end equity, average equity, start equity, then end balance
    /// when the platform reported no equity at all.
    pub fn current_equity(&self) -> Option<Decimal> {
        self.end_equity
            .or(self.average_equity)
            .or(self.start_equity)
            .or(self.end_balance)
    }

    /// The calendar day this bucket belongs to: the date of the broker timestamp when it
    /// parses, otherwise the UTC date of the bucket start.
    pub fn day(&self) -> NaiveDate {
        self.broker_time
            .as_deref()
            .and_then(|t| t.get(..10))
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            .unwrap_or_else(|| self.start_time.date_naive())
    }
}

/// Aggregate statistics the trading platform computes on its side. Any field may be missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlatformMetrics {
    #[serde(default)]
    pub trades: Option<u32>,
    #[serde(default)]
    pub won_trades: Option<u32>,
    #[serde(default)]
    pub lost_trades: Option<u32>,
    #[serde(default)]
    pub average_win: Option<Decimal>,
    #[serde(default)]
    pub average_loss: Option<Decimal>,
    #[serde(default)]
    pub expectancy: Option<Decimal>,
    #[serde(default)]
    pub profit_factor: Option<f64>,
    /// Lifetime maximum drawdown, in percent.
    #[serde(default)]
    pub max_drawdown: Option<f64>,
    /// The platform's own relative (daily) drawdown, in percent.
    #[serde(default)]
    pub relative_drawdown: Option<f64>,
    #[serde(default)]
    pub lots: Option<Decimal>,
    #[serde(default)]
    pub commissions: Option<Decimal>,
    #[serde(default)]
    pub trading_days: Option<u32>,
}

/// The canonical metrics of one evaluation. This is what gets persisted and returned.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub balance: Decimal,
    pub equity: Decimal,
    pub open_profit: Decimal,
    pub trades: u32,
    pub won_trades: u32,
    pub lost_trades: u32,
    pub average_win: Decimal,
    pub average_loss: Decimal,
    pub expectancy: Decimal,
    /// `None` when there are no losing trades to divide by.
    pub profit_factor: Option<f64>,
    pub max_drawdown: f64,
    /// Worst intraday drawdown observed by this evaluation.
    pub daily_drawdown: f64,
    /// Worst intraday drawdown ever observed for the account. Never decreases.
    pub max_daily_drawdown: f64,
    pub lots: Decimal,
    pub commissions: Decimal,
    pub win_rate: f64,
    #[serde(rename = "averageRRR")]
    pub average_rrr: f64,
    pub trading_days: u32,
    pub profit_percentage: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct ObjectiveResult {
    pub target: f64,
    pub current: f64,
    pub passed: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ObjectiveSet {
    pub min_trading_days: ObjectiveResult,
    pub max_drawdown: ObjectiveResult,
    pub max_daily_drawdown: ObjectiveResult,
    pub profit_target: ObjectiveResult,
}

impl ObjectiveSet {
    /// True when either drawdown rule has been breached.
    pub fn drawdown_breached(&self) -> bool {
        !self.max_drawdown.passed || !self.max_daily_drawdown.passed
    }

    pub fn all_passed(&self) -> bool {
        self.min_trading_days.passed
            && self.max_drawdown.passed
            && self.max_daily_drawdown.passed
            && self.profit_target.passed
    }
}

/// Account fields shown alongside the metrics.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    pub account_id: String,
    pub name: String,
    pub broker: Option<String>,
    pub server: Option<String>,
    pub currency: String,
    pub leverage: u32,
    pub balance: Decimal,
    pub equity: Decimal,
    pub connection_status: Option<String>,
}

/// A trade as it is returned to callers and kept in the cached document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TradeView {
    pub id: String,
    pub symbol: Option<String>,
    #[serde(rename = "type")]
    pub direction: Direction,
    pub volume: Decimal,
    pub open_price: Option<Decimal>,
    pub close_price: Option<Decimal>,
    pub profit: Decimal,
    pub open_time: Option<DateTime<Utc>>,
    pub close_time: Option<DateTime<Utc>>,
    pub commission: Decimal,
    pub swap: Decimal,
    pub is_open: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChartPoint {
    pub timestamp: DateTime<Utc>,
    pub equity: Decimal,
    pub balance: Decimal,
}
