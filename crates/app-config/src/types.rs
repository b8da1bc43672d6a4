// In crates/app-config/src/types.rs

use serde::Deserialize;

#[derive(Deserialize, Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Settings {
    /// The application's general settings.
    pub app: AppSettings,
    /// Settings for the trading-platform bridge.
    pub bridge: BridgeSettings,
    /// Settings for the metrics document store.
    pub database: DatabaseSettings,
    pub server: ServerSettings,
    #[serde(default)]
    pub classifier: ClassifierSettings,
    #[serde(default)]
    pub evaluation: EvaluationSettings,
}

#[derive(Deserialize, Debug, Clone)]
pub struct AppSettings {
    /// The environment the application is running in (e.g., "development", "production").
    pub environment: String,
    /// The log level for the application.
    pub log_level: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct BridgeSettings {
    /// Base URL of the account provisioning / trading API.
    pub base_url: String,
    /// Base URL of the aggregated statistics API. Defaults to `base_url`.
    #[serde(default)]
    pub metrics_base_url: Option<String>,
    /// How long to wait for an account to deploy and connect.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Upper bound for each individual data fetch.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// How far back trade history and the equity series are requested.
    #[serde(default = "default_lookback_days")]
    pub history_lookback_days: i64,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Postgres,
    Memory,
}

#[derive(Deserialize, Debug, Clone)]
pub struct DatabaseSettings {
    #[serde(default)]
    pub backend: StoreBackend,
    /// The connection URL for the PostgreSQL database.
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

/// Broker type-tag markers that identify non-trading ledger rows.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ClassifierSettings {
    #[serde(default = "default_excluded_types")]
    pub excluded_types: Vec<String>,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            excluded_types: default_excluded_types(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct EvaluationSettings {
    #[serde(default = "default_recent_trades_limit")]
    pub recent_trades_limit: usize,
    /// Flag the account as failed once a drawdown objective is breached.
    #[serde(default = "default_enabled")]
    pub fail_on_drawdown_breach: bool,
}

impl Default for EvaluationSettings {
    fn default() -> Self {
        Self {
            recent_trades_limit: default_recent_trades_limit(),
            fail_on_drawdown_breach: default_enabled(),
        }
    }
}

/// Extra broker vocabulary loaded from a standalone TOML file.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct VocabularyFile {
    #[serde(default)]
    pub excluded_types: Vec<String>,
}

/// Helper functions for serde defaults
fn default_connect_timeout() -> u64 { 20 }
fn default_request_timeout() -> u64 { 15 }
fn default_lookback_days() -> i64 { 90 }
fn default_max_connections() -> u32 { 5 }
fn default_recent_trades_limit() -> usize { 50 }
fn default_enabled() -> bool { true }

pub fn default_excluded_types() -> Vec<String> {
    [
        "BALANCE",
        "CREDIT",
        "CHARGE",
        "CORRECTION",
        "BONUS",
        "COMMISSION",
        "INTEREST",
        "DIVIDEND",
        "TAX",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
