// In crates/api-client/src/types.rs

use chrono::{DateTime, Utc};
use core_types::{PlatformMetrics, RawTrade};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;

/// HTTP implementation of the trading-platform bridge.
#[derive(Debug, Clone)]
pub struct HttpBridge {
    /// The persistent HTTP client.
    pub http_client: Client,
    /// Base URL of the provisioning / trading API.
    pub base_url: String,
    /// Base URL of the aggregated statistics API.
    pub metrics_base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub poll_interval: Duration,
    pub history_lookback: chrono::Duration,
}

/// Error body returned by the bridge on non-2xx responses.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiErrorBody {
    pub fn describe(&self) -> String {
        match (&self.error, &self.message) {
            (Some(e), Some(m)) => format!("{e}: {m}"),
            (Some(e), None) => e.clone(),
            (None, Some(m)) => m.clone(),
            (None, None) => "Unknown error".to_string(),
        }
    }
}

/// Envelope around the statistics endpoint's payload.
#[derive(Debug, Deserialize)]
pub struct MetricsEnvelope {
    #[serde(default)]
    pub metrics: PlatformMetrics,
}

/// A history deal as the bridge returns it.
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct WireDeal {
    pub id: String,
    #[serde(rename = "type", default)]
    pub deal_type: String,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub volume: Option<Decimal>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub profit: Option<Decimal>,
    #[serde(default)]
    pub commission: Option<Decimal>,
    #[serde(default)]
    pub swap: Option<Decimal>,
    pub time: DateTime<Utc>,
    /// `DEAL_ENTRY_IN` opens a position, `DEAL_ENTRY_OUT` closes one.
    #[serde(default)]
    pub entry_type: Option<String>,
    #[serde(default)]
    pub position_id: Option<String>,
}

/// An open position as the bridge returns it.
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct WirePosition {
    pub id: String,
    #[serde(rename = "type", default)]
    pub position_type: String,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub volume: Option<Decimal>,
    #[serde(default)]
    pub open_price: Option<Decimal>,
    #[serde(default)]
    pub current_price: Option<Decimal>,
    #[serde(default)]
    pub profit: Option<Decimal>,
    #[serde(default)]
    pub commission: Option<Decimal>,
    #[serde(default)]
    pub swap: Option<Decimal>,
    pub time: DateTime<Utc>,
}

impl From<WirePosition> for RawTrade {
    fn from(p: WirePosition) -> Self {
        RawTrade {
            id: p.id,
            symbol: p.symbol,
            type_tag: p.position_type,
            volume: p.volume.unwrap_or_default(),
            open_price: p.open_price,
            close_price: p.current_price,
            profit: p.profit.unwrap_or_default(),
            open_time: Some(p.time),
            close_time: None,
            commission: p.commission.unwrap_or_default(),
            swap: p.swap.unwrap_or_default(),
            is_open: true,
        }
    }
}
