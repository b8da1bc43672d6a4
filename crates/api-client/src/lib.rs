// In crates/api-client/src/lib.rs

use app_config::BridgeSettings;
use async_trait::async_trait;
use chrono::Utc;
use core_types::{AccountInfo, AccountState, Credentials, EquitySample, PlatformMetrics, RawTrade};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

pub mod error;
pub mod types;

// Re-export public types
pub use error::{Error, Result};
pub use types::*;

const AUTH_HEADER: &str = "auth-token";
const DEPLOYED: &str = "DEPLOYED";
const CONNECTED: &str = "CONNECTED";

/// The trading-platform bridge as the evaluation core sees it.
///
/// Every call is a single attempt bounded by its own timeout. Callers decide what a
/// failure means; the bridge never retries.
#[async_trait]
pub trait Bridge: Send + Sync {
    /// Makes sure the account is deployed and connected, waiting up to the connect timeout.
    async fn connect(&self, credentials: &Credentials) -> Result<AccountInfo>;

    async fn account_state(&self, credentials: &Credentials) -> Result<AccountState>;

    async fn platform_metrics(&self, credentials: &Credentials) -> Result<PlatformMetrics>;

    /// Closed history trades followed by currently open positions.
    async fn trades(&self, credentials: &Credentials) -> Result<Vec<RawTrade>>;

    /// The hourly equity/balance series for the lookback window.
    async fn equity_series(&self, credentials: &Credentials) -> Result<Vec<EquitySample>>;
}

impl HttpBridge {
    /// Constructs a new HttpBridge from BridgeSettings.
    pub fn new(settings: &BridgeSettings) -> Result<Self> {
        let request_timeout = Duration::from_secs(settings.request_timeout_secs);
        let http_client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| Error::ClientBuildError(e.to_string()))?;

        let base_url = settings.base_url.trim_end_matches('/').to_string();
        let metrics_base_url = settings
            .metrics_base_url
            .as_deref()
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| base_url.clone());

        Ok(HttpBridge {
            http_client,
            base_url,
            metrics_base_url,
            connect_timeout: Duration::from_secs(settings.connect_timeout_secs),
            request_timeout,
            poll_interval: Duration::from_secs(1),
            history_lookback: chrono::Duration::days(settings.history_lookback_days),
        })
    }

    fn account_url(&self, account_id: &str, path: &str) -> String {
        format!("{}/users/current/accounts/{}{}", self.base_url, account_id, path)
    }

    fn metrics_url(&self, account_id: &str, path: &str) -> String {
        format!("{}/users/current/accounts/{}{}", self.metrics_base_url, account_id, path)
    }

    /// Sends a GET request and decodes the body, turning non-2xx answers into `ApiError`.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        credentials: &Credentials,
        query: &[(&str, String)],
    ) -> Result<T> {
        let response = self
            .http_client
            .get(url)
            .header(AUTH_HEADER, &credentials.token)
            .query(query)
            .send()
            .await
            .map_err(Error::RequestFailed)?;

        let status = response.status();
        let text = response.text().await.map_err(Error::RequestFailed)?;

        if !status.is_success() {
            let body: ApiErrorBody = serde_json::from_str(&text).unwrap_or_default();
            return Err(Error::ApiError {
                code: status.as_u16(),
                msg: body.describe(),
            });
        }

        serde_json::from_str(&text).map_err(Error::DeserializationFailed)
    }

    async fn post_empty(&self, url: &str, credentials: &Credentials) -> Result<()> {
        let response = self
            .http_client
            .post(url)
            .header(AUTH_HEADER, &credentials.token)
            .send()
            .await
            .map_err(Error::RequestFailed)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let body: ApiErrorBody = serde_json::from_str(&text).unwrap_or_default();
            return Err(Error::ApiError {
                code: status.as_u16(),
                msg: body.describe(),
            });
        }
        Ok(())
    }

    fn window(&self) -> [(&'static str, String); 2] {
        let end = Utc::now();
        let start = end - self.history_lookback;
        [("startTime", start.to_rfc3339()), ("endTime", end.to_rfc3339())]
    }

    async fn deploy_and_wait(&self, credentials: &Credentials) -> Result<AccountInfo> {
        let url = self.account_url(&credentials.account_id, "");
        let mut info: AccountInfo = self.get_json(&url, credentials, &[]).await?;

        if info.deployment_state.as_deref() != Some(DEPLOYED) {
            tracing::info!(account_id = %credentials.account_id, state = ?info.deployment_state, "Deploying account");
            self.post_empty(&self.account_url(&credentials.account_id, "/deploy"), credentials)
                .await?;
        }

        loop {
            if is_ready(&info) {
                return Ok(info);
            }
            tokio::time::sleep(self.poll_interval).await;
            info = self.get_json(&url, credentials, &[]).await?;
        }
    }
}

fn is_ready(info: &AccountInfo) -> bool {
    info.deployment_state.as_deref() == Some(DEPLOYED)
        && info.connection_status.as_deref() == Some(CONNECTED)
}

/// Bounds `fut` by `limit`, reporting an elapsed deadline as `Error::Timeout`.
async fn with_timeout<T>(
    operation: &'static str,
    limit: Duration,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout {
            operation,
            secs: limit.as_secs(),
        }),
    }
}

#[async_trait]
impl Bridge for HttpBridge {
    async fn connect(&self, credentials: &Credentials) -> Result<AccountInfo> {
        with_timeout("connect", self.connect_timeout, self.deploy_and_wait(credentials))
            .await
            .map_err(|e| match e {
                Error::Timeout { .. } => Error::NotDeployed(credentials.account_id.clone()),
                other => other,
            })
    }

    async fn account_state(&self, credentials: &Credentials) -> Result<AccountState> {
        let url = self.account_url(&credentials.account_id, "/account-information");
        let mut state: AccountState = with_timeout(
            "account_state",
            self.request_timeout,
            self.get_json(&url, credentials, &[]),
        )
        .await?;
        if state.id.is_empty() {
            state.id = credentials.account_id.clone();
        }
        Ok(state)
    }

    async fn platform_metrics(&self, credentials: &Credentials) -> Result<PlatformMetrics> {
        let url = self.metrics_url(&credentials.account_id, "/metrics");
        let envelope: MetricsEnvelope = with_timeout(
            "platform_metrics",
            self.request_timeout,
            self.get_json(&url, credentials, &[]),
        )
        .await?;
        Ok(envelope.metrics)
    }

    async fn trades(&self, credentials: &Credentials) -> Result<Vec<RawTrade>> {
        let window = self.window();
        let deals_url = self.account_url(&credentials.account_id, "/history-deals");
        let positions_url = self.account_url(&credentials.account_id, "/positions");

        let deals: Vec<WireDeal> = with_timeout(
            "history_deals",
            self.request_timeout,
            self.get_json(&deals_url, credentials, &window),
        )
        .await?;
        let positions: Vec<WirePosition> = with_timeout(
            "positions",
            self.request_timeout,
            self.get_json(&positions_url, credentials, &[]),
        )
        .await?;

        let mut trades = fold_deals(deals);
        trades.extend(positions.into_iter().map(RawTrade::from));
        Ok(trades)
    }

    async fn equity_series(&self, credentials: &Credentials) -> Result<Vec<EquitySample>> {
        let url = self.metrics_url(&credentials.account_id, "/equity-chart");
        let window = self.window();
        with_timeout(
            "equity_series",
            self.request_timeout,
            self.get_json(&url, credentials, &window),
        )
        .await
    }
}

/// Folds entry/exit deals into one closed trade per position.
///
/// Deals without a position id (balance operations, credits, ...) pass through as
/// individual rows so the classifier can see them. Positions without an exit deal are
/// still open and are reported by the positions endpoint instead.
pub fn fold_deals(deals: Vec<WireDeal>) -> Vec<RawTrade> {
    let mut positions: BTreeMap<String, Vec<WireDeal>> = BTreeMap::new();
    let mut out = Vec::new();

    for deal in deals {
        match deal.position_id.clone().filter(|p| !p.is_empty()) {
            Some(position_id) => positions.entry(position_id).or_default().push(deal),
            None => out.push(RawTrade {
                id: deal.id,
                symbol: deal.symbol,
                type_tag: deal.deal_type,
                volume: deal.volume.unwrap_or_default(),
                open_price: deal.price,
                close_price: deal.price,
                profit: deal.profit.unwrap_or_default(),
                open_time: Some(deal.time),
                close_time: Some(deal.time),
                commission: deal.commission.unwrap_or_default(),
                swap: deal.swap.unwrap_or_default(),
                is_open: false,
            }),
        }
    }

    for (position_id, mut legs) in positions {
        legs.sort_by_key(|d| d.time);
        let is_exit = |d: &&WireDeal| {
            d.entry_type
                .as_deref()
                .is_some_and(|e| e.ends_with("_OUT") || e.ends_with("_OUT_BY"))
        };
        let Some(exit) = legs.iter().rev().find(is_exit) else {
            continue;
        };
        let entry = legs.iter().find(|d| !is_exit(d)).unwrap_or(&legs[0]);

        out.push(RawTrade {
            id: position_id,
            symbol: entry.symbol.clone().or_else(|| exit.symbol.clone()),
            type_tag: entry.deal_type.clone(),
            volume: entry.volume.or(exit.volume).unwrap_or_default(),
            open_price: entry.price,
            close_price: exit.price,
            profit: legs.iter().filter_map(|d| d.profit).sum(),
            open_time: Some(entry.time),
            close_time: Some(exit.time),
            commission: legs.iter().filter_map(|d| d.commission).sum(),
            swap: legs.iter().filter_map(|d| d.swap).sum(),
            is_open: false,
        });
    }

    out.sort_by_key(|t| t.close_time.or(t.open_time));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use httpmock::prelude::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn settings(base_url: String) -> BridgeSettings {
        BridgeSettings {
            base_url,
            metrics_base_url: None,
            connect_timeout_secs: 2,
            request_timeout_secs: 2,
            history_lookback_days: 30,
        }
    }

    fn deal(id: &str, position: Option<&str>, entry: Option<&str>, hour: u32, profit: Decimal) -> WireDeal {
        WireDeal {
            id: id.to_string(),
            deal_type: if entry == Some("DEAL_ENTRY_OUT") { "DEAL_TYPE_SELL" } else { "DEAL_TYPE_BUY" }
                .to_string(),
            symbol: Some("EURUSD".to_string()),
            volume: Some(dec!(0.2)),
            price: Some(dec!(1.1) + Decimal::from(hour) / dec!(1000)),
            profit: Some(profit),
            commission: Some(dec!(-0.7)),
            swap: None,
            time: Utc.with_ymd_and_hms(2024, 4, 2, hour, 0, 0).unwrap(),
            entry_type: entry.map(str::to_string),
            position_id: position.map(str::to_string),
        }
    }

    #[test]
    fn deals_fold_into_closed_positions() {
        let deals = vec![
            deal("d2", Some("p1"), Some("DEAL_ENTRY_OUT"), 12, dec!(25)),
            deal("d1", Some("p1"), Some("DEAL_ENTRY_IN"), 10, dec!(0)),
            deal("d3", Some("p2"), Some("DEAL_ENTRY_IN"), 13, dec!(0)),
            WireDeal {
                deal_type: "DEAL_TYPE_BALANCE".to_string(),
                symbol: None,
                ..deal("d0", None, None, 9, dec!(100000))
            },
        ];

        let trades = fold_deals(deals);
        assert_eq!(trades.len(), 2, "open position p2 is skipped");

        assert_eq!(trades[0].type_tag, "DEAL_TYPE_BALANCE");
        let closed = &trades[1];
        assert_eq!(closed.id, "p1");
        assert_eq!(closed.type_tag, "DEAL_TYPE_BUY");
        assert_eq!(closed.profit, dec!(25));
        assert_eq!(closed.commission, dec!(-1.4));
        assert_eq!(closed.open_price, Some(dec!(1.11)));
        assert_eq!(closed.close_price, Some(dec!(1.112)));
        assert!(!closed.is_open);
    }

    #[tokio::test]
    async fn account_state_is_fetched_with_auth_header() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/users/current/accounts/acc-1/account-information")
                    .header("auth-token", "tok");
                then.status(200).json_body(json!({
                    "balance": 100000.0,
                    "equity": 99500.5,
                    "currency": "USD",
                    "leverage": 100
                }));
            })
            .await;

        let bridge = HttpBridge::new(&settings(server.base_url())).unwrap();
        let state = bridge
            .account_state(&Credentials::new("acc-1", "tok"))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(state.id, "acc-1");
        assert_eq!(state.equity, dec!(99500.5));
        assert_eq!(state.leverage, 100);
    }

    #[tokio::test]
    async fn error_bodies_become_api_errors() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/users/current/accounts/acc-1/metrics");
                then.status(404).json_body(json!({
                    "error": "NotFoundError",
                    "message": "Account not found"
                }));
            })
            .await;

        let bridge = HttpBridge::new(&settings(server.base_url())).unwrap();
        let err = bridge
            .platform_metrics(&Credentials::new("acc-1", "tok"))
            .await
            .unwrap_err();

        match err {
            Error::ApiError { code, msg } => {
                assert_eq!(code, 404);
                assert_eq!(msg, "NotFoundError: Account not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn equity_series_accepts_platform_field_names() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/users/current/accounts/acc-1/equity-chart");
                then.status(200).json_body(json!([{
                    "startTime": "2024-04-02T10:00:00Z",
                    "endTime": "2024-04-02T11:00:00Z",
                    "startBrokerTime": "2024-04-02 13:00:00.000",
                    "startEquity": 1000.0,
                    "lastEquity": 990.0,
                    "averageEquity": 995.0,
                    "startBalance": 1000.0,
                    "lastBalance": 1000.0
                }]));
            })
            .await;

        let bridge = HttpBridge::new(&settings(server.base_url())).unwrap();
        let series = bridge
            .equity_series(&Credentials::new("acc-1", "tok"))
            .await
            .unwrap();

        assert_eq!(series.len(), 1);
        assert_eq!(series[0].current_equity(), Some(dec!(990)));
        assert_eq!(series[0].broker_time.as_deref(), Some("2024-04-02 13:00:00.000"));
    }

    #[tokio::test]
    async fn slow_responses_time_out() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/users/current/accounts/acc-1/account-information");
                then.status(200)
                    .delay(Duration::from_secs(5))
                    .json_body(json!({ "balance": 1.0, "equity": 1.0 }));
            })
            .await;

        let mut bridge = HttpBridge::new(&settings(server.base_url())).unwrap();
        bridge.request_timeout = Duration::from_millis(200);
        let err = bridge
            .account_state(&Credentials::new("acc-1", "tok"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Timeout { operation: "account_state", .. }), "{err:?}");
    }

    #[tokio::test]
    async fn connect_returns_once_deployed_and_connected() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/users/current/accounts/acc-1");
                then.status(200).json_body(json!({
                    "id": "acc-1",
                    "name": "Challenge 100k",
                    "broker": "Demo Broker",
                    "server": "Demo-Server",
                    "deploymentState": "DEPLOYED",
                    "connectionStatus": "CONNECTED"
                }));
            })
            .await;

        let bridge = HttpBridge::new(&settings(server.base_url())).unwrap();
        let info = bridge.connect(&Credentials::new("acc-1", "tok")).await.unwrap();
        assert_eq!(info.name, "Challenge 100k");
        assert_eq!(info.server.as_deref(), Some("Demo-Server"));
    }

    #[tokio::test]
    async fn connect_gives_up_when_never_connected() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/users/current/accounts/acc-1");
                then.status(200).json_body(json!({
                    "id": "acc-1",
                    "deploymentState": "DEPLOYED",
                    "connectionStatus": "DISCONNECTED"
                }));
            })
            .await;

        let mut bridge = HttpBridge::new(&settings(server.base_url())).unwrap();
        bridge.connect_timeout = Duration::from_millis(300);
        bridge.poll_interval = Duration::from_millis(50);
        let err = bridge.connect(&Credentials::new("acc-1", "tok")).await.unwrap_err();
        assert!(matches!(err, Error::NotDeployed(ref id) if id == "acc-1"));
    }
}
