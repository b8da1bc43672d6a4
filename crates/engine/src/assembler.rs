// In crates/engine/src/assembler.rs

use analytics::{AnalyticsEngine, SnapshotInputs, TradeClassifier};
use api_client::Bridge;
use core_types::{
    AccountInfo, AccountState, AccountSummary, ClassifiedTrade, Credentials, EquitySample,
    MetricsSnapshot, PlatformMetrics,
};
use rust_decimal::Decimal;
use std::sync::Arc;

/// Everything the bridge delivered for one evaluation. A failed sub-fetch leaves its
/// piece empty.
#[derive(Debug, Clone, Default)]
pub struct BridgeData {
    pub account: Option<AccountState>,
    pub platform: PlatformMetrics,
    pub trades: Vec<ClassifiedTrade>,
    pub equity: Vec<EquitySample>,
    /// How many of the four sub-fetches succeeded.
    pub succeeded: usize,
}

impl BridgeData {
    /// True when every sub-fetch failed; such data must never replace a cached document.
    pub fn is_unavailable(&self) -> bool {
        self.succeeded == 0
    }
}

/// Pulls the four independent reads from the bridge and turns them into a snapshot.
pub struct MetricsAssembler {
    bridge: Arc<dyn Bridge>,
    classifier: TradeClassifier,
    analytics: AnalyticsEngine,
}

impl MetricsAssembler {
    pub fn new(bridge: Arc<dyn Bridge>, classifier: TradeClassifier) -> Self {
        Self {
            bridge,
            classifier,
            analytics: AnalyticsEngine::new(),
        }
    }

    pub fn bridge(&self) -> &Arc<dyn Bridge> {
        &self.bridge
    }

    /// Issues the four sub-fetches concurrently. None of them can fail the whole fetch:
    /// each failure is logged and replaced by an empty value.
    pub async fn fetch(&self, credentials: &Credentials) -> BridgeData {
        let account_id = credentials.account_id.as_str();
        let (state, platform, trades, equity) = tokio::join!(
            self.bridge.account_state(credentials),
            self.bridge.platform_metrics(credentials),
            self.bridge.trades(credentials),
            self.bridge.equity_series(credentials),
        );
        let succeeded = [state.is_ok(), platform.is_ok(), trades.is_ok(), equity.is_ok()]
            .into_iter()
            .filter(|ok| *ok)
            .count();

        let account = state
            .map_err(|e| {
                tracing::warn!(account_id, error = %e, "Account state fetch failed; using equity series.");
            })
            .ok();
        let platform = or_default("platform metrics", account_id, platform);
        let trades = or_default("trades", account_id, trades);
        let equity = or_default("equity series", account_id, equity);

        tracing::debug!(
            account_id,
            succeeded,
            trades = trades.len(),
            equity_samples = equity.len(),
            "Bridge data fetched."
        );

        BridgeData {
            account,
            platform,
            trades: self.classifier.classify_all(trades),
            equity,
            succeeded,
        }
    }

    pub fn assemble(&self, data: &BridgeData, starting_balance: Decimal) -> MetricsSnapshot {
        self.analytics.assemble(SnapshotInputs {
            account: data.account.as_ref(),
            platform: &data.platform,
            trades: &data.trades,
            equity: &data.equity,
            starting_balance,
        })
    }
}

fn or_default<T: Default>(what: &str, account_id: &str, result: api_client::Result<T>) -> T {
    result.unwrap_or_else(|e| {
        tracing::warn!(account_id, error = %e, "Fetching {what} failed; continuing without it.");
        T::default()
    })
}

/// The account fields shown next to the metrics. Balance and equity come from the
/// snapshot so they agree with it even when the account state fetch failed.
pub fn account_summary(
    credentials: &Credentials,
    info: &AccountInfo,
    state: Option<&AccountState>,
    snapshot: &MetricsSnapshot,
) -> AccountSummary {
    AccountSummary {
        account_id: credentials.account_id.clone(),
        name: info.name.clone(),
        broker: info.broker.clone(),
        server: info.server.clone(),
        currency: state.map(|s| s.currency.clone()).unwrap_or_default(),
        leverage: state.map(|s| s.leverage).unwrap_or_default(),
        balance: snapshot.balance,
        equity: snapshot.equity,
        connection_status: state
            .and_then(|s| s.connection_status.clone())
            .or_else(|| info.connection_status.clone()),
    }
}
