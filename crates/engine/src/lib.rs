// In crates/engine/src/lib.rs

pub mod assembler;
pub mod error;
pub mod locks;
pub mod state;
pub mod types;

use crate::assembler::{account_summary, BridgeData, MetricsAssembler};
use crate::locks::AccountLocks;
use crate::state::{decide_state, needs_bridge, BridgeStatus, EvaluationState};
use analytics::chart::{build_equity_chart, recent_trades};
use analytics::{evaluate_objectives, TradeClassifier};
use api_client::Bridge;
use app_config::EvaluationSettings;
use chrono::Utc;
use core_types::{AccountInfo, AccountStatus, DataSource};
use database::{credential_fingerprint, MetricsDocument, MetricsStore};
use std::sync::Arc;

pub use error::{Error, Result};
pub use state::CachedReason;
pub use types::{EvaluationRequest, EvaluationResponse};

/// The orchestrator for account evaluations.
///
/// Decides per request whether the answer comes from the bridge or the cache, and keeps
/// the cached document's worst daily drawdown from ever going down.
pub struct Engine {
    assembler: MetricsAssembler,
    store: Arc<dyn MetricsStore>,
    settings: EvaluationSettings,
    locks: AccountLocks,
}

impl Engine {
    pub fn new(
        bridge: Arc<dyn Bridge>,
        store: Arc<dyn MetricsStore>,
        classifier: TradeClassifier,
        settings: EvaluationSettings,
    ) -> Self {
        Self {
            assembler: MetricsAssembler::new(bridge, classifier),
            store,
            settings,
            locks: AccountLocks::new(),
        }
    }

    /// Runs one evaluation to completion.
    pub async fn evaluate(&self, request: EvaluationRequest) -> Result<EvaluationResponse> {
        request.validate()?;
        let account_id = request.account_id().to_string();

        // Read, merge and write for one account happen one request at a time.
        let _guard = self.locks.acquire(&account_id).await;

        let cached = self.store.load(&account_id).await?;
        if let Some(doc) = &cached {
            if !request.admin_override && !doc.is_owned_by(&request.credentials.token) {
                tracing::warn!(%account_id, "Rejected evaluation from a credential that does not own the account.");
                return Err(Error::Forbidden { account_id });
            }
        }

        let (bridge_status, live) = if needs_bridge(cached.as_ref()) {
            self.contact_bridge(&request).await
        } else {
            (BridgeStatus::NotContacted, None)
        };

        let state = decide_state(cached.as_ref(), bridge_status);
        tracing::info!(%account_id, ?state, program = %request.program_type, "Evaluating account.");

        match (state, cached, live) {
            (EvaluationState::Live, cached, Some((info, data))) => {
                Ok(self.evaluate_live(&request, cached.as_ref(), &info, &data).await)
            }
            (EvaluationState::CachedOnly { reason }, Some(doc), _) => {
                tracing::warn!(%account_id, ?reason, "Serving cached metrics.");
                let status = match reason {
                    CachedReason::AccountFailed => AccountStatus::Failed,
                    CachedReason::BridgeUnreachable => doc.account_status,
                };
                Ok(EvaluationResponse::from_document(doc, DataSource::Cache, status)
                    .with_cache_reason(reason))
            }
            _ => {
                tracing::error!(%account_id, "No cached metrics to fall back on.");
                Err(Error::NoCachedData { account_id })
            }
        }
    }

    /// Connects and fetches. A connected bridge whose every read failed counts as
    /// unreachable, so its empty data never reaches the cache.
    async fn contact_bridge(
        &self,
        request: &EvaluationRequest,
    ) -> (BridgeStatus, Option<(AccountInfo, BridgeData)>) {
        let account_id = request.account_id();
        let info = match self.assembler.bridge().connect(&request.credentials).await {
            Ok(info) => info,
            Err(e) => {
                tracing::warn!(account_id, error = %e, "Bridge unreachable.");
                return (BridgeStatus::Unreachable, None);
            }
        };

        let data = self.assembler.fetch(&request.credentials).await;
        if data.is_unavailable() {
            tracing::warn!(account_id, "Bridge connected but every data fetch failed.");
            return (BridgeStatus::Unreachable, None);
        }
        (BridgeStatus::Connected, Some((info, data)))
    }

    async fn evaluate_live(
        &self,
        request: &EvaluationRequest,
        cached: Option<&MetricsDocument>,
        info: &AccountInfo,
        data: &BridgeData,
    ) -> EvaluationResponse {
        let credentials = &request.credentials;
        let mut metrics = self.assembler.assemble(data, request.starting_balance);

        let previous_max = cached.map(MetricsDocument::max_daily_drawdown).unwrap_or(0.0);
        metrics.max_daily_drawdown = metrics.daily_drawdown.max(previous_max);

        let objectives = evaluate_objectives(&metrics, request.program_type, request.starting_balance);
        let account_status = if self.settings.fail_on_drawdown_breach && objectives.drawdown_breached() {
            tracing::warn!(account_id = %credentials.account_id, "Drawdown objective breached; flagging account as failed.");
            AccountStatus::Failed
        } else {
            AccountStatus::Active
        };

        let document = MetricsDocument {
            account_id: credentials.account_id.clone(),
            // Admin evaluations never claim ownership of an account.
            owner_fingerprint: (!request.admin_override)
                .then(|| credential_fingerprint(&credentials.token)),
            account_status,
            program_type: request.program_type,
            starting_balance: request.starting_balance,
            account: account_summary(credentials, info, data.account.as_ref(), &metrics),
            trades: recent_trades(&data.trades, self.settings.recent_trades_limit),
            equity_chart: build_equity_chart(&data.equity),
            objectives,
            metrics,
            last_updated: Utc::now(),
        };

        let document = match self.store.save_merged(document.clone()).await {
            Ok(mut persisted) => {
                // Another writer may have pushed the maximum higher than we saw.
                if persisted.max_daily_drawdown() > document.max_daily_drawdown() {
                    persisted.objectives = evaluate_objectives(
                        &persisted.metrics,
                        persisted.program_type,
                        persisted.starting_balance,
                    );
                }
                persisted
            }
            Err(e) => {
                tracing::error!(
                    account_id = %credentials.account_id,
                    store = self.store.name(),
                    error = %e,
                    "Failed to persist metrics; returning the computed result."
                );
                document
            }
        };

        let status = document.account_status;
        EvaluationResponse::from_document(document, DataSource::Live, status)
    }
}
