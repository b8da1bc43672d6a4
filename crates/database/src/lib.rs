// In crates/database/src/lib.rs

use app_config::{DatabaseSettings, StoreBackend};
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::sync::Arc;

pub mod error;
pub mod store;
pub mod types;

// Re-export the most important types for easy access.
pub use error::{Error, Result};
pub use store::{MemoryStore, MetricsStore};
pub use types::{credential_fingerprint, merge_documents, MetricsDocument};

/// A wrapper around the `sqlx` connection pool.
#[derive(Debug, Clone)]
pub struct Db(PgPool);

/// Establishes a connection pool to the PostgreSQL database and runs migrations.
///
/// # Arguments
///
/// * `settings`: The database configuration settings.
///
/// # Returns
///
/// A `Result` containing the `Db` wrapper on success, or an `Error` on failure.
pub async fn connect(settings: &DatabaseSettings) -> Result<Db> {
    if settings.url.is_empty() {
        return Err(Error::MissingUrl);
    }

    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        // `?` converts the `sqlx::Error` into `database::Error` via `#[from]`.
        .connect(&settings.url)
        .await?;

    // Run database migrations. This ensures the database schema is up-to-date.
    sqlx::migrate!("../../migrations").run(&pool).await.map_err(Error::from)?;

    Ok(Db(pool))
}

/// Opens whichever store backend the settings select.
pub async fn open_store(settings: &DatabaseSettings) -> Result<Arc<dyn MetricsStore>> {
    match settings.backend {
        StoreBackend::Postgres => Ok(Arc::new(connect(settings).await?)),
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory metrics store; cached metrics will not survive a restart.");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

// The merge happens inside the upsert so that concurrent writers, even from other
// processes, can never lower the stored maximum or clear a failed status.
const UPSERT_MERGED: &str = r#"
    INSERT INTO metrics_cache (account_id, document, max_daily_drawdown, account_status, last_updated)
    VALUES ($1, $2, $3, $4, $5)
    ON CONFLICT (account_id) DO UPDATE SET
        max_daily_drawdown = GREATEST(metrics_cache.max_daily_drawdown, EXCLUDED.max_daily_drawdown),
        account_status = CASE
            WHEN metrics_cache.account_status = 'failed' THEN 'failed'
            ELSE EXCLUDED.account_status
        END,
        document = jsonb_set(
            jsonb_set(
                jsonb_set(
                    EXCLUDED.document,
                    '{metrics,maxDailyDrawdown}',
                    to_jsonb(GREATEST(metrics_cache.max_daily_drawdown, EXCLUDED.max_daily_drawdown))
                ),
                '{accountStatus}',
                to_jsonb(CASE
                    WHEN metrics_cache.account_status = 'failed' THEN 'failed'
                    ELSE EXCLUDED.account_status
                END)
            ),
            '{ownerFingerprint}',
            COALESCE(
                NULLIF(metrics_cache.document -> 'ownerFingerprint', 'null'::jsonb),
                EXCLUDED.document -> 'ownerFingerprint',
                'null'::jsonb
            )
        ),
        last_updated = EXCLUDED.last_updated
    RETURNING document
"#;

#[async_trait]
impl MetricsStore for Db {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn load(&self, account_id: &str) -> Result<Option<MetricsDocument>> {
        let row: Option<serde_json::Value> =
            sqlx::query_scalar("SELECT document FROM metrics_cache WHERE account_id = $1")
                .bind(account_id)
                .fetch_optional(&self.0)
                .await
                .map_err(Error::OperationFailed)?;

        row.map(serde_json::from_value)
            .transpose()
            .map_err(Error::from)
    }

    async fn save_merged(&self, document: MetricsDocument) -> Result<MetricsDocument> {
        let status = match document.account_status {
            core_types::AccountStatus::Active => "active",
            core_types::AccountStatus::Failed => "failed",
        };
        let value = serde_json::to_value(&document)?;

        let persisted: serde_json::Value = sqlx::query_scalar(UPSERT_MERGED)
            .bind(&document.account_id)
            .bind(value)
            .bind(document.max_daily_drawdown())
            .bind(status)
            .bind(document.last_updated)
            .fetch_one(&self.0)
            .await
            .map_err(Error::OperationFailed)?;

        Ok(serde_json::from_value(persisted)?)
    }
}
