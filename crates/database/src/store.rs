// In crates/database/src/store.rs

use crate::types::{merge_documents, MetricsDocument};
use crate::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Keyed document store for the per-account metrics cache.
#[async_trait]
pub trait MetricsStore: Send + Sync {
    fn name(&self) -> &'static str;

    async fn load(&self, account_id: &str) -> Result<Option<MetricsDocument>>;

    /// Overwrites the account's document, merging it with the stored one in a single
    /// atomic step (see [`merge_documents`]). Returns the document as persisted.
    async fn save_merged(&self, document: MetricsDocument) -> Result<MetricsDocument>;
}

/// Process-local store. Used in development and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: Mutex<HashMap<String, MetricsDocument>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_documents(documents: impl IntoIterator<Item = MetricsDocument>) -> Self {
        let documents = documents
            .into_iter()
            .map(|d| (d.account_id.clone(), d))
            .collect();
        Self {
            documents: Mutex::new(documents),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, MetricsDocument>> {
        // A poisoned map is still structurally valid; keep serving it.
        self.documents.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl MetricsStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn load(&self, account_id: &str) -> Result<Option<MetricsDocument>> {
        Ok(self.lock().get(account_id).cloned())
    }

    async fn save_merged(&self, document: MetricsDocument) -> Result<MetricsDocument> {
        let mut documents = self.lock();
        let merged = merge_documents(documents.get(&document.account_id), document);
        documents.insert(merged.account_id.clone(), merged.clone());
        Ok(merged)
    }
}
