//! In-memory store, for tests and single-process use.

use crate::core::Result;
use crate::registry::HistoryEntry;
use crate::store::backend::DurableStore;
use crate::store::snapshot::LedgerSnapshot;
use async_trait::async_trait;
use tokio::sync::RwLock;

/// Keeps history and the latest snapshot in memory.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    history: RwLock<Vec<HistoryEntry>>,
    snapshot: RwLock<Option<LedgerSnapshot>>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every entry appended so far.
    pub async fn history(&self) -> Vec<HistoryEntry> {
        self.history.read().await.clone()
    }

    /// Entries for one decision.
    pub async fn history_for(&self, decision_id: &str) -> Vec<HistoryEntry> {
        self.history
            .read()
            .await
            .iter()
            .filter(|e| e.decision_id == decision_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl DurableStore for InMemoryStore {
    async fn append_history(&self, entry: &HistoryEntry) -> Result<()> {
        self.history.write().await.push(entry.clone());
        Ok(())
    }

    async fn persist_snapshot(&self, snapshot: &LedgerSnapshot) -> Result<()> {
        *self.snapshot.write().await = Some(snapshot.clone());
        Ok(())
    }

    async fn load_snapshot(&self) -> Result<Option<LedgerSnapshot>> {
        Ok(self.snapshot.read().await.clone())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
