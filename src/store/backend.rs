//! DurableStore trait definition.

use crate::core::Result;
use crate::registry::HistoryEntry;
use crate::store::snapshot::LedgerSnapshot;
use async_trait::async_trait;

/// Write-through persistence for history and snapshots.
///
/// The in-memory model stays authoritative while the process runs; a store
/// only has to make enough durable to resume after a restart.
#[async_trait]
pub trait DurableStore: Send + Sync {
    /// Persist one history entry.
    async fn append_history(&self, entry: &HistoryEntry) -> Result<()>;

    /// Persist a full snapshot, replacing the previous one.
    async fn persist_snapshot(&self, snapshot: &LedgerSnapshot) -> Result<()>;

    /// Latest persisted snapshot, if any.
    async fn load_snapshot(&self) -> Result<Option<LedgerSnapshot>>;

    /// Name used in logs.
    fn name(&self) -> &str;
}
