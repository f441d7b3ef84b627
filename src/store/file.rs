//! JSON file store.
//!
//! Layout under the store directory:
//! - `history.jsonl`: one history entry per line, append-only
//! - `snapshot.json`: latest snapshot, replaced through a temp-file rename

use crate::core::{Error, Result};
use crate::registry::HistoryEntry;
use crate::store::backend::DurableStore;
use crate::store::snapshot::LedgerSnapshot;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info};

const HISTORY_FILE: &str = "history.jsonl";
const SNAPSHOT_FILE: &str = "snapshot.json";

/// File-backed store.
pub struct JsonFileStore {
    dir: PathBuf,
    /// Serializes appends and snapshot swaps
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).await?;
        info!(dir = %dir.display(), "json file store opened");
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    /// Store directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn history_path(&self) -> PathBuf {
        self.dir.join(HISTORY_FILE)
    }

    fn snapshot_path(&self) -> PathBuf {
        self.dir.join(SNAPSHOT_FILE)
    }

    /// Read back every persisted history entry in append order.
    pub async fn load_history(&self) -> Result<Vec<HistoryEntry>> {
        let path = self.history_path();
        if !fs::try_exists(&path).await? {
            return Ok(Vec::new());
        }
        let contents = fs::read_to_string(&path).await?;
        contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .enumerate()
            .map(|(n, line)| {
                serde_json::from_str(line).map_err(|e| {
                    Error::Store(format!("{} line {}: {}", path.display(), n + 1, e))
                })
            })
            .collect()
    }
}

#[async_trait]
impl DurableStore for JsonFileStore {
    async fn append_history(&self, entry: &HistoryEntry) -> Result<()> {
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.history_path())
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        debug!(decision_id = %entry.decision_id, action = %entry.action, "history persisted");
        Ok(())
    }

    async fn persist_snapshot(&self, snapshot: &LedgerSnapshot) -> Result<()> {
        let encoded = serde_json::to_vec_pretty(snapshot)?;
        let target = self.snapshot_path();
        let tmp = target.with_extension("json.tmp");

        let _guard = self.write_lock.lock().await;
        fs::write(&tmp, &encoded).await?;
        fs::rename(&tmp, &target).await?;
        info!(
            snapshot_id = %snapshot.snapshot_id,
            decisions = snapshot.decisions.len(),
            bytes = encoded.len(),
            "snapshot persisted"
        );
        Ok(())
    }

    async fn load_snapshot(&self) -> Result<Option<LedgerSnapshot>> {
        let path = self.snapshot_path();
        if !fs::try_exists(&path).await? {
            return Ok(None);
        }
        let bytes = fs::read(&path).await?;
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    fn name(&self) -> &str {
        "json_file"
    }
}
