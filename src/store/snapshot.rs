//! Point-in-time export of the whole ledger state.

use crate::core::{now, Error, Hash256, Result, Timestamp};
use crate::ledger::{sha3_256, HashLedger, LeafRecord};
use crate::registry::DecisionRecord;
use crate::trust::EntityTrust;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Everything needed to resume after a restart.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// Snapshot ID
    pub snapshot_id: Uuid,
    /// Decisions with their proposals and history
    pub decisions: Vec<DecisionRecord>,
    /// Trust records per entity
    pub trust: Vec<EntityTrust>,
    /// Hash ledger leaf sequence
    pub leaves: Vec<LeafRecord>,
    /// Root of the last build at capture time
    pub root: Option<Hash256>,
    /// Capture time
    pub taken_at: Timestamp,
}

impl LedgerSnapshot {
    /// Assemble a snapshot.
    pub fn new(
        decisions: Vec<DecisionRecord>,
        trust: Vec<EntityTrust>,
        leaves: Vec<LeafRecord>,
        root: Option<Hash256>,
    ) -> Self {
        Self {
            snapshot_id: Uuid::new_v4(),
            decisions,
            trust,
            leaves,
            root,
            taken_at: now(),
        }
    }

    /// Rebuild the hash ledger and check it reproduces the recorded root.
    ///
    /// Every leaf that kept its canonical encoding must hash to its stored
    /// leaf hash.
    pub fn rebuild_ledger(&self) -> Result<HashLedger> {
        for leaf in &self.leaves {
            if let Some(record) = &leaf.record {
                let actual = sha3_256(record.as_bytes());
                if actual != leaf.hash {
                    return Err(Error::SnapshotMismatch {
                        expected: leaf.hash.to_hex(),
                        actual: actual.to_hex(),
                    });
                }
            }
        }

        let mut ledger = HashLedger::from_leaves(self.leaves.clone());
        if ledger.leaf_count() == 0 {
            return match &self.root {
                None => Ok(ledger),
                Some(expected) => Err(Error::SnapshotMismatch {
                    expected: expected.to_hex(),
                    actual: "<empty>".to_string(),
                }),
            };
        }

        let actual = ledger.build_tree()?;
        match &self.root {
            Some(expected) if *expected != actual => Err(Error::SnapshotMismatch {
                expected: expected.to_hex(),
                actual: actual.to_hex(),
            }),
            _ => Ok(ledger),
        }
    }

    /// Number of decisions captured.
    pub fn decision_count(&self) -> usize {
        self.decisions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ledger_with(records: &[serde_json::Value]) -> HashLedger {
        let mut ledger = HashLedger::new();
        for record in records {
            ledger.add_leaf(record).unwrap();
        }
        ledger.build_tree().unwrap();
        ledger
    }

    #[test]
    fn test_rebuild_matches_root() {
        let ledger = ledger_with(&[json!({"a": 1}), json!({"b": 2}), json!({"c": 3})]);
        let snapshot = LedgerSnapshot::new(
            vec![],
            vec![],
            ledger.leaves().to_vec(),
            ledger.root().cloned(),
        );

        let rebuilt = snapshot.rebuild_ledger().unwrap();
        assert_eq!(rebuilt.root(), ledger.root());
        assert_eq!(rebuilt.leaf_count(), 3);
    }

    #[test]
    fn test_tampered_leaf_detected() {
        let ledger = ledger_with(&[json!({"a": 1}), json!({"b": 2})]);
        let mut leaves = ledger.leaves().to_vec();
        leaves[1].hash = Hash256::new([9u8; 32]);
        let snapshot = LedgerSnapshot::new(vec![], vec![], leaves, ledger.root().cloned());

        let err = snapshot.rebuild_ledger().unwrap_err();
        assert!(matches!(err, Error::SnapshotMismatch { .. }));
    }

    #[test]
    fn test_tampered_record_detected() {
        let ledger = ledger_with(&[json!({"result": true}), json!({"b": 2})]);
        let mut leaves = ledger.leaves().to_vec();
        leaves[0].record = Some(r#"{"result":false}"#.to_string());
        let snapshot = LedgerSnapshot::new(vec![], vec![], leaves, ledger.root().cloned());

        let err = snapshot.rebuild_ledger().unwrap_err();
        assert!(matches!(err, Error::SnapshotMismatch { .. }));
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = LedgerSnapshot::new(vec![], vec![], vec![], None);
        assert_eq!(snapshot.rebuild_ledger().unwrap().leaf_count(), 0);
    }

    #[test]
    fn test_json_round_trip() {
        let ledger = ledger_with(&[json!("x")]);
        let snapshot = LedgerSnapshot::new(
            vec![],
            vec![],
            ledger.leaves().to_vec(),
            ledger.root().cloned(),
        );
        let encoded = serde_json::to_string(&snapshot).unwrap();
        let decoded: LedgerSnapshot = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, snapshot);
    }
}
