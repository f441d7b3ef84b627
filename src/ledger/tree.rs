//! Binary hash tree over an append-only leaf sequence.
//!
//! The tree is rebuilt from scratch by [`HashLedger::build_tree`]. At every
//! level adjacent hashes are paired as `H(left || right)`; when a level has
//! an odd count the last hash is promoted unchanged. Proof generation walks
//! the retained levels with the same rule, so a promoted node simply has no
//! sibling at that level.

use crate::core::{now, Error, Hash256, Result, Timestamp};
use crate::ledger::hash::{encode_record, hash_pair};
use crate::ledger::proof::{InclusionProof, ProofStep, SiblingPosition};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// A committed leaf.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeafRecord {
    /// Position in the leaf sequence
    pub index: usize,
    /// Leaf hash
    pub hash: Hash256,
    /// Canonical encoding of the record (absent for pre-hashed input)
    pub record: Option<String>,
    /// Append time (not part of the hash)
    pub appended_at: Timestamp,
}

/// Tamper-evident hash ledger.
#[derive(Clone, Debug, Default)]
pub struct HashLedger {
    /// Append-only leaf sequence
    leaves: Vec<LeafRecord>,
    /// Levels of the last build, leaves first, root last
    levels: Vec<Vec<Hash256>>,
    /// Leaf count covered by `levels`
    built_len: usize,
}

impl HashLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a ledger from previously committed leaves.
    ///
    /// The tree is not built; call [`build_tree`](Self::build_tree).
    pub fn from_leaves(mut leaves: Vec<LeafRecord>) -> Self {
        for (i, leaf) in leaves.iter_mut().enumerate() {
            leaf.index = i;
        }
        Self {
            leaves,
            levels: Vec::new(),
            built_len: 0,
        }
    }

    /// Append a record and return its leaf hash.
    ///
    /// A record that is already a 64-character hex digest is stored verbatim.
    pub fn add_leaf<T: Serialize + ?Sized>(&mut self, record: &T) -> Result<Hash256> {
        let (hash, encoded) = encode_record(record)?;
        Ok(self.push(hash, encoded))
    }

    /// Append an already-computed hash.
    pub fn add_leaf_hash(&mut self, hash: Hash256) -> Hash256 {
        self.push(hash, None)
    }

    fn push(&mut self, hash: Hash256, record: Option<String>) -> Hash256 {
        let index = self.leaves.len();
        debug!(index, leaf = %hash, "leaf appended");
        self.leaves.push(LeafRecord {
            index,
            hash: hash.clone(),
            record,
            appended_at: now(),
        });
        hash
    }

    /// Rebuild the whole tree and return the root.
    pub fn build_tree(&mut self) -> Result<Hash256> {
        if self.leaves.is_empty() {
            return Err(Error::EmptyTree);
        }

        let mut levels = vec![self.leaves.iter().map(|l| l.hash.clone()).collect::<Vec<_>>()];
        while levels[levels.len() - 1].len() > 1 {
            let next = levels[levels.len() - 1]
                .chunks(2)
                .map(|pair| {
                    if pair.len() == 2 {
                        hash_pair(&pair[0], &pair[1])
                    } else {
                        pair[0].clone()
                    }
                })
                .collect();
            levels.push(next);
        }

        let root = levels[levels.len() - 1][0].clone();
        self.levels = levels;
        self.built_len = self.leaves.len();
        info!(leaves = self.built_len, height = self.levels.len(), root = %root, "hash tree built");
        Ok(root)
    }

    /// Root of the last build, if any.
    pub fn root(&self) -> Option<&Hash256> {
        self.levels.last().and_then(|level| level.first())
    }

    /// Whether leaves were appended after the last build.
    pub fn is_stale(&self) -> bool {
        self.built_len != self.leaves.len()
    }

    /// Generate an inclusion proof for the leaf at `leaf_index`.
    pub fn get_proof(&self, leaf_index: usize) -> Result<InclusionProof> {
        let root = match self.root() {
            Some(root) => root.clone(),
            None if self.leaves.is_empty() => return Err(Error::EmptyTree),
            None => return Err(Error::TreeNotBuilt),
        };
        if self.is_stale() {
            return Err(Error::StaleTree {
                pending: self.leaves.len() - self.built_len,
            });
        }
        if leaf_index >= self.built_len {
            return Err(Error::LeafIndexOutOfRange {
                index: leaf_index,
                len: self.built_len,
            });
        }

        let mut steps = Vec::new();
        let mut idx = leaf_index;
        for level in &self.levels[..self.levels.len() - 1] {
            if idx % 2 == 1 {
                steps.push(ProofStep {
                    sibling_hash: level[idx - 1].clone(),
                    position: SiblingPosition::Left,
                });
            } else if idx + 1 < level.len() {
                steps.push(ProofStep {
                    sibling_hash: level[idx + 1].clone(),
                    position: SiblingPosition::Right,
                });
            }
            idx /= 2;
        }

        Ok(InclusionProof {
            leaf_index,
            root,
            steps,
        })
    }

    /// Replay `proof` from `leaf_hash` and compare with `root_hash`, or with
    /// the current root when none is supplied.
    pub fn verify_proof(
        &self,
        leaf_hash: &Hash256,
        proof: &InclusionProof,
        root_hash: Option<&Hash256>,
    ) -> bool {
        match root_hash.or_else(|| self.root()) {
            Some(root) => &proof.compute_root(leaf_hash) == root,
            None => false,
        }
    }

    /// Like [`verify_proof`](Self::verify_proof) but fails with
    /// [`Error::ProofVerificationFailed`].
    pub fn ensure_proof(
        &self,
        leaf_hash: &Hash256,
        proof: &InclusionProof,
        root_hash: Option<&Hash256>,
    ) -> Result<()> {
        if self.verify_proof(leaf_hash, proof, root_hash) {
            Ok(())
        } else {
            let expected = root_hash
                .or_else(|| self.root())
                .map(|r| r.to_hex())
                .unwrap_or_else(|| "<none>".to_string());
            Err(Error::ProofVerificationFailed(expected))
        }
    }

    /// Leaf at `index`.
    pub fn leaf(&self, index: usize) -> Option<&LeafRecord> {
        self.leaves.get(index)
    }

    /// All leaves in order.
    pub fn leaves(&self) -> &[LeafRecord] {
        &self.leaves
    }

    /// Number of leaves.
    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    /// Levels of the last build, leaves first.
    pub fn levels(&self) -> &[Vec<Hash256>] {
        &self.levels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::hash::sha3_256;
    use rand::{Rng, RngCore};
    use serde_json::json;

    fn ledger_with(n: usize) -> HashLedger {
        let mut ledger = HashLedger::new();
        for i in 0..n {
            ledger.add_leaf(&json!({ "seq": i })).unwrap();
        }
        ledger
    }

    #[test]
    fn test_empty_tree_fails() {
        let mut ledger = HashLedger::new();
        assert!(matches!(ledger.build_tree(), Err(Error::EmptyTree)));
        assert!(matches!(ledger.get_proof(0), Err(Error::EmptyTree)));
        assert!(ledger.root().is_none());
    }

    #[test]
    fn test_single_leaf_root_is_leaf() {
        let mut ledger = HashLedger::new();
        let leaf = ledger.add_leaf(&json!({"a": 1})).unwrap();
        let root = ledger.build_tree().unwrap();
        assert_eq!(root, leaf);

        let proof = ledger.get_proof(0).unwrap();
        assert!(proof.is_empty());
        assert!(ledger.verify_proof(&leaf, &proof, None));
    }

    #[test]
    fn test_three_leaves_promotes_last() {
        let mut ledger = ledger_with(3);
        let root = ledger.build_tree().unwrap();
        let l = &ledger.levels()[0];
        let expected = hash_pair(&hash_pair(&l[0], &l[1]), &l[2]);
        assert_eq!(root, expected);

        // Promoted leaf has a single step at the second level
        let proof = ledger.get_proof(2).unwrap();
        assert_eq!(proof.len(), 1);
        assert_eq!(proof.steps[0].position, SiblingPosition::Left);
    }

    #[test]
    fn test_every_proof_verifies_for_many_sizes() {
        for n in 1..=64 {
            let mut ledger = ledger_with(n);
            let root = ledger.build_tree().unwrap();
            for i in 0..n {
                let leaf = ledger.leaf(i).unwrap().hash.clone();
                let proof = ledger.get_proof(i).unwrap();
                assert_eq!(proof.root, root);
                assert!(
                    ledger.verify_proof(&leaf, &proof, Some(&root)),
                    "leaf {} of {} failed",
                    i,
                    n
                );
            }
        }
    }

    #[test]
    fn test_random_records_verify_and_detect_tampering() {
        let mut rng = rand::thread_rng();
        for _ in 0..20 {
            let n = rng.gen_range(1..40);
            let mut ledger = HashLedger::new();
            for _ in 0..n {
                let mut payload = [0u8; 16];
                rng.fill_bytes(&mut payload);
                ledger.add_leaf(&json!({ "payload": hex::encode(payload) })).unwrap();
            }
            let root = ledger.build_tree().unwrap();

            let i = rng.gen_range(0..n);
            let proof = ledger.get_proof(i).unwrap();
            let leaf = ledger.leaf(i).unwrap().hash.clone();
            assert!(ledger.verify_proof(&leaf, &proof, Some(&root)));
            assert!(!ledger.verify_proof(&sha3_256(b"forged"), &proof, Some(&root)));
        }
    }

    #[test]
    fn test_changing_any_leaf_changes_root() {
        for n in 1..=17 {
            let mut base = ledger_with(n);
            let root = base.build_tree().unwrap();
            for changed in 0..n {
                let mut other = HashLedger::new();
                for i in 0..n {
                    let seq = if i == changed { 1000 + i } else { i };
                    other.add_leaf(&json!({ "seq": seq })).unwrap();
                }
                assert_ne!(other.build_tree().unwrap(), root);
            }
        }
    }

    #[test]
    fn test_identical_sequences_identical_roots() {
        let mut a = ledger_with(9);
        let mut b = ledger_with(9);
        assert_eq!(a.build_tree().unwrap(), b.build_tree().unwrap());
    }

    #[test]
    fn test_stale_tree_rejects_proofs() {
        let mut ledger = ledger_with(2);
        ledger.build_tree().unwrap();
        ledger.add_leaf(&json!({"late": true})).unwrap();
        assert!(ledger.is_stale());
        assert!(matches!(
            ledger.get_proof(0),
            Err(Error::StaleTree { pending: 1 })
        ));
        ledger.build_tree().unwrap();
        assert!(ledger.get_proof(2).is_ok());
    }

    #[test]
    fn test_unbuilt_and_out_of_range() {
        let mut ledger = ledger_with(2);
        assert!(matches!(ledger.get_proof(0), Err(Error::TreeNotBuilt)));
        ledger.build_tree().unwrap();
        assert!(matches!(
            ledger.get_proof(5),
            Err(Error::LeafIndexOutOfRange { index: 5, len: 2 })
        ));
    }

    #[test]
    fn test_verify_against_old_root_fails_after_growth() {
        let mut ledger = ledger_with(4);
        let old_root = ledger.build_tree().unwrap();
        let old_proof = ledger.get_proof(1).unwrap();
        let leaf = ledger.leaf(1).unwrap().hash.clone();

        ledger.add_leaf(&json!({"seq": 99})).unwrap();
        ledger.build_tree().unwrap();

        assert!(ledger.verify_proof(&leaf, &old_proof, Some(&old_root)));
        assert!(!ledger.verify_proof(&leaf, &old_proof, None));
        assert!(matches!(
            ledger.ensure_proof(&leaf, &old_proof, None),
            Err(Error::ProofVerificationFailed(_))
        ));
    }

    #[test]
    fn test_prehashed_leaf_stored_without_record() {
        let mut ledger = HashLedger::new();
        let digest = sha3_256(b"external");
        let leaf = ledger.add_leaf(&digest.to_hex()).unwrap();
        assert_eq!(leaf, digest);
        assert!(ledger.leaf(0).unwrap().record.is_none());

        ledger.add_leaf(&json!({"k": "v"})).unwrap();
        assert_eq!(ledger.leaf(1).unwrap().record.as_deref(), Some(r#"{"k":"v"}"#));
    }

    #[test]
    fn test_from_leaves_rebuilds_same_root() {
        let mut original = ledger_with(6);
        let root = original.build_tree().unwrap();

        let mut restored = HashLedger::from_leaves(original.leaves().to_vec());
        assert!(restored.root().is_none());
        assert_eq!(restored.build_tree().unwrap(), root);
    }
}
