//! Inclusion proofs.

use crate::core::Hash256;
use crate::ledger::hash::hash_pair;
use serde::{Deserialize, Serialize};

/// Where a sibling hash sits relative to the running hash.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiblingPosition {
    /// Sibling is the left child: parent = H(sibling || current)
    Left,
    /// Sibling is the right child: parent = H(current || sibling)
    Right,
}

/// One level of an inclusion proof.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofStep {
    /// Hash of the sibling node
    pub sibling_hash: Hash256,
    /// Position of the sibling
    pub position: SiblingPosition,
}

/// Path of sibling hashes from a leaf up to the root.
///
/// Levels where the node was promoted unpaired contribute no step.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InclusionProof {
    /// Index of the proven leaf
    pub leaf_index: usize,
    /// Root the proof was generated against
    pub root: Hash256,
    /// Ordered steps, leaf level first
    pub steps: Vec<ProofStep>,
}

impl InclusionProof {
    /// Recompute the root implied by `leaf_hash` and these steps.
    pub fn compute_root(&self, leaf_hash: &Hash256) -> Hash256 {
        self.steps.iter().fold(leaf_hash.clone(), |current, step| {
            match step.position {
                SiblingPosition::Left => hash_pair(&step.sibling_hash, &current),
                SiblingPosition::Right => hash_pair(&current, &step.sibling_hash),
            }
        })
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the proof has no steps (single-leaf tree).
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
