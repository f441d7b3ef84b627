//! Hash Ledger
//!
//! Tamper-evident commitment structure for sealed decisions:
//! - Deterministic SHA3-256 leaf hashing over canonical JSON
//! - Binary hash tree with odd-node promotion
//! - Inclusion proof generation and verification

pub mod hash;
pub mod proof;
pub mod tree;

pub use hash::{canonical_json, encode_record, hash_pair, hash_record, sha3_256};
pub use proof::{InclusionProof, ProofStep, SiblingPosition};
pub use tree::{HashLedger, LeafRecord};
