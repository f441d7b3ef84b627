//! Consensus Module
//!
//! Quorum-gated orchestration of the ledger components:
//! - Head-count or trust-weighted vote tallies
//! - Approval, finalization and hash-ledger sealing
//! - Write-through history, snapshots and lifecycle events

pub mod config;
pub mod engine;
pub mod metrics;
pub mod tally;

pub use config::EngineConfig;
pub use engine::{ConsensusEngine, DecisionProof, FinalizeOutcome};
pub use metrics::{EngineMetrics, MetricsSnapshot};
pub use tally::{tally_votes, ConsensusResult, VoteWeighting};
