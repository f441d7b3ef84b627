//! # Quorum Ledger
//!
//! A quorum-gated decision consensus ledger providing:
//! - **Hash Ledger**: tamper-evident hash tree with inclusion proofs
//! - **Trust Ledger**: per-entity reliability scores with decay and regeneration
//! - **Quorum Calculator**: BFT, Raft, Paxos and custom thresholds
//! - **Decision Registry**: decision and proposal lifecycle with history
//! - **Consensus Engine**: quorum checks, finalization and sealing
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use quorum_ledger::consensus::{ConsensusEngine, EngineConfig};
//! use quorum_ledger::quorum::QuorumProtocol;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> quorum_ledger::Result<()> {
//!     let engine = ConsensusEngine::new(EngineConfig::new(QuorumProtocol::Raft, 3))?;
//!     engine
//!         .register_decision("D1", json!({"type": "policy", "content": "x", "metadata": {}}))
//!         .await?;
//!     engine.register_proposal("P1", "D1", json!({})).await?;
//!     engine.record_vote("P1", "N1", true).await?;
//!     engine.record_vote("P1", "N2", true).await?;
//!
//!     let outcome = engine.finalize_if_quorum("P1").await?;
//!     assert!(outcome.is_finalized());
//!     assert!(engine.prove_decision("D1")?.verify());
//!     Ok(())
//! }
//! ```

pub mod consensus;
pub mod core;
pub mod events;
pub mod ledger;
pub mod quorum;
pub mod registry;
pub mod store;
pub mod trust;

pub use core::error::{Error, ErrorKind, Result};
