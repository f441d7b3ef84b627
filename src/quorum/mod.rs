//! Quorum Calculator
//!
//! Threshold arithmetic for the supported fault-tolerance models:
//! - BFT (2f+1 of 3f+1)
//! - Raft / Paxos simple majority
//! - Custom percentage of the network

pub mod calculator;
pub mod protocol;

pub use calculator::{
    byzantine_tolerance, calculate_bft_quorum, calculate_custom_quorum, calculate_paxos_quorum,
    calculate_quorum, calculate_raft_quorum, validate_quorum_size, ByzantineTolerance, QuorumSpec,
};
pub use protocol::QuorumProtocol;
