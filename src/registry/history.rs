//! Append-only decision history.

use crate::core::{now, Timestamp};
use crate::registry::model::DecisionStatus;
use serde::{Deserialize, Serialize};

/// What happened to a decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryAction {
    /// Decision registered
    DecisionRegistered,
    /// Proposal attached
    ProposalRegistered,
    /// Vote recorded or replaced
    VoteRecorded,
    /// Proposal reached quorum
    ProposalApproved,
    /// Proposal finalized
    ProposalFinalized,
    /// Outcome committed to the hash ledger
    DecisionSealed,
}

impl std::fmt::Display for HistoryAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            HistoryAction::DecisionRegistered => "decision_registered",
            HistoryAction::ProposalRegistered => "proposal_registered",
            HistoryAction::VoteRecorded => "vote_recorded",
            HistoryAction::ProposalApproved => "proposal_approved",
            HistoryAction::ProposalFinalized => "proposal_finalized",
            HistoryAction::DecisionSealed => "decision_sealed",
        };
        write!(f, "{}", name)
    }
}

/// One history entry. Never mutated once appended.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Decision the entry belongs to
    pub decision_id: String,
    /// Entry time
    pub timestamp: Timestamp,
    /// Action taken
    pub action: HistoryAction,
    /// Decision status after the action
    pub status: DecisionStatus,
    /// Action details
    pub payload: serde_json::Value,
}

impl HistoryEntry {
    /// Create an entry stamped now.
    pub fn new(
        decision_id: &str,
        action: HistoryAction,
        status: DecisionStatus,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            decision_id: decision_id.to_string(),
            timestamp: now(),
            action,
            status,
            payload,
        }
    }
}
