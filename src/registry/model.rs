//! Decisions, proposals and votes.

use crate::core::{now, Hash256, Timestamp};
use crate::registry::history::HistoryEntry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Lifecycle state of a decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionStatus {
    /// Registered, no proposal attached yet
    Registered,
    /// A proposal is open for votes
    Proposed,
    /// The open proposal reached quorum
    Approved,
    /// The last proposal was finalized negatively
    Rejected,
    /// A proposal was finalized positively; terminal
    Finalized,
}

impl DecisionStatus {
    /// Whether a new proposal may be attached.
    pub fn accepts_proposal(&self) -> bool {
        matches!(self, DecisionStatus::Registered | DecisionStatus::Rejected)
    }

    /// Whether no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, DecisionStatus::Finalized)
    }
}

impl std::fmt::Display for DecisionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecisionStatus::Registered => write!(f, "registered"),
            DecisionStatus::Proposed => write!(f, "proposed"),
            DecisionStatus::Approved => write!(f, "approved"),
            DecisionStatus::Rejected => write!(f, "rejected"),
            DecisionStatus::Finalized => write!(f, "finalized"),
        }
    }
}

/// Lifecycle state of a proposal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProposalStatus {
    /// Open for votes
    Proposed,
    /// Reached quorum, awaiting finalization
    Approved,
    /// Closed with a result
    Finalized,
}

impl ProposalStatus {
    /// Whether the proposal can still be finalized.
    pub fn is_open(&self) -> bool {
        !matches!(self, ProposalStatus::Finalized)
    }
}

impl std::fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProposalStatus::Proposed => write!(f, "proposed"),
            ProposalStatus::Approved => write!(f, "approved"),
            ProposalStatus::Finalized => write!(f, "finalized"),
        }
    }
}

/// A single node's vote.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    /// Affirmative or negative
    pub vote: bool,
    /// Vote timestamp
    pub timestamp: Timestamp,
    /// Opaque signature supplied by the voter; stored, never verified
    pub signature: Option<Vec<u8>>,
}

impl Vote {
    /// Create a new vote.
    pub fn new(vote: bool) -> Self {
        Self {
            vote,
            timestamp: now(),
            signature: None,
        }
    }

    /// Attach an opaque signature.
    pub fn with_signature(mut self, signature: Vec<u8>) -> Self {
        self.signature = Some(signature);
        self
    }
}

/// Where a finalized outcome was committed in the hash ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegritySeal {
    /// Proposal whose outcome was sealed
    pub proposal_id: String,
    /// Index of the sealed leaf
    pub leaf_index: usize,
    /// Hash of the sealed record
    pub leaf_hash: Hash256,
    /// Root produced by the rebuild that included the leaf
    pub root: Hash256,
    /// Seal time
    pub sealed_at: Timestamp,
}

/// A governance decision.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    /// Unique decision ID
    pub decision_id: String,
    /// Opaque payload (`type`, `content`, `metadata`)
    pub data: serde_json::Value,
    /// Lifecycle state
    pub status: DecisionStatus,
    /// Every proposal ever attached, in order
    pub proposal_ids: Vec<String>,
    /// Most recently attached proposal
    pub current_proposal_id: Option<String>,
    /// Proposal finalized with a positive result
    pub finalized_proposal_id: Option<String>,
    /// Latest integrity seal
    pub integrity_seal: Option<IntegritySeal>,
    /// Creation timestamp
    pub created_at: Timestamp,
    /// Last mutation timestamp
    pub updated_at: Timestamp,
}

impl Decision {
    /// Create a registered decision.
    pub fn new(decision_id: &str, data: serde_json::Value) -> Self {
        let ts = now();
        Self {
            decision_id: decision_id.to_string(),
            data,
            status: DecisionStatus::Registered,
            proposal_ids: Vec::new(),
            current_proposal_id: None,
            finalized_proposal_id: None,
            integrity_seal: None,
            created_at: ts,
            updated_at: ts,
        }
    }
}

/// A proposal attached to a decision.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    /// Unique proposal ID
    pub proposal_id: String,
    /// Owning decision; fixed at creation
    pub decision_id: String,
    /// Opaque payload
    pub data: serde_json::Value,
    /// Lifecycle state
    pub status: ProposalStatus,
    /// Votes by node ID
    pub votes: BTreeMap<String, Vote>,
    /// Outcome once finalized
    pub result: Option<bool>,
    /// Creation timestamp
    pub created_at: Timestamp,
    /// Last mutation timestamp
    pub updated_at: Timestamp,
}

impl Proposal {
    /// Create an open proposal.
    pub fn new(proposal_id: &str, decision_id: &str, data: serde_json::Value) -> Self {
        let ts = now();
        Self {
            proposal_id: proposal_id.to_string(),
            decision_id: decision_id.to_string(),
            data,
            status: ProposalStatus::Proposed,
            votes: BTreeMap::new(),
            result: None,
            created_at: ts,
            updated_at: ts,
        }
    }

    /// Node IDs that voted yes.
    pub fn affirmative_voters(&self) -> Vec<&str> {
        self.votes
            .iter()
            .filter(|(_, v)| v.vote)
            .map(|(node, _)| node.as_str())
            .collect()
    }

    /// Number of yes votes.
    pub fn affirmative_count(&self) -> usize {
        self.votes.values().filter(|v| v.vote).count()
    }

    /// Number of no votes.
    pub fn negative_count(&self) -> usize {
        self.votes.values().filter(|v| !v.vote).count()
    }

    /// Votes reduced to node -> bool, ordered by node.
    pub fn vote_map(&self) -> BTreeMap<String, bool> {
        self.votes
            .iter()
            .map(|(node, v)| (node.clone(), v.vote))
            .collect()
    }

    /// The record committed to the hash ledger, once finalized.
    pub fn outcome(&self) -> Option<SealedOutcome> {
        let result = self.result?;
        Some(SealedOutcome {
            decision_id: self.decision_id.clone(),
            proposal_id: self.proposal_id.clone(),
            votes: self.vote_map(),
            result,
        })
    }
}

/// Finalized outcome as committed to the hash ledger.
///
/// Contains no timestamps, so the same outcome always hashes the same.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedOutcome {
    /// Decision ID
    pub decision_id: String,
    /// Proposal ID
    pub proposal_id: String,
    /// Final vote set
    pub votes: BTreeMap<String, bool>,
    /// Finalization result
    pub result: bool,
}

/// A decision together with its proposals and history.
///
/// This is the unit of locking: every mutation of a decision or one of its
/// proposals happens while holding the record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    /// The decision
    pub decision: Decision,
    /// Proposals by ID
    pub proposals: BTreeMap<String, Proposal>,
    /// Append-only history
    pub history: Vec<HistoryEntry>,
}

impl DecisionRecord {
    /// Wrap a new decision.
    pub fn new(decision: Decision) -> Self {
        Self {
            decision,
            proposals: BTreeMap::new(),
            history: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decision_status_rules() {
        assert!(DecisionStatus::Registered.accepts_proposal());
        assert!(DecisionStatus::Rejected.accepts_proposal());
        assert!(!DecisionStatus::Proposed.accepts_proposal());
        assert!(!DecisionStatus::Finalized.accepts_proposal());
        assert!(DecisionStatus::Finalized.is_terminal());
    }

    #[test]
    fn test_status_display_and_serde() {
        assert_eq!(DecisionStatus::Finalized.to_string(), "finalized");
        assert_eq!(
            serde_json::to_string(&ProposalStatus::Approved).unwrap(),
            r#""approved""#
        );
    }

    #[test]
    fn test_proposal_counts() {
        let mut proposal = Proposal::new("P1", "D1", json!({}));
        proposal.votes.insert("N1".into(), Vote::new(true));
        proposal.votes.insert("N2".into(), Vote::new(false));
        proposal.votes.insert("N3".into(), Vote::new(true));

        assert_eq!(proposal.affirmative_count(), 2);
        assert_eq!(proposal.negative_count(), 1);
        assert_eq!(proposal.affirmative_voters(), vec!["N1", "N3"]);
        assert_eq!(proposal.vote_map()["N2"], false);
    }

    #[test]
    fn test_outcome_only_after_result() {
        let mut proposal = Proposal::new("P1", "D1", json!({}));
        proposal.votes.insert("N1".into(), Vote::new(true));
        assert!(proposal.outcome().is_none());

        proposal.result = Some(true);
        let outcome = proposal.outcome().unwrap();
        assert_eq!(outcome.decision_id, "D1");
        assert!(outcome.result);
        assert_eq!(outcome.votes.len(), 1);
    }

    #[test]
    fn test_vote_signature_is_opaque() {
        let vote = Vote::new(true).with_signature(vec![0xde, 0xad]);
        assert_eq!(vote.signature, Some(vec![0xde, 0xad]));
    }
}
