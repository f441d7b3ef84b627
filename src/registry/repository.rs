//! Storage abstraction for decision records.

use crate::core::sync::{read, write, KeyedSlots};
use crate::registry::model::DecisionRecord;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

/// Repository of decision records.
///
/// Each decision (with its proposals and history) is locked independently.
/// Proposal IDs are indexed globally so they stay unique across decisions.
pub trait DecisionRepository: Send + Sync {
    /// Insert a new record. Returns false if the decision ID is taken.
    fn insert(&self, record: DecisionRecord) -> bool;

    /// Record for `decision_id`.
    fn decision(&self, decision_id: &str) -> Option<Arc<Mutex<DecisionRecord>>>;

    /// Reserve `proposal_id` for `decision_id`. Returns false if taken.
    fn claim_proposal_id(&self, proposal_id: &str, decision_id: &str) -> bool;

    /// Decision owning `proposal_id`.
    fn decision_of(&self, proposal_id: &str) -> Option<String>;

    /// Known decision IDs, sorted.
    fn decision_ids(&self) -> Vec<String>;

    /// Number of decisions.
    fn decision_count(&self) -> usize;

    /// Number of proposals.
    fn proposal_count(&self) -> usize;

    /// Clone of every record, ordered by decision ID.
    fn snapshot(&self) -> Vec<DecisionRecord>;
}

/// In-memory decision repository.
#[derive(Default)]
pub struct InMemoryDecisionRepository {
    decisions: KeyedSlots<DecisionRecord>,
    proposal_index: RwLock<HashMap<String, String>>,
}

impl InMemoryDecisionRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository holding `records`, rebuilding the proposal index.
    pub fn from_records(records: Vec<DecisionRecord>) -> Self {
        let repo = Self::new();
        for record in records {
            let decision_id = record.decision.decision_id.clone();
            for proposal_id in record.proposals.keys() {
                repo.claim_proposal_id(proposal_id, &decision_id);
            }
            repo.decisions.insert_new(&decision_id, record);
        }
        repo
    }
}

impl DecisionRepository for InMemoryDecisionRepository {
    fn insert(&self, record: DecisionRecord) -> bool {
        let id = record.decision.decision_id.clone();
        self.decisions.insert_new(&id, record)
    }

    fn decision(&self, decision_id: &str) -> Option<Arc<Mutex<DecisionRecord>>> {
        self.decisions.get(decision_id)
    }

    fn claim_proposal_id(&self, proposal_id: &str, decision_id: &str) -> bool {
        let mut index = write(&self.proposal_index);
        if index.contains_key(proposal_id) {
            return false;
        }
        index.insert(proposal_id.to_string(), decision_id.to_string());
        true
    }

    fn decision_of(&self, proposal_id: &str) -> Option<String> {
        read(&self.proposal_index).get(proposal_id).cloned()
    }

    fn decision_ids(&self) -> Vec<String> {
        self.decisions.keys()
    }

    fn decision_count(&self) -> usize {
        self.decisions.len()
    }

    fn proposal_count(&self) -> usize {
        read(&self.proposal_index).len()
    }

    fn snapshot(&self) -> Vec<DecisionRecord> {
        self.decisions.snapshot()
    }
}
