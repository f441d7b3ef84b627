//! Decision and proposal lifecycle.
//!
//! Decisions move `registered -> proposed -> {approved -> finalized | rejected}`.
//! A rejected decision may take a new proposal; a finalized one never changes
//! status again. Every mutation locks the owning decision record, validates,
//! then applies the state change and its history entry together.

use crate::core::sync::lock;
use crate::core::{now, Error, Result};
use crate::registry::config::{RegistryConfig, VotePolicy};
use crate::registry::history::{HistoryAction, HistoryEntry};
use crate::registry::model::{
    Decision, DecisionRecord, DecisionStatus, IntegritySeal, Proposal, ProposalStatus, Vote,
};
use crate::registry::repository::{DecisionRepository, InMemoryDecisionRepository};
use crate::registry::validation::{PayloadValidator, RequiredFieldsValidator};
use serde_json::json;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

fn require_id(id: &str, what: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(Error::Validation(format!("{} must not be empty", what)));
    }
    Ok(())
}

/// Decision registry.
pub struct DecisionRegistry {
    config: RegistryConfig,
    validator: Arc<dyn PayloadValidator>,
    repository: Arc<dyn DecisionRepository>,
}

impl DecisionRegistry {
    /// Create a registry backed by an in-memory repository.
    pub fn new(config: RegistryConfig) -> Self {
        Self::with_repository(config, Arc::new(InMemoryDecisionRepository::new()))
    }

    /// Create a registry over an existing repository.
    pub fn with_repository(config: RegistryConfig, repository: Arc<dyn DecisionRepository>) -> Self {
        let validator = Arc::new(RequiredFieldsValidator::new(config.required_fields.clone()));
        Self {
            config,
            validator,
            repository,
        }
    }

    /// Restore a registry from exported records.
    pub fn from_records(config: RegistryConfig, records: Vec<DecisionRecord>) -> Self {
        Self::with_repository(
            config,
            Arc::new(InMemoryDecisionRepository::from_records(records)),
        )
    }

    /// Replace the payload validator.
    pub fn with_validator(mut self, validator: Arc<dyn PayloadValidator>) -> Self {
        self.validator = validator;
        self
    }

    /// Configuration in use.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    fn record_slot(&self, decision_id: &str) -> Result<Arc<Mutex<DecisionRecord>>> {
        self.repository
            .decision(decision_id)
            .ok_or_else(|| Error::DecisionNotFound(decision_id.to_string()))
    }

    fn proposal_slot(&self, proposal_id: &str) -> Result<Arc<Mutex<DecisionRecord>>> {
        self.repository
            .decision_of(proposal_id)
            .and_then(|decision_id| self.repository.decision(&decision_id))
            .ok_or_else(|| Error::ProposalNotFound(proposal_id.to_string()))
    }

    fn check_payload(&self, payload: &serde_json::Value, schema_name: &str) -> Result<()> {
        let report = self.validator.validate(payload, schema_name);
        if !report.valid {
            return Err(Error::Validation(format!(
                "{} payload rejected: {}",
                schema_name,
                report.errors.join("; ")
            )));
        }
        Ok(())
    }

    // ==================== Mutations ====================

    /// Register a new decision.
    pub fn register_decision(
        &self,
        decision_id: &str,
        data: serde_json::Value,
    ) -> Result<HistoryEntry> {
        require_id(decision_id, "decision_id")?;
        if self.repository.decision(decision_id).is_some() {
            return Err(Error::DuplicateDecision(decision_id.to_string()));
        }
        self.check_payload(&data, "decision")?;

        let entry = HistoryEntry::new(
            decision_id,
            HistoryAction::DecisionRegistered,
            DecisionStatus::Registered,
            json!({ "data": data }),
        );
        let mut record = DecisionRecord::new(Decision::new(decision_id, data));
        record.history.push(entry.clone());

        if !self.repository.insert(record) {
            return Err(Error::DuplicateDecision(decision_id.to_string()));
        }
        info!(decision_id, "decision registered");
        Ok(entry)
    }

    /// Attach a new proposal to a decision and make it current.
    pub fn register_proposal(
        &self,
        proposal_id: &str,
        decision_id: &str,
        data: serde_json::Value,
    ) -> Result<HistoryEntry> {
        require_id(proposal_id, "proposal_id")?;
        if self.repository.decision_of(proposal_id).is_some() {
            return Err(Error::DuplicateProposal(proposal_id.to_string()));
        }
        let slot = self.record_slot(decision_id)?;
        self.check_payload(&data, "proposal")?;

        let mut guard = lock(&slot);
        let record = &mut *guard;
        let status = record.decision.status;
        if !status.accepts_proposal() {
            return Err(Error::transition(decision_id, status, "attach a proposal to"));
        }
        if !self.repository.claim_proposal_id(proposal_id, decision_id) {
            return Err(Error::DuplicateProposal(proposal_id.to_string()));
        }

        let ts = now();
        let entry = HistoryEntry::new(
            decision_id,
            HistoryAction::ProposalRegistered,
            DecisionStatus::Proposed,
            json!({ "proposal_id": proposal_id, "data": data }),
        );
        record
            .proposals
            .insert(proposal_id.to_string(), Proposal::new(proposal_id, decision_id, data));
        record.decision.proposal_ids.push(proposal_id.to_string());
        record.decision.current_proposal_id = Some(proposal_id.to_string());
        record.decision.status = DecisionStatus::Proposed;
        record.decision.updated_at = ts;
        record.history.push(entry.clone());

        info!(decision_id, proposal_id, previous = %status, "proposal registered");
        Ok(entry)
    }

    /// Record a node's vote on an open proposal.
    pub fn record_vote(&self, proposal_id: &str, node_id: &str, vote: bool) -> Result<HistoryEntry> {
        self.cast(proposal_id, node_id, Vote::new(vote))
    }

    /// Record a vote carrying an opaque signature. The signature is stored
    /// with the vote and never verified here.
    pub fn record_signed_vote(
        &self,
        proposal_id: &str,
        node_id: &str,
        vote: bool,
        signature: Vec<u8>,
    ) -> Result<HistoryEntry> {
        self.cast(proposal_id, node_id, Vote::new(vote).with_signature(signature))
    }

    fn cast(&self, proposal_id: &str, node_id: &str, vote: Vote) -> Result<HistoryEntry> {
        require_id(node_id, "node_id")?;
        let slot = self.proposal_slot(proposal_id)?;
        let mut guard = lock(&slot);
        let record = &mut *guard;

        let proposal = record
            .proposals
            .get_mut(proposal_id)
            .ok_or_else(|| Error::ProposalNotFound(proposal_id.to_string()))?;
        if proposal.status != ProposalStatus::Proposed {
            return Err(Error::transition(proposal_id, proposal.status, "vote on"));
        }

        let previous = proposal.votes.get(node_id).map(|v| v.vote);
        if previous.is_some() && self.config.vote_policy == VotePolicy::Final {
            return Err(Error::DuplicateVote {
                proposal_id: proposal_id.to_string(),
                node_id: node_id.to_string(),
            });
        }

        let value = vote.vote;
        let signed = vote.signature.is_some();
        proposal.votes.insert(node_id.to_string(), vote);
        let ts = now();
        proposal.updated_at = ts;
        record.decision.updated_at = ts;

        let entry = HistoryEntry::new(
            &record.decision.decision_id,
            HistoryAction::VoteRecorded,
            record.decision.status,
            json!({
                "proposal_id": proposal_id,
                "node_id": node_id,
                "vote": value,
                "replaced": previous,
                "signed": signed,
            }),
        );
        record.history.push(entry.clone());

        debug!(proposal_id, node_id, vote = value, replaced = previous.is_some(), "vote recorded");
        Ok(entry)
    }

    /// Mark an open proposal (and its decision) approved once quorum has
    /// been observed. Further votes are refused.
    pub fn approve_proposal(&self, proposal_id: &str) -> Result<HistoryEntry> {
        self.approve_proposal_if(proposal_id, |_| true)?
            .ok_or_else(|| Error::ProposalNotFound(proposal_id.to_string()))
    }

    /// Approve only if `gate` accepts the proposal's current votes.
    ///
    /// The gate runs under the decision lock, so no vote can land between
    /// the check and the approval. Returns `None` when the gate refuses.
    pub fn approve_proposal_if(
        &self,
        proposal_id: &str,
        gate: impl FnOnce(&Proposal) -> bool,
    ) -> Result<Option<HistoryEntry>> {
        let slot = self.proposal_slot(proposal_id)?;
        let mut guard = lock(&slot);
        let record = &mut *guard;

        let proposal = record
            .proposals
            .get_mut(proposal_id)
            .ok_or_else(|| Error::ProposalNotFound(proposal_id.to_string()))?;
        if proposal.status != ProposalStatus::Proposed {
            return Err(Error::transition(proposal_id, proposal.status, "approve"));
        }
        if !gate(&*proposal) {
            return Ok(None);
        }

        let ts = now();
        proposal.status = ProposalStatus::Approved;
        proposal.updated_at = ts;
        let payload = json!({
            "proposal_id": proposal_id,
            "affirmative": proposal.affirmative_count(),
            "negative": proposal.negative_count(),
        });
        record.decision.status = DecisionStatus::Approved;
        record.decision.updated_at = ts;

        let entry = HistoryEntry::new(
            &record.decision.decision_id,
            HistoryAction::ProposalApproved,
            DecisionStatus::Approved,
            payload,
        );
        record.history.push(entry.clone());

        info!(decision_id = %record.decision.decision_id, proposal_id, "proposal approved");
        Ok(Some(entry))
    }

    /// Close a proposal with `result`. The decision becomes `finalized` on a
    /// true result and `rejected` otherwise.
    pub fn finalize_proposal(&self, proposal_id: &str, result: bool) -> Result<HistoryEntry> {
        let slot = self.proposal_slot(proposal_id)?;
        let mut guard = lock(&slot);
        let record = &mut *guard;

        let proposal = record
            .proposals
            .get_mut(proposal_id)
            .ok_or_else(|| Error::ProposalNotFound(proposal_id.to_string()))?;
        if !proposal.status.is_open() {
            return Err(Error::transition(proposal_id, proposal.status, "finalize"));
        }

        let ts = now();
        proposal.status = ProposalStatus::Finalized;
        proposal.result = Some(result);
        proposal.updated_at = ts;
        let votes = proposal.vote_map();

        let status = if result {
            record.decision.finalized_proposal_id = Some(proposal_id.to_string());
            DecisionStatus::Finalized
        } else {
            DecisionStatus::Rejected
        };
        record.decision.status = status;
        record.decision.updated_at = ts;

        let entry = HistoryEntry::new(
            &record.decision.decision_id,
            HistoryAction::ProposalFinalized,
            status,
            json!({ "proposal_id": proposal_id, "result": result, "votes": votes }),
        );
        record.history.push(entry.clone());

        info!(
            decision_id = %record.decision.decision_id,
            proposal_id,
            result,
            status = %status,
            "proposal finalized"
        );
        Ok(entry)
    }

    /// Attach an integrity seal for a finalized proposal of `decision_id`.
    pub fn seal_decision(&self, decision_id: &str, seal: IntegritySeal) -> Result<HistoryEntry> {
        let slot = self.record_slot(decision_id)?;
        let mut guard = lock(&slot);
        let record = &mut *guard;

        let proposal = record
            .proposals
            .get(&seal.proposal_id)
            .ok_or_else(|| Error::ProposalNotFound(seal.proposal_id.clone()))?;
        if proposal.status != ProposalStatus::Finalized {
            return Err(Error::transition(&seal.proposal_id, proposal.status, "seal"));
        }

        let payload = serde_json::to_value(&seal)?;
        info!(decision_id, proposal_id = %seal.proposal_id, root = %seal.root, "decision sealed");
        record.decision.integrity_seal = Some(seal);
        record.decision.updated_at = now();

        let entry = HistoryEntry::new(
            decision_id,
            HistoryAction::DecisionSealed,
            record.decision.status,
            payload,
        );
        record.history.push(entry.clone());
        Ok(entry)
    }

    // ==================== Reads ====================

    /// Current state of a decision.
    pub fn get_decision(&self, decision_id: &str) -> Result<Decision> {
        let slot = self.record_slot(decision_id)?;
        let decision = lock(&slot).decision.clone();
        Ok(decision)
    }

    /// Current state of a proposal.
    pub fn get_proposal(&self, proposal_id: &str) -> Result<Proposal> {
        let slot = self.proposal_slot(proposal_id)?;
        let record = lock(&slot);
        record
            .proposals
            .get(proposal_id)
            .cloned()
            .ok_or_else(|| Error::ProposalNotFound(proposal_id.to_string()))
    }

    /// History of a decision in insertion order.
    pub fn get_decision_history(&self, decision_id: &str) -> Result<Vec<HistoryEntry>> {
        let slot = self.record_slot(decision_id)?;
        let history = lock(&slot).history.clone();
        Ok(history)
    }

    /// Decisions currently in `status`, ordered by ID.
    pub fn get_decisions_by_status(&self, status: DecisionStatus) -> Vec<Decision> {
        self.repository
            .decision_ids()
            .iter()
            .filter_map(|id| self.repository.decision(id))
            .filter_map(|slot| {
                let record = lock(&slot);
                if record.decision.status == status {
                    Some(record.decision.clone())
                } else {
                    None
                }
            })
            .collect()
    }

    /// Proposals currently in `status`, ordered by decision then proposal ID.
    pub fn get_proposals_by_status(&self, status: ProposalStatus) -> Vec<Proposal> {
        let mut proposals = Vec::new();
        for id in self.repository.decision_ids() {
            if let Some(slot) = self.repository.decision(&id) {
                let record = lock(&slot);
                proposals.extend(
                    record
                        .proposals
                        .values()
                        .filter(|p| p.status == status)
                        .cloned(),
                );
            }
        }
        proposals
    }

    /// Number of registered decisions.
    pub fn get_decision_count(&self) -> usize {
        self.repository.decision_count()
    }

    /// Number of registered proposals.
    pub fn get_proposal_count(&self) -> usize {
        self.repository.proposal_count()
    }

    /// Decision owning `proposal_id`.
    pub fn decision_of(&self, proposal_id: &str) -> Result<String> {
        self.repository
            .decision_of(proposal_id)
            .ok_or_else(|| Error::ProposalNotFound(proposal_id.to_string()))
    }

    /// Copy of every record, for snapshots.
    pub fn records(&self) -> Vec<DecisionRecord> {
        self.repository.snapshot()
    }
}

impl Default for DecisionRegistry {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ErrorKind, Hash256};
    use crate::registry::validation::ValidationReport;

    fn decision_data() -> serde_json::Value {
        json!({"type": "policy", "content": "x", "metadata": {}})
    }

    fn registry_with_proposal() -> DecisionRegistry {
        let registry = DecisionRegistry::default();
        registry.register_decision("D1", decision_data()).unwrap();
        registry
            .register_proposal("P1", "D1", json!({"option": "a"}))
            .unwrap();
        registry
    }

    fn seal_for(proposal_id: &str) -> IntegritySeal {
        IntegritySeal {
            proposal_id: proposal_id.to_string(),
            leaf_index: 0,
            leaf_hash: Hash256::new([1u8; 32]),
            root: Hash256::new([2u8; 32]),
            sealed_at: now(),
        }
    }

    #[test]
    fn test_register_decision() {
        let registry = DecisionRegistry::default();
        let entry = registry.register_decision("D1", decision_data()).unwrap();
        assert_eq!(entry.action, HistoryAction::DecisionRegistered);

        let decision = registry.get_decision("D1").unwrap();
        assert_eq!(decision.status, DecisionStatus::Registered);
        assert!(decision.proposal_ids.is_empty());
        assert_eq!(registry.get_decision_count(), 1);
        assert_eq!(registry.get_decision_history("D1").unwrap().len(), 1);
    }

    #[test]
    fn test_duplicate_decision_leaves_original() {
        let registry = DecisionRegistry::default();
        registry.register_decision("D1", decision_data()).unwrap();

        let other = json!({"type": "other", "content": "y", "metadata": {}});
        let err = registry.register_decision("D1", other).unwrap_err();
        assert!(matches!(err, Error::DuplicateDecision(_)));

        let decision = registry.get_decision("D1").unwrap();
        assert_eq!(decision.data, decision_data());
        assert_eq!(registry.get_decision_history("D1").unwrap().len(), 1);
    }

    #[test]
    fn test_missing_fields_rejected() {
        let registry = DecisionRegistry::default();
        let err = registry
            .register_decision("D1", json!({"type": "policy"}))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(registry.get_decision_count(), 0);
    }

    #[test]
    fn test_empty_id_rejected() {
        let registry = DecisionRegistry::default();
        assert!(registry.register_decision(" ", decision_data()).is_err());
    }

    #[test]
    fn test_register_proposal() {
        let registry = registry_with_proposal();
        let decision = registry.get_decision("D1").unwrap();
        assert_eq!(decision.status, DecisionStatus::Proposed);
        assert_eq!(decision.current_proposal_id.as_deref(), Some("P1"));
        assert_eq!(decision.proposal_ids, vec!["P1"]);

        let proposal = registry.get_proposal("P1").unwrap();
        assert_eq!(proposal.decision_id, "D1");
        assert_eq!(proposal.status, ProposalStatus::Proposed);
        assert_eq!(registry.get_proposal_count(), 1);
    }

    #[test]
    fn test_register_proposal_errors() {
        let registry = registry_with_proposal();

        let err = registry.register_proposal("P2", "D9", json!({})).unwrap_err();
        assert!(matches!(err, Error::DecisionNotFound(_)));

        let err = registry.register_proposal("P1", "D1", json!({})).unwrap_err();
        assert!(matches!(err, Error::DuplicateProposal(_)));

        // P1 is still open
        let err = registry.register_proposal("P2", "D1", json!({})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidStateTransition);
        assert_eq!(registry.get_proposal_count(), 1);
    }

    #[test]
    fn test_proposal_ids_unique_across_decisions() {
        let registry = registry_with_proposal();
        registry.register_decision("D2", decision_data()).unwrap();
        let err = registry.register_proposal("P1", "D2", json!({})).unwrap_err();
        assert!(matches!(err, Error::DuplicateProposal(_)));
        assert_eq!(
            registry.get_decision("D2").unwrap().status,
            DecisionStatus::Registered
        );
    }

    #[test]
    fn test_record_vote_overwrites_by_default() {
        let registry = registry_with_proposal();
        registry.record_vote("P1", "N1", true).unwrap();
        let entry = registry.record_vote("P1", "N1", false).unwrap();
        assert_eq!(entry.payload["replaced"], json!(true));

        let proposal = registry.get_proposal("P1").unwrap();
        assert_eq!(proposal.votes.len(), 1);
        assert!(!proposal.votes["N1"].vote);
    }

    #[test]
    fn test_final_vote_policy_rejects_second_vote() {
        let registry =
            DecisionRegistry::new(RegistryConfig::default().with_vote_policy(VotePolicy::Final));
        registry.register_decision("D1", decision_data()).unwrap();
        registry.register_proposal("P1", "D1", json!({})).unwrap();
        registry.record_vote("P1", "N1", true).unwrap();

        let err = registry.record_vote("P1", "N1", false).unwrap_err();
        assert!(matches!(err, Error::DuplicateVote { .. }));
        assert!(registry.get_proposal("P1").unwrap().votes["N1"].vote);
    }

    #[test]
    fn test_vote_on_unknown_proposal() {
        let registry = registry_with_proposal();
        let before = registry.get_decision_history("D1").unwrap();

        let err = registry.record_vote("P9", "N1", true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(registry.get_decision_history("D1").unwrap(), before);
    }

    #[test]
    fn test_signed_vote_stored() {
        let registry = registry_with_proposal();
        let entry = registry
            .record_signed_vote("P1", "N1", true, vec![1, 2, 3])
            .unwrap();
        assert_eq!(entry.payload["signed"], json!(true));
        let proposal = registry.get_proposal("P1").unwrap();
        assert_eq!(proposal.votes["N1"].signature, Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_approve_then_finalize() {
        let registry = registry_with_proposal();
        registry.record_vote("P1", "N1", true).unwrap();
        registry.approve_proposal("P1").unwrap();
        assert_eq!(
            registry.get_decision("D1").unwrap().status,
            DecisionStatus::Approved
        );

        // Voting closes on approval
        let err = registry.record_vote("P1", "N2", true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidStateTransition);

        registry.finalize_proposal("P1", true).unwrap();
        let decision = registry.get_decision("D1").unwrap();
        assert_eq!(decision.status, DecisionStatus::Finalized);
        assert_eq!(decision.finalized_proposal_id.as_deref(), Some("P1"));
        assert_eq!(registry.get_proposal("P1").unwrap().result, Some(true));
    }

    #[test]
    fn test_gated_approval() {
        let registry = registry_with_proposal();
        registry.record_vote("P1", "N1", true).unwrap();

        let refused = registry
            .approve_proposal_if("P1", |p| p.affirmative_count() >= 2)
            .unwrap();
        assert!(refused.is_none());
        assert_eq!(
            registry.get_proposal("P1").unwrap().status,
            ProposalStatus::Proposed
        );

        registry.record_vote("P1", "N2", true).unwrap();
        let approved = registry
            .approve_proposal_if("P1", |p| p.affirmative_count() >= 2)
            .unwrap();
        assert_eq!(approved.unwrap().action, HistoryAction::ProposalApproved);
        assert!(registry.approve_proposal("P1").is_err());
    }

    #[test]
    fn test_rejected_decision_takes_new_proposal() {
        let registry = registry_with_proposal();
        registry.record_vote("P1", "N1", false).unwrap();
        let entry = registry.finalize_proposal("P1", false).unwrap();
        assert_eq!(entry.status, DecisionStatus::Rejected);

        let decision = registry.get_decision("D1").unwrap();
        assert_eq!(decision.status, DecisionStatus::Rejected);
        assert!(decision.finalized_proposal_id.is_none());

        registry.register_proposal("P2", "D1", json!({})).unwrap();
        let decision = registry.get_decision("D1").unwrap();
        assert_eq!(decision.status, DecisionStatus::Proposed);
        assert_eq!(decision.proposal_ids, vec!["P1", "P2"]);
        assert_eq!(decision.current_proposal_id.as_deref(), Some("P2"));

        // The rejected proposal stays closed
        assert!(registry.record_vote("P1", "N1", true).is_err());
    }

    #[test]
    fn test_finalized_decision_is_terminal() {
        let registry = registry_with_proposal();
        registry.finalize_proposal("P1", true).unwrap();

        let err = registry.finalize_proposal("P1", false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidStateTransition);
        let err = registry.register_proposal("P2", "D1", json!({})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidStateTransition);
        assert_eq!(
            registry.get_decision("D1").unwrap().status,
            DecisionStatus::Finalized
        );
    }

    #[test]
    fn test_finalize_unknown_proposal() {
        let registry = DecisionRegistry::default();
        let err = registry.finalize_proposal("P1", true).unwrap_err();
        assert!(matches!(err, Error::ProposalNotFound(_)));
    }

    #[test]
    fn test_seal_requires_finalized_proposal() {
        let registry = registry_with_proposal();
        let err = registry.seal_decision("D1", seal_for("P1")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidStateTransition);

        registry.finalize_proposal("P1", true).unwrap();
        let entry = registry.seal_decision("D1", seal_for("P1")).unwrap();
        assert_eq!(entry.action, HistoryAction::DecisionSealed);
        assert_eq!(entry.status, DecisionStatus::Finalized);

        let decision = registry.get_decision("D1").unwrap();
        assert_eq!(decision.integrity_seal.unwrap().root, Hash256::new([2u8; 32]));
    }

    #[test]
    fn test_history_order() {
        let registry = registry_with_proposal();
        registry.record_vote("P1", "N1", true).unwrap();
        registry.approve_proposal("P1").unwrap();
        registry.finalize_proposal("P1", true).unwrap();

        let actions: Vec<HistoryAction> = registry
            .get_decision_history("D1")
            .unwrap()
            .iter()
            .map(|e| e.action)
            .collect();
        assert_eq!(
            actions,
            vec![
                HistoryAction::DecisionRegistered,
                HistoryAction::ProposalRegistered,
                HistoryAction::VoteRecorded,
                HistoryAction::ProposalApproved,
                HistoryAction::ProposalFinalized,
            ]
        );
    }

    #[test]
    fn test_status_queries() {
        let registry = registry_with_proposal();
        registry.register_decision("D2", decision_data()).unwrap();
        registry.register_decision("D3", decision_data()).unwrap();

        assert_eq!(
            registry.get_decisions_by_status(DecisionStatus::Registered).len(),
            2
        );
        assert_eq!(
            registry.get_proposals_by_status(ProposalStatus::Proposed).len(),
            1
        );
        registry.finalize_proposal("P1", true).unwrap();
        let finalized = registry.get_decisions_by_status(DecisionStatus::Finalized);
        assert_eq!(finalized.len(), 1);
        assert_eq!(finalized[0].decision_id, "D1");
        assert!(registry
            .get_proposals_by_status(ProposalStatus::Proposed)
            .is_empty());
    }

    #[test]
    fn test_records_round_trip() {
        let registry = registry_with_proposal();
        registry.record_vote("P1", "N1", true).unwrap();

        let restored = DecisionRegistry::from_records(RegistryConfig::default(), registry.records());
        assert_eq!(restored.get_proposal("P1").unwrap().votes.len(), 1);
        assert_eq!(restored.decision_of("P1").unwrap(), "D1");
        assert!(restored.register_proposal("P1", "D1", json!({})).is_err());
    }

    struct RejectAll;

    impl PayloadValidator for RejectAll {
        fn validate(&self, _payload: &serde_json::Value, _schema_name: &str) -> ValidationReport {
            ValidationReport::failed(vec!["nope".to_string()])
        }
    }

    #[test]
    fn test_custom_validator() {
        let registry = DecisionRegistry::default().with_validator(Arc::new(RejectAll));
        let err = registry.register_decision("D1", decision_data()).unwrap_err();
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn test_concurrent_votes_are_not_lost() {
        let registry = Arc::new(registry_with_proposal());
        std::thread::scope(|scope| {
            for i in 0..16 {
                let registry = Arc::clone(&registry);
                scope.spawn(move || {
                    registry
                        .record_vote("P1", &format!("N{}", i), i % 2 == 0)
                        .unwrap();
                });
            }
        });

        let proposal = registry.get_proposal("P1").unwrap();
        assert_eq!(proposal.votes.len(), 16);
        assert_eq!(proposal.affirmative_count(), 8);
        // registered + proposal + 16 votes
        assert_eq!(registry.get_decision_history("D1").unwrap().len(), 18);
    }
}
