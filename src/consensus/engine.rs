//! Consensus engine orchestrating registry, trust, quorum and sealing.
//!
//! - Lifecycle calls forward their history entries to the durable store
//! - Quorum is checked against head-count or trust-weighted votes
//! - Every closed proposal is sealed into the hash ledger
//!
//! Store and notifier calls happen after the in-memory commit. Their
//! failures are logged and counted but never undo or fail the operation.

use crate::consensus::config::EngineConfig;
use crate::consensus::metrics::{EngineMetrics, MetricsSnapshot};
use crate::consensus::tally::{tally_votes, ConsensusResult};
use crate::core::sync::lock;
use crate::core::{now, Error, Hash256, Resolved, Result};
use crate::events::{EventNotifier, LedgerEvent, NoopNotifier};
use crate::ledger::{HashLedger, InclusionProof};
use crate::quorum::{validate_quorum_size, QuorumSpec};
use crate::registry::{
    Decision, DecisionRegistry, HistoryEntry, IntegritySeal, Proposal, ProposalStatus,
};
use crate::store::{DurableStore, InMemoryStore, LedgerSnapshot};
use crate::trust::{RegenerationContext, TrustLedger};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Result of [`ConsensusEngine::finalize_if_quorum`].
#[derive(Clone, Debug, PartialEq)]
pub enum FinalizeOutcome {
    /// Not enough affirmative weight yet
    Pending(ConsensusResult),
    /// Quorum reached; the proposal was finalized and sealed
    Finalized {
        tally: ConsensusResult,
        seal: IntegritySeal,
    },
}

impl FinalizeOutcome {
    /// Whether the proposal was finalized.
    pub fn is_finalized(&self) -> bool {
        matches!(self, FinalizeOutcome::Finalized { .. })
    }

    /// Vote count the outcome was based on.
    pub fn tally(&self) -> &ConsensusResult {
        match self {
            FinalizeOutcome::Pending(tally) => tally,
            FinalizeOutcome::Finalized { tally, .. } => tally,
        }
    }
}

/// Inclusion proof for a decision's sealed outcome.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DecisionProof {
    /// Decision proven
    pub decision_id: String,
    /// Proposal whose outcome was sealed
    pub proposal_id: String,
    /// Sealed leaf hash
    pub leaf_hash: Hash256,
    /// Proof against the ledger root at generation time
    pub proof: InclusionProof,
}

impl DecisionProof {
    /// Replay the proof against the root it carries.
    pub fn verify(&self) -> bool {
        self.proof.compute_root(&self.leaf_hash) == self.proof.root
    }
}

/// Quorum-gated decision ledger.
pub struct ConsensusEngine {
    config: EngineConfig,
    /// Threshold with the marker of any substituted default
    quorum: Resolved<QuorumSpec>,
    registry: DecisionRegistry,
    trust: TrustLedger,
    /// Leaf append and rebuild happen under one lock
    ledger: Mutex<HashLedger>,
    store: Arc<dyn DurableStore>,
    notifier: Arc<dyn EventNotifier>,
    metrics: EngineMetrics,
}

impl ConsensusEngine {
    /// Create an empty engine with an in-memory store and no notifier.
    pub fn new(config: EngineConfig) -> Result<Self> {
        let registry = DecisionRegistry::new(config.registry.clone());
        let trust = TrustLedger::new(config.trust.clone())?;
        Self::assemble(config, registry, trust, HashLedger::new())
    }

    fn assemble(
        config: EngineConfig,
        registry: DecisionRegistry,
        trust: TrustLedger,
        ledger: HashLedger,
    ) -> Result<Self> {
        config.validate()?;
        let quorum = QuorumSpec::resolve(config.protocol, config.node_count)?;
        let spec = quorum.value();
        info!(
            protocol = %spec.protocol,
            node_count = spec.node_count,
            threshold = spec.resolved_threshold,
            defaulted = quorum.is_defaulted(),
            weighting = ?config.weighting,
            "consensus engine ready"
        );
        Ok(Self {
            config,
            quorum,
            registry,
            trust,
            ledger: Mutex::new(ledger),
            store: Arc::new(InMemoryStore::new()),
            notifier: Arc::new(NoopNotifier),
            metrics: EngineMetrics::default(),
        })
    }

    /// Use `store` for history and snapshots.
    pub fn with_store(mut self, store: Arc<dyn DurableStore>) -> Self {
        self.store = store;
        self
    }

    /// Use `notifier` for lifecycle events.
    pub fn with_notifier(mut self, notifier: Arc<dyn EventNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Rebuild an engine from a snapshot.
    ///
    /// Fails if the leaves do not reproduce the recorded root or a decision's
    /// seal does not match the leaf it points at.
    pub fn restore(config: EngineConfig, snapshot: &LedgerSnapshot) -> Result<Self> {
        let ledger = snapshot.rebuild_ledger()?;
        for record in &snapshot.decisions {
            if let Some(seal) = &record.decision.integrity_seal {
                let actual = ledger.leaf(seal.leaf_index).map(|leaf| &leaf.hash);
                if actual != Some(&seal.leaf_hash) {
                    return Err(Error::SnapshotMismatch {
                        expected: seal.leaf_hash.to_hex(),
                        actual: actual
                            .map(|h| h.to_hex())
                            .unwrap_or_else(|| "<missing leaf>".to_string()),
                    });
                }
            }
        }

        let registry =
            DecisionRegistry::from_records(config.registry.clone(), snapshot.decisions.clone());
        let trust = TrustLedger::from_entities(config.trust.clone(), snapshot.trust.clone())?;
        info!(
            snapshot_id = %snapshot.snapshot_id,
            decisions = snapshot.decisions.len(),
            entities = snapshot.trust.len(),
            leaves = ledger.leaf_count(),
            "engine restored from snapshot"
        );
        Self::assemble(config, registry, trust, ledger)
    }

    /// Resume from the store's latest snapshot, or start empty.
    pub async fn open(config: EngineConfig, store: Arc<dyn DurableStore>) -> Result<Self> {
        let engine = match store.load_snapshot().await? {
            Some(snapshot) => Self::restore(config, &snapshot)?,
            None => Self::new(config)?,
        };
        Ok(engine.with_store(store))
    }

    // ==================== Accessors ====================

    /// Configuration in use.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Resolved quorum requirement.
    pub fn quorum(&self) -> &QuorumSpec {
        self.quorum.value()
    }

    /// Quorum requirement together with whether a default replaced the
    /// configured protocol parameters.
    pub fn quorum_resolution(&self) -> &Resolved<QuorumSpec> {
        &self.quorum
    }

    /// Decision registry.
    pub fn registry(&self) -> &DecisionRegistry {
        &self.registry
    }

    /// Trust ledger.
    pub fn trust(&self) -> &TrustLedger {
        &self.trust
    }

    /// Counter values.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Current hash ledger root.
    pub fn root(&self) -> Option<Hash256> {
        lock(&self.ledger).root().cloned()
    }

    /// Number of sealed leaves.
    pub fn leaf_count(&self) -> usize {
        lock(&self.ledger).leaf_count()
    }

    /// Whether `size` is a sufficient quorum for this network.
    pub fn validate_quorum_size(&self, size: usize) -> bool {
        let quorum = self.quorum();
        validate_quorum_size(size, quorum.node_count, &quorum.protocol)
    }

    // ==================== Decision lifecycle ====================

    /// Register a decision.
    pub async fn register_decision(
        &self,
        decision_id: &str,
        data: serde_json::Value,
    ) -> Result<HistoryEntry> {
        let entry = self.registry.register_decision(decision_id, data)?;
        self.metrics.decisions_registered.inc();
        self.persist(&entry).await;
        Ok(entry)
    }

    /// Attach a proposal to a decision.
    pub async fn register_proposal(
        &self,
        proposal_id: &str,
        decision_id: &str,
        data: serde_json::Value,
    ) -> Result<HistoryEntry> {
        let entry = self
            .registry
            .register_proposal(proposal_id, decision_id, data)?;
        self.metrics.proposals_registered.inc();
        self.persist(&entry).await;
        Ok(entry)
    }

    /// Record a vote.
    pub async fn record_vote(
        &self,
        proposal_id: &str,
        node_id: &str,
        vote: bool,
    ) -> Result<HistoryEntry> {
        let entry = self.registry.record_vote(proposal_id, node_id, vote)?;
        self.metrics.votes_recorded.inc();
        self.persist(&entry).await;
        Ok(entry)
    }

    /// Record a vote with an opaque signature.
    pub async fn record_signed_vote(
        &self,
        proposal_id: &str,
        node_id: &str,
        vote: bool,
        signature: Vec<u8>,
    ) -> Result<HistoryEntry> {
        let entry = self
            .registry
            .record_signed_vote(proposal_id, node_id, vote, signature)?;
        self.metrics.votes_recorded.inc();
        self.persist(&entry).await;
        Ok(entry)
    }

    /// Count a proposal's votes against the quorum.
    pub fn tally(&self, proposal_id: &str) -> Result<ConsensusResult> {
        let proposal = self.registry.get_proposal(proposal_id)?;
        Ok(self.count(&proposal))
    }

    fn count(&self, proposal: &Proposal) -> ConsensusResult {
        tally_votes(
            proposal,
            self.quorum(),
            self.config.weighting,
            |node_id| self.trust.current_aggregate(node_id),
            self.config.unscored_node_weight,
        )
    }

    /// Finalize and seal a proposal if its votes meet the quorum.
    ///
    /// The quorum check and the approval happen under the decision lock, so
    /// a late vote cannot slip in between. An already approved proposal is
    /// finalized directly.
    pub async fn finalize_if_quorum(&self, proposal_id: &str) -> Result<FinalizeOutcome> {
        let proposal = self.registry.get_proposal(proposal_id)?;
        let mut events = Vec::new();

        let tally = match proposal.status {
            ProposalStatus::Finalized => {
                return Err(Error::transition(proposal_id, proposal.status, "finalize"));
            }
            ProposalStatus::Approved => self.count(&proposal),
            ProposalStatus::Proposed => {
                let mut observed = None;
                let approved = self.registry.approve_proposal_if(proposal_id, |p| {
                    let tally = self.count(p);
                    let reached = tally.quorum_reached;
                    observed = Some(tally);
                    reached
                })?;
                let tally = match observed {
                    Some(tally) => tally,
                    None => self.count(&proposal),
                };

                let entry = match approved {
                    Some(entry) => entry,
                    None => {
                        debug!(
                            proposal_id,
                            affirmative = tally.affirmative_weight,
                            threshold = tally.threshold,
                            "quorum not reached"
                        );
                        return Ok(FinalizeOutcome::Pending(tally));
                    }
                };
                self.metrics.quorums_reached.inc();
                self.persist(&entry).await;
                events.push(LedgerEvent::quorum_reached(
                    &tally.decision_id,
                    proposal_id,
                    tally.affirmative_weight,
                    tally.threshold,
                ));
                tally
            }
        };

        let (seal, finalized) = self.close(proposal_id, true).await?;
        events.push(finalized);
        self.publish_all(events).await;
        Ok(FinalizeOutcome::Finalized { tally, seal })
    }

    /// Finalize a proposal with `result` and seal the outcome.
    ///
    /// Callers are expected to have checked the quorum themselves; use
    /// [`finalize_if_quorum`](Self::finalize_if_quorum) otherwise.
    pub async fn finalize_proposal(&self, proposal_id: &str, result: bool) -> Result<IntegritySeal> {
        let (seal, event) = self.close(proposal_id, result).await?;
        self.publish_all(vec![event]).await;
        Ok(seal)
    }

    /// Finalize a proposal negatively and seal the outcome. The decision may
    /// then take a new proposal.
    pub async fn reject_proposal(&self, proposal_id: &str) -> Result<IntegritySeal> {
        self.finalize_proposal(proposal_id, false).await
    }

    async fn close(&self, proposal_id: &str, result: bool) -> Result<(IntegritySeal, LedgerEvent)> {
        let finalized = self.registry.finalize_proposal(proposal_id, result)?;
        if result {
            self.metrics.decisions_finalized.inc();
        } else {
            self.metrics.decisions_rejected.inc();
        }
        let (seal, sealed) = self.seal(proposal_id)?;

        self.persist(&finalized).await;
        self.persist(&sealed).await;
        let event = LedgerEvent::decision_finalized(
            &finalized.decision_id,
            proposal_id,
            result,
            seal.root.clone(),
        );
        Ok((seal, event))
    }

    fn seal(&self, proposal_id: &str) -> Result<(IntegritySeal, HistoryEntry)> {
        let proposal = self.registry.get_proposal(proposal_id)?;
        let outcome = proposal
            .outcome()
            .ok_or_else(|| Error::transition(proposal_id, proposal.status, "seal"))?;

        let seal = {
            let mut ledger = lock(&self.ledger);
            let leaf_hash = ledger.add_leaf(&outcome)?;
            let leaf_index = ledger.leaf_count() - 1;
            let root = ledger.build_tree()?;
            IntegritySeal {
                proposal_id: proposal_id.to_string(),
                leaf_index,
                leaf_hash,
                root,
                sealed_at: now(),
            }
        };

        let entry = self.registry.seal_decision(&outcome.decision_id, seal.clone())?;
        self.metrics.seals.inc();
        Ok((seal, entry))
    }

    /// Inclusion proof of a decision's sealed outcome against the current root.
    pub fn prove_decision(&self, decision_id: &str) -> Result<DecisionProof> {
        let decision = self.registry.get_decision(decision_id)?;
        let seal = decision
            .integrity_seal
            .ok_or_else(|| Error::transition(decision_id, "unsealed", "prove"))?;

        let ledger = lock(&self.ledger);
        let proof = ledger.get_proof(seal.leaf_index)?;
        ledger.ensure_proof(&seal.leaf_hash, &proof, None)?;
        Ok(DecisionProof {
            decision_id: decision_id.to_string(),
            proposal_id: seal.proposal_id,
            leaf_hash: seal.leaf_hash,
            proof,
        })
    }

    /// Verify a proof against `root`, or the current root when `None`.
    pub fn verify_proof(
        &self,
        leaf_hash: &Hash256,
        proof: &InclusionProof,
        root: Option<&Hash256>,
    ) -> bool {
        lock(&self.ledger).verify_proof(leaf_hash, proof, root)
    }

    /// Current state of a decision.
    pub fn get_decision(&self, decision_id: &str) -> Result<Decision> {
        self.registry.get_decision(decision_id)
    }

    /// Current state of a proposal.
    pub fn get_proposal(&self, proposal_id: &str) -> Result<Proposal> {
        self.registry.get_proposal(proposal_id)
    }

    /// History of a decision.
    pub fn get_decision_history(&self, decision_id: &str) -> Result<Vec<HistoryEntry>> {
        self.registry.get_decision_history(decision_id)
    }

    // ==================== Trust lifecycle ====================

    /// Record a trust dimension value (clamped to `[0, 1]`).
    pub async fn update_trust(&self, entity_id: &str, dimension: &str, value: f64) -> Result<f64> {
        let stored = self
            .trust
            .update_dimension_metric(entity_id, dimension, value)?;
        self.trust_changed(entity_id, Some(dimension), stored).await;
        Ok(stored)
    }

    /// Recompute an entity's aggregate score. Trust-weighted tallies use the
    /// latest aggregate.
    pub async fn refresh_trust_aggregate(&self, entity_id: &str) -> Result<f64> {
        let aggregate = self.trust.calculate_aggregate_metric(entity_id)?;
        self.trust_changed(entity_id, None, aggregate).await;
        Ok(aggregate)
    }

    /// Apply decay for a negative event to a stored dimension.
    pub async fn report_trust_event(
        &self,
        entity_id: &str,
        dimension: &str,
        event_type: &str,
    ) -> Result<Resolved<f64>> {
        let adjusted = self
            .trust
            .apply_decay_to_dimension(entity_id, dimension, event_type)?;
        self.trust_changed(entity_id, Some(dimension), *adjusted.value())
            .await;
        Ok(adjusted)
    }

    /// Apply regeneration for an attestation to a stored dimension.
    pub async fn attest_trust(
        &self,
        entity_id: &str,
        dimension: &str,
        regeneration_type: &str,
        context: &RegenerationContext,
    ) -> Result<Resolved<f64>> {
        let adjusted = self.trust.regenerate_dimension(
            entity_id,
            dimension,
            regeneration_type,
            context.authority_weight,
        )?;
        self.trust_changed(entity_id, Some(dimension), *adjusted.value())
            .await;
        Ok(adjusted)
    }

    async fn trust_changed(&self, entity_id: &str, dimension: Option<&str>, value: f64) {
        self.metrics.trust_updates.inc();
        self.publish_all(vec![LedgerEvent::trust_updated(entity_id, dimension, value)])
            .await;
    }

    // ==================== Persistence ====================

    /// Capture the current state without persisting it.
    pub fn capture(&self) -> LedgerSnapshot {
        // Registry before ledger: every seal captured has its leaf captured too.
        let decisions = self.registry.records();
        let trust = self.trust.snapshot();
        let ledger = lock(&self.ledger);
        LedgerSnapshot::new(
            decisions,
            trust,
            ledger.leaves().to_vec(),
            ledger.root().cloned(),
        )
    }

    /// Capture the current state and persist it through the store.
    pub async fn checkpoint(&self) -> Result<LedgerSnapshot> {
        let snapshot = self.capture();
        if let Err(err) = self.store.persist_snapshot(&snapshot).await {
            self.metrics.store_failures.inc();
            warn!(store = self.store.name(), error = %err, "snapshot not persisted");
            return Err(err);
        }
        info!(
            snapshot_id = %snapshot.snapshot_id,
            decisions = snapshot.decisions.len(),
            leaves = snapshot.leaves.len(),
            "checkpoint written"
        );
        Ok(snapshot)
    }

    async fn persist(&self, entry: &HistoryEntry) {
        if let Err(err) = self.store.append_history(entry).await {
            self.metrics.store_failures.inc();
            warn!(
                store = self.store.name(),
                decision_id = %entry.decision_id,
                action = %entry.action,
                error = %err,
                "history entry not persisted"
            );
        }
    }

    async fn publish_all(&self, events: Vec<LedgerEvent>) {
        let notifier = &self.notifier;
        let results = join_all(events.into_iter().map(|event| async move {
            let event_type = event.event_type();
            (event_type, notifier.publish(event).await)
        }))
        .await;

        for (event_type, result) in results {
            if let Err(err) = result {
                self.metrics.notifier_failures.inc();
                warn!(
                    notifier = self.notifier.name(),
                    event = %event_type,
                    error = %err,
                    "event not published"
                );
            }
        }
    }
}
