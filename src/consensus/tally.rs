//! Vote counting against a quorum threshold.
//!
//! Head-count tallies give every affirmative vote weight 1. Trust-weighted
//! tallies give each affirmative node its latest aggregate trust score, so
//! the total can only reach the threshold when enough trusted nodes agree.

use crate::quorum::QuorumSpec;
use crate::registry::Proposal;
use serde::{Deserialize, Serialize};

/// How affirmative votes are counted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteWeighting {
    /// One node, one vote
    #[default]
    HeadCount,
    /// Each vote weighted by the node's aggregate trust score
    TrustWeighted,
}

/// Outcome of counting a proposal's votes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConsensusResult {
    /// Proposal counted
    pub proposal_id: String,
    /// Owning decision
    pub decision_id: String,
    /// Counting rule used
    pub weighting: VoteWeighting,
    /// Number of yes votes
    pub affirmative_votes: usize,
    /// Number of no votes
    pub negative_votes: usize,
    /// Weighted yes total (equals `affirmative_votes` for head counts)
    pub affirmative_weight: f64,
    /// Weighted no total
    pub negative_weight: f64,
    /// Required threshold
    pub threshold: usize,
    /// Network size the threshold was computed for
    pub node_count: usize,
    /// Whether the affirmative weight meets the threshold
    pub quorum_reached: bool,
    /// Voters that had no trust score and got the fallback weight
    pub unscored_voters: Vec<String>,
}

impl ConsensusResult {
    /// Affirmative weight still missing, zero once quorum is reached.
    pub fn shortfall(&self) -> f64 {
        (self.threshold as f64 - self.affirmative_weight).max(0.0)
    }
}

/// Count the votes on `proposal` against `spec`.
///
/// `trust_of` returns a node's aggregate trust score; it is only consulted
/// for `TrustWeighted` tallies. Nodes without a score weigh `unscored_weight`.
pub fn tally_votes(
    proposal: &Proposal,
    spec: &QuorumSpec,
    weighting: VoteWeighting,
    trust_of: impl Fn(&str) -> Option<f64>,
    unscored_weight: f64,
) -> ConsensusResult {
    let mut affirmative_votes = 0;
    let mut negative_votes = 0;
    let mut affirmative_weight = 0.0;
    let mut negative_weight = 0.0;
    let mut unscored_voters = Vec::new();

    for (node_id, vote) in &proposal.votes {
        let weight = match weighting {
            VoteWeighting::HeadCount => 1.0,
            VoteWeighting::TrustWeighted => match trust_of(node_id) {
                Some(score) if score.is_finite() => score.clamp(0.0, 1.0),
                _ => {
                    unscored_voters.push(node_id.clone());
                    unscored_weight.clamp(0.0, 1.0)
                }
            },
        };

        if vote.vote {
            affirmative_votes += 1;
            affirmative_weight += weight;
        } else {
            negative_votes += 1;
            negative_weight += weight;
        }
    }

    ConsensusResult {
        proposal_id: proposal.proposal_id.clone(),
        decision_id: proposal.decision_id.clone(),
        weighting,
        affirmative_votes,
        negative_votes,
        affirmative_weight,
        negative_weight,
        threshold: spec.resolved_threshold,
        node_count: spec.node_count,
        quorum_reached: spec.is_met(affirmative_weight),
        unscored_voters,
    }
}
