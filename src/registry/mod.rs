//! Decision Registry
//!
//! Lifecycle of governance decisions and their proposals:
//! - Registration with payload validation
//! - Proposal attachment, voting and quorum-gated finalization
//! - Integrity seals and an append-only history per decision
//! - Repository abstraction with per-decision locking

pub mod config;
pub mod history;
pub mod lifecycle;
pub mod model;
pub mod repository;
pub mod validation;

pub use config::{RegistryConfig, VotePolicy};
pub use history::{HistoryAction, HistoryEntry};
pub use lifecycle::DecisionRegistry;
pub use model::{
    Decision, DecisionRecord, DecisionStatus, IntegritySeal, Proposal, ProposalStatus,
    SealedOutcome, Vote,
};
pub use repository::{DecisionRepository, InMemoryDecisionRepository};
pub use validation::{PayloadValidator, RequiredFieldsValidator, ValidationReport};
