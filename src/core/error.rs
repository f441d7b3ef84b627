//! Error types for the quorum ledger.

use thiserror::Error;

/// Result type alias for ledger operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Broad classification of an [`Error`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or malformed input, duplicate identifiers
    Validation,
    /// Unknown decision, proposal or entity
    NotFound,
    /// Operation not allowed in the current lifecycle state
    InvalidStateTransition,
    /// Invalid quorum or trust configuration
    Configuration,
    /// Hash tree or proof failures
    Integrity,
    /// Serialization, storage and I/O failures
    Infrastructure,
}

/// Errors that can occur in ledger operations.
#[derive(Error, Debug)]
pub enum Error {
    // Registration errors
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Decision already registered: {0}")]
    DuplicateDecision(String),

    #[error("Proposal already registered: {0}")]
    DuplicateProposal(String),

    #[error("Node {node_id} already voted on {proposal_id}")]
    DuplicateVote {
        proposal_id: String,
        node_id: String,
    },

    // Lookup errors
    #[error("Decision not found: {0}")]
    DecisionNotFound(String),

    #[error("Proposal not found: {0}")]
    ProposalNotFound(String),

    #[error("Entity not found: {0}")]
    EntityNotFound(String),

    // Lifecycle errors
    #[error("Cannot {action} {id} while it is {from}")]
    InvalidStateTransition {
        id: String,
        from: String,
        action: String,
    },

    // Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    // Integrity errors
    #[error("Cannot build a hash tree with zero leaves")]
    EmptyTree,

    #[error("Hash tree has not been built")]
    TreeNotBuilt,

    #[error("Hash tree is stale: {pending} leaves added since the last build")]
    StaleTree { pending: usize },

    #[error("Leaf index {index} out of range for {len} leaves")]
    LeafIndexOutOfRange { index: usize, len: usize },

    #[error("Inclusion proof does not reconstruct root {0}")]
    ProofVerificationFailed(String),

    #[error("Snapshot root mismatch: expected {expected}, rebuilt {actual}")]
    SnapshotMismatch { expected: String, actual: String },

    // Infrastructure errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Notifier error: {0}")]
    Notifier(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_)
            | Error::DuplicateDecision(_)
            | Error::DuplicateProposal(_)
            | Error::DuplicateVote { .. } => ErrorKind::Validation,
            Error::DecisionNotFound(_) | Error::ProposalNotFound(_) | Error::EntityNotFound(_) => {
                ErrorKind::NotFound
            }
            Error::InvalidStateTransition { .. } => ErrorKind::InvalidStateTransition,
            Error::Configuration(_) => ErrorKind::Configuration,
            Error::EmptyTree
            | Error::TreeNotBuilt
            | Error::StaleTree { .. }
            | Error::LeafIndexOutOfRange { .. }
            | Error::ProofVerificationFailed(_)
            | Error::SnapshotMismatch { .. } => ErrorKind::Integrity,
            Error::Serialization(_) | Error::Store(_) | Error::Notifier(_) | Error::Io(_) => {
                ErrorKind::Infrastructure
            }
        }
    }

    pub(crate) fn transition(id: &str, from: impl std::fmt::Display, action: &str) -> Self {
        Error::InvalidStateTransition {
            id: id.to_string(),
            from: from.to_string(),
            action: action.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
