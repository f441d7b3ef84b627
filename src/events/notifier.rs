//! Lifecycle event sink.
//!
//! Delivery is best effort: the engine logs and counts publish failures but
//! never fails the operation that produced the event.

use crate::core::{now, Error, Hash256, Result, Timestamp};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Event kind identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// A proposal was finalized and sealed
    DecisionFinalized,
    /// An entity's trust score changed
    TrustUpdated,
    /// A proposal gathered enough affirmative weight
    QuorumReached,
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventType::DecisionFinalized => write!(f, "decision_finalized"),
            EventType::TrustUpdated => write!(f, "trust_updated"),
            EventType::QuorumReached => write!(f, "quorum_reached"),
        }
    }
}

/// A lifecycle event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LedgerEvent {
    DecisionFinalized {
        decision_id: String,
        proposal_id: String,
        result: bool,
        root: Hash256,
        timestamp: Timestamp,
    },
    TrustUpdated {
        entity_id: String,
        /// Dimension name, or `None` for the aggregate
        dimension: Option<String>,
        value: f64,
        timestamp: Timestamp,
    },
    QuorumReached {
        decision_id: String,
        proposal_id: String,
        affirmative: f64,
        threshold: usize,
        timestamp: Timestamp,
    },
}

impl LedgerEvent {
    /// Event for a sealed outcome.
    pub fn decision_finalized(decision_id: &str, proposal_id: &str, result: bool, root: Hash256) -> Self {
        LedgerEvent::DecisionFinalized {
            decision_id: decision_id.to_string(),
            proposal_id: proposal_id.to_string(),
            result,
            root,
            timestamp: now(),
        }
    }

    /// Event for a trust change.
    pub fn trust_updated(entity_id: &str, dimension: Option<&str>, value: f64) -> Self {
        LedgerEvent::TrustUpdated {
            entity_id: entity_id.to_string(),
            dimension: dimension.map(str::to_string),
            value,
            timestamp: now(),
        }
    }

    /// Event for a proposal reaching quorum.
    pub fn quorum_reached(
        decision_id: &str,
        proposal_id: &str,
        affirmative: f64,
        threshold: usize,
    ) -> Self {
        LedgerEvent::QuorumReached {
            decision_id: decision_id.to_string(),
            proposal_id: proposal_id.to_string(),
            affirmative,
            threshold,
            timestamp: now(),
        }
    }

    /// Kind of this event.
    pub fn event_type(&self) -> EventType {
        match self {
            LedgerEvent::DecisionFinalized { .. } => EventType::DecisionFinalized,
            LedgerEvent::TrustUpdated { .. } => EventType::TrustUpdated,
            LedgerEvent::QuorumReached { .. } => EventType::QuorumReached,
        }
    }

    /// JSON payload of this event.
    pub fn payload(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Sink for lifecycle events.
#[async_trait]
pub trait EventNotifier: Send + Sync {
    /// Publish one event.
    async fn publish(&self, event: LedgerEvent) -> Result<()>;

    /// Name used in logs.
    fn name(&self) -> &str;
}

/// Discards every event.
#[derive(Clone, Debug, Default)]
pub struct NoopNotifier;

#[async_trait]
impl EventNotifier for NoopNotifier {
    async fn publish(&self, _event: LedgerEvent) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "noop"
    }
}

/// Fans events out over a tokio broadcast channel.
///
/// Publishing with no live subscriber is an error so the engine can count it.
#[derive(Clone, Debug)]
pub struct BroadcastNotifier {
    sender: broadcast::Sender<LedgerEvent>,
}

impl BroadcastNotifier {
    /// Create a channel holding up to `capacity` undelivered events.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribe to future events.
    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.sender.subscribe()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl EventNotifier for BroadcastNotifier {
    async fn publish(&self, event: LedgerEvent) -> Result<()> {
        let event_type = event.event_type();
        self.sender
            .send(event)
            .map(|_| ())
            .map_err(|_| Error::Notifier(format!("no subscribers for {}", event_type)))
    }

    fn name(&self) -> &str {
        "broadcast"
    }
}
