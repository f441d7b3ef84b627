//! Event Notification
//!
//! Optional sink for lifecycle events (`decision_finalized`,
//! `trust_updated`, `quorum_reached`) with no delivery guarantees.

pub mod notifier;

pub use notifier::{BroadcastNotifier, EventNotifier, EventType, LedgerEvent, NoopNotifier};
