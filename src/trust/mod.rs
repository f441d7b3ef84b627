//! Trust Ledger
//!
//! Per-entity reliability scoring:
//! - Named trust dimensions clamped to [0, 1] with append-only history
//! - Configurable aggregation into a single score
//! - Event-driven decay and attestation-driven regeneration with audit trail

pub mod config;
pub mod ledger;
pub mod record;
pub mod repository;

pub use config::{AggregationRule, TrustConfig};
pub use ledger::TrustLedger;
pub use record::{
    AdjustmentKind, EntityMetrics, EntityTrust, MetricPoint, RegenerationContext, TrustEvent,
};
pub use repository::{EntityRepository, InMemoryEntityRepository};
