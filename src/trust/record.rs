//! Trust history records.

use crate::core::{now, TimeWindow, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A value recorded at a point in time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricPoint {
    /// Value in [0, 1]
    pub value: f64,
    /// Recording time
    pub timestamp: Timestamp,
}

impl MetricPoint {
    /// Record `value` now.
    pub fn now(value: f64) -> Self {
        Self {
            value,
            timestamp: now(),
        }
    }
}

/// Direction of a trust adjustment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustmentKind {
    /// Negative event
    Decay,
    /// Positive attestation
    Regeneration,
}

/// Audit entry for a decay or regeneration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrustEvent {
    /// Entity adjusted
    pub entity_id: String,
    /// Decay or regeneration
    pub kind: AdjustmentKind,
    /// Event or attestation type
    pub event_type: String,
    /// Value before the adjustment
    pub previous: f64,
    /// Signed change actually applied after clamping
    pub delta: f64,
    /// Value after the adjustment
    pub new_value: f64,
    /// Authority weight used to scale a regeneration
    pub authority_weight: Option<f64>,
    /// Whether the configured default adjustment was used
    pub defaulted: bool,
    /// Event time
    pub timestamp: Timestamp,
}

/// Context for an attestation-driven regeneration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RegenerationContext {
    /// Entity receiving the attestation
    pub entity_id: String,
    /// Weight of the attesting authority, clamped to [0, 1]
    pub authority_weight: Option<f64>,
}

impl RegenerationContext {
    /// Context for `entity_id` with no authority scaling.
    pub fn new(entity_id: &str) -> Self {
        Self {
            entity_id: entity_id.to_string(),
            authority_weight: None,
        }
    }

    /// Scale the boost by an authority weight.
    pub fn with_authority(mut self, weight: f64) -> Self {
        self.authority_weight = Some(weight);
        self
    }
}

/// All trust history held for one entity.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityTrust {
    /// Entity identifier
    pub entity_id: String,
    /// Dimension name to append-only history
    pub dimensions: BTreeMap<String, Vec<MetricPoint>>,
    /// Append-only aggregate history
    pub aggregates: Vec<MetricPoint>,
    /// Decay audit trail
    pub decay_events: Vec<TrustEvent>,
    /// Regeneration audit trail
    pub regeneration_events: Vec<TrustEvent>,
}

impl EntityTrust {
    /// Empty record for `entity_id`.
    pub fn new(entity_id: &str) -> Self {
        Self {
            entity_id: entity_id.to_string(),
            ..Default::default()
        }
    }

    /// Current value of every dimension.
    pub fn current_values(&self) -> BTreeMap<String, f64> {
        self.dimensions
            .iter()
            .filter_map(|(name, history)| history.last().map(|p| (name.clone(), p.value)))
            .collect()
    }

    /// Current value of one dimension.
    pub fn current(&self, dimension: &str) -> Option<f64> {
        self.dimensions
            .get(dimension)
            .and_then(|h| h.last())
            .map(|p| p.value)
    }

    /// Latest aggregate score.
    pub fn current_aggregate(&self) -> Option<f64> {
        self.aggregates.last().map(|p| p.value)
    }

    /// Whether the entity has any recorded state.
    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty()
            && self.aggregates.is_empty()
            && self.decay_events.is_empty()
            && self.regeneration_events.is_empty()
    }
}

/// Point-in-time view of an entity's scores.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntityMetrics {
    /// Entity identifier
    pub entity_id: String,
    /// Current dimension values
    pub dimensions: BTreeMap<String, f64>,
    /// Latest aggregate score
    pub aggregate: Option<f64>,
    /// Number of decay events
    pub decay_count: usize,
    /// Number of regeneration events
    pub regeneration_count: usize,
}

impl From<&EntityTrust> for EntityMetrics {
    fn from(entity: &EntityTrust) -> Self {
        Self {
            entity_id: entity.entity_id.clone(),
            dimensions: entity.current_values(),
            aggregate: entity.current_aggregate(),
            decay_count: entity.decay_events.len(),
            regeneration_count: entity.regeneration_events.len(),
        }
    }
}

pub(crate) fn points_in(history: &[MetricPoint], window: &TimeWindow) -> Vec<MetricPoint> {
    history
        .iter()
        .filter(|p| window.contains(&p.timestamp))
        .cloned()
        .collect()
}

pub(crate) fn events_in(history: &[TrustEvent], window: &TimeWindow) -> Vec<TrustEvent> {
    history
        .iter()
        .filter(|e| window.contains(&e.timestamp))
        .cloned()
        .collect()
}
