//! Per-entity trust scoring.
//!
//! Every stored value is clamped to `[0, 1]`. Decay never raises a value and
//! regeneration never lowers one.

use crate::core::sync::lock;
use crate::core::{now, Error, Resolved, Result, TimeWindow};
use crate::trust::config::{AggregationRule, TrustConfig};
use crate::trust::record::{
    events_in, points_in, AdjustmentKind, EntityMetrics, EntityTrust, MetricPoint,
    RegenerationContext, TrustEvent,
};
use crate::trust::repository::{EntityRepository, InMemoryEntityRepository};
use std::sync::Arc;
use tracing::{debug, info};

fn ensure_number(value: f64, what: &str) -> Result<()> {
    if value.is_nan() {
        return Err(Error::Validation(format!("{} must be a number, got NaN", what)));
    }
    Ok(())
}

fn clamp_unit(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

/// Trust ledger.
pub struct TrustLedger {
    config: TrustConfig,
    repository: Arc<dyn EntityRepository>,
}

impl TrustLedger {
    /// Create a ledger backed by an in-memory repository.
    pub fn new(config: TrustConfig) -> Result<Self> {
        Self::with_repository(config, Arc::new(InMemoryEntityRepository::new()))
    }

    /// Create a ledger over an existing repository.
    pub fn with_repository(
        config: TrustConfig,
        repository: Arc<dyn EntityRepository>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, repository })
    }

    /// Restore a ledger from exported records.
    pub fn from_entities(config: TrustConfig, entities: Vec<EntityTrust>) -> Result<Self> {
        Self::with_repository(
            config,
            Arc::new(InMemoryEntityRepository::from_records(entities)),
        )
    }

    /// Configuration in use.
    pub fn config(&self) -> &TrustConfig {
        &self.config
    }

    /// Record a dimension value, clamped to `[0, 1]`. Returns the stored value.
    pub fn update_dimension_metric(
        &self,
        entity_id: &str,
        dimension: &str,
        value: f64,
    ) -> Result<f64> {
        ensure_number(value, "dimension value")?;
        let stored = clamp_unit(value);
        if stored != value {
            debug!(entity_id, dimension, value, stored, "dimension value clamped");
        }

        let slot = self.repository.entity_or_create(entity_id);
        lock(&slot)
            .dimensions
            .entry(dimension.to_string())
            .or_default()
            .push(MetricPoint::now(stored));

        debug!(entity_id, dimension, value = stored, "dimension updated");
        Ok(stored)
    }

    /// Combine the current dimension values into an aggregate and record it.
    pub fn calculate_aggregate_metric(&self, entity_id: &str) -> Result<f64> {
        let slot = self
            .repository
            .entity(entity_id)
            .ok_or_else(|| Error::EntityNotFound(entity_id.to_string()))?;
        let mut entity = lock(&slot);

        let values = entity.current_values();
        if values.is_empty() {
            return Err(Error::EntityNotFound(format!(
                "{} has no trust dimensions",
                entity_id
            )));
        }

        let aggregate = clamp_unit(self.combine(&values).into_value());
        entity.aggregates.push(MetricPoint::now(aggregate));
        info!(entity_id, aggregate, dimensions = values.len(), "aggregate trust recorded");
        Ok(aggregate)
    }

    fn combine(&self, values: &std::collections::BTreeMap<String, f64>) -> Resolved<f64> {
        let mean = values.values().sum::<f64>() / values.len() as f64;
        match self.config.aggregation {
            AggregationRule::Mean => Resolved::Applied(mean),
            AggregationRule::Minimum => {
                Resolved::Applied(values.values().cloned().fold(1.0, f64::min))
            }
            AggregationRule::WeightedMean => {
                let mut total_weight = 0.0;
                let mut weighted = 0.0;
                for (name, value) in values {
                    let weight = self
                        .config
                        .dimension_weights
                        .get(name)
                        .copied()
                        .unwrap_or(1.0)
                        .max(0.0);
                    total_weight += weight;
                    weighted += weight * value;
                }
                let combined = weighted / total_weight;
                if total_weight <= 0.0 {
                    Resolved::defaulted(mean, "all dimension weights are zero; using mean")
                } else if !combined.is_finite() {
                    Resolved::defaulted(mean, "dimension weights overflow; using mean")
                } else {
                    Resolved::Applied(combined)
                }
            }
        }
    }

    fn decay_severity(&self, event_type: &str) -> Resolved<f64> {
        match self.config.decay_severity.get(event_type) {
            Some(severity) => Resolved::Applied(severity.max(0.0)),
            None => Resolved::defaulted(
                self.config.default_decay_severity.max(0.0),
                format!("unknown decay event '{}'; using default severity", event_type),
            ),
        }
    }

    fn regeneration_boost(&self, regeneration_type: &str, authority: Option<f64>) -> Resolved<f64> {
        let base = match self.config.regeneration_boost.get(regeneration_type) {
            Some(boost) => Resolved::Applied(*boost),
            None => Resolved::defaulted(
                self.config.default_regeneration_boost,
                format!(
                    "unknown attestation '{}'; using default boost",
                    regeneration_type
                ),
            ),
        };
        let scale = authority.map(clamp_unit).unwrap_or(1.0);
        let cap = self.config.max_regeneration.max(0.0);
        base.map(|b| (b.max(0.0) * scale).min(cap))
    }

    /// Lower `current_value` by the severity configured for `event_type`.
    ///
    /// The decay is recorded against `entity_id`; writing the new value back
    /// is left to the caller (see [`apply_decay_to_dimension`](Self::apply_decay_to_dimension)
    /// for the atomic variant).
    pub fn apply_event_decay(
        &self,
        current_value: f64,
        event_type: &str,
        entity_id: &str,
    ) -> Result<Resolved<f64>> {
        ensure_number(current_value, "current trust value")?;
        let slot = self.repository.entity_or_create(entity_id);
        let mut entity = lock(&slot);
        Ok(self.record_decay(&mut entity, current_value, event_type))
    }

    fn record_decay(&self, entity: &mut EntityTrust, current: f64, event_type: &str) -> Resolved<f64> {
        let previous = clamp_unit(current);
        let severity = self.decay_severity(event_type);
        let defaulted = severity.is_defaulted();
        let adjusted = severity.map(|s| clamp_unit(previous - s));
        let new_value = adjusted.get();

        entity.decay_events.push(TrustEvent {
            entity_id: entity.entity_id.clone(),
            kind: AdjustmentKind::Decay,
            event_type: event_type.to_string(),
            previous,
            delta: new_value - previous,
            new_value,
            authority_weight: None,
            defaulted,
            timestamp: now(),
        });
        info!(entity_id = %entity.entity_id, event_type, previous, new_value, "trust decayed");
        adjusted
    }

    /// Raise `current_value` by the boost configured for `regeneration_type`,
    /// scaled by the context's authority weight.
    pub fn apply_attestation_regeneration(
        &self,
        current_value: f64,
        regeneration_type: &str,
        context: &RegenerationContext,
    ) -> Result<Resolved<f64>> {
        ensure_number(current_value, "current trust value")?;
        if let Some(weight) = context.authority_weight {
            ensure_number(weight, "authority weight")?;
        }
        let slot = self.repository.entity_or_create(&context.entity_id);
        let mut entity = lock(&slot);
        Ok(self.record_regeneration(
            &mut entity,
            current_value,
            regeneration_type,
            context.authority_weight,
        ))
    }

    fn record_regeneration(
        &self,
        entity: &mut EntityTrust,
        current: f64,
        regeneration_type: &str,
        authority: Option<f64>,
    ) -> Resolved<f64> {
        let previous = clamp_unit(current);
        let boost = self.regeneration_boost(regeneration_type, authority);
        let defaulted = boost.is_defaulted();
        let adjusted = boost.map(|b| clamp_unit(previous + b));
        let new_value = adjusted.get();

        entity.regeneration_events.push(TrustEvent {
            entity_id: entity.entity_id.clone(),
            kind: AdjustmentKind::Regeneration,
            event_type: regeneration_type.to_string(),
            previous,
            delta: new_value - previous,
            new_value,
            authority_weight: authority.map(clamp_unit),
            defaulted,
            timestamp: now(),
        });
        info!(entity_id = %entity.entity_id, regeneration_type, previous, new_value, "trust regenerated");
        adjusted
    }

    /// Decay a stored dimension and write the result back under one lock.
    pub fn apply_decay_to_dimension(
        &self,
        entity_id: &str,
        dimension: &str,
        event_type: &str,
    ) -> Result<Resolved<f64>> {
        let slot = self
            .repository
            .entity(entity_id)
            .ok_or_else(|| Error::EntityNotFound(entity_id.to_string()))?;
        let mut entity = lock(&slot);
        let current = entity
            .current(dimension)
            .ok_or_else(|| Error::EntityNotFound(format!("{}/{}", entity_id, dimension)))?;

        let adjusted = self.record_decay(&mut entity, current, event_type);
        entity
            .dimensions
            .entry(dimension.to_string())
            .or_default()
            .push(MetricPoint::now(adjusted.get()));
        Ok(adjusted)
    }

    /// Regenerate a stored dimension and write the result back under one lock.
    pub fn regenerate_dimension(
        &self,
        entity_id: &str,
        dimension: &str,
        regeneration_type: &str,
        authority_weight: Option<f64>,
    ) -> Result<Resolved<f64>> {
        if let Some(weight) = authority_weight {
            ensure_number(weight, "authority weight")?;
        }
        let slot = self
            .repository
            .entity(entity_id)
            .ok_or_else(|| Error::EntityNotFound(entity_id.to_string()))?;
        let mut entity = lock(&slot);
        let current = entity
            .current(dimension)
            .ok_or_else(|| Error::EntityNotFound(format!("{}/{}", entity_id, dimension)))?;

        let adjusted =
            self.record_regeneration(&mut entity, current, regeneration_type, authority_weight);
        entity
            .dimensions
            .entry(dimension.to_string())
            .or_default()
            .push(MetricPoint::now(adjusted.get()));
        Ok(adjusted)
    }

    fn read<T>(&self, entity_id: &str, f: impl FnOnce(&EntityTrust) -> T) -> Result<T> {
        let slot = self
            .repository
            .entity(entity_id)
            .ok_or_else(|| Error::EntityNotFound(entity_id.to_string()))?;
        let entity = lock(&slot);
        Ok(f(&entity))
    }

    /// Current scores of an entity.
    pub fn get_entity_metrics(&self, entity_id: &str) -> Result<EntityMetrics> {
        self.read(entity_id, |e| EntityMetrics::from(e))
    }

    /// History of one dimension inside `window`.
    pub fn get_dimension_history(
        &self,
        entity_id: &str,
        dimension: &str,
        window: &TimeWindow,
    ) -> Result<Vec<MetricPoint>> {
        self.read(entity_id, |e| {
            e.dimensions
                .get(dimension)
                .map(|h| points_in(h, window))
                .unwrap_or_default()
        })
    }

    /// Aggregate history inside `window`.
    pub fn get_aggregate_history(
        &self,
        entity_id: &str,
        window: &TimeWindow,
    ) -> Result<Vec<MetricPoint>> {
        self.read(entity_id, |e| points_in(&e.aggregates, window))
    }

    /// Decay audit trail inside `window`.
    pub fn get_decay_history(&self, entity_id: &str, window: &TimeWindow) -> Result<Vec<TrustEvent>> {
        self.read(entity_id, |e| events_in(&e.decay_events, window))
    }

    /// Regeneration audit trail inside `window`.
    pub fn get_regeneration_history(
        &self,
        entity_id: &str,
        window: &TimeWindow,
    ) -> Result<Vec<TrustEvent>> {
        self.read(entity_id, |e| events_in(&e.regeneration_events, window))
    }

    /// Latest aggregate score, if one was ever calculated.
    pub fn current_aggregate(&self, entity_id: &str) -> Option<f64> {
        match self.read(entity_id, EntityTrust::current_aggregate) {
            Ok(aggregate) => aggregate,
            Err(_) => {
                debug!(entity_id, "no trust record for entity");
                None
            }
        }
    }

    /// Known entities.
    pub fn entity_ids(&self) -> Vec<String> {
        self.repository.entity_ids()
    }

    /// Export every entity record.
    pub fn snapshot(&self) -> Vec<EntityTrust> {
        self.repository.snapshot()
    }
}

impl Default for TrustLedger {
    fn default() -> Self {
        Self {
            config: TrustConfig::default(),
            repository: Arc::new(InMemoryEntityRepository::new()),
        }
    }
}
