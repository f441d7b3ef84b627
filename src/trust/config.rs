//! Trust ledger configuration.

use crate::core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Rule combining dimension values into an aggregate score.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationRule {
    /// Arithmetic mean of current dimension values
    Mean,
    /// Mean weighted by `TrustConfig::dimension_weights` (missing weight = 1.0)
    WeightedMean,
    /// Lowest current dimension value
    Minimum,
}

/// Trust ledger configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TrustConfig {
    /// Aggregation rule
    pub aggregation: AggregationRule,
    /// Per-dimension weights for `WeightedMean`
    pub dimension_weights: HashMap<String, f64>,
    /// Severity subtracted per negative event type
    pub decay_severity: HashMap<String, f64>,
    /// Severity for event types missing from the table
    pub default_decay_severity: f64,
    /// Boost added per attestation type
    pub regeneration_boost: HashMap<String, f64>,
    /// Boost for attestation types missing from the table
    pub default_regeneration_boost: f64,
    /// Upper bound on a single regeneration step
    pub max_regeneration: f64,
}

impl Default for TrustConfig {
    fn default() -> Self {
        let decay_severity = [
            ("timeout", 0.02),
            ("missed_vote", 0.05),
            ("invalid_vote", 0.15),
            ("equivocation", 0.4),
            ("byzantine_behavior", 0.5),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        let regeneration_boost = [
            ("successful_vote", 0.02),
            ("peer_attestation", 0.05),
            ("audit_passed", 0.08),
            ("authority_attestation", 0.1),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        Self {
            aggregation: AggregationRule::Mean,
            dimension_weights: HashMap::new(),
            decay_severity,
            default_decay_severity: 0.1,
            regeneration_boost,
            default_regeneration_boost: 0.02,
            max_regeneration: 0.2,
        }
    }
}

impl TrustConfig {
    /// Switch to weighted aggregation with the given weights.
    pub fn weighted(mut self, weights: &[(&str, f64)]) -> Self {
        self.aggregation = AggregationRule::WeightedMean;
        self.dimension_weights = weights.iter().map(|(k, v)| (k.to_string(), *v)).collect();
        self
    }

    /// Reject negative or non-finite adjustments and weights.
    pub fn validate(&self) -> Result<()> {
        let check = |name: &str, v: f64| {
            if v.is_finite() && v >= 0.0 {
                Ok(())
            } else {
                Err(Error::Configuration(format!(
                    "trust setting {} must be a finite non-negative number, got {}",
                    name, v
                )))
            }
        };

        for (k, v) in &self.dimension_weights {
            check(&format!("dimension_weights.{}", k), *v)?;
        }
        for (k, v) in &self.decay_severity {
            check(&format!("decay_severity.{}", k), *v)?;
        }
        for (k, v) in &self.regeneration_boost {
            check(&format!("regeneration_boost.{}", k), *v)?;
        }
        check("default_decay_severity", self.default_decay_severity)?;
        check("default_regeneration_boost", self.default_regeneration_boost)?;
        check("max_regeneration", self.max_regeneration)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = TrustConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.aggregation, AggregationRule::Mean);
        assert!(config.decay_severity.contains_key("equivocation"));
    }

    #[test]
    fn test_weighted_builder() {
        let config = TrustConfig::default().weighted(&[("uptime", 2.0), ("accuracy", 1.0)]);
        assert_eq!(config.aggregation, AggregationRule::WeightedMean);
        assert_eq!(config.dimension_weights["uptime"], 2.0);
    }

    #[test]
    fn test_negative_severity_rejected() {
        let mut config = TrustConfig::default();
        config.decay_severity.insert("bad".into(), -0.1);
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_config_json() {
        let config = TrustConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: TrustConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.max_regeneration, config.max_regeneration);
        assert!(json.contains("\"mean\""));
    }
}
