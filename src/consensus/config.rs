//! Engine configuration.

use crate::consensus::tally::VoteWeighting;
use crate::core::{Error, LogConfig, Result};
use crate::quorum::QuorumProtocol;
use crate::registry::RegistryConfig;
use crate::trust::TrustConfig;
use serde::{Deserialize, Serialize};

/// Configuration for [`ConsensusEngine`](crate::consensus::ConsensusEngine).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Fault-tolerance model used to size quorums
    pub protocol: QuorumProtocol,
    /// Number of participating nodes
    pub node_count: usize,
    /// Vote counting rule
    pub weighting: VoteWeighting,
    /// Weight of a node without a trust score in trust-weighted tallies
    pub unscored_node_weight: f64,
    /// Registry settings
    pub registry: RegistryConfig,
    /// Trust ledger settings
    pub trust: TrustConfig,
    /// Logging settings
    pub log: LogConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            protocol: QuorumProtocol::Bft,
            node_count: 4,
            weighting: VoteWeighting::HeadCount,
            unscored_node_weight: 0.0,
            registry: RegistryConfig::default(),
            trust: TrustConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Configuration for `protocol` over `node_count` nodes.
    pub fn new(protocol: QuorumProtocol, node_count: usize) -> Self {
        Self {
            protocol,
            node_count,
            ..Default::default()
        }
    }

    /// Use `weighting` for tallies.
    pub fn with_weighting(mut self, weighting: VoteWeighting) -> Self {
        self.weighting = weighting;
        self
    }

    /// Use `registry` settings.
    pub fn with_registry(mut self, registry: RegistryConfig) -> Self {
        self.registry = registry;
        self
    }

    /// Use `trust` settings.
    pub fn with_trust(mut self, trust: TrustConfig) -> Self {
        self.trust = trust;
        self
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)
            .map_err(|e| Error::Configuration(format!("invalid engine config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check settings that cannot be recovered with a default.
    pub fn validate(&self) -> Result<()> {
        if self.node_count == 0 {
            return Err(Error::Configuration(
                "node_count must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.unscored_node_weight) {
            return Err(Error::Configuration(format!(
                "unscored_node_weight must be in [0, 1], got {}",
                self.unscored_node_weight
            )));
        }
        self.trust.validate()
    }
}
