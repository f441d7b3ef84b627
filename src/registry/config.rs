//! Registry configuration.

use serde::{Deserialize, Serialize};

/// What happens when a node votes twice on the same proposal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VotePolicy {
    /// The later vote replaces the earlier one
    #[default]
    Mutable,
    /// The second vote is rejected
    Final,
}

/// Decision registry configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Repeated-vote handling
    pub vote_policy: VotePolicy,
    /// Top-level fields every decision payload must carry
    pub required_fields: Vec<String>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            vote_policy: VotePolicy::Mutable,
            required_fields: vec![
                "type".to_string(),
                "content".to_string(),
                "metadata".to_string(),
            ],
        }
    }
}

impl RegistryConfig {
    /// Use `policy` for repeated votes.
    pub fn with_vote_policy(mut self, policy: VotePolicy) -> Self {
        self.vote_policy = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RegistryConfig::default();
        assert_eq!(config.vote_policy, VotePolicy::Mutable);
        assert_eq!(config.required_fields, vec!["type", "content", "metadata"]);
    }

    #[test]
    fn test_partial_json() {
        let config: RegistryConfig = serde_json::from_str(r#"{"vote_policy":"final"}"#).unwrap();
        assert_eq!(config.vote_policy, VotePolicy::Final);
        assert_eq!(config.required_fields.len(), 3);
    }
}
