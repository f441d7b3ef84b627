//! Fault-tolerance models.

use crate::core::{Error, Resolved, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Fault-tolerance model used to size a quorum.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuorumProtocol {
    /// Byzantine fault tolerance: 2f+1 of 3f+1
    Bft,
    /// Raft: simple majority
    Raft,
    /// Paxos: simple majority
    Paxos,
    /// Fixed fraction of the network, in (0, 1]
    Custom(f64),
}

impl QuorumProtocol {
    /// Parse a protocol name, falling back to BFT when it is not recognized.
    ///
    /// Only for callers that explicitly accept the fallback; prefer
    /// [`FromStr`] which reports unknown names as errors.
    pub fn parse_or_bft(name: &str) -> Resolved<QuorumProtocol> {
        match name.parse() {
            Ok(protocol) => Resolved::Applied(protocol),
            Err(err) => Resolved::defaulted(
                QuorumProtocol::Bft,
                format!("{}; using bft", err),
            ),
        }
    }
}

impl Default for QuorumProtocol {
    fn default() -> Self {
        QuorumProtocol::Bft
    }
}

impl std::fmt::Display for QuorumProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuorumProtocol::Bft => write!(f, "bft"),
            QuorumProtocol::Raft => write!(f, "raft"),
            QuorumProtocol::Paxos => write!(f, "paxos"),
            QuorumProtocol::Custom(p) => write!(f, "custom:{}", p),
        }
    }
}

impl FromStr for QuorumProtocol {
    type Err = Error;

    /// Case-insensitive: `bft`, `raft`, `paxos`, `custom:<fraction>`.
    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "bft" | "pbft" | "byzantine" => Ok(QuorumProtocol::Bft),
            "raft" => Ok(QuorumProtocol::Raft),
            "paxos" => Ok(QuorumProtocol::Paxos),
            other => {
                let fraction = other
                    .strip_prefix("custom:")
                    .ok_or_else(|| Error::Configuration(format!("unknown quorum protocol '{}'", s)))?;
                let percentage: f64 = fraction.trim().parse().map_err(|_| {
                    Error::Configuration(format!("invalid custom quorum percentage '{}'", fraction))
                })?;
                Ok(QuorumProtocol::Custom(percentage))
            }
        }
    }
}
