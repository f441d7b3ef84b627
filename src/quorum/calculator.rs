//! Quorum threshold arithmetic.
//!
//! Every threshold satisfies `1 <= threshold <= node_count`. Inputs that
//! cannot be honored (too many Byzantine faults for the network size, a
//! percentage outside `(0, 1]`) degrade to a documented default and come
//! back as [`Resolved::Defaulted`].

use crate::core::{Error, Resolved, Result};
use crate::quorum::protocol::QuorumProtocol;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Percentage used when a custom percentage is out of range.
pub const DEFAULT_CUSTOM_PERCENTAGE: f64 = 0.5;

fn ensure_nodes(node_count: usize) -> Result<()> {
    if node_count == 0 {
        return Err(Error::Configuration(
            "quorum requires at least one node".to_string(),
        ));
    }
    Ok(())
}

/// Largest `f` with `node_count >= 3f + 1`.
pub fn max_byzantine_faults(node_count: usize) -> usize {
    node_count.saturating_sub(1) / 3
}

/// BFT quorum `2f + 1`.
///
/// `f` defaults to the maximum the network supports; a requested `f` the
/// network cannot tolerate is lowered to that maximum.
pub fn calculate_bft_quorum(
    node_count: usize,
    max_byzantine_nodes: Option<usize>,
) -> Result<Resolved<usize>> {
    ensure_nodes(node_count)?;
    let supported = max_byzantine_faults(node_count);

    let f = match max_byzantine_nodes {
        None => Resolved::Applied(supported),
        Some(f)
            if f.checked_mul(3)
                .and_then(|v| v.checked_add(1))
                .map_or(false, |min| node_count >= min) =>
        {
            Resolved::Applied(f)
        }
        Some(f) => Resolved::defaulted(
            supported,
            format!(
                "{} nodes cannot tolerate {} byzantine faults; using f={}",
                node_count, f, supported
            ),
        ),
    };

    let threshold = f.map(|f| 2 * f + 1);
    debug!(node_count, threshold = threshold.get(), "bft quorum");
    Ok(threshold)
}

/// Raft quorum: simple majority.
pub fn calculate_raft_quorum(node_count: usize) -> Result<usize> {
    ensure_nodes(node_count)?;
    Ok(node_count / 2 + 1)
}

/// Paxos quorum: simple majority.
pub fn calculate_paxos_quorum(node_count: usize) -> Result<usize> {
    ensure_nodes(node_count)?;
    Ok(node_count / 2 + 1)
}

/// Custom quorum `ceil(node_count * percentage)`.
///
/// A percentage outside `(0, 1]` falls back to [`DEFAULT_CUSTOM_PERCENTAGE`].
pub fn calculate_custom_quorum(node_count: usize, percentage: f64) -> Result<Resolved<usize>> {
    ensure_nodes(node_count)?;

    let pct = if percentage > 0.0 && percentage <= 1.0 {
        Resolved::Applied(percentage)
    } else {
        Resolved::defaulted(
            DEFAULT_CUSTOM_PERCENTAGE,
            format!(
                "quorum percentage {} outside (0, 1]; using {}",
                percentage, DEFAULT_CUSTOM_PERCENTAGE
            ),
        )
    };

    Ok(pct.map(|p| {
        // Absorb float noise such as 10 * 0.7 = 7.000000000000001
        let raw = (node_count as f64 * p - 1e-9).ceil() as usize;
        raw.clamp(1, node_count)
    }))
}

/// Dispatch on the protocol.
pub fn calculate_quorum(protocol: &QuorumProtocol, node_count: usize) -> Result<Resolved<usize>> {
    match protocol {
        QuorumProtocol::Bft => calculate_bft_quorum(node_count, None),
        QuorumProtocol::Raft => calculate_raft_quorum(node_count).map(Resolved::Applied),
        QuorumProtocol::Paxos => calculate_paxos_quorum(node_count).map(Resolved::Applied),
        QuorumProtocol::Custom(p) => calculate_custom_quorum(node_count, *p),
    }
}

/// Whether `size` agreeing nodes form a sufficient quorum.
pub fn validate_quorum_size(size: usize, node_count: usize, protocol: &QuorumProtocol) -> bool {
    if size == 0 || size > node_count {
        return false;
    }
    let minimum = match protocol {
        QuorumProtocol::Bft => 2 * max_byzantine_faults(node_count) + 1,
        QuorumProtocol::Raft | QuorumProtocol::Paxos => node_count / 2 + 1,
        QuorumProtocol::Custom(p) => match calculate_custom_quorum(node_count, *p) {
            Ok(threshold) => threshold.get(),
            Err(_) => return false,
        },
    };
    size >= minimum
}

/// Byzantine fault tolerance information.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByzantineTolerance {
    pub total_nodes: usize,
    pub max_faulty_tolerated: usize,
    pub honest_required: usize,
    pub is_secure: bool,
}

/// Tolerance of a network of `node_count` nodes (n >= 3f + 1).
pub fn byzantine_tolerance(node_count: usize) -> ByzantineTolerance {
    let max_faulty = max_byzantine_faults(node_count);
    ByzantineTolerance {
        total_nodes: node_count,
        max_faulty_tolerated: max_faulty,
        honest_required: node_count - max_faulty,
        is_secure: node_count >= 4, // Need at least 4 nodes for any tolerance
    }
}

/// A resolved quorum requirement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuorumSpec {
    /// Fault-tolerance model
    pub protocol: QuorumProtocol,
    /// Network size
    pub node_count: usize,
    /// Minimum agreement required
    pub resolved_threshold: usize,
}

impl QuorumSpec {
    /// Resolve the threshold for `protocol` over `node_count` nodes.
    pub fn resolve(protocol: QuorumProtocol, node_count: usize) -> Result<Resolved<QuorumSpec>> {
        let threshold = calculate_quorum(&protocol, node_count)?;
        Ok(threshold.map(|resolved_threshold| QuorumSpec {
            protocol,
            node_count,
            resolved_threshold,
        }))
    }

    /// Whether an affirmative total (head count or trust-weighted) is enough.
    pub fn is_met(&self, affirmative: f64) -> bool {
        affirmative + f64::EPSILON >= self.resolved_threshold as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raft_and_paxos_majority() {
        for n in 1..=100 {
            assert_eq!(calculate_raft_quorum(n).unwrap(), n / 2 + 1);
            assert_eq!(calculate_paxos_quorum(n).unwrap(), n / 2 + 1);
        }
        assert_eq!(calculate_raft_quorum(3).unwrap(), 2);
        assert_eq!(calculate_raft_quorum(4).unwrap(), 3);
    }

    #[test]
    fn test_bft_bounds_for_all_sizes() {
        for n in 1..=100 {
            let q = calculate_bft_quorum(n, None).unwrap();
            assert!(!q.is_defaulted());
            let q = q.get();
            assert!(q >= 1 && q <= n);
            assert!(3 * ((q - 1) / 2) + 1 <= n, "n={} q={}", n, q);
        }
    }

    #[test]
    fn test_bft_known_values() {
        assert_eq!(calculate_bft_quorum(4, None).unwrap().get(), 3);
        assert_eq!(calculate_bft_quorum(7, None).unwrap().get(), 5);
        assert_eq!(calculate_bft_quorum(10, Some(2)).unwrap().get(), 5);
        assert_eq!(calculate_bft_quorum(1, None).unwrap().get(), 1);
    }

    #[test]
    fn test_bft_degrades_unsupported_fault_count() {
        let q = calculate_bft_quorum(4, Some(3)).unwrap();
        assert!(q.is_defaulted());
        assert_eq!(q.get(), 3);
    }

    #[test]
    fn test_bft_huge_fault_count_degrades() {
        for f in [usize::MAX / 2, usize::MAX / 3, usize::MAX] {
            let q = calculate_bft_quorum(4, Some(f)).unwrap();
            assert!(q.is_defaulted());
            assert_eq!(q.get(), 3);
        }
    }

    #[test]
    fn test_custom_quorum() {
        assert_eq!(calculate_custom_quorum(10, 0.7).unwrap().get(), 7);
        assert_eq!(calculate_custom_quorum(3, 0.67).unwrap().get(), 3);
        assert_eq!(calculate_custom_quorum(3, 1.0).unwrap().get(), 3);
        assert_eq!(calculate_custom_quorum(5, 0.01).unwrap().get(), 1);
    }

    #[test]
    fn test_custom_out_of_range_falls_back() {
        for bad in [0.0, -0.3, 1.5, f64::NAN] {
            let q = calculate_custom_quorum(10, bad).unwrap();
            assert!(q.is_defaulted());
            assert_eq!(q.get(), 5);
        }
    }

    #[test]
    fn test_zero_nodes_is_configuration_error() {
        assert!(matches!(calculate_raft_quorum(0), Err(Error::Configuration(_))));
        assert!(calculate_quorum(&QuorumProtocol::Bft, 0).is_err());
    }

    #[test]
    fn test_dispatch() {
        assert_eq!(calculate_quorum(&QuorumProtocol::Raft, 3).unwrap().get(), 2);
        assert_eq!(calculate_quorum(&QuorumProtocol::Bft, 4).unwrap().get(), 3);
        assert_eq!(
            calculate_quorum(&QuorumProtocol::Custom(0.8), 5).unwrap().get(),
            4
        );
    }

    #[test]
    fn test_validate_rejects_out_of_bounds() {
        for protocol in [
            QuorumProtocol::Bft,
            QuorumProtocol::Raft,
            QuorumProtocol::Paxos,
            QuorumProtocol::Custom(0.5),
        ] {
            for n in 1..=20 {
                assert!(!validate_quorum_size(0, n, &protocol));
                assert!(!validate_quorum_size(n + 1, n, &protocol));
                assert!(validate_quorum_size(n, n, &protocol));
            }
        }
    }

    #[test]
    fn test_validate_minimums() {
        assert!(!validate_quorum_size(2, 4, &QuorumProtocol::Bft));
        assert!(validate_quorum_size(3, 4, &QuorumProtocol::Bft));
        assert!(!validate_quorum_size(2, 4, &QuorumProtocol::Raft));
        assert!(validate_quorum_size(3, 5, &QuorumProtocol::Paxos));
        assert!(!validate_quorum_size(6, 10, &QuorumProtocol::Custom(0.7)));
    }

    #[test]
    fn test_byzantine_tolerance() {
        let t = byzantine_tolerance(4);
        assert_eq!(t.max_faulty_tolerated, 1);
        assert_eq!(t.honest_required, 3);
        assert!(t.is_secure);
        assert!(!byzantine_tolerance(3).is_secure);
    }

    #[test]
    fn test_quorum_spec() {
        let spec = QuorumSpec::resolve(QuorumProtocol::Raft, 3).unwrap().into_value();
        assert_eq!(spec.resolved_threshold, 2);
        assert!(spec.is_met(2.0));
        assert!(!spec.is_met(1.9));

        let spec = QuorumSpec::resolve(QuorumProtocol::Custom(2.0), 4).unwrap();
        assert!(spec.is_defaulted());
        assert_eq!(spec.value().resolved_threshold, 2);
    }
}
