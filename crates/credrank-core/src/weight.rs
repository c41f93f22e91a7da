//! The weight evaluator: reduces a weighted graph's configuration to two
//! pure functions, `node_weight` and `edge_weight`, with prefix-based
//! inheritance and no mutable state of its own.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::address::{EdgeAddress, NodeAddress};
use crate::error::CredRankError;

/// Per-address weight overrides plus crate-wide defaults, consumed only by
/// the graph builder. Prefix inheritance: the evaluator walks from the full
/// address down to the empty address, returning the most specific override
/// found, falling back to the default if no prefix matches.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightConfig {
    #[serde(default)]
    pub node_weights: BTreeMap<NodeAddress, f64>,
    #[serde(default)]
    pub edge_weights: BTreeMap<EdgeAddress, (f64, f64)>,
    #[serde(default = "default_node_weight")]
    pub default_node_weight: f64,
    #[serde(default = "default_edge_weight")]
    pub default_edge_weight: (f64, f64),
}

fn default_node_weight() -> f64 {
    0.0
}

fn default_edge_weight() -> (f64, f64) {
    (1.0, 1.0)
}

impl WeightConfig {
    /// Looks up the node weight with the longest matching prefix override,
    /// falling back to `default_node_weight`. Errors if the resolved value
    /// is negative or non-finite.
    pub fn node_weight(&self, addr: &NodeAddress) -> Result<f64, CredRankError> {
        let value = longest_prefix_match(&self.node_weights, addr).unwrap_or(self.default_node_weight);
        validate_weight(value).map_err(|value| CredRankError::InvalidNodeWeight {
            address: addr.clone(),
            value,
        })
    }

    /// Looks up the `(forward, backward)` edge weight pair with the longest
    /// matching prefix override, falling back to `default_edge_weight`.
    /// Errors if either resolved value is negative or non-finite.
    pub fn edge_weight(&self, addr: &EdgeAddress) -> Result<(f64, f64), CredRankError> {
        let (fwd, bwd) = longest_prefix_match(&self.edge_weights, addr).unwrap_or(self.default_edge_weight);
        validate_weight(fwd).map_err(|value| CredRankError::InvalidEdgeWeight {
            address: addr.clone(),
            value,
        })?;
        validate_weight(bwd).map_err(|value| CredRankError::InvalidEdgeWeight {
            address: addr.clone(),
            value,
        })?;
        Ok((fwd, bwd))
    }
}

fn validate_weight(value: f64) -> Result<f64, f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(value)
    }
}

/// Shared by both `node_weight` and `edge_weight`: walk the address from
/// its full length down to the empty prefix, returning the first override
/// found in `map`. Both `NodeAddress` and `EdgeAddress` expose `prefix`, so
/// this is written once against a small local trait rather than duplicated
/// per address flavor.
fn longest_prefix_match<A: PrefixAddress + Ord + Clone, V: Copy>(
    map: &BTreeMap<A, V>,
    addr: &A,
) -> Option<V> {
    let total_len = addr.part_count();
    for len in (0..=total_len).rev() {
        let candidate = addr.truncated(len);
        if let Some(value) = map.get(&candidate) {
            return Some(*value);
        }
    }
    None
}

/// A narrow seam so `longest_prefix_match` is written once for both address
/// flavors without exposing the private inner `Address` representation.
trait PrefixAddress {
    fn part_count(&self) -> usize;
    fn truncated(&self, len: usize) -> Self;
}

impl PrefixAddress for NodeAddress {
    fn part_count(&self) -> usize {
        self.to_parts().len()
    }
    fn truncated(&self, len: usize) -> Self {
        self.prefix(len)
    }
}

impl PrefixAddress for EdgeAddress {
    fn part_count(&self) -> usize {
        self.to_parts().len()
    }
    fn truncated(&self, len: usize) -> Self {
        self.prefix(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> WeightConfig {
        let mut node_weights = BTreeMap::new();
        node_weights.insert(NodeAddress::from_parts(["github"]).unwrap(), 2.0);
        node_weights.insert(
            NodeAddress::from_parts(["github", "repo", "1"]).unwrap(),
            5.0,
        );
        WeightConfig {
            node_weights,
            edge_weights: BTreeMap::new(),
            default_node_weight: 0.5,
            default_edge_weight: (1.0, 1.0),
        }
    }

    #[test]
    fn exact_match_wins_over_prefix() {
        let c = config();
        let addr = NodeAddress::from_parts(["github", "repo", "1"]).unwrap();
        assert_eq!(c.node_weight(&addr).unwrap(), 5.0);
    }

    #[test]
    fn prefix_match_applies_to_unlisted_descendant() {
        let c = config();
        let addr = NodeAddress::from_parts(["github", "repo", "2"]).unwrap();
        assert_eq!(c.node_weight(&addr).unwrap(), 2.0);
    }

    #[test]
    fn default_applies_when_no_prefix_matches() {
        let c = config();
        let addr = NodeAddress::from_parts(["discord", "channel", "1"]).unwrap();
        assert_eq!(c.node_weight(&addr).unwrap(), 0.5);
    }

    #[test]
    fn negative_weight_is_rejected() {
        let mut c = config();
        c.default_node_weight = -1.0;
        let addr = NodeAddress::from_parts(["discord"]).unwrap();
        let err = c.node_weight(&addr).unwrap_err();
        assert!(matches!(err, CredRankError::InvalidNodeWeight { .. }));
    }

    #[test]
    fn non_finite_weight_is_rejected() {
        let mut c = config();
        c.default_node_weight = f64::NAN;
        let addr = NodeAddress::from_parts(["discord"]).unwrap();
        let err = c.node_weight(&addr).unwrap_err();
        assert!(matches!(err, CredRankError::InvalidNodeWeight { .. }));
    }

    #[test]
    fn edge_weight_defaults_apply() {
        let c = config();
        let addr = EdgeAddress::from_parts(["github", "commit", "abc"]).unwrap();
        assert_eq!(c.edge_weight(&addr).unwrap(), (1.0, 1.0));
    }
}
