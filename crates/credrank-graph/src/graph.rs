//! The built, immutable Markov process graph.

use std::collections::BTreeMap;

use credrank_core::{MarkovEdge, MarkovEdgeKey, MarkovNode, NodeAddress, Participant, TimeBoundary};

/// The result of [`crate::builder::build`] (or [`crate::json::from_json`]):
/// a frozen node map, edge map, and the inputs needed to reconstruct the
/// full (real + virtual) node and edge order. Constructed once; never
/// mutated afterward. Parameters are consumed entirely during construction
/// and are not retained here — nothing downstream of a built graph needs
/// them again.
#[derive(Clone, Debug, PartialEq)]
pub struct MarkovProcessGraph {
    pub(crate) nodes: BTreeMap<NodeAddress, MarkovNode>,
    pub(crate) edges: BTreeMap<MarkovEdgeKey, MarkovEdge>,
    pub(crate) participants: Vec<Participant>,
    pub(crate) boundaries: Vec<TimeBoundary>,
}

impl MarkovProcessGraph {
    pub fn nodes(&self) -> &BTreeMap<NodeAddress, MarkovNode> {
        &self.nodes
    }

    pub fn edges(&self) -> &BTreeMap<MarkovEdgeKey, MarkovEdge> {
        &self.edges
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn boundaries(&self) -> &[TimeBoundary] {
        &self.boundaries
    }
}
