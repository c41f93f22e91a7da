//! The Markov-process edge type and its deduplication key.

use serde::{Deserialize, Serialize};

use crate::address::{EdgeAddress, NodeAddress};

/// A directed, weighted edge in the Markov process graph.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkovEdge {
    pub address: EdgeAddress,
    pub reversed: bool,
    pub src: NodeAddress,
    pub dst: NodeAddress,
    pub transition_probability: f64,
}

/// `(address, reversed, src, dst)` — the composite key the graph builder
/// uses to reject duplicate edges.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MarkovEdgeKey {
    pub address: EdgeAddress,
    pub reversed: bool,
    pub src: NodeAddress,
    pub dst: NodeAddress,
}

impl MarkovEdgeKey {
    pub fn from_edge(edge: &MarkovEdge) -> Self {
        MarkovEdgeKey {
            address: edge.address.clone(),
            reversed: edge.reversed,
            src: edge.src.clone(),
            dst: edge.dst.clone(),
        }
    }
}

impl std::fmt::Display for MarkovEdgeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}[reversed={}]({} -> {})",
            self.address, self.reversed, self.src, self.dst
        )
    }
}
