//! The seam between this crate and the surrounding plugin ecosystem that
//! produces the input weighted graph (GitHub, Discord, Discourse, etc.).
//! `credrank-graph` never depends on that ecosystem directly; callers
//! implement [`WeightedGraphSource`] over whatever representation they have.

use credrank_core::{EdgeAddress, NodeAddress, WeightConfig};

/// One edge from the input weighted graph, prior to fibration.
#[derive(Clone, Debug, PartialEq)]
pub struct InputEdge {
    pub address: EdgeAddress,
    pub src: NodeAddress,
    pub dst: NodeAddress,
    pub timestamp_ms: i64,
}

/// The minimal surface the graph builder needs from an external weighted
/// graph: its node addresses, its non-dangling edges, and a weight
/// configuration. Implementing this trait is the only integration point
/// required to adapt an arbitrary external graph representation.
pub trait WeightedGraphSource {
    /// All node addresses present in the input graph, including scoring
    /// participants' addresses (the builder filters those out itself).
    fn nodes(&self) -> Box<dyn Iterator<Item = NodeAddress> + '_>;

    /// Non-dangling edges only; callers are responsible for filtering out
    /// edges referencing nodes absent from [`Self::nodes`].
    fn edges(&self) -> Box<dyn Iterator<Item = InputEdge> + '_>;

    /// The weight configuration consulted by the weight evaluator.
    fn weights(&self) -> &WeightConfig;
}

/// A simple in-memory [`WeightedGraphSource`], useful for tests and the
/// demonstration CLI's fixture loader.
#[derive(Clone, Debug, Default)]
pub struct InMemoryGraphSource {
    pub node_addresses: Vec<NodeAddress>,
    pub input_edges: Vec<InputEdge>,
    pub weights: WeightConfig,
}

impl WeightedGraphSource for InMemoryGraphSource {
    fn nodes(&self) -> Box<dyn Iterator<Item = NodeAddress> + '_> {
        Box::new(self.node_addresses.iter().cloned())
    }

    fn edges(&self) -> Box<dyn Iterator<Item = InputEdge> + '_> {
        Box::new(self.input_edges.iter().cloned())
    }

    fn weights(&self) -> &WeightConfig {
        &self.weights
    }
}
