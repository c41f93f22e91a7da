//! The chain view: an immutable window over a built [`MarkovProcessGraph`]
//! exposing deterministic node/edge iteration, in-neighbor lookup, and a
//! compact sparse export.

use std::collections::BTreeMap;

use credrank_core::{
    gadget::parse_epoch_accumulator, CredRankError, MarkovEdge, MarkovEdgeKey, MarkovNode,
    NodeAddress, NodeGadget,
};

use crate::graph::MarkovProcessGraph;

/// The compact sparse export: node order plus, per node, its
/// in-edges as `(source index, transition probability)` pairs.
#[derive(Clone, Debug, PartialEq)]
pub struct SparseMarkovChain {
    pub node_order: Vec<NodeAddress>,
    pub in_edges: Vec<Vec<(usize, f64)>>,
}

/// Immutable view over a built graph. Owns the graph by value — cheap to
/// hold since `MarkovProcessGraph` already owns its maps — plus the
/// precomputed node order, edge order, and in-neighbor reverse index.
#[derive(Clone, Debug)]
pub struct ChainView {
    graph: MarkovProcessGraph,
    node_order: Vec<NodeAddress>,
    edge_order: Vec<MarkovEdgeKey>,
    in_neighbor_index: BTreeMap<NodeAddress, Vec<MarkovEdgeKey>>,
}

impl ChainView {
    /// Builds the view's node order, edge order, and reverse index once
    /// from the built graph. The reverse index turns [`Self::in_neighbors`]
    /// from an O(E) scan per call into an O(E) one-time cost plus O(1)
    /// lookups thereafter.
    pub fn new(graph: MarkovProcessGraph) -> Self {
        let mut node_order: Vec<NodeAddress> = graph.nodes().keys().cloned().collect();
        node_order.push(NodeGadget::Seed.to_raw());
        for &boundary in graph.boundaries() {
            node_order.push(NodeGadget::EpochAccumulator { epoch_start: boundary }.to_raw());
        }

        let edge_order: Vec<MarkovEdgeKey> = graph.edges().keys().cloned().collect();

        let mut in_neighbor_index: BTreeMap<NodeAddress, Vec<MarkovEdgeKey>> = BTreeMap::new();
        for key in &edge_order {
            in_neighbor_index
                .entry(key.dst.clone())
                .or_default()
                .push(key.clone());
        }

        ChainView {
            graph,
            node_order,
            edge_order,
            in_neighbor_index,
        }
    }

    /// The underlying built graph.
    pub fn graph(&self) -> &MarkovProcessGraph {
        &self.graph
    }

    /// Stable node order: real nodes sorted by address, then seed, then
    /// accumulators in boundary order.
    pub fn node_order(&self) -> &[NodeAddress] {
        &self.node_order
    }

    /// Stable, sorted order of Markov edge keys.
    pub fn edge_order(&self) -> &[MarkovEdgeKey] {
        &self.edge_order
    }

    /// Returns the stored node, or synthesizes the virtual seed/accumulator
    /// node on demand, or `None` if `addr` is not part of this chain.
    pub fn node(&self, addr: &NodeAddress) -> Option<MarkovNode> {
        if let Some(node) = self.graph.nodes().get(addr) {
            return Some(node.clone());
        }
        let seed_addr = NodeGadget::Seed.to_raw();
        if *addr == seed_addr {
            return Some(NodeGadget::Seed.materialize());
        }
        if let Ok(epoch_start) = parse_epoch_accumulator(addr) {
            if self.graph.boundaries().contains(&epoch_start) {
                return Some(NodeGadget::EpochAccumulator { epoch_start }.materialize());
            }
        }
        None
    }

    /// Lazy iteration in node order, filtered by `prefix` when given. No
    /// intermediate `Vec` is materialized; a single consumer pays only for
    /// the nodes it actually visits.
    pub fn nodes(&self, prefix: Option<&NodeAddress>) -> impl Iterator<Item = MarkovNode> + '_ {
        let prefix = prefix.cloned();
        self.node_order
            .iter()
            .filter(move |addr| prefix.as_ref().map_or(true, |p| addr.has_prefix(p)))
            .map(move |addr| {
                self.node(addr)
                    .expect("node_order only contains addresses this view can resolve")
            })
    }

    /// Returns the edge at `key`, if present.
    pub fn edge(&self, key: &MarkovEdgeKey) -> Option<MarkovEdge> {
        self.graph.edges().get(key).cloned()
    }

    /// Lazy iteration in edge order.
    pub fn edges(&self) -> impl Iterator<Item = MarkovEdge> + '_ {
        self.edge_order.iter().map(move |key| {
            self.edge(key)
                .expect("edge_order only contains keys present in the edge map")
        })
    }

    /// Lazy iteration over edges with `dst = addr`, backed by the
    /// precomputed reverse index.
    pub fn in_neighbors(&self, addr: &NodeAddress) -> impl Iterator<Item = MarkovEdge> + '_ {
        self.in_neighbor_index
            .get(addr)
            .into_iter()
            .flatten()
            .map(move |key| {
                self.edge(key)
                    .expect("in_neighbor_index only contains keys present in the edge map")
            })
    }

    /// The out-mass of every node that has at least one outgoing edge,
    /// summed once over the full edge set.
    fn out_mass(&self) -> BTreeMap<NodeAddress, f64> {
        let mut mass: BTreeMap<NodeAddress, f64> = BTreeMap::new();
        for edge in self.graph.edges().values() {
            *mass.entry(edge.src.clone()).or_insert(0.0) += edge.transition_probability;
        }
        mass
    }

    /// Verifies the core invariant: every node's out-transitions sum to 1
    /// within `1e-3`. Returns the offending address on violation.
    pub fn verify_transition_mass(&self) -> Result<(), CredRankError> {
        const TOLERANCE: f64 = 1e-3;
        let mass = self.out_mass();
        for addr in &self.node_order {
            let total = mass.get(addr).copied().unwrap_or(0.0);
            if (total - 1.0).abs() > TOLERANCE {
                return Err(CredRankError::SumCheckViolation {
                    address: addr.clone(),
                    total,
                });
            }
        }
        Ok(())
    }

    /// Produces the compact sparse export, verifying invariant 1 first.
    pub fn to_sparse_chain(&self) -> Result<SparseMarkovChain, CredRankError> {
        self.verify_transition_mass()?;

        let index_of: BTreeMap<&NodeAddress, usize> = self
            .node_order
            .iter()
            .enumerate()
            .map(|(i, addr)| (addr, i))
            .collect();

        let mut in_edges: Vec<Vec<(usize, f64)>> = vec![Vec::new(); self.node_order.len()];
        for edge in self.graph.edges().values() {
            let src_idx = index_of[&edge.src];
            let dst_idx = index_of[&edge.dst];
            in_edges[dst_idx].push((src_idx, edge.transition_probability));
        }

        Ok(SparseMarkovChain {
            node_order: self.node_order.clone(),
            in_edges,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{build, BuildArgs};
    use crate::source::InMemoryGraphSource;
    use credrank_core::{Interval, Parameters, Participant, ParticipantId, WeightConfig};
    use std::collections::BTreeMap as Map;

    fn sample_view() -> ChainView {
        let base_addr = NodeAddress::from_parts(["github", "repo", "1"]).unwrap();
        let mut node_weights = Map::new();
        node_weights.insert(base_addr.clone(), 1.0);
        let source = InMemoryGraphSource {
            node_addresses: vec![base_addr],
            input_edges: vec![],
            weights: WeightConfig {
                node_weights,
                edge_weights: Map::new(),
                default_node_weight: 0.0,
                default_edge_weight: (1.0, 1.0),
            },
        };
        let participant = Participant {
            address: NodeAddress::from_parts(["github", "user", "alice"]).unwrap(),
            description: "alice".to_string(),
            id: ParticipantId::from("alice"),
        };
        let intervals = [Interval { start_time_ms: 0 }];
        let graph = build(BuildArgs {
            weighted_graph: &source,
            participants: std::slice::from_ref(&participant),
            intervals: &intervals,
            parameters: Parameters {
                alpha: 0.2,
                beta: 0.3,
                gamma_forward: 0.1,
                gamma_backward: 0.1,
            },
        })
        .unwrap();
        ChainView::new(graph)
    }

    #[test]
    fn node_order_places_seed_after_real_nodes() {
        let view = sample_view();
        let seed_addr = NodeGadget::Seed.to_raw();
        let seed_pos = view.node_order().iter().position(|a| *a == seed_addr).unwrap();
        assert!(seed_pos > 0);
        assert!(view.node_order()[..seed_pos]
            .windows(2)
            .all(|w| w[0] <= w[1]));
    }

    #[test]
    fn node_synthesizes_seed_and_accumulator() {
        let view = sample_view();
        assert!(view.node(&NodeGadget::Seed.to_raw()).is_some());
        for &boundary in view.graph().boundaries() {
            let addr = NodeGadget::EpochAccumulator { epoch_start: boundary }.to_raw();
            assert!(view.node(&addr).is_some());
        }
    }

    #[test]
    fn transition_mass_holds_for_every_node() {
        let view = sample_view();
        assert!(view.verify_transition_mass().is_ok());
    }

    #[test]
    fn sparse_chain_in_edges_indices_match_node_order() {
        let view = sample_view();
        let sparse = view.to_sparse_chain().unwrap();
        assert_eq!(sparse.node_order, view.node_order());
        for (dst_idx, edges) in sparse.in_edges.iter().enumerate() {
            for &(src_idx, weight) in edges {
                assert!(src_idx < sparse.node_order.len());
                assert!(dst_idx < sparse.node_order.len());
                assert!((0.0..=1.0).contains(&weight));
            }
        }
    }

    #[test]
    fn in_neighbors_matches_linear_scan() {
        let view = sample_view();
        let seed_addr = NodeGadget::Seed.to_raw();
        let via_index: Vec<_> = view.in_neighbors(&seed_addr).collect();
        let via_scan: Vec<_> = view
            .edges()
            .filter(|e| e.dst == seed_addr)
            .collect();
        assert_eq!(via_index.len(), via_scan.len());
    }
}
