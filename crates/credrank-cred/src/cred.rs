//! The cred graph overlay: binds an externally-computed stationary score
//! vector onto a [`ChainView`], deriving per-node cred and per-edge cred
//! flow.

use std::collections::BTreeMap;

use credrank_core::{CredRankError, EdgeGadget, MarkovEdgeKey, NodeAddress, Participant};
use credrank_graph::ChainView;

/// A node together with the stationary mass (`cred`) it accumulated.
#[derive(Clone, Debug, PartialEq)]
pub struct CredNode {
    pub address: NodeAddress,
    pub description: String,
    pub mint: f64,
    pub cred: f64,
}

/// An edge together with its cred flow: `cred(src) * transitionProbability`,
/// the per-step stationary mass that traverses the edge.
#[derive(Clone, Debug, PartialEq)]
pub struct CredEdge {
    pub address: credrank_core::EdgeAddress,
    pub reversed: bool,
    pub src: NodeAddress,
    pub dst: NodeAddress,
    pub transition_probability: f64,
    pub cred_flow: f64,
}

/// A participant's cred, broken down per epoch boundary in boundary order.
#[derive(Clone, Debug, PartialEq)]
pub struct ParticipantCred {
    pub participant: Participant,
    pub cred_per_epoch: Vec<f64>,
    pub cred: f64,
}

/// Binds a score vector in node-order onto a [`ChainView`]. Immutable once
/// constructed; `Send + Sync` since every field is plain owned data.
#[derive(Clone, Debug)]
pub struct CredGraph {
    chain: ChainView,
    scores: Vec<f64>,
    index_of: BTreeMap<NodeAddress, usize>,
}

impl CredGraph {
    /// Binds `scores` (aligned to `chain.node_order()`) onto `chain`.
    /// Validates the score vector's length before binding; construction is
    /// otherwise infallible given an already-validated chain.
    pub fn new(chain: ChainView, scores: Vec<f64>) -> Result<Self, CredRankError> {
        let expected = chain.node_order().len();
        if scores.len() != expected {
            tracing::warn!(expected, found = scores.len(), "score vector length mismatch");
            return Err(CredRankError::ScoreLengthMismatch {
                expected,
                found: scores.len(),
            });
        }
        for (index, &value) in scores.iter().enumerate() {
            if !value.is_finite() || value < 0.0 {
                return Err(CredRankError::InvalidNodeWeight {
                    address: chain.node_order()[index].clone(),
                    value,
                });
            }
        }
        let index_of = chain
            .node_order()
            .iter()
            .enumerate()
            .map(|(i, addr)| (addr.clone(), i))
            .collect();
        Ok(CredGraph {
            chain,
            scores,
            index_of,
        })
    }

    pub fn chain(&self) -> &ChainView {
        &self.chain
    }

    pub fn scores(&self) -> &[f64] {
        &self.scores
    }

    fn cred_of(&self, addr: &NodeAddress) -> f64 {
        self.index_of
            .get(addr)
            .map(|&i| self.scores[i])
            .unwrap_or(0.0)
    }

    /// Returns the node at `addr` with its bound cred, if present.
    pub fn node(&self, addr: &NodeAddress) -> Option<CredNode> {
        let node = self.chain.node(addr)?;
        Some(CredNode {
            address: node.address,
            description: node.description,
            mint: node.mint,
            cred: self.cred_of(addr),
        })
    }

    /// Lazy iteration in node order, each carrying its bound cred.
    pub fn nodes(&self) -> impl Iterator<Item = CredNode> + '_ {
        self.chain.node_order().iter().map(move |addr| {
            self.node(addr)
                .expect("node_order only contains addresses the chain can resolve")
        })
    }

    fn with_cred_flow(&self, edge: credrank_core::MarkovEdge) -> CredEdge {
        let cred_flow = self.cred_of(&edge.src) * edge.transition_probability;
        CredEdge {
            address: edge.address,
            reversed: edge.reversed,
            src: edge.src,
            dst: edge.dst,
            transition_probability: edge.transition_probability,
            cred_flow,
        }
    }

    /// Lazy iteration in edge order, each carrying its cred flow.
    pub fn edges(&self) -> impl Iterator<Item = CredEdge> + '_ {
        self.chain.edges().map(move |edge| self.with_cred_flow(edge))
    }

    /// Lazy iteration over in-edges of `addr`, each carrying its cred flow.
    pub fn in_neighbors(&self, addr: &NodeAddress) -> impl Iterator<Item = CredEdge> + '_ {
        self.chain
            .in_neighbors(addr)
            .map(move |edge| self.with_cred_flow(edge))
    }

    /// For each participant, the payout edge's cred flow at every epoch
    /// boundary and the participant's total cred (the sum across epochs).
    pub fn participants(&self) -> impl Iterator<Item = ParticipantCred> + '_ {
        self.chain.graph().participants().iter().map(move |participant| {
            let cred_per_epoch: Vec<f64> = self
                .chain
                .graph()
                .boundaries()
                .iter()
                .map(|&epoch_start| {
                    let payout = EdgeGadget::Payout {
                        owner: participant.id.clone(),
                        epoch_start,
                    };
                    let key = MarkovEdgeKey {
                        address: payout.to_raw(),
                        reversed: false,
                        src: payout.src(),
                        dst: payout.dst(),
                    };
                    self.chain
                        .edge(&key)
                        .map(|edge| self.cred_of(&edge.src) * edge.transition_probability)
                        .unwrap_or(0.0)
                })
                .collect();
            let cred = cred_per_epoch.iter().sum();
            ParticipantCred {
                participant: participant.clone(),
                cred_per_epoch,
                cred,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use credrank_core::{Interval, Parameters, ParticipantId, WeightConfig};
    use credrank_graph::source::InMemoryGraphSource;
    use credrank_graph::{build, BuildArgs};
    use std::collections::BTreeMap as Map;

    fn sample_chain() -> ChainView {
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
    fn new_rejects_mismatched_score_length() {
        let chain = sample_chain();
        let err = CredGraph::new(chain, vec![1.0]).unwrap_err();
        assert!(matches!(err, CredRankError::ScoreLengthMismatch { .. }));
    }

    #[test]
    fn cred_flow_equals_cred_times_transition_probability() {
        let chain = sample_chain();
        let n = chain.node_order().len();
        let scores = vec![1.0 / n as f64; n];
        let cred_graph = CredGraph::new(chain, scores).unwrap();
        for edge in cred_graph.edges() {
            let expected = cred_graph.cred_of(&edge.src) * edge.transition_probability;
            assert_eq!(edge.cred_flow, expected);
        }
    }

    #[test]
    fn participant_cred_equals_sum_of_per_epoch_cred() {
        let chain = sample_chain();
        let n = chain.node_order().len();
        let scores = vec![1.0 / n as f64; n];
        let cred_graph = CredGraph::new(chain, scores).unwrap();
        for p in cred_graph.participants() {
            let total: f64 = p.cred_per_epoch.iter().sum();
            assert!((total - p.cred).abs() < 1e-9);
        }
    }
}
