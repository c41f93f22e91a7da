//! The on-disk JSON shape this demonstration binary reads: a weighted
//! graph, participants, intervals, and parameters, all in one file. This is
//! intentionally simpler than any real plugin ecosystem's format (that
//! ecosystem stays out of scope) — it exists only to exercise the pipeline
//! end-to-end.

use std::collections::BTreeMap;

use serde::Deserialize;

use credrank_core::{EdgeAddress, Interval, NodeAddress, Parameters, Participant, WeightConfig};
use credrank_graph::source::{InMemoryGraphSource, InputEdge};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FixtureNode {
    address: NodeAddress,
    weight: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FixtureEdge {
    address: EdgeAddress,
    src: NodeAddress,
    dst: NodeAddress,
    timestamp_ms: i64,
    #[serde(default = "default_weight")]
    forward_weight: f64,
    #[serde(default = "default_weight")]
    backward_weight: f64,
}

fn default_weight() -> f64 {
    1.0
}

/// The complete on-disk fixture document.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fixture {
    nodes: Vec<FixtureNode>,
    #[serde(default)]
    edges: Vec<FixtureEdge>,
    participants: Vec<Participant>,
    intervals: Vec<Interval>,
    parameters: Parameters,
}

impl Fixture {
    pub fn parameters(&self) -> Parameters {
        self.parameters
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    /// Builds the in-memory weighted graph source the builder consumes.
    pub fn graph_source(&self) -> InMemoryGraphSource {
        let mut node_weights = BTreeMap::new();
        let mut edge_weights = BTreeMap::new();
        let node_addresses = self
            .nodes
            .iter()
            .map(|n| {
                node_weights.insert(n.address.clone(), n.weight);
                n.address.clone()
            })
            .collect();
        let input_edges = self
            .edges
            .iter()
            .map(|e| {
                edge_weights.insert(e.address.clone(), (e.forward_weight, e.backward_weight));
                InputEdge {
                    address: e.address.clone(),
                    src: e.src.clone(),
                    dst: e.dst.clone(),
                    timestamp_ms: e.timestamp_ms,
                }
            })
            .collect();

        InMemoryGraphSource {
            node_addresses,
            input_edges,
            weights: WeightConfig {
                node_weights,
                edge_weights,
                default_node_weight: 0.0,
                default_edge_weight: (0.0, 0.0),
            },
        }
    }
}
