//! Stable JSON serialization for the chain view.
//!
//! The envelope and payload field names derive `Serialize`/`Deserialize`
//! with `#[serde(rename_all = "camelCase")]`, so Rust's `snake_case` fields
//! produce the document's `camelCase` wire names without hand-written
//! renames scattered through the code.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use credrank_core::{
    EdgeAddress, MarkovEdge, MarkovEdgeKey, MarkovNode, NodeAddress, NodeGadget, Participant,
    TimeBoundary,
};

use crate::chain::ChainView;
use crate::graph::MarkovProcessGraph;
use credrank_core::CredRankError;

pub const MARKOV_PROCESS_GRAPH_TYPE: &str = "sourcecred/markovProcessGraph";
pub const SCHEMA_VERSION: &str = "0.1.0";

/// The versioned envelope wrapping every document this crate writes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    #[serde(rename = "type")]
    pub kind: String,
    pub version: String,
    pub payload: T,
}

impl<T> Envelope<T> {
    pub fn new(kind: impl Into<String>, payload: T) -> Self {
        Envelope {
            kind: kind.into(),
            version: SCHEMA_VERSION.to_string(),
            payload,
        }
    }

    /// Checks `kind`/`version` against the expected values, raising
    /// [`CredRankError::VersionMismatch`] on any divergence.
    pub fn check(&self, expected_kind: &str) -> Result<(), CredRankError> {
        if self.kind != expected_kind || self.version != SCHEMA_VERSION {
            return Err(CredRankError::VersionMismatch {
                expected: format!("{expected_kind}@{SCHEMA_VERSION}"),
                found: format!("{}@{}", self.kind, self.version),
            });
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SortedNode {
    address: NodeAddress,
    description: String,
    mint: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IndexedEdge {
    address: EdgeAddress,
    reversed: bool,
    src: usize,
    dst: usize,
    transition_probability: f64,
}

/// The `payload` of a `sourcecred/markovProcessGraph` document.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkovProcessGraphPayload {
    sorted_nodes: Vec<SortedNode>,
    indexed_edges: Vec<IndexedEdge>,
    participants: Vec<Participant>,
    finite_epoch_boundaries: Vec<i64>,
}

/// Serializes `view` to its `sourcecred/markovProcessGraph` document.
/// `sortedNodes` covers real nodes only; `indexedEdges` stores endpoint
/// *indices* into the full node order (real nodes, then seed, then
/// accumulators) rather than addresses, to avoid duplicating address
/// strings across every edge.
pub fn to_payload(view: &ChainView) -> MarkovProcessGraphPayload {
    let index_of: BTreeMap<&NodeAddress, usize> = view
        .node_order()
        .iter()
        .enumerate()
        .map(|(i, addr)| (addr, i))
        .collect();

    let sorted_nodes = view
        .graph()
        .nodes()
        .values()
        .map(|n| SortedNode {
            address: n.address.clone(),
            description: n.description.clone(),
            mint: n.mint,
        })
        .collect();

    let indexed_edges = view
        .edge_order()
        .iter()
        .map(|key| {
            let edge = view.edge(key).expect("edge_order key must resolve");
            IndexedEdge {
                address: edge.address,
                reversed: edge.reversed,
                src: index_of[&edge.src],
                dst: index_of[&edge.dst],
                transition_probability: edge.transition_probability,
            }
        })
        .collect();

    let finite_epoch_boundaries = view
        .graph()
        .boundaries()
        .iter()
        .filter_map(TimeBoundary::finite_millis)
        .collect();

    MarkovProcessGraphPayload {
        sorted_nodes,
        indexed_edges,
        participants: view.graph().participants().to_vec(),
        finite_epoch_boundaries,
    }
}

/// Serializes `view` as a complete envelope document.
pub fn to_json(view: &ChainView) -> Result<String, CredRankError> {
    let envelope = Envelope::new(MARKOV_PROCESS_GRAPH_TYPE, to_payload(view));
    Ok(serde_json::to_string(&envelope)?)
}

/// Rebuilds the full node order (real nodes, seed, accumulators) from a
/// decoded payload, re-inserting the ±∞ sentinels that are stripped from
/// `finiteEpochBoundaries` on encode.
fn rebuild_node_order(payload: &MarkovProcessGraphPayload) -> Vec<NodeAddress> {
    let mut order: Vec<NodeAddress> = payload
        .sorted_nodes
        .iter()
        .map(|n| n.address.clone())
        .collect();
    order.sort();
    order.push(NodeGadget::Seed.to_raw());
    for &epoch_start in &boundaries_from_payload(payload) {
        order.push(NodeGadget::EpochAccumulator { epoch_start }.to_raw());
    }
    order
}

fn boundaries_from_payload(payload: &MarkovProcessGraphPayload) -> Vec<TimeBoundary> {
    let mut boundaries = Vec::with_capacity(payload.finite_epoch_boundaries.len() + 2);
    boundaries.push(TimeBoundary::NegInfinity);
    boundaries.extend(payload.finite_epoch_boundaries.iter().map(|&ms| TimeBoundary::Finite(ms)));
    boundaries.push(TimeBoundary::PosInfinity);
    boundaries
}

/// Decodes a `MarkovProcessGraphPayload` into a [`ChainView`], recomputing
/// the full node order rather than trusting a serialized copy of it.
pub fn from_payload(payload: MarkovProcessGraphPayload) -> Result<ChainView, CredRankError> {
    let node_order = rebuild_node_order(&payload);
    let boundaries = boundaries_from_payload(&payload);

    let mut nodes = BTreeMap::new();
    for n in payload.sorted_nodes {
        nodes.insert(
            n.address.clone(),
            MarkovNode {
                address: n.address,
                description: n.description,
                mint: n.mint,
            },
        );
    }

    let mut edges = BTreeMap::new();
    for e in payload.indexed_edges {
        let src = node_order
            .get(e.src)
            .cloned()
            .ok_or_else(|| CredRankError::AddressParseError {
                gadget: "indexed-edge",
                address: format!("src index {} out of range", e.src),
            })?;
        let dst = node_order
            .get(e.dst)
            .cloned()
            .ok_or_else(|| CredRankError::AddressParseError {
                gadget: "indexed-edge",
                address: format!("dst index {} out of range", e.dst),
            })?;
        let key = MarkovEdgeKey {
            address: e.address.clone(),
            reversed: e.reversed,
            src: src.clone(),
            dst: dst.clone(),
        };
        edges.insert(
            key,
            MarkovEdge {
                address: e.address,
                reversed: e.reversed,
                src,
                dst,
                transition_probability: e.transition_probability,
            },
        );
    }

    let graph = MarkovProcessGraph {
        nodes,
        edges,
        participants: payload.participants,
        boundaries,
    };
    Ok(ChainView::new(graph))
}

/// Decodes a complete envelope document, rejecting a `type`/`version`
/// mismatch before touching the payload.
pub fn from_json(raw: &str) -> Result<ChainView, CredRankError> {
    let envelope: Envelope<MarkovProcessGraphPayload> = serde_json::from_str(raw)?;
    envelope.check(MARKOV_PROCESS_GRAPH_TYPE)?;
    from_payload(envelope.payload)
}
