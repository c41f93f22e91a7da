//! Stable JSON serialization for the cred graph: stores the score vector
//! alongside the chain's own `markovProcessGraph` document.

use serde::{Deserialize, Serialize};

use credrank_core::CredRankError;
use credrank_graph::json::{Envelope, MarkovProcessGraphPayload};

use crate::cred::CredGraph;

pub const CRED_GRAPH_TYPE: &str = "sourcecred/credGraph";

/// The `payload` of a `sourcecred/credGraph` document: the chain's own
/// payload (`mpg`) plus the score vector aligned to the full node order.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredGraphPayload {
    mpg: MarkovProcessGraphPayload,
    scores: Vec<f64>,
}

/// Serializes `cred_graph` as a complete envelope document.
pub fn to_json(cred_graph: &CredGraph) -> Result<String, CredRankError> {
    let payload = CredGraphPayload {
        mpg: credrank_graph::json::to_payload(cred_graph.chain()),
        scores: cred_graph.scores().to_vec(),
    };
    let envelope = Envelope::new(CRED_GRAPH_TYPE, payload);
    Ok(serde_json::to_string(&envelope)?)
}

/// Decodes a complete envelope document, rejecting a `type`/`version`
/// mismatch and a score-vector length mismatch before binding.
pub fn from_json(raw: &str) -> Result<CredGraph, CredRankError> {
    let envelope: Envelope<CredGraphPayload> = serde_json::from_str(raw)?;
    envelope.check(CRED_GRAPH_TYPE)?;
    let chain = credrank_graph::json::from_payload(envelope.payload.mpg)?;
    CredGraph::new(chain, envelope.payload.scores)
}
