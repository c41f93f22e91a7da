//! The Markov-process node type and its structural classification.

use serde::{Deserialize, Serialize};

use crate::address::NodeAddress;

/// A node in the Markov process graph. `address` is unique within the
/// graph; `mint` is the non-negative weight making a node eligible for
/// seed-to-node flow proportional to its share of total mint (zero for
/// structural nodes and for nodes not eligible to mint).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkovNode {
    pub address: NodeAddress,
    pub description: String,
    pub mint: f64,
}

/// The structural class a node belongs to, determined solely by address
/// prefix under the reserved `core` root. Used by the graph builder's
/// Phase 6 radiation step to pick the correct edge gadget, and by the chain
/// view to synthesize virtual nodes on demand.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeClass {
    /// The singleton teleportation target.
    Seed,
    /// A virtual node collecting one epoch's payout flow.
    EpochAccumulator,
    /// One real node per (participant, epoch boundary).
    UserEpoch,
    /// Every other node, originated in the input graph.
    Base,
}
