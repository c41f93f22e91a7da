//! Foundational types for the CredRank engine: addresses, the unified error
//! type, the gadget registry, the weight evaluator, and the plain input
//! types (`Parameters`, `Interval`, `Participant`) the graph builder
//! consumes.
//!
//! This crate has no knowledge of graph construction itself — that lives in
//! `credrank-graph`, layered on top as a main engine atop a foundational
//! safety/validation layer.

#![deny(unsafe_code)]

pub mod address;
pub mod edge;
pub mod error;
pub mod gadget;
pub mod node;
pub mod params;
pub mod weight;

pub use address::{EdgeAddress, NodeAddress};
pub use edge::{MarkovEdge, MarkovEdgeKey};
pub use error::CredRankError;
pub use gadget::{classify_node, EdgeGadget, NodeGadget};
pub use node::{MarkovNode, NodeClass};
pub use params::{time_boundaries, Interval, Parameters, Participant, ParticipantId, TimeBoundary};
pub use weight::WeightConfig;
