//! The unified error type shared by every CredRank crate.
//!
//! Each downstream crate (`credrank-graph`, `credrank-cred`, the CLI) adds
//! its own `#[from]` conversions onto the same enum rather than wrapping it
//! in another layer, so a caller three crates removed from the failure site
//! still matches on a single flat set of variants.

use thiserror::Error;

use crate::address::{EdgeAddress, NodeAddress};

/// Everything that can go wrong validating parameters, building, exporting,
/// or scoring a CredRank graph.
#[derive(Debug, Error)]
pub enum CredRankError {
    /// A single parameter (`alpha`, `beta`, `gammaForward`, `gammaBackward`)
    /// fell outside `[0, 1]`.
    #[error("parameter {field} must be in [0, 1], got {value}")]
    InvalidParameter { field: &'static str, value: f64 },

    /// `alpha + beta + gammaForward + gammaBackward` exceeded 1.
    #[error("parameter budget exceeded: alpha + beta + gammaForward + gammaBackward = {sum} > 1")]
    ParameterBudgetExceeded { sum: f64 },

    /// A node weight returned by the evaluator was negative or non-finite.
    #[error("invalid node weight for {address}: {value}")]
    InvalidNodeWeight { address: NodeAddress, value: f64 },

    /// An edge weight returned by the evaluator was negative or non-finite.
    #[error("invalid edge weight for {address}: {value}")]
    InvalidEdgeWeight { address: EdgeAddress, value: f64 },

    /// An input node carried the reserved `core` address prefix.
    #[error("core address leaked into base graph input: {address}")]
    CoreNodeLeakage { address: NodeAddress },

    /// A node address was inserted twice with conflicting attributes.
    #[error("node address {address} inserted twice")]
    NodeConflict { address: NodeAddress },

    /// A Markov edge key `(address, reversed, src, dst)` was inserted twice.
    #[error("edge key {key} inserted twice")]
    EdgeConflict { key: String },

    /// Total mint weight across all real nodes is zero: the seed has no
    /// possible outflow.
    #[error("graph has no minting source: total mint weight is zero")]
    NoMintingSource,

    /// A node's outgoing transition probabilities did not sum to 1 within
    /// tolerance at chain-export time.
    #[error("node {address} out-transition probabilities sum to {total}, expected 1.0 +/- 1e-3")]
    SumCheckViolation { address: NodeAddress, total: f64 },

    /// A structural address failed a gadget's inverse parse.
    #[error("unrecognized {gadget} gadget address: {address:?}")]
    AddressParseError {
        gadget: &'static str,
        address: String,
    },

    /// A decoded envelope's `type`/`version` fields did not match what this
    /// crate knows how to decode.
    #[error("version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: String, found: String },

    /// A supplied score vector's length did not match the chain's node
    /// count.
    #[error("score vector has {found} entries, chain has {expected} nodes")]
    ScoreLengthMismatch { expected: usize, found: usize },

    /// Wraps I/O failures from loading fixtures or writing documents; only
    /// the demonstration CLI performs I/O, but the error type is shared so
    /// it can propagate with `?` alongside the rest of this enum.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Wraps JSON (de)serialization failures.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
