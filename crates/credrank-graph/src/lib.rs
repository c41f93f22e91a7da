//! The graph builder and chain view: Components D and E of the CredRank
//! engine, layered atop `credrank-core`'s address algebra, gadget registry,
//! and weight evaluator.

#![deny(unsafe_code)]

pub mod builder;
pub mod chain;
pub mod graph;
pub mod json;
pub mod source;

pub use builder::{build, BuildArgs};
pub use chain::{ChainView, SparseMarkovChain};
pub use graph::MarkovProcessGraph;
pub use source::{InMemoryGraphSource, InputEdge, WeightedGraphSource};
