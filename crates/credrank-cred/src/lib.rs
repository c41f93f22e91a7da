//! Component F: the cred graph overlay. Binds a stationary score vector
//! computed by an external eigensolver onto a `credrank-graph` chain view,
//! deriving per-node cred, per-edge cred flow, and per-participant
//! per-epoch cred.

#![deny(unsafe_code)]

pub mod cred;
pub mod json;

pub use cred::{CredEdge, CredGraph, CredNode, ParticipantCred};
