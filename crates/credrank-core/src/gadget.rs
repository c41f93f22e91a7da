//! The gadget registry: the single source of truth for structural node and
//! edge addresses.
//!
//! Node gadgets and edge gadgets are each a closed `enum` rather than a
//! trait-object hierarchy — there are exactly three node-gadget variants and
//! seven edge-gadget variants, a closed set, so a tagged union is the more
//! honest representation than `dyn Trait`. No component outside this module
//! may synthesize a `core`-prefixed address.

use crate::address::{EdgeAddress, NodeAddress, CORE_ROOT};
use crate::error::CredRankError;
use crate::node::{MarkovNode, NodeClass};
use crate::params::{ParticipantId, TimeBoundary};

const SEED_TAG: &str = "SEED";
const EPOCH_ACCUMULATOR_TAG: &str = "EPOCH_ACCUMULATOR";
const USER_EPOCH_TAG: &str = "USER_EPOCH";

const EDGE_ROOT: &str = "EDGE";
const SEED_MINT_TAG: &str = "SEED_MINT";
const PAYOUT_TAG: &str = "PAYOUT";
const WEBBING_FORWARD_TAG: &str = "WEBBING_FORWARD";
const WEBBING_BACKWARD_TAG: &str = "WEBBING_BACKWARD";
const RADIATION_CONTRIBUTION_TAG: &str = "RADIATION_CONTRIBUTION";
const RADIATION_EPOCH_TAG: &str = "RADIATION_EPOCH";
const RADIATION_ACCUMULATOR_TAG: &str = "RADIATION_ACCUMULATOR";

/// Encodes a [`TimeBoundary`] as a single address part. Sentinel boundaries
/// get a reserved spelling that cannot collide with a finite millisecond
/// value (`-` is not a valid leading character emitted by `i64::to_string`
/// composed with these exact literals).
fn boundary_part(b: TimeBoundary) -> String {
    match b {
        TimeBoundary::NegInfinity => "-inf".to_string(),
        TimeBoundary::Finite(ms) => ms.to_string(),
        TimeBoundary::PosInfinity => "+inf".to_string(),
    }
}

fn parse_boundary_part(part: &str) -> Result<TimeBoundary, CredRankError> {
    match part {
        "-inf" => Ok(TimeBoundary::NegInfinity),
        "+inf" => Ok(TimeBoundary::PosInfinity),
        other => other
            .parse::<i64>()
            .map(TimeBoundary::Finite)
            .map_err(|_| CredRankError::AddressParseError {
                gadget: "time-boundary",
                address: part.to_string(),
            }),
    }
}

/// The three structural node kinds. Seed and epoch-accumulator nodes are
/// virtualized (never stored in the node map); user-epoch nodes are real
/// and materialize as ordinary [`MarkovNode`] entries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeGadget {
    Seed,
    EpochAccumulator { epoch_start: TimeBoundary },
    UserEpoch {
        owner: ParticipantId,
        epoch_start: TimeBoundary,
    },
}

impl NodeGadget {
    /// The reserved parts prefix shared by every address this gadget
    /// produces.
    pub fn prefix(&self) -> &'static str {
        match self {
            NodeGadget::Seed => SEED_TAG,
            NodeGadget::EpochAccumulator { .. } => EPOCH_ACCUMULATOR_TAG,
            NodeGadget::UserEpoch { .. } => USER_EPOCH_TAG,
        }
    }

    /// Synthesizes this gadget's structural [`NodeAddress`].
    pub fn to_raw(&self) -> NodeAddress {
        let parts: Vec<String> = match self {
            NodeGadget::Seed => vec![CORE_ROOT.to_string(), SEED_TAG.to_string()],
            NodeGadget::EpochAccumulator { epoch_start } => vec![
                CORE_ROOT.to_string(),
                EPOCH_ACCUMULATOR_TAG.to_string(),
                boundary_part(*epoch_start),
            ],
            NodeGadget::UserEpoch { owner, epoch_start } => vec![
                CORE_ROOT.to_string(),
                USER_EPOCH_TAG.to_string(),
                boundary_part(*epoch_start),
                owner.0.clone(),
            ],
        };
        NodeAddress::from_parts(parts).expect("gadget parts never contain the separator")
    }

    /// Produces the node this gadget describes. Seed and accumulator nodes
    /// never mint; only base nodes (outside this registry entirely) do.
    pub fn materialize(&self) -> MarkovNode {
        let (address, description) = match self {
            NodeGadget::Seed => (self.to_raw(), "seed".to_string()),
            NodeGadget::EpochAccumulator { epoch_start } => (
                self.to_raw(),
                format!("epoch accumulator @ {}", boundary_part(*epoch_start)),
            ),
            NodeGadget::UserEpoch { owner, epoch_start } => (
                self.to_raw(),
                format!("{} @ {}", owner, boundary_part(*epoch_start)),
            ),
        };
        MarkovNode {
            address,
            description,
            mint: 0.0,
        }
    }
}

/// Classifies a node address into its structural class, or [`NodeClass::Base`]
/// if it does not carry the reserved `core` prefix at all. A `core`-prefixed
/// address matching none of the three known gadgets is an
/// [`CredRankError::AddressParseError`].
pub fn classify_node(addr: &NodeAddress) -> Result<NodeClass, CredRankError> {
    if !addr.is_core() {
        return Ok(NodeClass::Base);
    }
    let parts = addr.to_parts();
    match parts.get(1).map(String::as_str) {
        Some(SEED_TAG) => Ok(NodeClass::Seed),
        Some(EPOCH_ACCUMULATOR_TAG) => Ok(NodeClass::EpochAccumulator),
        Some(USER_EPOCH_TAG) => Ok(NodeClass::UserEpoch),
        _ => Err(CredRankError::AddressParseError {
            gadget: "node",
            address: addr.to_canonical_string(),
        }),
    }
}

/// Parses the boundary key out of a `core/EPOCH_ACCUMULATOR/<epochStart>`
/// address.
pub fn parse_epoch_accumulator(addr: &NodeAddress) -> Result<TimeBoundary, CredRankError> {
    let parts = addr.to_parts();
    if parts.len() == 3 && parts[0] == CORE_ROOT && parts[1] == EPOCH_ACCUMULATOR_TAG {
        parse_boundary_part(&parts[2])
    } else {
        Err(CredRankError::AddressParseError {
            gadget: "epoch-accumulator",
            address: addr.to_canonical_string(),
        })
    }
}

/// Parses the `(owner, epochStart)` key out of a
/// `core/USER_EPOCH/<epochStart>/<ownerId>` address.
pub fn parse_user_epoch(
    addr: &NodeAddress,
) -> Result<(ParticipantId, TimeBoundary), CredRankError> {
    let parts = addr.to_parts();
    if parts.len() == 4 && parts[0] == CORE_ROOT && parts[1] == USER_EPOCH_TAG {
        let epoch_start = parse_boundary_part(&parts[2])?;
        Ok((ParticipantId(parts[3].clone()), epoch_start))
    } else {
        Err(CredRankError::AddressParseError {
            gadget: "user-epoch",
            address: addr.to_canonical_string(),
        })
    }
}

/// The seven structural edge kinds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EdgeGadget {
    /// Seed to a minting node, probability `mint / totalMint`.
    SeedMint { target: NodeAddress },
    /// User-epoch node to its epoch accumulator, probability `beta`.
    Payout {
        owner: ParticipantId,
        epoch_start: TimeBoundary,
    },
    /// Earlier user-epoch node to the next, probability `gammaForward`.
    WebbingForward {
        owner: ParticipantId,
        from: TimeBoundary,
        to: TimeBoundary,
    },
    /// Later user-epoch node to the previous, probability `gammaBackward`.
    WebbingBackward {
        owner: ParticipantId,
        from: TimeBoundary,
        to: TimeBoundary,
    },
    /// Residual teleportation from a base node back to seed.
    RadiationContribution { source: NodeAddress },
    /// Residual teleportation from a user-epoch node back to seed.
    RadiationEpoch {
        owner: ParticipantId,
        epoch_start: TimeBoundary,
    },
    /// Residual teleportation from an epoch accumulator back to seed.
    RadiationAccumulator { epoch_start: TimeBoundary },
}

impl EdgeGadget {
    pub fn prefix(&self) -> &'static str {
        match self {
            EdgeGadget::SeedMint { .. } => SEED_MINT_TAG,
            EdgeGadget::Payout { .. } => PAYOUT_TAG,
            EdgeGadget::WebbingForward { .. } => WEBBING_FORWARD_TAG,
            EdgeGadget::WebbingBackward { .. } => WEBBING_BACKWARD_TAG,
            EdgeGadget::RadiationContribution { .. } => RADIATION_CONTRIBUTION_TAG,
            EdgeGadget::RadiationEpoch { .. } => RADIATION_EPOCH_TAG,
            EdgeGadget::RadiationAccumulator { .. } => RADIATION_ACCUMULATOR_TAG,
        }
    }

    /// Synthesizes this gadget's structural [`EdgeAddress`].
    pub fn to_raw(&self) -> EdgeAddress {
        let mut parts = vec![CORE_ROOT.to_string(), EDGE_ROOT.to_string(), self.prefix().to_string()];
        match self {
            EdgeGadget::SeedMint { target } => parts.extend(target.to_parts().iter().cloned()),
            EdgeGadget::Payout { owner, epoch_start } => {
                parts.push(boundary_part(*epoch_start));
                parts.push(owner.0.clone());
            }
            EdgeGadget::WebbingForward { owner, from, to } | EdgeGadget::WebbingBackward { owner, from, to } => {
                parts.push(boundary_part(*from));
                parts.push(boundary_part(*to));
                parts.push(owner.0.clone());
            }
            EdgeGadget::RadiationContribution { source } => {
                parts.extend(source.to_parts().iter().cloned())
            }
            EdgeGadget::RadiationEpoch { owner, epoch_start } => {
                parts.push(boundary_part(*epoch_start));
                parts.push(owner.0.clone());
            }
            EdgeGadget::RadiationAccumulator { epoch_start } => {
                parts.push(boundary_part(*epoch_start));
            }
        }
        EdgeAddress::from_parts(parts).expect("gadget parts never contain the separator")
    }

    /// The source node address this edge gadget emits from.
    pub fn src(&self) -> NodeAddress {
        match self {
            EdgeGadget::SeedMint { .. } => NodeGadget::Seed.to_raw(),
            EdgeGadget::Payout { owner, epoch_start }
            | EdgeGadget::RadiationEpoch { owner, epoch_start } => NodeGadget::UserEpoch {
                owner: owner.clone(),
                epoch_start: *epoch_start,
            }
            .to_raw(),
            EdgeGadget::WebbingForward { owner, from, .. } => NodeGadget::UserEpoch {
                owner: owner.clone(),
                epoch_start: *from,
            }
            .to_raw(),
            EdgeGadget::WebbingBackward { owner, to, .. } => NodeGadget::UserEpoch {
                owner: owner.clone(),
                epoch_start: *to,
            }
            .to_raw(),
            EdgeGadget::RadiationContribution { source } => source.clone(),
            EdgeGadget::RadiationAccumulator { epoch_start } => {
                NodeGadget::EpochAccumulator {
                    epoch_start: *epoch_start,
                }
                .to_raw()
            }
        }
    }

    /// The destination node address this edge gadget emits to.
    pub fn dst(&self) -> NodeAddress {
        match self {
            EdgeGadget::SeedMint { target } => target.clone(),
            EdgeGadget::Payout { epoch_start, .. } => NodeGadget::EpochAccumulator {
                epoch_start: *epoch_start,
            }
            .to_raw(),
            EdgeGadget::WebbingForward { owner, to, .. } => NodeGadget::UserEpoch {
                owner: owner.clone(),
                epoch_start: *to,
            }
            .to_raw(),
            EdgeGadget::WebbingBackward { owner, from, .. } => NodeGadget::UserEpoch {
                owner: owner.clone(),
                epoch_start: *from,
            }
            .to_raw(),
            EdgeGadget::RadiationContribution { .. }
            | EdgeGadget::RadiationEpoch { .. }
            | EdgeGadget::RadiationAccumulator { .. } => NodeGadget::Seed.to_raw(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_address_matches_structural_convention() {
        assert_eq!(NodeGadget::Seed.to_raw().to_canonical_string(), "core/SEED");
    }

    #[test]
    fn epoch_accumulator_address_matches_structural_convention() {
        let g = NodeGadget::EpochAccumulator {
            epoch_start: TimeBoundary::Finite(10),
        };
        assert_eq!(
            g.to_raw().to_canonical_string(),
            "core/EPOCH_ACCUMULATOR/10"
        );
    }

    #[test]
    fn user_epoch_address_matches_structural_convention() {
        let g = NodeGadget::UserEpoch {
            owner: ParticipantId::from("alice"),
            epoch_start: TimeBoundary::Finite(10),
        };
        assert_eq!(
            g.to_raw().to_canonical_string(),
            "core/USER_EPOCH/10/alice"
        );
    }

    #[test]
    fn classify_rejects_unknown_core_address() {
        let addr = NodeAddress::from_parts(["core", "NOT_A_GADGET"]).unwrap();
        let err = classify_node(&addr).unwrap_err();
        assert!(matches!(err, CredRankError::AddressParseError { .. }));
    }

    #[test]
    fn classify_accepts_base_address() {
        let addr = NodeAddress::from_parts(["github", "repo", "1"]).unwrap();
        assert_eq!(classify_node(&addr).unwrap(), NodeClass::Base);
    }

    #[test]
    fn parse_user_epoch_round_trips_through_to_raw() {
        let owner = ParticipantId::from("bob");
        let epoch_start = TimeBoundary::Finite(42);
        let addr = NodeGadget::UserEpoch {
            owner: owner.clone(),
            epoch_start,
        }
        .to_raw();
        let (parsed_owner, parsed_epoch) = parse_user_epoch(&addr).unwrap();
        assert_eq!(parsed_owner, owner);
        assert_eq!(parsed_epoch, epoch_start);
    }

    #[test]
    fn seed_mint_edge_endpoints() {
        let target = NodeAddress::from_parts(["github", "repo", "1"]).unwrap();
        let gadget = EdgeGadget::SeedMint {
            target: target.clone(),
        };
        assert_eq!(gadget.src(), NodeGadget::Seed.to_raw());
        assert_eq!(gadget.dst(), target);
    }

    #[test]
    fn boundary_sentinels_round_trip_through_accumulator_address() {
        for b in [TimeBoundary::NegInfinity, TimeBoundary::PosInfinity] {
            let addr = NodeGadget::EpochAccumulator { epoch_start: b }.to_raw();
            assert_eq!(parse_epoch_accumulator(&addr).unwrap(), b);
        }
    }
}
