//! The graph builder: constructs a [`MarkovProcessGraph`] from a weighted
//! input graph, participants, intervals, and parameters, enforcing every
//! invariant in the data model phase by phase.

use std::collections::BTreeMap;

use credrank_core::{
    classify_node, time_boundaries, EdgeGadget, Interval, MarkovEdge, MarkovEdgeKey, MarkovNode,
    NodeAddress, NodeClass, NodeGadget, Parameters, Participant, ParticipantId, TimeBoundary,
};
use credrank_core::CredRankError;

use crate::graph::MarkovProcessGraph;
use crate::source::WeightedGraphSource;

/// The inputs to [`build`]: the external weighted graph, the participants
/// being scored, the interval sequence, and the tuning parameters.
pub struct BuildArgs<'a> {
    pub weighted_graph: &'a dyn WeightedGraphSource,
    pub participants: &'a [Participant],
    pub intervals: &'a [Interval],
    pub parameters: Parameters,
}

/// Accumulates the builder's working state across all six phases. Kept
/// separate from the public [`MarkovProcessGraph`] so partially-built state
/// is never observable outside this module.
struct BuilderState<'a> {
    parameters: Parameters,
    participants_by_address: BTreeMap<NodeAddress, &'a Participant>,
    nodes: BTreeMap<NodeAddress, MarkovNode>,
    edges: BTreeMap<MarkovEdgeKey, MarkovEdge>,
    out_mass: BTreeMap<NodeAddress, f64>,
    boundaries: Vec<TimeBoundary>,
}

impl<'a> BuilderState<'a> {
    fn insert_edge(
        &mut self,
        address: credrank_core::EdgeAddress,
        reversed: bool,
        src: NodeAddress,
        dst: NodeAddress,
        probability: f64,
    ) -> Result<(), CredRankError> {
        let key = MarkovEdgeKey {
            address: address.clone(),
            reversed,
            src: src.clone(),
            dst: dst.clone(),
        };
        if self.edges.contains_key(&key) {
            return Err(CredRankError::EdgeConflict {
                key: key.to_string(),
            });
        }
        *self.out_mass.entry(src.clone()).or_insert(0.0) += probability;
        self.edges.insert(
            key,
            MarkovEdge {
                address,
                reversed,
                src,
                dst,
                transition_probability: probability,
            },
        );
        Ok(())
    }

    fn out_mass_of(&self, addr: &NodeAddress) -> f64 {
        self.out_mass.get(addr).copied().unwrap_or(0.0)
    }
}

/// Finds the boundary immediately preceding (or equal to) `t`: the greatest
/// finite boundary `<= t`, or `-inf` if none exists. `boundaries` must
/// already be in ascending order (guaranteed by [`time_boundaries`]).
fn boundary_preceding(boundaries: &[TimeBoundary], t: i64) -> TimeBoundary {
    let mut result = TimeBoundary::NegInfinity;
    for b in boundaries {
        if let TimeBoundary::Finite(ms) = b {
            if *ms <= t {
                result = *b;
            }
        }
    }
    result
}

/// Rewrites a participant's address to the user-epoch node address for the
/// epoch containing `t`; leaves any other address unchanged.
fn rewrite_epoch_endpoint(
    addr: &NodeAddress,
    t: i64,
    boundaries: &[TimeBoundary],
    participants_by_address: &BTreeMap<NodeAddress, &Participant>,
) -> NodeAddress {
    match participants_by_address.get(addr) {
        Some(participant) => {
            let epoch_start = boundary_preceding(boundaries, t);
            NodeGadget::UserEpoch {
                owner: participant.id.clone(),
                epoch_start,
            }
            .to_raw()
        }
        None => addr.clone(),
    }
}

/// Phase 1: validate parameters, returning the epoch-transition remainder
/// used by later phases.
#[tracing::instrument(level = "debug", skip_all)]
fn validate_parameters(parameters: &Parameters) -> Result<f64, CredRankError> {
    parameters.validate()?;
    Ok(parameters.epoch_transition_remainder())
}

/// Phase 2: ingest every input node that is not a participant address and
/// does not carry the reserved `core` prefix.
#[tracing::instrument(level = "debug", skip_all)]
fn ingest_base_nodes(state: &mut BuilderState, graph: &dyn WeightedGraphSource) -> Result<(), CredRankError> {
    for addr in graph.nodes() {
        if state.participants_by_address.contains_key(&addr) {
            continue;
        }
        if addr.is_core() {
            return Err(CredRankError::CoreNodeLeakage { address: addr });
        }
        let mint = graph.weights().node_weight(&addr)?;
        if state.nodes.contains_key(&addr) {
            return Err(CredRankError::NodeConflict { address: addr });
        }
        state.nodes.insert(
            addr.clone(),
            MarkovNode {
                address: addr,
                description: String::new(),
                mint,
            },
        );
    }
    Ok(())
}

/// Phase 3: emit one user-epoch node per (participant, boundary), its
/// payout edge, and forward/backward webbing to the previous boundary.
#[tracing::instrument(level = "debug", skip_all)]
fn build_time_skeleton(state: &mut BuilderState, participants: &[Participant]) -> Result<(), CredRankError> {
    let boundaries = state.boundaries.clone();
    for (i, &boundary) in boundaries.iter().enumerate() {
        for p in participants {
            let user_epoch_gadget = NodeGadget::UserEpoch {
                owner: p.id.clone(),
                epoch_start: boundary,
            };
            let node_addr = user_epoch_gadget.to_raw();
            if state.nodes.contains_key(&node_addr) {
                return Err(CredRankError::NodeConflict { address: node_addr });
            }
            let mut node = user_epoch_gadget.materialize();
            node.description = format!("{} @ epoch {:?}", p.description, boundary);
            state.nodes.insert(node_addr.clone(), node);

            let payout = EdgeGadget::Payout {
                owner: p.id.clone(),
                epoch_start: boundary,
            };
            state.insert_edge(
                payout.to_raw(),
                false,
                payout.src(),
                payout.dst(),
                state.parameters.beta,
            )?;

            if i > 0 {
                let previous = boundaries[i - 1];
                let forward = EdgeGadget::WebbingForward {
                    owner: p.id.clone(),
                    from: previous,
                    to: boundary,
                };
                state.insert_edge(
                    forward.to_raw(),
                    false,
                    forward.src(),
                    forward.dst(),
                    state.parameters.gamma_forward,
                )?;
                let backward = EdgeGadget::WebbingBackward {
                    owner: p.id.clone(),
                    from: previous,
                    to: boundary,
                };
                state.insert_edge(
                    backward.to_raw(),
                    false,
                    backward.src(),
                    backward.dst(),
                    state.parameters.gamma_backward,
                )?;
            }
        }
    }
    Ok(())
}

/// Phase 4: emit seed-mint edges proportional to each node's share of total
/// mint weight.
#[tracing::instrument(level = "debug", skip_all)]
fn mint(state: &mut BuilderState) -> Result<(), CredRankError> {
    let total_mint: f64 = state.nodes.values().map(|n| n.mint).sum();
    if total_mint <= 0.0 {
        return Err(CredRankError::NoMintingSource);
    }
    let minting_nodes: Vec<NodeAddress> = state
        .nodes
        .values()
        .filter(|n| n.mint > 0.0)
        .map(|n| n.address.clone())
        .collect();
    for addr in minting_nodes {
        let node_mint = state.nodes[&addr].mint;
        let gadget = EdgeGadget::SeedMint {
            target: addr.clone(),
        };
        state.insert_edge(
            gadget.to_raw(),
            false,
            gadget.src(),
            gadget.dst(),
            node_mint / total_mint,
        )?;
    }
    Ok(())
}

/// One fibrated candidate produced from an input edge before grouping by
/// rewritten source.
struct Candidate {
    address: credrank_core::EdgeAddress,
    reversed: bool,
    src: NodeAddress,
    dst: NodeAddress,
    weight: f64,
}

/// Phase 5: rewrite each input edge's epoch endpoints, group surviving
/// forward/reversed candidates by rewritten source, and distribute each
/// source's out-budget proportionally by weight.
#[tracing::instrument(level = "debug", skip_all)]
fn fibrate_contributions(state: &mut BuilderState, graph: &dyn WeightedGraphSource) -> Result<(), CredRankError> {
    let mut groups: BTreeMap<NodeAddress, Vec<Candidate>> = BTreeMap::new();

    for edge in graph.edges() {
        let (fwd_weight, bwd_weight) = graph.weights().edge_weight(&edge.address)?;

        if fwd_weight > 0.0 {
            let rewritten_src = rewrite_epoch_endpoint(
                &edge.src,
                edge.timestamp_ms,
                &state.boundaries,
                &state.participants_by_address,
            );
            let rewritten_dst = rewrite_epoch_endpoint(
                &edge.dst,
                edge.timestamp_ms,
                &state.boundaries,
                &state.participants_by_address,
            );
            groups.entry(rewritten_src.clone()).or_default().push(Candidate {
                address: edge.address.clone(),
                reversed: false,
                src: rewritten_src,
                dst: rewritten_dst,
                weight: fwd_weight,
            });
        }

        if bwd_weight > 0.0 {
            let rewritten_src = rewrite_epoch_endpoint(
                &edge.dst,
                edge.timestamp_ms,
                &state.boundaries,
                &state.participants_by_address,
            );
            let rewritten_dst = rewrite_epoch_endpoint(
                &edge.src,
                edge.timestamp_ms,
                &state.boundaries,
                &state.participants_by_address,
            );
            groups.entry(rewritten_src.clone()).or_default().push(Candidate {
                address: edge.address.clone(),
                reversed: true,
                src: rewritten_src,
                dst: rewritten_dst,
                weight: bwd_weight,
            });
        }
    }

    for (source, candidates) in groups {
        let total_weight: f64 = candidates.iter().map(|c| c.weight).sum();
        let budget = match classify_node(&source)? {
            NodeClass::UserEpoch => state.parameters.epoch_transition_remainder(),
            _ => state.parameters.base_contribution_budget(),
        };
        for candidate in candidates {
            let probability = (candidate.weight / total_weight) * budget;
            state.insert_edge(
                candidate.address,
                candidate.reversed,
                candidate.src,
                candidate.dst,
                probability,
            )?;
        }
    }
    Ok(())
}

/// Phase 6: close every non-seed node's out-mass to 1 with a radiation
/// edge, routed through the gadget matching the node's structural class.
#[tracing::instrument(level = "debug", skip_all)]
fn radiate(state: &mut BuilderState) -> Result<(), CredRankError> {
    let real_addresses: Vec<NodeAddress> = state.nodes.keys().cloned().collect();
    let accumulator_addresses: Vec<NodeAddress> = state
        .boundaries
        .iter()
        .map(|&epoch_start| NodeGadget::EpochAccumulator { epoch_start }.to_raw())
        .collect();

    for addr in real_addresses.into_iter().chain(accumulator_addresses) {
        let out_mass = state.out_mass_of(&addr);
        let probability = 1.0 - out_mass;
        let gadget = match classify_node(&addr)? {
            NodeClass::Base => EdgeGadget::RadiationContribution {
                source: addr.clone(),
            },
            NodeClass::UserEpoch => {
                let (owner, epoch_start) = credrank_core::gadget::parse_user_epoch(&addr)?;
                EdgeGadget::RadiationEpoch { owner, epoch_start }
            }
            NodeClass::EpochAccumulator => {
                let epoch_start = credrank_core::gadget::parse_epoch_accumulator(&addr)?;
                EdgeGadget::RadiationAccumulator { epoch_start }
            }
            NodeClass::Seed => unreachable!("seed is excluded from the radiation sweep"),
        };
        state.insert_edge(gadget.to_raw(), false, gadget.src(), gadget.dst(), probability)?;
    }
    Ok(())
}

/// Builds a [`MarkovProcessGraph`] from `args`, running all six phases in
/// sequence. Each phase establishes the invariants the next phase relies
/// on; see the module-level phase functions for the per-phase contract.
#[tracing::instrument(level = "info", skip_all)]
pub fn build(args: BuildArgs<'_>) -> Result<MarkovProcessGraph, CredRankError> {
    validate_parameters(&args.parameters)?;

    let participants_by_address: BTreeMap<NodeAddress, &Participant> = args
        .participants
        .iter()
        .map(|p| (p.address.clone(), p))
        .collect();

    let mut state = BuilderState {
        parameters: args.parameters,
        participants_by_address,
        nodes: BTreeMap::new(),
        edges: BTreeMap::new(),
        out_mass: BTreeMap::new(),
        boundaries: time_boundaries(args.intervals),
    };

    ingest_base_nodes(&mut state, args.weighted_graph)?;
    build_time_skeleton(&mut state, args.participants)?;
    mint(&mut state)?;
    fibrate_contributions(&mut state, args.weighted_graph)?;
    radiate(&mut state)?;

    Ok(MarkovProcessGraph {
        nodes: state.nodes,
        edges: state.edges,
        participants: args.participants.to_vec(),
        boundaries: state.boundaries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{InMemoryGraphSource, InputEdge};
    use credrank_core::{EdgeAddress, WeightConfig};
    use std::collections::BTreeMap as Map;

    fn base_params(alpha: f64, beta: f64, gf: f64, gb: f64) -> Parameters {
        Parameters {
            alpha,
            beta,
            gamma_forward: gf,
            gamma_backward: gb,
        }
    }

    fn one_participant() -> Participant {
        Participant {
            address: NodeAddress::from_parts(["github", "user", "alice"]).unwrap(),
            description: "alice".to_string(),
            id: ParticipantId::from("alice"),
        }
    }

    /// One base node weight 1, no input edges, one participant, two
    /// intervals (boundaries `[-inf, 0, 10, +inf]`): the sole base node
    /// receives all mint and radiates it all back (no contribution edges),
    /// and every participant boundary gets a payout edge at `beta`.
    #[test]
    fn minimal_graph_radiation_and_mint_invariants() {
        let base_addr = NodeAddress::from_parts(["github", "repo", "1"]).unwrap();
        let mut node_weights = Map::new();
        node_weights.insert(base_addr.clone(), 1.0);
        let source = InMemoryGraphSource {
            node_addresses: vec![base_addr.clone()],
            input_edges: vec![],
            weights: WeightConfig {
                node_weights,
                edge_weights: Map::new(),
                default_node_weight: 0.0,
                default_edge_weight: (1.0, 1.0),
            },
        };
        let participant = one_participant();
        let intervals = [Interval { start_time_ms: 0 }, Interval { start_time_ms: 10 }];
        let graph = build(BuildArgs {
            weighted_graph: &source,
            participants: std::slice::from_ref(&participant),
            intervals: &intervals,
            parameters: base_params(0.2, 0.3, 0.1, 0.1),
        })
        .unwrap();

        let seed_mint_key = graph
            .edges()
            .values()
            .find(|e| e.dst == base_addr && e.src == NodeGadget::Seed.to_raw())
            .unwrap();
        assert_eq!(seed_mint_key.transition_probability, 1.0);

        let base_radiation = graph
            .edges()
            .values()
            .find(|e| e.src == base_addr)
            .unwrap();
        assert_eq!(base_radiation.dst, NodeGadget::Seed.to_raw());
        assert_eq!(base_radiation.transition_probability, 1.0);

        let payout_edges: Vec<_> = graph
            .edges()
            .values()
            .filter(|e| (e.transition_probability - 0.3).abs() < 1e-9)
            .collect();
        // One payout edge per boundary (one participant, so boundary count
        // drives the payout-edge count directly).
        assert_eq!(payout_edges.len(), graph.boundaries().len());
    }

    /// A zero-weight base node yields NoMintingSource.
    #[test]
    fn zero_weight_yields_no_minting_source() {
        let base_addr = NodeAddress::from_parts(["github", "repo", "1"]).unwrap();
        let mut node_weights = Map::new();
        node_weights.insert(base_addr, 0.0);
        let source = InMemoryGraphSource {
            node_addresses: vec![NodeAddress::from_parts(["github", "repo", "1"]).unwrap()],
            input_edges: vec![],
            weights: WeightConfig {
                node_weights,
                edge_weights: Map::new(),
                default_node_weight: 0.0,
                default_edge_weight: (1.0, 1.0),
            },
        };
        let participant = one_participant();
        let intervals = [Interval { start_time_ms: 0 }];
        let err = build(BuildArgs {
            weighted_graph: &source,
            participants: std::slice::from_ref(&participant),
            intervals: &intervals,
            parameters: base_params(0.2, 0.3, 0.1, 0.1),
        })
        .unwrap_err();
        assert!(matches!(err, CredRankError::NoMintingSource));
    }

    /// Over-budget parameters yield InvalidParameter /
    /// ParameterBudgetExceeded.
    #[test]
    fn over_budget_parameters_rejected() {
        let source = InMemoryGraphSource::default();
        let err = build(BuildArgs {
            weighted_graph: &source,
            participants: &[],
            intervals: &[],
            parameters: base_params(0.5, 0.5, 0.1, 0.0),
        })
        .unwrap_err();
        assert!(matches!(err, CredRankError::ParameterBudgetExceeded { .. }));
    }

    /// A base node with a `core`-prefixed address is
    /// CoreNodeLeakage.
    #[test]
    fn core_prefixed_input_node_is_leakage() {
        let bad = NodeAddress::from_parts(["core", "FOO"]).unwrap();
        let source = InMemoryGraphSource {
            node_addresses: vec![bad],
            input_edges: vec![],
            weights: WeightConfig::default(),
        };
        let err = build(BuildArgs {
            weighted_graph: &source,
            participants: &[],
            intervals: &[],
            parameters: base_params(0.2, 0.3, 0.1, 0.1),
        })
        .unwrap_err();
        assert!(matches!(err, CredRankError::CoreNodeLeakage { .. }));
    }

    /// Two input edges from participant P to base node B
    /// straddling an interval boundary produce edges from two distinct
    /// user-epoch sources to B.
    #[test]
    fn fibration_splits_contributions_across_epochs() {
        let participant = one_participant();
        let base_addr = NodeAddress::from_parts(["github", "repo", "1"]).unwrap();
        let mut node_weights = Map::new();
        node_weights.insert(base_addr.clone(), 1.0);
        let edges = vec![
            InputEdge {
                address: EdgeAddress::from_parts(["github", "contrib", "1"]).unwrap(),
                src: participant.address.clone(),
                dst: base_addr.clone(),
                timestamp_ms: 1,
            },
            InputEdge {
                address: EdgeAddress::from_parts(["github", "contrib", "2"]).unwrap(),
                src: participant.address.clone(),
                dst: base_addr.clone(),
                timestamp_ms: 11,
            },
        ];
        let source = InMemoryGraphSource {
            node_addresses: vec![base_addr.clone()],
            input_edges: edges,
            weights: WeightConfig {
                node_weights,
                edge_weights: Map::new(),
                default_node_weight: 0.0,
                default_edge_weight: (1.0, 0.0),
            },
        };
        let intervals = [Interval { start_time_ms: 0 }, Interval { start_time_ms: 10 }];
        let graph = build(BuildArgs {
            weighted_graph: &source,
            participants: std::slice::from_ref(&participant),
            intervals: &intervals,
            parameters: base_params(0.2, 0.3, 0.1, 0.1),
        })
        .unwrap();

        let first_epoch = NodeGadget::UserEpoch {
            owner: participant.id.clone(),
            epoch_start: TimeBoundary::Finite(0),
        }
        .to_raw();
        let second_epoch = NodeGadget::UserEpoch {
            owner: participant.id.clone(),
            epoch_start: TimeBoundary::Finite(10),
        }
        .to_raw();

        assert!(graph
            .edges()
            .values()
            .any(|e| e.src == first_epoch && e.dst == base_addr && !e.reversed));
        assert!(graph
            .edges()
            .values()
            .any(|e| e.src == second_epoch && e.dst == base_addr && !e.reversed));
    }

    /// Every non-dangling input edge with both forward and backward weight
    /// positive contributes two distinct Markov edges (forward and
    /// reversed candidates are never merged), on top of the structural
    /// edges (seed-mint, payout, webbing, radiation).
    #[test]
    fn edge_count_matches_fibration_plus_structural_edges() {
        let participant = one_participant();
        let base_addr = NodeAddress::from_parts(["github", "repo", "1"]).unwrap();
        let mut node_weights = Map::new();
        node_weights.insert(base_addr.clone(), 1.0);
        let input_edges = vec![InputEdge {
            address: EdgeAddress::from_parts(["github", "contrib", "1"]).unwrap(),
            src: participant.address.clone(),
            dst: base_addr.clone(),
            timestamp_ms: 1,
        }];
        let source = InMemoryGraphSource {
            node_addresses: vec![base_addr.clone()],
            input_edges: input_edges.clone(),
            weights: WeightConfig {
                node_weights,
                edge_weights: Map::new(),
                default_node_weight: 0.0,
                default_edge_weight: (1.0, 1.0),
            },
        };
        let intervals = [Interval { start_time_ms: 0 }];
        let graph = build(BuildArgs {
            weighted_graph: &source,
            participants: std::slice::from_ref(&participant),
            intervals: &intervals,
            parameters: base_params(0.2, 0.3, 0.1, 0.1),
        })
        .unwrap();

        let fibrated_count = input_edges.len() * 2;
        let num_boundaries = graph.boundaries().len();
        // Per boundary: one payout and one radiation edge per user-epoch
        // node, plus one radiation edge for its accumulator. Per
        // consecutive boundary pair: forward + backward webbing. Plus one
        // seed-mint and one radiation edge for the sole base node.
        let structural_count = num_boundaries       // payout
            + num_boundaries                        // user-epoch radiation
            + num_boundaries                        // accumulator radiation
            + (num_boundaries.saturating_sub(1)) * 2 // webbing
            + 1                                     // seed-mint
            + 1; // base-node radiation
        assert_eq!(graph.edges().len(), fibrated_count + structural_count);
    }
}
