//! Input types shared by the graph builder: scoring parameters, time
//! boundaries, intervals, and participants.

use serde::{Deserialize, Serialize};

use crate::address::NodeAddress;
use crate::error::CredRankError;

/// Stable opaque identifier for a scoring participant, used inside
/// user-epoch addresses instead of the participant's full node address so
/// that renaming a participant's underlying address does not change its
/// epoch-node addresses.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(pub String);

impl std::fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(s: &str) -> Self {
        ParticipantId(s.to_string())
    }
}

impl From<String> for ParticipantId {
    fn from(s: String) -> Self {
        ParticipantId(s)
    }
}

/// A scoring participant. `address` identifies the original scoring node in
/// the input graph (absent from the Markov graph itself); `id` is the
/// stable identifier used inside epoch-node addresses.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub address: NodeAddress,
    pub description: String,
    pub id: ParticipantId,
}

/// One contiguous scoring interval, identified by its start time. The
/// interval sequence `[i0, i1, ..., ik]` produces time boundaries
/// `[-inf, i0.start_time_ms, i1.start_time_ms, ..., ik.start_time_ms, +inf]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interval {
    pub start_time_ms: i64,
}

/// A time boundary: either a finite millisecond timestamp or one of the two
/// sentinel values bracketing all real time. Ordered so that
/// `NegInfinity < Finite(_) < PosInfinity`, and `Finite` values order by
/// their timestamp — exactly the ordering the derive produces by comparing
/// variant discriminant first, then payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimeBoundary {
    NegInfinity,
    Finite(i64),
    PosInfinity,
}

impl TimeBoundary {
    /// The millisecond value used inside structural addresses and the
    /// serialized `finiteEpochBoundaries` array. Sentinels have no such
    /// representation and are stripped before serialization.
    pub fn finite_millis(&self) -> Option<i64> {
        match self {
            TimeBoundary::Finite(ms) => Some(*ms),
            _ => None,
        }
    }
}

/// Builds the full boundary sequence `[-inf, ...finite, +inf]` from an
/// ordered slice of intervals. Does not sort or deduplicate: intervals are
/// required to already be contiguous and ordered.
pub fn time_boundaries(intervals: &[Interval]) -> Vec<TimeBoundary> {
    let mut boundaries = Vec::with_capacity(intervals.len() + 2);
    boundaries.push(TimeBoundary::NegInfinity);
    boundaries.extend(intervals.iter().map(|i| TimeBoundary::Finite(i.start_time_ms)));
    boundaries.push(TimeBoundary::PosInfinity);
    boundaries
}

/// The four non-negative teleportation/payout/webbing probabilities that
/// tune the graph builder. `alpha + beta + gamma_forward + gamma_backward`
/// must not exceed 1.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameters {
    /// Teleportation probability from any organic node to seed.
    pub alpha: f64,
    /// Payout probability from a user-epoch node to its accumulator.
    pub beta: f64,
    /// Forward temporal webbing probability.
    pub gamma_forward: f64,
    /// Backward temporal webbing probability.
    pub gamma_backward: f64,
}

impl Parameters {
    /// Checks each field lies in `[0, 1]` and their sum does not exceed 1.
    pub fn validate(&self) -> Result<(), CredRankError> {
        for (field, value) in [
            ("alpha", self.alpha),
            ("beta", self.beta),
            ("gammaForward", self.gamma_forward),
            ("gammaBackward", self.gamma_backward),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(CredRankError::InvalidParameter { field, value });
            }
        }
        let sum = self.alpha + self.beta + self.gamma_forward + self.gamma_backward;
        if sum > 1.0 {
            return Err(CredRankError::ParameterBudgetExceeded { sum });
        }
        Ok(())
    }

    /// `1 - alpha - beta - gammaForward - gammaBackward`: the out-budget
    /// apportioned across a user-epoch node's contribution edges.
    pub fn epoch_transition_remainder(&self) -> f64 {
        1.0 - self.alpha - self.beta - self.gamma_forward - self.gamma_backward
    }

    /// `1 - alpha`: the out-budget apportioned across a base node's
    /// contribution edges.
    pub fn base_contribution_budget(&self) -> f64 {
        1.0 - self.alpha
    }
}
