use crate::fixed_math::{Fixed, FixedVec2};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

/// Caller-chosen point identifier. Always non-negative inside a graph.
pub type PointId = i64;

/// Sorted neighbour id list. Most navigation points have four links or fewer.
pub(super) type NeighbourList = SmallVec<[PointId; 4]>;

/// Direction bits of a segment, relative to its canonical `(u, v)` order.
pub mod direction {
    pub const NONE: u8 = 0;
    /// `u -> v`
    pub const FORWARD: u8 = 1;
    /// `v -> u`
    pub const BACKWARD: u8 = 2;
    pub const BIDIRECTIONAL: u8 = FORWARD | BACKWARD;
}

/// Canonical segment key for a link `from -> to`, together with the
/// direction bit that link occupies.
#[inline]
pub(super) fn segment_key(from: PointId, to: PointId) -> ((PointId, PointId), u8) {
    if from < to {
        ((from, to), direction::FORWARD)
    } else {
        ((to, from), direction::BACKWARD)
    }
}

/// Rejected graph operation. The graph is left unchanged.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum AStarError {
    #[error("Can't use a point with negative id: {0}.")]
    NegativeId(PointId),
    #[error("Can't use a weight scale less than one: {0}.")]
    WeightScaleTooSmall(Fixed),
    #[error("Point with id: {0} doesn't exist.")]
    PointNotFound(PointId),
    #[error("Can't connect point with id: {0} to itself.")]
    SelfConnection(PointId),
    #[error("New capacity must be greater than 0 and at least the current capacity: {current}, new was: {requested}.")]
    InvalidCapacity { requested: usize, current: usize },
    #[error("Segment ({u}, {v}) has invalid direction bits {direction}.")]
    InvalidSegment { u: PointId, v: PointId, direction: u8 },
}

/// Counters from the most recent search.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    /// Points popped from the open list and closed.
    pub expanded_points: usize,
    /// Points pushed onto the open list, the start included.
    pub pushed_points: usize,
    pub found_route: bool,
}

/// Read-only view of a point handed to cost strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PointView {
    pub id: PointId,
    pub position: FixedVec2,
    pub weight_scale: Fixed,
}

#[derive(Clone, Debug)]
pub(super) struct Point {
    pub id: PointId,
    pub position: FixedVec2,
    pub weight_scale: Fixed,
    pub enabled: bool,

    /// Points this one links to.
    pub neighbours: NeighbourList,
    /// Points linking to this one without a link back.
    pub unlinked_neighbours: NeighbourList,

    // Search state, valid only when the pass stamps match the graph's pass.
    pub prev_point: Option<usize>,
    pub g_score: Fixed,
    pub f_score: Fixed,
    pub open_pass: u64,
    pub closed_pass: u64,
}

impl Point {
    pub fn new(id: PointId, position: FixedVec2, weight_scale: Fixed) -> Self {
        Self {
            id,
            position,
            weight_scale,
            enabled: true,
            neighbours: NeighbourList::new(),
            unlinked_neighbours: NeighbourList::new(),
            prev_point: None,
            g_score: Fixed::ZERO,
            f_score: Fixed::ZERO,
            open_pass: 0,
            closed_pass: 0,
        }
    }

    pub fn view(&self) -> PointView {
        PointView {
            id: self.id,
            position: self.position,
            weight_scale: self.weight_scale,
        }
    }
}

/// Insert into a sorted list, ignoring duplicates.
pub(super) fn insert_sorted(list: &mut NeighbourList, id: PointId) {
    if let Err(pos) = list.binary_search(&id) {
        list.insert(pos, id);
    }
}

pub(super) fn remove_sorted(list: &mut NeighbourList, id: PointId) {
    if let Ok(pos) = list.binary_search(&id) {
        list.remove(pos);
    }
}
