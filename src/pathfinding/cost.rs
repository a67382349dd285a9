//! Pluggable cost strategies.
//!
//! The heuristic and the edge cost are separate strategies so either can
//! be replaced on its own. Both default to Euclidean distance. Any
//! `Fn(PointView, PointView) -> Fixed + Send` closure works as either.

use super::types::PointView;
use crate::fixed_math::Fixed;

/// Heuristic from a point to the search destination, used for f-scores.
pub trait EstimateCost: Send {
    fn estimate_cost(&self, from: PointView, to: PointView) -> Fixed;
}

/// Cost of travelling the link `from -> to`, before the destination's
/// weight scale is applied.
pub trait ComputeCost: Send {
    fn compute_cost(&self, from: PointView, to: PointView) -> Fixed;
}

/// Straight-line distance between the two positions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Euclidean;

impl EstimateCost for Euclidean {
    fn estimate_cost(&self, from: PointView, to: PointView) -> Fixed {
        from.position.distance_to(to.position)
    }
}

impl ComputeCost for Euclidean {
    fn compute_cost(&self, from: PointView, to: PointView) -> Fixed {
        from.position.distance_to(to.position)
    }
}

impl<F> EstimateCost for F
where
    F: Fn(PointView, PointView) -> Fixed + Send,
{
    fn estimate_cost(&self, from: PointView, to: PointView) -> Fixed {
        self(from, to)
    }
}

impl<F> ComputeCost for F
where
    F: Fn(PointView, PointView) -> Fixed + Send,
{
    fn compute_cost(&self, from: PointView, to: PointView) -> Fixed {
        self(from, to)
    }
}
