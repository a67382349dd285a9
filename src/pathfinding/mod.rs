mod astar;
mod cost;
mod graph;
mod snapshot;
mod types;


// ============================================================================
// PUBLIC API
// ============================================================================

pub use cost::{ComputeCost, Euclidean, EstimateCost};
pub use graph::{AStar2D, DEFAULT_SLOW_SEARCH_EXPANSIONS};
pub use snapshot::{GraphSnapshot, PointRecord, SegmentRecord, SnapshotError, SNAPSHOT_VERSION};
pub use types::{direction, AStarError, PointId, PointView, SearchStats};
