//! Deterministic fixed-point math and A* pathfinding for lockstep games.
//!
//! Everything here is integer-only. Two peers running the same sequence of
//! operations get the same bits back, whatever their CPU or compiler.

pub mod config;
pub mod fixed_math;
pub mod pathfinding;
pub mod profiling;

pub use config::{load_initial_config, InitialConfig};
pub use fixed_math::{ArithmeticMode, Fixed, FixedFault, FixedVec2};
pub use pathfinding::{AStar2D, AStarError, PointId};

// ============================================================================
// Profiling Macros
// ============================================================================

/// Log every 100th call of a counter when the perf_stats feature is enabled.
///
/// When the perf_stats feature is disabled this compiles to nothing. Even
/// the arguments are not evaluated.
///
/// # Example
/// ```ignore
/// profile_log!(self.searches, "search #{} expanded {}", self.searches, expanded);
/// ```
#[macro_export]
#[cfg(feature = "perf_stats")]
macro_rules! profile_log {
    ($counter:expr, $($arg:tt)*) => {
        if $counter % 100 == 0 {
            ::tracing::info!($($arg)*);
        }
    };
}

#[macro_export]
#[cfg(not(feature = "perf_stats"))]
macro_rules! profile_log {
    ($counter:expr, $($arg:tt)*) => {};
}
