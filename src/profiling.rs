//! Timing hooks for hot paths.
//!
//! `#[profile]` expands to a drop-guard timer only under the `perf_stats`
//! feature; see [`crate::profile_log`] for per-call sampling.

pub use lockstep2d_macros::profile;
