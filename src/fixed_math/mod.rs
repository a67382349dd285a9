//! Deterministic fixed-point mathematics.
//!
//! [`Fixed`] is a Q16.16 number stored in an `i64`. Every operation, including
//! the transcendental ones, is integer-only so that all peers of a lockstep
//! simulation compute identical bits on any platform.

pub use checks::{
    arithmetic_mode, checks_enabled, fault_count, reset_faults, set_arithmetic_mode,
    take_last_fault, with_arithmetic_mode, ArithmeticMode, FixedFault,
};
pub use number::{Fixed, ParseFixedError};
pub use sqrt_pow::sqrt_64;
pub use vec2::FixedVec2;

pub mod fix16;

mod checks;
mod number;
mod sqrt_pow;
mod trig;
mod vec2;

#[cfg(test)]
mod tests;
