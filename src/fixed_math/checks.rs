//! Arithmetic mode selection and fault bookkeeping.
//!
//! Overflow checks are an explicit setting rather than a side effect of the
//! build profile. A lockstep simulation picks its [`ArithmeticMode`] once at
//! startup (see [`crate::config::InitialConfig::apply`]) and every peer must
//! pick the same one.
//!
//! In [`ArithmeticMode::Checked`] an overflowing operation returns
//! [`Fixed::ARITHMETIC_OVERFLOW`](super::Fixed::ARITHMETIC_OVERFLOW) and
//! records a [`FixedFault`] that can be inspected with [`take_last_fault`].
//! In [`ArithmeticMode::Fast`] the raw integer operations wrap.
//!
//! Mode and fault records are thread-local: the simulation thread owns its
//! own numeric state and test threads do not observe each other.

use serde::{Deserialize, Serialize};
use std::cell::Cell;
use thiserror::Error;
use tracing::{debug, warn};

/// How `Fixed` operators treat results outside the representable range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArithmeticMode {
    /// Detect overflow, return the sentinel and record a fault.
    Checked,
    /// Skip range checks. Results wrap on overflow.
    Fast,
}

impl Default for ArithmeticMode {
    fn default() -> Self {
        if cfg!(any(debug_assertions, feature = "checked_math")) {
            ArithmeticMode::Checked
        } else {
            ArithmeticMode::Fast
        }
    }
}

/// A condition detected by a `Fixed` operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error)]
pub enum FixedFault {
    #[error("Fixed-point addition overflow")]
    AdditionOverflow,
    #[error("Fixed-point subtraction overflow")]
    SubtractionOverflow,
    #[error("Fixed-point multiplication overflow")]
    MultiplicationOverflow,
    #[error("Fixed-point division overflow")]
    DivisionOverflow,
    #[error("Fixed-point division by zero")]
    DivisionByZero,
    #[error("tan() of 90 degree angles is undefined")]
    TangentUndefined,
    #[error("pow() of zero with a negative exponent")]
    ZeroBaseNegativeExponent,
    #[error("pow() of a negative base with a fractional exponent is unsupported")]
    UnsupportedOperation,
    #[error("logarithm of a non-positive value")]
    LogarithmOfNonPositive,
}

impl FixedFault {
    /// Overflow-class faults are only raised in checked mode; domain faults
    /// are raised in every mode.
    pub fn is_overflow(self) -> bool {
        matches!(
            self,
            FixedFault::AdditionOverflow
                | FixedFault::SubtractionOverflow
                | FixedFault::MultiplicationOverflow
                | FixedFault::DivisionOverflow
                | FixedFault::DivisionByZero
        )
    }
}

thread_local! {
    static MODE: Cell<ArithmeticMode> = Cell::new(ArithmeticMode::default());
    static LAST_FAULT: Cell<Option<FixedFault>> = const { Cell::new(None) };
    static FAULT_COUNT: Cell<u64> = const { Cell::new(0) };
}

/// The mode used by `Fixed` operators on the current thread.
pub fn arithmetic_mode() -> ArithmeticMode {
    MODE.with(|m| m.get())
}

/// Select the mode for the current thread. Returns the previous mode.
pub fn set_arithmetic_mode(mode: ArithmeticMode) -> ArithmeticMode {
    MODE.with(|m| m.replace(mode))
}

#[inline]
pub fn checks_enabled() -> bool {
    arithmetic_mode() == ArithmeticMode::Checked
}

/// Most recent fault on this thread, clearing it.
pub fn take_last_fault() -> Option<FixedFault> {
    LAST_FAULT.with(|f| f.take())
}

/// Number of faults recorded on this thread since the last [`reset_faults`].
pub fn fault_count() -> u64 {
    FAULT_COUNT.with(|c| c.get())
}

pub fn reset_faults() {
    LAST_FAULT.with(|f| f.set(None));
    FAULT_COUNT.with(|c| c.set(0));
}

pub(crate) fn report(fault: FixedFault) {
    if fault.is_overflow() {
        // Hot path: keep the diagnostic cheap.
        debug!("{}", fault);
    } else {
        warn!("{}", fault);
    }
    LAST_FAULT.with(|f| f.set(Some(fault)));
    FAULT_COUNT.with(|c| c.set(c.get().saturating_add(1)));
}

/// Run `f` with `mode` active, restoring the previous mode afterwards.
pub fn with_arithmetic_mode<R>(mode: ArithmeticMode, f: impl FnOnce() -> R) -> R {
    struct Restore(ArithmeticMode);
    impl Drop for Restore {
        fn drop(&mut self) {
            set_arithmetic_mode(self.0);
        }
    }
    let _restore = Restore(set_arithmetic_mode(mode));
    f()
}
