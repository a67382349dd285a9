//! Trigonometry on [`Fixed`].
//!
//! `sin`/`cos` use a fifth-order curve fit (worst-case relative error about
//! 0.07% over `[-PI, PI]`). The approximation error is part of the contract:
//! every peer must compute the same bits, so this is not a place to swap in a
//! "better" sine.
//!
//! The inverse functions delegate to the Q16.16 kernels in [`super::fix16`],
//! reducing arguments that fall outside the kernel range first.

use super::checks::{self, FixedFault};
use super::fix16;
use super::Fixed;

impl Fixed {
    pub fn sin(self) -> Fixed {
        // [0, 2PI] -> [0, 4]
        let mut x = self % Fixed::TAU;
        x = x / Fixed::PI_DIV_2;

        // One rotation either way, so [-4, 4].
        if x < Fixed::ZERO {
            x += Fixed::from_int(4);
        }

        let mut sign = Fixed::ONE;
        if x > Fixed::TWO {
            // [0, 2]
            sign = Fixed::NEG_ONE;
            x -= Fixed::TWO;
        }

        if x > Fixed::ONE {
            // [0, 1]
            x = Fixed::TWO - x;
        }

        let x2 = x * x;
        (sign * x
            * (Fixed::PI
                - x2 * (Fixed::TAU - Fixed::from_int(5) - x2 * (Fixed::PI - Fixed::from_int(3)))))
            >> 1
    }

    pub fn cos(self) -> Fixed {
        (self + Fixed::PI_DIV_2).sin()
    }

    /// Returns [`Fixed::ZERO`] and records [`FixedFault::TangentUndefined`]
    /// where the cosine is zero.
    pub fn tan(self) -> Fixed {
        let cx = self.cos();
        if cx == Fixed::ZERO {
            checks::report(FixedFault::TangentUndefined);
            return Fixed::ZERO;
        }
        self.sin() / cx
    }

    pub fn asin(self) -> Fixed {
        if self == Fixed::ONE {
            // The kernel divides by zero at exactly one.
            return Fixed::PI_DIV_2;
        }
        Fixed::from_raw(fix16::asin(self.kernel_arg()) as i64)
    }

    pub fn acos(self) -> Fixed {
        if self == Fixed::ONE {
            // The kernel divides by zero at exactly one.
            return Fixed::ZERO;
        }
        Fixed::from_raw(fix16::acos(self.kernel_arg()) as i64)
    }

    pub fn atan(self) -> Fixed {
        Fixed::from_raw(fix16::atan(self.kernel_arg()) as i64)
    }

    /// Angle of the vector `(x, self)`, i.e. `atan2(y = self, x)`.
    pub fn atan2(self, x: Fixed) -> Fixed {
        let y = self;
        if y == Fixed::ZERO && x == Fixed::ZERO {
            return Fixed::ZERO;
        }
        if fix16::in_range(y.raw()) && fix16::in_range(x.raw()) {
            return Fixed::from_raw(fix16::atan2(y.raw() as i32, x.raw() as i32) as i64);
        }

        // Either operand out of the i32 range sends both through the
        // reduction, not only `y`.
        let y = y.raw() % Fixed::PI.raw();
        let x = x.raw() % Fixed::PI.raw();
        Fixed::from_raw(fix16::atan2(y as i32, x as i32) as i64)
    }

    /// Raw value for a single-argument kernel, reduced modulo TAU when it
    /// does not fit in 32 bits.
    fn kernel_arg(self) -> i32 {
        if fix16::in_range(self.raw()) {
            self.raw() as i32
        } else {
            (self.raw() % Fixed::TAU.raw()) as i32
        }
    }
}
