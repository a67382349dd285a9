use super::checks::{self, FixedFault};
use super::fix16;
use super::number::FRAC_BITS;
use super::Fixed;

/// ln(2) in Q16.16.
const LN_2: i64 = 45426;

/// Binary digit-by-digit square root of a raw 64-bit value.
///
/// Negative input yields the negated root of the magnitude:
/// `sqrt_64(-x) == -sqrt_64(x)`.
pub fn sqrt_64(num: i64) -> i64 {
    if num == 0 {
        return 0;
    }

    let negative = num < 0;
    let mut num = num.unsigned_abs();
    let mut res: u64 = 0;
    let mut bit: u64 = 1 << 62;

    // Highest power of four <= num.
    while bit > num {
        bit >>= 2;
    }

    while bit != 0 {
        if num >= res + bit {
            num -= res + bit;
            res = (res >> 1) + bit;
        } else {
            res >>= 1;
        }
        bit >>= 2;
    }

    let res = res as i64;
    if negative {
        -res
    } else {
        res
    }
}

impl Fixed {
    /// Square root on the fixed-point grid.
    ///
    /// Not the mathematical square root for negative input: `sqrt(-x)`
    /// returns `-sqrt(x)`.
    pub fn sqrt(self) -> Fixed {
        Fixed::from_raw(sqrt_64(self.raw() << FRAC_BITS))
    }

    /// `self` raised to the integer part of `exponent` (floor), by squaring.
    ///
    /// A negative exponent inverts the base first; a zero base then records
    /// [`FixedFault::ZeroBaseNegativeExponent`] and returns the overflow
    /// sentinel. A sentinel operand is passed through.
    pub fn pow_integer(self, exponent: Fixed) -> Fixed {
        if self.is_overflow() || exponent.is_overflow() {
            return Fixed::ARITHMETIC_OVERFLOW;
        }

        let mut n = exponent.to_int();
        let mut base = self;
        if n < 0 {
            if base == Fixed::ZERO {
                checks::report(FixedFault::ZeroBaseNegativeExponent);
                return Fixed::ARITHMETIC_OVERFLOW;
            }
            base = Fixed::ONE / base;
            n = -n;
        }

        let mut result = Fixed::ONE;
        while n > 0 {
            if n & 1 == 1 {
                result *= base;
            }
            n >>= 1;
            if n > 0 {
                base *= base;
            }
        }
        result
    }

    /// General power.
    ///
    /// - `0^e` is zero for `e >= 0`; a negative `e` records
    ///   [`FixedFault::ZeroBaseNegativeExponent`] and returns the overflow
    ///   sentinel.
    /// - Integer exponents go through [`Fixed::pow_integer`], so negative
    ///   bases work there.
    /// - A fractional exponent on a negative base records
    ///   [`FixedFault::UnsupportedOperation`] and returns zero.
    /// - Otherwise `exp(ln(self) * exponent)`.
    ///
    /// A sentinel operand is passed through.
    pub fn pow(self, exponent: Fixed) -> Fixed {
        if self.is_overflow() || exponent.is_overflow() {
            return Fixed::ARITHMETIC_OVERFLOW;
        }

        if self == Fixed::ZERO {
            if exponent < Fixed::ZERO {
                checks::report(FixedFault::ZeroBaseNegativeExponent);
                return Fixed::ARITHMETIC_OVERFLOW;
            }
            return Fixed::ZERO;
        }

        if exponent < Fixed::ZERO {
            return (Fixed::ONE / self).pow(-exponent);
        }

        if exponent.is_integer() {
            if self < Fixed::ZERO {
                let magnitude = self.abs().pow_integer(exponent);
                return if exponent.to_int() & 1 == 1 {
                    -magnitude
                } else {
                    magnitude
                };
            }
            return self.pow_integer(exponent);
        }

        if self < Fixed::ZERO {
            checks::report(FixedFault::UnsupportedOperation);
            return Fixed::ZERO;
        }

        (self.ln() * exponent).exp()
    }

    /// `e^self`, saturating at `i32::MAX` raw and flushing tiny results to
    /// zero.
    pub fn exp(self) -> Fixed {
        let arg = self
            .raw()
            .clamp(fix16::MINIMUM as i64 + 1, fix16::MAXIMUM as i64 - 1) as i32;
        Fixed::from_raw(fix16::exp(arg) as i64)
    }

    /// Natural logarithm. Non-positive input records
    /// [`FixedFault::LogarithmOfNonPositive`] and returns the overflow
    /// sentinel.
    pub fn ln(self) -> Fixed {
        if self <= Fixed::ZERO {
            checks::report(FixedFault::LogarithmOfNonPositive);
            return Fixed::ARITHMETIC_OVERFLOW;
        }

        // ln(x) = ln(x / 2^k) + k * ln(2) once x leaves the kernel range.
        let mut raw = self.raw();
        let mut halvings: i64 = 0;
        while !fix16::in_range(raw) {
            raw >>= 1;
            halvings += 1;
        }

        let ln = fix16::log(raw as i32) as i64;
        Fixed::from_raw(ln + halvings * LN_2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqrt_of_perfect_squares() {
        assert_eq!(Fixed::from_int(4).sqrt(), Fixed::from_int(2));
        assert_eq!(Fixed::from_int(9).sqrt(), Fixed::from_int(3));
        assert_eq!(Fixed::ONE.sqrt(), Fixed::ONE);
        assert_eq!(Fixed::ZERO.sqrt(), Fixed::ZERO);
        assert_eq!(Fixed::from_f32(0.25).sqrt(), Fixed::HALF);
    }

    #[test]
    fn sqrt_of_negative_is_negated_root() {
        let four = Fixed::from_int(4);
        assert_eq!((-four).sqrt(), -four.sqrt());
        assert_eq!((-four).sqrt(), Fixed::from_int(-2));
    }

    #[test]
    fn sqrt_64_floors() {
        assert_eq!(sqrt_64(15), 3);
        assert_eq!(sqrt_64(16), 4);
        assert_eq!(sqrt_64(i64::MAX), 3_037_000_499);
    }

    #[test]
    fn pow_integer_by_squaring() {
        let two = Fixed::from_int(2);
        assert_eq!(two.pow_integer(Fixed::from_int(10)), Fixed::from_int(1024));
        assert_eq!(two.pow_integer(Fixed::ZERO), Fixed::ONE);
        assert_eq!(two.pow_integer(Fixed::from_int(-2)), Fixed::from_f32(0.25));
        assert_eq!(Fixed::from_int(-3).pow_integer(Fixed::from_int(3)), Fixed::from_int(-27));
    }

    #[test]
    fn pow_integer_does_not_square_past_the_last_bit() {
        checks::reset_faults();
        // Squaring 1_000_000 once more would overflow the raw product.
        let thousand = Fixed::from_int(1000);
        assert_eq!(thousand.pow_integer(Fixed::from_int(2)), Fixed::from_int(1_000_000));
        assert_eq!(checks::fault_count(), 0);
    }

    #[test]
    fn pow_dispatch() {
        checks::reset_faults();
        let two = Fixed::from_int(2);
        assert_eq!(Fixed::from_int(-2).pow(Fixed::from_int(3)), Fixed::from_int(-8));
        assert_eq!(Fixed::from_int(-2).pow(two), Fixed::from_int(4));
        assert_eq!(two.pow(Fixed::from_int(-2)), Fixed::from_f32(0.25));
        assert_eq!(Fixed::ZERO.pow(two), Fixed::ZERO);
        assert_eq!(checks::fault_count(), 0);

        let root_two = two.pow(Fixed::HALF);
        assert!((root_two.raw() - 92682).abs() < 100, "2^0.5 = {}", root_two);
    }

    #[test]
    fn pow_domain_errors() {
        checks::reset_faults();
        assert_eq!(Fixed::ZERO.pow(Fixed::NEG_ONE), Fixed::ARITHMETIC_OVERFLOW);
        assert_eq!(checks::take_last_fault(), Some(FixedFault::ZeroBaseNegativeExponent));

        assert_eq!(Fixed::from_int(-2).pow(Fixed::HALF), Fixed::ZERO);
        assert_eq!(checks::take_last_fault(), Some(FixedFault::UnsupportedOperation));
    }

    #[test]
    fn pow_integer_zero_base_negative_exponent_in_fast_mode() {
        checks::with_arithmetic_mode(checks::ArithmeticMode::Fast, || {
            checks::reset_faults();
            assert_eq!(
                Fixed::ZERO.pow_integer(Fixed::NEG_ONE),
                Fixed::ARITHMETIC_OVERFLOW
            );
            assert_eq!(
                checks::take_last_fault(),
                Some(FixedFault::ZeroBaseNegativeExponent)
            );
        });
    }

    #[test]
    fn pow_passes_sentinel_through() {
        let sentinel = Fixed::ARITHMETIC_OVERFLOW;
        assert_eq!(Fixed::TWO.pow(sentinel), sentinel);
        assert_eq!(sentinel.pow(Fixed::TWO), sentinel);
        assert_eq!(Fixed::TWO.pow_integer(sentinel), sentinel);
        checks::with_arithmetic_mode(checks::ArithmeticMode::Fast, || {
            assert_eq!(Fixed::TWO.pow(sentinel), sentinel);
        });
    }

    #[test]
    fn ln_of_large_values_uses_halving() {
        let big = Fixed::from_int(1 << 20);
        let expected = Fixed::from_f64(20.0 * std::f64::consts::LN_2);
        assert!((big.ln().raw() - expected.raw()).abs() < 200, "ln(2^20) = {}", big.ln());
    }
}
