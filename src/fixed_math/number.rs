use fixed::types::I48F16;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{
    Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Rem, RemAssign, Shl, Shr, Sub, SubAssign,
};
use std::str::FromStr;
use thiserror::Error;

use super::checks::{self, FixedFault};

/// Lowest valid raw value. `i64::MIN` cannot be negated in two's complement
/// and is reserved for [`Fixed::ARITHMETIC_OVERFLOW`].
pub(crate) const EFFECTIVE_MIN: i64 = i64::MIN + 1;

pub(crate) const FRAC_BITS: u32 = 16;
const FRAC_MASK: i64 = 0xFFFF;

/// Powers of ten for decimal parsing. Seven fractional digits are kept.
const TENS: [i64; 8] = [1, 10, 100, 1_000, 10_000, 100_000, 1_000_000, 10_000_000];
const MAX_FRACTION_DIGITS: usize = TENS.len() - 1;

/// Q16.16 fixed-point number stored in 64 bits.
///
/// The raw value `v` represents `v / 65536`. The raw integer is also the wire
/// format: serde emits it as a plain `i64` so that peers never exchange a
/// decoded float.
///
/// Operators honour the thread's [`ArithmeticMode`](super::ArithmeticMode):
/// in checked mode a result outside `[i64::MIN + 1, i64::MAX]` yields
/// [`Fixed::ARITHMETIC_OVERFLOW`] and records a [`FixedFault`]. Use the
/// `checked_*` methods for an `Option` regardless of mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Fixed(i64);

impl Fixed {
    pub const ZERO: Fixed = Fixed(0);
    pub const ONE: Fixed = Fixed(65536);
    pub const HALF: Fixed = Fixed(32768);
    pub const TWO: Fixed = Fixed(131072);
    pub const NEG_ONE: Fixed = Fixed(-65536);
    pub const PI: Fixed = Fixed(205887);
    pub const TAU: Fixed = Fixed(411774);
    pub const PI_DIV_2: Fixed = Fixed(102943);
    pub const PI_DIV_4: Fixed = Fixed(51472);
    pub const EPSILON: Fixed = Fixed(1);
    pub const DEG_180: Fixed = Fixed(180 << FRAC_BITS);
    pub const MAX: Fixed = Fixed(i64::MAX);
    pub const MIN: Fixed = Fixed(EFFECTIVE_MIN);
    /// Sentinel returned by failed operations in checked mode.
    pub const ARITHMETIC_OVERFLOW: Fixed = Fixed(i64::MIN);

    #[inline]
    pub const fn from_raw(raw: i64) -> Fixed {
        Fixed(raw)
    }

    #[inline]
    pub const fn from_int(value: i64) -> Fixed {
        Fixed(value << FRAC_BITS)
    }

    /// Truncates toward zero after scaling. Only for tooling and tests: a
    /// simulation must never derive state from floats.
    pub fn from_f32(value: f32) -> Fixed {
        Fixed((value * 65536.0) as i64)
    }

    pub fn from_f64(value: f64) -> Fixed {
        Fixed((value * 65536.0) as i64)
    }

    /// Lenient decimal parse: invalid input yields [`Fixed::ZERO`].
    pub fn from_string(value: &str) -> Fixed {
        value.parse().unwrap_or(Fixed::ZERO)
    }

    #[inline]
    pub const fn raw(self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn is_overflow(self) -> bool {
        self.0 == i64::MIN
    }

    /// Integer part, rounding toward negative infinity.
    #[inline]
    pub const fn to_int(self) -> i64 {
        self.0 >> FRAC_BITS
    }

    pub fn to_f32(self) -> f32 {
        self.0 as f32 / 65536.0
    }

    pub fn to_f64(self) -> f64 {
        self.0 as f64 / 65536.0
    }

    #[inline]
    pub const fn floor(self) -> Fixed {
        Fixed(self.0 & !FRAC_MASK)
    }

    pub fn ceil(self) -> Fixed {
        if self.0 & FRAC_MASK != 0 {
            (self + Fixed::ONE).floor()
        } else {
            self
        }
    }

    pub fn round(self) -> Fixed {
        (self + Fixed::HALF).floor()
    }

    /// Fractional bits, always non-negative (`x - x.floor()`).
    #[inline]
    pub const fn fract(self) -> Fixed {
        Fixed(self.0 & FRAC_MASK)
    }

    #[inline]
    pub const fn is_integer(self) -> bool {
        self.0 & FRAC_MASK == 0
    }

    #[inline]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn abs(self) -> Fixed {
        if self.0 < 0 {
            Fixed(self.0.wrapping_neg())
        } else {
            self
        }
    }

    pub const fn sign(self) -> Fixed {
        if self.0 < 0 {
            Fixed::NEG_ONE
        } else if self.0 > 0 {
            Fixed::ONE
        } else {
            Fixed::ZERO
        }
    }

    /// Step toward `to` by at most `delta`.
    pub fn move_toward(self, to: Fixed, delta: Fixed) -> Fixed {
        let diff = to - self;
        if diff.abs() <= delta {
            to
        } else {
            let direction = if diff < Fixed::ZERO { Fixed::NEG_ONE } else { Fixed::ONE };
            self + direction * delta
        }
    }

    /// Equality within `EPSILON * |a|`, never tighter than one raw unit.
    pub fn is_equal_approx(a: Fixed, b: Fixed) -> bool {
        if a == b {
            return true;
        }
        let mut tolerance = Fixed::EPSILON * a.abs();
        if tolerance < Fixed::EPSILON {
            tolerance = Fixed::EPSILON;
        }
        (a - b).abs() < tolerance
    }

    pub fn is_equal_approx_with(a: Fixed, b: Fixed, tolerance: Fixed) -> bool {
        if a == b {
            return true;
        }
        (a - b).abs() < tolerance
    }

    pub fn deg_to_rad(self) -> Fixed {
        self * Fixed::PI / Fixed::DEG_180
    }

    pub fn rad_to_deg(self) -> Fixed {
        self * Fixed::DEG_180 / Fixed::PI
    }

    pub const fn checked_add(self, rhs: Fixed) -> Option<Fixed> {
        let (a, b) = (self.0, rhs.0);
        if b > 0 && a > i64::MAX - b {
            return None;
        }
        if b < 0 && a < EFFECTIVE_MIN - b {
            return None;
        }
        Some(Fixed(a + b))
    }

    pub const fn checked_sub(self, rhs: Fixed) -> Option<Fixed> {
        let (a, b) = (self.0, rhs.0);
        if b < 0 && a > i64::MAX + b {
            return None;
        }
        if b > 0 && a < EFFECTIVE_MIN + b {
            return None;
        }
        Some(Fixed(a - b))
    }

    /// `(a * b) >> 16` where the raw product itself must fit in 64 bits.
    ///
    /// The range is therefore narrower than the Q16.16 range: both operands'
    /// raw values multiplied may not exceed `i64::MAX`.
    pub const fn checked_mul(self, rhs: Fixed) -> Option<Fixed> {
        let (a, b) = (self.0, rhs.0);
        if a == -1 && b == i64::MAX {
            return None;
        }
        if b == -1 && a == i64::MIN {
            return None;
        }
        if b > 0 && (a > i64::MAX / b || a < EFFECTIVE_MIN / b) {
            return None;
        }
        if b < 0 && (a < i64::MAX / b || a > EFFECTIVE_MIN / b) {
            return None;
        }
        Some(Fixed((a * b) >> FRAC_BITS))
    }

    pub fn checked_div(self, rhs: Fixed) -> Option<Fixed> {
        self.try_div(rhs).ok()
    }

    pub fn checked_rem(self, rhs: Fixed) -> Option<Fixed> {
        if rhs.0 == 0 {
            None
        } else {
            Some(Fixed(self.0.wrapping_rem(rhs.0)))
        }
    }

    fn try_div(self, rhs: Fixed) -> Result<Fixed, FixedFault> {
        let (a, b) = (self.0, rhs.0);
        if b == 0 {
            return Err(FixedFault::DivisionByZero);
        }
        if a == -1 && b == i64::MAX {
            return Err(FixedFault::DivisionOverflow);
        }
        if b == -1 && a == i64::MIN {
            return Err(FixedFault::DivisionOverflow);
        }
        // The dividend is pre-shifted; it has to survive the shift.
        let shifted = match a.checked_mul(1 << FRAC_BITS) {
            Some(shifted) if shifted != i64::MIN => shifted,
            _ => return Err(FixedFault::DivisionOverflow),
        };
        Ok(Fixed(shifted / b))
    }
}

#[inline]
fn overflow(fault: FixedFault) -> Fixed {
    checks::report(fault);
    Fixed::ARITHMETIC_OVERFLOW
}

impl Add for Fixed {
    type Output = Fixed;

    #[inline]
    fn add(self, rhs: Fixed) -> Fixed {
        if !checks::checks_enabled() {
            return Fixed(self.0.wrapping_add(rhs.0));
        }
        self.checked_add(rhs)
            .unwrap_or_else(|| overflow(FixedFault::AdditionOverflow))
    }
}

impl Sub for Fixed {
    type Output = Fixed;

    #[inline]
    fn sub(self, rhs: Fixed) -> Fixed {
        if !checks::checks_enabled() {
            return Fixed(self.0.wrapping_sub(rhs.0));
        }
        self.checked_sub(rhs)
            .unwrap_or_else(|| overflow(FixedFault::SubtractionOverflow))
    }
}

impl Mul for Fixed {
    type Output = Fixed;

    #[inline]
    fn mul(self, rhs: Fixed) -> Fixed {
        if !checks::checks_enabled() {
            return Fixed(self.0.wrapping_mul(rhs.0) >> FRAC_BITS);
        }
        self.checked_mul(rhs)
            .unwrap_or_else(|| overflow(FixedFault::MultiplicationOverflow))
    }
}

impl Div for Fixed {
    type Output = Fixed;

    /// # Panics
    /// Dividing by zero in [`ArithmeticMode::Fast`](super::ArithmeticMode::Fast)
    /// panics; checked mode returns the sentinel instead.
    #[inline]
    fn div(self, rhs: Fixed) -> Fixed {
        if !checks::checks_enabled() {
            if rhs.0 == 0 {
                panic!("{}", FixedFault::DivisionByZero);
            }
            return Fixed((self.0 << FRAC_BITS).wrapping_div(rhs.0));
        }
        self.try_div(rhs).unwrap_or_else(overflow)
    }
}

impl Rem for Fixed {
    type Output = Fixed;

    /// Remainder of the raw values; the sign follows the dividend.
    #[inline]
    fn rem(self, rhs: Fixed) -> Fixed {
        if rhs.0 == 0 {
            if !checks::checks_enabled() {
                panic!("{}", FixedFault::DivisionByZero);
            }
            return overflow(FixedFault::DivisionByZero);
        }
        Fixed(self.0.wrapping_rem(rhs.0))
    }
}

impl Neg for Fixed {
    type Output = Fixed;

    #[inline]
    fn neg(self) -> Fixed {
        Fixed(self.0.wrapping_neg())
    }
}

impl Shl<u32> for Fixed {
    type Output = Fixed;

    #[inline]
    fn shl(self, rhs: u32) -> Fixed {
        Fixed(self.0 << rhs)
    }
}

impl Shr<u32> for Fixed {
    type Output = Fixed;

    #[inline]
    fn shr(self, rhs: u32) -> Fixed {
        Fixed(self.0 >> rhs)
    }
}

macro_rules! assign_op {
    ($trait:ident, $method:ident, $op:tt) => {
        impl $trait for Fixed {
            #[inline]
            fn $method(&mut self, rhs: Fixed) {
                *self = *self $op rhs;
            }
        }
    };
}

assign_op!(AddAssign, add_assign, +);
assign_op!(SubAssign, sub_assign, -);
assign_op!(MulAssign, mul_assign, *);
assign_op!(DivAssign, div_assign, /);
assign_op!(RemAssign, rem_assign, %);

impl From<I48F16> for Fixed {
    fn from(value: I48F16) -> Self {
        Fixed(value.to_bits())
    }
}

impl From<Fixed> for I48F16 {
    fn from(value: Fixed) -> Self {
        I48F16::from_bits(value.0)
    }
}

impl fmt::Display for Fixed {
    /// Integer part, then up to seven fractional digits with trailing zeros
    /// stripped.
    ///
    /// Negative values print sign and magnitude (`-1.5`), not the floored
    /// integer plus masked fraction (`-2.5`) of the libfixmath-style format.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let magnitude = self.0.unsigned_abs();
        if self.0 < 0 {
            f.write_str("-")?;
        }
        write!(f, "{}", magnitude >> FRAC_BITS)?;

        let mut decimal = magnitude & FRAC_MASK as u64;
        if decimal != 0 {
            decimal = (decimal * 10_000_000) >> FRAC_BITS;

            let mut left_zero_checker = 1_000_000;
            let mut left_zeros = 0;
            while left_zero_checker > decimal {
                left_zero_checker /= 10;
                left_zeros += 1;
            }

            while decimal % 10 == 0 {
                decimal /= 10;
            }

            write!(f, ".{}{}", "0".repeat(left_zeros), decimal)?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ParseFixedError {
    #[error("cannot parse a fixed-point number from an empty string")]
    Empty,
    #[error("invalid digit in fixed-point literal {0:?}")]
    InvalidDigit(String),
    #[error("fixed-point literal {0:?} is out of range")]
    OutOfRange(String),
}

impl FromStr for Fixed {
    type Err = ParseFixedError;

    /// Parses `[+-]digits[.digits]`. Fractional digits past the seventh are
    /// truncated.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (negative, body) = match s.as_bytes().first() {
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            _ => (false, s),
        };
        let (int_part, frac_part) = body.split_once('.').unwrap_or((body, ""));

        if int_part.is_empty() && frac_part.is_empty() {
            return Err(ParseFixedError::Empty);
        }
        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(int_part) || !all_digits(frac_part) {
            return Err(ParseFixedError::InvalidDigit(s.to_string()));
        }

        let whole: i64 = if int_part.is_empty() {
            0
        } else {
            int_part
                .parse()
                .map_err(|_| ParseFixedError::OutOfRange(s.to_string()))?
        };
        if whole > i64::MAX >> FRAC_BITS {
            return Err(ParseFixedError::OutOfRange(s.to_string()));
        }
        let mut value = whole << FRAC_BITS;

        let digits = &frac_part[..frac_part.len().min(MAX_FRACTION_DIGITS)];
        if !digits.is_empty() {
            // At most seven digits, cannot fail.
            let fraction: i64 = digits
                .parse()
                .map_err(|_| ParseFixedError::InvalidDigit(s.to_string()))?;
            value += (fraction << FRAC_BITS) / TENS[digits.len()];
        }

        Ok(Fixed(if negative { -value } else { value }))
    }
}
