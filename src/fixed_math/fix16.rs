//! 32-bit Q16.16 kernels backing the inverse trigonometric, exponential and
//! logarithm functions of [`Fixed`](super::Fixed).
//!
//! These reproduce the rounding and overflow behaviour of the classic
//! `fix16_t` library bit for bit, including its known defects (for example
//! `asin(1)` divides by zero internally). Callers must only pass values in
//! the open range `(i32::MIN, i32::MAX)`.

pub type Fix16 = i32;

pub const ONE: Fix16 = 0x0001_0000;
pub const PI: Fix16 = 205887;
pub const E: Fix16 = 178145;
pub const MAXIMUM: Fix16 = i32::MAX;
pub const MINIMUM: Fix16 = i32::MIN;
pub const OVERFLOW: Fix16 = i32::MIN;

const PI_DIV_4: Fix16 = 0x0000_C90F;
const THREE_PI_DIV_4: Fix16 = 0x0002_5B2F;
const E_TO_FOURTH: Fix16 = 3_578_144;

#[inline]
pub const fn from_int(value: i32) -> Fix16 {
    value.wrapping_mul(ONE)
}

/// Whether a 64-bit raw value lies strictly inside the kernel range.
#[inline]
pub fn in_range(raw: i64) -> bool {
    raw < MAXIMUM as i64 && raw > MINIMUM as i64
}

/// Rounded multiply. Returns [`OVERFLOW`] when the result does not fit.
pub fn mul(a: Fix16, b: Fix16) -> Fix16 {
    let mut product = a as i64 * b as i64;

    // The upper 17 bits must all be equal to the sign bit.
    let upper = (product >> 47) as u32;
    if product < 0 {
        if !upper != 0 {
            return OVERFLOW;
        }
        product -= 1;
    } else if upper != 0 {
        return OVERFLOW;
    }

    let result = (product >> 16) as i32;
    result.wrapping_add(((product & 0x8000) >> 15) as i32)
}

/// Rounded divide. A zero divisor yields [`MINIMUM`].
pub fn div(a: Fix16, b: Fix16) -> Fix16 {
    if b == 0 {
        return MINIMUM;
    }

    let remainder = a.unsigned_abs() as u64;
    let divider = b.unsigned_abs() as u64;

    // One extra bit of quotient for rounding.
    let quotient = (remainder << 17) / divider;
    if quotient > u32::MAX as u64 {
        return OVERFLOW;
    }

    let mut result = ((quotient + 1) >> 1) as u32 as i32;
    if (a ^ b) < 0 {
        if result == MINIMUM {
            return OVERFLOW;
        }
        result = -result;
    }
    result
}

/// Rounded square root; `sqrt(-x) == -sqrt(x)`.
pub fn sqrt(value: Fix16) -> Fix16 {
    let negative = value < 0;
    let mut num = value.unsigned_abs();
    let mut result: u32 = 0;

    let mut bit: u32 = if num & 0xFFF0_0000 != 0 { 1 << 30 } else { 1 << 18 };
    while bit > num {
        bit >>= 2;
    }

    // Two passes keep every intermediate in 32 bits: the first yields the
    // top 24 bits of the answer, the second the low 8.
    for pass in 0..2 {
        while bit != 0 {
            if num >= result + bit {
                num -= result + bit;
                result = (result >> 1) + bit;
            } else {
                result >>= 1;
            }
            bit >>= 2;
        }

        if pass == 0 {
            if num > 65535 {
                // num = a - (result + 0.5)^2 = num - result - 0.5
                num -= result;
                num = (num << 16).wrapping_sub(0x8000);
                result = (result << 16) + 0x8000;
            } else {
                num <<= 16;
                result <<= 16;
            }
            bit = 1 << 14;
        }
    }

    if num > result {
        result += 1;
    }

    if negative {
        (result as i32).wrapping_neg()
    } else {
        result as i32
    }
}

/// Third-order polynomial arctangent of `y / x`.
pub fn atan2(y: Fix16, x: Fix16) -> Fix16 {
    let mask = y >> 31;
    let abs_y = y.wrapping_add(mask) ^ mask;

    let angle = if x >= 0 {
        let r = div(x.wrapping_sub(abs_y), x.wrapping_add(abs_y));
        let r_3 = mul(mul(r, r), r);
        mul(0x0000_3240, r_3)
            .wrapping_sub(mul(0x0000_FB50, r))
            .wrapping_add(PI_DIV_4)
    } else {
        let r = div(x.wrapping_add(abs_y), abs_y.wrapping_sub(x));
        let r_3 = mul(mul(r, r), r);
        mul(0x0000_3240, r_3)
            .wrapping_sub(mul(0x0000_FB50, r))
            .wrapping_add(THREE_PI_DIV_4)
    };

    if y < 0 {
        angle.wrapping_neg()
    } else {
        angle
    }
}

pub fn atan(x: Fix16) -> Fix16 {
    atan2(x, ONE)
}

/// Zero outside `[-1, 1]`.
pub fn asin(x: Fix16) -> Fix16 {
    if x > ONE || x < -ONE {
        return 0;
    }
    let out = ONE.wrapping_sub(mul(x, x));
    let out = div(x, sqrt(out));
    atan(out)
}

pub fn acos(x: Fix16) -> Fix16 {
    (PI >> 1).wrapping_sub(asin(x))
}

/// Power series, saturating at [`MAXIMUM`] and flushing to zero.
pub fn exp(value: Fix16) -> Fix16 {
    if value == 0 {
        return ONE;
    }
    if value == ONE {
        return E;
    }
    if value >= 681_391 {
        return MAXIMUM;
    }
    if value <= -772_243 {
        return 0;
    }

    // exp(-x) = 1 / exp(x); the series converges faster for positive x.
    let negative = value < 0;
    let value = value.abs();

    let mut result = value.wrapping_add(ONE);
    let mut term = value;
    for i in 2..30 {
        term = mul(term, div(value, from_int(i)));
        result = result.wrapping_add(term);
        if term < 500 && (i > 15 || term < 20) {
            break;
        }
    }

    if negative {
        div(ONE, result)
    } else {
        result
    }
}

/// Natural logarithm by Newton iteration on `exp`. Non-positive input yields
/// [`MINIMUM`].
pub fn log(value: Fix16) -> Fix16 {
    if value <= 0 {
        return MINIMUM;
    }

    let mut value = value;
    let mut guess = from_int(2);
    let mut scaling: i32 = 0;

    // Bring the value into 1 < x < 100 where the iteration is accurate.
    while value > from_int(100) {
        value = div(value, E_TO_FOURTH);
        scaling += 4;
    }
    while value < ONE {
        value = mul(value, E_TO_FOURTH);
        scaling -= 4;
    }

    let mut count = 0;
    loop {
        let e = exp(guess);
        let mut delta = div(value.wrapping_sub(e), e);
        if delta > from_int(3) {
            delta = from_int(3);
        }
        guess = guess.wrapping_add(delta);

        let keep_going = count < 10 && (delta > 1 || delta < -1);
        count += 1;
        if !keep_going {
            break;
        }
    }

    guess.wrapping_add(from_int(scaling))
}
