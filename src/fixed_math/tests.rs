use super::*;
use fixed::types::I48F16;

fn checked<R>(f: impl FnOnce() -> R) -> R {
    with_arithmetic_mode(ArithmeticMode::Checked, || {
        reset_faults();
        f()
    })
}

#[test]
fn addition_overflow_returns_sentinel_in_checked_mode() {
    checked(|| {
        assert_eq!(Fixed::MAX + Fixed::ONE, Fixed::ARITHMETIC_OVERFLOW);
        assert_eq!(take_last_fault(), Some(FixedFault::AdditionOverflow));

        assert_eq!(Fixed::MIN - Fixed::ONE, Fixed::ARITHMETIC_OVERFLOW);
        assert_eq!(take_last_fault(), Some(FixedFault::SubtractionOverflow));
        assert_eq!(fault_count(), 2);
    });
}

#[test]
fn multiplication_overflow_is_detected_on_raw_product() {
    checked(|| {
        let big = Fixed::from_int(1 << 24);
        assert!((big * big).is_overflow());
        assert_eq!(take_last_fault(), Some(FixedFault::MultiplicationOverflow));

        // Small operands stay exact.
        assert_eq!(Fixed::from_int(300) * Fixed::from_int(300), Fixed::from_int(90_000));
        assert_eq!(take_last_fault(), None);
    });
}

#[test]
fn division_faults_in_checked_mode() {
    checked(|| {
        assert_eq!(Fixed::ONE / Fixed::ZERO, Fixed::ARITHMETIC_OVERFLOW);
        assert_eq!(take_last_fault(), Some(FixedFault::DivisionByZero));

        // The dividend no longer fits once shifted by the fraction bits.
        assert_eq!(Fixed::MAX / Fixed::TWO, Fixed::ARITHMETIC_OVERFLOW);
        assert_eq!(take_last_fault(), Some(FixedFault::DivisionOverflow));

        assert_eq!(Fixed::ONE % Fixed::ZERO, Fixed::ARITHMETIC_OVERFLOW);
        assert_eq!(take_last_fault(), Some(FixedFault::DivisionByZero));
    });
}

#[test]
fn multiplication_edge_operands_overflow() {
    let minus_epsilon = Fixed::from_raw(-1);
    checked(|| {
        assert_eq!(minus_epsilon * Fixed::MAX, Fixed::ARITHMETIC_OVERFLOW);
        assert_eq!(take_last_fault(), Some(FixedFault::MultiplicationOverflow));

        assert_eq!(Fixed::ARITHMETIC_OVERFLOW * minus_epsilon, Fixed::ARITHMETIC_OVERFLOW);
        assert_eq!(take_last_fault(), Some(FixedFault::MultiplicationOverflow));
    });
    assert_eq!(minus_epsilon.checked_mul(Fixed::MAX), None);
    assert_eq!(Fixed::ARITHMETIC_OVERFLOW.checked_mul(minus_epsilon), None);
}

#[test]
fn division_edge_operands_overflow() {
    let minus_epsilon = Fixed::from_raw(-1);
    checked(|| {
        assert_eq!(minus_epsilon / Fixed::MAX, Fixed::ARITHMETIC_OVERFLOW);
        assert_eq!(take_last_fault(), Some(FixedFault::DivisionOverflow));

        assert_eq!(Fixed::ARITHMETIC_OVERFLOW / minus_epsilon, Fixed::ARITHMETIC_OVERFLOW);
        assert_eq!(take_last_fault(), Some(FixedFault::DivisionOverflow));
    });
    assert_eq!(minus_epsilon.checked_div(Fixed::MAX), None);
    assert_eq!(Fixed::ARITHMETIC_OVERFLOW.checked_div(minus_epsilon), None);
}

#[test]
fn remainder_sign_follows_dividend() {
    checked(|| {
        assert_eq!(Fixed::from_int(-7) % Fixed::from_int(3), Fixed::from_int(-1));
        assert_eq!(Fixed::from_int(7) % Fixed::from_int(-3), Fixed::from_int(1));
        assert_eq!(Fixed::from_int(-7) % Fixed::from_int(-3), Fixed::from_int(-1));
        assert_eq!(Fixed::from_raw(-98304) % Fixed::ONE, Fixed::from_raw(-32768));
        assert_eq!(fault_count(), 0);
    });
}

#[test]
fn fast_mode_wraps_without_faults() {
    with_arithmetic_mode(ArithmeticMode::Fast, || {
        reset_faults();
        let wrapped = Fixed::MAX + Fixed::ONE;
        assert_eq!(wrapped.raw(), i64::MAX.wrapping_add(65536));
        assert_eq!(fault_count(), 0);
    });
}

#[test]
#[should_panic]
fn fast_mode_division_by_zero_panics() {
    with_arithmetic_mode(ArithmeticMode::Fast, || Fixed::ONE / Fixed::ZERO);
}

#[test]
fn mode_is_restored_after_scope() {
    let before = arithmetic_mode();
    with_arithmetic_mode(ArithmeticMode::Fast, || {
        assert!(!checks_enabled());
        with_arithmetic_mode(ArithmeticMode::Checked, || assert!(checks_enabled()));
        assert!(!checks_enabled());
    });
    assert_eq!(arithmetic_mode(), before);
}

#[test]
fn checked_methods_ignore_mode() {
    with_arithmetic_mode(ArithmeticMode::Fast, || {
        assert_eq!(Fixed::MAX.checked_add(Fixed::ONE), None);
        assert_eq!(Fixed::ONE.checked_div(Fixed::ZERO), None);
        assert_eq!(Fixed::ONE.checked_rem(Fixed::ZERO), None);
        assert_eq!(Fixed::TWO.checked_mul(Fixed::TWO), Some(Fixed::from_int(4)));
    });
}

#[test]
fn division_truncates() {
    assert_eq!(Fixed::ONE / Fixed::from_int(4), Fixed::from_raw(16384));
    assert_eq!(Fixed::ONE / Fixed::from_int(3), Fixed::from_raw(21845));
    assert_eq!(Fixed::NEG_ONE / Fixed::from_int(3), Fixed::from_raw(-21845));
}

#[test]
fn rounding_helpers() {
    let x = Fixed::from_f32(2.5);
    assert_eq!(x.floor(), Fixed::from_int(2));
    assert_eq!(x.ceil(), Fixed::from_int(3));
    assert_eq!(x.round(), Fixed::from_int(3));
    assert_eq!(x.to_int(), 2);

    let y = -x;
    assert_eq!(y.floor(), Fixed::from_int(-3));
    assert_eq!(y.ceil(), Fixed::from_int(-2));
    assert_eq!(y.round(), Fixed::from_int(-2));
    assert_eq!(y.to_int(), -3);

    assert_eq!(Fixed::from_int(7).ceil(), Fixed::from_int(7));
    assert_eq!(x.fract(), Fixed::HALF);
    assert!(Fixed::from_int(-4).is_integer());
}

#[test]
fn sign_abs_and_move_toward() {
    assert_eq!(Fixed::from_int(-3).abs(), Fixed::from_int(3));
    assert_eq!(Fixed::from_int(-3).sign(), Fixed::NEG_ONE);
    assert_eq!(Fixed::ZERO.sign(), Fixed::ZERO);

    let ten = Fixed::from_int(10);
    assert_eq!(Fixed::ZERO.move_toward(ten, Fixed::TWO), Fixed::TWO);
    assert_eq!(Fixed::from_int(9).move_toward(ten, Fixed::TWO), ten);
    assert_eq!(Fixed::ZERO.move_toward(-ten, Fixed::ONE), Fixed::NEG_ONE);
}

#[test]
fn approximate_equality() {
    assert!(Fixed::is_equal_approx(Fixed::ONE, Fixed::ONE));
    assert!(!Fixed::is_equal_approx(Fixed::ONE, Fixed::ONE + Fixed::EPSILON));
    assert!(Fixed::is_equal_approx_with(
        Fixed::ONE,
        Fixed::ONE + Fixed::EPSILON,
        Fixed::from_raw(2)
    ));
}

#[test]
fn degree_conversions() {
    assert_eq!(Fixed::from_int(180).deg_to_rad(), Fixed::PI);
    assert_eq!(Fixed::PI.rad_to_deg(), Fixed::from_int(180));
}

#[test]
fn display_strips_trailing_zeros() {
    assert_eq!(Fixed::from_int(3).to_string(), "3");
    assert_eq!((Fixed::from_int(3) + Fixed::HALF).to_string(), "3.5");
    assert_eq!(Fixed::from_f32(1.25).to_string(), "1.25");
    assert_eq!(Fixed::from_f32(-1.25).to_string(), "-1.25");
    assert_eq!(Fixed::from_raw(1).to_string(), "0.0000152");
    assert_eq!(Fixed::from_f32(-0.5).to_string(), "-0.5");
}

#[test]
fn parse_decimal_strings() {
    assert_eq!("1.25".parse::<Fixed>(), Ok(Fixed::from_f32(1.25)));
    assert_eq!("-1.25".parse::<Fixed>(), Ok(Fixed::from_f32(-1.25)));
    assert_eq!("+7".parse::<Fixed>(), Ok(Fixed::from_int(7)));
    assert_eq!(".5".parse::<Fixed>(), Ok(Fixed::HALF));
    assert_eq!("-0.5".parse::<Fixed>(), Ok(-Fixed::HALF));

    assert_eq!("".parse::<Fixed>(), Err(ParseFixedError::Empty));
    assert!(matches!("1.2x".parse::<Fixed>(), Err(ParseFixedError::InvalidDigit(_))));
    assert!(matches!(
        "99999999999999999999".parse::<Fixed>(),
        Err(ParseFixedError::OutOfRange(_))
    ));
    assert_eq!(Fixed::from_string("garbage"), Fixed::ZERO);
}

#[test]
fn parse_truncates_past_seven_digits() {
    assert_eq!(
        "0.123456789".parse::<Fixed>(),
        "0.1234567".parse::<Fixed>()
    );
}

#[test]
fn formatted_values_parse_back_within_one_unit() {
    let mut rng = fastrand::Rng::with_seed(0x5eed);
    for _ in 0..2000 {
        let x = Fixed::from_raw(rng.i64(-(1 << 40)..(1 << 40)));
        let back: Fixed = x.to_string().parse().expect("formatted value parses");
        assert!((back.raw() - x.raw()).abs() <= 1, "{} -> {}", x.raw(), back.raw());
    }
}

#[test]
fn add_sub_are_inverse_for_random_values() {
    let mut rng = fastrand::Rng::with_seed(42);
    checked(|| {
        let mut overflows = 0;
        for _ in 0..5000 {
            let a = Fixed::from_raw(rng.i64(-(1 << 50)..(1 << 50)));
            let b = Fixed::from_raw(rng.i64(-(1 << 50)..(1 << 50)));
            assert_eq!((a + b) - b, a);
            assert_eq!(a < b, a.raw() < b.raw());

            // `raw * 65536` leaves the i64 range past 2^47.
            let product = a * Fixed::ONE;
            if a.raw().abs() < 1 << 47 {
                assert_eq!(product, a);
            } else {
                assert!(product.is_overflow(), "{} * 1 did not overflow", a.raw());
                overflows += 1;
            }
        }
        assert!(overflows > 0);
        assert_eq!(fault_count(), overflows);
    });
}

#[test]
fn interop_with_i48f16_shares_bits() {
    let a = I48F16::from_num(3.5);
    let b = I48F16::from_num(2.25);
    let fa = Fixed::from(a);
    let fb = Fixed::from(b);
    assert_eq!(fa, Fixed::from_int(3) + Fixed::HALF);

    // Exact products agree bit for bit.
    assert_eq!(Fixed::from(a * b), fa * fb);
    assert_eq!(I48F16::from(fa + fb), a + b);
}

#[test]
fn serde_encodes_raw_integer() {
    assert_eq!(serde_json::to_string(&Fixed::ONE).unwrap(), "65536");
    let v = FixedVec2::new(Fixed::HALF, Fixed::NEG_ONE);
    assert_eq!(serde_json::to_string(&v).unwrap(), r#"{"x":32768,"y":-65536}"#);
    let back: FixedVec2 = serde_json::from_str(r#"{"x":32768,"y":-65536}"#).unwrap();
    assert_eq!(back, v);
}
