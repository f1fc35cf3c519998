//! Fixed-point conversion between decimal values and on-chain micro-units.
//!
//! One whole USD (or one whole share) is 1_000_000 micro-units. All
//! conversions fail closed: negative, unparseable or non-finite input becomes
//! zero instead of an error.

use alloy_primitives::U256;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::decimal_input::DecimalInput;

/// Number of fractional digits carried by a micro-unit amount.
pub const MICRO_DECIMALS: u32 = 6;

/// 10^6 as a plain integer.
pub const MICRO_PER_UNIT: u64 = 1_000_000;

/// 10^6 as an on-chain integer.
pub fn micro_scale() -> U256 {
    U256::from(MICRO_PER_UNIT)
}

pub(crate) fn pow10(exp: u32) -> U256 {
    let ten = U256::from(10u8);
    let mut value = U256::from(1u8);
    for _ in 0..exp {
        value *= ten;
    }
    value
}

/// Integer division rounding half away from zero (operands are unsigned).
pub(crate) fn div_round_half_up(numerator: U256, denominator: U256) -> U256 {
    if denominator.is_zero() {
        return U256::ZERO;
    }
    let quotient = numerator / denominator;
    let remainder = numerator % denominator;
    if remainder * U256::from(2u8) >= denominator {
        quotient + U256::from(1u8)
    } else {
        quotient
    }
}

/// Scale a decimal by 10^6 and round to the nearest micro-unit.
///
/// Works on the decimal mantissa directly, so inputs with more than six
/// fractional digits round exactly on the seventh (`12.3456789 -> 12345679`).
pub fn to_micro(value: Decimal) -> U256 {
    if value.is_sign_negative() || value.is_zero() {
        return U256::ZERO;
    }
    let mantissa = U256::from(value.mantissa().unsigned_abs());
    let scale = value.scale();
    if scale <= MICRO_DECIMALS {
        mantissa * pow10(MICRO_DECIMALS - scale)
    } else {
        div_round_half_up(mantissa, pow10(scale - MICRO_DECIMALS))
    }
}

/// [`to_micro`] over parsed user input; invalid input is zero.
pub fn to_micro_input(value: DecimalInput) -> U256 {
    value.value().map(to_micro).unwrap_or(U256::ZERO)
}

/// [`to_micro`] over raw text; unparseable text is zero.
pub fn to_micro_str(text: &str) -> U256 {
    to_micro_input(DecimalInput::parse(text))
}

/// Render micro-units as a decimal string.
///
/// With `Some(precision)` the result has exactly that many fractional digits
/// (half-up rounding). With `None` trailing zeros are trimmed but at least
/// one fractional digit is kept (`1000000 -> "1.0"`).
pub fn from_micro(micro: U256, precision: Option<u32>) -> String {
    let digits = precision.unwrap_or(MICRO_DECIMALS);

    let (whole, frac) = if digits < MICRO_DECIMALS {
        let scaled = div_round_half_up(micro, pow10(MICRO_DECIMALS - digits));
        let unit = pow10(digits);
        (scaled / unit, scaled % unit)
    } else {
        let unit = micro_scale();
        (micro / unit, (micro % unit) * pow10(digits - MICRO_DECIMALS))
    };

    if digits == 0 {
        return whole.to_string();
    }

    let mut frac = format!("{:0>width$}", frac.to_string(), width = digits as usize);
    if precision.is_none() {
        let trimmed = frac.trim_end_matches('0').len().max(1);
        frac.truncate(trimmed);
    }
    format!("{}.{}", whole, frac)
}

/// [`from_micro`] over raw text; non-integer text renders as zero.
pub fn from_micro_str(text: &str, precision: Option<u32>) -> String {
    let micro = U256::from_str_radix(text.trim(), 10).unwrap_or(U256::ZERO);
    from_micro(micro, precision)
}

/// Convert a 0..1 price fraction into the cents domain (one decimal place).
///
/// `None` stays `None`; out-of-range values are clamped into `[0, 1]` first.
pub fn to_cents(fraction: Option<Decimal>) -> Option<Decimal> {
    let clamped = fraction?.clamp(Decimal::ZERO, Decimal::ONE);
    Some(
        (clamped * Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
            .normalize(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_to_micro_rounding_boundary() {
        assert_eq!(to_micro(dec!(0.0000004)), U256::ZERO);
        assert_eq!(to_micro(dec!(0.0000005)), U256::from(1u8));
        assert_eq!(to_micro(dec!(-5)), U256::ZERO);
    }

    #[test]
    fn test_to_micro_seventh_digit() {
        assert_eq!(to_micro_str("12.3456789"), U256::from(12_345_679u64));
        assert_eq!(to_micro_str("12.3456784"), U256::from(12_345_678u64));
    }

    #[test]
    fn test_to_micro_whole_and_short_fractions() {
        assert_eq!(to_micro(dec!(1)), U256::from(1_000_000u64));
        assert_eq!(to_micro(dec!(12.34)), U256::from(12_340_000u64));
        assert_eq!(to_micro_str("not a number"), U256::ZERO);
    }

    #[test]
    fn test_from_micro_default_precision() {
        assert_eq!(from_micro(U256::from(1_000_000u64), None), "1.0");
        assert_eq!(from_micro(U256::from(12_345_679u64), None), "12.345679");
        assert_eq!(from_micro(U256::from(1_500_000u64), None), "1.5");
        assert_eq!(from_micro(U256::ZERO, None), "0.0");
    }

    #[test]
    fn test_from_micro_fixed_precision() {
        assert_eq!(from_micro(U256::from(12_345_679u64), Some(2)), "12.35");
        assert_eq!(from_micro(U256::from(12_344_999u64), Some(2)), "12.34");
        assert_eq!(from_micro(U256::from(1_000_000u64), Some(0)), "1");
        assert_eq!(from_micro(U256::from(1u8), Some(8)), "0.00000100");
    }

    #[test]
    fn test_from_micro_non_numeric() {
        assert_eq!(from_micro_str("abc", Some(2)), "0.00");
        assert_eq!(from_micro_str("-10", None), "0.0");
        assert_eq!(from_micro_str("2500000", Some(2)), "2.50");
    }

    #[test]
    fn test_to_cents() {
        assert_eq!(to_cents(None), None);
        assert_eq!(to_cents(Some(dec!(0.4567))), Some(dec!(45.7)));
        assert_eq!(to_cents(Some(dec!(1.7))), Some(dec!(100)));
        assert_eq!(to_cents(Some(dec!(-0.2))), Some(dec!(0)));
    }

    #[test]
    fn test_round_trip_within_tolerance() {
        for text in ["0", "0.000001", "1.5", "999999.999999", "1000000", "42.123456"] {
            let value = DecimalInput::parse(text).or_zero();
            let back: Decimal = from_micro(to_micro(value), None).parse().unwrap();
            assert!((back - value).abs() <= dec!(0.000001), "{} -> {}", value, back);
        }
    }
}
