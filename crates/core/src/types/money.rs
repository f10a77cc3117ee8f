//! Money helpers for decimal prices.
//!
//! Prices are stored and computed with `rust_decimal::Decimal` in the
//! currency's major unit (dollars). The payment processor is charged in
//! integer minor units (cents).

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// Convert a major-unit decimal amount to integer minor units (cents).
///
/// Negative amounts clamp to zero: a coupon larger than the cart total must
/// never produce a negative charge.
#[must_use]
pub fn minor_units(amount: Decimal) -> i64 {
    let clamped = amount.max(Decimal::ZERO);
    (clamped * Decimal::ONE_HUNDRED)
        .round()
        .to_i64()
        .unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::minor_units;

    #[test]
    fn test_whole_dollars() {
        assert_eq!(minor_units(Decimal::new(30, 0)), 3000);
    }

    #[test]
    fn test_fractional_cents_round() {
        // 19.995 rounds to 2000 cents (banker's rounding rounds .5 to even)
        assert_eq!(minor_units(Decimal::new(19_995, 3)), 2000);
        assert_eq!(minor_units(Decimal::new(1_234, 2)), 1234);
    }

    #[test]
    fn test_negative_clamps_to_zero() {
        assert_eq!(minor_units(Decimal::new(-500, 2)), 0);
    }

    #[test]
    fn test_zero() {
        assert_eq!(minor_units(Decimal::ZERO), 0);
    }
}
