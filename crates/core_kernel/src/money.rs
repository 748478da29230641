//! Money rounding utilities
//!
//! All monetary values in the system are `rust_decimal::Decimal` rounded to
//! two decimal places. `round2` is the only place rounding happens; callers
//! never round ad hoc, so totals assembled from rounded components stay
//! consistent with the stored ledger.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds a decimal amount to two decimal places, half away from zero.
///
/// Idempotent: `round2(round2(x)) == round2(x)`. Never yields more than two
/// decimal digits of precision.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Computes `percent` percent of `base`, rounded to two decimal places.
///
/// Used for GST and other-tax amounts: `percent_of(line_subtotal, 18)` is the
/// 18% tax on the subtotal.
pub fn percent_of(base: Decimal, percent: Decimal) -> Decimal {
    round2(base * percent / Decimal::ONE_HUNDRED)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn rounds_half_up() {
        assert_eq!(round2(dec!(2.005)), dec!(2.01));
        assert_eq!(round2(dec!(2.004)), dec!(2.00));
        assert_eq!(round2(dec!(2.675)), dec!(2.68));
    }

    #[test]
    fn round2_is_idempotent() {
        let x = dec!(19.994999);
        assert_eq!(round2(round2(x)), round2(x));
    }

    #[test]
    fn percent_of_basic() {
        assert_eq!(percent_of(dec!(200), dec!(18)), dec!(36.00));
        assert_eq!(percent_of(dec!(100), dec!(0)), dec!(0.00));
        assert_eq!(percent_of(dec!(33.33), dec!(5)), dec!(1.67));
    }
}
