//! Property-based test generators
//!
//! Proptest strategies for billing inputs that stay inside the domain's
//! accepted ranges, so strict calculations built from them always succeed.

use proptest::prelude::*;
use rust_decimal::Decimal;

use domain_billing::{CalculationInput, LineItemInput, OtherTaxInput};

/// Strategy for non-negative monetary amounts with at most two decimals
pub fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy for quantities (fractional quantities are allowed)
pub fn quantity_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..100_000i64).prop_map(|milli| Decimal::new(milli, 3))
}

/// Strategy for tax percentages in a realistic 0..=40 range
pub fn percent_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..4000i64).prop_map(|basis| Decimal::new(basis, 2))
}

/// Strategy for an optional per-line GST override
pub fn gst_override_strategy() -> impl Strategy<Value = Option<Decimal>> {
    proptest::option::of(percent_strategy())
}

/// Strategy for a list of additional per-line taxes
pub fn other_taxes_strategy() -> impl Strategy<Value = Vec<OtherTaxInput>> {
    proptest::collection::vec(
        ("[A-Za-z ]{0,12}", percent_strategy()).prop_map(|(name, percent)| OtherTaxInput {
            name: if name.trim().is_empty() {
                None
            } else {
                Some(name)
            },
            percent,
        }),
        0..3,
    )
}

/// Strategy for a single valid line item
pub fn line_item_strategy() -> impl Strategy<Value = LineItemInput> {
    (
        "[A-Za-z][A-Za-z0-9 ]{0,20}",
        quantity_strategy(),
        amount_strategy(),
        gst_override_strategy(),
        other_taxes_strategy(),
    )
        .prop_map(|(name, quantity, rate, gst_percent, other_taxes)| LineItemInput {
            name,
            quantity,
            rate,
            gst_percent,
            other_taxes,
        })
}

/// Strategy for a complete calculation input that the strict calculator
/// accepts: at least one item, non-negative opening balance, and a paid
/// amount of zero (payments are exercised separately because their upper
/// bound depends on the computed grand total).
pub fn calculation_input_strategy() -> impl Strategy<Value = CalculationInput> {
    (
        proptest::collection::vec(line_item_strategy(), 1..6),
        gst_override_strategy(),
        amount_strategy(),
        any::<bool>(),
    )
        .prop_map(
            |(items, invoice_gst_percent, opening_balance, use_available_balance)| {
                CalculationInput {
                    items,
                    invoice_gst_percent,
                    opening_balance,
                    paid_amount: Decimal::ZERO,
                    use_available_balance,
                }
            },
        )
}
