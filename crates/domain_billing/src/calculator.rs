//! Invoice amount calculation
//!
//! The calculator is the single source of truth for invoice totals and the
//! cash/credit settlement split. It is a pure function over its input: no
//! I/O, no hidden state, bit-identical output on repeated calls. The
//! coordinator in `infra_db` persists exactly what it returns, so the stored
//! invoice and its ledger postings can never disagree about amounts.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{percent_of, round2};

use crate::error::BillingError;
use crate::tax::{normalize_other_taxes, OtherTax, OtherTaxInput};

/// Calculation policy: the authoritative path hard-fails on out-of-range
/// values, the preview path clamps them so live UI feedback never blocks
/// editing. One calculator, two policies — the arithmetic is identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalcMode {
    Strict,
    Preview,
}

/// A raw invoice line as submitted by a caller
///
/// All monetary outputs are derived, never trusted verbatim: the calculator
/// recomputes everything from quantity, rate, and percentages.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemInput {
    pub name: String,
    pub quantity: Decimal,
    pub rate: Decimal,
    /// Per-line GST percent; `None` inherits the invoice-level default.
    /// An explicit `0` is a zero-rated line, distinct from unset.
    #[serde(default)]
    pub gst_percent: Option<Decimal>,
    #[serde(default)]
    pub other_taxes: Vec<OtherTaxInput>,
}

/// A fully resolved invoice line with derived tax and total fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceLineItem {
    pub name: String,
    pub quantity: Decimal,
    pub rate: Decimal,
    pub gst_percent: Decimal,
    pub gst_amount: Decimal,
    pub other_taxes: Vec<OtherTax>,
    /// quantity × rate, before any tax
    pub subtotal: Decimal,
    pub line_other_tax_total: Decimal,
    pub line_total: Decimal,
}

/// Input to the calculator
#[derive(Debug, Clone)]
pub struct CalculationInput {
    pub items: Vec<LineItemInput>,
    /// Fallback GST percent for lines that don't carry their own
    pub invoice_gst_percent: Option<Decimal>,
    /// The customer's available credit from the ledger, as observed now
    pub opening_balance: Decimal,
    /// Immediate cash payment against this invoice
    pub paid_amount: Decimal,
    /// Whether existing credit should be consumed
    pub use_available_balance: bool,
}

/// The complete computed amounts for one invoice
///
/// This aggregate is the single value written into the invoice record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceAmounts {
    pub items: Vec<InvoiceLineItem>,
    pub subtotal: Decimal,
    pub gst_total: Decimal,
    pub other_tax_total: Decimal,
    pub grand_total: Decimal,
    pub opening_balance: Decimal,
    pub paid_amount: Decimal,
    pub use_available_balance: bool,
    /// Portion of the opening balance consumed by this invoice
    pub applied_balance: Decimal,
    pub final_payable_amount: Decimal,
    /// Customer credit left after this invoice
    pub remaining_balance: Decimal,
}

/// Computes all invoice totals and the cash/credit settlement split.
///
/// Invariants on success:
/// - `grand_total == subtotal + gst_total + other_tax_total`
/// - `0 <= paid_amount <= grand_total`
/// - `0 <= applied_balance <= min(opening_balance, grand_total - paid_amount)`
/// - `final_payable_amount == grand_total - paid_amount - applied_balance >= 0`
/// - `remaining_balance == opening_balance - applied_balance >= 0`
///
/// A negative ledger position (party owes the business) is clamped to zero
/// available credit; it never makes an invoice more expensive.
pub fn calculate_invoice_amounts(
    input: &CalculationInput,
    mode: CalcMode,
) -> Result<InvoiceAmounts, BillingError> {
    if input.items.is_empty() {
        return Err(BillingError::validation(
            "At least one line item is required",
        ));
    }

    let invoice_gst_fallback = input
        .invoice_gst_percent
        .filter(|p| *p >= Decimal::ZERO)
        .unwrap_or(Decimal::ZERO);

    let mut subtotal = Decimal::ZERO;
    let mut gst_total = Decimal::ZERO;
    let mut other_tax_total = Decimal::ZERO;
    let mut items = Vec::with_capacity(input.items.len());

    for raw in &input.items {
        let name = raw.name.trim().to_string();
        if name.is_empty() && mode == CalcMode::Strict {
            return Err(BillingError::validation("Item name is required"));
        }

        let quantity = resolve_non_negative(raw.quantity, mode, || {
            format!("Invalid quantity for item \"{name}\"")
        })?;
        let rate = resolve_non_negative(raw.rate, mode, || {
            format!("Invalid rate for item \"{name}\"")
        })?;

        let line_subtotal = round2(quantity * rate);

        // A negative per-line percent falls back to the invoice default,
        // matching how an absent value behaves
        let effective_gst_percent = raw
            .gst_percent
            .filter(|p| *p >= Decimal::ZERO)
            .unwrap_or(invoice_gst_fallback);

        let gst_amount = percent_of(line_subtotal, effective_gst_percent);

        let normalized = normalize_other_taxes(&raw.other_taxes, line_subtotal, mode)?;
        let line_other_tax_total = normalized.total;

        let line_total = round2(line_subtotal + gst_amount + line_other_tax_total);

        subtotal += line_subtotal;
        gst_total += gst_amount;
        other_tax_total += line_other_tax_total;

        items.push(InvoiceLineItem {
            name,
            quantity,
            rate,
            gst_percent: effective_gst_percent,
            gst_amount,
            other_taxes: normalized.taxes,
            subtotal: line_subtotal,
            line_other_tax_total,
            line_total,
        });
    }

    let subtotal = round2(subtotal);
    let gst_total = round2(gst_total);
    let other_tax_total = round2(other_tax_total);
    let grand_total = round2(subtotal + gst_total + other_tax_total);

    // A party that currently owes the business has no available credit
    let opening_balance = round2(input.opening_balance).max(Decimal::ZERO);

    let paid_amount = resolve_paid_amount(input.paid_amount, grand_total, mode)?;

    let mut applied_balance = Decimal::ZERO;
    if input.use_available_balance && opening_balance > Decimal::ZERO {
        let max_usable = round2(grand_total - paid_amount);
        if max_usable < Decimal::ZERO {
            // Unreachable once paid_amount is bounded above; kept as a typed
            // invariant check so a defect here is distinguishable from bad input
            return Err(BillingError::InconsistentTotals(
                "payment exceeds invoice value".to_string(),
            ));
        }
        applied_balance = round2(opening_balance.min(max_usable));
    }

    let final_payable_amount = round2(grand_total - paid_amount - applied_balance);
    if final_payable_amount < Decimal::ZERO {
        return Err(BillingError::NegativePayable);
    }

    let remaining_balance = round2(opening_balance - applied_balance);

    Ok(InvoiceAmounts {
        items,
        subtotal,
        gst_total,
        other_tax_total,
        grand_total,
        opening_balance,
        paid_amount,
        use_available_balance: input.use_available_balance,
        applied_balance,
        final_payable_amount,
        remaining_balance,
    })
}

fn resolve_non_negative(
    value: Decimal,
    mode: CalcMode,
    message: impl FnOnce() -> String,
) -> Result<Decimal, BillingError> {
    if value < Decimal::ZERO {
        match mode {
            CalcMode::Strict => Err(BillingError::Validation(message())),
            CalcMode::Preview => Ok(Decimal::ZERO),
        }
    } else {
        Ok(value)
    }
}

fn resolve_paid_amount(
    paid: Decimal,
    grand_total: Decimal,
    mode: CalcMode,
) -> Result<Decimal, BillingError> {
    let paid = round2(paid);
    match mode {
        CalcMode::Strict => {
            if paid < Decimal::ZERO {
                return Err(BillingError::validation("paidAmount cannot be negative"));
            }
            if paid > grand_total {
                return Err(BillingError::validation(
                    "paidAmount cannot exceed invoice grand total",
                ));
            }
            Ok(paid)
        }
        CalcMode::Preview => Ok(paid.clamp(Decimal::ZERO, grand_total)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn widget_input() -> CalculationInput {
        CalculationInput {
            items: vec![LineItemInput {
                name: "Widget".to_string(),
                quantity: dec!(2),
                rate: dec!(100),
                gst_percent: Some(dec!(18)),
                other_taxes: vec![],
            }],
            invoice_gst_percent: None,
            opening_balance: Decimal::ZERO,
            paid_amount: Decimal::ZERO,
            use_available_balance: false,
        }
    }

    #[test]
    fn widget_scenario() {
        let amounts = calculate_invoice_amounts(&widget_input(), CalcMode::Strict).unwrap();

        assert_eq!(amounts.subtotal, dec!(200.00));
        assert_eq!(amounts.gst_total, dec!(36.00));
        assert_eq!(amounts.grand_total, dec!(236.00));
        assert_eq!(amounts.final_payable_amount, dec!(236.00));
    }

    #[test]
    fn empty_items_rejected() {
        let input = CalculationInput {
            items: vec![],
            ..widget_input()
        };
        let err = calculate_invoice_amounts(&input, CalcMode::Strict).unwrap_err();
        assert!(matches!(err, BillingError::Validation(_)));
    }

    #[test]
    fn zero_quantity_is_a_valid_free_line() {
        let mut input = widget_input();
        input.items[0].quantity = Decimal::ZERO;

        let amounts = calculate_invoice_amounts(&input, CalcMode::Strict).unwrap();
        assert_eq!(amounts.grand_total, Decimal::ZERO);
        assert_eq!(amounts.final_payable_amount, Decimal::ZERO);
    }

    #[test]
    fn explicit_zero_gst_does_not_inherit_default() {
        let mut input = widget_input();
        input.invoice_gst_percent = Some(dec!(18));
        input.items[0].gst_percent = Some(Decimal::ZERO);

        let amounts = calculate_invoice_amounts(&input, CalcMode::Strict).unwrap();
        assert_eq!(amounts.gst_total, Decimal::ZERO);

        // Unset inherits the invoice default
        input.items[0].gst_percent = None;
        let amounts = calculate_invoice_amounts(&input, CalcMode::Strict).unwrap();
        assert_eq!(amounts.gst_total, dec!(36.00));
    }

    #[test]
    fn preview_clamps_overpayment_strict_rejects() {
        let mut input = widget_input();
        input.paid_amount = dec!(500);

        let err = calculate_invoice_amounts(&input, CalcMode::Strict).unwrap_err();
        assert!(matches!(err, BillingError::Validation(_)));

        let amounts = calculate_invoice_amounts(&input, CalcMode::Preview).unwrap();
        assert_eq!(amounts.paid_amount, dec!(236.00));
        assert_eq!(amounts.final_payable_amount, Decimal::ZERO);
    }
}
