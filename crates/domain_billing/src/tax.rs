//! Other-tax normalization
//!
//! Invoices carry an extensible list of ad-hoc percentage surcharges per line
//! ("Other Tax"). This module turns the raw client-supplied list into
//! validated, amount-resolved entries against an already-rounded line
//! subtotal.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{percent_of, round2};

use crate::calculator::CalcMode;
use crate::error::BillingError;

/// Name used when a surcharge entry has no (or a blank) name
pub const DEFAULT_OTHER_TAX_NAME: &str = "Other Tax";

/// Raw surcharge entry as submitted by a caller
#[derive(Debug, Clone, Deserialize)]
pub struct OtherTaxInput {
    #[serde(default)]
    pub name: Option<String>,
    pub percent: Decimal,
}

/// A validated, amount-resolved surcharge on one invoice line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OtherTax {
    pub name: String,
    pub percent: Decimal,
    pub amount: Decimal,
}

/// Result of normalizing a line's surcharge list
#[derive(Debug, Clone)]
pub struct NormalizedTaxes {
    pub taxes: Vec<OtherTax>,
    /// Rounded sum of the resolved amounts
    pub total: Decimal,
}

/// Normalizes a raw surcharge list for a line subtotal.
///
/// Names are trimmed and default to "Other Tax" when blank. A negative
/// percent fails with a validation error on the authoritative path
/// (`CalcMode::Strict`); the preview path zeroes the entry instead, since
/// live feedback must never block interactive editing.
pub fn normalize_other_taxes(
    inputs: &[OtherTaxInput],
    line_subtotal: Decimal,
    mode: CalcMode,
) -> Result<NormalizedTaxes, BillingError> {
    let mut taxes = Vec::with_capacity(inputs.len());
    let mut total = Decimal::ZERO;

    for input in inputs {
        let name = input
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_OTHER_TAX_NAME)
            .to_string();

        let percent = if input.percent < Decimal::ZERO {
            match mode {
                CalcMode::Strict => {
                    return Err(BillingError::validation(format!(
                        "Invalid other tax percent for \"{name}\""
                    )));
                }
                CalcMode::Preview => Decimal::ZERO,
            }
        } else {
            input.percent
        };

        let amount = percent_of(line_subtotal, percent);
        total += amount;
        taxes.push(OtherTax {
            name,
            percent,
            amount,
        });
    }

    Ok(NormalizedTaxes {
        taxes,
        total: round2(total),
    })
}
