//! Billing domain errors

use thiserror::Error;

/// Errors that can occur in the billing domain
///
/// `Validation` means caller-fixable input. The remaining variants are
/// defensive invariant checks inside the calculator; triggering one from
/// validated input indicates a logic defect, so callers treat them as fatal
/// to the request rather than something to correct and resubmit.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BillingError {
    /// Malformed or missing input, with a field-level display message
    #[error("{0}")]
    Validation(String),

    /// Payment alone exceeds the invoice total after both were validated
    #[error("Totals mismatch: {0}")]
    InconsistentTotals(String),

    /// The settlement split produced a negative payable amount
    #[error("Final payable amount cannot be negative")]
    NegativePayable,
}

impl BillingError {
    pub fn validation(message: impl Into<String>) -> Self {
        BillingError::Validation(message.into())
    }

    /// Returns true for the defensive invariant variants
    pub fn is_invariant_breach(&self) -> bool {
        matches!(
            self,
            BillingError::InconsistentTotals(_) | BillingError::NegativePayable
        )
    }
}
