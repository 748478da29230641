//! Invoice entity
//!
//! The invoice is the root financial document: one atomic record owning its
//! line items and customer snapshot. Line items and taxes are embedded value
//! objects with no identity of their own — they live and die with the
//! invoice. Every monetary field is derived by the calculator, never taken
//! from a client verbatim.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{BusinessId, InvoiceId};

use crate::calculator::{InvoiceAmounts, InvoiceLineItem};
use crate::error::BillingError;

/// Invoice lifecycle status
///
/// A pure metadata field: transitions never recompute totals or touch the
/// ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    Draft,
    Sent,
    Paid,
    Overdue,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "DRAFT",
            InvoiceStatus::Sent => "SENT",
            InvoiceStatus::Paid => "PAID",
            InvoiceStatus::Overdue => "OVERDUE",
        }
    }

    /// Parses the stored/wire form, rejecting anything outside the lifecycle
    pub fn parse(value: &str) -> Result<Self, BillingError> {
        match value {
            "DRAFT" => Ok(InvoiceStatus::Draft),
            "SENT" => Ok(InvoiceStatus::Sent),
            "PAID" => Ok(InvoiceStatus::Paid),
            "OVERDUE" => Ok(InvoiceStatus::Overdue),
            _ => Err(BillingError::validation("Invalid status")),
        }
    }
}

impl Default for InvoiceStatus {
    fn default() -> Self {
        InvoiceStatus::Draft
    }
}

/// Customer snapshot captured at invoice time
///
/// Not a live reference to any customer entity; editing a customer later
/// never rewrites historical invoices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

impl CustomerDetails {
    /// Trims all fields, drops blank optionals, and requires a name
    pub fn normalized(self) -> Result<Self, BillingError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(BillingError::validation("customerDetails.name is required"));
        }

        Ok(Self {
            name,
            email: trim_optional(self.email),
            phone: trim_optional(self.phone),
            address: trim_optional(self.address),
        })
    }
}

fn trim_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// A persisted invoice with all derived amounts
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: InvoiceId,
    pub business_id: BusinessId,
    /// Per-business monotonically increasing sequence, immutable once
    /// assigned, never recycled (soft-delete included)
    pub invoice_number: i64,
    /// User-facing reference that can follow business rules
    pub document_number: Option<String>,
    pub customer: CustomerDetails,
    pub invoice_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub items: Vec<InvoiceLineItem>,
    pub subtotal: Decimal,
    pub gst_total: Decimal,
    pub other_tax_total: Decimal,
    pub grand_total: Decimal,
    /// Customer credit position as observed at creation time
    pub opening_balance: Decimal,
    pub paid_amount: Decimal,
    pub use_available_balance: bool,
    pub applied_balance: Decimal,
    pub remaining_balance: Decimal,
    pub final_payable_amount: Decimal,
    pub status: InvoiceStatus,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    /// Applies recomputed item totals from a full edit.
    ///
    /// Only the item-derived fields change. The settlement recorded at
    /// creation time (opening balance, paid amount, balance flag, applied
    /// balance, remaining balance, final payable) is carried over verbatim:
    /// editing a historical invoice never changes how it was settled, so the
    /// payment and applied-balance postings written back then stay accurate.
    pub fn with_revised_totals(mut self, amounts: InvoiceAmounts) -> Self {
        self.items = amounts.items;
        self.subtotal = amounts.subtotal;
        self.gst_total = amounts.gst_total;
        self.other_tax_total = amounts.other_tax_total;
        self.grand_total = amounts.grand_total;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_wire_form() {
        for status in [
            InvoiceStatus::Draft,
            InvoiceStatus::Sent,
            InvoiceStatus::Paid,
            InvoiceStatus::Overdue,
        ] {
            assert_eq!(InvoiceStatus::parse(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn unknown_status_rejected() {
        assert!(InvoiceStatus::parse("CANCELLED").is_err());
        assert!(InvoiceStatus::parse("draft").is_err());
    }

    #[test]
    fn customer_normalization_requires_name() {
        let customer = CustomerDetails {
            name: "   ".to_string(),
            email: None,
            phone: None,
            address: None,
        };
        assert!(customer.normalized().is_err());
    }

    #[test]
    fn customer_normalization_trims_and_drops_blanks() {
        let customer = CustomerDetails {
            name: "  Acme Traders  ".to_string(),
            email: Some("  billing@acme.example  ".to_string()),
            phone: Some("   ".to_string()),
            address: None,
        };

        let normalized = customer.normalized().unwrap();
        assert_eq!(normalized.name, "Acme Traders");
        assert_eq!(normalized.email.as_deref(), Some("billing@acme.example"));
        assert_eq!(normalized.phone, None);
    }
}
