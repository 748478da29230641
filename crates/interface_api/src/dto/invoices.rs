//! Invoice DTOs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

use domain_billing::{CustomerDetails, InvoiceStatus, LineItemInput};
use infra_db::repositories::{NewInvoiceRequest, UpdateInvoiceRequest};

/// Request body for creating an invoice
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceBody {
    pub customer_details: CustomerDetails,
    pub invoice_date: NaiveDate,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub document_number: Option<String>,
    pub items: Vec<LineItemInput>,
    /// Invoice-level GST fallback for lines without their own percent
    #[serde(default)]
    pub gst_percent: Option<Decimal>,
    #[serde(default)]
    pub paid_amount: Decimal,
    #[serde(default)]
    pub use_available_balance: bool,
    #[serde(default)]
    pub status: Option<InvoiceStatus>,
}

impl CreateInvoiceBody {
    pub fn into_domain(self) -> NewInvoiceRequest {
        NewInvoiceRequest {
            customer: self.customer_details,
            invoice_date: self.invoice_date,
            due_date: self.due_date,
            document_number: self.document_number,
            items: self.items,
            invoice_gst_percent: self.gst_percent,
            paid_amount: self.paid_amount,
            use_available_balance: self.use_available_balance,
            status: self.status,
        }
    }
}

/// Request body for editing an invoice
///
/// Settlement inputs are not editable; totals are recomputed from the new
/// items against the settlement stored at creation time.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInvoiceBody {
    #[serde(default)]
    pub customer_details: Option<CustomerDetails>,
    #[serde(default)]
    pub invoice_date: Option<NaiveDate>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub document_number: Option<String>,
    pub items: Vec<LineItemInput>,
    #[serde(default)]
    pub gst_percent: Option<Decimal>,
    #[serde(default)]
    pub status: Option<InvoiceStatus>,
}

impl UpdateInvoiceBody {
    pub fn into_domain(self) -> UpdateInvoiceRequest {
        UpdateInvoiceRequest {
            customer: self.customer_details,
            invoice_date: self.invoice_date,
            due_date: self.due_date,
            document_number: self.document_number,
            items: self.items,
            invoice_gst_percent: self.gst_percent,
            status: self.status,
        }
    }
}

/// Request body for a status transition
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusBody {
    pub status: InvoiceStatus,
}

/// Request body for a non-authoritative amount preview
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewInvoiceBody {
    pub items: Vec<LineItemInput>,
    #[serde(default)]
    pub gst_percent: Option<Decimal>,
    /// Resolve the opening balance from this customer's ledger position
    #[serde(default)]
    pub customer_name: Option<String>,
    /// Explicit opening balance; takes precedence over `customer_name`
    #[serde(default)]
    pub opening_balance: Option<Decimal>,
    #[serde(default)]
    pub paid_amount: Decimal,
    #[serde(default)]
    pub use_available_balance: bool,
}

/// Query parameters for listing invoices
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceListQuery {
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}
