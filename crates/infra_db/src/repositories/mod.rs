//! Repository implementations for the billing aggregates
//!
//! Each repository encapsulates SQL and maps between database rows and
//! domain types. Queries use runtime binding rather than compile-time
//! macros so the crate builds without a live database.

pub mod invoices;
pub mod ledger;
pub mod sequence;

pub use invoices::{InvoiceListFilter, InvoiceRepository, NewInvoiceRequest, UpdateInvoiceRequest};
pub use ledger::{LedgerListFilter, LedgerRepository, LedgerStatement};
