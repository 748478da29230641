//! Billing Domain - Invoice and Ledger Consistency Engine
//!
//! This crate implements the transactional billing core: computing invoice
//! totals and tax, resolving how much of an invoice is settled by cash versus
//! existing customer credit, and deriving the ledger postings that must be
//! written together with the invoice so the two never diverge.
//!
//! # Model
//!
//! The ledger is a single running balance per (business, party), not a full
//! general ledger. A CREDIT posting increases what the party has paid in or
//! is owed against; a DEBIT posting decreases it. Every invoice produces
//! exactly one CREDIT posting for its grand total, plus at most one DEBIT for
//! immediate payment and at most one DEBIT for consumed credit balance.
//!
//! # Purity
//!
//! Everything in this crate is CPU-only. The calculator is a pure function:
//! recomputing amounts on the same input yields identical output. Persistence
//! and atomicity live in `infra_db`.

pub mod calculator;
pub mod error;
pub mod invoice;
pub mod ledger;
pub mod tax;

pub use calculator::{
    calculate_invoice_amounts, CalcMode, CalculationInput, InvoiceAmounts, InvoiceLineItem,
    LineItemInput,
};
pub use error::BillingError;
pub use invoice::{CustomerDetails, Invoice, InvoiceStatus};
pub use ledger::{
    available_credit, invoice_postings, net_balance, sales_credit_posting, with_running_balance,
    EntryType, LedgerEntry, LedgerLine, NewLedgerEntry, ReferenceType,
};
pub use tax::{normalize_other_taxes, NormalizedTaxes, OtherTax, OtherTaxInput};
