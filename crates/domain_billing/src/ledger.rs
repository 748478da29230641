//! Ledger entries, posting derivation, and balance folds
//!
//! The ledger is append-mostly: entries are immutable once written, except
//! for the single INVOICE-linked CREDIT posting which is replaced in place
//! when its invoice is edited. Balances are never cached — they are folds
//! over committed postings, computed at read time.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{round2, BusinessId, InvoiceId, LedgerEntryId};

use crate::error::BillingError;
use crate::invoice::Invoice;

/// Posting direction
///
/// CREDIT increases the party's balance with the business, DEBIT decreases
/// it. Amounts are always non-negative; direction carries the sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryType {
    Debit,
    Credit,
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Debit => "DEBIT",
            EntryType::Credit => "CREDIT",
        }
    }

    pub fn parse(value: &str) -> Result<Self, BillingError> {
        match value {
            "DEBIT" => Ok(EntryType::Debit),
            "CREDIT" => Ok(EntryType::Credit),
            _ => Err(BillingError::validation("type must be DEBIT or CREDIT")),
        }
    }
}

/// What a posting refers back to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReferenceType {
    Invoice,
    Manual,
    Expense,
}

impl ReferenceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceType::Invoice => "INVOICE",
            ReferenceType::Manual => "MANUAL",
            ReferenceType::Expense => "EXPENSE",
        }
    }

    pub fn parse(value: &str) -> Result<Self, BillingError> {
        match value {
            "INVOICE" => Ok(ReferenceType::Invoice),
            "MANUAL" => Ok(ReferenceType::Manual),
            "EXPENSE" => Ok(ReferenceType::Expense),
            _ => Err(BillingError::validation(
                "referenceType must be INVOICE, MANUAL or EXPENSE",
            )),
        }
    }
}

/// A persisted ledger posting
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub id: LedgerEntryId,
    pub business_id: BusinessId,
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    pub amount: Decimal,
    /// Free text, matched by string — not a foreign key
    pub party_name: Option<String>,
    pub reference_type: ReferenceType,
    /// Links back to an invoice when `reference_type` is INVOICE
    pub reference_id: Option<InvoiceId>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A posting prepared for insertion
#[derive(Debug, Clone)]
pub struct NewLedgerEntry {
    pub business_id: BusinessId,
    pub date: NaiveDate,
    pub entry_type: EntryType,
    pub amount: Decimal,
    pub party_name: Option<String>,
    pub reference_type: ReferenceType,
    pub reference_id: Option<InvoiceId>,
    pub description: Option<String>,
}

impl NewLedgerEntry {
    /// Builds a validated manual posting (MANUAL or EXPENSE).
    ///
    /// EXPENSE entries record money leaving the business and must be DEBIT.
    pub fn manual(
        business_id: BusinessId,
        date: NaiveDate,
        entry_type: EntryType,
        amount: Decimal,
        party_name: Option<String>,
        description: Option<String>,
        reference_type: ReferenceType,
    ) -> Result<Self, BillingError> {
        if amount < Decimal::ZERO {
            return Err(BillingError::validation(
                "amount must be a non-negative number",
            ));
        }
        if reference_type == ReferenceType::Invoice {
            return Err(BillingError::validation(
                "referenceType must be MANUAL or EXPENSE",
            ));
        }
        if reference_type == ReferenceType::Expense && entry_type != EntryType::Debit {
            return Err(BillingError::validation("Expense entries must be DEBIT"));
        }

        Ok(Self {
            business_id,
            date,
            entry_type,
            amount: round2(amount),
            party_name: party_name
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty()),
            reference_type,
            reference_id: None,
            description: description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
        })
    }
}

/// Human-readable description for invoice-linked postings
pub fn invoice_ledger_description(
    invoice_number: i64,
    customer_name: &str,
    suffix: &str,
) -> String {
    let name = customer_name.trim();
    if name.is_empty() {
        format!("Invoice #{invoice_number} - {suffix}")
    } else {
        format!("Invoice #{invoice_number} - {name} - {suffix}")
    }
}

fn invoice_posting(
    invoice: &Invoice,
    entry_type: EntryType,
    amount: Decimal,
    suffix: &str,
) -> NewLedgerEntry {
    NewLedgerEntry {
        business_id: invoice.business_id,
        date: invoice.invoice_date,
        entry_type,
        amount,
        party_name: Some(invoice.customer.name.clone()),
        reference_type: ReferenceType::Invoice,
        reference_id: Some(invoice.id),
        description: Some(invoice_ledger_description(
            invoice.invoice_number,
            &invoice.customer.name,
            suffix,
        )),
    }
}

/// The sales-value CREDIT posting every invoice carries.
///
/// On invoice edits this is the one posting that gets replaced in place;
/// payment and applied-balance postings are never touched retroactively.
pub fn sales_credit_posting(invoice: &Invoice) -> NewLedgerEntry {
    invoice_posting(invoice, EntryType::Credit, invoice.grand_total, "Sales value")
}

/// Derives the ledger postings correlated with an invoice.
///
/// Always exactly one CREDIT for the grand total (sales value); one DEBIT for
/// the immediate payment iff it is positive; one DEBIT for consumed credit
/// balance iff it is positive. The coordinator writes these in the same
/// transaction as the invoice itself.
pub fn invoice_postings(invoice: &Invoice) -> Vec<NewLedgerEntry> {
    let mut postings = vec![sales_credit_posting(invoice)];

    if invoice.paid_amount > Decimal::ZERO {
        postings.push(invoice_posting(
            invoice,
            EntryType::Debit,
            invoice.paid_amount,
            "Payment received",
        ));
    }
    if invoice.applied_balance > Decimal::ZERO {
        postings.push(invoice_posting(
            invoice,
            EntryType::Debit,
            invoice.applied_balance,
            "Credit balance applied",
        ));
    }

    postings
}

/// Folds postings into a signed net balance: Σcredit − Σdebit
pub fn net_balance<'a>(entries: impl IntoIterator<Item = &'a LedgerEntry>) -> Decimal {
    entries.into_iter().fold(Decimal::ZERO, |acc, e| {
        match e.entry_type {
            EntryType::Credit => acc + e.amount,
            EntryType::Debit => acc - e.amount,
        }
    })
}

/// Floors a net balance at zero for billing purposes
///
/// A net-debit position means the party owes the business; it is not
/// negative available credit.
pub fn available_credit(net: Decimal) -> Decimal {
    net.max(Decimal::ZERO)
}

/// A statement row with its computed running balance
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerLine {
    #[serde(flatten)]
    pub entry: LedgerEntry,
    /// Computed at read time, never stored authoritatively
    pub balance_after_transaction: Decimal,
}

/// Attaches a running balance to entries already in `(date, created_at)` order
pub fn with_running_balance(entries: Vec<LedgerEntry>, opening_balance: Decimal) -> Vec<LedgerLine> {
    let mut running = opening_balance;
    entries
        .into_iter()
        .map(|entry| {
            match entry.entry_type {
                EntryType::Credit => running += entry.amount,
                EntryType::Debit => running -= entry.amount,
            }
            LedgerLine {
                balance_after_transaction: running,
                entry,
            }
        })
        .collect()
}
