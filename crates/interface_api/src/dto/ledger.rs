//! Ledger DTOs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use domain_billing::{EntryType, ReferenceType};

/// Request body for a manual ledger posting
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLedgerEntryBody {
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    pub amount: Decimal,
    #[serde(default)]
    pub party_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub reference_type: ReferenceType,
}

/// Query parameters for a ledger statement
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerListQuery {
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub party: Option<String>,
    #[serde(default, rename = "type")]
    pub entry_type: Option<String>,
}

/// Query parameters for a party balance lookup
#[derive(Debug, Deserialize)]
pub struct BalanceQuery {
    pub party: String,
}

/// A party's ledger position
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyBalanceResponse {
    pub party: String,
    /// Signed net position: Σcredit − Σdebit
    pub net_balance: Decimal,
    /// Net position floored at zero, as usable on invoices
    pub available_balance: Decimal,
}
