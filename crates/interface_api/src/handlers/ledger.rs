//! Ledger handlers

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};

use domain_billing::{EntryType, LedgerEntry, NewLedgerEntry};
use infra_db::repositories::{LedgerListFilter, LedgerStatement};
use infra_db::LedgerRepository;

use crate::auth::BusinessScope;
use crate::dto::ledger::*;
use crate::error::ApiError;
use crate::AppState;

/// Lists ledger postings with running balances
pub async fn list_ledger(
    State(state): State<AppState>,
    Extension(BusinessScope(business_id)): Extension<BusinessScope>,
    Query(query): Query<LedgerListQuery>,
) -> Result<Json<LedgerStatement>, ApiError> {
    let entry_type = query
        .entry_type
        .as_deref()
        .map(EntryType::parse)
        .transpose()?;

    let statement = LedgerRepository::new(state.pool.clone())
        .list(
            business_id,
            LedgerListFilter {
                start_date: query.start_date,
                end_date: query.end_date,
                party: query.party,
                entry_type,
            },
        )
        .await?;
    Ok(Json(statement))
}

/// Records a manual (MANUAL or EXPENSE) ledger posting
pub async fn create_entry(
    State(state): State<AppState>,
    Extension(BusinessScope(business_id)): Extension<BusinessScope>,
    Json(body): Json<CreateLedgerEntryBody>,
) -> Result<(StatusCode, Json<LedgerEntry>), ApiError> {
    let entry = NewLedgerEntry::manual(
        business_id,
        body.date,
        body.entry_type,
        body.amount,
        body.party_name,
        body.description,
        body.reference_type,
    )?;

    let created = LedgerRepository::new(state.pool.clone())
        .create_manual(entry)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Resolves one party's ledger position
pub async fn party_balance(
    State(state): State<AppState>,
    Extension(BusinessScope(business_id)): Extension<BusinessScope>,
    Query(query): Query<BalanceQuery>,
) -> Result<Json<PartyBalanceResponse>, ApiError> {
    let repo = LedgerRepository::new(state.pool.clone());
    let net_balance = repo.net_party_balance(business_id, &query.party).await?;

    Ok(Json(PartyBalanceResponse {
        party: query.party,
        net_balance,
        available_balance: domain_billing::available_credit(net_balance),
    }))
}
