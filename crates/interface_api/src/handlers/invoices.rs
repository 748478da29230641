//! Invoice handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use rust_decimal::Decimal;
use uuid::Uuid;

use core_kernel::InvoiceId;
use domain_billing::{
    calculate_invoice_amounts, CalcMode, CalculationInput, Invoice, InvoiceAmounts, InvoiceStatus,
};
use infra_db::repositories::InvoiceListFilter;
use infra_db::{InvoiceRepository, LedgerRepository};

use crate::auth::BusinessScope;
use crate::dto::invoices::*;
use crate::error::ApiError;
use crate::AppState;

/// Creates an invoice together with its ledger postings
pub async fn create_invoice(
    State(state): State<AppState>,
    Extension(BusinessScope(business_id)): Extension<BusinessScope>,
    Json(body): Json<CreateInvoiceBody>,
) -> Result<(StatusCode, Json<Invoice>), ApiError> {
    let invoice = InvoiceRepository::new(state.pool.clone())
        .create(business_id, body.into_domain())
        .await?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

/// Lists live invoices, optionally filtered by customer substring and status
pub async fn list_invoices(
    State(state): State<AppState>,
    Extension(BusinessScope(business_id)): Extension<BusinessScope>,
    Query(query): Query<InvoiceListQuery>,
) -> Result<Json<Vec<Invoice>>, ApiError> {
    let status = query
        .status
        .as_deref()
        .map(InvoiceStatus::parse)
        .transpose()?;

    let invoices = InvoiceRepository::new(state.pool.clone())
        .list(
            business_id,
            InvoiceListFilter {
                customer: query.customer,
                status,
            },
        )
        .await?;
    Ok(Json(invoices))
}

/// Gets an invoice by ID
pub async fn get_invoice(
    State(state): State<AppState>,
    Extension(BusinessScope(business_id)): Extension<BusinessScope>,
    Path(id): Path<Uuid>,
) -> Result<Json<Invoice>, ApiError> {
    let invoice = InvoiceRepository::new(state.pool.clone())
        .find_by_id(business_id, InvoiceId::from(id))
        .await?;
    Ok(Json(invoice))
}

/// Recomputes an invoice from new items
pub async fn update_invoice(
    State(state): State<AppState>,
    Extension(BusinessScope(business_id)): Extension<BusinessScope>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateInvoiceBody>,
) -> Result<Json<Invoice>, ApiError> {
    let invoice = InvoiceRepository::new(state.pool.clone())
        .update(business_id, InvoiceId::from(id), body.into_domain())
        .await?;
    Ok(Json(invoice))
}

/// Transitions the invoice lifecycle status
pub async fn update_status(
    State(state): State<AppState>,
    Extension(BusinessScope(business_id)): Extension<BusinessScope>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateStatusBody>,
) -> Result<Json<Invoice>, ApiError> {
    let invoice = InvoiceRepository::new(state.pool.clone())
        .update_status(business_id, InvoiceId::from(id), body.status)
        .await?;
    Ok(Json(invoice))
}

/// Soft-deletes an invoice with no linked ledger postings
pub async fn delete_invoice(
    State(state): State<AppState>,
    Extension(BusinessScope(business_id)): Extension<BusinessScope>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    InvoiceRepository::new(state.pool.clone())
        .soft_delete(business_id, InvoiceId::from(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Computes amounts without persisting anything.
///
/// Uses the lenient calculation policy: out-of-range values are clamped so
/// live feedback never blocks editing. Nothing returned here is trusted at
/// creation time.
pub async fn preview_invoice(
    State(state): State<AppState>,
    Extension(BusinessScope(business_id)): Extension<BusinessScope>,
    Json(body): Json<PreviewInvoiceBody>,
) -> Result<Json<InvoiceAmounts>, ApiError> {
    let opening_balance = match (body.opening_balance, &body.customer_name) {
        (Some(balance), _) => balance,
        (None, Some(name)) => {
            LedgerRepository::new(state.pool.clone())
                .party_available_credit(business_id, name)
                .await?
        }
        (None, None) => Decimal::ZERO,
    };

    let amounts = calculate_invoice_amounts(
        &CalculationInput {
            items: body.items,
            invoice_gst_percent: body.gst_percent,
            opening_balance,
            paid_amount: body.paid_amount,
            use_available_balance: body.use_available_balance,
        },
        CalcMode::Preview,
    )?;

    Ok(Json(amounts))
}
