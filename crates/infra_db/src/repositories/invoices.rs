//! Invoice repository and transaction coordinator
//!
//! Creating or editing an invoice is never just a row write: the sequence
//! allocation, the invoice record, and its correlated ledger postings all
//! commit or roll back together. This module owns that transaction scope.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::info;
use uuid::Uuid;

use core_kernel::{BusinessId, InvoiceId};
use domain_billing::{
    available_credit, calculate_invoice_amounts, invoice_postings, sales_credit_posting, CalcMode,
    CalculationInput, CustomerDetails, Invoice, InvoiceLineItem, InvoiceStatus, LineItemInput,
};

use crate::error::{DatabaseError, RepositoryError};
use crate::repositories::ledger;
use crate::repositories::sequence;

/// Input for creating an invoice
///
/// Monetary fields carry caller intent only; every derived amount is
/// recomputed by the calculator before anything is written.
#[derive(Debug, Clone)]
pub struct NewInvoiceRequest {
    pub customer: CustomerDetails,
    pub invoice_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub document_number: Option<String>,
    pub items: Vec<LineItemInput>,
    pub invoice_gst_percent: Option<Decimal>,
    pub paid_amount: Decimal,
    pub use_available_balance: bool,
    pub status: Option<InvoiceStatus>,
}

/// Input for editing an invoice
///
/// `None` fields keep their stored value. Settlement inputs (paid amount,
/// opening balance, the balance flag) are deliberately absent: an edit
/// recomputes totals from the new items against the settlement captured at
/// creation time.
#[derive(Debug, Clone)]
pub struct UpdateInvoiceRequest {
    pub customer: Option<CustomerDetails>,
    pub invoice_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub document_number: Option<String>,
    pub items: Vec<LineItemInput>,
    pub invoice_gst_percent: Option<Decimal>,
    pub status: Option<InvoiceStatus>,
}

/// Filters for listing invoices
#[derive(Debug, Clone, Default)]
pub struct InvoiceListFilter {
    /// Case-insensitive substring match on the customer name
    pub customer: Option<String>,
    pub status: Option<InvoiceStatus>,
}

/// Repository for invoices, coordinating invoice and ledger writes
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: PgPool,
}

impl InvoiceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates an invoice atomically with its ledger postings.
    ///
    /// Inside one transaction: resolves the customer's available credit,
    /// computes all amounts, allocates the next invoice number, writes the
    /// invoice, and writes its postings. Any failure rolls the whole set
    /// back, sequence allocation included.
    pub async fn create(
        &self,
        business_id: BusinessId,
        request: NewInvoiceRequest,
    ) -> Result<Invoice, RepositoryError> {
        let customer = request.customer.normalized()?;

        let mut tx = self.pool.begin().await?;

        let net = ledger::net_party_balance_with(&mut *tx, business_id, &customer.name).await?;
        let opening_balance = available_credit(net);

        let amounts = calculate_invoice_amounts(
            &CalculationInput {
                items: request.items,
                invoice_gst_percent: request.invoice_gst_percent,
                opening_balance,
                paid_amount: request.paid_amount,
                use_available_balance: request.use_available_balance,
            },
            CalcMode::Strict,
        )?;

        let invoice_number = sequence::next_invoice_number(&mut tx, business_id).await?;

        let now = Utc::now();
        let invoice = Invoice {
            id: InvoiceId::new_v7(),
            business_id,
            invoice_number,
            document_number: request.document_number,
            customer,
            invoice_date: request.invoice_date,
            due_date: request.due_date,
            items: amounts.items,
            subtotal: amounts.subtotal,
            gst_total: amounts.gst_total,
            other_tax_total: amounts.other_tax_total,
            grand_total: amounts.grand_total,
            opening_balance: amounts.opening_balance,
            paid_amount: amounts.paid_amount,
            use_available_balance: amounts.use_available_balance,
            applied_balance: amounts.applied_balance,
            remaining_balance: amounts.remaining_balance,
            final_payable_amount: amounts.final_payable_amount,
            status: request.status.unwrap_or_default(),
            is_deleted: false,
            created_at: now,
            updated_at: now,
        };

        insert_invoice(&mut tx, &invoice).await?;
        for posting in invoice_postings(&invoice) {
            ledger::insert_entry(&mut *tx, &posting).await?;
        }

        tx.commit().await?;

        info!(
            invoice_id = %invoice.id,
            invoice_number = invoice.invoice_number,
            grand_total = %invoice.grand_total,
            "Created invoice"
        );
        Ok(invoice)
    }

    /// Fetches one live invoice within the tenant scope
    pub async fn find_by_id(
        &self,
        business_id: BusinessId,
        id: InvoiceId,
    ) -> Result<Invoice, RepositoryError> {
        let row: Option<InvoiceRow> = sqlx::query_as(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices \
             WHERE id = $1 AND business_id = $2 AND is_deleted = FALSE"
        ))
        .bind(Uuid::from(id))
        .bind(Uuid::from(business_id))
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        row.ok_or_else(|| RepositoryError::not_found("Invoice", id))?
            .into_domain()
            .map_err(Into::into)
    }

    /// Lists live invoices, newest invoice date first, most recently
    /// created first within a date
    pub async fn list(
        &self,
        business_id: BusinessId,
        filter: InvoiceListFilter,
    ) -> Result<Vec<Invoice>, RepositoryError> {
        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices \
             WHERE is_deleted = FALSE AND business_id = "
        ));
        query.push_bind(Uuid::from(business_id));

        if let Some(customer) = &filter.customer {
            query
                .push(" AND customer->>'name' ILIKE ")
                .push_bind(format!("%{}%", customer));
        }
        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status.as_str());
        }
        query.push(" ORDER BY invoice_date DESC, created_at DESC");

        let rows: Vec<InvoiceRow> = query
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::from)?;

        rows.into_iter()
            .map(|row| row.into_domain().map_err(Into::into))
            .collect()
    }

    /// Recomputes item totals for an invoice and replaces its sales posting.
    ///
    /// The settlement captured at creation time (opening balance, paid
    /// amount, balance flag, applied balance, final payable) is persisted
    /// unchanged; payment and applied-balance postings are never rewritten,
    /// so the stored fields keep matching them.
    pub async fn update(
        &self,
        business_id: BusinessId,
        id: InvoiceId,
        request: UpdateInvoiceRequest,
    ) -> Result<Invoice, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row: Option<InvoiceRow> = sqlx::query_as(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices \
             WHERE id = $1 AND business_id = $2 AND is_deleted = FALSE FOR UPDATE"
        ))
        .bind(Uuid::from(id))
        .bind(Uuid::from(business_id))
        .fetch_optional(&mut *tx)
        .await
        .map_err(DatabaseError::from)?;

        let existing = row
            .ok_or_else(|| RepositoryError::not_found("Invoice", id))?
            .into_domain()?;

        let customer = match request.customer {
            Some(customer) => customer.normalized()?,
            None => existing.customer.clone(),
        };

        // The calculator runs to derive and validate the new totals; its
        // settlement outputs are discarded in favour of the stored fields
        let amounts = calculate_invoice_amounts(
            &CalculationInput {
                items: request.items,
                invoice_gst_percent: request.invoice_gst_percent,
                opening_balance: existing.opening_balance,
                paid_amount: existing.paid_amount,
                use_available_balance: existing.use_available_balance,
            },
            CalcMode::Strict,
        )?;

        let mut updated = existing.with_revised_totals(amounts);
        updated.customer = customer;
        updated.document_number = request.document_number.or(updated.document_number);
        updated.invoice_date = request.invoice_date.unwrap_or(updated.invoice_date);
        updated.due_date = request.due_date.or(updated.due_date);
        updated.status = request.status.unwrap_or(updated.status);
        updated.updated_at = Utc::now();

        update_invoice_row(&mut tx, &updated).await?;

        // Replace the sales CREDIT in place; insert it if a legacy invoice
        // somehow lacks one
        let credit = sales_credit_posting(&updated);
        let replaced = sqlx::query(
            r#"
            UPDATE ledger_entries
            SET entry_date = $1, amount = $2, party_name = $3, description = $4
            WHERE business_id = $5 AND reference_type = 'INVOICE'
              AND reference_id = $6 AND entry_type = 'CREDIT'
            "#,
        )
        .bind(credit.date)
        .bind(credit.amount)
        .bind(&credit.party_name)
        .bind(&credit.description)
        .bind(Uuid::from(business_id))
        .bind(Uuid::from(updated.id))
        .execute(&mut *tx)
        .await
        .map_err(DatabaseError::from)?;

        if replaced.rows_affected() == 0 {
            ledger::insert_entry(&mut *tx, &credit).await?;
        }

        tx.commit().await?;

        info!(invoice_id = %updated.id, grand_total = %updated.grand_total, "Updated invoice");
        Ok(updated)
    }

    /// Changes lifecycle status only; amounts and postings stay untouched
    pub async fn update_status(
        &self,
        business_id: BusinessId,
        id: InvoiceId,
        status: InvoiceStatus,
    ) -> Result<Invoice, RepositoryError> {
        let row: Option<InvoiceRow> = sqlx::query_as(&format!(
            "UPDATE invoices SET status = $1, updated_at = $2 \
             WHERE id = $3 AND business_id = $4 AND is_deleted = FALSE \
             RETURNING {INVOICE_COLUMNS}"
        ))
        .bind(status.as_str())
        .bind(Utc::now())
        .bind(Uuid::from(id))
        .bind(Uuid::from(business_id))
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        row.ok_or_else(|| RepositoryError::not_found("Invoice", id))?
            .into_domain()
            .map_err(Into::into)
    }

    /// Soft-deletes an invoice with no live ledger postings.
    ///
    /// The invoice number is never recycled: the counter only moves forward.
    pub async fn soft_delete(
        &self,
        business_id: BusinessId,
        id: InvoiceId,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        if ledger::has_invoice_postings(&mut *tx, business_id, id).await? {
            return Err(RepositoryError::conflict(
                "Invoice has linked ledger entries and cannot be deleted",
            ));
        }

        let result = sqlx::query(
            "UPDATE invoices SET is_deleted = TRUE, updated_at = $1 \
             WHERE id = $2 AND business_id = $3 AND is_deleted = FALSE",
        )
        .bind(Utc::now())
        .bind(Uuid::from(id))
        .bind(Uuid::from(business_id))
        .execute(&mut *tx)
        .await
        .map_err(DatabaseError::from)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::not_found("Invoice", id));
        }

        tx.commit().await?;

        info!(invoice_id = %id, "Soft-deleted invoice");
        Ok(())
    }
}

const INVOICE_COLUMNS: &str = "id, business_id, invoice_number, document_number, customer, \
    invoice_date, due_date, items, subtotal, gst_total, other_tax_total, grand_total, \
    opening_balance, paid_amount, use_available_balance, applied_balance, remaining_balance, \
    final_payable_amount, status, is_deleted, created_at, updated_at";

async fn insert_invoice(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    invoice: &Invoice,
) -> Result<(), DatabaseError> {
    sqlx::query(
        r#"
        INSERT INTO invoices (
            id, business_id, invoice_number, document_number, customer,
            invoice_date, due_date, items, subtotal, gst_total, other_tax_total,
            grand_total, opening_balance, paid_amount, use_available_balance,
            applied_balance, remaining_balance, final_payable_amount, status,
            is_deleted, created_at, updated_at
        ) VALUES (
            $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11,
            $12, $13, $14, $15, $16, $17, $18, $19, $20, $21, $22
        )
        "#,
    )
    .bind(Uuid::from(invoice.id))
    .bind(Uuid::from(invoice.business_id))
    .bind(invoice.invoice_number)
    .bind(&invoice.document_number)
    .bind(to_json(&invoice.customer)?)
    .bind(invoice.invoice_date)
    .bind(invoice.due_date)
    .bind(to_json(&invoice.items)?)
    .bind(invoice.subtotal)
    .bind(invoice.gst_total)
    .bind(invoice.other_tax_total)
    .bind(invoice.grand_total)
    .bind(invoice.opening_balance)
    .bind(invoice.paid_amount)
    .bind(invoice.use_available_balance)
    .bind(invoice.applied_balance)
    .bind(invoice.remaining_balance)
    .bind(invoice.final_payable_amount)
    .bind(invoice.status.as_str())
    .bind(invoice.is_deleted)
    .bind(invoice.created_at)
    .bind(invoice.updated_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

async fn update_invoice_row(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    invoice: &Invoice,
) -> Result<(), DatabaseError> {
    sqlx::query(
        r#"
        UPDATE invoices SET
            document_number = $1, customer = $2, invoice_date = $3, due_date = $4,
            items = $5, subtotal = $6, gst_total = $7, other_tax_total = $8,
            grand_total = $9, applied_balance = $10, remaining_balance = $11,
            final_payable_amount = $12, status = $13, updated_at = $14
        WHERE id = $15 AND business_id = $16
        "#,
    )
    .bind(&invoice.document_number)
    .bind(to_json(&invoice.customer)?)
    .bind(invoice.invoice_date)
    .bind(invoice.due_date)
    .bind(to_json(&invoice.items)?)
    .bind(invoice.subtotal)
    .bind(invoice.gst_total)
    .bind(invoice.other_tax_total)
    .bind(invoice.grand_total)
    .bind(invoice.applied_balance)
    .bind(invoice.remaining_balance)
    .bind(invoice.final_payable_amount)
    .bind(invoice.status.as_str())
    .bind(invoice.updated_at)
    .bind(Uuid::from(invoice.id))
    .bind(Uuid::from(invoice.business_id))
    .execute(&mut **tx)
    .await?;

    Ok(())
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<serde_json::Value, DatabaseError> {
    serde_json::to_value(value).map_err(|e| DatabaseError::SerializationError(e.to_string()))
}

#[derive(Debug, sqlx::FromRow)]
struct InvoiceRow {
    id: Uuid,
    business_id: Uuid,
    invoice_number: i64,
    document_number: Option<String>,
    customer: serde_json::Value,
    invoice_date: NaiveDate,
    due_date: Option<NaiveDate>,
    items: serde_json::Value,
    subtotal: Decimal,
    gst_total: Decimal,
    other_tax_total: Decimal,
    grand_total: Decimal,
    opening_balance: Decimal,
    paid_amount: Decimal,
    use_available_balance: bool,
    applied_balance: Decimal,
    remaining_balance: Decimal,
    final_payable_amount: Decimal,
    status: String,
    is_deleted: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl InvoiceRow {
    fn into_domain(self) -> Result<Invoice, DatabaseError> {
        let customer: CustomerDetails = serde_json::from_value(self.customer)
            .map_err(|e| DatabaseError::SerializationError(e.to_string()))?;
        let items: Vec<InvoiceLineItem> = serde_json::from_value(self.items)
            .map_err(|e| DatabaseError::SerializationError(e.to_string()))?;
        let status = InvoiceStatus::parse(&self.status)
            .map_err(|e| DatabaseError::SerializationError(e.to_string()))?;

        Ok(Invoice {
            id: InvoiceId::from(self.id),
            business_id: BusinessId::from(self.business_id),
            invoice_number: self.invoice_number,
            document_number: self.document_number,
            customer,
            invoice_date: self.invoice_date,
            due_date: self.due_date,
            items,
            subtotal: self.subtotal,
            gst_total: self.gst_total,
            other_tax_total: self.other_tax_total,
            grand_total: self.grand_total,
            opening_balance: self.opening_balance,
            paid_amount: self.paid_amount,
            use_available_balance: self.use_available_balance,
            applied_balance: self.applied_balance,
            remaining_balance: self.remaining_balance,
            final_payable_amount: self.final_payable_amount,
            status,
            is_deleted: self.is_deleted,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
