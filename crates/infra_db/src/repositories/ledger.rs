//! Ledger repository
//!
//! Balances are never stored: every resolution is an aggregate over the
//! committed postings, so a reader can never observe a stale cached value.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use core_kernel::{BusinessId, InvoiceId, LedgerEntryId};
use domain_billing::{
    available_credit, with_running_balance, EntryType, LedgerEntry, LedgerLine, NewLedgerEntry,
    ReferenceType,
};

use crate::error::{DatabaseError, RepositoryError};

/// Repository for ledger postings and balance resolution
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: PgPool,
}

/// Filters for a ledger statement query
#[derive(Debug, Clone, Default)]
pub struct LedgerListFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Case-insensitive substring match on the party name
    pub party: Option<String>,
    pub entry_type: Option<EntryType>,
}

/// A statement: entries in chronological order with running balances
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerStatement {
    /// Business-wide balance accumulated strictly before the start date
    pub opening_balance: Decimal,
    pub closing_balance: Decimal,
    pub entries: Vec<LedgerLine>,
}

impl LedgerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a pre-validated manual posting
    pub async fn create_manual(
        &self,
        entry: NewLedgerEntry,
    ) -> Result<LedgerEntry, RepositoryError> {
        let created = insert_entry(&self.pool, &entry).await?;
        Ok(created)
    }

    /// Signed net position for one party: Σcredit − Σdebit over exact name
    /// matches
    pub async fn net_party_balance(
        &self,
        business_id: BusinessId,
        party_name: &str,
    ) -> Result<Decimal, RepositoryError> {
        let net = net_party_balance_with(&self.pool, business_id, party_name).await?;
        Ok(net)
    }

    /// The party's spendable credit: net position floored at zero
    pub async fn party_available_credit(
        &self,
        business_id: BusinessId,
        party_name: &str,
    ) -> Result<Decimal, RepositoryError> {
        let net = self.net_party_balance(business_id, party_name).await?;
        Ok(available_credit(net))
    }

    /// Business-wide net balance over postings dated strictly before `start`
    pub async fn opening_balance_before(
        &self,
        business_id: BusinessId,
        start: NaiveDate,
    ) -> Result<Decimal, RepositoryError> {
        let net: Option<Decimal> = sqlx::query_scalar(
            r#"
            SELECT SUM(CASE WHEN entry_type = 'CREDIT' THEN amount ELSE -amount END)
            FROM ledger_entries
            WHERE business_id = $1 AND entry_date < $2
            "#,
        )
        .bind(Uuid::from(business_id))
        .bind(start)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        Ok(net.unwrap_or(Decimal::ZERO))
    }

    /// Lists postings matching the filter, oldest first, each row carrying
    /// the balance after it was applied
    pub async fn list(
        &self,
        business_id: BusinessId,
        filter: LedgerListFilter,
    ) -> Result<LedgerStatement, RepositoryError> {
        let opening_balance = match filter.start_date {
            Some(start) => self.opening_balance_before(business_id, start).await?,
            None => Decimal::ZERO,
        };

        let mut query = QueryBuilder::<Postgres>::new(
            "SELECT id, business_id, entry_date, entry_type, amount, party_name, \
             reference_type, reference_id, description, created_at \
             FROM ledger_entries WHERE business_id = ",
        );
        query.push_bind(Uuid::from(business_id));

        if let Some(start) = filter.start_date {
            query.push(" AND entry_date >= ").push_bind(start);
        }
        if let Some(end) = filter.end_date {
            query.push(" AND entry_date <= ").push_bind(end);
        }
        if let Some(party) = &filter.party {
            query
                .push(" AND party_name ILIKE ")
                .push_bind(format!("%{}%", party));
        }
        if let Some(entry_type) = filter.entry_type {
            query.push(" AND entry_type = ").push_bind(entry_type.as_str());
        }
        query.push(" ORDER BY entry_date, created_at");

        let rows: Vec<LedgerRow> = query
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::from)?;

        let entries = rows
            .into_iter()
            .map(LedgerRow::into_domain)
            .collect::<Result<Vec<_>, _>>()?;

        let entries = with_running_balance(entries, opening_balance);
        let closing_balance = entries
            .last()
            .map(|line| line.balance_after_transaction)
            .unwrap_or(opening_balance);

        Ok(LedgerStatement {
            opening_balance,
            closing_balance,
            entries,
        })
    }
}

/// Signed net position for one party using the caller's executor, so the
/// invoice coordinator can resolve credit inside its own transaction
pub(crate) async fn net_party_balance_with<'e, E>(
    executor: E,
    business_id: BusinessId,
    party_name: &str,
) -> Result<Decimal, DatabaseError>
where
    E: sqlx::PgExecutor<'e>,
{
    let net: Option<Decimal> = sqlx::query_scalar(
        r#"
        SELECT SUM(CASE WHEN entry_type = 'CREDIT' THEN amount ELSE -amount END)
        FROM ledger_entries
        WHERE business_id = $1 AND party_name = $2
        "#,
    )
    .bind(Uuid::from(business_id))
    .bind(party_name)
    .fetch_one(executor)
    .await?;

    Ok(net.unwrap_or(Decimal::ZERO))
}

/// Inserts one posting using the caller's executor, so the invoice
/// coordinator can write postings inside its own transaction
pub(crate) async fn insert_entry<'e, E>(
    executor: E,
    entry: &NewLedgerEntry,
) -> Result<LedgerEntry, DatabaseError>
where
    E: sqlx::PgExecutor<'e>,
{
    let id = LedgerEntryId::new_v7();
    let created_at = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO ledger_entries (
            id, business_id, entry_date, entry_type, amount,
            party_name, reference_type, reference_id, description, created_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#,
    )
    .bind(Uuid::from(id))
    .bind(Uuid::from(entry.business_id))
    .bind(entry.date)
    .bind(entry.entry_type.as_str())
    .bind(entry.amount)
    .bind(&entry.party_name)
    .bind(entry.reference_type.as_str())
    .bind(entry.reference_id.map(Uuid::from))
    .bind(&entry.description)
    .bind(created_at)
    .execute(executor)
    .await?;

    Ok(LedgerEntry {
        id,
        business_id: entry.business_id,
        date: entry.date,
        entry_type: entry.entry_type,
        amount: entry.amount,
        party_name: entry.party_name.clone(),
        reference_type: entry.reference_type,
        reference_id: entry.reference_id,
        description: entry.description.clone(),
        created_at,
    })
}

/// True when any posting still references the invoice
pub(crate) async fn has_invoice_postings<'e, E>(
    executor: E,
    business_id: BusinessId,
    invoice_id: InvoiceId,
) -> Result<bool, DatabaseError>
where
    E: sqlx::PgExecutor<'e>,
{
    let exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM ledger_entries
            WHERE business_id = $1 AND reference_type = 'INVOICE' AND reference_id = $2
        )
        "#,
    )
    .bind(Uuid::from(business_id))
    .bind(Uuid::from(invoice_id))
    .fetch_one(executor)
    .await?;

    Ok(exists)
}

#[derive(Debug, sqlx::FromRow)]
struct LedgerRow {
    id: Uuid,
    business_id: Uuid,
    entry_date: NaiveDate,
    entry_type: String,
    amount: Decimal,
    party_name: Option<String>,
    reference_type: String,
    reference_id: Option<Uuid>,
    description: Option<String>,
    created_at: DateTime<Utc>,
}

impl LedgerRow {
    fn into_domain(self) -> Result<LedgerEntry, DatabaseError> {
        let entry_type = EntryType::parse(&self.entry_type)
            .map_err(|e| DatabaseError::SerializationError(e.to_string()))?;
        let reference_type = ReferenceType::parse(&self.reference_type)
            .map_err(|e| DatabaseError::SerializationError(e.to_string()))?;

        Ok(LedgerEntry {
            id: LedgerEntryId::from(self.id),
            business_id: BusinessId::from(self.business_id),
            date: self.entry_date,
            entry_type,
            amount: self.amount,
            party_name: self.party_name,
            reference_type,
            reference_id: self.reference_id.map(InvoiceId::from),
            description: self.description,
            created_at: self.created_at,
        })
    }
}
