//! Per-business invoice number allocation

use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use core_kernel::BusinessId;

use crate::error::DatabaseError;

/// Allocates the next invoice number for a business.
///
/// Runs as an atomic increment-and-fetch on a dedicated counter row, inside
/// the caller's transaction: two concurrent allocations for the same business
/// serialize on the row lock and never observe the same value, and a rolled
/// back invoice write also rolls back its allocation, leaving no gap.
pub async fn next_invoice_number(
    tx: &mut Transaction<'_, Postgres>,
    business_id: BusinessId,
) -> Result<i64, DatabaseError> {
    let (sequence,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO invoice_counters (business_id, sequence)
        VALUES ($1, 1)
        ON CONFLICT (business_id)
        DO UPDATE SET sequence = invoice_counters.sequence + 1
        RETURNING sequence
        "#,
    )
    .bind(Uuid::from(business_id))
    .fetch_one(&mut **tx)
    .await?;

    Ok(sequence)
}
