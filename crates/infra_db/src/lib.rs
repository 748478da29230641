//! Infrastructure database layer
//!
//! This crate provides PostgreSQL access for the billing system using SQLx,
//! following the repository pattern: repositories encapsulate SQL and map
//! between database rows and domain types.
//!
//! The invoice repository doubles as the transaction coordinator: invoice
//! writes, sequence allocation, and correlated ledger postings happen inside
//! one database transaction, so a failure at any step leaves no partial
//! state behind.

pub mod error;
pub mod pool;
pub mod repositories;

pub use error::{DatabaseError, RepositoryError};
pub use pool::{create_pool, run_migrations, DatabaseConfig, DatabasePool};
pub use repositories::{
    InvoiceListFilter, InvoiceRepository, LedgerRepository, NewInvoiceRequest,
    UpdateInvoiceRequest,
};
