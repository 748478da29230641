//! Shared test utilities
//!
//! Builders and fixtures for constructing billing test data with sensible
//! defaults, plus a containerized Postgres for repository tests.

pub mod builders;
pub mod database;
pub mod fixtures;
pub mod generators;

pub use builders::{InvoiceBuilder, LineItemBuilder};
pub use database::TestDatabase;
pub use fixtures::{MoneyFixtures, StringFixtures, TemporalFixtures};
