//! Core Kernel - Foundational types for the billing system
//!
//! This crate provides the building blocks used across all domain modules:
//! - Deterministic 2-decimal money rounding
//! - Strongly-typed identifiers
//! - The shared error taxonomy

pub mod error;
pub mod identifiers;
pub mod money;

pub use error::CoreError;
pub use identifiers::{BusinessId, InvoiceId, LedgerEntryId};
pub use money::{percent_of, round2};
