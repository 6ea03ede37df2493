//! # medika-core: Pure Domain Logic for Medika Clinic
//!
//! This crate is the heart of the clinic backend. It holds the domain types
//! shared between the database layer and the HTTP surface, the Money type,
//! the domain error taxonomy, and input validation: all as pure code with
//! zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! Web UI (tabs: dashboard, patients, medicines, transactions, ...)
//!      │  JSON over HTTP
//!      ▼
//! apps/server (axum handlers)
//!      │
//!      ▼
//! medika-core (THIS CRATE)      ◄── types, Money, errors, validation
//!      │
//!      ▼
//! medika-db (SQLite layer)      ◄── repositories, ledger, migrations
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Patient, Medicine, Transaction, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Design Principles
//!
//! 1. **Pure functions**: deterministic, no side effects
//! 2. **No I/O**: database, network, and file system access are forbidden here
//! 3. **Integer money**: all monetary values are cents (i64), floats never
//!    touch currency
//! 4. **Explicit errors**: all errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity of a single line item or stock movement.
///
/// Prevents accidental over-entry (e.g. typing 1000 instead of 10) in the
/// dispensing and restocking forms.
pub const MAX_ITEM_QUANTITY: i64 = 999;
