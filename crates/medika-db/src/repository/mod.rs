//! # Repository Module
//!
//! Repository implementations, one per aggregate. The stock ledger and the
//! transaction engine live here too, because they need to share sqlx
//! transactions with the row operations they orchestrate.

pub mod medicine;
pub mod patient;
pub mod reports;
pub mod service;
pub mod settings;
pub mod stock;
pub mod transaction;
pub mod visit;
