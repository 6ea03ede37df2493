//! # medika-db: Database Layer for Medika Clinic
//!
//! This crate provides database access for the clinic backend. It uses
//! SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! axum handler (create_transaction)
//!      │
//!      ▼
//! medika-db (THIS CRATE)
//!   ├── pool.rs         SqlitePool + Database handle
//!   ├── migrations.rs   embedded migrations
//!   ├── error.rs        DbError (storage + domain)
//!   └── repository/     patient, medicine, service, stock (ledger),
//!                       transaction (engine), visit, settings, reports
//!      │
//!      ▼
//! SQLite database (WAL mode, foreign keys ON)
//! ```
//!
//! ## Atomicity Contract
//!
//! Every public operation that touches more than one row runs inside a
//! single sqlx transaction. The ledger and the visit recorder expose
//! `&mut SqliteConnection` entry points so the transaction engine composes
//! them into its own unit of work; partial application is never committed.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use medika_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/medika.db")).await?;
//! let detail = db.transactions().create(&input).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::DbError;
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::medicine::MedicineRepository;
pub use repository::patient::PatientRepository;
pub use repository::reports::ReportRepository;
pub use repository::service::ServiceRepository;
pub use repository::settings::SettingsRepository;
pub use repository::stock::StockRepository;
pub use repository::transaction::TransactionRepository;
pub use repository::visit::VisitRepository;

// =============================================================================
// Test Support
// =============================================================================

/// Shared helpers for the repository tests: an in-memory database plus row
/// seeding that bypasses the API layer.
#[cfg(test)]
pub(crate) mod testing {
    use chrono::Utc;
    use uuid::Uuid;

    pub(crate) use crate::pool::Database;
    use crate::pool::DbConfig;
    use medika_core::{Medicine, Patient, Service};

    /// Creates a fresh in-memory database with migrations applied.
    pub(crate) async fn setup_db() -> Database {
        Database::new(DbConfig::in_memory())
            .await
            .expect("in-memory database")
    }

    pub(crate) async fn seed_patient(db: &Database, name: &str) -> Patient {
        let now = Utc::now();
        db.patients()
            .insert(&Patient {
                id: Uuid::new_v4().to_string(),
                name: name.to_string(),
                date_of_birth: None,
                gender: None,
                phone: None,
                address: None,
                notes: None,
                created_at: now,
                updated_at: now,
            })
            .await
            .expect("seed patient")
    }

    pub(crate) async fn seed_medicine(
        db: &Database,
        name: &str,
        price_cents: i64,
        stock: i64,
        minimum: i64,
    ) -> Medicine {
        let now = Utc::now();
        db.medicines()
            .insert(&Medicine {
                id: Uuid::new_v4().to_string(),
                name: name.to_string(),
                unit: "tablet".to_string(),
                price_cents,
                stock_quantity: stock,
                minimum_stock: minimum,
                expiry_date: None,
                supplier: None,
                created_at: now,
                updated_at: now,
            })
            .await
            .expect("seed medicine")
    }

    pub(crate) async fn seed_service(
        db: &Database,
        name: &str,
        price_cents: i64,
        is_active: bool,
    ) -> Service {
        let now = Utc::now();
        db.services()
            .insert(&Service {
                id: Uuid::new_v4().to_string(),
                name: name.to_string(),
                description: None,
                price_cents,
                is_active,
                created_at: now,
                updated_at: now,
            })
            .await
            .expect("seed service")
    }
}
