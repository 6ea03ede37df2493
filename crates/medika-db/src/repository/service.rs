//! # Service Repository
//!
//! CRUD for clinical services. A service that has been sold can never be
//! deleted, only deactivated, so historical line items keep their reference.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use medika_core::Service;

const SERVICE_COLUMNS: &str = "id, name, description, price_cents, is_active, created_at, updated_at";

/// Repository for service database operations.
#[derive(Debug, Clone)]
pub struct ServiceRepository {
    pool: SqlitePool,
}

impl ServiceRepository {
    /// Creates a new ServiceRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ServiceRepository { pool }
    }

    /// Inserts a new service (id and timestamps generated beforehand).
    pub async fn insert(&self, service: &Service) -> DbResult<Service> {
        debug!(id = %service.id, name = %service.name, "Inserting service");

        sqlx::query(
            r#"
            INSERT INTO services (
                id, name, description, price_cents, is_active, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&service.id)
        .bind(&service.name)
        .bind(&service.description)
        .bind(service.price_cents)
        .bind(service.is_active)
        .bind(service.created_at)
        .bind(service.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(service.clone())
    }

    /// Gets a service by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Service>> {
        let service = sqlx::query_as::<_, Service>(&format!(
            "SELECT {} FROM services WHERE id = ?",
            SERVICE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(service)
    }

    /// Lists services sorted by name.
    pub async fn list(&self, active_only: bool) -> DbResult<Vec<Service>> {
        let services = if active_only {
            sqlx::query_as::<_, Service>(&format!(
                "SELECT {} FROM services WHERE is_active = 1 ORDER BY name",
                SERVICE_COLUMNS
            ))
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query_as::<_, Service>(&format!(
                "SELECT {} FROM services ORDER BY name",
                SERVICE_COLUMNS
            ))
            .fetch_all(&self.pool)
            .await?
        };

        Ok(services)
    }

    /// Updates an existing service.
    pub async fn update(&self, service: &Service) -> DbResult<()> {
        debug!(id = %service.id, "Updating service");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE services SET
                name = ?, description = ?, price_cents = ?, is_active = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&service.name)
        .bind(&service.description)
        .bind(service.price_cents)
        .bind(service.is_active)
        .bind(now)
        .bind(&service.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Service", &service.id));
        }

        Ok(())
    }

    /// Deletes a service, or deactivates it when transaction line items
    /// reference it.
    ///
    /// ## Returns
    /// * `Ok(true)` - the row was deleted
    /// * `Ok(false)` - the service was deactivated instead
    pub async fn delete(&self, id: &str) -> DbResult<bool> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM services WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        if exists.is_none() {
            return Err(DbError::not_found("Service", id));
        }

        let referenced: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM transaction_services WHERE service_id = ?")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;

        let deleted = if referenced > 0 {
            sqlx::query("UPDATE services SET is_active = 0, updated_at = ? WHERE id = ?")
                .bind(Utc::now())
                .bind(id)
                .execute(&mut *tx)
                .await?;
            debug!(id = %id, "Service referenced by sales, deactivated instead of deleted");
            false
        } else {
            sqlx::query("DELETE FROM services WHERE id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            debug!(id = %id, "Service deleted");
            true
        };

        tx.commit().await?;
        Ok(deleted)
    }
}

/// Helper to generate a new service ID.
pub fn generate_service_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{seed_patient, seed_service, setup_db};
    use medika_core::{NewTransaction, PaymentMethod, PaymentStatus, ServiceLine};

    #[tokio::test]
    async fn test_list_active_only() {
        let db = setup_db().await;
        seed_service(&db, "General consultation", 50_000_00, true).await;
        seed_service(&db, "Retired procedure", 10_000_00, false).await;

        assert_eq!(db.services().list(false).await.unwrap().len(), 2);

        let active = db.services().list(true).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "General consultation");
    }

    #[tokio::test]
    async fn test_delete_unreferenced() {
        let db = setup_db().await;
        let service = seed_service(&db, "Wound care", 25_000_00, true).await;

        assert!(db.services().delete(&service.id).await.unwrap());
        assert!(db.services().get_by_id(&service.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_referenced_deactivates() {
        let db = setup_db().await;
        let patient = seed_patient(&db, "Siti Rahma").await;
        let service = seed_service(&db, "General consultation", 50_000_00, true).await;

        db.transactions()
            .create(&NewTransaction {
                patient_id: patient.id,
                payment_method: PaymentMethod::Cash,
                payment_status: PaymentStatus::Paid,
                notes: None,
                services: vec![ServiceLine {
                    service_id: service.id.clone(),
                    quantity: 1,
                }],
                medicines: vec![],
            })
            .await
            .unwrap();

        assert!(!db.services().delete(&service.id).await.unwrap());

        let reloaded = db.services().get_by_id(&service.id).await.unwrap().unwrap();
        assert!(!reloaded.is_active);
    }
}
