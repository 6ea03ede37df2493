//! # Medicine Repository
//!
//! Catalog operations for medicines. Stock is deliberately out of reach
//! here: `update` never writes `stock_quantity`, so every stock change flows
//! through the ledger and leaves a movement row.

use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use medika_core::{CoreError, Medicine};

const MEDICINE_COLUMNS: &str = "id, name, unit, price_cents, stock_quantity, minimum_stock, \
                                expiry_date, supplier, created_at, updated_at";

/// Repository for medicine catalog operations.
#[derive(Debug, Clone)]
pub struct MedicineRepository {
    pool: SqlitePool,
}

impl MedicineRepository {
    /// Creates a new MedicineRepository.
    pub fn new(pool: SqlitePool) -> Self {
        MedicineRepository { pool }
    }

    /// Inserts a new medicine (id and timestamps generated beforehand).
    pub async fn insert(&self, medicine: &Medicine) -> DbResult<Medicine> {
        debug!(id = %medicine.id, name = %medicine.name, "Inserting medicine");

        sqlx::query(
            r#"
            INSERT INTO medicines (
                id, name, unit, price_cents, stock_quantity, minimum_stock,
                expiry_date, supplier, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&medicine.id)
        .bind(&medicine.name)
        .bind(&medicine.unit)
        .bind(medicine.price_cents)
        .bind(medicine.stock_quantity)
        .bind(medicine.minimum_stock)
        .bind(medicine.expiry_date)
        .bind(&medicine.supplier)
        .bind(medicine.created_at)
        .bind(medicine.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(medicine.clone())
    }

    /// Gets a medicine by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Medicine>> {
        let medicine = sqlx::query_as::<_, Medicine>(&format!(
            "SELECT {} FROM medicines WHERE id = ?",
            MEDICINE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(medicine)
    }

    /// Lists medicines sorted by name, optionally filtered by a name search.
    pub async fn list(&self, search: Option<&str>, limit: u32) -> DbResult<Vec<Medicine>> {
        let medicines = match search.map(str::trim).filter(|s| !s.is_empty()) {
            Some(term) => {
                let pattern = format!("%{}%", term);
                sqlx::query_as::<_, Medicine>(&format!(
                    "SELECT {} FROM medicines WHERE name LIKE ? ORDER BY name LIMIT ?",
                    MEDICINE_COLUMNS
                ))
                .bind(pattern)
                .bind(limit as i64)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Medicine>(&format!(
                    "SELECT {} FROM medicines ORDER BY name LIMIT ?",
                    MEDICINE_COLUMNS
                ))
                .bind(limit as i64)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(medicines)
    }

    /// Updates the catalog fields of a medicine.
    ///
    /// `stock_quantity` is not written here: stock only changes through the
    /// ledger so a movement row always exists for it.
    pub async fn update(&self, medicine: &Medicine) -> DbResult<()> {
        debug!(id = %medicine.id, "Updating medicine");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE medicines SET
                name = ?, unit = ?, price_cents = ?, minimum_stock = ?,
                expiry_date = ?, supplier = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&medicine.name)
        .bind(&medicine.unit)
        .bind(medicine.price_cents)
        .bind(medicine.minimum_stock)
        .bind(medicine.expiry_date)
        .bind(&medicine.supplier)
        .bind(now)
        .bind(&medicine.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Medicine", &medicine.id));
        }

        Ok(())
    }

    /// Deletes a medicine together with its full movement history.
    ///
    /// Refused with `MedicineInUse` while any transaction line item
    /// references the medicine; dropping it would orphan sold line items.
    /// The history delete and the row delete are one transaction.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let medicine: Option<(String,)> =
            sqlx::query_as("SELECT name FROM medicines WHERE id = ?")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        let (name,) = medicine.ok_or_else(|| DbError::not_found("Medicine", id))?;

        let referenced: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM transaction_medicines WHERE medicine_id = ?")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;

        if referenced > 0 {
            return Err(CoreError::MedicineInUse { name }.into());
        }

        sqlx::query("DELETE FROM stock_movements WHERE medicine_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM medicines WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        debug!(id = %id, "Medicine and movement history deleted");
        Ok(())
    }

    /// Lists medicines at or below their minimum stock threshold.
    pub async fn low_stock(&self) -> DbResult<Vec<Medicine>> {
        let medicines = sqlx::query_as::<_, Medicine>(&format!(
            "SELECT {} FROM medicines WHERE stock_quantity <= minimum_stock ORDER BY name",
            MEDICINE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(medicines)
    }

    /// Lists medicines expiring on or before the given date.
    pub async fn expiring_before(&self, date: NaiveDate) -> DbResult<Vec<Medicine>> {
        let medicines = sqlx::query_as::<_, Medicine>(&format!(
            "SELECT {} FROM medicines \
             WHERE expiry_date IS NOT NULL AND expiry_date <= ? \
             ORDER BY expiry_date",
            MEDICINE_COLUMNS
        ))
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        Ok(medicines)
    }
}

/// Helper to generate a new medicine ID.
pub fn generate_medicine_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{seed_medicine, seed_patient, setup_db};
    use medika_core::{MedicineLine, NewTransaction, PaymentMethod, PaymentStatus};

    #[tokio::test]
    async fn test_update_never_touches_stock() {
        let db = setup_db().await;
        let mut medicine = seed_medicine(&db, "Paracetamol", 500_00, 100, 10).await;

        medicine.price_cents = 600_00;
        medicine.stock_quantity = 0; // must be ignored
        db.medicines().update(&medicine).await.unwrap();

        let reloaded = db.medicines().get_by_id(&medicine.id).await.unwrap().unwrap();
        assert_eq!(reloaded.price_cents, 600_00);
        assert_eq!(reloaded.stock_quantity, 100);
    }

    #[tokio::test]
    async fn test_delete_unreferenced_removes_history() {
        let db = setup_db().await;
        let medicine = seed_medicine(&db, "Paracetamol", 500_00, 100, 10).await;

        db.stock()
            .set_stock_level(&medicine.id, 80, Some("correction"))
            .await
            .unwrap();
        assert_eq!(db.stock().list(Some(&medicine.id)).await.unwrap().len(), 1);

        db.medicines().delete(&medicine.id).await.unwrap();

        assert!(db.medicines().get_by_id(&medicine.id).await.unwrap().is_none());
        assert!(db.stock().list(Some(&medicine.id)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_refused_when_sold() {
        let db = setup_db().await;
        let patient = seed_patient(&db, "Siti Rahma").await;
        let medicine = seed_medicine(&db, "Paracetamol", 500_00, 100, 10).await;

        db.transactions()
            .create(&NewTransaction {
                patient_id: patient.id,
                payment_method: PaymentMethod::Cash,
                payment_status: PaymentStatus::Paid,
                notes: None,
                services: vec![],
                medicines: vec![MedicineLine {
                    medicine_id: medicine.id.clone(),
                    quantity: 1,
                }],
            })
            .await
            .unwrap();

        let err = db.medicines().delete(&medicine.id).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::MedicineInUse { .. })
        ));
        assert!(db.medicines().get_by_id(&medicine.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_low_stock_and_expiry_queries() {
        let db = setup_db().await;
        let mut low = seed_medicine(&db, "Amoxicillin", 800_00, 3, 5).await;
        seed_medicine(&db, "Paracetamol", 500_00, 100, 10).await;

        let alerts = db.medicines().low_stock().await.unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].name, "Amoxicillin");

        low.expiry_date = NaiveDate::from_ymd_opt(2026, 1, 31);
        db.medicines().update(&low).await.unwrap();

        let expiring = db
            .medicines()
            .expiring_before(NaiveDate::from_ymd_opt(2026, 6, 30).unwrap())
            .await
            .unwrap();
        assert_eq!(expiring.len(), 1);
        assert_eq!(expiring[0].id, low.id);
    }
}
