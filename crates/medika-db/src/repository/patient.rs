//! # Patient Repository
//!
//! CRUD for patient records. Patients referenced by transactions or visits
//! cannot be deleted; history stays intact.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use medika_core::{CoreError, Patient};

const PATIENT_COLUMNS: &str =
    "id, name, date_of_birth, gender, phone, address, notes, created_at, updated_at";

/// Repository for patient database operations.
#[derive(Debug, Clone)]
pub struct PatientRepository {
    pool: SqlitePool,
}

impl PatientRepository {
    /// Creates a new PatientRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PatientRepository { pool }
    }

    /// Inserts a new patient (id and timestamps generated beforehand).
    pub async fn insert(&self, patient: &Patient) -> DbResult<Patient> {
        debug!(id = %patient.id, "Inserting patient");

        sqlx::query(
            r#"
            INSERT INTO patients (
                id, name, date_of_birth, gender, phone, address, notes, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&patient.id)
        .bind(&patient.name)
        .bind(patient.date_of_birth)
        .bind(&patient.gender)
        .bind(&patient.phone)
        .bind(&patient.address)
        .bind(&patient.notes)
        .bind(patient.created_at)
        .bind(patient.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(patient.clone())
    }

    /// Gets a patient by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Patient>> {
        let patient = sqlx::query_as::<_, Patient>(&format!(
            "SELECT {} FROM patients WHERE id = ?",
            PATIENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(patient)
    }

    /// Lists patients sorted by name, optionally filtered by a name search.
    pub async fn list(&self, search: Option<&str>, limit: u32) -> DbResult<Vec<Patient>> {
        let patients = match search.map(str::trim).filter(|s| !s.is_empty()) {
            Some(term) => {
                let pattern = format!("%{}%", term);
                sqlx::query_as::<_, Patient>(&format!(
                    "SELECT {} FROM patients WHERE name LIKE ? ORDER BY name LIMIT ?",
                    PATIENT_COLUMNS
                ))
                .bind(pattern)
                .bind(limit as i64)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Patient>(&format!(
                    "SELECT {} FROM patients ORDER BY name LIMIT ?",
                    PATIENT_COLUMNS
                ))
                .bind(limit as i64)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(patients)
    }

    /// Updates an existing patient.
    pub async fn update(&self, patient: &Patient) -> DbResult<()> {
        debug!(id = %patient.id, "Updating patient");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE patients SET
                name = ?, date_of_birth = ?, gender = ?, phone = ?,
                address = ?, notes = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&patient.name)
        .bind(patient.date_of_birth)
        .bind(&patient.gender)
        .bind(&patient.phone)
        .bind(&patient.address)
        .bind(&patient.notes)
        .bind(now)
        .bind(&patient.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Patient", &patient.id));
        }

        Ok(())
    }

    /// Deletes a patient. Refused while any transaction or visit references
    /// the patient, so billing and clinical history stay intact.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let referenced: i64 = sqlx::query_scalar(
            r#"
            SELECT (SELECT COUNT(*) FROM transactions WHERE patient_id = ?1)
                 + (SELECT COUNT(*) FROM visit_records WHERE patient_id = ?1)
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        if referenced > 0 {
            return Err(CoreError::InvalidArgument(
                "patient has transactions or visits and cannot be deleted".to_string(),
            )
            .into());
        }

        let result = sqlx::query("DELETE FROM patients WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Patient", id));
        }

        debug!(id = %id, "Patient deleted");
        Ok(())
    }
}

/// Helper to generate a new patient ID.
pub fn generate_patient_id() -> String {
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
    async fn test_crud_roundtrip() {
        let db = setup_db().await;
        let patients = db.patients();

        let mut patient = seed_patient(&db, "Siti Rahma").await;
        assert!(patients.get_by_id(&patient.id).await.unwrap().is_some());

        patient.phone = Some("0812-0000-1111".to_string());
        patients.update(&patient).await.unwrap();

        let reloaded = patients.get_by_id(&patient.id).await.unwrap().unwrap();
        assert_eq!(reloaded.phone.as_deref(), Some("0812-0000-1111"));

        patients.delete(&patient.id).await.unwrap();
        assert!(patients.get_by_id(&patient.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_search() {
        let db = setup_db().await;
        seed_patient(&db, "Siti Rahma").await;
        seed_patient(&db, "Budi Santoso").await;

        let hits = db.patients().list(Some("siti"), 20).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Siti Rahma");

        let all = db.patients().list(None, 20).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_refused_when_referenced() {
        let db = setup_db().await;
        let patient = seed_patient(&db, "Siti Rahma").await;
        let service = seed_service(&db, "General consultation", 50_000_00, true).await;

        db.transactions()
            .create(&NewTransaction {
                patient_id: patient.id.clone(),
                payment_method: PaymentMethod::Cash,
                payment_status: PaymentStatus::Pending,
                notes: None,
                services: vec![ServiceLine {
                    service_id: service.id,
                    quantity: 1,
                }],
                medicines: vec![],
            })
            .await
            .unwrap();

        let err = db.patients().delete(&patient.id).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InvalidArgument(_))
        ));
    }
}
