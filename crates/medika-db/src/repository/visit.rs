//! # Visit Record Repository
//!
//! Clinical visit entries. The transaction engine records one visit per sale
//! through [`record_in`] inside its own atomic unit; standalone visits (a
//! consultation without billing) go through [`VisitRepository::record`].

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use medika_core::{CoreError, NewVisitRecord, VisitRecord};

/// Inserts a visit record using the caller's transaction.
///
/// Verifies that the patient (and, when given, the transaction) exists;
/// failure aborts the caller's whole unit of work.
pub(crate) async fn record_in(
    conn: &mut SqliteConnection,
    input: &NewVisitRecord,
) -> DbResult<VisitRecord> {
    let patient_exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM patients WHERE id = ?")
        .bind(&input.patient_id)
        .fetch_optional(&mut *conn)
        .await?;

    if patient_exists.is_none() {
        return Err(CoreError::PatientNotFound(input.patient_id.clone()).into());
    }

    if let Some(transaction_id) = &input.transaction_id {
        let transaction_exists: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM transactions WHERE id = ?")
                .bind(transaction_id)
                .fetch_optional(&mut *conn)
                .await?;

        if transaction_exists.is_none() {
            return Err(CoreError::TransactionNotFound(transaction_id.clone()).into());
        }
    }

    let visit = VisitRecord {
        id: Uuid::new_v4().to_string(),
        patient_id: input.patient_id.clone(),
        transaction_id: input.transaction_id.clone(),
        visit_date: input.visit_date,
        diagnosis: input.diagnosis.clone(),
        treatment: input.treatment.clone(),
        notes: input.notes.clone(),
        created_at: Utc::now(),
    };

    sqlx::query(
        r#"
        INSERT INTO visit_records (
            id, patient_id, transaction_id, visit_date, diagnosis, treatment, notes, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&visit.id)
    .bind(&visit.patient_id)
    .bind(&visit.transaction_id)
    .bind(visit.visit_date)
    .bind(&visit.diagnosis)
    .bind(&visit.treatment)
    .bind(&visit.notes)
    .bind(visit.created_at)
    .execute(&mut *conn)
    .await?;

    debug!(patient_id = %visit.patient_id, "Visit recorded");

    Ok(visit)
}

/// Repository for visit record operations.
#[derive(Debug, Clone)]
pub struct VisitRepository {
    pool: SqlitePool,
}

impl VisitRepository {
    /// Creates a new VisitRepository.
    pub fn new(pool: SqlitePool) -> Self {
        VisitRepository { pool }
    }

    /// Records a standalone visit.
    pub async fn record(&self, input: &NewVisitRecord) -> DbResult<VisitRecord> {
        let mut tx = self.pool.begin().await?;
        let visit = record_in(&mut tx, input).await?;
        tx.commit().await?;
        Ok(visit)
    }

    /// Lists visits, newest first, optionally for one patient.
    pub async fn list(&self, patient_id: Option<&str>) -> DbResult<Vec<VisitRecord>> {
        let visits = match patient_id {
            Some(id) => {
                sqlx::query_as::<_, VisitRecord>(
                    r#"
                    SELECT id, patient_id, transaction_id, visit_date,
                           diagnosis, treatment, notes, created_at
                    FROM visit_records
                    WHERE patient_id = ?
                    ORDER BY visit_date DESC, created_at DESC
                    "#,
                )
                .bind(id)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, VisitRecord>(
                    r#"
                    SELECT id, patient_id, transaction_id, visit_date,
                           diagnosis, treatment, notes, created_at
                    FROM visit_records
                    ORDER BY visit_date DESC, created_at DESC
                    "#,
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(visits)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{seed_patient, setup_db};
    use chrono::NaiveDate;

    fn visit_input(patient_id: &str) -> NewVisitRecord {
        NewVisitRecord {
            patient_id: patient_id.to_string(),
            transaction_id: None,
            visit_date: NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
            diagnosis: Some("common cold".to_string()),
            treatment: Some("rest and fluids".to_string()),
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_record_and_list_visit() {
        let db = setup_db().await;
        let patient = seed_patient(&db, "Siti Rahma").await;

        let visit = db.visits().record(&visit_input(&patient.id)).await.unwrap();
        assert_eq!(visit.patient_id, patient.id);

        let visits = db.visits().list(Some(&patient.id)).await.unwrap();
        assert_eq!(visits.len(), 1);
        assert_eq!(visits[0].diagnosis.as_deref(), Some("common cold"));
    }

    #[tokio::test]
    async fn test_record_visit_unknown_patient() {
        let db = setup_db().await;

        let err = db.visits().record(&visit_input("missing")).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::PatientNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_record_visit_unknown_transaction() {
        let db = setup_db().await;
        let patient = seed_patient(&db, "Budi Santoso").await;

        let mut input = visit_input(&patient.id);
        input.transaction_id = Some("missing".to_string());

        let err = db.visits().record(&input).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::TransactionNotFound(_))
        ));
    }
}
