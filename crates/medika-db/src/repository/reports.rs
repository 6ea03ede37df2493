//! # Report Repository
//!
//! Aggregation queries behind the dashboard tab and the sales report. All
//! amounts leave this module as numeric cents; formatting is the frontend's
//! job.

use chrono::NaiveDate;
use sqlx::SqlitePool;

use crate::error::DbResult;
use medika_core::{DailySales, DashboardSummary};

/// Repository for reporting queries.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    /// Creates a new ReportRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Computes the dashboard summary numbers.
    pub async fn dashboard(&self) -> DbResult<DashboardSummary> {
        let patient_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM patients")
            .fetch_one(&self.pool)
            .await?;

        let medicine_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM medicines")
            .fetch_one(&self.pool)
            .await?;

        let low_stock_count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM medicines WHERE stock_quantity <= minimum_stock",
        )
        .fetch_one(&self.pool)
        .await?;

        let today_transaction_count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM transactions WHERE date(created_at) = date('now')",
        )
        .fetch_one(&self.pool)
        .await?;

        let today_revenue_cents: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(total_amount_cents), 0)
            FROM transactions
            WHERE payment_status = 'paid' AND date(created_at) = date('now')
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let pending_transaction_count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM transactions WHERE payment_status = 'pending'",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(DashboardSummary {
            patient_count,
            medicine_count,
            low_stock_count,
            today_transaction_count,
            today_revenue_cents,
            pending_transaction_count,
        })
    }

    /// Revenue-by-day over an inclusive date range. Cancelled transactions
    /// are counted but contribute no revenue; only paid ones do.
    pub async fn sales_by_day(&self, from: NaiveDate, to: NaiveDate) -> DbResult<Vec<DailySales>> {
        let rows = sqlx::query_as::<_, DailySales>(
            r#"
            SELECT date(created_at) AS day,
                   COUNT(*) AS transaction_count,
                   COALESCE(SUM(CASE WHEN payment_status = 'paid'
                                     THEN total_amount_cents ELSE 0 END), 0) AS revenue_cents
            FROM transactions
            WHERE date(created_at) BETWEEN date(?) AND date(?)
            GROUP BY day
            ORDER BY day
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{seed_medicine, seed_patient, seed_service, setup_db};
    use chrono::Utc;
    use medika_core::{NewTransaction, PaymentMethod, PaymentStatus, ServiceLine};

    #[tokio::test]
    async fn test_dashboard_counts() {
        let db = setup_db().await;
        let patient = seed_patient(&db, "Siti Rahma").await;
        seed_medicine(&db, "Amoxicillin", 800_00, 2, 5).await;
        seed_medicine(&db, "Paracetamol", 500_00, 100, 10).await;
        let service = seed_service(&db, "General consultation", 50_000_00, true).await;

        let paid = db
            .transactions()
            .create(&NewTransaction {
                patient_id: patient.id.clone(),
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

        db.transactions()
            .create(&NewTransaction {
                patient_id: patient.id.clone(),
                payment_method: PaymentMethod::Transfer,
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

        let summary = db.reports().dashboard().await.unwrap();
        assert_eq!(summary.patient_count, 1);
        assert_eq!(summary.medicine_count, 2);
        assert_eq!(summary.low_stock_count, 1);
        assert_eq!(summary.today_transaction_count, 2);
        assert_eq!(summary.pending_transaction_count, 1);
        assert_eq!(
            summary.today_revenue_cents,
            paid.transaction.total_amount_cents
        );
    }

    #[tokio::test]
    async fn test_sales_by_day_counts_paid_revenue_only() {
        let db = setup_db().await;
        let patient = seed_patient(&db, "Siti Rahma").await;
        let service = seed_service(&db, "General consultation", 50_000_00, true).await;

        for status in [PaymentStatus::Paid, PaymentStatus::Pending] {
            db.transactions()
                .create(&NewTransaction {
                    patient_id: patient.id.clone(),
                    payment_method: PaymentMethod::Cash,
                    payment_status: status,
                    notes: None,
                    services: vec![ServiceLine {
                        service_id: service.id.clone(),
                        quantity: 1,
                    }],
                    medicines: vec![],
                })
                .await
                .unwrap();
        }

        let today = Utc::now().date_naive();
        let rows = db.reports().sales_by_day(today, today).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].transaction_count, 2);
        assert_eq!(rows[0].revenue_cents, 50_000_00);
    }
}
