//! # Transaction Repository
//!
//! The point-of-sale engine: building a sale and reconciling its payment
//! status. Both operations run as a single sqlx transaction so the header,
//! the line items, the ledger movements, and the visit record commit or roll
//! back together; a partially applied sale is a correctness bug, not a
//! degraded mode.
//!
//! ## Sale Lifecycle
//! ```text
//! create()                       pending/paid, stock debited, visit logged
//!    │
//!    ├── update_status(paid)     no stock effect
//!    ├── update_status(cancelled)  net outstanding debit restored via ledger
//!    └── update_status(paid)     line items re-debited, fails if stock gone
//! ```
//!
//! Line items snapshot the catalog price at time of sale and are never
//! edited afterwards; only the header's status and notes change.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::{stock, visit};
use medika_core::{
    validation, CoreError, Medicine, Money, MovementType, NewTransaction, NewVisitRecord,
    PaymentStatus, Service, Transaction, TransactionDetail, TransactionMedicine,
    TransactionService,
};

/// Repository for sale transactions.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    /// Creates a new TransactionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    /// Creates a sale: validates the patient, services, and medicines,
    /// computes the total from current catalog prices, persists the header
    /// and snapshot line items, debits stock through the ledger, and records
    /// the clinical visit, all in one atomic unit.
    ///
    /// ## Errors
    /// Any of these leaves the database completely unchanged:
    /// - `PatientNotFound` / `ServiceNotFound` / `MedicineNotFound`
    /// - `InactiveService` - a requested service is not purchasable
    /// - `InsufficientStock` - a medicine line exceeds current stock
    /// - `InvalidArgument` / `Validation` - no line items, bad quantity
    pub async fn create(&self, input: &NewTransaction) -> DbResult<TransactionDetail> {
        if input.services.is_empty() && input.medicines.is_empty() {
            return Err(CoreError::InvalidArgument(
                "transaction must contain at least one service or medicine".to_string(),
            )
            .into());
        }

        for line in &input.services {
            validation::validate_quantity(line.quantity).map_err(CoreError::from)?;
        }
        for line in &input.medicines {
            validation::validate_quantity(line.quantity).map_err(CoreError::from)?;
        }

        let mut tx = self.pool.begin().await?;

        let patient_exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM patients WHERE id = ?")
            .bind(&input.patient_id)
            .fetch_optional(&mut *tx)
            .await?;

        if patient_exists.is_none() {
            return Err(CoreError::PatientNotFound(input.patient_id.clone()).into());
        }

        let mut total = Money::zero();

        // Resolve services: must exist and be active. Prices are captured
        // here and frozen into the line items below.
        let mut priced_services: Vec<(Service, i64)> = Vec::with_capacity(input.services.len());
        for line in &input.services {
            let service = sqlx::query_as::<_, Service>(
                r#"
                SELECT id, name, description, price_cents, is_active, created_at, updated_at
                FROM services
                WHERE id = ?
                "#,
            )
            .bind(&line.service_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::from(CoreError::ServiceNotFound(line.service_id.clone())))?;

            if !service.is_active {
                return Err(CoreError::InactiveService { name: service.name }.into());
            }

            total += service.price().multiply_quantity(line.quantity);
            priced_services.push((service, line.quantity));
        }

        // Resolve medicines: must exist with sufficient stock. The ledger
        // re-checks sufficiency with a guarded UPDATE when it debits, so a
        // concurrent sale cannot slip through between here and there.
        let mut priced_medicines: Vec<(Medicine, i64)> = Vec::with_capacity(input.medicines.len());
        for line in &input.medicines {
            let medicine = sqlx::query_as::<_, Medicine>(
                r#"
                SELECT id, name, unit, price_cents, stock_quantity, minimum_stock,
                       expiry_date, supplier, created_at, updated_at
                FROM medicines
                WHERE id = ?
                "#,
            )
            .bind(&line.medicine_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::from(CoreError::MedicineNotFound(line.medicine_id.clone())))?;

            if !medicine.can_dispense(line.quantity) {
                return Err(CoreError::InsufficientStock {
                    name: medicine.name,
                    available: medicine.stock_quantity,
                    requested: line.quantity,
                }
                .into());
            }

            total += medicine.price().multiply_quantity(line.quantity);
            priced_medicines.push((medicine, line.quantity));
        }

        let transaction = Transaction {
            id: Uuid::new_v4().to_string(),
            patient_id: input.patient_id.clone(),
            total_amount_cents: total.cents(),
            payment_method: input.payment_method,
            payment_status: input.payment_status,
            notes: input.notes.clone(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO transactions (
                id, patient_id, total_amount_cents, payment_method, payment_status,
                notes, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&transaction.id)
        .bind(&transaction.patient_id)
        .bind(transaction.total_amount_cents)
        .bind(transaction.payment_method)
        .bind(transaction.payment_status)
        .bind(&transaction.notes)
        .bind(transaction.created_at)
        .bind(transaction.updated_at)
        .execute(&mut *tx)
        .await?;

        let mut service_items = Vec::with_capacity(priced_services.len());
        for (service, quantity) in priced_services {
            let item = TransactionService {
                id: Uuid::new_v4().to_string(),
                transaction_id: transaction.id.clone(),
                service_id: service.id,
                quantity,
                unit_price_cents: service.price_cents,
                total_cents: service.price_cents * quantity,
            };

            sqlx::query(
                r#"
                INSERT INTO transaction_services (
                    id, transaction_id, service_id, quantity, unit_price_cents, total_cents
                ) VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&item.id)
            .bind(&item.transaction_id)
            .bind(&item.service_id)
            .bind(item.quantity)
            .bind(item.unit_price_cents)
            .bind(item.total_cents)
            .execute(&mut *tx)
            .await?;

            service_items.push(item);
        }

        let mut medicine_items = Vec::with_capacity(priced_medicines.len());
        for (medicine, quantity) in priced_medicines {
            let item = TransactionMedicine {
                id: Uuid::new_v4().to_string(),
                transaction_id: transaction.id.clone(),
                medicine_id: medicine.id.clone(),
                quantity,
                unit_price_cents: medicine.price_cents,
                total_cents: medicine.price_cents * quantity,
            };

            sqlx::query(
                r#"
                INSERT INTO transaction_medicines (
                    id, transaction_id, medicine_id, quantity, unit_price_cents, total_cents
                ) VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&item.id)
            .bind(&item.transaction_id)
            .bind(&item.medicine_id)
            .bind(item.quantity)
            .bind(item.unit_price_cents)
            .bind(item.total_cents)
            .execute(&mut *tx)
            .await?;

            stock::apply_movement(
                &mut tx,
                &medicine.id,
                MovementType::Out,
                quantity,
                Some(&transaction.id),
                Some(&format!("sold in transaction #{}", transaction.id)),
            )
            .await?;

            medicine_items.push(item);
        }

        visit::record_in(
            &mut tx,
            &NewVisitRecord {
                patient_id: transaction.patient_id.clone(),
                transaction_id: Some(transaction.id.clone()),
                visit_date: transaction.created_at.date_naive(),
                diagnosis: None,
                treatment: None,
                notes: None,
            },
        )
        .await?;

        tx.commit().await?;

        info!(
            transaction_id = %transaction.id,
            total = %transaction.total_amount(),
            services = service_items.len(),
            medicines = medicine_items.len(),
            "Transaction created"
        );

        Ok(TransactionDetail {
            transaction,
            services: service_items,
            medicines: medicine_items,
        })
    }

    /// Transitions a transaction's payment status.
    ///
    /// Stock side effects (all through the ledger, all in one atomic unit
    /// with the status write):
    /// - same status: timestamp touch only, no stock effect
    /// - into `cancelled`: restores, per medicine, the net outstanding debit
    ///   (sum of `out` minus sum of `in`) over movements carrying this
    ///   transaction's reference id, as new `in` reversal movements; the
    ///   originals stay untouched
    /// - out of `cancelled`: re-debits every medicine line item, failing the
    ///   whole call with `InsufficientStock` if stock no longer suffices
    pub async fn update_status(
        &self,
        id: &str,
        new_status: PaymentStatus,
    ) -> DbResult<Transaction> {
        let mut tx = self.pool.begin().await?;

        let mut transaction = fetch_transaction(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::from(CoreError::TransactionNotFound(id.to_string())))?;

        let now = Utc::now();

        if transaction.payment_status == new_status {
            sqlx::query("UPDATE transactions SET updated_at = ? WHERE id = ?")
                .bind(now)
                .bind(id)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;

            transaction.updated_at = now;
            return Ok(transaction);
        }

        if new_status == PaymentStatus::Cancelled {
            // Net outstanding debit per medicine. Reversals from earlier
            // cancellations already appear as `in` rows under the same
            // reference id, so a repeated cancel cycle stays exact.
            let outstanding: Vec<(String, i64)> = sqlx::query_as(
                r#"
                SELECT medicine_id,
                       SUM(CASE WHEN movement_type = 'out' THEN quantity ELSE -quantity END)
                           AS outstanding
                FROM stock_movements
                WHERE reference_id = ?
                GROUP BY medicine_id
                HAVING outstanding > 0
                "#,
            )
            .bind(id)
            .fetch_all(&mut *tx)
            .await?;

            for (medicine_id, quantity) in outstanding {
                stock::apply_movement(
                    &mut tx,
                    &medicine_id,
                    MovementType::In,
                    quantity,
                    Some(id),
                    Some(&format!("transaction #{} cancelled - stock restored", id)),
                )
                .await?;
            }
        } else if transaction.payment_status == PaymentStatus::Cancelled {
            let items = fetch_medicine_items(&mut tx, id).await?;

            for item in items {
                stock::apply_movement(
                    &mut tx,
                    &item.medicine_id,
                    MovementType::Out,
                    item.quantity,
                    Some(id),
                    Some(&format!(
                        "transaction #{} reactivated - stock re-deducted",
                        id
                    )),
                )
                .await?;
            }
        }

        sqlx::query("UPDATE transactions SET payment_status = ?, updated_at = ? WHERE id = ?")
            .bind(new_status)
            .bind(now)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(
            transaction_id = %id,
            from = transaction.payment_status.as_str(),
            to = new_status.as_str(),
            "Transaction status updated"
        );

        transaction.payment_status = new_status;
        transaction.updated_at = now;
        Ok(transaction)
    }

    /// Replaces a transaction's notes. No stock side effects.
    pub async fn add_notes(&self, id: &str, notes: &str) -> DbResult<Transaction> {
        let now = Utc::now();

        let result = sqlx::query("UPDATE transactions SET notes = ?, updated_at = ? WHERE id = ?")
            .bind(notes)
            .bind(now)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::TransactionNotFound(id.to_string()).into());
        }

        let transaction = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::from(CoreError::TransactionNotFound(id.to_string())))?;

        Ok(transaction)
    }

    /// Gets a transaction header by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Transaction>> {
        let mut conn = self.pool.acquire().await?;
        fetch_transaction(&mut conn, id).await
    }

    /// Gets a transaction with both line item sets, for receipts and
    /// reporting consumers.
    pub async fn get_detail(&self, id: &str) -> DbResult<Option<TransactionDetail>> {
        let mut conn = self.pool.acquire().await?;

        let Some(transaction) = fetch_transaction(&mut conn, id).await? else {
            return Ok(None);
        };

        let services = sqlx::query_as::<_, TransactionService>(
            r#"
            SELECT id, transaction_id, service_id, quantity, unit_price_cents, total_cents
            FROM transaction_services
            WHERE transaction_id = ?
            ORDER BY id
            "#,
        )
        .bind(id)
        .fetch_all(&mut *conn)
        .await?;

        let medicines = fetch_medicine_items(&mut conn, id).await?;

        Ok(Some(TransactionDetail {
            transaction,
            services,
            medicines,
        }))
    }

    /// Lists transaction headers, newest first.
    pub async fn list(
        &self,
        patient_id: Option<&str>,
        status: Option<PaymentStatus>,
        limit: u32,
    ) -> DbResult<Vec<Transaction>> {
        let mut sql = String::from(
            "SELECT id, patient_id, total_amount_cents, payment_method, payment_status, \
             notes, created_at, updated_at FROM transactions WHERE 1 = 1",
        );
        if patient_id.is_some() {
            sql.push_str(" AND patient_id = ?");
        }
        if status.is_some() {
            sql.push_str(" AND payment_status = ?");
        }
        sql.push_str(" ORDER BY created_at DESC LIMIT ?");

        let mut query = sqlx::query_as::<_, Transaction>(&sql);
        if let Some(patient_id) = patient_id {
            query = query.bind(patient_id.to_string());
        }
        if let Some(status) = status {
            query = query.bind(status);
        }
        query = query.bind(limit as i64);

        let transactions = query.fetch_all(&self.pool).await?;

        debug!(count = transactions.len(), "Listed transactions");
        Ok(transactions)
    }
}

async fn fetch_transaction(
    conn: &mut sqlx::SqliteConnection,
    id: &str,
) -> DbResult<Option<Transaction>> {
    let transaction = sqlx::query_as::<_, Transaction>(
        r#"
        SELECT id, patient_id, total_amount_cents, payment_method, payment_status,
               notes, created_at, updated_at
        FROM transactions
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(transaction)
}

async fn fetch_medicine_items(
    conn: &mut sqlx::SqliteConnection,
    transaction_id: &str,
) -> DbResult<Vec<TransactionMedicine>> {
    let items = sqlx::query_as::<_, TransactionMedicine>(
        r#"
        SELECT id, transaction_id, medicine_id, quantity, unit_price_cents, total_cents
        FROM transaction_medicines
        WHERE transaction_id = ?
        ORDER BY id
        "#,
    )
    .bind(transaction_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(items)
}

// =============================================================================
// Unit Tests
// =============================================================================
