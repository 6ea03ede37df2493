//! # Stock Ledger Repository
//!
//! The inventory ledger: the only writer of `medicines.stock_quantity` and
//! the append-only `stock_movements` audit log.
//!
//! ## Invariants Enforced Here
//! - stock never goes negative: `out` movements use a guarded conditional
//!   UPDATE (`... AND stock_quantity >= ?`), so two racing debits can never
//!   both pass the sufficiency check; the schema CHECK is the backstop
//! - every stock change produces exactly one movement row, in the same
//!   transaction as the stock update
//!
//! [`apply_movement`] takes `&mut SqliteConnection` so the transaction
//! engine can compose ledger calls into its own atomic unit of work; the
//! [`StockRepository`] methods wrap it in a transaction of their own for the
//! standalone RPC operations.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use medika_core::{CoreError, MovementType, NewMovement, StockMovement};

/// Applies a signed stock change to a medicine and records the audit row.
///
/// Runs inside the caller's transaction: both the stock mutation and the
/// movement insert commit or roll back together.
///
/// ## Errors
/// - `InvalidArgument` - quantity is not positive
/// - `MedicineNotFound` - no such medicine
/// - `InsufficientStock` - an `out` movement exceeds current stock
pub(crate) async fn apply_movement(
    conn: &mut SqliteConnection,
    medicine_id: &str,
    movement_type: MovementType,
    quantity: i64,
    reference_id: Option<&str>,
    notes: Option<&str>,
) -> DbResult<StockMovement> {
    if quantity <= 0 {
        return Err(CoreError::InvalidArgument(
            "movement quantity must be positive".to_string(),
        )
        .into());
    }

    let medicine: Option<(String, i64)> =
        sqlx::query_as("SELECT name, stock_quantity FROM medicines WHERE id = ?")
            .bind(medicine_id)
            .fetch_optional(&mut *conn)
            .await?;

    let (name, available) = medicine
        .ok_or_else(|| DbError::from(CoreError::MedicineNotFound(medicine_id.to_string())))?;

    let now = Utc::now();

    match movement_type {
        MovementType::Out => {
            // Guarded debit: the WHERE clause makes the sufficiency check and
            // the decrement one atomic statement.
            let result = sqlx::query(
                r#"
                UPDATE medicines
                SET stock_quantity = stock_quantity - ?, updated_at = ?
                WHERE id = ? AND stock_quantity >= ?
                "#,
            )
            .bind(quantity)
            .bind(now)
            .bind(medicine_id)
            .bind(quantity)
            .execute(&mut *conn)
            .await?;

            if result.rows_affected() == 0 {
                return Err(CoreError::InsufficientStock {
                    name,
                    available,
                    requested: quantity,
                }
                .into());
            }
        }
        MovementType::In => {
            sqlx::query(
                r#"
                UPDATE medicines
                SET stock_quantity = stock_quantity + ?, updated_at = ?
                WHERE id = ?
                "#,
            )
            .bind(quantity)
            .bind(now)
            .bind(medicine_id)
            .execute(&mut *conn)
            .await?;
        }
    }

    let movement = StockMovement {
        id: Uuid::new_v4().to_string(),
        medicine_id: medicine_id.to_string(),
        movement_type,
        quantity,
        reference_id: reference_id.map(str::to_string),
        notes: notes.map(str::to_string),
        created_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO stock_movements (
            id, medicine_id, movement_type, quantity, reference_id, notes, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&movement.id)
    .bind(&movement.medicine_id)
    .bind(movement.movement_type)
    .bind(movement.quantity)
    .bind(&movement.reference_id)
    .bind(&movement.notes)
    .bind(movement.created_at)
    .execute(&mut *conn)
    .await?;

    debug!(
        medicine_id = %medicine_id,
        movement_type = movement_type.as_str(),
        quantity = %quantity,
        "Stock movement applied"
    );

    Ok(movement)
}

/// Repository for the stock ledger RPC operations.
#[derive(Debug, Clone)]
pub struct StockRepository {
    pool: SqlitePool,
}

impl StockRepository {
    /// Creates a new StockRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StockRepository { pool }
    }

    /// Records a manual stock movement (restock, correction, write-off).
    ///
    /// Runs in its own transaction; the stock update and the movement row
    /// commit together or not at all.
    pub async fn create_movement(&self, input: &NewMovement) -> DbResult<StockMovement> {
        let mut tx = self.pool.begin().await?;

        let movement = apply_movement(
            &mut tx,
            &input.medicine_id,
            input.movement_type,
            input.quantity,
            input.reference_id.as_deref(),
            input.notes.as_deref(),
        )
        .await?;

        tx.commit().await?;
        Ok(movement)
    }

    /// Sets a medicine's stock to an absolute level.
    ///
    /// Computes the delta against current stock and applies it as a single
    /// signed movement so the audit trail stays complete. A zero delta is a
    /// no-op and records nothing.
    ///
    /// ## Errors
    /// - `InvalidArgument` - target quantity is negative
    /// - `MedicineNotFound` - no such medicine
    pub async fn set_stock_level(
        &self,
        medicine_id: &str,
        new_quantity: i64,
        notes: Option<&str>,
    ) -> DbResult<()> {
        if new_quantity < 0 {
            return Err(CoreError::InvalidArgument(
                "target stock quantity cannot be negative".to_string(),
            )
            .into());
        }

        let mut tx = self.pool.begin().await?;

        let current: Option<i64> =
            sqlx::query_scalar("SELECT stock_quantity FROM medicines WHERE id = ?")
                .bind(medicine_id)
                .fetch_optional(&mut *tx)
                .await?;

        let current = current
            .ok_or_else(|| DbError::from(CoreError::MedicineNotFound(medicine_id.to_string())))?;

        let delta = new_quantity - current;
        if delta == 0 {
            debug!(medicine_id = %medicine_id, "Stock adjustment is a no-op");
            return Ok(());
        }

        let movement_type = if delta > 0 {
            MovementType::In
        } else {
            MovementType::Out
        };

        apply_movement(
            &mut tx,
            medicine_id,
            movement_type,
            delta.abs(),
            None,
            notes,
        )
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Lists stock movements, newest first, optionally for one medicine.
    pub async fn list(&self, medicine_id: Option<&str>) -> DbResult<Vec<StockMovement>> {
        let movements = match medicine_id {
            Some(id) => {
                sqlx::query_as::<_, StockMovement>(
                    r#"
                    SELECT id, medicine_id, movement_type, quantity, reference_id, notes, created_at
                    FROM stock_movements
                    WHERE medicine_id = ?
                    ORDER BY created_at DESC, id DESC
                    "#,
                )
                .bind(id)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, StockMovement>(
                    r#"
                    SELECT id, medicine_id, movement_type, quantity, reference_id, notes, created_at
                    FROM stock_movements
                    ORDER BY created_at DESC, id DESC
                    "#,
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(movements)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{seed_medicine, setup_db};
    use medika_core::CoreError;

    #[tokio::test]
    async fn test_create_movement_in_and_out() {
        let db = setup_db().await;
        let med = seed_medicine(&db, "Amoxicillin", 500_00, 20, 5).await;
        let stock = db.stock();

        let movement = stock
            .create_movement(&NewMovement {
                medicine_id: med.id.clone(),
                movement_type: MovementType::In,
                quantity: 10,
                reference_id: None,
                notes: Some("restock".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(movement.quantity, 10);
        assert_eq!(movement.movement_type, MovementType::In);

        stock
            .create_movement(&NewMovement {
                medicine_id: med.id.clone(),
                movement_type: MovementType::Out,
                quantity: 7,
                reference_id: None,
                notes: None,
            })
            .await
            .unwrap();

        let updated = db.medicines().get_by_id(&med.id).await.unwrap().unwrap();
        assert_eq!(updated.stock_quantity, 23);

        let movements = stock.list(Some(&med.id)).await.unwrap();
        assert_eq!(movements.len(), 2);
        // Newest first.
        assert_eq!(movements[0].movement_type, MovementType::Out);
    }

    #[tokio::test]
    async fn test_out_movement_rejects_overdraw() {
        let db = setup_db().await;
        let med = seed_medicine(&db, "Ibuprofen", 300_00, 5, 2).await;

        let err = db
            .stock()
            .create_movement(&NewMovement {
                medicine_id: med.id.clone(),
                movement_type: MovementType::Out,
                quantity: 6,
                reference_id: None,
                notes: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock {
                available: 5,
                requested: 6,
                ..
            })
        ));

        // Nothing changed and nothing was logged.
        let unchanged = db.medicines().get_by_id(&med.id).await.unwrap().unwrap();
        assert_eq!(unchanged.stock_quantity, 5);
        assert!(db.stock().list(Some(&med.id)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_movement_rejects_nonpositive_quantity() {
        let db = setup_db().await;
        let med = seed_medicine(&db, "Cetirizine", 150_00, 5, 2).await;

        let err = db
            .stock()
            .create_movement(&NewMovement {
                medicine_id: med.id,
                movement_type: MovementType::In,
                quantity: 0,
                reference_id: None,
                notes: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DbError::Domain(CoreError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_movement_unknown_medicine() {
        let db = setup_db().await;

        let err = db
            .stock()
            .create_movement(&NewMovement {
                medicine_id: "missing".to_string(),
                movement_type: MovementType::In,
                quantity: 1,
                reference_id: None,
                notes: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DbError::Domain(CoreError::MedicineNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_set_stock_level_records_delta() {
        let db = setup_db().await;
        let med = seed_medicine(&db, "Vitamin C", 100_00, 40, 10).await;
        let stock = db.stock();

        stock
            .set_stock_level(&med.id, 25, Some("stock opname"))
            .await
            .unwrap();

        let updated = db.medicines().get_by_id(&med.id).await.unwrap().unwrap();
        assert_eq!(updated.stock_quantity, 25);

        let movements = stock.list(Some(&med.id)).await.unwrap();
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].movement_type, MovementType::Out);
        assert_eq!(movements[0].quantity, 15);
        assert_eq!(movements[0].notes.as_deref(), Some("stock opname"));
    }

    #[tokio::test]
    async fn test_set_stock_level_same_value_is_noop() {
        let db = setup_db().await;
        let med = seed_medicine(&db, "Vitamin D", 100_00, 40, 10).await;

        db.stock().set_stock_level(&med.id, 40, None).await.unwrap();

        let unchanged = db.medicines().get_by_id(&med.id).await.unwrap().unwrap();
        assert_eq!(unchanged.stock_quantity, 40);
        assert!(db.stock().list(Some(&med.id)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_set_stock_level_rejects_negative_target() {
        let db = setup_db().await;
        let med = seed_medicine(&db, "Zinc", 100_00, 40, 10).await;

        let err = db
            .stock()
            .set_stock_level(&med.id, -1, None)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DbError::Domain(CoreError::InvalidArgument(_))
        ));
    }
}
