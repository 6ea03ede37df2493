//! # Domain Types
//!
//! Core domain types used throughout Medika Clinic.
//!
//! ## Entity Overview
//! ```text
//! Patient ◄────────── Transaction ──────► TransactionService (price snapshot)
//!    ▲                    │       ──────► TransactionMedicine (price snapshot)
//!    │                    │
//! VisitRecord ◄───────────┘
//!
//! Medicine ◄───────── StockMovement (append-only audit log)
//! ```
//!
//! Every entity has a UUID v4 `id` generated in Rust, immutable and used for
//! database relations. Enum columns are stored as lowercase text.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Enums
// =============================================================================

/// Direction of a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum MovementType {
    /// Stock received (restock, correction upward, cancellation reversal).
    In,
    /// Stock dispensed (sale, correction downward).
    Out,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::In => "in",
            MovementType::Out => "out",
        }
    }
}

/// How a transaction was (or will be) paid.
///
/// Payment methods are labels only; there is no gateway integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Transfer,
    Card,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Transfer => "transfer",
            PaymentMethod::Card => "card",
        }
    }
}

/// Payment status of a transaction.
///
/// All three states are reachable from each other; transitions into and out
/// of `Cancelled` carry stock side effects (see the transaction repository).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Created but not yet paid.
    Pending,
    /// Paid and active.
    Paid,
    /// Cancelled; its stock debits have been restored.
    Cancelled,
}

impl Default for PaymentStatus {
    fn default() -> Self {
        PaymentStatus::Pending
    }
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Cancelled => "cancelled",
        }
    }
}

// =============================================================================
// Patient
// =============================================================================

/// A registered patient.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Patient {
    pub id: String,
    pub name: String,
    #[ts(as = "Option<String>")]
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Medicine
// =============================================================================

/// A medicine in the inventory catalog.
///
/// `stock_quantity` is owned by the inventory ledger: every change goes
/// through a ledger movement so an audit row always exists. `minimum_stock`
/// is used for alerting only, never enforcement.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Medicine {
    pub id: String,
    pub name: String,
    /// Dispensing unit label ("tablet", "bottle", "strip").
    pub unit: String,
    /// Price per unit in cents.
    pub price_cents: i64,
    pub stock_quantity: i64,
    pub minimum_stock: i64,
    #[ts(as = "Option<String>")]
    pub expiry_date: Option<NaiveDate>,
    pub supplier: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Medicine {
    /// Returns the unit price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Checks whether the requested quantity can be dispensed from stock.
    pub fn can_dispense(&self, quantity: i64) -> bool {
        quantity > 0 && quantity <= self.stock_quantity
    }

    /// Checks whether stock has fallen to or below the alert threshold.
    pub fn is_low_stock(&self) -> bool {
        self.stock_quantity <= self.minimum_stock
    }
}

// =============================================================================
// Service
// =============================================================================

/// A clinical service offered by the clinic (consultation, wound care, ...).
///
/// Services referenced by a transaction are deactivated rather than deleted
/// so historical line items keep a valid reference.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Service {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Service {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Stock Movement
// =============================================================================

/// One entry in the append-only stock audit log.
///
/// A movement is never mutated or deleted (except as part of deleting an
/// unreferenced medicine's full history). Reversals are new `in` rows
/// carrying the same `reference_id` as the debit they offset.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StockMovement {
    pub id: String,
    pub medicine_id: String,
    pub movement_type: MovementType,
    pub quantity: i64,
    /// The transaction that caused this movement, or None for manual
    /// adjustments.
    pub reference_id: Option<String>,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Transaction
// =============================================================================

/// A point-of-sale transaction header.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Transaction {
    pub id: String,
    pub patient_id: String,
    /// Sum of all line item totals at creation time, in cents.
    pub total_amount_cents: i64,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    #[inline]
    pub fn total_amount(&self) -> Money {
        Money::from_cents(self.total_amount_cents)
    }
}

/// A service line item.
/// Uses the snapshot pattern: the unit price is frozen at time of sale and
/// stays valid even when the catalog price changes later.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct TransactionService {
    pub id: String,
    pub transaction_id: String,
    pub service_id: String,
    pub quantity: i64,
    /// Unit price in cents at time of sale (frozen).
    pub unit_price_cents: i64,
    /// quantity x unit price snapshot.
    pub total_cents: i64,
}

/// A medicine line item, same snapshot pattern as [`TransactionService`].
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct TransactionMedicine {
    pub id: String,
    pub transaction_id: String,
    pub medicine_id: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub total_cents: i64,
}

/// Complete detail of one transaction, for receipts and reporting consumers.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TransactionDetail {
    pub transaction: Transaction,
    pub services: Vec<TransactionService>,
    pub medicines: Vec<TransactionMedicine>,
}

// =============================================================================
// Visit Record
// =============================================================================

/// A clinical visit entry, optionally tied to the transaction that billed it.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct VisitRecord {
    pub id: String,
    pub patient_id: String,
    pub transaction_id: Option<String>,
    #[ts(as = "String")]
    pub visit_date: NaiveDate,
    pub diagnosis: Option<String>,
    pub treatment: Option<String>,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Setting
// =============================================================================

/// One key/value pair of clinic configuration.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Setting {
    pub key: String,
    pub value: String,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Operation Inputs
// =============================================================================

/// One requested service line of a new transaction.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ServiceLine {
    pub service_id: String,
    pub quantity: i64,
}

/// One requested medicine line of a new transaction.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct MedicineLine {
    pub medicine_id: String,
    pub quantity: i64,
}

/// Input for creating a transaction. The backend computes the total itself
/// from current catalog prices; clients never send amounts.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NewTransaction {
    pub patient_id: String,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    pub notes: Option<String>,
    pub services: Vec<ServiceLine>,
    #[serde(default)]
    pub medicines: Vec<MedicineLine>,
}

/// Input for recording a manual stock movement.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NewMovement {
    pub medicine_id: String,
    pub movement_type: MovementType,
    pub quantity: i64,
    pub reference_id: Option<String>,
    pub notes: Option<String>,
}

/// Input for recording a clinical visit.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NewVisitRecord {
    pub patient_id: String,
    pub transaction_id: Option<String>,
    #[ts(as = "String")]
    pub visit_date: NaiveDate,
    pub diagnosis: Option<String>,
    pub treatment: Option<String>,
    pub notes: Option<String>,
}

// =============================================================================
// Reporting
// =============================================================================

/// Aggregate numbers for the dashboard tab.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DashboardSummary {
    pub patient_count: i64,
    pub medicine_count: i64,
    pub low_stock_count: i64,
    pub today_transaction_count: i64,
    /// Revenue of today's paid transactions, in cents.
    pub today_revenue_cents: i64,
    pub pending_transaction_count: i64,
}

/// One day of the sales report.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DailySales {
    /// Calendar day in `YYYY-MM-DD` form.
    pub day: String,
    pub transaction_count: i64,
    /// Paid revenue for the day, in cents.
    pub revenue_cents: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn medicine(stock: i64, minimum: i64) -> Medicine {
        let now = Utc::now();
        Medicine {
            id: "m-1".to_string(),
            name: "Paracetamol".to_string(),
            unit: "tablet".to_string(),
            price_cents: 500_00,
            stock_quantity: stock,
            minimum_stock: minimum,
            expiry_date: None,
            supplier: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_payment_status_default() {
        assert_eq!(PaymentStatus::default(), PaymentStatus::Pending);
    }

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(
            serde_json::to_string(&MovementType::Out).unwrap(),
            "\"out\""
        );
        assert_eq!(
            serde_json::to_string(&PaymentStatus::Cancelled).unwrap(),
            "\"cancelled\""
        );
        assert_eq!(
            serde_json::to_string(&PaymentMethod::Transfer).unwrap(),
            "\"transfer\""
        );
    }

    #[test]
    fn test_can_dispense() {
        let med = medicine(100, 10);
        assert!(med.can_dispense(1));
        assert!(med.can_dispense(100));
        assert!(!med.can_dispense(101));
        assert!(!med.can_dispense(0));
        assert!(!med.can_dispense(-5));
    }

    #[test]
    fn test_is_low_stock() {
        assert!(!medicine(100, 10).is_low_stock());
        assert!(medicine(10, 10).is_low_stock());
        assert!(medicine(3, 10).is_low_stock());
    }

    #[test]
    fn test_new_transaction_defaults() {
        let input: NewTransaction = serde_json::from_str(
            r#"{
                "patientId": "p-1",
                "paymentMethod": "cash",
                "services": [{"serviceId": "s-1", "quantity": 1}]
            }"#,
        )
        .unwrap();

        assert_eq!(input.payment_status, PaymentStatus::Pending);
        assert!(input.medicines.is_empty());
        assert_eq!(input.services.len(), 1);
    }
}
