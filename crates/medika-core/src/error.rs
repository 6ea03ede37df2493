//! # Error Types
//!
//! Domain-specific error types for medika-core.
//!
//! ## Error Hierarchy
//! ```text
//! medika-core errors (this file)
//! ├── CoreError        - domain rule violations (not found, stock, state)
//! └── ValidationError  - input validation failures
//!
//! medika-db errors (separate crate)
//! └── DbError          - storage failures, wraps CoreError for engine ops
//!
//! Server errors (apps/server)
//! └── ApiError         - what the frontend sees (serialized)
//!
//! Flow: ValidationError → CoreError → DbError → ApiError → Frontend
//! ```
//!
//! ## Design Principles
//! 1. `thiserror` derive macros, no manual impls
//! 2. Context in messages (names, ids, quantities)
//! 3. Errors are enum variants, never bare strings
//! 4. No failure is retried internally; everything here is semantic, not
//!    transport-level

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Domain rule violations.
///
/// These are surfaced to the caller as rejected requests; the database layer
/// guarantees that a call failing with any of these leaves no partial state.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Patient referenced by a transaction or visit does not exist.
    #[error("Patient not found: {0}")]
    PatientNotFound(String),

    /// Service requested in a sale does not exist.
    #[error("Service not found: {0}")]
    ServiceNotFound(String),

    /// Medicine requested in a sale or movement does not exist.
    #[error("Medicine not found: {0}")]
    MedicineNotFound(String),

    /// Transaction does not exist.
    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),

    /// Service exists but is not purchasable.
    #[error("Service {name} is inactive")]
    InactiveService { name: String },

    /// Requested quantity exceeds current stock, either at sale time or when
    /// a cancelled transaction is reactivated.
    #[error("Insufficient stock for {name}: available {available}, requested {requested}")]
    InsufficientStock {
        name: String,
        available: i64,
        requested: i64,
    },

    /// Medicine is referenced by a transaction line item and cannot be
    /// deleted; only unreferenced medicines may be removed with their
    /// movement history.
    #[error("Medicine {name} is referenced by transactions and cannot be deleted")]
    MedicineInUse { name: String },

    /// Semantically invalid argument (negative target stock, zero quantity,
    /// empty sale).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when user input doesn't meet shape requirements, before any
/// business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            name: "Paracetamol".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Paracetamol: available 3, requested 5"
        );

        let err = CoreError::InactiveService {
            name: "X-Ray".to_string(),
        };
        assert_eq!(err.to_string(), "Service X-Ray is inactive");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "name".to_string(),
        };
        assert_eq!(err.to_string(), "name is required");

        let err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        assert_eq!(err.to_string(), "quantity must be positive");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "name".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
