//! # Error Types
//!
//! Domain-specific error types for tally-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tally-core errors (this file)                                         │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  tally-db errors (separate crate)                                      │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── ServiceError     - CoreError | DbError, what routes see           │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ServiceError → HTTP status        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Taxonomy
//! Every rejected operation maps to one of five caller-facing kinds:
//! - InvalidRequest → [`CoreError::Validation`]
//! - NotFound       → [`CoreError::ItemNotFound`] / [`CoreError::BillNotFound`] /
//!   [`CoreError::ParticipantNotFound`]
//! - Conflict       → [`CoreError::ItemAlreadySplit`]
//! - InvalidState   → [`CoreError::InsufficientQuantity`]
//! - StorageFailure → `tally_db::DbError` (never masked)
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (item id, quantities, etc.)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message; validation errors
//!    are detected before any mutation, so a rejected request leaves no
//!    partial state

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations. They are detected
/// before any row is written and translated to user-friendly messages by
/// the caller.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Item cannot be found.
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    /// Bill cannot be found.
    #[error("Bill not found: {0}")]
    BillNotFound(String),

    /// Participant cannot be found.
    #[error("Participant not found: {0}")]
    ParticipantNotFound(String),

    /// Another participant already holds a split_with_all claim on the item.
    ///
    /// ## When This Occurs
    /// - Participant B submits a solo or split_with_specific claim on an
    ///   item that participant A has locked with split_with_all
    ///
    /// ## User Workflow
    /// ```text
    /// B taps "claim" on Nachos
    ///      │
    ///      ▼
    /// Check claims: A holds split_with_all on Nachos
    ///      │
    ///      ▼
    /// ItemAlreadySplit { item_id, held_by: A }
    ///      │
    ///      ▼
    /// UI shows: "This item is already split equally by someone else."
    /// ```
    #[error("This item is already split equally by someone else.")]
    ItemAlreadySplit { item_id: String, held_by: String },

    /// The requested quantity exceeds what is left unclaimed on the item.
    ///
    /// ## When This Occurs
    /// - Item quantity 3; A claims 2; B requests 2 (only 1 remains)
    #[error("Not enough quantity remaining for this item: requested {requested}, available {available}")]
    InsufficientQuantity {
        item_id: String,
        requested: f64,
        available: f64,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when client input doesn't meet requirements.
/// Used for early validation before business logic runs.
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

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Invalid format (e.g., malformed id).
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
        let err = CoreError::InsufficientQuantity {
            item_id: "i1".to_string(),
            requested: 2.0,
            available: 1.0,
        };
        assert_eq!(
            err.to_string(),
            "Not enough quantity remaining for this item: requested 2, available 1"
        );

        let err = CoreError::ItemAlreadySplit {
            item_id: "i1".to_string(),
            held_by: "p1".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "This item is already split equally by someone else."
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "itemId".to_string(),
        };
        assert_eq!(err.to_string(), "itemId is required");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "participantId".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
