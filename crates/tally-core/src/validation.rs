//! # Validation Module
//!
//! Input validation and claim-request normalization.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Frontend (TypeScript)                                        │
//! │  ├── Basic format checks (empty, length)                               │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Required fields, bounds                                           │
//! │  └── Normalization of loose payloads into ClaimAction                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK constraints (quantity >= 1, plus_one_count >= 0)            │
//! │  ├── UNIQUE (item_id, participant_id)                                  │
//! │  └── Foreign key constraints                                           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Normalization Rules
//! The wire payload is loose: share type, share list, and quantity are all
//! optional. [`normalize_submission`] applies one set of coercions, once,
//! before any business logic runs:
//!
//! - missing or non-finite `quantity_claimed` defaults to 1
//! - a finite `quantity_claimed <= 0` means **unclaim**, regardless of the
//!   requested share type
//! - missing `share_type` defaults to solo
//! - `share_with_participant_ids` is only carried into
//!   split_with_specific requests

use crate::error::ValidationError;
use crate::types::{ClaimAction, ShareRequest, ShareType, SubmitClaimInput};
use crate::{MAX_ITEM_QUANTITY, MAX_NAME_LEN, MAX_PLUS_ONE_COUNT};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Claim Submission Normalization
// =============================================================================

/// Normalizes a loose claim submission into `(item_id, participant_id, action)`.
///
/// ## Example
/// ```rust
/// use tally_core::types::{ClaimAction, ShareRequest, SubmitClaimInput};
/// use tally_core::validation::normalize_submission;
///
/// let input = SubmitClaimInput {
///     item_id: "i1".to_string(),
///     participant_id: "p1".to_string(),
///     share_type: None,
///     share_with_participant_ids: None,
///     quantity_claimed: None,
/// };
///
/// let (_, _, action) = normalize_submission(&input).unwrap();
/// // No share type, no quantity: a plain solo claim for one unit
/// assert_eq!(action, ClaimAction::Claim(ShareRequest::Solo { quantity: 1.0 }));
/// ```
pub fn normalize_submission(
    input: &SubmitClaimInput,
) -> ValidationResult<(String, String, ClaimAction)> {
    let item_id = validate_id(&input.item_id, "itemId")?;
    let participant_id = validate_id(&input.participant_id, "participantId")?;

    // A finite non-positive quantity is an explicit unclaim, no matter
    // what share type came with it.
    if let Some(qty) = input.quantity_claimed {
        if qty.is_finite() && qty <= 0.0 {
            return Ok((item_id, participant_id, ClaimAction::Unclaim));
        }
    }

    let quantity = input
        .quantity_claimed
        .filter(|q| q.is_finite())
        .unwrap_or(1.0);

    let request = match input.share_type.unwrap_or_default() {
        ShareType::Solo => ShareRequest::Solo { quantity },
        ShareType::SplitWithAll => ShareRequest::SplitWithAll,
        ShareType::SplitWithSpecific => ShareRequest::SplitWithSpecific {
            share_with: input.share_with_participant_ids.clone().unwrap_or_default(),
        },
    };

    Ok((item_id, participant_id, ClaimAction::Claim(request)))
}

// =============================================================================
// Field Validators
// =============================================================================

/// Validates an entity id: non-empty after trimming.
///
/// ## Returns
/// The trimmed id.
pub fn validate_id(id: &str, field: &str) -> ValidationResult<String> {
    let id = id.trim();

    if id.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    Ok(id.to_string())
}

/// Validates an item or participant name.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most [`MAX_NAME_LEN`] characters
///
/// ## Example
/// ```rust
/// use tally_core::validation::validate_name;
///
/// assert!(validate_name("Truffle Fries", "name").is_ok());
/// assert!(validate_name("", "name").is_err());
/// ```
pub fn validate_name(name: &str, field: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.len() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates an item line price in cents (must not be negative).
pub fn validate_price_cents(price_cents: i64) -> ValidationResult<()> {
    if price_cents < 0 {
        return Err(ValidationError::Negative {
            field: "price".to_string(),
        });
    }

    Ok(())
}

/// Validates an item line quantity (1 ..= [`MAX_ITEM_QUANTITY`]).
pub fn validate_item_quantity(quantity: i64) -> ValidationResult<()> {
    if quantity < 1 || quantity > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a participant's +1 count (0 ..= [`MAX_PLUS_ONE_COUNT`]).
pub fn validate_plus_one_count(count: i64) -> ValidationResult<()> {
    if count < 0 || count > MAX_PLUS_ONE_COUNT {
        return Err(ValidationError::OutOfRange {
            field: "plusOneCount".to_string(),
            min: 0,
            max: MAX_PLUS_ONE_COUNT,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn input(
        share_type: Option<ShareType>,
        share_with: Option<Vec<String>>,
        quantity: Option<f64>,
    ) -> SubmitClaimInput {
        SubmitClaimInput {
            item_id: "i1".to_string(),
            participant_id: "p1".to_string(),
            share_type,
            share_with_participant_ids: share_with,
            quantity_claimed: quantity,
        }
    }

    #[test]
    fn test_defaults_to_solo_quantity_one() {
        let (item, participant, action) =
            normalize_submission(&input(None, None, None)).unwrap();
        assert_eq!(item, "i1");
        assert_eq!(participant, "p1");
        assert_eq!(action, ClaimAction::Claim(ShareRequest::Solo { quantity: 1.0 }));
    }

    #[test]
    fn test_non_positive_quantity_means_unclaim() {
        let (_, _, action) =
            normalize_submission(&input(Some(ShareType::Solo), None, Some(0.0))).unwrap();
        assert_eq!(action, ClaimAction::Unclaim);

        // Even when the payload asks for split_with_all
        let (_, _, action) =
            normalize_submission(&input(Some(ShareType::SplitWithAll), None, Some(-3.0))).unwrap();
        assert_eq!(action, ClaimAction::Unclaim);
    }

    #[test]
    fn test_non_finite_quantity_defaults_to_one() {
        let (_, _, action) =
            normalize_submission(&input(Some(ShareType::Solo), None, Some(f64::NAN))).unwrap();
        assert_eq!(action, ClaimAction::Claim(ShareRequest::Solo { quantity: 1.0 }));

        let (_, _, action) =
            normalize_submission(&input(Some(ShareType::Solo), None, Some(f64::INFINITY))).unwrap();
        assert_eq!(action, ClaimAction::Claim(ShareRequest::Solo { quantity: 1.0 }));
    }

    #[test]
    fn test_share_list_only_carried_for_specific() {
        let (_, _, action) = normalize_submission(&input(
            Some(ShareType::SplitWithSpecific),
            Some(vec!["p2".to_string(), "p3".to_string()]),
            Some(1.0),
        ))
        .unwrap();
        assert_eq!(
            action,
            ClaimAction::Claim(ShareRequest::SplitWithSpecific {
                share_with: vec!["p2".to_string(), "p3".to_string()],
            })
        );

        // Share list is dropped for split_with_all
        let (_, _, action) = normalize_submission(&input(
            Some(ShareType::SplitWithAll),
            Some(vec!["p2".to_string()]),
            None,
        ))
        .unwrap();
        assert_eq!(action, ClaimAction::Claim(ShareRequest::SplitWithAll));
    }

    #[test]
    fn test_missing_ids_rejected() {
        let mut bad = input(None, None, None);
        bad.item_id = "  ".to_string();
        assert!(normalize_submission(&bad).is_err());

        let mut bad = input(None, None, None);
        bad.participant_id = String::new();
        assert!(normalize_submission(&bad).is_err());
    }

    #[test]
    fn test_field_validators() {
        assert!(validate_name("Nachos", "name").is_ok());
        assert!(validate_name("   ", "name").is_err());
        assert!(validate_name(&"x".repeat(MAX_NAME_LEN + 1), "name").is_err());

        assert!(validate_price_cents(0).is_ok());
        assert!(validate_price_cents(-1).is_err());

        assert!(validate_item_quantity(1).is_ok());
        assert!(validate_item_quantity(0).is_err());
        assert!(validate_item_quantity(MAX_ITEM_QUANTITY + 1).is_err());

        assert!(validate_plus_one_count(0).is_ok());
        assert!(validate_plus_one_count(-1).is_err());
        assert!(validate_plus_one_count(MAX_PLUS_ONE_COUNT + 1).is_err());
    }
}
