//! # Domain Types
//!
//! Core domain types used throughout Tally.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Bill       │   │      Item       │   │   Participant   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  bill_code      │   │  bill_id (FK)   │   │  bill_id (FK)   │       │
//! │  │  tax/tip cents  │   │  price_cents    │   │  plus_one_count │       │
//! │  │  status         │   │  quantity       │   │  has_responded  │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Claim      │   │   ShareType     │   │  ShareRequest   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  item_id (FK)   │   │  Solo           │   │  closed tagged  │       │
//! │  │  participant_id │   │  SplitWithAll   │   │  union used by  │       │
//! │  │  amount_owed    │   │  SplitWith-     │   │  the mutation   │       │
//! │  │  (derived)      │   │    Specific     │   │  service        │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! A bill has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - `bill_code`: short human-readable code participants use to join
//! - `organizer_access_code`: credential the organizer uses to manage it

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Bill
// =============================================================================

/// The status of a bill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum BillStatus {
    /// Claims are being collected.
    Active,
    /// Everyone has settled up.
    Completed,
    /// Bill was abandoned.
    Cancelled,
}

impl Default for BillStatus {
    fn default() -> Self {
        BillStatus::Active
    }
}

/// A shared bill created by an organizer from a receipt.
///
/// ## Tax and Tip
/// `tax_amount_cents` and `tip_amount_cents` are **absolute amounts** taken
/// from the receipt. Percentages are derived at read time, never stored as
/// authoritative.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Bill {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Human-readable join code participants use to find the bill.
    pub bill_code: String,

    /// Organizer's phone number (used for recovery outside this core).
    pub organizer_phone: String,

    /// Credential the organizer presents to manage the bill.
    pub organizer_access_code: String,

    /// Tax in cents (absolute, from the receipt).
    pub tax_amount_cents: i64,

    /// Tip in cents (absolute, from the receipt).
    pub tip_amount_cents: i64,

    /// Current lifecycle status.
    pub status: BillStatus,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Bill {
    /// Returns the tax amount as Money.
    #[inline]
    pub fn tax_amount(&self) -> Money {
        Money::from_cents(self.tax_amount_cents)
    }

    /// Returns the tip amount as Money.
    #[inline]
    pub fn tip_amount(&self) -> Money {
        Money::from_cents(self.tip_amount_cents)
    }

    /// Checks if the bill still accepts claims.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.status == BillStatus::Active
    }
}

// =============================================================================
// Item
// =============================================================================

/// Where an item line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum ItemSource {
    /// Typed in by the organizer.
    Manual,
    /// Extracted from the receipt image.
    Ocr,
}

impl Default for ItemSource {
    fn default() -> Self {
        ItemSource::Manual
    }
}

/// A line item on a bill.
///
/// ## Price Semantics
/// `price_cents` is the **total for the line**, not a per-unit price.
/// An item "3x Beer $15.00" has price_cents = 1500 and quantity = 3.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Item {
    pub id: String,
    pub bill_id: String,
    pub name: String,

    /// Line total in cents (NOT per-unit).
    pub price_cents: i64,

    /// Number of units on the line (>= 1).
    pub quantity: i64,

    pub source: ItemSource,

    /// Position on the receipt, for display.
    pub display_order: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Returns the line price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Participant
// =============================================================================

/// A person invited to split the bill.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Participant {
    pub id: String,
    pub bill_id: String,
    pub name: String,

    /// Contact phone; holds an `UNSET-{code}-{n}` placeholder when unknown.
    pub phone_number: String,

    /// Number of additional people this participant represents.
    pub plus_one_count: i64,

    /// Derived: true iff the participant currently has at least one claim.
    pub has_responded: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub last_updated_at: DateTime<Utc>,
}

impl Participant {
    /// The number of people this participant's claims account for.
    ///
    /// ## Example
    /// ```rust
    /// # use tally_core::types::Participant;
    /// # use chrono::Utc;
    /// # let p = Participant {
    /// #     id: "p1".into(), bill_id: "b1".into(), name: "Ana".into(),
    /// #     phone_number: "UNSET-1".into(), plus_one_count: 1,
    /// #     has_responded: false, created_at: Utc::now(), last_updated_at: Utc::now(),
    /// # };
    /// assert_eq!(p.person_weight(), 2); // Ana and her +1
    /// ```
    #[inline]
    pub fn person_weight(&self) -> i64 {
        1 + self.plus_one_count.max(0)
    }
}

// =============================================================================
// Claim
// =============================================================================

/// How a claim divides an item's cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ShareType {
    /// Claimant takes a specific quantity for themselves alone.
    Solo,
    /// Item cost is divided among every participant, weighted by
    /// person-count. Locks the item: no competing claims while it exists.
    SplitWithAll,
    /// Item cost is divided among the claimant and an explicit list of
    /// co-sharers, weighted by person-count.
    SplitWithSpecific,
}

impl Default for ShareType {
    fn default() -> Self {
        ShareType::Solo
    }
}

/// A participant's assertion of ownership over (part of) an item.
///
/// ## Invariants
/// - One claim per (item, participant): re-submitting updates in place
/// - At most one `SplitWithAll` claim per item
/// - `amount_owed_cents` is derived; it is recomputed whenever any claim
///   on the same item is added, updated, or removed
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Claim {
    pub id: String,
    pub item_id: String,
    pub participant_id: String,
    pub share_type: ShareType,

    /// Co-sharers for `SplitWithSpecific`; empty otherwise.
    pub share_with_participant_ids: Vec<String>,

    /// Units claimed. Meaningful for `Solo`; stored as the full item
    /// quantity for `SplitWithAll` and as 1 for `SplitWithSpecific`.
    pub quantity_claimed: f64,

    /// Derived amount in cents, recomputed by the allocation engine.
    pub amount_owed_cents: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Claim {
    /// Returns the owed amount as Money.
    #[inline]
    pub fn amount_owed(&self) -> Money {
        Money::from_cents(self.amount_owed_cents)
    }
}

// =============================================================================
// Claim Submission
// =============================================================================

/// A claim submission as it arrives from the client, loosely typed.
///
/// Optional fields mirror the wire payload; `validation::normalize_submission`
/// turns this into the closed [`ClaimAction`] union before any business
/// logic runs.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SubmitClaimInput {
    pub item_id: String,
    pub participant_id: String,
    pub share_type: Option<ShareType>,
    pub share_with_participant_ids: Option<Vec<String>>,
    pub quantity_claimed: Option<f64>,
}

/// A normalized claim request: each variant carries exactly the fields it
/// needs, eliminating "fall back to existing value" defaulting logic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShareRequest {
    /// Take `quantity` units alone. Quantity is always > 0 here;
    /// non-positive quantities normalize to [`ClaimAction::Unclaim`].
    Solo { quantity: f64 },
    /// Split the whole item across every participant.
    SplitWithAll,
    /// Split the whole item with an explicit set of co-sharers.
    SplitWithSpecific { share_with: Vec<String> },
}

impl ShareRequest {
    /// The share type this request resolves to.
    pub fn share_type(&self) -> ShareType {
        match self {
            ShareRequest::Solo { .. } => ShareType::Solo,
            ShareRequest::SplitWithAll => ShareType::SplitWithAll,
            ShareRequest::SplitWithSpecific { .. } => ShareType::SplitWithSpecific,
        }
    }
}

/// What a normalized submission asks the mutation service to do.
#[derive(Debug, Clone, PartialEq)]
pub enum ClaimAction {
    /// Remove the participant's claim on the item, if any.
    Unclaim,
    /// Create or update a claim.
    Claim(ShareRequest),
}

/// The result of a claim submission.
///
/// Serializes with an `action` tag matching the client contract:
/// `claimed`, `updated`, or `unclaimed`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum ClaimOutcome {
    /// A new claim row was created.
    Claimed(Claim),
    /// An existing claim row was updated in place.
    Updated(Claim),
    /// The claim was removed. `claim_id` is `None` when there was nothing
    /// to remove (unclaiming an absent claim is a no-op).
    Unclaimed { claim_id: Option<String> },
}

// =============================================================================
// Bill Aggregate
// =============================================================================

/// A bill with all of its children assembled, as served to clients.
///
/// Pure read shape: amounts are assumed current from the last mutation;
/// no recomputation happens while assembling this.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BillAggregate {
    pub bill: Bill,
    pub items: Vec<Item>,
    pub participants: Vec<Participant>,
    pub claims: Vec<Claim>,
}

impl BillAggregate {
    /// Bill subtotal: sum of item line prices (price is already the line
    /// total, so quantity does not multiply in).
    pub fn subtotal(&self) -> Money {
        self.items.iter().map(Item::price).sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn participant(plus_ones: i64) -> Participant {
        Participant {
            id: "p1".to_string(),
            bill_id: "b1".to_string(),
            name: "Ana".to_string(),
            phone_number: "UNSET-ABC123-1".to_string(),
            plus_one_count: plus_ones,
            has_responded: false,
            created_at: Utc::now(),
            last_updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_person_weight() {
        assert_eq!(participant(0).person_weight(), 1);
        assert_eq!(participant(2).person_weight(), 3);
        // Defensive clamp; the schema forbids negatives anyway
        assert_eq!(participant(-1).person_weight(), 1);
    }

    #[test]
    fn test_defaults() {
        assert_eq!(BillStatus::default(), BillStatus::Active);
        assert_eq!(ItemSource::default(), ItemSource::Manual);
        assert_eq!(ShareType::default(), ShareType::Solo);
    }

    #[test]
    fn test_share_request_share_type() {
        assert_eq!(
            ShareRequest::Solo { quantity: 1.0 }.share_type(),
            ShareType::Solo
        );
        assert_eq!(
            ShareRequest::SplitWithAll.share_type(),
            ShareType::SplitWithAll
        );
        assert_eq!(
            ShareRequest::SplitWithSpecific { share_with: vec![] }.share_type(),
            ShareType::SplitWithSpecific
        );
    }

    #[test]
    fn test_claim_outcome_serializes_with_action_tag() {
        let outcome = ClaimOutcome::Unclaimed {
            claim_id: Some("c1".to_string()),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["action"], "unclaimed");
        assert_eq!(json["claim_id"], "c1");
    }

    #[test]
    fn test_submit_input_accepts_camel_case_payload() {
        let input: SubmitClaimInput = serde_json::from_str(
            r#"{
                "itemId": "i1",
                "participantId": "p1",
                "shareType": "split_with_specific",
                "shareWithParticipantIds": ["p2"],
                "quantityClaimed": 2
            }"#,
        )
        .unwrap();

        assert_eq!(input.item_id, "i1");
        assert_eq!(input.share_type, Some(ShareType::SplitWithSpecific));
        assert_eq!(input.share_with_participant_ids.as_deref(), Some(&["p2".to_string()][..]));
        assert_eq!(input.quantity_claimed, Some(2.0));
    }
}
