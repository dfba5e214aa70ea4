//! # Allocation Engine
//!
//! Computes per-claim and per-participant owed amounts for one item.
//!
//! ## How An Item's Cost Is Allocated
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Allocation Pipeline                                │
//! │                                                                         │
//! │  bill subtotal ($30) + tax ($3) + tip ($3)                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  extras_multiplier = 1 + (3 + 3) / 30 = 1.2                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  item_with_extras = item.price × 1.2       ($30 item → $36)            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  per claim, by share type:                                             │
//! │    solo                → claimed fraction of the line                  │
//! │    split_with_all      → weighted share for EVERY participant          │
//! │    split_with_specific → weighted share for claimer + co-sharers       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Money::from_unrounded_cents per share (local rounding, no            │
//! │  redistribution - totals may drift by a cent, accepted)                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Purity
//! This module is a pure function over
//! `(item, claims-for-item, participants, multiplier)`. Recomputation is
//! global per item: amounts are re-derived from scratch on every mutation
//! rather than patched incrementally, which keeps drift bugs impossible.
//!
//! ## Person-Weight
//! A participant's weight is `1 + plus_one_count`: a claim by someone who
//! brought a guest covers two people. Weights apply to both split share
//! types. **Solo claims do not multiply by person-weight** - a solo claim
//! is for a concrete quantity of the line, and bringing a +1 does not make
//! your two beers cost more.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{Claim, Item, Participant, ShareType};

// =============================================================================
// Extras Multiplier
// =============================================================================

/// Factor that spreads the bill's tax and tip proportionally across items.
///
/// `1 + (tax + tip) / subtotal` when the subtotal is positive, else 1.
///
/// ## Example
/// ```rust
/// use tally_core::allocation::extras_multiplier;
/// use tally_core::money::Money;
///
/// let m = extras_multiplier(
///     Money::from_cents(3000), // $30 subtotal
///     Money::from_cents(300),  // $3 tax
///     Money::from_cents(300),  // $3 tip
/// );
/// assert!((m - 1.2).abs() < 1e-9);
///
/// // Empty bill: no extras to spread
/// assert_eq!(extras_multiplier(Money::zero(), Money::from_cents(300), Money::zero()), 1.0);
/// ```
pub fn extras_multiplier(subtotal: Money, tax: Money, tip: Money) -> f64 {
    if !subtotal.is_positive() {
        return 1.0;
    }

    let extras = tax + tip;
    1.0 + extras.as_f64_cents() / subtotal.as_f64_cents()
}

// =============================================================================
// Per-Claim Allocation
// =============================================================================

/// The recomputed owed amount for one claim row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ClaimAllocation {
    pub claim_id: String,
    pub participant_id: String,
    pub amount_owed: Money,
}

/// Computes `amount_owed` for every claim on an item.
///
/// This is the recomputation entry point: the mutation service calls it
/// after every claim change and writes the results back. Idempotent -
/// calling it twice with the same inputs yields identical amounts.
///
/// ## Arguments
/// * `item` - the item whose claims changed
/// * `claims` - ALL current claims on that item
/// * `participants` - ALL participants on the bill (weights are needed
///   even for participants without claims)
/// * `multiplier` - [`extras_multiplier`] for the bill
///
/// ## Guards
/// * zero total person-weight → zero amounts (no division by zero)
/// * claimer not found among participants → that claim allocates to zero
pub fn allocate_item(
    item: &Item,
    claims: &[Claim],
    participants: &[Participant],
    multiplier: f64,
) -> Vec<ClaimAllocation> {
    claims
        .iter()
        .map(|claim| {
            let shares = distribute_claim(item, claim, participants, multiplier);
            let own_share = shares
                .iter()
                .find(|(pid, _)| pid == &claim.participant_id)
                .map(|(_, cents)| *cents)
                .unwrap_or(0.0);

            ClaimAllocation {
                claim_id: claim.id.clone(),
                participant_id: claim.participant_id.clone(),
                amount_owed: Money::from_unrounded_cents(own_share),
            }
        })
        .collect()
}

/// Distributes one claim's cost across the participants it touches.
///
/// Returns `(participant_id, unrounded_cents)` pairs:
/// - `Solo`: one entry, the claimer's fraction of the line
/// - `SplitWithAll`: one entry per participant on the bill, weighted -
///   every participant receives a share even without a claim of their
///   own, because this share type locks the whole item
/// - `SplitWithSpecific`: entries for the claimer and each listed
///   co-sharer that exists, weighted
///
/// Amounts are unrounded so that bill-level settlement can accumulate
/// across items before rounding once per participant.
pub fn distribute_claim(
    item: &Item,
    claim: &Claim,
    participants: &[Participant],
    multiplier: f64,
) -> Vec<(String, f64)> {
    let item_with_extras = item.price_cents as f64 * multiplier;

    match claim.share_type {
        ShareType::Solo => {
            let item_quantity = item.quantity.max(1) as f64;
            let fraction = claim.quantity_claimed / item_quantity;
            vec![(claim.participant_id.clone(), item_with_extras * fraction)]
        }

        ShareType::SplitWithAll => {
            let total_weight: i64 = participants.iter().map(Participant::person_weight).sum();
            if total_weight <= 0 {
                return Vec::new();
            }

            let per_weight_unit = item_with_extras / total_weight as f64;
            participants
                .iter()
                .map(|p| (p.id.clone(), per_weight_unit * p.person_weight() as f64))
                .collect()
        }

        ShareType::SplitWithSpecific => {
            let Some(claimer) = participants.iter().find(|p| p.id == claim.participant_id)
            else {
                return Vec::new();
            };

            // Co-sharers that actually exist on the bill; the claimer is
            // never counted twice even if listed in their own share list.
            let sharers: Vec<&Participant> = claim
                .share_with_participant_ids
                .iter()
                .filter(|pid| **pid != claim.participant_id)
                .filter_map(|pid| participants.iter().find(|p| &p.id == pid))
                .collect();

            let total_weight: i64 = claimer.person_weight()
                + sharers.iter().map(|p| p.person_weight()).sum::<i64>();
            if total_weight <= 0 {
                return Vec::new();
            }

            let per_weight_unit = item_with_extras / total_weight as f64;

            let mut shares = Vec::with_capacity(sharers.len() + 1);
            shares.push((
                claimer.id.clone(),
                per_weight_unit * claimer.person_weight() as f64,
            ));
            for sharer in sharers {
                shares.push((
                    sharer.id.clone(),
                    per_weight_unit * sharer.person_weight() as f64,
                ));
            }
            shares
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crate::types::{ItemSource, ShareType};

    fn item(price_cents: i64, quantity: i64) -> Item {
        Item {
            id: "i1".to_string(),
            bill_id: "b1".to_string(),
            name: "Nachos".to_string(),
            price_cents,
            quantity,
            source: ItemSource::Manual,
            display_order: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn participant(id: &str, plus_ones: i64) -> Participant {
        Participant {
            id: id.to_string(),
            bill_id: "b1".to_string(),
            name: id.to_string(),
            phone_number: format!("UNSET-ABC123-{id}"),
            plus_one_count: plus_ones,
            has_responded: false,
            created_at: Utc::now(),
            last_updated_at: Utc::now(),
        }
    }

    fn claim(id: &str, pid: &str, share_type: ShareType, qty: f64, with: &[&str]) -> Claim {
        Claim {
            id: id.to_string(),
            item_id: "i1".to_string(),
            participant_id: pid.to_string(),
            share_type,
            share_with_participant_ids: with.iter().map(|s| s.to_string()).collect(),
            quantity_claimed: qty,
            amount_owed_cents: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_extras_multiplier() {
        let m = extras_multiplier(
            Money::from_cents(3000),
            Money::from_cents(300),
            Money::from_cents(300),
        );
        assert!((m - 1.2).abs() < 1e-9);

        assert_eq!(
            extras_multiplier(Money::zero(), Money::from_cents(500), Money::zero()),
            1.0
        );
        assert_eq!(
            extras_multiplier(Money::from_cents(1000), Money::zero(), Money::zero()),
            1.0
        );
    }

    /// Worked scenario: $30 item, $30 subtotal, $3 tax, $3 tip.
    /// Multiplier 1.2 → item with extras $36. Solo claim of the whole
    /// line owes exactly $36.00.
    #[test]
    fn test_solo_claim_full_line_with_extras() {
        let item = item(3000, 1);
        let participants = vec![participant("a", 0)];
        let claims = vec![claim("c1", "a", ShareType::Solo, 1.0, &[])];

        let allocs = allocate_item(&item, &claims, &participants, 1.2);
        assert_eq!(allocs.len(), 1);
        assert_eq!(allocs[0].amount_owed, Money::from_cents(3600));
    }

    /// Solo claims take a fraction of the line by quantity and do NOT
    /// multiply by the claimer's person-weight.
    #[test]
    fn test_solo_claim_partial_quantity_ignores_plus_ones() {
        let item = item(3000, 3); // $30 for 3 units
        let participants = vec![participant("a", 2)]; // weight 3, irrelevant
        let claims = vec![claim("c1", "a", ShareType::Solo, 2.0, &[])];

        let allocs = allocate_item(&item, &claims, &participants, 1.0);
        // 2 of 3 units: $20.00
        assert_eq!(allocs[0].amount_owed, Money::from_cents(2000));
    }

    /// Worked scenario: split_with_all on a $36-with-extras item between
    /// A (weight 1) and B (weight 2): A owes $12, B owes $24. The claim
    /// row's amount is the claimer's own weighted share.
    #[test]
    fn test_split_with_all_weighted() {
        let item = item(3000, 1);
        let participants = vec![participant("a", 0), participant("b", 1)];
        let claims = vec![claim("c1", "a", ShareType::SplitWithAll, 1.0, &[])];

        let allocs = allocate_item(&item, &claims, &participants, 1.2);
        assert_eq!(allocs[0].amount_owed, Money::from_cents(1200));

        // The full distribution reaches B as well, even without a claim row
        let shares = distribute_claim(&item, &claims[0], &participants, 1.2);
        assert_eq!(shares.len(), 2);
        let b_share = shares.iter().find(|(pid, _)| pid == "b").unwrap().1;
        assert_eq!(Money::from_unrounded_cents(b_share), Money::from_cents(2400));
    }

    /// Specific-split scenario: $20 item, no extras, A (weight 1) shares
    /// with B (weight 2). Per-weight-unit $6.667: A ≈ $6.67, B ≈ $13.33.
    /// Rounding is local; the sum happens to hit $20.00 here.
    #[test]
    fn test_split_with_specific_weighted_rounding() {
        let item = item(2000, 1);
        let participants = vec![participant("a", 0), participant("b", 1)];
        let claims = vec![claim(
            "c1",
            "a",
            ShareType::SplitWithSpecific,
            1.0,
            &["b"],
        )];

        let allocs = allocate_item(&item, &claims, &participants, 1.0);
        assert_eq!(allocs[0].amount_owed, Money::from_cents(667));

        let shares = distribute_claim(&item, &claims[0], &participants, 1.0);
        let b_share = shares.iter().find(|(pid, _)| pid == "b").unwrap().1;
        assert_eq!(Money::from_unrounded_cents(b_share), Money::from_cents(1333));
    }

    #[test]
    fn test_split_with_specific_ignores_unknown_and_duplicate_sharers() {
        let item = item(2000, 1);
        let participants = vec![participant("a", 0), participant("b", 0)];
        // "ghost" doesn't exist; "a" is the claimer and must not count twice
        let claims = vec![claim(
            "c1",
            "a",
            ShareType::SplitWithSpecific,
            1.0,
            &["b", "ghost", "a"],
        )];

        let allocs = allocate_item(&item, &claims, &participants, 1.0);
        // Split two ways: $10.00 each
        assert_eq!(allocs[0].amount_owed, Money::from_cents(1000));
    }

    #[test]
    fn test_zero_weight_guard() {
        let item = item(2000, 1);
        // No participants at all: split_with_all has nobody to charge
        let claims = vec![claim("c1", "a", ShareType::SplitWithAll, 1.0, &[])];
        let allocs = allocate_item(&item, &claims, &[], 1.0);
        assert_eq!(allocs[0].amount_owed, Money::zero());
    }

    #[test]
    fn test_missing_claimer_allocates_zero() {
        let item = item(2000, 1);
        let participants = vec![participant("b", 0)];
        let claims = vec![claim(
            "c1",
            "ghost",
            ShareType::SplitWithSpecific,
            1.0,
            &["b"],
        )];

        let allocs = allocate_item(&item, &claims, &participants, 1.0);
        assert_eq!(allocs[0].amount_owed, Money::zero());
    }

    /// Idempotence: recomputing with unchanged inputs yields identical
    /// amounts.
    #[test]
    fn test_allocation_is_idempotent() {
        let item = item(3599, 3);
        let participants = vec![participant("a", 1), participant("b", 0)];
        let claims = vec![
            claim("c1", "a", ShareType::Solo, 2.0, &[]),
            claim("c2", "b", ShareType::Solo, 1.0, &[]),
        ];

        let first = allocate_item(&item, &claims, &participants, 1.17);
        let second = allocate_item(&item, &claims, &participants, 1.17);
        assert_eq!(first, second);
    }
}
