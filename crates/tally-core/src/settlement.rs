//! # Settlement Projections
//!
//! Bill-level, read-only projections over (items, participants, claims).
//!
//! ## Relationship To The Allocation Engine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  allocation (per item)              settlement (per bill)              │
//! │  ─────────────────────              ──────────────────────             │
//! │  recomputes claim.amount_owed       answers "who owes what overall?"   │
//! │  runs on every mutation             runs at read time, derived         │
//! │  rounds per claim row               accumulates unrounded across       │
//! │                                     items, rounds once per participant │
//! │                                                                         │
//! │  Both share distribute_claim() so the two views can never disagree    │
//! │  about how a single claim spreads cost.                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::allocation::{distribute_claim, extras_multiplier};
use crate::money::Money;
use crate::types::{Claim, Item, Participant};

// =============================================================================
// Per-Participant Totals
// =============================================================================

/// Computes each participant's total owed across the whole bill, with tax
/// and tip spread proportionally.
///
/// Every participant appears in the result, at zero if nothing has been
/// claimed for them. Amounts accumulate unrounded across items and are
/// rounded once per participant at the end.
///
/// ## Example
/// Worked scenario: one $30 item, $3 tax, $3 tip, split with all between
/// A (alone) and B (+1): A owes $12.00, B owes $24.00.
pub fn calculate_splits(
    items: &[Item],
    participants: &[Participant],
    claims: &[Claim],
    tax: Money,
    tip: Money,
) -> HashMap<String, Money> {
    let subtotal: Money = items.iter().map(Item::price).sum();
    let multiplier = extras_multiplier(subtotal, tax, tip);

    let mut unrounded: HashMap<String, f64> = participants
        .iter()
        .map(|p| (p.id.clone(), 0.0))
        .collect();

    for claim in claims {
        let Some(item) = items.iter().find(|i| i.id == claim.item_id) else {
            continue;
        };

        for (participant_id, cents) in distribute_claim(item, claim, participants, multiplier) {
            // Unknown claimers are skipped: only bill participants settle
            if let Some(total) = unrounded.get_mut(&participant_id) {
                *total += cents;
            }
        }
    }

    unrounded
        .into_iter()
        .map(|(id, cents)| (id, Money::from_unrounded_cents(cents)))
        .collect()
}

// =============================================================================
// Itemized Breakdown
// =============================================================================

/// One line of a participant's itemized breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ItemShare {
    pub item_id: String,
    pub name: String,
    pub amount: Money,
}

/// A participant's itemized view: which items they owe on, at raw item
/// prices (tax/tip excluded - the UI shows extras separately).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ParticipantBreakdown {
    pub items: Vec<ItemShare>,
    pub subtotal: Money,
}

/// Builds the per-participant itemized breakdown for the whole bill.
///
/// Unlike [`calculate_splits`] this works on raw item prices (multiplier
/// 1): extras are presented separately by the caller. Each line is rounded
/// locally; the subtotal is rounded once from the unrounded running sum.
pub fn itemized_shares(
    items: &[Item],
    participants: &[Participant],
    claims: &[Claim],
) -> HashMap<String, ParticipantBreakdown> {
    let mut breakdowns: HashMap<String, ParticipantBreakdown> = participants
        .iter()
        .map(|p| (p.id.clone(), ParticipantBreakdown::default()))
        .collect();
    let mut unrounded_subtotals: HashMap<String, f64> = participants
        .iter()
        .map(|p| (p.id.clone(), 0.0))
        .collect();

    for claim in claims {
        let Some(item) = items.iter().find(|i| i.id == claim.item_id) else {
            continue;
        };

        for (participant_id, cents) in distribute_claim(item, claim, participants, 1.0) {
            let Some(breakdown) = breakdowns.get_mut(&participant_id) else {
                continue;
            };
            breakdown.items.push(ItemShare {
                item_id: item.id.clone(),
                name: item.name.clone(),
                amount: Money::from_unrounded_cents(cents),
            });
            if let Some(total) = unrounded_subtotals.get_mut(&participant_id) {
                *total += cents;
            }
        }
    }

    for (participant_id, cents) in unrounded_subtotals {
        if let Some(breakdown) = breakdowns.get_mut(&participant_id) {
            breakdown.subtotal = Money::from_unrounded_cents(cents);
        }
    }

    breakdowns
}

// =============================================================================
// Unclaimed Items
// =============================================================================

/// Items nobody has claimed yet, in display order of the input slice.
pub fn unclaimed_items<'a>(items: &'a [Item], claims: &[Claim]) -> Vec<&'a Item> {
    items
        .iter()
        .filter(|item| !claims.iter().any(|claim| claim.item_id == item.id))
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crate::types::{ItemSource, ShareType};

    fn item(id: &str, price_cents: i64, quantity: i64) -> Item {
        Item {
            id: id.to_string(),
            bill_id: "b1".to_string(),
            name: format!("item-{id}"),
            price_cents,
            quantity,
            source: ItemSource::Ocr,
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
            has_responded: true,
            created_at: Utc::now(),
            last_updated_at: Utc::now(),
        }
    }

    fn claim(id: &str, item: &str, pid: &str, share_type: ShareType, qty: f64, with: &[&str]) -> Claim {
        Claim {
            id: id.to_string(),
            item_id: item.to_string(),
            participant_id: pid.to_string(),
            share_type,
            share_with_participant_ids: with.iter().map(|s| s.to_string()).collect(),
            quantity_claimed: qty,
            amount_owed_cents: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    /// Worked scenario: $30 item, $3 tax, $3 tip, split with all between
    /// A (weight 1) and B (weight 2).
    #[test]
    fn test_split_with_all_totals() {
        let items = vec![item("i1", 3000, 1)];
        let participants = vec![participant("a", 0), participant("b", 1)];
        let claims = vec![claim("c1", "i1", "a", ShareType::SplitWithAll, 1.0, &[])];

        let splits = calculate_splits(
            &items,
            &participants,
            &claims,
            Money::from_cents(300),
            Money::from_cents(300),
        );

        assert_eq!(splits["a"], Money::from_cents(1200));
        assert_eq!(splits["b"], Money::from_cents(2400));
    }

    /// Mixed bill: solo, specific, and an unclaimed participant who still
    /// shows up at zero.
    #[test]
    fn test_mixed_claims_and_zero_participants() {
        let items = vec![item("i1", 2000, 1), item("i2", 1000, 2)];
        let participants = vec![
            participant("a", 0),
            participant("b", 1),
            participant("c", 0),
        ];
        let claims = vec![
            // A shares the $20 item with B: 2000/3 per weight unit
            claim("c1", "i1", "a", ShareType::SplitWithSpecific, 1.0, &["b"]),
            // B takes one of two $5 units solo
            claim("c2", "i2", "b", ShareType::Solo, 1.0, &[]),
        ];

        let splits = calculate_splits(&items, &participants, &claims, Money::zero(), Money::zero());

        // A: 666.67 → $6.67
        assert_eq!(splits["a"], Money::from_cents(667));
        // B: 1333.33 + 500 = 1833.33 → $18.33
        assert_eq!(splits["b"], Money::from_cents(1833));
        // C claimed nothing
        assert_eq!(splits["c"], Money::zero());
    }

    /// Accumulation happens unrounded: two one-third shares round once at
    /// the end (1333.33 → $13.33), not twice (667 + 667 = $13.34).
    #[test]
    fn test_rounding_applied_once_per_participant() {
        let items = vec![item("i1", 2000, 1), item("i2", 2000, 1)];
        let participants = vec![participant("a", 0), participant("b", 1)];
        let claims = vec![
            claim("c1", "i1", "a", ShareType::SplitWithSpecific, 1.0, &["b"]),
            claim("c2", "i2", "a", ShareType::SplitWithSpecific, 1.0, &["b"]),
        ];

        let splits = calculate_splits(&items, &participants, &claims, Money::zero(), Money::zero());

        // Per item A owes 2000/3 = 666.67; across both items 1333.33
        assert_eq!(splits["a"], Money::from_cents(1333));
    }

    #[test]
    fn test_claims_on_missing_items_are_skipped() {
        let items = vec![item("i1", 1000, 1)];
        let participants = vec![participant("a", 0)];
        let claims = vec![claim("c1", "gone", "a", ShareType::Solo, 1.0, &[])];

        let splits = calculate_splits(&items, &participants, &claims, Money::zero(), Money::zero());
        assert_eq!(splits["a"], Money::zero());
    }

    #[test]
    fn test_itemized_shares_use_raw_prices() {
        let items = vec![item("i1", 3000, 1)];
        let participants = vec![participant("a", 0), participant("b", 1)];
        let claims = vec![claim("c1", "i1", "a", ShareType::SplitWithAll, 1.0, &[])];

        // Tax/tip exist on the bill but itemized view ignores them
        let breakdowns = itemized_shares(&items, &participants, &claims);

        let a = &breakdowns["a"];
        assert_eq!(a.items.len(), 1);
        assert_eq!(a.items[0].name, "item-i1");
        assert_eq!(a.items[0].amount, Money::from_cents(1000));
        assert_eq!(a.subtotal, Money::from_cents(1000));

        let b = &breakdowns["b"];
        assert_eq!(b.subtotal, Money::from_cents(2000));
    }

    #[test]
    fn test_unclaimed_items() {
        let items = vec![item("i1", 1000, 1), item("i2", 2000, 1)];
        let claims = vec![claim("c1", "i1", "a", ShareType::Solo, 1.0, &[])];

        let unclaimed = unclaimed_items(&items, &claims);
        assert_eq!(unclaimed.len(), 1);
        assert_eq!(unclaimed[0].id, "i2");
    }
}
