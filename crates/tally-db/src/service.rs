//! # Claim Service
//!
//! Transactional claim mutations: the only write path for claims.
//!
//! ## Submission Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Claim Submission Pipeline                           │
//! │                                                                         │
//! │  SubmitClaimInput (loose wire payload)                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  normalize_submission ──► ClaimAction (Unclaim | Claim(ShareRequest))  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  acquire write mutex ──► BEGIN TRANSACTION                             │
//! │       │                                                                 │
//! │       ├── Unclaim: delete row (absent row → no-op)                     │
//! │       │                                                                 │
//! │       ├── SplitWithAll: clear competing claims, insert/update own      │
//! │       │                                                                 │
//! │       └── Solo / SplitWithSpecific:                                    │
//! │           ├── reject if someone else holds split_with_all              │
//! │           ├── reject if quantity exceeds what others left              │
//! │           └── insert or update in place                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  recompute ALL amounts on the item (allocation engine)                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  refresh has_responded for every touched participant                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  COMMIT ──► ClaimOutcome { claimed | updated | unclaimed }             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Why A Mutex On Top Of The Transaction
//! SQLite serializes writers, but the guards here are read-then-write
//! (check remaining quantity, then insert). The process-wide mutex makes
//! the whole read-validate-write sequence atomic without relying on
//! busy-retry behavior.

use std::sync::Arc;

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::{bill, claim, item, participant};
use tally_core::allocation::{allocate_item, extras_multiplier};
use tally_core::validation::normalize_submission;
use tally_core::{
    Claim, ClaimAction, ClaimOutcome, CoreError, Item, ShareRequest, ShareType, SubmitClaimInput,
    ValidationError,
};

// =============================================================================
// Service Error
// =============================================================================

/// What callers of the service layer see: a domain rejection or a
/// storage failure, never a bare sqlx error.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A business rule rejected the request. Nothing was written.
    #[error(transparent)]
    Domain(#[from] CoreError),

    /// The database failed; the transaction was rolled back.
    #[error(transparent)]
    Storage(#[from] DbError),
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        ServiceError::Domain(CoreError::Validation(err))
    }
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

// =============================================================================
// Claim Service
// =============================================================================

/// The claim mutation service.
///
/// Cheap to clone; every handle from the same [`crate::Database`] shares
/// one write mutex, so submissions are serialized process-wide.
#[derive(Debug, Clone)]
pub struct ClaimService {
    pool: SqlitePool,
    write_lock: Arc<Mutex<()>>,
}

impl ClaimService {
    pub(crate) fn new(pool: SqlitePool, write_lock: Arc<Mutex<()>>) -> Self {
        ClaimService { pool, write_lock }
    }

    /// Submits a claim, an update, or an unclaim for one (item, participant).
    ///
    /// The whole mutation - guards, row write, amount recomputation, and
    /// participant status refresh - runs in a single transaction. On any
    /// error the transaction rolls back and nothing is visible.
    ///
    /// ## Outcomes
    /// - [`ClaimOutcome::Claimed`] - a new claim row was created
    /// - [`ClaimOutcome::Updated`] - the participant's existing row changed
    /// - [`ClaimOutcome::Unclaimed`] - the row was removed (or was absent)
    ///
    /// Returned claims carry their freshly recomputed amounts.
    pub async fn submit(&self, input: &SubmitClaimInput) -> ServiceResult<ClaimOutcome> {
        let (item_id, participant_id, action) = normalize_submission(input)?;

        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let outcome = apply_submission(&mut *tx, &item_id, &participant_id, action).await?;

        tx.commit().await.map_err(DbError::from)?;

        debug!(item_id, participant_id, "Claim submission committed");
        Ok(outcome)
    }

    /// Recomputes every claim amount on one item.
    ///
    /// Normally runs inside [`submit`](Self::submit); exposed for repair
    /// after out-of-band data changes. A missing item or bill is a no-op,
    /// not an error.
    pub async fn recalculate_item(&self, item_id: &str) -> ServiceResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        recalculate(&mut *tx, item_id).await?;

        tx.commit().await.map_err(DbError::from)?;
        Ok(())
    }
}

// =============================================================================
// Mutation Steps (all run inside the caller's transaction)
// =============================================================================

async fn apply_submission(
    conn: &mut SqliteConnection,
    item_id: &str,
    participant_id: &str,
    action: ClaimAction,
) -> ServiceResult<ClaimOutcome> {
    let existing = claim::claim_for_item_and_participant(&mut *conn, item_id, participant_id)
        .await?;

    match action {
        ClaimAction::Unclaim => {
            // Unclaiming bypasses every guard: releasing is always allowed,
            // and releasing nothing is a no-op rather than an error.
            let Some(current) = existing else {
                debug!(item_id, participant_id, "Unclaim of absent claim, no-op");
                return Ok(ClaimOutcome::Unclaimed { claim_id: None });
            };

            claim::delete_claim(&mut *conn, &current.id).await?;
            participant::refresh_status(&mut *conn, participant_id, Utc::now()).await?;
            recalculate(&mut *conn, item_id).await?;

            debug!(item_id, participant_id, claim_id = %current.id, "Claim removed");
            Ok(ClaimOutcome::Unclaimed {
                claim_id: Some(current.id),
            })
        }

        ClaimAction::Claim(request) => {
            let item = item::item_by_id(&mut *conn, item_id)
                .await?
                .ok_or_else(|| CoreError::ItemNotFound(item_id.to_string()))?;

            let claimer = participant::participant_by_id(&mut *conn, participant_id)
                .await?
                .filter(|p| p.bill_id == item.bill_id)
                .ok_or_else(|| CoreError::ParticipantNotFound(participant_id.to_string()))?;

            apply_claim(conn, &item, &claimer.id, existing, request).await
        }
    }
}

async fn apply_claim(
    conn: &mut SqliteConnection,
    item: &Item,
    participant_id: &str,
    existing: Option<Claim>,
    request: ShareRequest,
) -> ServiceResult<ClaimOutcome> {
    let now = Utc::now();
    let share_type = request.share_type();

    // Exclusivity: a split_with_all claim held by someone else locks the
    // item. The holder themselves may switch share types freely.
    if share_type != ShareType::SplitWithAll {
        if let Some(holder) = claim::split_with_all_claim(&mut *conn, &item.id).await? {
            if holder.participant_id != participant_id {
                return Err(CoreError::ItemAlreadySplit {
                    item_id: item.id.clone(),
                    held_by: holder.participant_id,
                }
                .into());
            }
        }
    }

    let (quantity_claimed, share_with) = match request {
        ShareRequest::Solo { quantity } => (quantity, Vec::new()),
        // split_with_all covers the whole line
        ShareRequest::SplitWithAll => (item.quantity as f64, Vec::new()),
        // specific splits are whole-item too; quantity 1 marks presence
        ShareRequest::SplitWithSpecific { share_with } => (1.0, share_with),
    };

    if share_type == ShareType::SplitWithAll {
        // Taking the lock clears everyone else's claims on the item
        let cleared =
            claim::delete_claims_on_item_except(&mut *conn, &item.id, participant_id).await?;
        for cleared_id in &cleared {
            participant::refresh_status(&mut *conn, cleared_id, now).await?;
        }
    } else {
        // Quantity guard: the request may not exceed what everyone else
        // has left unclaimed. The participant's own row doesn't count
        // against them - updates replace it.
        let claimed_by_others: f64 = claim::claims_for_item(&mut *conn, &item.id)
            .await?
            .iter()
            .filter(|c| c.participant_id != participant_id)
            .map(|c| c.quantity_claimed)
            .sum();
        let available = item.quantity as f64 - claimed_by_others;

        if quantity_claimed > available {
            return Err(CoreError::InsufficientQuantity {
                item_id: item.id.clone(),
                requested: quantity_claimed,
                available,
            }
            .into());
        }
    }

    let (claim_id, created) = match existing {
        Some(current) => {
            claim::update_claim_share(
                &mut *conn,
                &current.id,
                share_type,
                &share_with,
                quantity_claimed,
                now,
            )
            .await?;
            (current.id, false)
        }
        None => {
            let new_claim = Claim {
                id: Uuid::new_v4().to_string(),
                item_id: item.id.clone(),
                participant_id: participant_id.to_string(),
                share_type,
                share_with_participant_ids: share_with,
                quantity_claimed,
                amount_owed_cents: 0, // recomputed below
                created_at: now,
                updated_at: now,
            };
            claim::insert_claim(&mut *conn, &new_claim).await?;
            (new_claim.id, true)
        }
    };

    recalculate(&mut *conn, &item.id).await?;
    participant::refresh_status(&mut *conn, participant_id, now).await?;

    let stored = claim::claim_by_id(&mut *conn, &claim_id)
        .await?
        .ok_or_else(|| DbError::not_found("Claim", claim_id))?;

    Ok(if created {
        ClaimOutcome::Claimed(stored)
    } else {
        ClaimOutcome::Updated(stored)
    })
}

/// Re-derives every claim amount on an item from current state.
///
/// Runs after every mutation, including deletions: the remaining claims'
/// amounts must reflect the new state. Missing item or bill means there
/// is nothing to recompute.
async fn recalculate(conn: &mut SqliteConnection, item_id: &str) -> ServiceResult<()> {
    let Some(item) = item::item_by_id(&mut *conn, item_id).await? else {
        return Ok(());
    };
    let Some(owning_bill) = bill::bill_by_id(&mut *conn, &item.bill_id).await? else {
        return Ok(());
    };

    let claims = claim::claims_for_item(&mut *conn, item_id).await?;
    if claims.is_empty() {
        return Ok(());
    }

    let subtotal_cents = item::bill_subtotal_cents(&mut *conn, &item.bill_id).await?;
    let participants = participant::participants_for_bill(&mut *conn, &item.bill_id).await?;

    let multiplier = extras_multiplier(
        tally_core::Money::from_cents(subtotal_cents),
        owning_bill.tax_amount(),
        owning_bill.tip_amount(),
    );

    let now = Utc::now();
    for allocation in allocate_item(&item, &claims, &participants, multiplier) {
        claim::set_amount_owed(&mut *conn, &allocation.claim_id, allocation.amount_owed.cents(), now)
            .await?;
    }

    debug!(item_id, claims = claims.len(), "Recomputed claim amounts");
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
