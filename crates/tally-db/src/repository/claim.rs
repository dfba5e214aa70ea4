//! # Claim Repository
//!
//! Database operations for claims.
//!
//! ## Storage Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  claims table                                                           │
//! │                                                                         │
//! │  One row per (item, participant): UNIQUE(item_id, participant_id).     │
//! │  Re-claiming updates the row in place; amounts are derived and         │
//! │  rewritten by the allocation engine after every mutation.              │
//! │                                                                         │
//! │  share_with_participant_ids is stored as a JSON array in a TEXT        │
//! │  column ('["p2","p3"]'); ClaimRow carries the raw string and the       │
//! │  TryFrom conversion parses it into Vec<String>.                        │
//! │                                                                         │
//! │  A partial unique index allows at most one split_with_all row per      │
//! │  item, backing the exclusivity rule at the schema level.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::sqlite::Sqlite;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use tally_core::{Claim, Item, ShareType};

const CLAIM_COLUMNS: &str = "id, item_id, participant_id, share_type, \
     share_with_participant_ids, quantity_claimed, amount_owed_cents, created_at, updated_at";

// =============================================================================
// Row Mapping
// =============================================================================

/// Raw claims row: the share list is still JSON text here.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ClaimRow {
    pub id: String,
    pub item_id: String,
    pub participant_id: String,
    pub share_type: ShareType,
    pub share_with_participant_ids: String,
    pub quantity_claimed: f64,
    pub amount_owed_cents: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ClaimRow> for Claim {
    type Error = DbError;

    fn try_from(row: ClaimRow) -> Result<Self, Self::Error> {
        let share_with: Vec<String> = serde_json::from_str(&row.share_with_participant_ids)?;

        Ok(Claim {
            id: row.id,
            item_id: row.item_id,
            participant_id: row.participant_id,
            share_type: row.share_type,
            share_with_participant_ids: share_with,
            quantity_claimed: row.quantity_claimed,
            amount_owed_cents: row.amount_owed_cents,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn share_with_json(ids: &[String]) -> DbResult<String> {
    Ok(serde_json::to_string(ids)?)
}

// =============================================================================
// Repository
// =============================================================================

/// A claim joined with the item it is on, for participant-centric views.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ClaimWithItem {
    pub claim: Claim,
    pub item: Item,
}

/// Repository for claim database operations.
///
/// Read-only from the outside: all writes go through the claim service so
/// that amounts and participant statuses stay consistent.
#[derive(Debug, Clone)]
pub struct ClaimRepository {
    pool: SqlitePool,
}

impl ClaimRepository {
    /// Creates a new ClaimRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ClaimRepository { pool }
    }

    /// Gets a claim by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Claim>> {
        claim_by_id(&self.pool, id).await
    }

    /// Lists all claims on an item, oldest first.
    pub async fn list_for_item(&self, item_id: &str) -> DbResult<Vec<Claim>> {
        claims_for_item(&self.pool, item_id).await
    }

    /// Finds the claim a participant holds on an item, if any.
    pub async fn find_for_item_and_participant(
        &self,
        item_id: &str,
        participant_id: &str,
    ) -> DbResult<Option<Claim>> {
        claim_for_item_and_participant(&self.pool, item_id, participant_id).await
    }

    /// Finds the split_with_all claim on an item, if one exists.
    ///
    /// At most one can exist (partial unique index), so this is the item's
    /// current lock holder.
    pub async fn find_split_with_all(&self, item_id: &str) -> DbResult<Option<Claim>> {
        split_with_all_claim(&self.pool, item_id).await
    }

    /// Number of claims a participant currently holds.
    pub async fn count_for_participant(&self, participant_id: &str) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM claims WHERE participant_id = ?1")
                .bind(participant_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    /// Lists a participant's claims together with the claimed items.
    pub async fn list_for_participant_with_items(
        &self,
        participant_id: &str,
    ) -> DbResult<Vec<ClaimWithItem>> {
        let sql = format!(
            "SELECT {CLAIM_COLUMNS} FROM claims WHERE participant_id = ?1 ORDER BY created_at"
        );
        let rows: Vec<ClaimRow> = sqlx::query_as(&sql)
            .bind(participant_id)
            .fetch_all(&self.pool)
            .await?;

        let items: Vec<Item> = sqlx::query_as(
            "SELECT id, bill_id, name, price_cents, quantity, source, display_order, \
             created_at, updated_at \
             FROM items \
             WHERE id IN (SELECT item_id FROM claims WHERE participant_id = ?1)",
        )
        .bind(participant_id)
        .fetch_all(&self.pool)
        .await?;

        let mut joined = Vec::with_capacity(rows.len());
        for row in rows {
            let claim = Claim::try_from(row)?;
            let Some(item) = items.iter().find(|i| i.id == claim.item_id) else {
                continue;
            };
            joined.push(ClaimWithItem {
                claim,
                item: item.clone(),
            });
        }

        Ok(joined)
    }
}

// =============================================================================
// Query Helpers (shared with the claim service's transactions)
// =============================================================================

pub(crate) async fn claim_by_id<'e, E>(executor: E, id: &str) -> DbResult<Option<Claim>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT {CLAIM_COLUMNS} FROM claims WHERE id = ?1");
    let row: Option<ClaimRow> = sqlx::query_as(&sql).bind(id).fetch_optional(executor).await?;

    row.map(Claim::try_from).transpose()
}

pub(crate) async fn claims_for_item<'e, E>(executor: E, item_id: &str) -> DbResult<Vec<Claim>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT {CLAIM_COLUMNS} FROM claims WHERE item_id = ?1 ORDER BY created_at");
    let rows: Vec<ClaimRow> = sqlx::query_as(&sql)
        .bind(item_id)
        .fetch_all(executor)
        .await?;

    rows.into_iter().map(Claim::try_from).collect()
}

pub(crate) async fn claim_for_item_and_participant<'e, E>(
    executor: E,
    item_id: &str,
    participant_id: &str,
) -> DbResult<Option<Claim>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        "SELECT {CLAIM_COLUMNS} FROM claims WHERE item_id = ?1 AND participant_id = ?2"
    );
    let row: Option<ClaimRow> = sqlx::query_as(&sql)
        .bind(item_id)
        .bind(participant_id)
        .fetch_optional(executor)
        .await?;

    row.map(Claim::try_from).transpose()
}

pub(crate) async fn split_with_all_claim<'e, E>(
    executor: E,
    item_id: &str,
) -> DbResult<Option<Claim>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        "SELECT {CLAIM_COLUMNS} FROM claims WHERE item_id = ?1 AND share_type = 'split_with_all'"
    );
    let row: Option<ClaimRow> = sqlx::query_as(&sql)
        .bind(item_id)
        .fetch_optional(executor)
        .await?;

    row.map(Claim::try_from).transpose()
}

pub(crate) async fn insert_claim<'e, E>(executor: E, claim: &Claim) -> DbResult<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    debug!(id = %claim.id, item_id = %claim.item_id, "Inserting claim");

    sqlx::query(
        "INSERT INTO claims ( \
             id, item_id, participant_id, share_type, share_with_participant_ids, \
             quantity_claimed, amount_owed_cents, created_at, updated_at \
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
    )
    .bind(&claim.id)
    .bind(&claim.item_id)
    .bind(&claim.participant_id)
    .bind(claim.share_type)
    .bind(share_with_json(&claim.share_with_participant_ids)?)
    .bind(claim.quantity_claimed)
    .bind(claim.amount_owed_cents)
    .bind(claim.created_at)
    .bind(claim.updated_at)
    .execute(executor)
    .await?;

    Ok(())
}

/// Rewrites a claim's share fields in place. The derived amount is left
/// untouched; the allocation pass overwrites it right after.
pub(crate) async fn update_claim_share<'e, E>(
    executor: E,
    claim_id: &str,
    share_type: ShareType,
    share_with: &[String],
    quantity_claimed: f64,
    now: DateTime<Utc>,
) -> DbResult<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    debug!(id = %claim_id, ?share_type, "Updating claim in place");

    sqlx::query(
        "UPDATE claims SET \
             share_type = ?2, \
             share_with_participant_ids = ?3, \
             quantity_claimed = ?4, \
             updated_at = ?5 \
         WHERE id = ?1",
    )
    .bind(claim_id)
    .bind(share_type)
    .bind(share_with_json(share_with)?)
    .bind(quantity_claimed)
    .bind(now)
    .execute(executor)
    .await?;

    Ok(())
}

pub(crate) async fn delete_claim<'e, E>(executor: E, claim_id: &str) -> DbResult<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    debug!(id = %claim_id, "Deleting claim");

    sqlx::query("DELETE FROM claims WHERE id = ?1")
        .bind(claim_id)
        .execute(executor)
        .await?;

    Ok(())
}

/// Deletes every claim on an item except the given participant's own.
///
/// ## Returns
/// The participant ids whose claims were removed, so the caller can
/// refresh their `has_responded` flags.
pub(crate) async fn delete_claims_on_item_except(
    conn: &mut sqlx::SqliteConnection,
    item_id: &str,
    keep_participant_id: &str,
) -> DbResult<Vec<String>> {
    let cleared: Vec<String> = sqlx::query_scalar(
        "SELECT participant_id FROM claims WHERE item_id = ?1 AND participant_id != ?2",
    )
    .bind(item_id)
    .bind(keep_participant_id)
    .fetch_all(&mut *conn)
    .await?;

    if cleared.is_empty() {
        return Ok(cleared);
    }

    debug!(item_id, cleared = cleared.len(), "Clearing competing claims");

    sqlx::query("DELETE FROM claims WHERE item_id = ?1 AND participant_id != ?2")
        .bind(item_id)
        .bind(keep_participant_id)
        .execute(&mut *conn)
        .await?;

    Ok(cleared)
}

/// Writes a recomputed derived amount back to a claim row.
pub(crate) async fn set_amount_owed<'e, E>(
    executor: E,
    claim_id: &str,
    amount_owed_cents: i64,
    now: DateTime<Utc>,
) -> DbResult<()>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query("UPDATE claims SET amount_owed_cents = ?2, updated_at = ?3 WHERE id = ?1")
        .bind(claim_id)
        .bind(amount_owed_cents)
        .bind(now)
        .execute(executor)
        .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
