//! # Participant Repository
//!
//! Read operations for bill participants, plus the `has_responded` refresh
//! used by the claim service.
//!
//! ## has_responded Is Derived
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  has_responded = (participant currently holds >= 1 claim)              │
//! │                                                                         │
//! │  claim inserted   ──► refresh_status ──► true                          │
//! │  claim updated    ──► refresh_status ──► true (unchanged)              │
//! │  claim deleted    ──► refresh_status ──► recount, may flip to false    │
//! │  claims cleared by someone locking the item with split_with_all        │
//! │                   ──► refresh_status for each cleared participant      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! The flag is never set directly from a request; it is always recomputed
//! from the claims table inside the same transaction as the mutation.

use chrono::{DateTime, Utc};
use sqlx::sqlite::Sqlite;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use tally_core::Participant;

const PARTICIPANT_COLUMNS: &str =
    "id, bill_id, name, phone_number, plus_one_count, has_responded, created_at, last_updated_at";

/// Repository for participant database operations.
#[derive(Debug, Clone)]
pub struct ParticipantRepository {
    pool: SqlitePool,
}

impl ParticipantRepository {
    /// Creates a new ParticipantRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ParticipantRepository { pool }
    }

    /// Gets a participant by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Participant>> {
        participant_by_id(&self.pool, id).await
    }

    /// Lists all participants on a bill, oldest first.
    pub async fn list_for_bill(&self, bill_id: &str) -> DbResult<Vec<Participant>> {
        participants_for_bill(&self.pool, bill_id).await
    }
}

// =============================================================================
// Query Helpers (shared with the claim service's transactions)
// =============================================================================

pub(crate) async fn participant_by_id<'e, E>(executor: E, id: &str) -> DbResult<Option<Participant>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT {PARTICIPANT_COLUMNS} FROM participants WHERE id = ?1");
    let participant = sqlx::query_as::<_, Participant>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await?;

    Ok(participant)
}

pub(crate) async fn participants_for_bill<'e, E>(
    executor: E,
    bill_id: &str,
) -> DbResult<Vec<Participant>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        "SELECT {PARTICIPANT_COLUMNS} FROM participants WHERE bill_id = ?1 ORDER BY created_at"
    );
    let participants = sqlx::query_as::<_, Participant>(&sql)
        .bind(bill_id)
        .fetch_all(executor)
        .await?;

    Ok(participants)
}

/// Recomputes `has_responded` for one participant from their claim count.
///
/// Runs two statements, so it takes a connection rather than a generic
/// executor; the claim service calls it inside its transaction.
pub(crate) async fn refresh_status(
    conn: &mut SqliteConnection,
    participant_id: &str,
    now: DateTime<Utc>,
) -> DbResult<()> {
    let claim_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM claims WHERE participant_id = ?1")
            .bind(participant_id)
            .fetch_one(&mut *conn)
            .await?;

    let has_responded = claim_count > 0;
    debug!(participant_id, claim_count, has_responded, "Refreshing participant status");

    sqlx::query("UPDATE participants SET has_responded = ?2, last_updated_at = ?3 WHERE id = ?1")
        .bind(participant_id)
        .bind(has_responded)
        .bind(now)
        .execute(&mut *conn)
        .await?;

    Ok(())
}
