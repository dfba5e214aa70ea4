//! # Item Repository
//!
//! Read operations for bill line items. Items are written once, at bill
//! creation, by [`crate::repository::bill::BillRepository`]; everything
//! after that only reads them.

use sqlx::sqlite::Sqlite;
use sqlx::SqlitePool;

use crate::error::DbResult;
use tally_core::Item;

const ITEM_COLUMNS: &str =
    "id, bill_id, name, price_cents, quantity, source, display_order, created_at, updated_at";

/// Repository for item database operations.
#[derive(Debug, Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
}

impl ItemRepository {
    /// Creates a new ItemRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ItemRepository { pool }
    }

    /// Gets an item by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Item>> {
        item_by_id(&self.pool, id).await
    }

    /// Lists all items on a bill, in receipt display order.
    pub async fn list_for_bill(&self, bill_id: &str) -> DbResult<Vec<Item>> {
        items_for_bill(&self.pool, bill_id).await
    }
}

// =============================================================================
// Query Helpers (shared with the claim service's transactions)
// =============================================================================

pub(crate) async fn item_by_id<'e, E>(executor: E, id: &str) -> DbResult<Option<Item>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = ?1");
    let item = sqlx::query_as::<_, Item>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await?;

    Ok(item)
}

pub(crate) async fn items_for_bill<'e, E>(executor: E, bill_id: &str) -> DbResult<Vec<Item>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        "SELECT {ITEM_COLUMNS} FROM items WHERE bill_id = ?1 ORDER BY display_order, created_at"
    );
    let items = sqlx::query_as::<_, Item>(&sql)
        .bind(bill_id)
        .fetch_all(executor)
        .await?;

    Ok(items)
}

/// Sum of line prices for a bill, in cents. Zero for a bill with no items.
pub(crate) async fn bill_subtotal_cents<'e, E>(executor: E, bill_id: &str) -> DbResult<i64>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let subtotal: Option<i64> =
        sqlx::query_scalar("SELECT SUM(price_cents) FROM items WHERE bill_id = ?1")
            .bind(bill_id)
            .fetch_one(executor)
            .await?;

    Ok(subtotal.unwrap_or(0))
}
