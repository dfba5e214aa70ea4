//! # Bill Repository
//!
//! Bill creation and aggregate loads.
//!
//! ## Bill Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Bill Lifecycle                                    │
//! │                                                                         │
//! │  1. CREATE                                                             │
//! │     └── create(NewBill) → bill + items + participants, one tx          │
//! │         ├── generates bill_code (join) and organizer_access_code       │
//! │         └── participants without a phone get UNSET-{code}-{n}          │
//! │                                                                         │
//! │  2. JOIN / VIEW                                                        │
//! │     └── get_aggregate(BillSelector::Code | AccessCode | Id)            │
//! │                                                                         │
//! │  3. CLAIM                                                              │
//! │     └── (ClaimService, not this repository)                            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity
//! `bill_code` is what participants type in to join; `organizer_access_code`
//! is the organizer's management credential. Both are generated here and
//! are unique. Neither is ever used as a foreign key - relations always go
//! through the UUID `id`.

use chrono::Utc;
use sqlx::sqlite::Sqlite;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::{claim, item, participant};
use crate::service::ServiceError;
use tally_core::validation::{
    validate_item_quantity, validate_name, validate_plus_one_count, validate_price_cents,
};
use tally_core::{
    Bill, BillAggregate, BillStatus, Item, ItemSource, Participant, ValidationError,
    MAX_BILL_ITEMS,
};

const BILL_COLUMNS: &str = "id, bill_code, organizer_phone, organizer_access_code, \
     tax_amount_cents, tip_amount_cents, status, created_at, updated_at";

// =============================================================================
// Creation Input
// =============================================================================

/// An item line as submitted at bill creation.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub name: String,
    /// Line total in cents (NOT per-unit).
    pub price_cents: i64,
    pub quantity: i64,
    pub source: ItemSource,
}

/// A participant as submitted at bill creation.
#[derive(Debug, Clone)]
pub struct NewParticipant {
    pub name: String,
    /// Known phone number; `None` gets a placeholder.
    pub phone_number: Option<String>,
    pub plus_one_count: i64,
}

/// Everything needed to create a bill with its children.
#[derive(Debug, Clone)]
pub struct NewBill {
    pub organizer_phone: String,
    pub tax_amount_cents: i64,
    pub tip_amount_cents: i64,
    pub items: Vec<NewItem>,
    pub participants: Vec<NewParticipant>,
}

/// How to look a bill up.
#[derive(Debug, Clone)]
pub enum BillSelector {
    /// Internal UUID.
    Id(String),
    /// Participant-facing join code.
    Code(String),
    /// Organizer's management credential.
    AccessCode(String),
}

impl BillSelector {
    fn key(&self) -> &str {
        match self {
            BillSelector::Id(key) | BillSelector::Code(key) | BillSelector::AccessCode(key) => key,
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for bill database operations.
#[derive(Debug, Clone)]
pub struct BillRepository {
    pool: SqlitePool,
}

impl BillRepository {
    /// Creates a new BillRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BillRepository { pool }
    }

    /// Creates a bill with its items and participants in one transaction.
    ///
    /// ## Validation
    /// All fields are validated before any row is written; a rejected
    /// request leaves no partial state.
    ///
    /// ## Returns
    /// The full aggregate as stored, including generated codes and ids.
    pub async fn create(&self, new_bill: NewBill) -> Result<BillAggregate, ServiceError> {
        validate_new_bill(&new_bill)?;

        let now = Utc::now();
        let bill_id = Uuid::new_v4().to_string();
        let bill_code = generate_bill_code();
        let access_code = generate_access_code();

        debug!(bill_id = %bill_id, bill_code = %bill_code, "Creating bill");

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let bill = Bill {
            id: bill_id.clone(),
            bill_code: bill_code.clone(),
            organizer_phone: new_bill.organizer_phone.trim().to_string(),
            organizer_access_code: access_code,
            tax_amount_cents: new_bill.tax_amount_cents,
            tip_amount_cents: new_bill.tip_amount_cents,
            status: BillStatus::Active,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            "INSERT INTO bills ( \
                 id, bill_code, organizer_phone, organizer_access_code, \
                 tax_amount_cents, tip_amount_cents, status, created_at, updated_at \
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(&bill.id)
        .bind(&bill.bill_code)
        .bind(&bill.organizer_phone)
        .bind(&bill.organizer_access_code)
        .bind(bill.tax_amount_cents)
        .bind(bill.tip_amount_cents)
        .bind(bill.status)
        .bind(bill.created_at)
        .bind(bill.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(DbError::from)?;

        let mut items = Vec::with_capacity(new_bill.items.len());
        for (index, new_item) in new_bill.items.into_iter().enumerate() {
            let item = Item {
                id: Uuid::new_v4().to_string(),
                bill_id: bill_id.clone(),
                name: new_item.name.trim().to_string(),
                price_cents: new_item.price_cents,
                quantity: new_item.quantity,
                source: new_item.source,
                display_order: index as i64,
                created_at: now,
                updated_at: now,
            };

            sqlx::query(
                "INSERT INTO items ( \
                     id, bill_id, name, price_cents, quantity, source, display_order, \
                     created_at, updated_at \
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )
            .bind(&item.id)
            .bind(&item.bill_id)
            .bind(&item.name)
            .bind(item.price_cents)
            .bind(item.quantity)
            .bind(item.source)
            .bind(item.display_order)
            .bind(item.created_at)
            .bind(item.updated_at)
            .execute(&mut *tx)
            .await
            .map_err(DbError::from)?;

            items.push(item);
        }

        let mut participants = Vec::with_capacity(new_bill.participants.len());
        for (index, new_participant) in new_bill.participants.into_iter().enumerate() {
            let phone_number = match new_participant.phone_number {
                Some(phone) if !phone.trim().is_empty() => phone.trim().to_string(),
                _ => format!("UNSET-{}-{}", bill_code, index + 1),
            };

            let participant = Participant {
                id: Uuid::new_v4().to_string(),
                bill_id: bill_id.clone(),
                name: new_participant.name.trim().to_string(),
                phone_number,
                plus_one_count: new_participant.plus_one_count,
                has_responded: false,
                created_at: now,
                last_updated_at: now,
            };

            sqlx::query(
                "INSERT INTO participants ( \
                     id, bill_id, name, phone_number, plus_one_count, has_responded, \
                     created_at, last_updated_at \
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )
            .bind(&participant.id)
            .bind(&participant.bill_id)
            .bind(&participant.name)
            .bind(&participant.phone_number)
            .bind(participant.plus_one_count)
            .bind(participant.has_responded)
            .bind(participant.created_at)
            .bind(participant.last_updated_at)
            .execute(&mut *tx)
            .await
            .map_err(DbError::from)?;

            participants.push(participant);
        }

        tx.commit().await.map_err(DbError::from)?;

        info!(
            bill_id = %bill_id,
            bill_code = %bill_code,
            items = items.len(),
            participants = participants.len(),
            "Bill created"
        );

        Ok(BillAggregate {
            bill,
            items,
            participants,
            claims: Vec::new(),
        })
    }

    /// Gets a bill by its internal id.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Bill>> {
        bill_by_id(&self.pool, id).await
    }

    /// Gets a bill by its participant-facing join code.
    pub async fn get_by_code(&self, bill_code: &str) -> DbResult<Option<Bill>> {
        let sql = format!("SELECT {BILL_COLUMNS} FROM bills WHERE bill_code = ?1");
        let bill = sqlx::query_as::<_, Bill>(&sql)
            .bind(bill_code)
            .fetch_optional(&self.pool)
            .await?;

        Ok(bill)
    }

    /// Gets a bill by the organizer's access code.
    pub async fn get_by_access_code(&self, access_code: &str) -> DbResult<Option<Bill>> {
        let sql = format!("SELECT {BILL_COLUMNS} FROM bills WHERE organizer_access_code = ?1");
        let bill = sqlx::query_as::<_, Bill>(&sql)
            .bind(access_code)
            .fetch_optional(&self.pool)
            .await?;

        Ok(bill)
    }

    /// Loads a bill with all of its children.
    ///
    /// Pure read: amounts come back exactly as the last mutation left
    /// them, with no recomputation here.
    ///
    /// ## Errors
    /// [`DbError::NotFound`] when the selector matches no bill.
    pub async fn get_aggregate(&self, selector: BillSelector) -> DbResult<BillAggregate> {
        let bill = match &selector {
            BillSelector::Id(id) => self.get_by_id(id).await?,
            BillSelector::Code(code) => self.get_by_code(code).await?,
            BillSelector::AccessCode(code) => self.get_by_access_code(code).await?,
        };

        let bill = bill.ok_or_else(|| DbError::not_found("Bill", selector.key()))?;

        let items = item::items_for_bill(&self.pool, &bill.id).await?;
        let participants = participant::participants_for_bill(&self.pool, &bill.id).await?;
        let claims = claims_for_bill(&self.pool, &bill.id).await?;

        Ok(BillAggregate {
            bill,
            items,
            participants,
            claims,
        })
    }
}

// =============================================================================
// Query Helpers
// =============================================================================

pub(crate) async fn bill_by_id<'e, E>(executor: E, id: &str) -> DbResult<Option<Bill>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT {BILL_COLUMNS} FROM bills WHERE id = ?1");
    let bill = sqlx::query_as::<_, Bill>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await?;

    Ok(bill)
}

async fn claims_for_bill(pool: &SqlitePool, bill_id: &str) -> DbResult<Vec<tally_core::Claim>> {
    let rows: Vec<claim::ClaimRow> = sqlx::query_as(
        "SELECT id, item_id, participant_id, share_type, share_with_participant_ids, \
             quantity_claimed, amount_owed_cents, created_at, updated_at \
         FROM claims \
         WHERE item_id IN (SELECT id FROM items WHERE bill_id = ?1) \
         ORDER BY created_at",
    )
    .bind(bill_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(tally_core::Claim::try_from).collect()
}

// =============================================================================
// Code Generation
// =============================================================================

/// Short, human-readable join code (6 hex chars, uppercased).
fn generate_bill_code() -> String {
    Uuid::new_v4().simple().to_string()[..6].to_uppercase()
}

/// Organizer management credential (full 32-char hex).
fn generate_access_code() -> String {
    Uuid::new_v4().simple().to_string()
}

// =============================================================================
// Validation
// =============================================================================

fn validate_new_bill(new_bill: &NewBill) -> Result<(), ValidationError> {
    if new_bill.organizer_phone.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "organizerPhone".to_string(),
        });
    }

    validate_price_cents(new_bill.tax_amount_cents)?;
    validate_price_cents(new_bill.tip_amount_cents)?;

    if new_bill.items.is_empty() {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        });
    }
    if new_bill.items.len() > MAX_BILL_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_BILL_ITEMS as i64,
        });
    }
    if new_bill.participants.is_empty() {
        return Err(ValidationError::Required {
            field: "participants".to_string(),
        });
    }

    for item in &new_bill.items {
        validate_name(&item.name, "item name")?;
        validate_price_cents(item.price_cents)?;
        validate_item_quantity(item.quantity)?;
    }

    for participant in &new_bill.participants {
        validate_name(&participant.name, "participant name")?;
        validate_plus_one_count(participant.plus_one_count)?;
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn demo_bill() -> NewBill {
        NewBill {
            organizer_phone: "+15550001111".to_string(),
            tax_amount_cents: 300,
            tip_amount_cents: 300,
            items: vec![
                NewItem {
                    name: "Nachos".to_string(),
                    price_cents: 3000,
                    quantity: 1,
                    source: ItemSource::Ocr,
                },
                NewItem {
                    name: "Beer".to_string(),
                    price_cents: 1500,
                    quantity: 3,
                    source: ItemSource::Manual,
                },
            ],
            participants: vec![
                NewParticipant {
                    name: "Ana".to_string(),
                    phone_number: Some("+15550002222".to_string()),
                    plus_one_count: 0,
                },
                NewParticipant {
                    name: "Ben".to_string(),
                    phone_number: None,
                    plus_one_count: 1,
                },
            ],
        }
    }

    #[tokio::test]
    async fn test_create_and_load_aggregate() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let created = db.bills().create(demo_bill()).await.unwrap();
        assert_eq!(created.bill.bill_code.len(), 6);
        assert_eq!(created.items.len(), 2);
        assert_eq!(created.items[0].display_order, 0);
        assert_eq!(created.items[1].display_order, 1);
        // Missing phone gets the placeholder
        assert!(created.participants[1]
            .phone_number
            .starts_with(&format!("UNSET-{}", created.bill.bill_code)));

        let by_code = db
            .bills()
            .get_aggregate(BillSelector::Code(created.bill.bill_code.clone()))
            .await
            .unwrap();
        assert_eq!(by_code.bill.id, created.bill.id);
        assert_eq!(by_code.items.len(), 2);
        assert_eq!(by_code.participants.len(), 2);
        assert!(by_code.claims.is_empty());

        let by_access = db
            .bills()
            .get_aggregate(BillSelector::AccessCode(
                created.bill.organizer_access_code.clone(),
            ))
            .await
            .unwrap();
        assert_eq!(by_access.bill.id, created.bill.id);
    }

    #[tokio::test]
    async fn test_missing_bill_is_not_found() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let err = db
            .bills()
            .get_aggregate(BillSelector::Code("ZZZZZZ".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_create_rejects_empty_items() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let mut bad = demo_bill();
        bad.items.clear();
        let err = db.bills().create(bad).await.unwrap_err();
        assert!(matches!(err, ServiceError::Domain(_)));
    }

    #[tokio::test]
    async fn test_create_rejects_negative_price() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let mut bad = demo_bill();
        bad.items[0].price_cents = -1;
        assert!(db.bills().create(bad).await.is_err());
    }
}
