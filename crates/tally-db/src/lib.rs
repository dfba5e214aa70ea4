//! # tally-db: Database Layer for Tally
//!
//! This crate provides database access for Tally, a bill-splitting
//! application. It uses SQLite for local storage with sqlx for async
//! operations, and hosts the transactional claim mutation service.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Tally Data Flow                                 │
//! │                                                                         │
//! │  Caller (HTTP route, CLI, test)                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     tally-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │ ClaimService │  │   │
//! │  │   │   (pool.rs)   │    │  (bill, item, │    │ (service.rs) │  │   │
//! │  │   │               │    │   participant,│    │              │  │   │
//! │  │   │ SqlitePool    │◄───│   claim)      │◄───│ tx + mutex   │  │   │
//! │  │   │ + migrations  │    │               │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                              │ pure math                        │
//! │       ▼                              ▼                                  │
//! │  SQLite Database              tally-core (allocation engine)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (bill, item, participant, claim)
//! - [`service`] - The transactional claim mutation service
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tally_db::{Database, DbConfig};
//! use tally_db::repository::bill::BillSelector;
//!
//! let db = Database::new(DbConfig::new("path/to/tally.db")).await?;
//!
//! // Reads go through repositories
//! let aggregate = db.bills().get_aggregate(BillSelector::Code("AB12CD".into())).await?;
//!
//! // Claim writes go through the service
//! let outcome = db.claim_service().submit(&submission).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod service;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use service::{ClaimService, ServiceError, ServiceResult};

// Repository re-exports for convenience
pub use repository::bill::{BillRepository, BillSelector, NewBill, NewItem, NewParticipant};
pub use repository::claim::{ClaimRepository, ClaimWithItem};
pub use repository::item::ItemRepository;
pub use repository::participant::ParticipantRepository;
