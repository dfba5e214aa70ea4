//! # Repository Module
//!
//! Database repository implementations for Tally.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  Caller                                                                 │
//! │       │                                                                 │
//! │       │  db.bills().get_aggregate(BillSelector::Code("AB12CD"))        │
//! │       │  ↓                                                              │
//! │       ▼                                                                 │
//! │  BillRepository                                                        │
//! │  ├── create(&self, new_bill)                                           │
//! │  ├── get_by_id(&self, id)                                              │
//! │  ├── get_by_code(&self, code)                                          │
//! │  └── get_aggregate(&self, selector)                                    │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Benefits:                                                              │
//! │  • Clean separation of concerns                                        │
//! │  • SQL is isolated in one place                                        │
//! │  • The claim service reuses the same queries inside transactions       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`bill::BillRepository`] - Bill creation and aggregate loads
//! - [`item::ItemRepository`] - Item lookups
//! - [`participant::ParticipantRepository`] - Participant lookups
//! - [`claim::ClaimRepository`] - Claim row queries
//!
//! Each module also exposes crate-private, executor-generic query helpers
//! so the claim service can run the same SQL inside its transaction.

pub mod bill;
pub mod claim;
pub mod item;
pub mod participant;
