//! # tally-core: Pure Business Logic for Tally
//!
//! This crate is the **heart** of Tally, a bill-splitting application.
//! It contains all business logic as pure functions with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Tally Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Web Frontend (Next.js)                       │   │
//! │  │    Create Bill ──► Claim Items ──► Review Split                 │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ HTTP routes                            │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tally-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌────────────┐  ┌───────────┐ │   │
//! │  │   │   types   │  │   money   │  │ allocation │  │settlement │ │   │
//! │  │   │   Bill    │  │   Money   │  │  engine    │  │  splits   │ │   │
//! │  │   │   Claim   │  │  rounding │  │            │  │           │ │   │
//! │  │   └───────────┘  └───────────┘  └────────────┘  └───────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    tally-db (Database Layer)                    │   │
//! │  │        SQLite repositories + transactional claim service        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Bill, Item, Participant, Claim, etc.)
//! - [`money`] - Money type with integer-cent arithmetic and the one
//!   rounding rule used everywhere
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation and claim-request normalization
//! - [`allocation`] - The per-item allocation engine
//! - [`settlement`] - Bill-level per-participant projections
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64); fractional
//!    values exist only transiently inside allocation math
//! 4. **Explicit Errors**: All errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod allocation;
pub mod error;
pub mod money;
pub mod settlement;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use tally_core::Money` instead of
// `use tally_core::money::Money`

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum length for item and participant names.
pub const MAX_NAME_LEN: usize = 200;

/// Maximum number of items on a single bill.
///
/// ## Business Reason
/// A restaurant receipt with more lines than this is almost certainly an
/// OCR failure rather than a real bill.
pub const MAX_BILL_ITEMS: usize = 100;

/// Maximum quantity for a single item line.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Maximum number of additional guests ("+1"s) one participant may bring.
pub const MAX_PLUS_ONE_COUNT: i64 = 20;
