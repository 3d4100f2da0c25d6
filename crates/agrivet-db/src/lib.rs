//! # agrivet-db: Database Layer for AgriVet POS
//!
//! This crate provides database access for the AgriVet POS commit workflow.
//! It uses SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      AgriVet POS Data Flow                              │
//! │                                                                         │
//! │  agrivet-checkout (workflow services)                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    agrivet-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐   ┌────────────────┐   ┌──────────────┐   │   │
//! │  │   │   Database    │   │  Repositories  │   │  Migrations  │   │   │
//! │  │   │   (pool.rs)   │   │ transaction    │   │  (embedded)  │   │   │
//! │  │   │               │   │ inventory      │   │              │   │   │
//! │  │   │ SqlitePool    │◄──│ session        │   │ 001_init.sql │   │   │
//! │  │   │ Management    │   │ order, product │   │              │   │   │
//! │  │   └───────────────┘   └────────────────┘   └──────────────┘   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (one per branch terminal)                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Query Style
//!
//! Queries use sqlx's runtime `query`/`query_as` API with `FromRow` derives
//! rather than the compile-time `query!` macros, so the crate builds without
//! a prepared database. Multi-row writes that must be atomic (transaction
//! commit, reservation movements, status transitions) run inside a single
//! `pool.begin()` unit of work.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::inventory::{DecrementOutcome, InventoryRepository};
pub use repository::order::OrderRepository;
pub use repository::product::ProductRepository;
pub use repository::session::SessionRepository;
pub use repository::transaction::TransactionRepository;
