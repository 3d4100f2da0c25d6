//! # agrivet-core: Pure Business Logic for AgriVet POS
//!
//! This crate is the **heart** of the AgriVet POS commit workflow. It contains
//! all business logic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      AgriVet POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                agrivet-checkout (Workflow)                      │   │
//! │  │   reserve → commit sale → decrement stock → aggregate session   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ agrivet-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │  ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌────────────────────┐ │   │
//! │  │  │  types   │ │  money   │ │   cart   │ │     ready_time     │ │   │
//! │  │  │ Order    │ │  Money   │ │  Cart    │ │  prep estimates    │ │   │
//! │  │  │ Session  │ │ VAT math │ │ CartLine │ │  (deterministic)   │ │   │
//! │  │  └──────────┘ └──────────┘ └──────────┘ └────────────────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  agrivet-db (Database Layer)                    │   │
//! │  │            SQLite queries, migrations, repositories             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Transaction, Order, Session, Inventory, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`cart`] - Ephemeral cart with unit and weight-based pricing
//! - [`ready_time`] - Deterministic order-preparation estimates
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in centavos (i64)
//! 4. **Explicit Errors**: All errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod money;
pub mod ready_time;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartLine, LineQuantity};
pub use error::{CoreError, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default VAT rate in basis points (1200 = 12%).
///
/// ## Why a constant?
/// Philippine VAT applies uniformly across branches today. The checkout
/// configuration can override it per deployment without touching core math.
pub const DEFAULT_VAT_BPS: u32 = 1200;

/// Maximum line entries allowed in a single cart.
///
/// ## Business Reason
/// Prevents runaway carts and ensures reasonable transaction sizes.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity of a single discrete item in a cart line.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_LINE_QUANTITY: i64 = 999;

/// Maximum weight (in grams) of a single weight-priced cart line: 500 kg.
pub const MAX_LINE_WEIGHT_GRAMS: i64 = 500_000;

/// How long an inventory reservation stays active before it expires.
///
/// Expiry is persisted on the reservation row; sweeping expired rows is the
/// job of an external reaper, not this workspace.
pub const RESERVATION_TTL_HOURS: i64 = 24;
