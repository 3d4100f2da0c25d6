//! # Error Types
//!
//! Domain-specific error types for agrivet-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  agrivet-core errors (this file)                                       │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  agrivet-db errors                                                     │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  agrivet-checkout errors                                               │
//! │  └── CheckoutError    - Workflow failures (wraps the above)            │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → CheckoutError → caller            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (SKU, ID, amounts)
//! 3. Errors are enum variants, never String
//! 4. Nothing here is process-fatal; every failure returns to its caller

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be found.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Insufficient stock to complete a sale or confirm an order.
    ///
    /// ## User Workflow
    /// ```text
    /// Confirm order (qty: 5)
    ///      │
    ///      ▼
    /// Check availability: available=3
    ///      │
    ///      ▼
    /// InsufficientStock { sku: "FEED-50", available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// UI shows the structured missing-items list, not a generic error
    /// ```
    #[error("Insufficient stock for {sku}: available {available}, requested {requested}")]
    InsufficientStock {
        sku: String,
        available: i64,
        requested: i64,
    },

    /// Checkout attempted with an empty cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// Cash tendered does not cover the total.
    #[error("Insufficient payment: total {required_cents} centavos, tendered {tendered_cents}")]
    InsufficientPayment {
        required_cents: i64,
        tendered_cents: i64,
    },

    /// Order is not in a state that allows the requested transition.
    ///
    /// ## When This Occurs
    /// - Confirming an already-confirmed order
    /// - Cancelling a completed order
    /// - Completing an order that is not ready for pickup
    #[error("Order {order_id} is {current}, cannot {attempted}")]
    InvalidOrderStatus {
        order_id: String,
        current: String,
        attempted: String,
    },

    /// Session is not in a state that allows the requested operation.
    #[error("Session {session_id} is {current}, cannot {attempted}")]
    InvalidSessionStatus {
        session_id: String,
        current: String,
        attempted: String,
    },

    /// Transaction is not in a state that allows the requested operation.
    #[error("Transaction {transaction_id} is {current}, cannot {attempted}")]
    InvalidTransactionStatus {
        transaction_id: String,
        current: String,
        attempted: String,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when input doesn't meet requirements and are surfaced
/// immediately to the caller — no retry, no compensation.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
