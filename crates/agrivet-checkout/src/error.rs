//! # Workflow Error Types
//!
//! Errors surfaced by the checkout and fulfillment services. Wraps the core
//! and database layers; adds the structured insufficient-inventory shape so
//! callers can render a per-item list instead of a generic failure.

use thiserror::Error;

use agrivet_core::CoreError;
use agrivet_db::DbError;

/// One item the branch cannot cover, as shown to staff on confirmation.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct MissingItem {
    pub product_id: String,
    pub sku: String,
    pub name: String,
    pub requested: i64,
    pub available: i64,
}

/// Checkout and fulfillment workflow errors.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Business rule violation from the core layer.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Storage failure from the database layer.
    #[error(transparent)]
    Db(#[from] DbError),

    /// Confirmation blocked: one or more items cannot be covered.
    ///
    /// Carries the full per-item shortfall list, not just the first.
    #[error("Insufficient inventory for {} item(s)", missing.len())]
    InsufficientInventory { missing: Vec<MissingItem> },
}

/// Convenience type alias for workflow results.
pub type CheckoutResult<T> = Result<T, CheckoutError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_inventory_message_counts_items() {
        let err = CheckoutError::InsufficientInventory {
            missing: vec![
                MissingItem {
                    product_id: "p1".into(),
                    sku: "FEED-50".into(),
                    name: "Hog Grower Feed".into(),
                    requested: 5,
                    available: 3,
                },
                MissingItem {
                    product_id: "p2".into(),
                    sku: "DEWORM-10".into(),
                    name: "Dewormer".into(),
                    requested: 2,
                    available: 0,
                },
            ],
        };
        assert_eq!(err.to_string(), "Insufficient inventory for 2 item(s)");
    }

    #[test]
    fn test_core_error_passes_through() {
        let err: CheckoutError = CoreError::EmptyCart.into();
        assert_eq!(err.to_string(), "Cart is empty");
    }
}
