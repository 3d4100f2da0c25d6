//! # Ready-Time Estimates
//!
//! Deterministic preparation-time estimates for online orders, computed when
//! an order is confirmed and sent to the customer in the confirmation
//! notification.
//!
//! ## Formula
//! ```text
//! minutes = 15                      (base preparation)
//!         + 30 if delivery          (packing + dispatch handoff)
//!         + ceil(items / 5) × 5     (5 minutes per started block of 5 items)
//! ```
//!
//! The formula must stay deterministic: the same order type and item count
//! always yield the same estimate, and tests pin the exact values.

use chrono::{DateTime, Duration, Utc};

use crate::types::OrderType;

/// Base preparation time applied to every order.
pub const BASE_PREP_MINUTES: i64 = 15;

/// Extra minutes for delivery orders.
pub const DELIVERY_EXTRA_MINUTES: i64 = 30;

/// Minutes added per started block of this many items.
const ITEMS_PER_BLOCK: i64 = 5;

/// Minutes added per item block.
const MINUTES_PER_BLOCK: i64 = 5;

/// Total preparation minutes for an order.
///
/// ## Example
/// ```rust
/// use agrivet_core::ready_time::prep_minutes;
/// use agrivet_core::types::OrderType;
///
/// assert_eq!(prep_minutes(OrderType::Pickup, 3), 20);
/// assert_eq!(prep_minutes(OrderType::Delivery, 12), 75);
/// ```
pub fn prep_minutes(order_type: OrderType, item_count: i64) -> i64 {
    let blocks = (item_count.max(0) + ITEMS_PER_BLOCK - 1) / ITEMS_PER_BLOCK;
    let mut minutes = BASE_PREP_MINUTES + blocks * MINUTES_PER_BLOCK;
    if order_type == OrderType::Delivery {
        minutes += DELIVERY_EXTRA_MINUTES;
    }
    minutes
}

/// Estimated ready timestamp: `now + prep_minutes`.
pub fn estimated_ready_at(
    now: DateTime<Utc>,
    order_type: OrderType,
    item_count: i64,
) -> DateTime<Utc> {
    now + Duration::minutes(prep_minutes(order_type, item_count))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pickup_three_items() {
        // 15 + ceil(3/5)*5 = 20
        assert_eq!(prep_minutes(OrderType::Pickup, 3), 20);
    }

    #[test]
    fn test_delivery_twelve_items() {
        // 15 + 30 + ceil(12/5)*5 = 75
        assert_eq!(prep_minutes(OrderType::Delivery, 12), 75);
    }

    #[test]
    fn test_block_boundaries() {
        assert_eq!(prep_minutes(OrderType::Pickup, 5), 20);
        assert_eq!(prep_minutes(OrderType::Pickup, 6), 25);
        assert_eq!(prep_minutes(OrderType::Pickup, 10), 25);
        assert_eq!(prep_minutes(OrderType::Pickup, 11), 30);
    }

    #[test]
    fn test_zero_items() {
        // Degenerate but defined: base time only
        assert_eq!(prep_minutes(OrderType::Pickup, 0), 15);
        assert_eq!(prep_minutes(OrderType::Delivery, 0), 45);
    }

    #[test]
    fn test_estimated_ready_at_is_offset() {
        let now = Utc::now();
        let eta = estimated_ready_at(now, OrderType::Delivery, 12);
        assert_eq!(eta - now, Duration::minutes(75));
    }
}
