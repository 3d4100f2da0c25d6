//! # Reservation Manager
//!
//! Availability checks and soft holds for online orders.
//!
//! ## Degraded Mode
//! An availability check that cannot reach storage returns
//! [`AvailabilityOutcome::Unverified`] instead of an error. Confirmation is
//! a staff decision; the check informs it but an infrastructure hiccup must
//! not block the counter. Reservation placement is likewise best effort:
//! each item reports its own outcome and a partial result is returned
//! rather than unwinding holds that already landed.

use chrono::{Duration, Utc};
use tracing::{debug, warn};

use agrivet_core::{InventoryReservation, OrderItem, RESERVATION_TTL_HOURS};
use agrivet_db::{Database, DbResult};

use crate::context::ActorContext;
use crate::error::MissingItem;

/// Availability of every line on an order.
#[derive(Debug, Clone)]
pub struct AvailabilityReport {
    /// Items the branch cannot cover. Empty means fully available.
    pub missing_items: Vec<MissingItem>,
}

impl AvailabilityReport {
    /// True when every item can be covered from available stock.
    pub fn all_available(&self) -> bool {
        self.missing_items.is_empty()
    }
}

/// Result of an availability check.
#[derive(Debug, Clone)]
pub enum AvailabilityOutcome {
    /// Storage answered; the report is authoritative for this instant.
    Checked(AvailabilityReport),
    /// Storage could not be reached; availability is unknown.
    Unverified,
}

/// Outcome of placing one reservation.
#[derive(Debug)]
pub struct ItemReservationResult {
    pub product_id: String,
    pub result: DbResult<InventoryReservation>,
}

/// Manages inventory holds for the order lifecycle.
#[derive(Clone)]
pub struct ReservationManager {
    db: Database,
}

impl ReservationManager {
    /// Creates a new ReservationManager.
    pub fn new(db: Database) -> Self {
        ReservationManager { db }
    }

    /// Checks whether every order item can be covered by available stock
    /// at the branch.
    ///
    /// Availability compares against `quantity_available` (on hand minus
    /// existing holds), so double-booking against other confirmed orders
    /// is visible here. A missing stock record counts as zero available.
    pub async fn check_availability(
        &self,
        items: &[OrderItem],
        branch_id: &str,
    ) -> AvailabilityOutcome {
        let inventory = self.db.inventory();
        let mut missing = Vec::new();

        for item in items {
            let record = match inventory.get_record(&item.product_id, branch_id).await {
                Ok(record) => record,
                Err(e) => {
                    warn!(
                        product_id = %item.product_id,
                        error = %e,
                        "Availability check degraded, storage unreachable"
                    );
                    return AvailabilityOutcome::Unverified;
                }
            };

            let available = record.map(|r| r.quantity_available).unwrap_or(0);
            let requested = item.stock_delta();
            if available < requested {
                missing.push(MissingItem {
                    product_id: item.product_id.clone(),
                    sku: item.sku_snapshot.clone(),
                    name: item.name_snapshot.clone(),
                    requested,
                    available,
                });
            }
        }

        debug!(
            items = items.len(),
            missing = missing.len(),
            "Availability checked"
        );

        AvailabilityOutcome::Checked(AvailabilityReport {
            missing_items: missing,
        })
    }

    /// Places a hold for every order item, each expiring after the
    /// reservation TTL.
    ///
    /// Best effort per item: a failure on one line is recorded in its
    /// result and the remaining lines still get their holds. Holds that
    /// landed stay placed; cancellation releases them later.
    pub async fn reserve(
        &self,
        order_id: &str,
        items: &[OrderItem],
        ctx: &ActorContext,
    ) -> Vec<ItemReservationResult> {
        let inventory = self.db.inventory();
        let expires_at = Utc::now() + Duration::hours(RESERVATION_TTL_HOURS);
        let mut results = Vec::with_capacity(items.len());

        for item in items {
            let result = inventory
                .reserve_item(
                    order_id,
                    &item.product_id,
                    &ctx.branch_id,
                    item.stock_delta(),
                    expires_at,
                    &ctx.actor_id,
                )
                .await;

            if let Err(e) = &result {
                warn!(
                    order_id = %order_id,
                    product_id = %item.product_id,
                    error = %e,
                    "Reservation failed for item"
                );
            }

            results.push(ItemReservationResult {
                product_id: item.product_id.clone(),
                result,
            });
        }

        results
    }

    /// Releases all active holds on an order (cancellation / expiry path).
    pub async fn release(
        &self,
        order_id: &str,
        ctx: &ActorContext,
    ) -> DbResult<Vec<InventoryReservation>> {
        self.db
            .inventory()
            .release_for_order(order_id, &ctx.actor_id)
            .await
    }

    /// Consumes all active holds on an order (completion path).
    pub async fn fulfill(
        &self,
        order_id: &str,
        ctx: &ActorContext,
    ) -> DbResult<Vec<InventoryReservation>> {
        self.db
            .inventory()
            .fulfill_for_order(order_id, &ctx.actor_id)
            .await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
