//! # Stock Decrement Applier
//!
//! Applies on-hand decrements after a sale commits.
//!
//! ## Clamp and Continue
//! The sale is already committed and paid by the time this runs. A line
//! whose decrement would go negative clamps at zero, a line whose update
//! fails outright is recorded and the rest still apply. The per-item
//! result list lets the caller report discrepancies without unwinding
//! the sale.

use tracing::{debug, warn};

use agrivet_core::TransactionItem;
use agrivet_db::{Database, DbError, DecrementOutcome};

use crate::context::ActorContext;

/// Outcome of one line's stock decrement.
#[derive(Debug)]
pub struct ItemDecrementResult {
    pub product_id: String,
    pub sku: String,
    pub result: Result<DecrementOutcome, DbError>,
}

impl ItemDecrementResult {
    /// True when the decrement applied in full without clamping.
    pub fn applied_cleanly(&self) -> bool {
        matches!(&self.result, Ok(outcome) if !outcome.clamped)
    }
}

/// Applies stock decrements for committed sale lines.
#[derive(Clone)]
pub struct StockDecrementApplier {
    db: Database,
}

impl StockDecrementApplier {
    /// Creates a new StockDecrementApplier.
    pub fn new(db: Database) -> Self {
        StockDecrementApplier { db }
    }

    /// Decrements on-hand stock for every item of a committed transaction.
    ///
    /// Weight-priced lines decrement grams, discrete lines decrement units.
    pub async fn apply(
        &self,
        items: &[TransactionItem],
        reference_id: &str,
        ctx: &ActorContext,
    ) -> Vec<ItemDecrementResult> {
        let inventory = self.db.inventory();
        let mut results = Vec::with_capacity(items.len());

        for item in items {
            let result = inventory
                .decrement_on_hand(
                    &item.product_id,
                    &ctx.branch_id,
                    item.stock_delta(),
                    reference_id,
                    &ctx.actor_id,
                )
                .await;

            match &result {
                Ok(outcome) if outcome.clamped => {
                    warn!(
                        sku = %item.sku_snapshot,
                        previous = outcome.previous_on_hand,
                        requested = item.stock_delta(),
                        "Stock decrement clamped"
                    );
                }
                Ok(outcome) => {
                    debug!(
                        sku = %item.sku_snapshot,
                        new_on_hand = outcome.new_on_hand,
                        "Stock decremented"
                    );
                }
                Err(e) => {
                    warn!(
                        sku = %item.sku_snapshot,
                        error = %e,
                        "Stock decrement failed, continuing with remaining items"
                    );
                }
            }

            results.push(ItemDecrementResult {
                product_id: item.product_id.clone(),
                sku: item.sku_snapshot.clone(),
                result,
            });
        }

        results
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
