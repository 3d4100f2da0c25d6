//! # Order Lifecycle Controller
//!
//! Drives online orders through their state machine.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Order Lifecycle                                 │
//! │                                                                         │
//! │  place ──► pending_confirmation ──confirm──► confirmed                 │
//! │                    │                │            │                      │
//! │                    │             (reserve)   mark_ready                 │
//! │                    │                │            ▼                      │
//! │                    └────cancel──────┘     ready_for_pickup              │
//! │                    (release holds)            │                         │
//! │                         │                  complete                     │
//! │                         ▼                (commit + fulfill              │
//! │                     cancelled             + decrement                   │
//! │                                           + aggregate)                  │
//! │                                               │                         │
//! │                                               ▼                         │
//! │                                           completed                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Completion settles through the same [`SaleCommitter`] as the cashier
//! checkout: one writer, one set of commit rules. Notifications are fire
//! and forget on every customer-visible transition.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use agrivet_core::ready_time::estimated_ready_at;
use agrivet_core::validation::validate_cancellation_reason;
use agrivet_core::{
    CoreError, OnlineOrder, OrderItem, OrderStatus, OrderType, PaymentMethod, TaxRate,
};
use agrivet_db::repository::order::{generate_order_id, generate_order_item_id, generate_order_number};
use agrivet_db::Database;

use crate::checkout::CheckoutConfig;
use crate::committer::{CommittedSale, SaleCommitter, SaleDraft, SaleLine};
use crate::context::ActorContext;
use crate::error::{CheckoutError, CheckoutResult};
use crate::notifier::{self, NotificationKind, Notifier};
use crate::reservation::{AvailabilityOutcome, ReservationManager};
use crate::session::SessionAggregator;
use crate::stock::{ItemDecrementResult, StockDecrementApplier};

// =============================================================================
// Requests / Outcomes
// =============================================================================

/// One requested line on a new order.
#[derive(Debug, Clone)]
pub struct OrderLineRequest {
    pub product_id: String,
    /// Units for discrete products, ignored when `weight_grams` is set.
    pub quantity: i64,
    /// Measured grams for weight-priced products.
    pub weight_grams: Option<i64>,
}

/// A new online order being placed.
#[derive(Debug, Clone)]
pub struct PlaceOrderRequest {
    pub customer_id: Option<String>,
    pub customer_phone: Option<String>,
    pub order_type: OrderType,
    pub lines: Vec<OrderLineRequest>,
}

/// How the customer settles at pickup / delivery.
#[derive(Debug, Clone)]
pub struct SettlementRequest {
    pub method: PaymentMethod,
    pub tendered_cents: Option<i64>,
    pub payment_reference: Option<String>,
}

/// Result of completing an order.
#[derive(Debug)]
pub struct CompletionOutcome {
    pub order: OnlineOrder,
    pub sale: CommittedSale,
    pub stock_results: Vec<ItemDecrementResult>,
}

// =============================================================================
// Controller
// =============================================================================

/// Orchestrates the online order state machine.
#[derive(Clone)]
pub struct OrderLifecycle {
    db: Database,
    config: CheckoutConfig,
    reservations: ReservationManager,
    committer: SaleCommitter,
    stock: StockDecrementApplier,
    sessions: SessionAggregator,
    notifier: Arc<dyn Notifier>,
}

impl OrderLifecycle {
    /// Creates a lifecycle controller over the given database and notifier.
    pub fn new(db: Database, config: CheckoutConfig, notifier: Arc<dyn Notifier>) -> Self {
        OrderLifecycle {
            reservations: ReservationManager::new(db.clone()),
            committer: SaleCommitter::new(db.clone()),
            stock: StockDecrementApplier::new(db.clone()),
            sessions: SessionAggregator::new(db.clone()),
            db,
            config,
            notifier,
        }
    }

    /// Places a new order in `pending_confirmation`.
    ///
    /// Prices and snapshots every line from the live catalog; totals use
    /// the configured VAT rate. No stock is held until confirmation.
    pub async fn place(
        &self,
        request: PlaceOrderRequest,
        ctx: &ActorContext,
    ) -> CheckoutResult<OnlineOrder> {
        if request.lines.is_empty() {
            return Err(CoreError::EmptyCart.into());
        }

        let products = self.db.products();
        let now = Utc::now();
        let order_id = generate_order_id();

        let mut items = Vec::with_capacity(request.lines.len());
        let mut subtotal_cents = 0;

        for line in &request.lines {
            let product = products
                .get_by_id(&line.product_id)
                .await?
                .ok_or_else(|| CoreError::ProductNotFound(line.product_id.clone()))?;

            let price = product.price();
            let (quantity, line_total_cents) = match line.weight_grams {
                Some(grams) => (1, price.multiply_weight_grams(grams).cents()),
                None => (line.quantity, price.multiply_quantity(line.quantity).cents()),
            };

            subtotal_cents += line_total_cents;
            items.push(OrderItem {
                id: generate_order_item_id(),
                order_id: order_id.clone(),
                product_id: product.id.clone(),
                sku_snapshot: product.sku.clone(),
                name_snapshot: product.name.clone(),
                unit_snapshot: product.unit.clone(),
                unit_price_cents: product.price_cents,
                quantity,
                weight_grams: line.weight_grams,
                line_total_cents,
                created_at: now,
            });
        }

        let rate: TaxRate = self.config.tax_rate();
        let tax_cents = agrivet_core::Money::from_cents(subtotal_cents)
            .calculate_tax(rate)
            .cents();

        let order = OnlineOrder {
            id: order_id,
            order_number: generate_order_number(),
            customer_id: request.customer_id,
            customer_phone: request.customer_phone,
            branch_id: ctx.branch_id.clone(),
            order_type: request.order_type,
            status: OrderStatus::PendingConfirmation,
            subtotal_cents,
            tax_cents,
            total_cents: subtotal_cents + tax_cents,
            estimated_ready_at: None,
            confirmed_at: None,
            confirmed_by: None,
            ready_at: None,
            ready_by: None,
            completed_at: None,
            completed_by: None,
            cancelled_at: None,
            cancelled_by: None,
            cancellation_reason: None,
            pos_transaction_id: None,
            created_at: now,
            updated_at: now,
        };

        self.db.orders().insert_order(&order, &items).await?;

        info!(
            order_number = %order.order_number,
            total_cents = order.total_cents,
            order_type = ?order.order_type,
            "Order placed"
        );

        Ok(order)
    }

    /// Confirms a pending order: checks availability, reserves stock,
    /// stamps the ready-time estimate, and notifies the customer.
    ///
    /// An availability check that cannot reach storage degrades to a
    /// warn-and-proceed; an authoritative shortfall blocks confirmation
    /// with the per-item list.
    pub async fn confirm(&self, order_id: &str, ctx: &ActorContext) -> CheckoutResult<OnlineOrder> {
        let orders = self.db.orders();
        let order = self.load(order_id).await?;
        self.ensure_status(&order, OrderStatus::PendingConfirmation, "confirm")?;

        let items = orders.get_items(order_id).await?;

        match self
            .reservations
            .check_availability(&items, &ctx.branch_id)
            .await
        {
            AvailabilityOutcome::Checked(report) if !report.all_available() => {
                return Err(CheckoutError::InsufficientInventory {
                    missing: report.missing_items,
                });
            }
            AvailabilityOutcome::Checked(_) => {}
            AvailabilityOutcome::Unverified => {
                warn!(
                    order_id = %order_id,
                    "Confirming without an availability check (storage degraded)"
                );
            }
        }

        let item_count: i64 = items.iter().map(discrete_count).sum();
        let ready_at = estimated_ready_at(Utc::now(), order.order_type, item_count);

        let results = self.reservations.reserve(order_id, &items, ctx).await;
        for r in results.iter().filter(|r| r.result.is_err()) {
            warn!(
                order_id = %order_id,
                product_id = %r.product_id,
                "Hold not placed for item, proceeding"
            );
        }

        orders.set_confirmed(order_id, &ctx.actor_id, ready_at).await?;
        let order = self.load(order_id).await?;

        notifier::send_best_effort(
            self.notifier.as_ref(),
            notifier::build(
                NotificationKind::Confirmation,
                &order,
                notifier::confirmation_message(&order, ready_at),
            ),
        )
        .await;

        Ok(order)
    }

    /// Cancels an order with a reason, releasing any holds.
    ///
    /// Allowed from `pending_confirmation` and `confirmed` only.
    pub async fn cancel(
        &self,
        order_id: &str,
        reason: &str,
        ctx: &ActorContext,
    ) -> CheckoutResult<OnlineOrder> {
        validate_cancellation_reason(reason).map_err(CoreError::from)?;

        let order = self.load(order_id).await?;
        if !order.status.can_cancel() {
            return Err(CoreError::InvalidOrderStatus {
                order_id: order_id.to_string(),
                current: format!("{:?}", order.status),
                attempted: "cancel".to_string(),
            }
            .into());
        }

        self.db
            .orders()
            .set_cancelled(order_id, &ctx.actor_id, reason)
            .await?;
        self.reservations.release(order_id, ctx).await?;

        let order = self.load(order_id).await?;

        notifier::send_best_effort(
            self.notifier.as_ref(),
            notifier::build(
                NotificationKind::Cancellation,
                &order,
                notifier::cancellation_message(&order, reason),
            ),
        )
        .await;

        Ok(order)
    }

    /// Marks a confirmed order ready for pickup and notifies the customer.
    pub async fn mark_ready(&self, order_id: &str, ctx: &ActorContext) -> CheckoutResult<OnlineOrder> {
        let order = self.load(order_id).await?;
        self.ensure_status(&order, OrderStatus::Confirmed, "mark ready")?;

        self.db.orders().set_ready(order_id, &ctx.actor_id).await?;
        let order = self.load(order_id).await?;

        notifier::send_best_effort(
            self.notifier.as_ref(),
            notifier::build(
                NotificationKind::Ready,
                &order,
                notifier::ready_message(&order),
            ),
        )
        .await;

        Ok(order)
    }

    /// Completes a ready order: settles it through the shared sale
    /// committer, fulfills the holds, decrements stock, and folds the
    /// totals into the acting cashier's session.
    pub async fn complete(
        &self,
        order_id: &str,
        settlement: SettlementRequest,
        ctx: &ActorContext,
    ) -> CheckoutResult<CompletionOutcome> {
        let orders = self.db.orders();
        let order = self.load(order_id).await?;
        self.ensure_status(&order, OrderStatus::ReadyForPickup, "complete")?;

        let items = orders.get_items(order_id).await?;
        let session = self.sessions.find_or_open(ctx).await?;

        let draft = SaleDraft {
            session_id: session.id.clone(),
            customer_id: order.customer_id.clone(),
            lines: items
                .iter()
                .map(|item| SaleLine {
                    product_id: item.product_id.clone(),
                    sku: item.sku_snapshot.clone(),
                    name: item.name_snapshot.clone(),
                    unit: item.unit_snapshot.clone(),
                    unit_price_cents: item.unit_price_cents,
                    quantity: item.quantity,
                    weight_grams: item.weight_grams,
                    discount_cents: 0,
                    line_total_cents: item.line_total_cents,
                })
                .collect(),
            subtotal_cents: order.subtotal_cents,
            discount_cents: 0,
            tax_cents: order.tax_cents,
            total_cents: order.total_cents,
            method: settlement.method,
            tendered_cents: settlement.tendered_cents,
            payment_reference: settlement.payment_reference,
        };

        let sale = self.committer.commit(draft, ctx).await?;

        // The sale is durable; the remaining steps report, never unwind
        self.reservations.fulfill(order_id, ctx).await?;
        let stock_results = self
            .stock
            .apply(&sale.items, &sale.transaction.id, ctx)
            .await;

        if let Err(e) = self
            .sessions
            .accumulate(&session.id, order.total_cents, order.tax_cents)
            .await
        {
            warn!(
                session_id = %session.id,
                order_id = %order_id,
                error = %e,
                "Session accumulation failed after commit"
            );
        }

        orders
            .set_completed(order_id, &ctx.actor_id, &sale.transaction.id)
            .await?;
        let order = self.load(order_id).await?;

        info!(
            order_number = %order.order_number,
            transaction_number = %sale.transaction.transaction_number,
            "Order completed"
        );

        Ok(CompletionOutcome {
            order,
            sale,
            stock_results,
        })
    }

    async fn load(&self, order_id: &str) -> CheckoutResult<OnlineOrder> {
        self.db
            .orders()
            .get_by_id(order_id)
            .await?
            .ok_or_else(|| agrivet_db::DbError::not_found("Order", order_id).into())
    }

    fn ensure_status(
        &self,
        order: &OnlineOrder,
        expected: OrderStatus,
        attempted: &str,
    ) -> CheckoutResult<()> {
        if order.status != expected {
            return Err(CoreError::InvalidOrderStatus {
                order_id: order.id.clone(),
                current: format!("{:?}", order.status),
                attempted: attempted.to_string(),
            }
            .into());
        }
        Ok(())
    }
}

/// Discrete item count for prep-time estimates: weight lines count once.
fn discrete_count(item: &OrderItem) -> i64 {
    if item.weight_grams.is_some() {
        1
    } else {
        item.quantity
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifier::LogNotifier;
    use agrivet_core::Product;
    use agrivet_db::DbConfig;

    async fn seed_product(db: &Database, sku: &str, price_cents: i64, on_hand: i64) -> Product {
        let now = Utc::now();
        let product = Product {
            id: uuid::Uuid::new_v4().to_string(),
            sku: sku.to_string(),
            barcode: None,
            name: format!("Product {sku}"),
            description: None,
            unit: "piece".to_string(),
            price_cents,
            weight_priced: false,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.products().insert(&product).await.unwrap();
        db.inventory()
            .upsert_record(&product.id, "b1", on_hand, 0)
            .await
            .unwrap();
        product
    }

    fn lifecycle(db: &Database) -> OrderLifecycle {
        OrderLifecycle::new(db.clone(), CheckoutConfig::default(), Arc::new(LogNotifier))
    }

    #[tokio::test]
    async fn test_place_snapshots_and_totals() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let lc = lifecycle(&db);
        let ctx = ActorContext::new("staff-1", "b1");

        let product = seed_product(&db, "DEWORM-10", 10000, 10).await;
        let order = lc
            .place(
                PlaceOrderRequest {
                    customer_id: None,
                    customer_phone: Some("+639171234567".into()),
                    order_type: OrderType::Pickup,
                    lines: vec![OrderLineRequest {
                        product_id: product.id.clone(),
                        quantity: 2,
                        weight_grams: None,
                    }],
                },
                &ctx,
            )
            .await
            .unwrap();

        assert_eq!(order.status, OrderStatus::PendingConfirmation);
        assert_eq!(order.subtotal_cents, 20000);
        assert_eq!(order.tax_cents, 2400);
        assert_eq!(order.total_cents, 22400);
        assert!(order.order_number.starts_with("ORD-"));

        let items = db.orders().get_items(&order.id).await.unwrap();
        assert_eq!(items[0].sku_snapshot, "DEWORM-10");
    }

    #[tokio::test]
    async fn test_confirm_reserves_and_estimates() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let lc = lifecycle(&db);
        let ctx = ActorContext::new("staff-1", "b1");

        let product = seed_product(&db, "FEED-50", 5000, 10).await;
        let order = lc
            .place(
                PlaceOrderRequest {
                    customer_id: None,
                    customer_phone: None,
                    order_type: OrderType::Pickup,
                    lines: vec![OrderLineRequest {
                        product_id: product.id.clone(),
                        quantity: 3,
                        weight_grams: None,
                    }],
                },
                &ctx,
            )
            .await
            .unwrap();

        let before = Utc::now();
        let confirmed = lc.confirm(&order.id, &ctx).await.unwrap();
        assert_eq!(confirmed.status, OrderStatus::Confirmed);

        // 3 items pickup: 15 base + 5 = 20 minutes out
        let eta = confirmed.estimated_ready_at.unwrap();
        let minutes = (eta - before).num_minutes();
        assert!((19..=20).contains(&minutes), "eta was {minutes} minutes out");

        let record = db
            .inventory()
            .get_record(&product.id, "b1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.quantity_reserved, 3);
    }

    #[tokio::test]
    async fn test_confirm_blocked_by_shortfall() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let lc = lifecycle(&db);
        let ctx = ActorContext::new("staff-1", "b1");

        let product = seed_product(&db, "VITAMIN-B", 5000, 2).await;
        let order = lc
            .place(
                PlaceOrderRequest {
                    customer_id: None,
                    customer_phone: None,
                    order_type: OrderType::Pickup,
                    lines: vec![OrderLineRequest {
                        product_id: product.id.clone(),
                        quantity: 5,
                        weight_grams: None,
                    }],
                },
                &ctx,
            )
            .await
            .unwrap();

        let err = lc.confirm(&order.id, &ctx).await.unwrap_err();
        match err {
            CheckoutError::InsufficientInventory { missing } => {
                assert_eq!(missing.len(), 1);
                assert_eq!(missing[0].available, 2);
                assert_eq!(missing[0].requested, 5);
            }
            other => panic!("unexpected error: {other}"),
        }

        // Order still pending, nothing held
        let stored = db.orders().get_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::PendingConfirmation);
        let record = db
            .inventory()
            .get_record(&product.id, "b1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.quantity_reserved, 0);
    }

    #[tokio::test]
    async fn test_cancel_rules() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let lc = lifecycle(&db);
        let ctx = ActorContext::new("staff-1", "b1");

        let product = seed_product(&db, "FEED-50", 5000, 10).await;
        let order = lc
            .place(
                PlaceOrderRequest {
                    customer_id: None,
                    customer_phone: None,
                    order_type: OrderType::Pickup,
                    lines: vec![OrderLineRequest {
                        product_id: product.id.clone(),
                        quantity: 2,
                        weight_grams: None,
                    }],
                },
                &ctx,
            )
            .await
            .unwrap();
        lc.confirm(&order.id, &ctx).await.unwrap();
        lc.mark_ready(&order.id, &ctx).await.unwrap();

        // Too late to cancel once ready
        let err = lc.cancel(&order.id, "changed my mind", &ctx).await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Core(CoreError::InvalidOrderStatus { .. })
        ));

        // Empty reason rejected up front
        let order2 = lc
            .place(
                PlaceOrderRequest {
                    customer_id: None,
                    customer_phone: None,
                    order_type: OrderType::Pickup,
                    lines: vec![OrderLineRequest {
                        product_id: product.id.clone(),
                        quantity: 1,
                        weight_grams: None,
                    }],
                },
                &ctx,
            )
            .await
            .unwrap();
        assert!(lc.cancel(&order2.id, "  ", &ctx).await.is_err());
    }
}
