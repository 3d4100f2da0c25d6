//! # Checkout Service
//!
//! The cashier's commit pipeline: cart in, committed sale out.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           CheckoutService                               │
//! │                                                                         │
//! │   Cart ──► validate ──► totals (VAT) ──► find/open session             │
//! │                                              │                          │
//! │                                              ▼                          │
//! │                                       commit sale (atomic)              │
//! │                                              │                          │
//! │                          ┌───────────────────┼────────────────────┐     │
//! │                          ▼                   ▼                    │     │
//! │                   decrement stock     accumulate session          │     │
//! │                   (clamp+continue)    (additive update)           │     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The commit is the point of no return: once the transaction lands, the
//! stock and session steps report problems instead of unwinding the sale.

use tracing::{info, warn};

use agrivet_core::{Cart, CoreError, PaymentMethod, TaxRate, DEFAULT_VAT_BPS};
use agrivet_db::Database;

use crate::committer::{CommittedSale, SaleCommitter, SaleDraft, SaleLine};
use crate::context::ActorContext;
use crate::error::CheckoutResult;
use crate::session::SessionAggregator;
use crate::stock::{ItemDecrementResult, StockDecrementApplier};

// =============================================================================
// Configuration
// =============================================================================

/// Per-deployment checkout configuration.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// VAT rate in basis points applied to the discounted subtotal.
    pub vat_bps: u32,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        CheckoutConfig {
            vat_bps: DEFAULT_VAT_BPS,
        }
    }
}

impl CheckoutConfig {
    /// The configured VAT as a TaxRate.
    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.vat_bps)
    }
}

// =============================================================================
// Request / Outcome
// =============================================================================

/// A cashier's checkout request.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub cart: Cart,
    pub customer_id: Option<String>,
    pub method: PaymentMethod,
    /// For cash: amount handed over by the customer.
    pub tendered_cents: Option<i64>,
    /// External payment reference for card / wallet tenders.
    pub payment_reference: Option<String>,
}

/// The result handed back to the register after a successful checkout.
#[derive(Debug)]
pub struct CheckoutOutcome {
    pub sale: CommittedSale,
    pub session_id: String,
    /// Per-line stock results; clamped or failed lines are discrepancies
    /// to surface, not checkout failures.
    pub stock_results: Vec<ItemDecrementResult>,
}

impl CheckoutOutcome {
    /// Change due to the customer.
    pub fn change_cents(&self) -> i64 {
        self.sale.change_cents()
    }

    /// True when every stock decrement applied in full.
    pub fn stock_clean(&self) -> bool {
        self.stock_results.iter().all(|r| r.applied_cleanly())
    }
}

// =============================================================================
// Service
// =============================================================================

/// Runs the cashier checkout pipeline.
#[derive(Clone)]
pub struct CheckoutService {
    config: CheckoutConfig,
    committer: SaleCommitter,
    stock: StockDecrementApplier,
    sessions: SessionAggregator,
}

impl CheckoutService {
    /// Creates a checkout service over the given database.
    pub fn new(db: Database, config: CheckoutConfig) -> Self {
        CheckoutService {
            config,
            committer: SaleCommitter::new(db.clone()),
            stock: StockDecrementApplier::new(db.clone()),
            sessions: SessionAggregator::new(db),
        }
    }

    /// Processes a checkout end to end.
    ///
    /// Fails before any write when the cart is empty or cash does not cover
    /// the total. After the commit succeeds, stock and session steps run and
    /// report rather than unwind.
    pub async fn checkout(
        &self,
        request: CheckoutRequest,
        ctx: &ActorContext,
    ) -> CheckoutResult<CheckoutOutcome> {
        if request.cart.is_empty() {
            return Err(CoreError::EmptyCart.into());
        }

        let rate = self.config.tax_rate();
        let subtotal_cents = request.cart.subtotal_cents();
        let discount_cents = request.cart.discount_cents();
        let tax_cents = request.cart.tax_cents(rate);
        let total_cents = request.cart.total_cents(rate);

        if request.method == PaymentMethod::Cash {
            let tendered = request.tendered_cents.unwrap_or(0);
            if tendered < total_cents {
                return Err(CoreError::InsufficientPayment {
                    required_cents: total_cents,
                    tendered_cents: tendered,
                }
                .into());
            }
        }

        let session = self.sessions.find_or_open(ctx).await?;

        let lines: Vec<SaleLine> = request
            .cart
            .lines
            .iter()
            .map(|line| SaleLine {
                product_id: line.product_id.clone(),
                sku: line.sku.clone(),
                name: line.name.clone(),
                unit: line.unit.clone(),
                unit_price_cents: line.unit_price_cents,
                quantity: match line.quantity {
                    agrivet_core::LineQuantity::Units(n) => n,
                    agrivet_core::LineQuantity::WeightGrams(_) => 1,
                },
                weight_grams: match line.quantity {
                    agrivet_core::LineQuantity::WeightGrams(g) => Some(g),
                    agrivet_core::LineQuantity::Units(_) => None,
                },
                discount_cents: line.discount_cents,
                line_total_cents: line.line_total_cents(),
            })
            .collect();

        let draft = SaleDraft {
            session_id: session.id.clone(),
            customer_id: request.customer_id.clone(),
            lines,
            subtotal_cents,
            discount_cents,
            tax_cents,
            total_cents,
            method: request.method,
            tendered_cents: request.tendered_cents,
            payment_reference: request.payment_reference.clone(),
        };

        let sale = self.committer.commit(draft, ctx).await?;

        // Point of no return: the sale is durable from here on
        let stock_results = self
            .stock
            .apply(&sale.items, &sale.transaction.id, ctx)
            .await;

        if let Err(e) = self
            .sessions
            .accumulate(&session.id, total_cents, tax_cents)
            .await
        {
            // The sale stands; the closing report reconciles from the
            // transaction table.
            warn!(
                session_id = %session.id,
                transaction_number = %sale.transaction.transaction_number,
                error = %e,
                "Session accumulation failed after commit"
            );
        }

        info!(
            transaction_number = %sale.transaction.transaction_number,
            total_cents,
            change_cents = sale.change_cents(),
            "Checkout complete"
        );

        Ok(CheckoutOutcome {
            sale,
            session_id: session.id,
            stock_results,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CheckoutError;
    use agrivet_core::Product;
    use chrono::Utc;

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

    #[tokio::test]
    async fn test_cash_checkout_pipeline() {
        let db = Database::new(agrivet_db::DbConfig::in_memory()).await.unwrap();
        let service = CheckoutService::new(db.clone(), CheckoutConfig::default());
        let ctx = ActorContext::new("cashier-1", "b1");

        let product = seed_product(&db, "DEWORM-10", 10000, 10).await;
        let mut cart = Cart::new();
        cart.add_product(&product, 2).unwrap();

        let outcome = service
            .checkout(
                CheckoutRequest {
                    cart,
                    customer_id: None,
                    method: PaymentMethod::Cash,
                    tendered_cents: Some(30000),
                    payment_reference: None,
                },
                &ctx,
            )
            .await
            .unwrap();

        // 20000 subtotal + 2400 VAT = 22400; 30000 tendered leaves 7600
        assert_eq!(outcome.sale.transaction.subtotal_cents, 20000);
        assert_eq!(outcome.sale.transaction.tax_cents, 2400);
        assert_eq!(outcome.sale.transaction.total_cents, 22400);
        assert_eq!(outcome.change_cents(), 7600);
        assert!(outcome.stock_clean());

        let record = db
            .inventory()
            .get_record(&product.id, "b1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.quantity_on_hand, 8);

        let session = db
            .sessions()
            .get_by_id(&outcome.session_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(session.total_sales_cents, 22400);
        assert_eq!(session.total_taxes_cents, 2400);
        assert_eq!(session.total_transactions, 1);
    }

    #[tokio::test]
    async fn test_empty_cart_rejected() {
        let db = Database::new(agrivet_db::DbConfig::in_memory()).await.unwrap();
        let service = CheckoutService::new(db, CheckoutConfig::default());
        let ctx = ActorContext::new("cashier-1", "b1");

        let err = service
            .checkout(
                CheckoutRequest {
                    cart: Cart::new(),
                    customer_id: None,
                    method: PaymentMethod::Cash,
                    tendered_cents: Some(100),
                    payment_reference: None,
                },
                &ctx,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::Core(CoreError::EmptyCart)));
    }

    #[tokio::test]
    async fn test_short_cash_rejected_without_commit() {
        let db = Database::new(agrivet_db::DbConfig::in_memory()).await.unwrap();
        let service = CheckoutService::new(db.clone(), CheckoutConfig::default());
        let ctx = ActorContext::new("cashier-1", "b1");

        let product = seed_product(&db, "FEED-50", 10000, 10).await;
        let mut cart = Cart::new();
        cart.add_product(&product, 2).unwrap();

        let err = service
            .checkout(
                CheckoutRequest {
                    cart,
                    customer_id: None,
                    method: PaymentMethod::Cash,
                    tendered_cents: Some(20000), // total is 22400
                    payment_reference: None,
                },
                &ctx,
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Core(CoreError::InsufficientPayment { .. })
        ));

        // Nothing was written: stock untouched
        let record = db
            .inventory()
            .get_record(&product.id, "b1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.quantity_on_hand, 10);
    }

    #[tokio::test]
    async fn test_weighed_line_checkout() {
        let db = Database::new(agrivet_db::DbConfig::in_memory()).await.unwrap();
        let service = CheckoutService::new(db.clone(), CheckoutConfig::default());
        let ctx = ActorContext::new("cashier-1", "b1");

        let now = Utc::now();
        let feed = Product {
            id: uuid::Uuid::new_v4().to_string(),
            sku: "FEED-BULK".to_string(),
            barcode: None,
            name: "Hog Grower Feed (bulk)".to_string(),
            description: None,
            unit: "kg".to_string(),
            price_cents: 4500, // per kg
            weight_priced: true,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.products().insert(&feed).await.unwrap();
        // Weight-priced stock tracked in grams
        db.inventory()
            .upsert_record(&feed.id, "b1", 10_000, 0)
            .await
            .unwrap();

        let mut cart = Cart::new();
        cart.add_weighed(&feed, 2500).unwrap(); // 2.5 kg → ₱112.50

        let outcome = service
            .checkout(
                CheckoutRequest {
                    cart,
                    customer_id: None,
                    method: PaymentMethod::Cash,
                    tendered_cents: Some(20000),
                    payment_reference: None,
                },
                &ctx,
            )
            .await
            .unwrap();

        assert_eq!(outcome.sale.transaction.subtotal_cents, 11250);
        assert_eq!(outcome.sale.items[0].weight_grams, Some(2500));

        let record = db
            .inventory()
            .get_record(&feed.id, "b1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.quantity_on_hand, 7500);
    }
}
