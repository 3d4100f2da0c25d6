//! End-to-end workflow tests over an in-memory database.
//!
//! These exercise the two sales channels the way a branch uses them: a
//! cashier ringing up a sale, and an online order walking its lifecycle
//! from placement to completion or cancellation.

use std::sync::Arc;

use chrono::Utc;

use agrivet_checkout::{
    ActorContext, CheckoutConfig, CheckoutError, CheckoutRequest, CheckoutService, LogNotifier,
    OrderLifecycle, OrderLineRequest, PlaceOrderRequest, SettlementRequest,
};
use agrivet_core::{
    Cart, OrderStatus, OrderType, PaymentMethod, Product, ReservationStatus, TransactionStatus,
};
use agrivet_db::{Database, DbConfig};

async fn test_db() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

async fn seed_product(
    db: &Database,
    sku: &str,
    price_cents: i64,
    weight_priced: bool,
    on_hand: i64,
) -> Product {
    let now = Utc::now();
    let product = Product {
        id: uuid::Uuid::new_v4().to_string(),
        sku: sku.to_string(),
        barcode: None,
        name: format!("Product {sku}"),
        description: None,
        unit: if weight_priced { "kg" } else { "piece" }.to_string(),
        price_cents,
        weight_priced,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    db.products().insert(&product).await.unwrap();
    db.inventory()
        .upsert_record(&product.id, "branch-1", on_hand, 0)
        .await
        .unwrap();
    product
}

fn lifecycle(db: &Database) -> OrderLifecycle {
    OrderLifecycle::new(db.clone(), CheckoutConfig::default(), Arc::new(LogNotifier))
}

// =============================================================================
// Cashier channel
// =============================================================================

#[tokio::test]
async fn cash_checkout_end_to_end() {
    let db = test_db().await;
    let service = CheckoutService::new(db.clone(), CheckoutConfig::default());
    let ctx = ActorContext::new("cashier-1", "branch-1");

    // ₱100.00 item, two units, 12% VAT
    let product = seed_product(&db, "DEWORM-10", 10000, false, 10).await;
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

    // Totals: 200.00 + 24.00 tax = 224.00; change from 300.00 is 76.00
    assert_eq!(outcome.sale.transaction.subtotal_cents, 20000);
    assert_eq!(outcome.sale.transaction.tax_cents, 2400);
    assert_eq!(outcome.sale.transaction.total_cents, 22400);
    assert_eq!(outcome.change_cents(), 7600);

    // Totals identity: sum(line totals) + tax == total
    let line_sum: i64 = outcome
        .sale
        .items
        .iter()
        .map(|i| i.line_total_cents)
        .sum();
    assert_eq!(
        line_sum + outcome.sale.transaction.tax_cents,
        outcome.sale.transaction.total_cents
    );

    // Stock decremented by 2
    let record = db
        .inventory()
        .get_record(&product.id, "branch-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.quantity_on_hand, 8);
    assert!(outcome.stock_clean());

    // The record is durable and active
    let stored = db
        .transactions()
        .get_by_id(&outcome.sale.transaction.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, TransactionStatus::Active);
}

#[tokio::test]
async fn session_accumulates_across_checkouts() {
    let db = test_db().await;
    let service = CheckoutService::new(db.clone(), CheckoutConfig::default());
    let ctx = ActorContext::new("cashier-1", "branch-1");

    let product = seed_product(&db, "FEED-50", 10000, false, 100).await;

    let mut session_id = None;
    for _ in 0..3 {
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

        // Every checkout lands in the same lazily opened session
        if let Some(id) = &session_id {
            assert_eq!(&outcome.session_id, id);
        }
        session_id = Some(outcome.session_id);
    }

    let session = db
        .sessions()
        .get_by_id(session_id.as_deref().unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(session.total_transactions, 3);
    assert_eq!(session.total_sales_cents, 3 * 22400);
    assert_eq!(session.total_taxes_cents, 3 * 2400);
}

#[tokio::test]
async fn oversell_clamps_stock_but_sale_stands() {
    let db = test_db().await;
    let service = CheckoutService::new(db.clone(), CheckoutConfig::default());
    let ctx = ActorContext::new("cashier-1", "branch-1");

    // Only 1 on the shelf, cashier scans 3 (stock record was stale)
    let product = seed_product(&db, "VITAMIN-B", 5000, false, 1).await;
    let mut cart = Cart::new();
    cart.add_product(&product, 3).unwrap();

    let outcome = service
        .checkout(
            CheckoutRequest {
                cart,
                customer_id: None,
                method: PaymentMethod::Cash,
                tendered_cents: Some(50000),
                payment_reference: None,
            },
            &ctx,
        )
        .await
        .unwrap();

    // The sale committed; stock clamped at zero, discrepancy reported
    assert!(!outcome.stock_clean());
    let record = db
        .inventory()
        .get_record(&product.id, "branch-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.quantity_on_hand, 0);
}

// =============================================================================
// Online order channel
// =============================================================================

#[tokio::test]
async fn pickup_order_full_lifecycle() {
    let db = test_db().await;
    let lc = lifecycle(&db);
    let staff = ActorContext::new("staff-1", "branch-1");
    let cashier = ActorContext::new("cashier-1", "branch-1");

    let product = seed_product(&db, "DEWORM-10", 10000, false, 10).await;

    let order = lc
        .place(
            PlaceOrderRequest {
                customer_id: Some("cust-1".into()),
                customer_phone: Some("+639171234567".into()),
                order_type: OrderType::Pickup,
                lines: vec![OrderLineRequest {
                    product_id: product.id.clone(),
                    quantity: 2,
                    weight_grams: None,
                }],
            },
            &staff,
        )
        .await
        .unwrap();

    lc.confirm(&order.id, &staff).await.unwrap();

    // Confirmed: 2 units held, available shrinks
    let record = db
        .inventory()
        .get_record(&product.id, "branch-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.quantity_reserved, 2);
    assert_eq!(record.quantity_available, 8);

    lc.mark_ready(&order.id, &staff).await.unwrap();

    let outcome = lc
        .complete(
            &order.id,
            SettlementRequest {
                method: PaymentMethod::Cash,
                tendered_cents: Some(30000),
                payment_reference: None,
            },
            &cashier,
        )
        .await
        .unwrap();

    assert_eq!(outcome.order.status, OrderStatus::Completed);
    assert_eq!(
        outcome.order.pos_transaction_id.as_deref(),
        Some(outcome.sale.transaction.id.as_str())
    );
    assert_eq!(outcome.sale.transaction.total_cents, 22400);
    assert_eq!(outcome.sale.change_cents(), 7600);

    // Holds consumed, on-hand decremented, nothing double-counted
    let record = db
        .inventory()
        .get_record(&product.id, "branch-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.quantity_on_hand, 8);
    assert_eq!(record.quantity_reserved, 0);
    assert_eq!(record.quantity_available, 8);

    // Reservation terminal-state invariant: nothing active on a
    // completed order
    let reservations = db.inventory().get_reservations(&order.id).await.unwrap();
    assert!(!reservations.is_empty());
    assert!(reservations
        .iter()
        .all(|r| r.status == ReservationStatus::Fulfilled));

    // Settlement landed in the cashier's session
    let session = db
        .sessions()
        .find_open("cashier-1", "branch-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(session.total_sales_cents, 22400);

    // Full audit trail: pending → confirmed → ready → completed
    let history = db.orders().history(&order.id).await.unwrap();
    assert_eq!(history.len(), 3);
    assert_eq!(history[2].to_status, OrderStatus::Completed);
}

#[tokio::test]
async fn delivery_order_eta_then_cancellation_releases_holds() {
    let db = test_db().await;
    let lc = lifecycle(&db);
    let staff = ActorContext::new("staff-1", "branch-1");

    // Two lines, quantities totalling 12 discrete items
    let feed = seed_product(&db, "FEED-50", 5000, false, 50).await;
    let syringes = seed_product(&db, "SYRINGE-3", 1500, false, 50).await;

    let order = lc
        .place(
            PlaceOrderRequest {
                customer_id: None,
                customer_phone: Some("+639179998888".into()),
                order_type: OrderType::Delivery,
                lines: vec![
                    OrderLineRequest {
                        product_id: feed.id.clone(),
                        quantity: 10,
                        weight_grams: None,
                    },
                    OrderLineRequest {
                        product_id: syringes.id.clone(),
                        quantity: 2,
                        weight_grams: None,
                    },
                ],
            },
            &staff,
        )
        .await
        .unwrap();

    let before = Utc::now();
    let confirmed = lc.confirm(&order.id, &staff).await.unwrap();

    // Delivery with 12 items: 15 + 30 + ceil(12/5)*5 = 75 minutes
    let eta = confirmed.estimated_ready_at.unwrap();
    let minutes = (eta - before).num_minutes();
    assert!((74..=75).contains(&minutes), "eta was {minutes} minutes out");

    // Both lines held
    let feed_record = db
        .inventory()
        .get_record(&feed.id, "branch-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(feed_record.quantity_reserved, 10);

    let cancelled = lc
        .cancel(&order.id, "customer_request", &staff)
        .await
        .unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(
        cancelled.cancellation_reason.as_deref(),
        Some("customer_request")
    );

    // Reservation terminal-state invariant: everything released, counters
    // restored
    let reservations = db.inventory().get_reservations(&order.id).await.unwrap();
    assert_eq!(reservations.len(), 2);
    assert!(reservations
        .iter()
        .all(|r| r.status == ReservationStatus::Released));

    let feed_record = db
        .inventory()
        .get_record(&feed.id, "branch-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(feed_record.quantity_reserved, 0);
    assert_eq!(feed_record.quantity_available, 50);
}

#[tokio::test]
async fn confirm_reports_every_missing_item() {
    let db = test_db().await;
    let lc = lifecycle(&db);
    let staff = ActorContext::new("staff-1", "branch-1");

    let scarce = seed_product(&db, "ANTIBIO-5", 20000, false, 1).await;
    let absent = seed_product(&db, "GLOVES-L", 500, false, 0).await;
    let plenty = seed_product(&db, "FEED-50", 5000, false, 100).await;

    let order = lc
        .place(
            PlaceOrderRequest {
                customer_id: None,
                customer_phone: None,
                order_type: OrderType::Pickup,
                lines: vec![
                    OrderLineRequest {
                        product_id: scarce.id.clone(),
                        quantity: 3,
                        weight_grams: None,
                    },
                    OrderLineRequest {
                        product_id: absent.id.clone(),
                        quantity: 1,
                        weight_grams: None,
                    },
                    OrderLineRequest {
                        product_id: plenty.id.clone(),
                        quantity: 5,
                        weight_grams: None,
                    },
                ],
            },
            &staff,
        )
        .await
        .unwrap();

    let err = lc.confirm(&order.id, &staff).await.unwrap_err();
    match err {
        CheckoutError::InsufficientInventory { missing } => {
            // Both shortfalls listed, the covered line absent
            assert_eq!(missing.len(), 2);
            let skus: Vec<&str> = missing.iter().map(|m| m.sku.as_str()).collect();
            assert!(skus.contains(&"ANTIBIO-5"));
            assert!(skus.contains(&"GLOVES-L"));
            assert!(!skus.contains(&"FEED-50"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn weighed_feed_order_completes_in_grams() {
    let db = test_db().await;
    let lc = lifecycle(&db);
    let staff = ActorContext::new("staff-1", "branch-1");
    let cashier = ActorContext::new("cashier-1", "branch-1");

    // ₱45.00/kg bulk feed, 10 kg on hand (tracked in grams)
    let feed = seed_product(&db, "FEED-BULK", 4500, true, 10_000).await;

    let order = lc
        .place(
            PlaceOrderRequest {
                customer_id: None,
                customer_phone: None,
                order_type: OrderType::Pickup,
                lines: vec![OrderLineRequest {
                    product_id: feed.id.clone(),
                    quantity: 1,
                    weight_grams: Some(2500),
                }],
            },
            &staff,
        )
        .await
        .unwrap();

    // 2.5 kg × ₱45.00 = ₱112.50, + 12% VAT ₱13.50 = ₱126.00
    assert_eq!(order.subtotal_cents, 11250);
    assert_eq!(order.tax_cents, 1350);
    assert_eq!(order.total_cents, 12600);

    lc.confirm(&order.id, &staff).await.unwrap();
    let record = db
        .inventory()
        .get_record(&feed.id, "branch-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.quantity_reserved, 2500);

    lc.mark_ready(&order.id, &staff).await.unwrap();
    let outcome = lc
        .complete(
            &order.id,
            SettlementRequest {
                method: PaymentMethod::Cash,
                tendered_cents: Some(15000),
                payment_reference: None,
            },
            &cashier,
        )
        .await
        .unwrap();
    assert_eq!(outcome.sale.change_cents(), 2400);

    let record = db
        .inventory()
        .get_record(&feed.id, "branch-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.quantity_on_hand, 7500);
    assert_eq!(record.quantity_reserved, 0);
}

#[tokio::test]
async fn completing_twice_is_rejected() {
    let db = test_db().await;
    let lc = lifecycle(&db);
    let staff = ActorContext::new("staff-1", "branch-1");

    let product = seed_product(&db, "DEWORM-10", 10000, false, 10).await;
    let order = lc
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
            &staff,
        )
        .await
        .unwrap();

    lc.confirm(&order.id, &staff).await.unwrap();
    lc.mark_ready(&order.id, &staff).await.unwrap();

    let settle = || SettlementRequest {
        method: PaymentMethod::Cash,
        tendered_cents: Some(20000),
        payment_reference: None,
    };
    lc.complete(&order.id, settle(), &staff).await.unwrap();

    let err = lc.complete(&order.id, settle(), &staff).await.unwrap_err();
    assert!(matches!(
        err,
        CheckoutError::Core(agrivet_core::CoreError::InvalidOrderStatus { .. })
    ));

    // Only one sale was committed against the order's session, stock
    // moved exactly once
    let record = db
        .inventory()
        .get_record(&product.id, "branch-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.quantity_on_hand, 9);
}
