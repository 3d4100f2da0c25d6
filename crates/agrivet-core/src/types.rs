//! # Domain Types
//!
//! Core domain types for the AgriVet POS commit workflow.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌──────────────────┐  ┌──────────────────┐  ┌──────────────────┐      │
//! │  │  PosTransaction  │  │   OnlineOrder    │  │    PosSession    │      │
//! │  │  ──────────────  │  │  ──────────────  │  │  ──────────────  │      │
//! │  │  header totals   │  │  status machine  │  │  running totals  │      │
//! │  │  + items         │  │  + items         │  │  per cashier     │      │
//! │  │  + one payment   │  │  + history       │  │  per branch      │      │
//! │  └──────────────────┘  └──────────────────┘  └──────────────────┘      │
//! │                                                                         │
//! │  ┌──────────────────┐  ┌──────────────────────┐                        │
//! │  │ InventoryRecord  │  │ InventoryReservation │                        │
//! │  │  ──────────────  │  │  ──────────────────  │                        │
//! │  │  on_hand         │  │  soft hold on stock  │                        │
//! │  │  reserved        │  │  24h expiry          │                        │
//! │  │  available (gen) │  │  active→released/    │                        │
//! │  └──────────────────┘  │         fulfilled    │                        │
//! │                        └──────────────────────┘                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID: (sku, transaction_number, order_number) - human-readable

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 1200 bps = 12% (Philippine VAT)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate(crate::DEFAULT_VAT_BPS)
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
///
/// Weight-priced products (feed sold by the kilo) carry their price per
/// kilogram; discrete products carry their price per unit. Inventory for
/// weight-priced products is tracked in grams.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Stock Keeping Unit - business identifier.
    pub sku: String,

    /// Barcode (EAN-13, UPC-A, etc.).
    pub barcode: Option<String>,

    /// Display name shown to cashier and on receipt.
    pub name: String,

    /// Optional description for product details.
    pub description: Option<String>,

    /// Stocking unit: "piece" for discrete items, "kg" for weight-priced.
    pub unit: String,

    /// Price in centavos (per unit, or per kilogram if weight-priced).
    pub price_cents: i64,

    /// Whether this product is priced by measured weight.
    pub weight_priced: bool,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Status Enums
// =============================================================================

/// The status of a committed POS transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// Committed and counting towards session totals.
    Active,
    /// Voided after commit (only mutation a transaction allows).
    Void,
    /// Cancelled before completion.
    Cancelled,
}

/// Payment settlement status on a transaction header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

/// How the customer paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash; change = tendered - total.
    Cash,
    /// Card on an external terminal; no change.
    Card,
    /// GCash or similar wallet reference; no change.
    DigitalWallet,
}

/// Lifecycle of a cashier session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Open,
    Suspended,
    Closed,
}

/// Lifecycle of an inventory reservation.
///
/// A reservation must never remain `Active` once its order reaches a
/// terminal state: completion fulfills it, cancellation releases it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Active,
    Released,
    Fulfilled,
}

/// Kind of stock movement recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum StockMovement {
    /// Soft hold placed (quantity_reserved += qty).
    Reserve,
    /// Soft hold released (quantity_reserved -= qty).
    Release,
    /// Reservation consumed on order completion (quantity_reserved -= qty).
    Fulfill,
    /// Final on-hand decrement for a committed sale.
    Sale,
}

/// Online order status machine.
///
/// ```text
/// pending_confirmation ──confirm──► confirmed ──mark_ready──► ready_for_pickup
///        │                             │                            │
///        └───────────cancel────────────┘                        complete
///                      │                                            │
///                      ▼                                            ▼
///                  cancelled                                    completed
/// ```
///
/// `for_payment` and `for_dispatch` are stored states carried over from the
/// order schema; no controller operation produces them and the guarded
/// transitions reject them as sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    PendingConfirmation,
    Confirmed,
    ReadyForPickup,
    ForPayment,
    ForDispatch,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// Terminal states admit no further transitions.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// Cancellation is only allowed before the order is ready.
    pub const fn can_cancel(&self) -> bool {
        matches!(
            self,
            OrderStatus::PendingConfirmation | OrderStatus::Confirmed
        )
    }
}

/// Fulfillment channel for an online order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    Pickup,
    Delivery,
}

// =============================================================================
// POS Transaction
// =============================================================================

/// An immutable sale record (header).
///
/// Created by the transaction writer as a unit with its items and payment;
/// never mutated afterwards except the status transition to `Void`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PosTransaction {
    pub id: String,
    pub transaction_number: String,
    pub session_id: String,
    pub customer_id: Option<String>,
    pub cashier_id: String,
    pub branch_id: String,
    pub status: TransactionStatus,
    pub payment_status: PaymentStatus,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub voided_at: Option<DateTime<Utc>>,
}

impl PosTransaction {
    /// Returns the grand total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// A line item in a transaction.
/// Uses the snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct TransactionItem {
    pub id: String,
    pub transaction_id: String,
    pub product_id: String,
    /// SKU at time of sale (frozen).
    pub sku_snapshot: String,
    /// Product name at time of sale (frozen).
    pub name_snapshot: String,
    /// Stocking unit at time of sale (frozen).
    pub unit_snapshot: String,
    /// Unit (or per-kg) price in centavos at time of sale (frozen).
    pub unit_price_cents: i64,
    /// Discrete quantity sold (1 for weight-priced lines).
    pub quantity: i64,
    /// Measured weight for weight-priced lines.
    pub weight_grams: Option<i64>,
    /// Discount applied to this line.
    pub discount_cents: i64,
    /// Line total: unit_price × qty (or × weight) − discount, floored at 0.
    pub line_total_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl TransactionItem {
    /// Returns the line total as Money.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }

    /// The amount this line removes from inventory: grams for weight-priced
    /// lines, units otherwise.
    #[inline]
    pub fn stock_delta(&self) -> i64 {
        self.weight_grams.unwrap_or(self.quantity)
    }
}

/// The payment settling a transaction. Exactly one per transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Payment {
    pub id: String,
    pub transaction_id: String,
    pub method: PaymentMethod,
    /// Amount applied towards the total, in centavos.
    pub amount_cents: i64,
    /// For cash: amount the customer handed over.
    pub tendered_cents: Option<i64>,
    /// For cash: tendered − total. Zero for non-cash methods.
    pub change_cents: i64,
    /// External reference (wallet transaction id, card auth code).
    pub reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Inventory
// =============================================================================

/// Per (product, branch) stock levels.
///
/// `quantity_available` is a storage-layer generated column
/// (`on_hand − reserved`); it is read, never written.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct InventoryRecord {
    pub id: String,
    pub product_id: String,
    pub branch_id: String,
    pub quantity_on_hand: i64,
    pub quantity_reserved: i64,
    pub quantity_available: i64,
    pub reorder_level: i64,
    pub updated_at: DateTime<Utc>,
}

impl InventoryRecord {
    /// Whether on-hand stock has dropped to or below the reorder level.
    #[inline]
    pub fn needs_reorder(&self) -> bool {
        self.quantity_on_hand <= self.reorder_level
    }
}

/// A soft hold on inventory tied to an online order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct InventoryReservation {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    pub branch_id: String,
    pub quantity: i64,
    pub status: ReservationStatus,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub released_at: Option<DateTime<Utc>>,
    pub fulfilled_at: Option<DateTime<Utc>>,
}

// =============================================================================
// POS Session
// =============================================================================

/// A cashier's open working period with running aggregates.
///
/// Created lazily on first checkout; totals only ever grow via atomic
/// additive updates; closed explicitly with an ending cash count.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PosSession {
    pub id: String,
    pub cashier_id: String,
    pub branch_id: String,
    pub status: SessionStatus,
    pub opening_cash_cents: i64,
    pub closing_cash_cents: Option<i64>,
    pub total_sales_cents: i64,
    pub total_transactions: i64,
    pub total_taxes_cents: i64,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl PosSession {
    /// Expected drawer cash: opening float plus cash sales.
    ///
    /// Note this over-approximates when non-cash tenders were taken; the
    /// closing report treats it as an upper bound only.
    #[inline]
    pub fn expected_cash_cents(&self) -> i64 {
        self.opening_cash_cents + self.total_sales_cents
    }
}

// =============================================================================
// Online Order
// =============================================================================

/// A customer-facing online order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct OnlineOrder {
    pub id: String,
    pub order_number: String,
    pub customer_id: Option<String>,
    /// Recipient for SMS-style notifications.
    pub customer_phone: Option<String>,
    pub branch_id: String,
    pub order_type: OrderType,
    pub status: OrderStatus,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub estimated_ready_at: Option<DateTime<Utc>>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub confirmed_by: Option<String>,
    pub ready_at: Option<DateTime<Utc>>,
    pub ready_by: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub completed_by: Option<String>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancelled_by: Option<String>,
    pub cancellation_reason: Option<String>,
    /// Set when completion converts the order into a POS transaction.
    pub pos_transaction_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A line item in an online order (product snapshot at order time).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    pub sku_snapshot: String,
    pub name_snapshot: String,
    pub unit_snapshot: String,
    pub unit_price_cents: i64,
    pub quantity: i64,
    pub weight_grams: Option<i64>,
    pub line_total_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl OrderItem {
    /// The amount this line holds/removes from inventory.
    #[inline]
    pub fn stock_delta(&self) -> i64 {
        self.weight_grams.unwrap_or(self.quantity)
    }
}

/// One entry in the order status audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct OrderStatusEvent {
    pub id: String,
    pub order_id: String,
    pub from_status: OrderStatus,
    pub to_status: OrderStatus,
    pub actor_id: String,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tax_rate_defaults_to_vat() {
        let rate = TaxRate::default();
        assert_eq!(rate.bps(), 1200);
        assert!((rate.percentage() - 12.0).abs() < 0.001);
    }

    #[test]
    fn test_order_status_terminal() {
        assert!(OrderStatus::Completed.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::PendingConfirmation.is_terminal());
        assert!(!OrderStatus::ReadyForPickup.is_terminal());
    }

    #[test]
    fn test_order_status_can_cancel() {
        assert!(OrderStatus::PendingConfirmation.can_cancel());
        assert!(OrderStatus::Confirmed.can_cancel());
        assert!(!OrderStatus::ReadyForPickup.can_cancel());
        assert!(!OrderStatus::Completed.can_cancel());
        assert!(!OrderStatus::Cancelled.can_cancel());
    }

    #[test]
    fn test_stock_delta_prefers_weight() {
        let now = Utc::now();
        let item = TransactionItem {
            id: "i1".into(),
            transaction_id: "t1".into(),
            product_id: "p1".into(),
            sku_snapshot: "FEED-50".into(),
            name_snapshot: "Hog Grower Feed".into(),
            unit_snapshot: "kg".into(),
            unit_price_cents: 4500,
            quantity: 1,
            weight_grams: Some(2500),
            discount_cents: 0,
            line_total_cents: 11250,
            created_at: now,
        };
        assert_eq!(item.stock_delta(), 2500);
    }

    #[test]
    fn test_needs_reorder() {
        let record = InventoryRecord {
            id: "inv1".into(),
            product_id: "p1".into(),
            branch_id: "b1".into(),
            quantity_on_hand: 3,
            quantity_reserved: 0,
            quantity_available: 3,
            reorder_level: 5,
            updated_at: Utc::now(),
        };
        assert!(record.needs_reorder());
    }
}
