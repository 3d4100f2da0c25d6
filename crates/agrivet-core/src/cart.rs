//! # Cart Module
//!
//! The ephemeral, client-held cart. A cart exists only until checkout and is
//! destroyed on completion or explicit clear — it is never persisted.
//!
//! ## Invariants
//! - Lines are unique by `product_id` (adding the same product merges)
//! - `line_total = unit_price × quantity − discount`, floored at zero
//! - Weight-priced lines use `unit_price × weight` (per-kg price × grams)
//! - Maximum lines: 100; maximum quantity per line: 999

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::{Product, TaxRate};
use crate::{MAX_CART_LINES, MAX_LINE_QUANTITY, MAX_LINE_WEIGHT_GRAMS};

// =============================================================================
// Cart Line
// =============================================================================

/// How much of a product a cart line holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum LineQuantity {
    /// Discrete unit count.
    Units(i64),
    /// Measured weight in grams (for per-kilogram pricing).
    WeightGrams(i64),
}

impl LineQuantity {
    /// The raw amount, in whichever unit the line uses.
    #[inline]
    pub const fn amount(&self) -> i64 {
        match self {
            LineQuantity::Units(n) => *n,
            LineQuantity::WeightGrams(g) => *g,
        }
    }
}

/// One product entry in the cart.
///
/// ## Price Freezing
/// Product details (sku, name, price) are copied at the moment the line is
/// added. If the catalog price changes afterwards, the cart keeps the
/// original — the same snapshot later frozen into the transaction items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: String,
    /// SKU at time of adding (frozen).
    pub sku: String,
    /// Product name at time of adding (frozen).
    pub name: String,
    /// Stocking unit at time of adding (frozen).
    pub unit: String,
    /// Price in centavos at time of adding (frozen).
    /// Per unit for discrete lines, per kilogram for weight lines.
    pub unit_price_cents: i64,
    pub quantity: LineQuantity,
    /// Line-level discount in centavos.
    pub discount_cents: i64,
    /// When this line was added to the cart.
    pub added_at: DateTime<Utc>,
}

impl CartLine {
    /// Creates a discrete-quantity line from a product snapshot.
    pub fn from_product(product: &Product, quantity: i64) -> Self {
        CartLine {
            product_id: product.id.clone(),
            sku: product.sku.clone(),
            name: product.name.clone(),
            unit: product.unit.clone(),
            unit_price_cents: product.price_cents,
            quantity: LineQuantity::Units(quantity),
            discount_cents: 0,
            added_at: Utc::now(),
        }
    }

    /// Creates a weight-priced line from a product snapshot.
    pub fn from_product_weighed(product: &Product, grams: i64) -> Self {
        CartLine {
            product_id: product.id.clone(),
            sku: product.sku.clone(),
            name: product.name.clone(),
            unit: product.unit.clone(),
            unit_price_cents: product.price_cents,
            quantity: LineQuantity::WeightGrams(grams),
            discount_cents: 0,
            added_at: Utc::now(),
        }
    }

    /// Gross line amount before discount.
    pub fn gross_cents(&self) -> i64 {
        let price = Money::from_cents(self.unit_price_cents);
        match self.quantity {
            LineQuantity::Units(n) => price.multiply_quantity(n).cents(),
            LineQuantity::WeightGrams(g) => price.multiply_weight_grams(g).cents(),
        }
    }

    /// Line total: gross − discount, floored at zero. Never negative.
    pub fn line_total_cents(&self) -> i64 {
        Money::from_cents(self.gross_cents())
            .saturating_discount(Money::from_cents(self.discount_cents))
            .cents()
    }

    /// The amount this line removes from inventory (units or grams).
    #[inline]
    pub fn stock_delta(&self) -> i64 {
        self.quantity.amount()
    }

    /// Discrete item count for prep-time estimates: unit lines contribute
    /// their quantity, weight lines count as a single item.
    pub fn item_count(&self) -> i64 {
        match self.quantity {
            LineQuantity::Units(n) => n,
            LineQuantity::WeightGrams(_) => 1,
        }
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The ephemeral cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    pub lines: Vec<CartLine>,
    /// When the cart was created/last cleared.
    pub created_at: DateTime<Utc>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart {
            lines: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Adds a discrete product to the cart or increases quantity if present.
    pub fn add_product(&mut self, product: &Product, quantity: i64) -> Result<(), String> {
        if let Some(line) = self
            .lines
            .iter_mut()
            .find(|l| l.product_id == product.id && matches!(l.quantity, LineQuantity::Units(_)))
        {
            let current = line.quantity.amount();
            let new_qty = current + quantity;
            if new_qty > MAX_LINE_QUANTITY {
                return Err(format!("Quantity would exceed maximum of {MAX_LINE_QUANTITY}"));
            }
            line.quantity = LineQuantity::Units(new_qty);
            return Ok(());
        }

        self.push_line(CartLine::from_product(product, quantity))
    }

    /// Adds a weighed amount of a weight-priced product, merging with an
    /// existing weighed line for the same product.
    pub fn add_weighed(&mut self, product: &Product, grams: i64) -> Result<(), String> {
        if let Some(line) = self.lines.iter_mut().find(|l| {
            l.product_id == product.id && matches!(l.quantity, LineQuantity::WeightGrams(_))
        }) {
            let new_grams = line.quantity.amount() + grams;
            if new_grams > MAX_LINE_WEIGHT_GRAMS {
                return Err(format!(
                    "Weight would exceed maximum of {MAX_LINE_WEIGHT_GRAMS} g"
                ));
            }
            line.quantity = LineQuantity::WeightGrams(new_grams);
            return Ok(());
        }

        self.push_line(CartLine::from_product_weighed(product, grams))
    }

    fn push_line(&mut self, line: CartLine) -> Result<(), String> {
        if self.lines.len() >= MAX_CART_LINES {
            return Err(format!("Cart cannot have more than {MAX_CART_LINES} lines"));
        }
        self.lines.push(line);
        Ok(())
    }

    /// Applies a line-level discount to the given product's line.
    pub fn apply_discount(&mut self, product_id: &str, discount_cents: i64) -> Result<(), String> {
        let line = self
            .lines
            .iter_mut()
            .find(|l| l.product_id == product_id)
            .ok_or_else(|| format!("Product {product_id} not in cart"))?;

        if discount_cents < 0 {
            return Err("Discount must not be negative".to_string());
        }
        if discount_cents > line.gross_cents() {
            return Err("Discount exceeds line amount".to_string());
        }

        line.discount_cents = discount_cents;
        Ok(())
    }

    /// Removes a line from the cart by product ID.
    pub fn remove_line(&mut self, product_id: &str) -> Result<(), String> {
        let initial_len = self.lines.len();
        self.lines.retain(|l| l.product_id != product_id);

        if self.lines.len() == initial_len {
            Err(format!("Product {product_id} not in cart"))
        } else {
            Ok(())
        }
    }

    /// Clears all lines from the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.created_at = Utc::now();
    }

    /// Checks if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of line entries.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Total discrete item count (for prep-time estimates).
    pub fn item_count(&self) -> i64 {
        self.lines.iter().map(|l| l.item_count()).sum()
    }

    /// Subtotal: sum of line totals (after line discounts), before tax.
    pub fn subtotal_cents(&self) -> i64 {
        self.lines.iter().map(|l| l.line_total_cents()).sum()
    }

    /// Sum of line-level discounts.
    pub fn discount_cents(&self) -> i64 {
        self.lines.iter().map(|l| l.discount_cents).sum()
    }

    /// Tax on the discounted subtotal at the given rate.
    pub fn tax_cents(&self, rate: TaxRate) -> i64 {
        Money::from_cents(self.subtotal_cents())
            .calculate_tax(rate)
            .cents()
    }

    /// Grand total: subtotal + tax.
    pub fn total_cents(&self, rate: TaxRate) -> i64 {
        self.subtotal_cents() + self.tax_cents(rate)
    }
}

impl Default for Cart {
    fn default() -> Self {
        Cart::new()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
