//! # Inventory Repository
//!
//! Stock levels, reservations, and the stock movement audit trail.
//!
//! ## Counters
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    inventory (per product, per branch)                  │
//! │                                                                         │
//! │  quantity_on_hand   physical stock in the branch                        │
//! │  quantity_reserved  soft holds from confirmed online orders             │
//! │  quantity_available on_hand − reserved (generated, read only)           │
//! │                                                                         │
//! │  reserve:  reserved += qty          (hold placed)                       │
//! │  release:  reserved −= qty          (order cancelled / hold expired)    │
//! │  fulfill:  reserved −= qty          (order completed, hold consumed)    │
//! │  sale:     on_hand  −= qty          (committed checkout)                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Weight-priced products track grams in these counters; discrete products
//! track units. Every counter change writes an `inventory_transactions`
//! audit row in the same unit of work.

use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use agrivet_core::{InventoryRecord, InventoryReservation, ReservationStatus, StockMovement};

const RECORD_COLUMNS: &str = "id, product_id, branch_id, quantity_on_hand, \
     quantity_reserved, quantity_available, reorder_level, updated_at";

const RESERVATION_COLUMNS: &str = "id, order_id, product_id, branch_id, quantity, \
     status, expires_at, created_at, released_at, fulfilled_at";

/// Outcome of a single on-hand decrement.
///
/// Decrements clamp at zero rather than fail: by the time a sale is
/// committed the money has changed hands, so a stock discrepancy is a
/// reporting problem, not a reason to refuse the sale.
#[derive(Debug, Clone)]
pub struct DecrementOutcome {
    pub product_id: String,
    pub previous_on_hand: i64,
    pub new_on_hand: i64,
    /// True when the requested quantity exceeded on-hand stock.
    pub clamped: bool,
}

/// Repository for inventory operations.
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: SqlitePool,
}

impl InventoryRepository {
    /// Creates a new InventoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InventoryRepository { pool }
    }

    /// Gets the stock record for a product at a branch.
    pub async fn get_record(
        &self,
        product_id: &str,
        branch_id: &str,
    ) -> DbResult<Option<InventoryRecord>> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM inventory \
             WHERE product_id = ?1 AND branch_id = ?2"
        );
        let record = sqlx::query_as::<_, InventoryRecord>(&sql)
            .bind(product_id)
            .bind(branch_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    /// Creates or replaces the stock counters for a product at a branch.
    pub async fn upsert_record(
        &self,
        product_id: &str,
        branch_id: &str,
        quantity_on_hand: i64,
        reorder_level: i64,
    ) -> DbResult<()> {
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO inventory (
                id, product_id, branch_id, quantity_on_hand,
                quantity_reserved, reorder_level, updated_at
            ) VALUES (?1, ?2, ?3, ?4, 0, ?5, ?6)
            ON CONFLICT (product_id, branch_id) DO UPDATE SET
                quantity_on_hand = excluded.quantity_on_hand,
                reorder_level = excluded.reorder_level,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(product_id)
        .bind(branch_id)
        .bind(quantity_on_hand)
        .bind(reorder_level)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Places a soft hold on stock for an online order line.
    ///
    /// One unit of work: bumps `quantity_reserved`, inserts the reservation
    /// row, and writes the audit entry. Fails with `NotFound` when the
    /// product has no stock record at the branch.
    pub async fn reserve_item(
        &self,
        order_id: &str,
        product_id: &str,
        branch_id: &str,
        quantity: i64,
        expires_at: DateTime<Utc>,
        actor_id: &str,
    ) -> DbResult<InventoryReservation> {
        let now = Utc::now();
        let mut uow = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE inventory SET
                quantity_reserved = quantity_reserved + ?3,
                updated_at = ?4
            WHERE product_id = ?1 AND branch_id = ?2
            "#,
        )
        .bind(product_id)
        .bind(branch_id)
        .bind(quantity)
        .bind(now)
        .execute(&mut *uow)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Inventory", product_id));
        }

        let reservation = InventoryReservation {
            id: Uuid::new_v4().to_string(),
            order_id: order_id.to_string(),
            product_id: product_id.to_string(),
            branch_id: branch_id.to_string(),
            quantity,
            status: ReservationStatus::Active,
            expires_at,
            created_at: now,
            released_at: None,
            fulfilled_at: None,
        };

        sqlx::query(
            r#"
            INSERT INTO inventory_reservations (
                id, order_id, product_id, branch_id, quantity,
                status, expires_at, created_at, released_at, fulfilled_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, NULL, NULL)
            "#,
        )
        .bind(&reservation.id)
        .bind(&reservation.order_id)
        .bind(&reservation.product_id)
        .bind(&reservation.branch_id)
        .bind(reservation.quantity)
        .bind(reservation.status)
        .bind(reservation.expires_at)
        .bind(reservation.created_at)
        .execute(&mut *uow)
        .await?;

        insert_audit_row(
            &mut uow,
            product_id,
            branch_id,
            StockMovement::Reserve,
            quantity,
            order_id,
            actor_id,
        )
        .await?;

        uow.commit().await?;

        debug!(
            order_id = %order_id,
            product_id = %product_id,
            quantity,
            "Reservation placed"
        );

        Ok(reservation)
    }

    /// Releases all active reservations for an order (cancellation path).
    ///
    /// Returns the reservations that were released. A no-op when the order
    /// holds nothing, so it is safe to call unconditionally.
    pub async fn release_for_order(
        &self,
        order_id: &str,
        actor_id: &str,
    ) -> DbResult<Vec<InventoryReservation>> {
        self.settle_for_order(order_id, actor_id, ReservationStatus::Released)
            .await
    }

    /// Fulfills all active reservations for an order (completion path).
    ///
    /// Fulfillment consumes the hold: `quantity_reserved` drops by the
    /// reserved amount while the matching sale decrement takes the stock
    /// out of `quantity_on_hand`.
    pub async fn fulfill_for_order(
        &self,
        order_id: &str,
        actor_id: &str,
    ) -> DbResult<Vec<InventoryReservation>> {
        self.settle_for_order(order_id, actor_id, ReservationStatus::Fulfilled)
            .await
    }

    /// Flips every active reservation on an order to a settled status and
    /// returns the reserved counters in one unit of work.
    async fn settle_for_order(
        &self,
        order_id: &str,
        actor_id: &str,
        target: ReservationStatus,
    ) -> DbResult<Vec<InventoryReservation>> {
        let now = Utc::now();
        let mut uow = self.pool.begin().await?;

        let sql = format!(
            "SELECT {RESERVATION_COLUMNS} FROM inventory_reservations \
             WHERE order_id = ?1 AND status = 'active'"
        );
        let active = sqlx::query_as::<_, InventoryReservation>(&sql)
            .bind(order_id)
            .fetch_all(&mut *uow)
            .await?;

        if active.is_empty() {
            uow.commit().await?;
            return Ok(Vec::new());
        }

        let movement = match target {
            ReservationStatus::Released => StockMovement::Release,
            ReservationStatus::Fulfilled => StockMovement::Fulfill,
            ReservationStatus::Active => return Err(DbError::Internal(
                "cannot settle reservations back to active".to_string(),
            )),
        };

        for reservation in &active {
            // Clamp at zero in case a counter drifted; the audit row still
            // records the full reserved quantity.
            sqlx::query(
                r#"
                UPDATE inventory SET
                    quantity_reserved = MAX(0, quantity_reserved - ?3),
                    updated_at = ?4
                WHERE product_id = ?1 AND branch_id = ?2
                "#,
            )
            .bind(&reservation.product_id)
            .bind(&reservation.branch_id)
            .bind(reservation.quantity)
            .bind(now)
            .execute(&mut *uow)
            .await?;

            let (released_at, fulfilled_at) = match target {
                ReservationStatus::Released => (Some(now), None),
                _ => (None, Some(now)),
            };

            sqlx::query(
                r#"
                UPDATE inventory_reservations SET
                    status = ?2,
                    released_at = ?3,
                    fulfilled_at = ?4
                WHERE id = ?1 AND status = 'active'
                "#,
            )
            .bind(&reservation.id)
            .bind(target)
            .bind(released_at)
            .bind(fulfilled_at)
            .execute(&mut *uow)
            .await?;

            insert_audit_row(
                &mut uow,
                &reservation.product_id,
                &reservation.branch_id,
                movement,
                -reservation.quantity,
                order_id,
                actor_id,
            )
            .await?;
        }

        uow.commit().await?;

        info!(
            order_id = %order_id,
            count = active.len(),
            status = ?target,
            "Reservations settled"
        );

        Ok(active)
    }

    /// Decrements on-hand stock for a committed sale line.
    ///
    /// Clamps at zero instead of failing; the outcome reports the clamp so
    /// callers can surface the discrepancy. Missing stock records are
    /// treated the same way (previous = 0, clamped).
    pub async fn decrement_on_hand(
        &self,
        product_id: &str,
        branch_id: &str,
        quantity: i64,
        reference_id: &str,
        actor_id: &str,
    ) -> DbResult<DecrementOutcome> {
        let now = Utc::now();
        let mut uow = self.pool.begin().await?;

        let previous: Option<i64> = sqlx::query_scalar(
            "SELECT quantity_on_hand FROM inventory \
             WHERE product_id = ?1 AND branch_id = ?2",
        )
        .bind(product_id)
        .bind(branch_id)
        .fetch_optional(&mut *uow)
        .await?;

        let previous_on_hand = previous.unwrap_or(0);
        let new_on_hand = (previous_on_hand - quantity).max(0);
        let clamped = previous_on_hand < quantity;

        if previous.is_some() {
            sqlx::query(
                r#"
                UPDATE inventory SET
                    quantity_on_hand = ?3,
                    updated_at = ?4
                WHERE product_id = ?1 AND branch_id = ?2
                "#,
            )
            .bind(product_id)
            .bind(branch_id)
            .bind(new_on_hand)
            .bind(now)
            .execute(&mut *uow)
            .await?;
        }

        insert_audit_row(
            &mut uow,
            product_id,
            branch_id,
            StockMovement::Sale,
            -(previous_on_hand - new_on_hand),
            reference_id,
            actor_id,
        )
        .await?;

        uow.commit().await?;

        if clamped {
            warn!(
                product_id = %product_id,
                branch_id = %branch_id,
                requested = quantity,
                available = previous_on_hand,
                "Stock decrement clamped at zero"
            );
        }

        Ok(DecrementOutcome {
            product_id: product_id.to_string(),
            previous_on_hand,
            new_on_hand,
            clamped,
        })
    }

    /// Gets all reservations for an order, newest first.
    pub async fn get_reservations(&self, order_id: &str) -> DbResult<Vec<InventoryReservation>> {
        let sql = format!(
            "SELECT {RESERVATION_COLUMNS} FROM inventory_reservations \
             WHERE order_id = ?1 ORDER BY created_at DESC"
        );
        let reservations = sqlx::query_as::<_, InventoryReservation>(&sql)
            .bind(order_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(reservations)
    }

    /// Releases every active reservation past its expiry and returns the
    /// count released. Meant to run from a periodic sweep.
    pub async fn release_expired(&self, actor_id: &str) -> DbResult<usize> {
        let now = Utc::now();

        let expired_orders: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT order_id FROM inventory_reservations \
             WHERE status = 'active' AND expires_at < ?1",
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        let mut released = 0;
        for order_id in &expired_orders {
            released += self.release_for_order(order_id, actor_id).await?.len();
        }

        if released > 0 {
            info!(count = released, "Expired reservations released");
        }

        Ok(released)
    }

    /// Gets the audit trail for a product at a branch, newest first.
    pub async fn movement_history(
        &self,
        product_id: &str,
        branch_id: &str,
        limit: i64,
    ) -> DbResult<Vec<(StockMovement, i64, String)>> {
        let rows: Vec<(StockMovement, i64, String)> = sqlx::query_as(
            "SELECT movement, quantity, reference_id FROM inventory_transactions \
             WHERE product_id = ?1 AND branch_id = ?2 \
             ORDER BY created_at DESC LIMIT ?3",
        )
        .bind(product_id)
        .bind(branch_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

/// Writes one audit row inside the caller's unit of work.
async fn insert_audit_row(
    uow: &mut Transaction<'_, Sqlite>,
    product_id: &str,
    branch_id: &str,
    movement: StockMovement,
    quantity: i64,
    reference_id: &str,
    actor_id: &str,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO inventory_transactions (
            id, product_id, branch_id, movement, quantity,
            reference_id, actor_id, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(product_id)
    .bind(branch_id)
    .bind(movement)
    .bind(quantity)
    .bind(reference_id)
    .bind(actor_id)
    .bind(Utc::now())
    .execute(&mut **uow)
    .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
