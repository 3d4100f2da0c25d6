//! # Order Repository
//!
//! Storage for online orders, their items, and the status history trail.
//!
//! ## Guarded Transitions
//! Every status transition is a single `UPDATE ... WHERE status = ?`; when
//! zero rows match, the order moved underneath the caller and the method
//! returns `StaleState`. Each successful transition writes an
//! `order_status_history` row inside the same unit of work.

use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use agrivet_core::{OnlineOrder, OrderItem, OrderStatus, OrderStatusEvent};

const ORDER_COLUMNS: &str = "id, order_number, customer_id, customer_phone, branch_id, \
     order_type, status, subtotal_cents, tax_cents, total_cents, estimated_ready_at, \
     confirmed_at, confirmed_by, ready_at, ready_by, completed_at, completed_by, \
     cancelled_at, cancelled_by, cancellation_reason, pos_transaction_id, \
     created_at, updated_at";

const ORDER_ITEM_COLUMNS: &str = "id, order_id, product_id, sku_snapshot, name_snapshot, \
     unit_snapshot, unit_price_cents, quantity, weight_grams, line_total_cents, created_at";

const HISTORY_COLUMNS: &str = "id, order_id, from_status, to_status, actor_id, reason, created_at";

/// Repository for online order operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Inserts an order and its items as one unit of work.
    pub async fn insert_order(&self, order: &OnlineOrder, items: &[OrderItem]) -> DbResult<()> {
        debug!(
            id = %order.id,
            order_number = %order.order_number,
            items = items.len(),
            "Inserting order"
        );

        let mut uow = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, order_number, customer_id, customer_phone, branch_id,
                order_type, status, subtotal_cents, tax_cents, total_cents,
                estimated_ready_at, confirmed_at, confirmed_by, ready_at, ready_by,
                completed_at, completed_by, cancelled_at, cancelled_by,
                cancellation_reason, pos_transaction_id, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23
            )
            "#,
        )
        .bind(&order.id)
        .bind(&order.order_number)
        .bind(&order.customer_id)
        .bind(&order.customer_phone)
        .bind(&order.branch_id)
        .bind(order.order_type)
        .bind(order.status)
        .bind(order.subtotal_cents)
        .bind(order.tax_cents)
        .bind(order.total_cents)
        .bind(order.estimated_ready_at)
        .bind(order.confirmed_at)
        .bind(&order.confirmed_by)
        .bind(order.ready_at)
        .bind(&order.ready_by)
        .bind(order.completed_at)
        .bind(&order.completed_by)
        .bind(order.cancelled_at)
        .bind(&order.cancelled_by)
        .bind(&order.cancellation_reason)
        .bind(&order.pos_transaction_id)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *uow)
        .await?;

        for item in items {
            sqlx::query(
                r#"
                INSERT INTO order_items (
                    id, order_id, product_id, sku_snapshot, name_snapshot,
                    unit_snapshot, unit_price_cents, quantity, weight_grams,
                    line_total_cents, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                "#,
            )
            .bind(&item.id)
            .bind(&item.order_id)
            .bind(&item.product_id)
            .bind(&item.sku_snapshot)
            .bind(&item.name_snapshot)
            .bind(&item.unit_snapshot)
            .bind(item.unit_price_cents)
            .bind(item.quantity)
            .bind(item.weight_grams)
            .bind(item.line_total_cents)
            .bind(item.created_at)
            .execute(&mut *uow)
            .await?;
        }

        uow.commit().await?;

        Ok(())
    }

    /// Gets an order by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<OnlineOrder>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1");
        let order = sqlx::query_as::<_, OnlineOrder>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(order)
    }

    /// Gets an order by its business number.
    pub async fn get_by_number(&self, order_number: &str) -> DbResult<Option<OnlineOrder>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE order_number = ?1");
        let order = sqlx::query_as::<_, OnlineOrder>(&sql)
            .bind(order_number)
            .fetch_optional(&self.pool)
            .await?;

        Ok(order)
    }

    /// Gets all items for an order.
    pub async fn get_items(&self, order_id: &str) -> DbResult<Vec<OrderItem>> {
        let sql = format!(
            "SELECT {ORDER_ITEM_COLUMNS} FROM order_items \
             WHERE order_id = ?1 ORDER BY created_at"
        );
        let items = sqlx::query_as::<_, OrderItem>(&sql)
            .bind(order_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(items)
    }

    /// Lists orders for a branch in a given status, oldest first (queue order).
    pub async fn list_by_status(
        &self,
        branch_id: &str,
        status: OrderStatus,
    ) -> DbResult<Vec<OnlineOrder>> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders \
             WHERE branch_id = ?1 AND status = ?2 ORDER BY created_at"
        );
        let orders = sqlx::query_as::<_, OnlineOrder>(&sql)
            .bind(branch_id)
            .bind(status)
            .fetch_all(&self.pool)
            .await?;

        Ok(orders)
    }

    /// Confirms a pending order and stamps the ready-time estimate.
    ///
    /// Guard: `status = 'pending_confirmation'`.
    pub async fn set_confirmed(
        &self,
        order_id: &str,
        actor_id: &str,
        estimated_ready_at: DateTime<Utc>,
    ) -> DbResult<()> {
        let now = Utc::now();
        let mut uow = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE orders SET
                status = 'confirmed',
                confirmed_at = ?2,
                confirmed_by = ?3,
                estimated_ready_at = ?4,
                updated_at = ?2
            WHERE id = ?1 AND status = 'pending_confirmation'
            "#,
        )
        .bind(order_id)
        .bind(now)
        .bind(actor_id)
        .bind(estimated_ready_at)
        .execute(&mut *uow)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::stale_state("Order", order_id));
        }

        insert_history_row(
            &mut uow,
            order_id,
            OrderStatus::PendingConfirmation,
            OrderStatus::Confirmed,
            actor_id,
            None,
        )
        .await?;

        uow.commit().await?;

        info!(order_id = %order_id, actor_id = %actor_id, "Order confirmed");
        Ok(())
    }

    /// Cancels an order with a reason.
    ///
    /// Guard: status is `pending_confirmation` or `confirmed`. Orders that
    /// are ready, completed, or already cancelled cannot be cancelled.
    pub async fn set_cancelled(
        &self,
        order_id: &str,
        actor_id: &str,
        reason: &str,
    ) -> DbResult<()> {
        let now = Utc::now();
        let mut uow = self.pool.begin().await?;

        // Read the source status first so the history row is accurate
        let current: Option<OrderStatus> =
            sqlx::query_scalar("SELECT status FROM orders WHERE id = ?1")
                .bind(order_id)
                .fetch_optional(&mut *uow)
                .await?;
        let from_status = current.ok_or_else(|| DbError::not_found("Order", order_id))?;

        let result = sqlx::query(
            r#"
            UPDATE orders SET
                status = 'cancelled',
                cancelled_at = ?2,
                cancelled_by = ?3,
                cancellation_reason = ?4,
                updated_at = ?2
            WHERE id = ?1 AND status IN ('pending_confirmation', 'confirmed')
            "#,
        )
        .bind(order_id)
        .bind(now)
        .bind(actor_id)
        .bind(reason)
        .execute(&mut *uow)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::stale_state("Order", order_id));
        }

        insert_history_row(
            &mut uow,
            order_id,
            from_status,
            OrderStatus::Cancelled,
            actor_id,
            Some(reason),
        )
        .await?;

        uow.commit().await?;

        info!(order_id = %order_id, actor_id = %actor_id, reason = %reason, "Order cancelled");
        Ok(())
    }

    /// Marks a confirmed order as ready for pickup.
    ///
    /// Guard: `status = 'confirmed'`.
    pub async fn set_ready(&self, order_id: &str, actor_id: &str) -> DbResult<()> {
        let now = Utc::now();
        let mut uow = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE orders SET
                status = 'ready_for_pickup',
                ready_at = ?2,
                ready_by = ?3,
                updated_at = ?2
            WHERE id = ?1 AND status = 'confirmed'
            "#,
        )
        .bind(order_id)
        .bind(now)
        .bind(actor_id)
        .execute(&mut *uow)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::stale_state("Order", order_id));
        }

        insert_history_row(
            &mut uow,
            order_id,
            OrderStatus::Confirmed,
            OrderStatus::ReadyForPickup,
            actor_id,
            None,
        )
        .await?;

        uow.commit().await?;

        info!(order_id = %order_id, actor_id = %actor_id, "Order ready for pickup");
        Ok(())
    }

    /// Completes a ready order, linking the POS transaction that settled it.
    ///
    /// Guard: `status = 'ready_for_pickup'`.
    pub async fn set_completed(
        &self,
        order_id: &str,
        actor_id: &str,
        pos_transaction_id: &str,
    ) -> DbResult<()> {
        let now = Utc::now();
        let mut uow = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE orders SET
                status = 'completed',
                completed_at = ?2,
                completed_by = ?3,
                pos_transaction_id = ?4,
                updated_at = ?2
            WHERE id = ?1 AND status = 'ready_for_pickup'
            "#,
        )
        .bind(order_id)
        .bind(now)
        .bind(actor_id)
        .bind(pos_transaction_id)
        .execute(&mut *uow)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::stale_state("Order", order_id));
        }

        insert_history_row(
            &mut uow,
            order_id,
            OrderStatus::ReadyForPickup,
            OrderStatus::Completed,
            actor_id,
            None,
        )
        .await?;

        uow.commit().await?;

        info!(
            order_id = %order_id,
            actor_id = %actor_id,
            pos_transaction_id = %pos_transaction_id,
            "Order completed"
        );
        Ok(())
    }

    /// Gets the status history for an order, oldest first.
    pub async fn history(&self, order_id: &str) -> DbResult<Vec<OrderStatusEvent>> {
        let sql = format!(
            "SELECT {HISTORY_COLUMNS} FROM order_status_history \
             WHERE order_id = ?1 ORDER BY created_at"
        );
        let events = sqlx::query_as::<_, OrderStatusEvent>(&sql)
            .bind(order_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(events)
    }
}

/// Writes one status history row inside the caller's unit of work.
async fn insert_history_row(
    uow: &mut Transaction<'_, Sqlite>,
    order_id: &str,
    from_status: OrderStatus,
    to_status: OrderStatus,
    actor_id: &str,
    reason: Option<&str>,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO order_status_history (
            id, order_id, from_status, to_status, actor_id, reason, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(order_id)
    .bind(from_status)
    .bind(to_status)
    .bind(actor_id)
    .bind(reason)
    .bind(Utc::now())
    .execute(&mut **uow)
    .await?;

    Ok(())
}

/// Generates an order number: date prefix plus a UUID-derived suffix.
///
/// ## Format
/// `ORD-YYMMDD-XXXXXX` (XXXXXX = first 6 hex chars of a fresh UUID v4)
pub fn generate_order_number() -> String {
    let now = Utc::now();
    let suffix: String = Uuid::new_v4().simple().to_string()[..6].to_string();
    format!("ORD-{}-{}", now.format("%y%m%d"), suffix)
}

/// Generates a new order ID.
pub fn generate_order_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generates a new order item ID.
pub fn generate_order_item_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================
