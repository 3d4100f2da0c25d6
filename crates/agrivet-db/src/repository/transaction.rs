//! # Transaction Repository
//!
//! Storage for the transaction writer: the immutable sale record.
//!
//! ## Commit Unit
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   Transaction Commit (one unit of work)                 │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    INSERT pos_transactions        (header, status=active)              │
//! │    INSERT pos_transaction_items   (one per line, snapshot)             │
//! │    INSERT pos_payments            (exactly one)                        │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Any failure rolls the whole unit back — no orphaned headers,          │
//! │  no items without a payment, no compensating deletes.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! After commit the record is immutable except the status transition to
//! `void`.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use agrivet_core::{Payment, PosTransaction, TransactionItem};

const TXN_COLUMNS: &str = "id, transaction_number, session_id, customer_id, cashier_id, \
     branch_id, status, payment_status, subtotal_cents, discount_cents, tax_cents, \
     total_cents, created_at, updated_at, voided_at";

const ITEM_COLUMNS: &str = "id, transaction_id, product_id, sku_snapshot, name_snapshot, \
     unit_snapshot, unit_price_cents, quantity, weight_grams, discount_cents, \
     line_total_cents, created_at";

const PAYMENT_COLUMNS: &str = "id, transaction_id, method, amount_cents, tendered_cents, \
     change_cents, reference, created_at";

/// Repository for POS transaction storage.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    /// Creates a new TransactionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    /// Commits a complete sale record — header, items, and payment — inside
    /// a single database transaction.
    ///
    /// The caller is responsible for having computed consistent totals; this
    /// method only guarantees the rows land (or fail) as a unit.
    pub async fn create(
        &self,
        txn: &PosTransaction,
        items: &[TransactionItem],
        payment: &Payment,
    ) -> DbResult<()> {
        debug!(
            id = %txn.id,
            transaction_number = %txn.transaction_number,
            items = items.len(),
            "Committing transaction"
        );

        let mut uow = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO pos_transactions (
                id, transaction_number, session_id, customer_id, cashier_id,
                branch_id, status, payment_status, subtotal_cents, discount_cents,
                tax_cents, total_cents, created_at, updated_at, voided_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            "#,
        )
        .bind(&txn.id)
        .bind(&txn.transaction_number)
        .bind(&txn.session_id)
        .bind(&txn.customer_id)
        .bind(&txn.cashier_id)
        .bind(&txn.branch_id)
        .bind(txn.status)
        .bind(txn.payment_status)
        .bind(txn.subtotal_cents)
        .bind(txn.discount_cents)
        .bind(txn.tax_cents)
        .bind(txn.total_cents)
        .bind(txn.created_at)
        .bind(txn.updated_at)
        .bind(txn.voided_at)
        .execute(&mut *uow)
        .await?;

        for item in items {
            sqlx::query(
                r#"
                INSERT INTO pos_transaction_items (
                    id, transaction_id, product_id, sku_snapshot, name_snapshot,
                    unit_snapshot, unit_price_cents, quantity, weight_grams,
                    discount_cents, line_total_cents, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                "#,
            )
            .bind(&item.id)
            .bind(&item.transaction_id)
            .bind(&item.product_id)
            .bind(&item.sku_snapshot)
            .bind(&item.name_snapshot)
            .bind(&item.unit_snapshot)
            .bind(item.unit_price_cents)
            .bind(item.quantity)
            .bind(item.weight_grams)
            .bind(item.discount_cents)
            .bind(item.line_total_cents)
            .bind(item.created_at)
            .execute(&mut *uow)
            .await?;
        }

        sqlx::query(
            r#"
            INSERT INTO pos_payments (
                id, transaction_id, method, amount_cents, tendered_cents,
                change_cents, reference, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&payment.id)
        .bind(&payment.transaction_id)
        .bind(payment.method)
        .bind(payment.amount_cents)
        .bind(payment.tendered_cents)
        .bind(payment.change_cents)
        .bind(&payment.reference)
        .bind(payment.created_at)
        .execute(&mut *uow)
        .await?;

        uow.commit().await?;

        Ok(())
    }

    /// Gets a transaction header by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<PosTransaction>> {
        let sql = format!("SELECT {TXN_COLUMNS} FROM pos_transactions WHERE id = ?1");
        let txn = sqlx::query_as::<_, PosTransaction>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(txn)
    }

    /// Gets all items for a transaction.
    pub async fn get_items(&self, transaction_id: &str) -> DbResult<Vec<TransactionItem>> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM pos_transaction_items \
             WHERE transaction_id = ?1 ORDER BY created_at"
        );
        let items = sqlx::query_as::<_, TransactionItem>(&sql)
            .bind(transaction_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(items)
    }

    /// Gets the payment for a transaction.
    pub async fn get_payment(&self, transaction_id: &str) -> DbResult<Option<Payment>> {
        let sql = format!("SELECT {PAYMENT_COLUMNS} FROM pos_payments WHERE transaction_id = ?1");
        let payment = sqlx::query_as::<_, Payment>(&sql)
            .bind(transaction_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(payment)
    }

    /// Voids a transaction (the only post-commit mutation allowed).
    ///
    /// Guarded: only an `active` transaction can be voided.
    pub async fn void(&self, transaction_id: &str) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE pos_transactions SET
                status = 'void',
                voided_at = ?2,
                updated_at = ?2
            WHERE id = ?1 AND status = 'active'
            "#,
        )
        .bind(transaction_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::stale_state("Transaction", transaction_id));
        }

        Ok(())
    }

    /// Lists transactions for a session (newest first).
    pub async fn list_for_session(&self, session_id: &str) -> DbResult<Vec<PosTransaction>> {
        let sql = format!(
            "SELECT {TXN_COLUMNS} FROM pos_transactions \
             WHERE session_id = ?1 ORDER BY created_at DESC"
        );
        let txns = sqlx::query_as::<_, PosTransaction>(&sql)
            .bind(session_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(txns)
    }
}

/// Generates a transaction number: timestamp prefix for operator readability
/// plus a UUID-derived suffix so concurrent checkouts cannot collide.
///
/// ## Format
/// `TXN-YYMMDD-HHMMSS-XXXX` (XXXX = first 4 hex chars of a fresh UUID v4)
pub fn generate_transaction_number() -> String {
    let now = Utc::now();
    let suffix: String = Uuid::new_v4().simple().to_string()[..4].to_string();
    format!("TXN-{}-{}", now.format("%y%m%d-%H%M%S"), suffix)
}

/// Generates a new transaction ID.
pub fn generate_transaction_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generates a new transaction item ID.
pub fn generate_item_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generates a new payment ID.
pub fn generate_payment_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================
