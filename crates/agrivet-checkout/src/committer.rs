//! # Sale Committer
//!
//! The single path through which a sale becomes a committed transaction.
//!
//! Both channels settle here: the cashier checkout hands in a cart's
//! snapshots, the order completion hands in the order's snapshots. One
//! writer means one set of numbering, payment, and atomicity rules.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                            SaleCommitter                                │
//! │                                                                         │
//! │   SaleDraft ──► validate ──► assign ids/number ──► one DB transaction   │
//! │   (lines,        non-empty     TXN-YYMMDD-...        header + items     │
//! │    totals,       cash covers                         + payment          │
//! │    tender)       total                                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use tracing::info;

use agrivet_core::{
    CoreError, Payment, PaymentMethod, PaymentStatus, PosTransaction, TransactionItem,
    TransactionStatus,
};
use agrivet_db::repository::transaction::{
    generate_item_id, generate_payment_id, generate_transaction_id, generate_transaction_number,
};
use agrivet_db::Database;

use crate::context::ActorContext;
use crate::error::CheckoutResult;

/// One line of a sale, snapshotted and priced.
#[derive(Debug, Clone)]
pub struct SaleLine {
    pub product_id: String,
    pub sku: String,
    pub name: String,
    pub unit: String,
    pub unit_price_cents: i64,
    pub quantity: i64,
    pub weight_grams: Option<i64>,
    pub discount_cents: i64,
    pub line_total_cents: i64,
}

/// Everything needed to commit a sale, independent of which channel
/// produced it.
#[derive(Debug, Clone)]
pub struct SaleDraft {
    pub session_id: String,
    pub customer_id: Option<String>,
    pub lines: Vec<SaleLine>,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub method: PaymentMethod,
    /// For cash: the amount handed over. Ignored for other methods.
    pub tendered_cents: Option<i64>,
    /// External payment reference (wallet txn id, card auth code).
    pub payment_reference: Option<String>,
}

/// A committed sale: the durable record returned to the caller.
#[derive(Debug, Clone)]
pub struct CommittedSale {
    pub transaction: PosTransaction,
    pub items: Vec<TransactionItem>,
    pub payment: Payment,
}

impl CommittedSale {
    /// Change due to the customer (cash only; zero otherwise).
    pub fn change_cents(&self) -> i64 {
        self.payment.change_cents
    }
}

/// Writes committed sales. The only component that creates transactions.
#[derive(Clone)]
pub struct SaleCommitter {
    db: Database,
}

impl SaleCommitter {
    /// Creates a new SaleCommitter.
    pub fn new(db: Database) -> Self {
        SaleCommitter { db }
    }

    /// Commits a sale draft as one immutable record.
    ///
    /// Validates the draft (non-empty, cash covers the total), assigns the
    /// transaction number, and writes header, items, and payment in a
    /// single database transaction.
    pub async fn commit(&self, draft: SaleDraft, ctx: &ActorContext) -> CheckoutResult<CommittedSale> {
        if draft.lines.is_empty() {
            return Err(CoreError::EmptyCart.into());
        }

        if draft.method == PaymentMethod::Cash {
            let tendered = draft.tendered_cents.unwrap_or(0);
            if tendered < draft.total_cents {
                return Err(CoreError::InsufficientPayment {
                    required_cents: draft.total_cents,
                    tendered_cents: tendered,
                }
                .into());
            }
        }

        let now = Utc::now();
        let transaction_id = generate_transaction_id();

        let transaction = PosTransaction {
            id: transaction_id.clone(),
            transaction_number: generate_transaction_number(),
            session_id: draft.session_id.clone(),
            customer_id: draft.customer_id.clone(),
            cashier_id: ctx.actor_id.clone(),
            branch_id: ctx.branch_id.clone(),
            status: TransactionStatus::Active,
            payment_status: PaymentStatus::Completed,
            subtotal_cents: draft.subtotal_cents,
            discount_cents: draft.discount_cents,
            tax_cents: draft.tax_cents,
            total_cents: draft.total_cents,
            created_at: now,
            updated_at: now,
            voided_at: None,
        };

        let items: Vec<TransactionItem> = draft
            .lines
            .iter()
            .map(|line| TransactionItem {
                id: generate_item_id(),
                transaction_id: transaction_id.clone(),
                product_id: line.product_id.clone(),
                sku_snapshot: line.sku.clone(),
                name_snapshot: line.name.clone(),
                unit_snapshot: line.unit.clone(),
                unit_price_cents: line.unit_price_cents,
                quantity: line.quantity,
                weight_grams: line.weight_grams,
                discount_cents: line.discount_cents,
                line_total_cents: line.line_total_cents,
                created_at: now,
            })
            .collect();

        let (tendered_cents, change_cents) = match draft.method {
            PaymentMethod::Cash => {
                let tendered = draft.tendered_cents.unwrap_or(0);
                (Some(tendered), tendered - draft.total_cents)
            }
            _ => (None, 0),
        };

        let payment = Payment {
            id: generate_payment_id(),
            transaction_id: transaction_id.clone(),
            method: draft.method,
            amount_cents: draft.total_cents,
            tendered_cents,
            change_cents,
            reference: draft.payment_reference.clone(),
            created_at: now,
        };

        self.db
            .transactions()
            .create(&transaction, &items, &payment)
            .await?;

        info!(
            transaction_number = %transaction.transaction_number,
            total_cents = transaction.total_cents,
            change_cents,
            method = ?draft.method,
            "Sale committed"
        );

        Ok(CommittedSale {
            transaction,
            items,
            payment,
        })
    }

    /// Voids a committed transaction.
    pub async fn void(&self, transaction_id: &str) -> CheckoutResult<()> {
        self.db.transactions().void(transaction_id).await?;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CheckoutError;
    use agrivet_db::DbConfig;

    async fn setup() -> (Database, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let session = db.sessions().create("cashier-1", "b1", 0).await.unwrap();
        (db, session.id)
    }

    fn draft(session_id: &str, total_cents: i64, tendered: Option<i64>) -> SaleDraft {
        SaleDraft {
            session_id: session_id.to_string(),
            customer_id: None,
            lines: vec![SaleLine {
                product_id: "p1".to_string(),
                sku: "DEWORM-10".to_string(),
                name: "Dewormer 10ml".to_string(),
                unit: "piece".to_string(),
                unit_price_cents: 10000,
                quantity: 2,
                weight_grams: None,
                discount_cents: 0,
                line_total_cents: 20000,
            }],
            subtotal_cents: 20000,
            discount_cents: 0,
            tax_cents: total_cents - 20000,
            total_cents,
            method: PaymentMethod::Cash,
            tendered_cents: tendered,
            payment_reference: None,
        }
    }

    #[tokio::test]
    async fn test_cash_commit_computes_change() {
        let (db, session_id) = setup().await;
        let committer = SaleCommitter::new(db.clone());
        let ctx = ActorContext::new("cashier-1", "b1");

        let sale = committer
            .commit(draft(&session_id, 22400, Some(30000)), &ctx)
            .await
            .unwrap();

        assert_eq!(sale.change_cents(), 7600);
        assert_eq!(sale.transaction.status, TransactionStatus::Active);
        assert!(sale.transaction.transaction_number.starts_with("TXN-"));

        // Durable: read it back
        let stored = db
            .transactions()
            .get_by_id(&sale.transaction.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.total_cents, 22400);
    }

    #[tokio::test]
    async fn test_insufficient_cash_rejected_before_any_write() {
        let (db, session_id) = setup().await;
        let committer = SaleCommitter::new(db.clone());
        let ctx = ActorContext::new("cashier-1", "b1");

        let err = committer
            .commit(draft(&session_id, 22400, Some(20000)), &ctx)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Core(CoreError::InsufficientPayment { .. })
        ));

        let txns = db.transactions().list_for_session(&session_id).await.unwrap();
        assert!(txns.is_empty());
    }

    #[tokio::test]
    async fn test_empty_draft_rejected() {
        let (db, session_id) = setup().await;
        let committer = SaleCommitter::new(db);
        let ctx = ActorContext::new("cashier-1", "b1");

        let mut empty = draft(&session_id, 22400, Some(30000));
        empty.lines.clear();
        let err = committer.commit(empty, &ctx).await.unwrap_err();
        assert!(matches!(err, CheckoutError::Core(CoreError::EmptyCart)));
    }

    #[tokio::test]
    async fn test_non_cash_has_no_change() {
        let (db, session_id) = setup().await;
        let committer = SaleCommitter::new(db);
        let ctx = ActorContext::new("cashier-1", "b1");

        let mut card = draft(&session_id, 22400, None);
        card.method = PaymentMethod::Card;
        card.payment_reference = Some("AUTH-12345".to_string());

        let sale = committer.commit(card, &ctx).await.unwrap();
        assert_eq!(sale.change_cents(), 0);
        assert!(sale.payment.tendered_cents.is_none());
        assert_eq!(sale.payment.reference.as_deref(), Some("AUTH-12345"));
    }
}
