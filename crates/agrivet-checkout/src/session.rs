//! # Session Aggregator
//!
//! Finds or opens the cashier's session and folds committed totals into it.
//!
//! Sessions are created lazily: the first checkout of a shift opens one
//! with a zero float unless the cashier opened it explicitly with a
//! counted drawer. Totals only ever grow through the storage layer's
//! additive updates.

use tracing::info;

use agrivet_core::PosSession;
use agrivet_db::Database;

use crate::context::ActorContext;
use crate::error::CheckoutResult;

/// Maintains session running totals across checkouts.
#[derive(Clone)]
pub struct SessionAggregator {
    db: Database,
}

impl SessionAggregator {
    /// Creates a new SessionAggregator.
    pub fn new(db: Database) -> Self {
        SessionAggregator { db }
    }

    /// Returns the cashier's open session at the branch, opening one with a
    /// zero float when none exists.
    pub async fn find_or_open(&self, ctx: &ActorContext) -> CheckoutResult<PosSession> {
        let sessions = self.db.sessions();

        if let Some(session) = sessions.find_open(&ctx.actor_id, &ctx.branch_id).await? {
            return Ok(session);
        }

        let session = sessions.create(&ctx.actor_id, &ctx.branch_id, 0).await?;
        info!(
            session_id = %session.id,
            cashier_id = %ctx.actor_id,
            "Opened session lazily on first checkout"
        );
        Ok(session)
    }

    /// Opens a session explicitly with a counted opening float.
    pub async fn open(&self, ctx: &ActorContext, opening_cash_cents: i64) -> CheckoutResult<PosSession> {
        let session = self
            .db
            .sessions()
            .create(&ctx.actor_id, &ctx.branch_id, opening_cash_cents)
            .await?;
        Ok(session)
    }

    /// Folds a committed transaction into the session totals.
    pub async fn accumulate(
        &self,
        session_id: &str,
        total_cents: i64,
        tax_cents: i64,
    ) -> CheckoutResult<()> {
        self.db
            .sessions()
            .accumulate(session_id, total_cents, tax_cents)
            .await?;
        Ok(())
    }

    /// Closes a session with the counted drawer cash and returns the final
    /// aggregates for the closing report.
    pub async fn close(
        &self,
        session_id: &str,
        closing_cash_cents: i64,
    ) -> CheckoutResult<PosSession> {
        let session = self
            .db
            .sessions()
            .close(session_id, closing_cash_cents)
            .await?;
        Ok(session)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use agrivet_core::SessionStatus;
    use agrivet_db::DbConfig;

    #[tokio::test]
    async fn test_find_or_open_is_lazy_and_stable() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let aggregator = SessionAggregator::new(db);
        let ctx = ActorContext::new("cashier-1", "b1");

        let first = aggregator.find_or_open(&ctx).await.unwrap();
        assert_eq!(first.status, SessionStatus::Open);
        assert_eq!(first.opening_cash_cents, 0);

        // Second lookup reuses the open session
        let second = aggregator.find_or_open(&ctx).await.unwrap();
        assert_eq!(second.id, first.id);
    }

    #[tokio::test]
    async fn test_accumulate_and_close() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let aggregator = SessionAggregator::new(db);
        let ctx = ActorContext::new("cashier-1", "b1");

        let session = aggregator.open(&ctx, 50000).await.unwrap();
        aggregator.accumulate(&session.id, 22400, 2400).await.unwrap();
        aggregator.accumulate(&session.id, 11200, 1200).await.unwrap();

        let closed = aggregator.close(&session.id, 83600).await.unwrap();
        assert_eq!(closed.total_sales_cents, 33600);
        assert_eq!(closed.total_taxes_cents, 3600);
        assert_eq!(closed.total_transactions, 2);
        assert_eq!(closed.expected_cash_cents(), 83600);

        // A new checkout after close opens a fresh session
        let fresh = aggregator.find_or_open(&ctx).await.unwrap();
        assert_ne!(fresh.id, session.id);
    }
}
