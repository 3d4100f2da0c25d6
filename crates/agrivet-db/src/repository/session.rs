//! # Session Repository
//!
//! Storage for cashier sessions and their running aggregates.
//!
//! ## Aggregate Updates
//! Session totals are updated with additive SQL (`total = total + ?`), never
//! read-modify-write in application code. Two checkouts landing at the same
//! moment both add their amounts; neither overwrites the other.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use agrivet_core::{PosSession, SessionStatus};

const SESSION_COLUMNS: &str = "id, cashier_id, branch_id, status, opening_cash_cents, \
     closing_cash_cents, total_sales_cents, total_transactions, total_taxes_cents, \
     opened_at, closed_at";

/// Repository for POS session operations.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    pool: SqlitePool,
}

impl SessionRepository {
    /// Creates a new SessionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SessionRepository { pool }
    }

    /// Gets a session by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<PosSession>> {
        let sql = format!("SELECT {SESSION_COLUMNS} FROM pos_sessions WHERE id = ?1");
        let session = sqlx::query_as::<_, PosSession>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(session)
    }

    /// Finds the open session for a cashier at a branch, if any.
    pub async fn find_open(&self, cashier_id: &str, branch_id: &str) -> DbResult<Option<PosSession>> {
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM pos_sessions \
             WHERE cashier_id = ?1 AND branch_id = ?2 AND status = 'open' \
             ORDER BY opened_at DESC LIMIT 1"
        );
        let session = sqlx::query_as::<_, PosSession>(&sql)
            .bind(cashier_id)
            .bind(branch_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(session)
    }

    /// Inserts a fully formed session row.
    pub async fn insert(&self, session: &PosSession) -> DbResult<()> {
        debug!(
            id = %session.id,
            cashier_id = %session.cashier_id,
            "Inserting session"
        );

        sqlx::query(
            r#"
            INSERT INTO pos_sessions (
                id, cashier_id, branch_id, status, opening_cash_cents,
                closing_cash_cents, total_sales_cents, total_transactions,
                total_taxes_cents, opened_at, closed_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&session.id)
        .bind(&session.cashier_id)
        .bind(&session.branch_id)
        .bind(session.status)
        .bind(session.opening_cash_cents)
        .bind(session.closing_cash_cents)
        .bind(session.total_sales_cents)
        .bind(session.total_transactions)
        .bind(session.total_taxes_cents)
        .bind(session.opened_at)
        .bind(session.closed_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Opens a new session for a cashier with an opening cash float.
    pub async fn create(
        &self,
        cashier_id: &str,
        branch_id: &str,
        opening_cash_cents: i64,
    ) -> DbResult<PosSession> {
        let session = PosSession {
            id: Uuid::new_v4().to_string(),
            cashier_id: cashier_id.to_string(),
            branch_id: branch_id.to_string(),
            status: SessionStatus::Open,
            opening_cash_cents,
            closing_cash_cents: None,
            total_sales_cents: 0,
            total_transactions: 0,
            total_taxes_cents: 0,
            opened_at: Utc::now(),
            closed_at: None,
        };

        self.insert(&session).await?;

        info!(
            id = %session.id,
            cashier_id = %cashier_id,
            branch_id = %branch_id,
            "Session opened"
        );

        Ok(session)
    }

    /// Adds a committed transaction's totals to the session aggregates.
    ///
    /// The update is additive and guarded on `status = 'open'`. If the
    /// session was closed underneath the caller the guard catches it and
    /// no totals are lost or double counted.
    pub async fn accumulate(
        &self,
        session_id: &str,
        total_cents: i64,
        tax_cents: i64,
    ) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE pos_sessions SET
                total_sales_cents = total_sales_cents + ?2,
                total_taxes_cents = total_taxes_cents + ?3,
                total_transactions = total_transactions + 1
            WHERE id = ?1 AND status = 'open'
            "#,
        )
        .bind(session_id)
        .bind(total_cents)
        .bind(tax_cents)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::stale_state("Session", session_id));
        }

        debug!(
            session_id = %session_id,
            total_cents,
            tax_cents,
            "Session totals accumulated"
        );

        Ok(())
    }

    /// Closes a session with the counted drawer cash.
    ///
    /// Guarded: only an open session can be closed.
    pub async fn close(&self, session_id: &str, closing_cash_cents: i64) -> DbResult<PosSession> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE pos_sessions SET
                status = 'closed',
                closing_cash_cents = ?2,
                closed_at = ?3
            WHERE id = ?1 AND status = 'open'
            "#,
        )
        .bind(session_id)
        .bind(closing_cash_cents)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::stale_state("Session", session_id));
        }

        let session = self
            .get_by_id(session_id)
            .await?
            .ok_or_else(|| DbError::not_found("Session", session_id))?;

        info!(
            id = %session.id,
            total_sales_cents = session.total_sales_cents,
            total_transactions = session.total_transactions,
            "Session closed"
        );

        Ok(session)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_create_and_find_open() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.sessions();

        assert!(repo.find_open("c1", "b1").await.unwrap().is_none());

        let session = repo.create("c1", "b1", 50000).await.unwrap();
        assert_eq!(session.status, SessionStatus::Open);
        assert_eq!(session.opening_cash_cents, 50000);

        let found = repo.find_open("c1", "b1").await.unwrap().unwrap();
        assert_eq!(found.id, session.id);

        // Different branch does not match
        assert!(repo.find_open("c1", "b2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_accumulate_is_additive() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.sessions();
        let session = repo.create("c1", "b1", 0).await.unwrap();

        repo.accumulate(&session.id, 22400, 2400).await.unwrap();
        repo.accumulate(&session.id, 11200, 1200).await.unwrap();

        let stored = repo.get_by_id(&session.id).await.unwrap().unwrap();
        assert_eq!(stored.total_sales_cents, 33600);
        assert_eq!(stored.total_taxes_cents, 3600);
        assert_eq!(stored.total_transactions, 2);
    }

    #[tokio::test]
    async fn test_close_guards_against_reuse() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.sessions();
        let session = repo.create("c1", "b1", 10000).await.unwrap();

        repo.accumulate(&session.id, 22400, 2400).await.unwrap();
        let closed = repo.close(&session.id, 32400).await.unwrap();
        assert_eq!(closed.status, SessionStatus::Closed);
        assert_eq!(closed.closing_cash_cents, Some(32400));
        assert!(closed.closed_at.is_some());

        // No totals accepted after close
        let err = repo.accumulate(&session.id, 100, 12).await.unwrap_err();
        assert!(matches!(err, DbError::StaleState { .. }));

        let err = repo.close(&session.id, 0).await.unwrap_err();
        assert!(matches!(err, DbError::StaleState { .. }));
    }
}
