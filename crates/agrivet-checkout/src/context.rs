//! # Actor Context
//!
//! Who is acting, and where. Every workflow operation takes an explicit
//! context instead of reaching into ambient session state, so the audit
//! trails (stock movements, status history) always carry a real actor.

use serde::{Deserialize, Serialize};

/// The acting user and branch for a workflow operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorContext {
    /// Staff, cashier, or system identifier recorded in audit rows.
    pub actor_id: String,
    /// Branch whose inventory and sessions the operation touches.
    pub branch_id: String,
}

impl ActorContext {
    /// Creates a new actor context.
    pub fn new(actor_id: impl Into<String>, branch_id: impl Into<String>) -> Self {
        ActorContext {
            actor_id: actor_id.into(),
            branch_id: branch_id.into(),
        }
    }

    /// A system actor for background work (expiry sweeps).
    pub fn system(branch_id: impl Into<String>) -> Self {
        ActorContext::new("system", branch_id)
    }
}
