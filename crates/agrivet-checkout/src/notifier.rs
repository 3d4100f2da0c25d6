//! # Notifier Port
//!
//! Customer notifications for order lifecycle events.
//!
//! ## Fire and Forget
//! Notification delivery never gates a state transition. The lifecycle
//! services call [`send_best_effort`], which logs a warning on failure and
//! moves on — an order does not fail to confirm because an SMS gateway is
//! down.
//!
//! The [`Notifier`] trait is the seam for real delivery backends (SMS
//! gateway, push service). [`LogNotifier`] is the default: it writes the
//! message to the log, which is also what tests assert against.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use agrivet_core::{Money, OnlineOrder};

/// Which lifecycle event a notification announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Confirmation,
    Cancellation,
    Ready,
    Reminder,
}

/// A rendered notification ready for delivery.
#[derive(Debug, Clone)]
pub struct Notification {
    pub kind: NotificationKind,
    pub order_id: String,
    pub order_number: String,
    /// Recipient phone; delivery backends skip orders without one.
    pub phone: Option<String>,
    pub message: String,
}

/// Delivery backend for customer notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Delivers a notification. Errors are logged by the caller, never
    /// propagated into the workflow.
    async fn send(&self, notification: &Notification) -> Result<(), String>;
}

/// Default backend: logs the message instead of delivering it.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), String> {
        info!(
            order_number = %notification.order_number,
            kind = ?notification.kind,
            phone = notification.phone.as_deref().unwrap_or("-"),
            message = %notification.message,
            "Notification"
        );
        Ok(())
    }
}

/// Sends without letting a failure escape into the workflow.
pub async fn send_best_effort(notifier: &dyn Notifier, notification: Notification) {
    if let Err(reason) = notifier.send(&notification).await {
        warn!(
            order_number = %notification.order_number,
            kind = ?notification.kind,
            reason = %reason,
            "Notification delivery failed"
        );
    }
}

// =============================================================================
// Message Templates
// =============================================================================
//
// Templates are plain functions of the order so the rendered text is
// deterministic and testable.

/// Confirmation message with the estimated ready time.
pub fn confirmation_message(order: &OnlineOrder, ready_at: DateTime<Utc>) -> String {
    format!(
        "Order {} confirmed. Total: {}. Estimated ready: {}.",
        order.order_number,
        Money::from_cents(order.total_cents),
        ready_at.format("%Y-%m-%d %H:%M UTC")
    )
}

/// Cancellation message including the recorded reason.
pub fn cancellation_message(order: &OnlineOrder, reason: &str) -> String {
    format!(
        "Order {} has been cancelled. Reason: {}.",
        order.order_number, reason
    )
}

/// Ready-for-pickup message.
pub fn ready_message(order: &OnlineOrder) -> String {
    format!(
        "Order {} is ready for pickup. Total due: {}.",
        order.order_number,
        Money::from_cents(order.total_cents)
    )
}

/// Pickup reminder for orders approaching reservation expiry.
pub fn reminder_message(order: &OnlineOrder, expires_at: DateTime<Utc>) -> String {
    format!(
        "Reminder: order {} is waiting for pickup. Reserved items are held until {}.",
        order.order_number,
        expires_at.format("%Y-%m-%d %H:%M UTC")
    )
}

/// Builds a notification for an order event.
pub fn build(kind: NotificationKind, order: &OnlineOrder, message: String) -> Notification {
    Notification {
        kind,
        order_id: order.id.clone(),
        order_number: order.order_number.clone(),
        phone: order.customer_phone.clone(),
        message,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use agrivet_core::{OrderStatus, OrderType};
    use chrono::TimeZone;

    fn sample_order() -> OnlineOrder {
        let now = Utc::now();
        OnlineOrder {
            id: "o1".into(),
            order_number: "ORD-260830-abc123".into(),
            customer_id: None,
            customer_phone: Some("+639171234567".into()),
            branch_id: "b1".into(),
            order_type: OrderType::Pickup,
            status: OrderStatus::PendingConfirmation,
            subtotal_cents: 20000,
            tax_cents: 2400,
            total_cents: 22400,
            estimated_ready_at: None,
            confirmed_at: None,
            confirmed_by: None,
            ready_at: None,
            ready_by: None,
            completed_at: None,
            completed_by: None,
            cancelled_at: None,
            cancelled_by: None,
            cancellation_reason: None,
            pos_transaction_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_confirmation_template() {
        let order = sample_order();
        let ready = Utc.with_ymd_and_hms(2026, 8, 30, 10, 30, 0).unwrap();
        let msg = confirmation_message(&order, ready);
        assert_eq!(
            msg,
            "Order ORD-260830-abc123 confirmed. Total: ₱224.00. \
             Estimated ready: 2026-08-30 10:30 UTC."
        );
    }

    #[test]
    fn test_cancellation_template_includes_reason() {
        let order = sample_order();
        let msg = cancellation_message(&order, "out of stock");
        assert!(msg.contains("cancelled"));
        assert!(msg.contains("out of stock"));
    }

    #[test]
    fn test_ready_template() {
        let order = sample_order();
        let msg = ready_message(&order);
        assert!(msg.contains("ready for pickup"));
        assert!(msg.contains("₱224.00"));
    }

    #[test]
    fn test_build_carries_phone() {
        let order = sample_order();
        let n = build(NotificationKind::Ready, &order, ready_message(&order));
        assert_eq!(n.phone.as_deref(), Some("+639171234567"));
        assert_eq!(n.kind, NotificationKind::Ready);
    }

    #[tokio::test]
    async fn test_log_notifier_never_fails() {
        let order = sample_order();
        let notifier = LogNotifier;
        let n = build(NotificationKind::Ready, &order, ready_message(&order));
        assert!(notifier.send(&n).await.is_ok());
        send_best_effort(&notifier, n).await;
    }
}
