//! # agrivet-checkout: Checkout & Order Fulfillment Workflow
//!
//! Orchestrates the commit workflow for both sales channels of the AgriVet
//! POS: the cashier checkout and the online-order lifecycle. Both settle
//! through one sale committer.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    agrivet-checkout (THIS CRATE)                        │
//! │                                                                         │
//! │  ┌──────────────────┐            ┌───────────────────────────────────┐ │
//! │  │ CheckoutService  │            │          OrderLifecycle           │ │
//! │  │  (cashier sale)  │            │  place → confirm → ready →        │ │
//! │  └────────┬─────────┘            │        complete │ cancel          │ │
//! │           │                      └────────┬──────────────────────────┘ │
//! │           │      ┌────────────────────────┤                            │
//! │           ▼      ▼                        ▼                            │
//! │  ┌──────────────────┐   ┌───────────────────┐   ┌──────────────────┐  │
//! │  │  SaleCommitter   │   │ReservationManager │   │     Notifier     │  │
//! │  │ (one commit path)│   │ (holds + checks)  │   │ (fire-and-forget)│  │
//! │  └──────────────────┘   └───────────────────┘   └──────────────────┘  │
//! │  ┌──────────────────┐   ┌───────────────────┐                         │
//! │  │StockDecrement-   │   │ SessionAggregator │                         │
//! │  │Applier (clamp)   │   │ (additive totals) │                         │
//! │  └──────────────────┘   └───────────────────┘                         │
//! │           │                                                            │
//! │           ▼                                                            │
//! │       agrivet-db (repositories) → agrivet-core (pure logic)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`checkout`] - Cashier checkout pipeline
//! - [`lifecycle`] - Online order state machine
//! - [`committer`] - The single sale-commit path
//! - [`reservation`] - Availability checks and soft holds
//! - [`stock`] - Post-commit stock decrements
//! - [`session`] - Session find-or-open, accumulate, close
//! - [`notifier`] - Customer notification port and templates
//! - [`context`] - Explicit actor/branch context
//! - [`error`] - Workflow error types

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod committer;
pub mod context;
pub mod error;
pub mod lifecycle;
pub mod notifier;
pub mod reservation;
pub mod session;
pub mod stock;

// =============================================================================
// Re-exports
// =============================================================================

pub use checkout::{CheckoutConfig, CheckoutOutcome, CheckoutRequest, CheckoutService};
pub use committer::{CommittedSale, SaleCommitter, SaleDraft, SaleLine};
pub use context::ActorContext;
pub use error::{CheckoutError, CheckoutResult, MissingItem};
pub use lifecycle::{
    CompletionOutcome, OrderLifecycle, OrderLineRequest, PlaceOrderRequest, SettlementRequest,
};
pub use notifier::{LogNotifier, Notification, NotificationKind, Notifier};
pub use reservation::{AvailabilityOutcome, AvailabilityReport, ReservationManager};
pub use session::SessionAggregator;
pub use stock::{ItemDecrementResult, StockDecrementApplier};
