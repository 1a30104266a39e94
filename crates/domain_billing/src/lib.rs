//! Billing Domain - Bill Generation and Payment Reconciliation
//!
//! This crate turns validated meter data into bills and applies payments to
//! them under strict ledger-consistency guarantees:
//!
//! - A bill's total always equals the sum of its line amounts.
//! - Balances never go negative; allocations to a bill never exceed its
//!   total.
//! - For every reconciled payment, allocations + carry-forward account for
//!   the full payment amount within rounding tolerance; remainders become
//!   carry-forward credit, never vanish.
//! - Reconciliation is idempotent (re-running fails fast) and reversible
//!   (a reversal restores every touched bill and the payment exactly).
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_billing::{BillingGenerator, ReconciliationEngine};
//!
//! let report = generator.generate_for_account(account_id, period).await?;
//! let outcome = engine.reconcile(payment_id).await?;
//! assert!(outcome.remaining.is_zero() || outcome.carry_forward.is_some());
//! ```

pub mod bill;
pub mod payment;
pub mod carry_forward;
pub mod config;
pub mod allocation;
pub mod generator;
pub mod reconciliation;
pub mod ports;
pub mod events;
pub mod error;

pub use bill::{Bill, BillLine, BillStatus};
pub use payment::{Payment, PaymentAllocation, PaymentMethod, PaymentStatus, ReconciliationStatus};
pub use carry_forward::{CarryForwardBalance, CarryForwardKind, CarryForwardStatus};
pub use config::{AllocationOrder, BillingConfig, OverpaymentHandling};
pub use allocation::{strategy_for, AllocationStrategy, Fifo, Lifo, OldestDue, SmallestFirst};
pub use generator::{BillingGenerator, GenerationReport};
pub use reconciliation::{
    AccountBalanceSnapshot, ReconciliationEngine, ReconciliationReport, ReversalReport,
};
pub use ports::{AccountLock, AccountLockGuard, BillStore, CarryForwardStore, PaymentStore};
pub use events::BillingEvent;
pub use error::BillingError;
