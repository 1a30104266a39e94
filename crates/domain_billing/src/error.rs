//! Billing domain errors
//!
//! Business-rule failures are typed; nothing here is a panic. Validation and
//! state errors recover locally, `AccountLocked` is retryable, and
//! `InvariantViolation` is the defensive catch that should never fire when
//! the other rules hold; it is checked before commit and never swallowed.

use thiserror::Error;

use core_kernel::{AccountId, BillId, BillingPeriod, Money, MoneyError, PaymentId, StoreError};
use domain_metering::MeteringError;

/// Errors that can occur in the billing domain
#[derive(Debug, Error)]
pub enum BillingError {
    /// A bill already exists for the account and period
    #[error("Bill already generated for account {account_id}, period {period}")]
    DuplicatePeriod {
        account_id: AccountId,
        period: BillingPeriod,
    },

    /// No meter on the account produced a billable line
    #[error("No readings in scope for account {account_id}, period {period}")]
    NoReadings {
        account_id: AccountId,
        period: BillingPeriod,
    },

    /// Bill not found
    #[error("Bill not found: {0}")]
    BillNotFound(BillId),

    /// The bill is void and cannot participate in reconciliation
    #[error("Bill {0} is void")]
    BillVoid(BillId),

    /// Payment not found
    #[error("Payment not found: {0}")]
    PaymentNotFound(PaymentId),

    /// Payment amounts must be positive
    #[error("Payment amount must be positive, got {0}")]
    NonPositivePayment(Money),

    /// Only completed payments are reconciled
    #[error("Payment {0} is not completed")]
    PaymentNotCompleted(PaymentId),

    /// Re-reconciling an already-reconciled payment fails fast
    #[error("Payment {0} is already reconciled")]
    AlreadyReconciled(PaymentId),

    /// Reversal requires an active allocation set
    #[error("Payment {0} is not reconciled")]
    NotReconciled(PaymentId),

    /// The configured reversal window has elapsed
    #[error("Reversal window of {window_days} days expired for payment {payment_id}")]
    ReversalWindowExpired {
        payment_id: PaymentId,
        window_days: u32,
    },

    /// The carry-forward created by this payment was consumed by a later
    /// reconciliation; a corrective entry is required instead of a reversal
    #[error("Carry-forward from payment {0} was already consumed; reversal refused")]
    CarryForwardConsumed(PaymentId),

    /// The per-account lock could not be acquired; retryable
    #[error("Account {account_id} is locked (timed out after {timeout_ms}ms)")]
    AccountLocked {
        account_id: AccountId,
        timeout_ms: u64,
    },

    /// Ledger-consistency check failed; reported loudly, never swallowed
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Metering failure during bill generation
    #[error(transparent)]
    Metering(#[from] MeteringError),

    /// Money arithmetic failure
    #[error("Money error: {0}")]
    Money(#[from] MoneyError),

    /// Storage failure
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl BillingError {
    pub(crate) fn invariant(message: impl Into<String>) -> Self {
        BillingError::InvariantViolation(message.into())
    }

    /// Returns true if the caller may retry the operation
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BillingError::AccountLocked { .. }
                | BillingError::Store(StoreError::Locked { .. })
        )
    }
}
