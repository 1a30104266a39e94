//! Domain events for the billing domain
//!
//! Events are returned inside generation and reconciliation reports; the
//! calling layer dispatches them to notification and audit collaborators
//! after the core transaction has committed, so delivery failures can
//! never roll it back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{AccountId, BillId, BillingPeriod, CarryForwardId, Money, PaymentId};

/// Domain events emitted by billing operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BillingEvent {
    /// A bill was generated for an account and period
    BillGenerated {
        bill_id: BillId,
        account_id: AccountId,
        period: BillingPeriod,
        total: Money,
        timestamp: DateTime<Utc>,
    },

    /// A payment was reconciled against outstanding bills
    PaymentReconciled {
        payment_id: PaymentId,
        account_id: AccountId,
        total_allocated: Money,
        carried_forward: Option<Money>,
        timestamp: DateTime<Utc>,
    },

    /// A reconciliation was reversed
    PaymentReversed {
        payment_id: PaymentId,
        account_id: AccountId,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    /// An overpayment remainder became a carry-forward credit
    CarryForwardCreated {
        carry_forward_id: CarryForwardId,
        account_id: AccountId,
        amount: Money,
        timestamp: DateTime<Utc>,
    },

    /// A carry-forward credit was consumed by a reconciliation
    CarryForwardConsumed {
        carry_forward_id: CarryForwardId,
        payment_id: PaymentId,
        amount: Money,
        timestamp: DateTime<Utc>,
    },
}
