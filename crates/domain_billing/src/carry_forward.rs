//! Carry-forward balances
//!
//! A carry-forward entry holds a credit (overpayment remainder) or a debit
//! (tracked debt) on an account across billing periods. Credits are consumed
//! whole by a later reconciliation; any unused portion of the combined funds
//! re-emerges as a fresh credit from that reconciliation, keeping every
//! entry's lifecycle a single create/consume pair that reversal can undo.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{AccountId, BillingPeriod, CarryForwardId, Money, PaymentId};

use crate::error::BillingError;

/// Credit or debit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CarryForwardKind {
    /// Funds owed to the account
    Credit,
    /// Debt tracked on the account
    Debit,
}

/// Lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CarryForwardStatus {
    /// Available to future reconciliations
    Active,
    /// Used up by a reconciliation
    Consumed,
    /// Lapsed per configuration
    Expired,
}

/// A credit or debit carried across billing periods
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarryForwardBalance {
    /// Unique identifier
    pub id: CarryForwardId,
    /// Owning account
    pub account_id: AccountId,
    /// Amount, always positive; the kind carries the sign
    pub amount: Money,
    /// Credit or debit
    pub kind: CarryForwardKind,
    /// Payment whose reconciliation created this entry
    pub source_payment: Option<PaymentId>,
    /// Billing period context at creation
    pub period: BillingPeriod,
    /// Lifecycle status
    pub status: CarryForwardStatus,
    /// Payment whose reconciliation consumed this entry
    pub consumed_by: Option<PaymentId>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Consumed timestamp
    pub consumed_at: Option<DateTime<Utc>>,
}

impl CarryForwardBalance {
    /// Creates an active credit
    ///
    /// # Errors
    ///
    /// Rejects non-positive amounts
    pub fn credit(
        account_id: AccountId,
        amount: Money,
        period: BillingPeriod,
        source_payment: Option<PaymentId>,
    ) -> Result<Self, BillingError> {
        Self::new(account_id, amount, CarryForwardKind::Credit, period, source_payment)
    }

    /// Creates an active debit
    pub fn debit(
        account_id: AccountId,
        amount: Money,
        period: BillingPeriod,
    ) -> Result<Self, BillingError> {
        Self::new(account_id, amount, CarryForwardKind::Debit, period, None)
    }

    fn new(
        account_id: AccountId,
        amount: Money,
        kind: CarryForwardKind,
        period: BillingPeriod,
        source_payment: Option<PaymentId>,
    ) -> Result<Self, BillingError> {
        if !amount.is_positive() {
            return Err(BillingError::invariant(format!(
                "carry-forward amount must be positive, got {amount}"
            )));
        }
        Ok(Self {
            id: CarryForwardId::new_v7(),
            account_id,
            amount,
            kind,
            source_payment,
            period,
            status: CarryForwardStatus::Active,
            consumed_by: None,
            created_at: Utc::now(),
            consumed_at: None,
        })
    }

    /// Returns true if the entry can be consumed
    pub fn is_active(&self) -> bool {
        self.status == CarryForwardStatus::Active
    }

    /// Consumes the whole entry, recording the consuming payment
    ///
    /// Returns the consumed amount.
    ///
    /// # Errors
    ///
    /// Fails if the entry is not active
    pub fn consume(&mut self, by: PaymentId) -> Result<Money, BillingError> {
        if !self.is_active() {
            return Err(BillingError::invariant(format!(
                "carry-forward {} is not active",
                self.id
            )));
        }
        self.status = CarryForwardStatus::Consumed;
        self.consumed_by = Some(by);
        self.consumed_at = Some(Utc::now());
        Ok(self.amount)
    }

    /// Restores a consumed entry to active; used by reversal
    pub fn restore(&mut self) {
        self.status = CarryForwardStatus::Active;
        self.consumed_by = None;
        self.consumed_at = None;
    }

    /// Expires an active entry per configuration
    pub fn expire(&mut self) {
        if self.is_active() {
            self.status = CarryForwardStatus::Expired;
        }
    }
}
