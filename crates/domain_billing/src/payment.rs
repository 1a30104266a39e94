//! Payments and payment allocations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{AccountId, AllocationId, BillId, Money, PaymentId};

use crate::error::BillingError;

/// Payment method
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    BankTransfer,
    CreditCard,
    DebitCard,
    DirectDebit,
    Check,
    Cash,
    DigitalWallet,
}

/// Payment processing status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Payment is being processed
    Pending,
    /// Funds received; eligible for reconciliation
    Completed,
    /// Payment failed
    Failed,
    /// Payment was reversed/refunded
    Reversed,
}

/// Whether the payment's amount has been applied to bills
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconciliationStatus {
    /// No active allocations
    Unreconciled,
    /// Allocation stopped short with funds left uncarried (refund/manual
    /// overpayment handling)
    PartiallyReconciled,
    /// Fully absorbed by allocations plus carry-forward
    Reconciled,
}

/// A receipt of funds on an account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    /// Unique identifier
    pub id: PaymentId,
    /// Paying account
    pub account_id: AccountId,
    /// Payment amount, always positive
    pub amount: Money,
    /// Payment method
    pub method: PaymentMethod,
    /// External transaction id (bank ref); unique where present
    pub external_reference: Option<String>,
    /// Processing status
    pub status: PaymentStatus,
    /// Allocation state; reset to Unreconciled by reversal
    pub reconciliation: ReconciliationStatus,
    /// Payment date
    pub payment_date: DateTime<Utc>,
    /// When processing completed
    pub completed_at: Option<DateTime<Utc>>,
    /// When the active allocation set was created
    pub reconciled_at: Option<DateTime<Utc>>,
    /// Notes
    pub notes: Option<String>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

impl Payment {
    /// Creates a new pending payment
    ///
    /// # Errors
    ///
    /// Rejects non-positive amounts
    pub fn new(
        account_id: AccountId,
        amount: Money,
        method: PaymentMethod,
    ) -> Result<Self, BillingError> {
        if !amount.is_positive() {
            return Err(BillingError::NonPositivePayment(amount));
        }
        let now = Utc::now();
        Ok(Self {
            id: PaymentId::new_v7(),
            account_id,
            amount,
            method,
            external_reference: None,
            status: PaymentStatus::Pending,
            reconciliation: ReconciliationStatus::Unreconciled,
            payment_date: now,
            completed_at: None,
            reconciled_at: None,
            notes: None,
            created_at: now,
        })
    }

    /// Sets the external reference
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.external_reference = Some(reference.into());
        self
    }

    /// Marks the payment as completed
    pub fn complete(&mut self) {
        self.status = PaymentStatus::Completed;
        self.completed_at = Some(Utc::now());
    }

    /// Marks the payment as failed
    pub fn fail(&mut self, reason: &str) {
        self.status = PaymentStatus::Failed;
        self.notes = Some(reason.to_string());
    }

    /// Returns true if the payment can be reconciled
    pub fn is_reconcilable(&self) -> bool {
        self.status == PaymentStatus::Completed
            && self.reconciliation == ReconciliationStatus::Unreconciled
    }
}

/// Links a payment to a bill with the amount applied
///
/// Created only by the reconciliation engine; removed only by reversal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentAllocation {
    /// Unique identifier
    pub id: AllocationId,
    /// Source payment
    pub payment_id: PaymentId,
    /// Target bill
    pub bill_id: BillId,
    /// Amount applied
    pub amount: Money,
    /// Allocation timestamp
    pub allocated_at: DateTime<Utc>,
}

impl PaymentAllocation {
    pub fn new(payment_id: PaymentId, bill_id: BillId, amount: Money) -> Self {
        Self {
            id: AllocationId::new_v7(),
            payment_id,
            bill_id,
            amount,
            allocated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::Currency;
    use rust_decimal_macros::dec;

    fn usd(amount: rust_decimal::Decimal) -> Money {
        Money::new(amount, Currency::USD)
    }

    #[test]
    fn test_new_payment_is_pending_and_unreconciled() {
        let payment =
            Payment::new(AccountId::new(), usd(dec!(100)), PaymentMethod::BankTransfer).unwrap();
        assert_eq!(payment.status, PaymentStatus::Pending);
        assert_eq!(payment.reconciliation, ReconciliationStatus::Unreconciled);
        assert!(!payment.is_reconcilable());
    }

    #[test]
    fn test_zero_payment_rejected() {
        let result = Payment::new(AccountId::new(), usd(dec!(0)), PaymentMethod::Cash);
        assert!(matches!(result, Err(BillingError::NonPositivePayment(_))));
    }

    #[test]
    fn test_negative_payment_rejected() {
        let result = Payment::new(AccountId::new(), usd(dec!(-5)), PaymentMethod::Cash);
        assert!(result.is_err());
    }

    #[test]
    fn test_completed_payment_is_reconcilable() {
        let mut payment =
            Payment::new(AccountId::new(), usd(dec!(100)), PaymentMethod::Cash).unwrap();
        payment.complete();
        assert!(payment.is_reconcilable());
        assert!(payment.completed_at.is_some());
    }

    #[test]
    fn test_failed_payment_keeps_reason() {
        let mut payment =
            Payment::new(AccountId::new(), usd(dec!(100)), PaymentMethod::CreditCard).unwrap();
        payment.fail("card declined");
        assert_eq!(payment.status, PaymentStatus::Failed);
        assert_eq!(payment.notes.as_deref(), Some("card declined"));
    }
}
