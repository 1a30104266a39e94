//! Payment reconciliation
//!
//! The engine walks an ordered list of outstanding bills and applies a
//! completed payment to them, consuming active carry-forward credit first
//! when configured, and carrying any remainder forward as new credit.
//!
//! Per payment the state machine is
//! `Unreconciled → Reconciled` (or `PartiallyReconciled` when funds are
//! left uncarried under refund/manual handling), with
//! `Reconciled|PartiallyReconciled → reverse → Unreconciled`.
//!
//! Every mutation for one account happens under that account's lock, and
//! the ledger identity (allocations + carry-forward + residual = payment +
//! consumed credit) is checked before anything is written.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{AccountId, BillingPeriod, CarryForwardId, Money, PaymentId, StoreError};

use crate::allocation::{strategy_for, AllocationStrategy};
use crate::bill::{Bill, AMOUNT_TOLERANCE};
use crate::carry_forward::{CarryForwardBalance, CarryForwardStatus};
use crate::config::{BillingConfig, OverpaymentHandling};
use crate::error::BillingError;
use crate::events::BillingEvent;
use crate::payment::{Payment, PaymentAllocation, PaymentStatus, ReconciliationStatus};
use crate::ports::{AccountLock, AccountLockGuard, BillStore, CarryForwardStore, PaymentStore};

/// Account position after an engine operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountBalanceSnapshot {
    pub account_id: AccountId,
    /// Sum of outstanding bill balances
    pub outstanding_total: Money,
    /// Sum of active carry-forward credits
    pub active_credit_total: Money,
    pub taken_at: DateTime<Utc>,
}

/// Result of a successful reconciliation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationReport {
    pub payment_id: PaymentId,
    pub allocations: Vec<PaymentAllocation>,
    pub total_allocated: Money,
    /// Funds left after the allocation walk, before carry-forward
    pub remaining: Money,
    /// Carry-forward credit consumed into the walk
    pub consumed_credit: Money,
    /// Credit created for the remainder, when carry-forward handling applies
    pub carry_forward: Option<CarryForwardBalance>,
    pub updated_bills: Vec<Bill>,
    pub snapshot: AccountBalanceSnapshot,
    pub events: Vec<BillingEvent>,
}

/// Result of a successful reversal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReversalReport {
    pub payment_id: PaymentId,
    pub reverted_allocations: Vec<PaymentAllocation>,
    pub restored_bills: Vec<Bill>,
    pub removed_carry_forward: Vec<CarryForwardId>,
    pub restored_credits: Vec<CarryForwardId>,
    pub events: Vec<BillingEvent>,
}

/// Allocates payments to outstanding bills and maintains carry-forward
pub struct ReconciliationEngine {
    bills: Arc<dyn BillStore>,
    payments: Arc<dyn PaymentStore>,
    carry_forward: Arc<dyn CarryForwardStore>,
    locks: Arc<dyn AccountLock>,
    strategy: Box<dyn AllocationStrategy>,
    config: BillingConfig,
}

impl ReconciliationEngine {
    pub fn new(
        bills: Arc<dyn BillStore>,
        payments: Arc<dyn PaymentStore>,
        carry_forward: Arc<dyn CarryForwardStore>,
        locks: Arc<dyn AccountLock>,
        config: BillingConfig,
    ) -> Self {
        let strategy = strategy_for(config.allocation_strategy);
        Self {
            bills,
            payments,
            carry_forward,
            locks,
            strategy,
            config,
        }
    }

    /// Reconciles a completed payment against the account's outstanding bills
    ///
    /// Idempotent in the fail-fast sense: invoking it again for an already
    /// reconciled payment returns `AlreadyReconciled` and changes nothing.
    ///
    /// # Errors
    ///
    /// - `PaymentNotCompleted` / `AlreadyReconciled` on state violations
    /// - `AccountLocked` when the per-account lock times out (retryable)
    /// - `InvariantViolation` if the ledger identity fails pre-commit
    pub async fn reconcile(
        &self,
        payment_id: PaymentId,
    ) -> Result<ReconciliationReport, BillingError> {
        let account_id = self.load_payment(payment_id).await?.account_id;
        let _guard = self.lock(account_id).await?;

        // state is checked under the lock: a concurrent reconciliation of
        // the same payment must fail fast, not double-allocate
        let mut payment = self.load_payment(payment_id).await?;
        if payment.status != PaymentStatus::Completed {
            return Err(BillingError::PaymentNotCompleted(payment_id));
        }
        if payment.reconciliation != ReconciliationStatus::Unreconciled {
            return Err(BillingError::AlreadyReconciled(payment_id));
        }

        let outstanding = self.bills.outstanding_for_account(account_id).await?;
        let ordered = self.strategy.order(outstanding);
        let currency = payment.amount.currency();
        let today = Utc::now().date_naive();

        // Consume active credit first so it increases the funds the walk
        // can allocate. Unused funds re-emerge as a fresh credit below.
        let mut consumed_credits: Vec<CarryForwardBalance> = Vec::new();
        let mut consumed_credit = Money::zero(currency);
        let mut available = payment.amount;
        if self.config.apply_credit_before_allocation {
            for mut credit in self.carry_forward.active_credits(account_id).await? {
                let taken = credit.consume(payment_id)?;
                consumed_credit = consumed_credit.checked_add(&taken)?;
                available = available.checked_add(&taken)?;
                consumed_credits.push(credit);
            }
        }

        let mut remaining = available;
        let mut allocations: Vec<PaymentAllocation> = Vec::new();
        let mut updated_bills: Vec<Bill> = Vec::new();
        for mut bill in ordered {
            if remaining.amount() < self.config.minimum_allocation {
                break;
            }
            let slice = remaining.min(&bill.balance())?;
            if !slice.is_positive() {
                continue;
            }
            bill.record_payment(slice, today)?;
            remaining = remaining.checked_sub(&slice)?;
            tracing::debug!(
                payment = %payment_id,
                bill = %bill.id,
                amount = %slice,
                remaining = %remaining,
                strategy = self.strategy.name(),
                "allocated"
            );
            allocations.push(PaymentAllocation::new(payment_id, bill.id, slice));
            updated_bills.push(bill);
        }

        let mut total_allocated = Money::zero(currency);
        for allocation in &allocations {
            total_allocated = total_allocated.checked_add(&allocation.amount)?;
        }

        let carry_forward = if remaining.amount() > self.config.carry_forward_minimum
            && self.config.overpayment_handling == OverpaymentHandling::CarryForward
        {
            Some(CarryForwardBalance::credit(
                account_id,
                remaining,
                BillingPeriod::containing(today),
                Some(payment_id),
            )?)
        } else {
            None
        };
        let carried = carry_forward
            .as_ref()
            .map(|entry| entry.amount)
            .unwrap_or_else(|| Money::zero(currency));
        let residual = remaining.checked_sub(&carried)?;

        payment.reconciliation = if residual.amount() <= AMOUNT_TOLERANCE {
            ReconciliationStatus::Reconciled
        } else {
            // funds left uncarried under refund/manual handling
            ReconciliationStatus::PartiallyReconciled
        };
        payment.reconciled_at = Some(Utc::now());

        self.verify_ledger(&payment, &total_allocated, &carried, &residual, &consumed_credit)?;
        for bill in &updated_bills {
            bill.verify_total()?;
        }

        for credit in &consumed_credits {
            self.carry_forward.save(credit.clone()).await?;
        }
        if let Some(entry) = &carry_forward {
            self.carry_forward.insert(entry.clone()).await?;
        }
        self.payments.record_allocations(&allocations).await?;
        self.bills.save_all(&updated_bills).await?;
        self.payments.save(payment.clone()).await?;

        let snapshot = self.snapshot(account_id, currency).await?;
        let now = Utc::now();
        let mut events = vec![BillingEvent::PaymentReconciled {
            payment_id,
            account_id,
            total_allocated,
            carried_forward: carry_forward.as_ref().map(|entry| entry.amount),
            timestamp: now,
        }];
        for credit in &consumed_credits {
            events.push(BillingEvent::CarryForwardConsumed {
                carry_forward_id: credit.id,
                payment_id,
                amount: credit.amount,
                timestamp: now,
            });
        }
        if let Some(entry) = &carry_forward {
            events.push(BillingEvent::CarryForwardCreated {
                carry_forward_id: entry.id,
                account_id,
                amount: entry.amount,
                timestamp: now,
            });
        }

        tracing::info!(
            payment = %payment_id,
            account = %account_id,
            allocated = %total_allocated,
            carried = %carried,
            bills = updated_bills.len(),
            "payment reconciled"
        );

        Ok(ReconciliationReport {
            payment_id,
            allocations,
            total_allocated,
            remaining,
            consumed_credit,
            carry_forward,
            updated_bills,
            snapshot,
            events,
        })
    }

    /// Reconciles the payment only when `auto_reconcile` is configured
    pub async fn maybe_auto_reconcile(
        &self,
        payment_id: PaymentId,
    ) -> Result<Option<ReconciliationReport>, BillingError> {
        if !self.config.auto_reconcile {
            return Ok(None);
        }
        self.reconcile(payment_id).await.map(Some)
    }

    /// Reverses a reconciliation, restoring bills, credits, and the payment
    ///
    /// Refused when the carry-forward this reconciliation created was
    /// already consumed by a later one; a corrective entry is required
    /// instead.
    pub async fn reverse(
        &self,
        payment_id: PaymentId,
        reason: impl Into<String>,
    ) -> Result<ReversalReport, BillingError> {
        let reason = reason.into();
        let account_id = self.load_payment(payment_id).await?.account_id;
        let _guard = self.lock(account_id).await?;

        let mut payment = self.load_payment(payment_id).await?;
        if payment.reconciliation == ReconciliationStatus::Unreconciled {
            return Err(BillingError::NotReconciled(payment_id));
        }
        if let (Some(window_days), Some(reconciled_at)) =
            (self.config.reversal_window_days, payment.reconciled_at)
        {
            let deadline = reconciled_at + chrono::Duration::days(window_days as i64);
            if Utc::now() > deadline {
                return Err(BillingError::ReversalWindowExpired {
                    payment_id,
                    window_days,
                });
            }
        }

        let created = self.carry_forward.by_source_payment(payment_id).await?;
        if created
            .iter()
            .any(|entry| entry.status == CarryForwardStatus::Consumed)
        {
            return Err(BillingError::CarryForwardConsumed(payment_id));
        }

        let allocations = self.payments.allocations_for(payment_id).await?;
        let today = Utc::now().date_naive();
        let mut restored_bills: Vec<Bill> = Vec::new();
        for allocation in &allocations {
            let mut bill = self
                .bills
                .find(allocation.bill_id)
                .await?
                .ok_or(BillingError::BillNotFound(allocation.bill_id))?;
            bill.revert_payment(allocation.amount, today)?;
            restored_bills.push(bill);
        }

        let mut restored_credits: Vec<CarryForwardBalance> = Vec::new();
        for mut credit in self.carry_forward.consumed_by_payment(payment_id).await? {
            credit.restore();
            restored_credits.push(credit);
        }

        self.payments.remove_allocations(payment_id).await?;
        self.bills.save_all(&restored_bills).await?;
        for entry in &created {
            self.carry_forward.remove(entry.id).await?;
        }
        for credit in &restored_credits {
            self.carry_forward.save(credit.clone()).await?;
        }
        payment.reconciliation = ReconciliationStatus::Unreconciled;
        payment.reconciled_at = None;
        self.payments.save(payment.clone()).await?;

        tracing::info!(
            payment = %payment_id,
            account = %account_id,
            allocations = allocations.len(),
            %reason,
            "reconciliation reversed"
        );

        let events = vec![BillingEvent::PaymentReversed {
            payment_id,
            account_id,
            reason,
            timestamp: Utc::now(),
        }];
        Ok(ReversalReport {
            payment_id,
            reverted_allocations: allocations,
            restored_bills,
            removed_carry_forward: created.iter().map(|entry| entry.id).collect(),
            restored_credits: restored_credits.iter().map(|entry| entry.id).collect(),
            events,
        })
    }

    async fn load_payment(&self, payment_id: PaymentId) -> Result<Payment, BillingError> {
        self.payments
            .find(payment_id)
            .await?
            .ok_or(BillingError::PaymentNotFound(payment_id))
    }

    async fn lock(&self, account_id: AccountId) -> Result<AccountLockGuard, BillingError> {
        self.locks
            .acquire(account_id, Duration::from_millis(self.config.lock_timeout_ms))
            .await
            .map_err(|err| match err {
                StoreError::Locked { timeout_ms, .. } => BillingError::AccountLocked {
                    account_id,
                    timeout_ms,
                },
                other => BillingError::Store(other),
            })
    }

    /// Ledger identity: allocations + carry-forward + residual must equal
    /// payment + consumed credit within tolerance
    fn verify_ledger(
        &self,
        payment: &Payment,
        total_allocated: &Money,
        carried: &Money,
        residual: &Money,
        consumed_credit: &Money,
    ) -> Result<(), BillingError> {
        let accounted = total_allocated
            .checked_add(carried)?
            .checked_add(residual)?;
        let expected = payment.amount.checked_add(consumed_credit)?;
        let diff = accounted.checked_sub(&expected)?.amount().abs();
        if diff > AMOUNT_TOLERANCE {
            return Err(BillingError::invariant(format!(
                "allocation sum mismatch for payment {}: accounted {accounted}, expected {expected}",
                payment.id
            )));
        }
        Ok(())
    }

    async fn snapshot(
        &self,
        account_id: AccountId,
        currency: core_kernel::Currency,
    ) -> Result<AccountBalanceSnapshot, BillingError> {
        let mut outstanding_total = Money::zero(currency);
        for bill in self.bills.outstanding_for_account(account_id).await? {
            outstanding_total = outstanding_total.checked_add(&bill.balance())?;
        }
        let mut active_credit_total = Money::zero(currency);
        for credit in self.carry_forward.active_credits(account_id).await? {
            active_credit_total = active_credit_total.checked_add(&credit.amount)?;
        }
        Ok(AccountBalanceSnapshot {
            account_id,
            outstanding_total,
            active_credit_total,
            taken_at: Utc::now(),
        })
    }
}
