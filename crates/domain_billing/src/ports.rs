//! Billing repository ports
//!
//! Port traits for bill, payment, and carry-forward persistence plus the
//! per-account lock. Adapters enforce the (account, period) unique
//! constraint on bills and provide atomic multi-row writes.

use std::any::Any;
use std::time::Duration;

use async_trait::async_trait;

use core_kernel::{AccountId, BillId, BillingPeriod, CarryForwardId, DomainPort, PaymentId, StoreError};

use crate::bill::Bill;
use crate::carry_forward::CarryForwardBalance;
use crate::payment::{Payment, PaymentAllocation};

/// Bill persistence
#[async_trait]
pub trait BillStore: DomainPort {
    /// Inserts a bill with its lines in one atomic write; surfaces
    /// `Conflict` if a bill already exists for (account, period)
    async fn insert(&self, bill: Bill) -> Result<(), StoreError>;

    async fn find(&self, id: BillId) -> Result<Option<Bill>, StoreError>;

    async fn exists_for_period(
        &self,
        account: AccountId,
        period: BillingPeriod,
    ) -> Result<bool, StoreError>;

    /// Bills with a positive balance that are neither void nor disputed,
    /// ordered by issue date then id
    async fn outstanding_for_account(&self, account: AccountId) -> Result<Vec<Bill>, StoreError>;

    async fn save(&self, bill: Bill) -> Result<(), StoreError>;

    /// Saves a batch of bills as one write
    async fn save_all(&self, bills: &[Bill]) -> Result<(), StoreError>;
}

/// Payment and allocation persistence
#[async_trait]
pub trait PaymentStore: DomainPort {
    /// Inserts a payment; surfaces `Conflict` on a duplicate external
    /// reference
    async fn insert(&self, payment: Payment) -> Result<(), StoreError>;

    async fn find(&self, id: PaymentId) -> Result<Option<Payment>, StoreError>;

    async fn save(&self, payment: Payment) -> Result<(), StoreError>;

    /// Stores the allocation set produced by one reconciliation
    async fn record_allocations(
        &self,
        allocations: &[PaymentAllocation],
    ) -> Result<(), StoreError>;

    async fn allocations_for(
        &self,
        payment: PaymentId,
    ) -> Result<Vec<PaymentAllocation>, StoreError>;

    /// Removes a payment's allocation set; used by reversal
    async fn remove_allocations(&self, payment: PaymentId) -> Result<(), StoreError>;
}

/// Carry-forward persistence
#[async_trait]
pub trait CarryForwardStore: DomainPort {
    async fn insert(&self, entry: CarryForwardBalance) -> Result<(), StoreError>;

    async fn save(&self, entry: CarryForwardBalance) -> Result<(), StoreError>;

    async fn find(&self, id: CarryForwardId) -> Result<Option<CarryForwardBalance>, StoreError>;

    /// Active credit entries on the account, oldest first
    async fn active_credits(
        &self,
        account: AccountId,
    ) -> Result<Vec<CarryForwardBalance>, StoreError>;

    /// Entries created by the given payment's reconciliation
    async fn by_source_payment(
        &self,
        payment: PaymentId,
    ) -> Result<Vec<CarryForwardBalance>, StoreError>;

    /// Entries consumed by the given payment's reconciliation
    async fn consumed_by_payment(
        &self,
        payment: PaymentId,
    ) -> Result<Vec<CarryForwardBalance>, StoreError>;

    async fn remove(&self, id: CarryForwardId) -> Result<(), StoreError>;
}

/// Serializes mutations per account
///
/// All writes to one account's bills, payments, and carry-forward entries
/// happen under this lock. Acquisition is bounded; expiry surfaces as the
/// retryable `StoreError::Locked`.
#[async_trait]
pub trait AccountLock: DomainPort {
    async fn acquire(
        &self,
        account: AccountId,
        timeout: Duration,
    ) -> Result<AccountLockGuard, StoreError>;
}

/// Holds a per-account lock until dropped
pub struct AccountLockGuard {
    _inner: Box<dyn Any + Send>,
}

impl AccountLockGuard {
    /// Wraps an adapter-specific guard object
    pub fn new(inner: impl Any + Send) -> Self {
        Self {
            _inner: Box::new(inner),
        }
    }
}

impl std::fmt::Debug for AccountLockGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountLockGuard").finish_non_exhaustive()
    }
}
