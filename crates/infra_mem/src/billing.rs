//! In-memory bill, payment, and carry-forward stores
//!
//! The bill store keeps a (account, period) unique index so duplicate
//! generation surfaces as a conflict even when callers race past the
//! existence pre-check. The payment store enforces unique external
//! references.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use core_kernel::{AccountId, BillId, BillingPeriod, CarryForwardId, DomainPort, PaymentId, StoreError};
use domain_billing::{
    Bill, BillStore, CarryForwardBalance, CarryForwardKind, CarryForwardStore, Payment,
    PaymentAllocation, PaymentStore,
};

#[derive(Default)]
struct BillIndex {
    by_id: HashMap<BillId, Bill>,
    by_period: HashMap<(AccountId, BillingPeriod), BillId>,
}

/// Index-backed in-memory [`BillStore`]
#[derive(Default)]
pub struct InMemoryBillStore {
    inner: RwLock<BillIndex>,
}

impl InMemoryBillStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DomainPort for InMemoryBillStore {}

#[async_trait]
impl BillStore for InMemoryBillStore {
    async fn insert(&self, bill: Bill) -> Result<(), StoreError> {
        let mut index = self.inner.write().await;
        let key = (bill.account_id, bill.period);
        if index.by_period.contains_key(&key) {
            return Err(StoreError::conflict(format!(
                "bill already exists for account {} period {}",
                bill.account_id, bill.period
            )));
        }
        index.by_period.insert(key, bill.id);
        index.by_id.insert(bill.id, bill);
        Ok(())
    }

    async fn find(&self, id: BillId) -> Result<Option<Bill>, StoreError> {
        Ok(self.inner.read().await.by_id.get(&id).cloned())
    }

    async fn exists_for_period(
        &self,
        account: AccountId,
        period: BillingPeriod,
    ) -> Result<bool, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .by_period
            .contains_key(&(account, period)))
    }

    async fn outstanding_for_account(&self, account: AccountId) -> Result<Vec<Bill>, StoreError> {
        let index = self.inner.read().await;
        let mut result: Vec<Bill> = index
            .by_id
            .values()
            .filter(|bill| bill.account_id == account && bill.is_outstanding())
            .cloned()
            .collect();
        result.sort_by(|a, b| a.issued_on.cmp(&b.issued_on).then(a.id.cmp(&b.id)));
        Ok(result)
    }

    async fn save(&self, bill: Bill) -> Result<(), StoreError> {
        let mut index = self.inner.write().await;
        if !index.by_id.contains_key(&bill.id) {
            return Err(StoreError::not_found("Bill", bill.id));
        }
        index.by_id.insert(bill.id, bill);
        Ok(())
    }

    async fn save_all(&self, bills: &[Bill]) -> Result<(), StoreError> {
        let mut index = self.inner.write().await;
        for bill in bills {
            if !index.by_id.contains_key(&bill.id) {
                return Err(StoreError::not_found("Bill", bill.id));
            }
        }
        for bill in bills {
            index.by_id.insert(bill.id, bill.clone());
        }
        Ok(())
    }
}

#[derive(Default)]
struct PaymentIndex {
    by_id: HashMap<PaymentId, Payment>,
    by_reference: HashMap<String, PaymentId>,
    allocations: HashMap<PaymentId, Vec<PaymentAllocation>>,
}

/// Index-backed in-memory [`PaymentStore`]
#[derive(Default)]
pub struct InMemoryPaymentStore {
    inner: RwLock<PaymentIndex>,
}

impl InMemoryPaymentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DomainPort for InMemoryPaymentStore {}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn insert(&self, payment: Payment) -> Result<(), StoreError> {
        let mut index = self.inner.write().await;
        if let Some(reference) = &payment.external_reference {
            if index.by_reference.contains_key(reference) {
                return Err(StoreError::conflict(format!(
                    "payment with external reference '{reference}' already exists"
                )));
            }
            index.by_reference.insert(reference.clone(), payment.id);
        }
        index.by_id.insert(payment.id, payment);
        Ok(())
    }

    async fn find(&self, id: PaymentId) -> Result<Option<Payment>, StoreError> {
        Ok(self.inner.read().await.by_id.get(&id).cloned())
    }

    async fn save(&self, payment: Payment) -> Result<(), StoreError> {
        let mut index = self.inner.write().await;
        if !index.by_id.contains_key(&payment.id) {
            return Err(StoreError::not_found("Payment", payment.id));
        }
        index.by_id.insert(payment.id, payment);
        Ok(())
    }

    async fn record_allocations(
        &self,
        allocations: &[PaymentAllocation],
    ) -> Result<(), StoreError> {
        let mut index = self.inner.write().await;
        for allocation in allocations {
            index
                .allocations
                .entry(allocation.payment_id)
                .or_default()
                .push(allocation.clone());
        }
        Ok(())
    }

    async fn allocations_for(
        &self,
        payment: PaymentId,
    ) -> Result<Vec<PaymentAllocation>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .allocations
            .get(&payment)
            .cloned()
            .unwrap_or_default())
    }

    async fn remove_allocations(&self, payment: PaymentId) -> Result<(), StoreError> {
        self.inner.write().await.allocations.remove(&payment);
        Ok(())
    }
}

/// Hash-indexed in-memory [`CarryForwardStore`]
#[derive(Default)]
pub struct InMemoryCarryForwardStore {
    inner: RwLock<HashMap<CarryForwardId, CarryForwardBalance>>,
}

impl InMemoryCarryForwardStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DomainPort for InMemoryCarryForwardStore {}

#[async_trait]
impl CarryForwardStore for InMemoryCarryForwardStore {
    async fn insert(&self, entry: CarryForwardBalance) -> Result<(), StoreError> {
        let mut entries = self.inner.write().await;
        if entries.contains_key(&entry.id) {
            return Err(StoreError::conflict(format!(
                "carry-forward {} already exists",
                entry.id
            )));
        }
        entries.insert(entry.id, entry);
        Ok(())
    }

    async fn save(&self, entry: CarryForwardBalance) -> Result<(), StoreError> {
        let mut entries = self.inner.write().await;
        if !entries.contains_key(&entry.id) {
            return Err(StoreError::not_found("CarryForward", entry.id));
        }
        entries.insert(entry.id, entry);
        Ok(())
    }

    async fn find(&self, id: CarryForwardId) -> Result<Option<CarryForwardBalance>, StoreError> {
        Ok(self.inner.read().await.get(&id).cloned())
    }

    async fn active_credits(
        &self,
        account: AccountId,
    ) -> Result<Vec<CarryForwardBalance>, StoreError> {
        let entries = self.inner.read().await;
        let mut result: Vec<CarryForwardBalance> = entries
            .values()
            .filter(|entry| {
                entry.account_id == account
                    && entry.kind == CarryForwardKind::Credit
                    && entry.is_active()
            })
            .cloned()
            .collect();
        result.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(result)
    }

    async fn by_source_payment(
        &self,
        payment: PaymentId,
    ) -> Result<Vec<CarryForwardBalance>, StoreError> {
        let entries = self.inner.read().await;
        Ok(entries
            .values()
            .filter(|entry| entry.source_payment == Some(payment))
            .cloned()
            .collect())
    }

    async fn consumed_by_payment(
        &self,
        payment: PaymentId,
    ) -> Result<Vec<CarryForwardBalance>, StoreError> {
        let entries = self.inner.read().await;
        Ok(entries
            .values()
            .filter(|entry| entry.consumed_by == Some(payment))
            .cloned()
            .collect())
    }

    async fn remove(&self, id: CarryForwardId) -> Result<(), StoreError> {
        let mut entries = self.inner.write().await;
        entries
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found("CarryForward", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use core_kernel::{Currency, MeterId, Money, UnitRate};
    use domain_billing::{BillLine, PaymentMethod};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn bill(account: AccountId, month: u32, amount: Decimal) -> Bill {
        let rate = UnitRate::new(Money::new(dec!(1), Currency::USD)).unwrap();
        let line = BillLine::new(
            MeterId::new(),
            None,
            amount,
            amount,
            rate,
            Money::new(amount, Currency::USD),
        )
        .unwrap();
        Bill::new(
            account,
            BillingPeriod::new(2025, month).unwrap(),
            vec![line],
            NaiveDate::from_ymd_opt(2025, month as u32, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, month as u32, 15).unwrap(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_period_uniqueness_enforced() {
        let store = InMemoryBillStore::new();
        let account = AccountId::new();

        store.insert(bill(account, 1, dec!(100))).await.unwrap();
        let err = store.insert(bill(account, 1, dec!(200))).await.unwrap_err();
        assert!(err.is_conflict());
        assert!(store
            .exists_for_period(account, BillingPeriod::new(2025, 1).unwrap())
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_outstanding_excludes_paid_and_void() {
        let store = InMemoryBillStore::new();
        let account = AccountId::new();
        let today = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();

        let open = bill(account, 1, dec!(100));
        let mut paid = bill(account, 2, dec!(100));
        paid.record_payment(Money::new(dec!(100), Currency::USD), today)
            .unwrap();
        let mut voided = bill(account, 3, dec!(100));
        voided.void();

        store.insert(open.clone()).await.unwrap();
        store.insert(paid).await.unwrap();
        store.insert(voided).await.unwrap();

        let outstanding = store.outstanding_for_account(account).await.unwrap();
        assert_eq!(outstanding.len(), 1);
        assert_eq!(outstanding[0].id, open.id);
    }

    #[tokio::test]
    async fn test_save_replaces_a_stored_bill() {
        let store = InMemoryBillStore::new();
        let account = AccountId::new();
        let today = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();

        let mut stored = bill(account, 1, dec!(100));
        store.insert(stored.clone()).await.unwrap();

        stored
            .record_payment(Money::new(dec!(40), Currency::USD), today)
            .unwrap();
        store.save(stored.clone()).await.unwrap();

        let found = store.find(stored.id).await.unwrap().unwrap();
        assert_eq!(found.paid, Money::new(dec!(40), Currency::USD));

        let unknown = bill(account, 2, dec!(100));
        assert!(store.save(unknown).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_duplicate_external_reference_conflicts() {
        let store = InMemoryPaymentStore::new();
        let account = AccountId::new();
        let make = || {
            Payment::new(
                account,
                Money::new(dec!(10), Currency::USD),
                PaymentMethod::BankTransfer,
            )
            .unwrap()
            .with_reference("TXN-1")
        };

        store.insert(make()).await.unwrap();
        assert!(store.insert(make()).await.unwrap_err().is_conflict());
    }

    #[tokio::test]
    async fn test_allocation_round_trip() {
        let store = InMemoryPaymentStore::new();
        let payment = Payment::new(
            AccountId::new(),
            Money::new(dec!(10), Currency::USD),
            PaymentMethod::Cash,
        )
        .unwrap();
        store.insert(payment.clone()).await.unwrap();

        let allocation =
            PaymentAllocation::new(payment.id, BillId::new(), Money::new(dec!(10), Currency::USD));
        store.record_allocations(&[allocation.clone()]).await.unwrap();
        assert_eq!(store.allocations_for(payment.id).await.unwrap().len(), 1);

        store.remove_allocations(payment.id).await.unwrap();
        assert!(store.allocations_for(payment.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_active_credits_oldest_first() {
        let store = InMemoryCarryForwardStore::new();
        let account = AccountId::new();
        let period = BillingPeriod::new(2025, 1).unwrap();

        let first = CarryForwardBalance::credit(
            account,
            Money::new(dec!(50), Currency::USD),
            period,
            None,
        )
        .unwrap();
        let second = CarryForwardBalance::credit(
            account,
            Money::new(dec!(25), Currency::USD),
            period,
            None,
        )
        .unwrap();
        store.insert(first.clone()).await.unwrap();
        store.insert(second.clone()).await.unwrap();

        let credits = store.active_credits(account).await.unwrap();
        assert_eq!(credits.len(), 2);
        assert!(credits[0].created_at <= credits[1].created_at);
    }
}
