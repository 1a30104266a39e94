//! In-memory meter store

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use core_kernel::{AccountId, DomainPort, MeterId, StoreError};
use domain_metering::{Meter, MeterStore};

/// Hash-indexed in-memory [`MeterStore`]
#[derive(Default)]
pub struct InMemoryMeterStore {
    inner: RwLock<HashMap<MeterId, Meter>>,
}

impl InMemoryMeterStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DomainPort for InMemoryMeterStore {}

#[async_trait]
impl MeterStore for InMemoryMeterStore {
    async fn insert(&self, meter: Meter) -> Result<(), StoreError> {
        let mut meters = self.inner.write().await;
        if meters.contains_key(&meter.id) {
            return Err(StoreError::conflict(format!("meter {} already exists", meter.id)));
        }
        meters.insert(meter.id, meter);
        Ok(())
    }

    async fn find(&self, id: MeterId) -> Result<Option<Meter>, StoreError> {
        Ok(self.inner.read().await.get(&id).cloned())
    }

    async fn active_for_account(&self, account: AccountId) -> Result<Vec<Meter>, StoreError> {
        let meters = self.inner.read().await;
        let mut result: Vec<Meter> = meters
            .values()
            .filter(|meter| meter.account_id == account && meter.is_active())
            .cloned()
            .collect();
        result.sort_by_key(|meter| meter.id);
        Ok(result)
    }

    async fn save(&self, meter: Meter) -> Result<(), StoreError> {
        let mut meters = self.inner.write().await;
        if !meters.contains_key(&meter.id) {
            return Err(StoreError::not_found("Meter", meter.id));
        }
        meters.insert(meter.id, meter);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use domain_metering::MeterType;

    fn meter(account: AccountId) -> Meter {
        Meter::new(
            account,
            MeterType::Electricity,
            "EL-1",
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_active_for_account_filters_inactive() {
        let store = InMemoryMeterStore::new();
        let account = AccountId::new();

        let active = meter(account);
        let mut inactive = meter(account);
        inactive.deactivate();
        let other = meter(AccountId::new());

        store.insert(active.clone()).await.unwrap();
        store.insert(inactive).await.unwrap();
        store.insert(other).await.unwrap();

        let result = store.active_for_account(account).await.unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, active.id);
    }

    #[tokio::test]
    async fn test_double_insert_conflicts() {
        let store = InMemoryMeterStore::new();
        let m = meter(AccountId::new());
        store.insert(m.clone()).await.unwrap();
        assert!(store.insert(m).await.unwrap_err().is_conflict());
    }
}
