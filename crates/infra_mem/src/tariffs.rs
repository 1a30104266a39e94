//! In-memory tariff store

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;

use core_kernel::{DomainPort, StoreError, TariffId};
use domain_metering::{Tariff, TariffStore};

/// Hash-indexed in-memory [`TariffStore`]
#[derive(Default)]
pub struct InMemoryTariffStore {
    inner: RwLock<HashMap<TariffId, Tariff>>,
}

impl InMemoryTariffStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DomainPort for InMemoryTariffStore {}

#[async_trait]
impl TariffStore for InMemoryTariffStore {
    async fn insert(&self, tariff: Tariff) -> Result<(), StoreError> {
        let mut tariffs = self.inner.write().await;
        if tariffs.contains_key(&tariff.id) {
            return Err(StoreError::conflict(format!("tariff {} already exists", tariff.id)));
        }
        tariffs.insert(tariff.id, tariff);
        Ok(())
    }

    async fn save(&self, tariff: Tariff) -> Result<(), StoreError> {
        let mut tariffs = self.inner.write().await;
        if !tariffs.contains_key(&tariff.id) {
            return Err(StoreError::not_found("Tariff", tariff.id));
        }
        tariffs.insert(tariff.id, tariff);
        Ok(())
    }

    async fn find(&self, id: TariffId) -> Result<Option<Tariff>, StoreError> {
        Ok(self.inner.read().await.get(&id).cloned())
    }

    async fn active_covering(&self, date: NaiveDate) -> Result<Vec<Tariff>, StoreError> {
        let tariffs = self.inner.read().await;
        let mut result: Vec<Tariff> = tariffs
            .values()
            .filter(|tariff| tariff.active && tariff.covers(date))
            .cloned()
            .collect();
        result.sort_by_key(|tariff| tariff.id);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::{Currency, Money, UnitRate};
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn tariff(from: NaiveDate) -> Tariff {
        let rate = UnitRate::new(Money::new(dec!(0.25), Currency::USD)).unwrap();
        Tariff::new("standard", None, rate, from)
    }

    #[tokio::test]
    async fn test_active_covering_filters_window_and_flag() {
        let store = InMemoryTariffStore::new();

        let current = tariff(date(2024, 1, 1));
        let future = tariff(date(2026, 1, 1));
        let mut disabled = tariff(date(2024, 1, 1));
        disabled.active = false;

        store.insert(current.clone()).await.unwrap();
        store.insert(future).await.unwrap();
        store.insert(disabled).await.unwrap();

        let covering = store.active_covering(date(2025, 6, 1)).await.unwrap();
        assert_eq!(covering.len(), 1);
        assert_eq!(covering[0].id, current.id);
    }

    #[tokio::test]
    async fn test_save_replaces_and_find_round_trips() {
        let store = InMemoryTariffStore::new();
        let mut stored = tariff(date(2024, 1, 1));
        store.insert(stored.clone()).await.unwrap();

        stored.active = false;
        store.save(stored.clone()).await.unwrap();

        let found = store.find(stored.id).await.unwrap().unwrap();
        assert!(!found.active);

        let missing = tariff(date(2024, 1, 1));
        assert!(store.save(missing).await.unwrap_err().is_not_found());
    }
}
