//! In-memory reading store
//!
//! Readings are indexed per meter in a `BTreeMap` keyed by date, which makes
//! the neighbor queries (nearest prior/following, latest before a boundary)
//! ordinary range scans. Insertion enforces the storage-level unique
//! constraints: one reading per (meter, date) and one per (meter, calendar
//! month).

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;

use core_kernel::{BillingPeriod, DomainPort, MeterId, ReadingId, StoreError};
use domain_metering::{MeterReading, ReadingStore};

#[derive(Default)]
struct ReadingIndex {
    by_id: HashMap<ReadingId, MeterReading>,
    by_meter: HashMap<MeterId, BTreeMap<NaiveDate, ReadingId>>,
}

impl ReadingIndex {
    fn meter_index(&self, meter: MeterId) -> Option<&BTreeMap<NaiveDate, ReadingId>> {
        self.by_meter.get(&meter)
    }

    fn resolve(&self, id: &ReadingId) -> Option<MeterReading> {
        self.by_id.get(id).cloned()
    }

    fn month_occupied(
        &self,
        meter: MeterId,
        period: BillingPeriod,
        exclude: Option<ReadingId>,
    ) -> bool {
        self.meter_index(meter)
            .map(|index| {
                index
                    .range(period.start_date()..=period.end_date())
                    .any(|(_, id)| Some(*id) != exclude)
            })
            .unwrap_or(false)
    }
}

/// Index-backed in-memory [`ReadingStore`]
#[derive(Default)]
pub struct InMemoryReadingStore {
    inner: RwLock<ReadingIndex>,
}

impl InMemoryReadingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DomainPort for InMemoryReadingStore {}

#[async_trait]
impl ReadingStore for InMemoryReadingStore {
    async fn insert(&self, reading: MeterReading) -> Result<(), StoreError> {
        let mut index = self.inner.write().await;
        let period = BillingPeriod::containing(reading.reading_date);
        if index.month_occupied(reading.meter_id, period, None) {
            return Err(StoreError::conflict(format!(
                "meter {} already has a reading in {period}",
                reading.meter_id
            )));
        }
        index
            .by_meter
            .entry(reading.meter_id)
            .or_default()
            .insert(reading.reading_date, reading.id);
        index.by_id.insert(reading.id, reading);
        Ok(())
    }

    async fn save(&self, reading: MeterReading) -> Result<(), StoreError> {
        let mut index = self.inner.write().await;
        let existing = index
            .by_id
            .get(&reading.id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("Reading", reading.id))?;

        if existing.reading_date != reading.reading_date {
            let period = BillingPeriod::containing(reading.reading_date);
            if index.month_occupied(reading.meter_id, period, Some(reading.id)) {
                return Err(StoreError::conflict(format!(
                    "meter {} already has a reading in {period}",
                    reading.meter_id
                )));
            }
            if let Some(dates) = index.by_meter.get_mut(&existing.meter_id) {
                dates.remove(&existing.reading_date);
                dates.insert(reading.reading_date, reading.id);
            }
        }
        index.by_id.insert(reading.id, reading);
        Ok(())
    }

    async fn delete(&self, id: ReadingId) -> Result<(), StoreError> {
        let mut index = self.inner.write().await;
        let existing = index
            .by_id
            .remove(&id)
            .ok_or_else(|| StoreError::not_found("Reading", id))?;
        if let Some(dates) = index.by_meter.get_mut(&existing.meter_id) {
            dates.remove(&existing.reading_date);
        }
        Ok(())
    }

    async fn find(&self, id: ReadingId) -> Result<Option<MeterReading>, StoreError> {
        let index = self.inner.read().await;
        Ok(index.resolve(&id))
    }

    async fn nearest_prior(
        &self,
        meter: MeterId,
        date: NaiveDate,
        exclude: Option<ReadingId>,
    ) -> Result<Option<MeterReading>, StoreError> {
        let index = self.inner.read().await;
        Ok(index.meter_index(meter).and_then(|dates| {
            dates
                .range(..date)
                .rev()
                .find(|(_, id)| Some(**id) != exclude)
                .and_then(|(_, id)| index.resolve(id))
        }))
    }

    async fn nearest_following(
        &self,
        meter: MeterId,
        date: NaiveDate,
        exclude: Option<ReadingId>,
    ) -> Result<Option<MeterReading>, StoreError> {
        let index = self.inner.read().await;
        Ok(index.meter_index(meter).and_then(|dates| {
            dates
                .range((Bound::Excluded(date), Bound::Unbounded))
                .find(|(_, id)| Some(**id) != exclude)
                .and_then(|(_, id)| index.resolve(id))
        }))
    }

    async fn in_month(
        &self,
        meter: MeterId,
        period: BillingPeriod,
        exclude: Option<ReadingId>,
    ) -> Result<Vec<MeterReading>, StoreError> {
        let index = self.inner.read().await;
        Ok(index
            .meter_index(meter)
            .map(|dates| {
                dates
                    .range(period.start_date()..=period.end_date())
                    .filter(|(_, id)| Some(**id) != exclude)
                    .filter_map(|(_, id)| index.resolve(id))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn latest_on_or_before(
        &self,
        meter: MeterId,
        date: NaiveDate,
    ) -> Result<Option<MeterReading>, StoreError> {
        let index = self.inner.read().await;
        Ok(index.meter_index(meter).and_then(|dates| {
            dates
                .range(..=date)
                .next_back()
                .and_then(|(_, id)| index.resolve(id))
        }))
    }

    async fn latest_before(
        &self,
        meter: MeterId,
        date: NaiveDate,
    ) -> Result<Option<MeterReading>, StoreError> {
        let index = self.inner.read().await;
        Ok(index.meter_index(meter).and_then(|dates| {
            dates
                .range(..date)
                .next_back()
                .and_then(|(_, id)| index.resolve(id))
        }))
    }

    async fn exists_after(&self, meter: MeterId, date: NaiveDate) -> Result<bool, StoreError> {
        let index = self.inner.read().await;
        Ok(index
            .meter_index(meter)
            .map(|dates| {
                dates
                    .range((Bound::Excluded(date), Bound::Unbounded))
                    .next()
                    .is_some()
            })
            .unwrap_or(false))
    }

    async fn mark_billed(&self, ids: &[ReadingId]) -> Result<(), StoreError> {
        let mut index = self.inner.write().await;
        for id in ids {
            if let Some(reading) = index.by_id.get_mut(id) {
                reading.billed = true;
            }
        }
        Ok(())
    }
}
