//! Metering repository ports
//!
//! Port traits for meter, reading, and tariff persistence. Adapters enforce
//! the storage-level unique constraints: one reading per (meter, calendar
//! month) and one reading per (meter, date).

use async_trait::async_trait;
use chrono::NaiveDate;

use core_kernel::{AccountId, BillingPeriod, DomainPort, MeterId, ReadingId, StoreError, TariffId};

use crate::meter::Meter;
use crate::reading::MeterReading;
use crate::tariff::Tariff;

/// Meter persistence
#[async_trait]
pub trait MeterStore: DomainPort {
    async fn insert(&self, meter: Meter) -> Result<(), StoreError>;

    async fn find(&self, id: MeterId) -> Result<Option<Meter>, StoreError>;

    /// Active meters on the account, ordered by id for deterministic billing
    async fn active_for_account(&self, account: AccountId) -> Result<Vec<Meter>, StoreError>;

    async fn save(&self, meter: Meter) -> Result<(), StoreError>;
}

/// Reading persistence with date-indexed neighbor queries
#[async_trait]
pub trait ReadingStore: DomainPort {
    /// Inserts a reading; surfaces `Conflict` if the (meter, calendar-month)
    /// or (meter, date) unique constraints are violated
    async fn insert(&self, reading: MeterReading) -> Result<(), StoreError>;

    /// Replaces a stored reading
    async fn save(&self, reading: MeterReading) -> Result<(), StoreError>;

    async fn delete(&self, id: ReadingId) -> Result<(), StoreError>;

    async fn find(&self, id: ReadingId) -> Result<Option<MeterReading>, StoreError>;

    /// Nearest reading strictly before `date` on the meter
    async fn nearest_prior(
        &self,
        meter: MeterId,
        date: NaiveDate,
        exclude: Option<ReadingId>,
    ) -> Result<Option<MeterReading>, StoreError>;

    /// Nearest reading strictly after `date` on the meter
    async fn nearest_following(
        &self,
        meter: MeterId,
        date: NaiveDate,
        exclude: Option<ReadingId>,
    ) -> Result<Option<MeterReading>, StoreError>;

    /// All readings for the meter inside the calendar month
    async fn in_month(
        &self,
        meter: MeterId,
        period: BillingPeriod,
        exclude: Option<ReadingId>,
    ) -> Result<Vec<MeterReading>, StoreError>;

    /// Latest reading dated on or before `date`
    async fn latest_on_or_before(
        &self,
        meter: MeterId,
        date: NaiveDate,
    ) -> Result<Option<MeterReading>, StoreError>;

    /// Latest reading dated strictly before `date`
    async fn latest_before(
        &self,
        meter: MeterId,
        date: NaiveDate,
    ) -> Result<Option<MeterReading>, StoreError>;

    /// True if any reading on the meter is dated after `date`
    async fn exists_after(&self, meter: MeterId, date: NaiveDate) -> Result<bool, StoreError>;

    /// Flags readings as referenced by a generated bill
    async fn mark_billed(&self, ids: &[ReadingId]) -> Result<(), StoreError>;
}

/// Tariff persistence
#[async_trait]
pub trait TariffStore: DomainPort {
    async fn insert(&self, tariff: Tariff) -> Result<(), StoreError>;

    async fn save(&self, tariff: Tariff) -> Result<(), StoreError>;

    async fn find(&self, id: TariffId) -> Result<Option<Tariff>, StoreError>;

    /// All active tariffs whose effective window covers `date`
    async fn active_covering(&self, date: NaiveDate) -> Result<Vec<Tariff>, StoreError>;
}
