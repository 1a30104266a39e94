//! Tariff resolution against the store, including caching

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal_macros::dec;

use core_kernel::{AccountId, Currency, Money, UnitRate};
use domain_metering::{
    Meter, MeterType, MeteringError, ReadingValidator, ReadingStore, Tariff, TariffResolver,
    TariffStore,
};
use infra_mem::{InMemoryReadingStore, InMemoryTariffStore};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn rate(price: rust_decimal::Decimal) -> UnitRate {
    UnitRate::new(Money::new(price, Currency::USD)).unwrap()
}

fn electricity_meter() -> Meter {
    Meter::new(
        AccountId::new(),
        MeterType::Electricity,
        "EL-1",
        date(2024, 1, 1),
    )
}

#[tokio::test]
async fn resolves_scoped_tariff_over_unscoped() {
    let store = Arc::new(InMemoryTariffStore::new());
    let scoped = Tariff::new(
        "electricity",
        Some(MeterType::Electricity),
        rate(dec!(0.30)),
        date(2024, 1, 1),
    );
    let unscoped = Tariff::new("all", None, rate(dec!(0.10)), date(2024, 1, 1));
    store.insert(scoped.clone()).await.unwrap();
    store.insert(unscoped).await.unwrap();

    let resolver = TariffResolver::new(store as Arc<dyn TariffStore>);
    let resolved = resolver
        .resolve(&electricity_meter(), date(2025, 1, 31))
        .await
        .unwrap();
    assert_eq!(resolved.id, scoped.id);
}

#[tokio::test]
async fn no_active_tariff_is_an_error_not_a_zero_charge() {
    let store = Arc::new(InMemoryTariffStore::new());
    let mut expired = Tariff::new("old", None, rate(dec!(0.10)), date(2020, 1, 1));
    expired.effective_to = Some(date(2020, 12, 31));
    store.insert(expired).await.unwrap();

    let resolver = TariffResolver::new(store as Arc<dyn TariffStore>);
    let result = resolver.resolve(&electricity_meter(), date(2025, 1, 31)).await;
    assert!(matches!(result, Err(MeteringError::NoTariff { .. })));
}

#[tokio::test]
async fn cache_serves_repeat_lookups_until_invalidated() {
    let store = Arc::new(InMemoryTariffStore::new());
    let original = Tariff::new("standard", None, rate(dec!(0.10)), date(2024, 1, 1));
    store.insert(original.clone()).await.unwrap();

    let resolver = TariffResolver::new(Arc::clone(&store) as Arc<dyn TariffStore>);
    let meter = electricity_meter();
    let day = date(2025, 1, 31);

    let first = resolver.resolve(&meter, day).await.unwrap();
    assert_eq!(first.id, original.id);

    // a newer tariff lands, but the cached resolution still answers
    let newer = Tariff::new("updated", None, rate(dec!(0.20)), date(2024, 6, 1));
    store.insert(newer.clone()).await.unwrap();
    let cached = resolver.resolve(&meter, day).await.unwrap();
    assert_eq!(cached.id, original.id);

    // the invalidation hook flushes it
    resolver.invalidate();
    let fresh = resolver.resolve(&meter, day).await.unwrap();
    assert_eq!(fresh.id, newer.id);
}

#[tokio::test]
async fn validator_reads_neighbors_through_the_store() {
    let readings = Arc::new(InMemoryReadingStore::new());
    let meter_id = electricity_meter().id;

    let validator = ReadingValidator::new(Arc::clone(&readings) as Arc<dyn ReadingStore>);
    // empty history: anything non-negative passes
    validator
        .validate(meter_id, dec!(100), date(2025, 1, 31), None)
        .await
        .unwrap();

    readings
        .insert(
            domain_metering::MeterReading::new(domain_metering::NewReading {
                meter_id,
                value: dec!(100),
                reading_date: date(2025, 1, 31),
                reading_type: domain_metering::ReadingType::Actual,
                recorded_by: "tester".to_string(),
                notes: None,
            })
            .unwrap(),
        )
        .await
        .unwrap();

    // same month duplicate
    let duplicate = validator
        .validate(meter_id, dec!(120), date(2025, 1, 5), None)
        .await;
    assert!(matches!(
        duplicate,
        Err(MeteringError::DuplicateReading { .. })
    ));

    // next month below the January dial
    let regression = validator
        .validate(meter_id, dec!(90), date(2025, 2, 28), None)
        .await;
    assert!(matches!(
        regression,
        Err(MeteringError::MonotonicViolation { .. })
    ));
}
