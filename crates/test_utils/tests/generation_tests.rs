//! Bill generation scenarios

use rust_decimal_macros::dec;

use domain_billing::{BillStore, BillingConfig, BillingError, BillingEvent};
use domain_metering::{MeteringError, ReadingStore};
use test_utils::{BillingHarness, IdFixtures, PeriodFixtures};

#[tokio::test]
async fn consumption_between_periods_is_billed() {
    let harness = BillingHarness::new();
    let account = IdFixtures::account_id();
    let meter = harness.seed_meter(account).await;
    harness.seed_tariff(dec!(0.25)).await;

    harness
        .seed_reading(&meter, dec!(500), PeriodFixtures::date(2024, 12, 31))
        .await;
    harness
        .seed_reading(&meter, dec!(750), PeriodFixtures::date(2025, 1, 31))
        .await;

    let report = harness
        .generator
        .generate_for_account(account, PeriodFixtures::jan_2025())
        .await
        .unwrap();

    let bill = &report.bill;
    assert_eq!(bill.lines.len(), 1);
    let line = &bill.lines[0];
    assert_eq!(line.units, dec!(250));
    assert_eq!(line.previous_value, Some(dec!(500)));
    assert_eq!(line.current_value, dec!(750));
    assert_eq!(line.amount.amount(), dec!(62.50));
    assert_eq!(bill.total.amount(), dec!(62.50));
    assert!(bill.verify_total().is_ok());
    assert!(matches!(
        report.events.as_slice(),
        [BillingEvent::BillGenerated { .. }]
    ));
}

#[tokio::test]
async fn first_reading_bills_zero_consumption() {
    let harness = BillingHarness::new();
    let account = IdFixtures::account_id();
    let meter = harness.seed_meter(account).await;
    harness.seed_tariff(dec!(0.25)).await;

    harness
        .seed_reading(&meter, dec!(750), PeriodFixtures::date(2025, 1, 31))
        .await;

    let report = harness
        .generator
        .generate_for_account(account, PeriodFixtures::jan_2025())
        .await
        .unwrap();

    assert_eq!(report.bill.lines[0].units, dec!(0));
    assert!(report.bill.total.is_zero());
}

#[tokio::test]
async fn zero_consumption_lines_can_be_excluded() {
    let config = BillingConfig {
        exclude_zero_bills: true,
        ..BillingConfig::default()
    };
    let harness = BillingHarness::with_config(config);
    let account = IdFixtures::account_id();
    let meter = harness.seed_meter(account).await;
    harness.seed_tariff(dec!(0.25)).await;

    harness
        .seed_reading(&meter, dec!(750), PeriodFixtures::date(2025, 1, 31))
        .await;

    let result = harness
        .generator
        .generate_for_account(account, PeriodFixtures::jan_2025())
        .await;
    assert!(matches!(result, Err(BillingError::NoReadings { .. })));
}

#[tokio::test]
async fn generating_twice_for_the_same_period_errors() {
    let harness = BillingHarness::new();
    let account = IdFixtures::account_id();
    let meter = harness.seed_meter(account).await;
    harness.seed_tariff(dec!(0.25)).await;
    harness
        .seed_reading(&meter, dec!(750), PeriodFixtures::date(2025, 1, 31))
        .await;

    harness
        .generator
        .generate_for_account(account, PeriodFixtures::jan_2025())
        .await
        .unwrap();

    let second = harness
        .generator
        .generate_for_account(account, PeriodFixtures::jan_2025())
        .await;
    assert!(matches!(second, Err(BillingError::DuplicatePeriod { .. })));

    // still exactly one bill for the period
    assert!(harness
        .bills
        .exists_for_period(account, PeriodFixtures::jan_2025())
        .await
        .unwrap());
}

#[tokio::test]
async fn missing_tariff_aborts_generation_atomically() {
    let harness = BillingHarness::new();
    let account = IdFixtures::account_id();
    let meter = harness.seed_meter(account).await;
    // no tariff seeded at all
    harness
        .seed_reading(&meter, dec!(750), PeriodFixtures::date(2025, 1, 31))
        .await;

    let result = harness
        .generator
        .generate_for_account(account, PeriodFixtures::jan_2025())
        .await;
    assert!(matches!(
        result,
        Err(BillingError::Metering(MeteringError::NoTariff { .. }))
    ));

    // nothing persisted: no bill, reading still unbilled
    assert!(!harness
        .bills
        .exists_for_period(account, PeriodFixtures::jan_2025())
        .await
        .unwrap());
    let outstanding = harness.bills.outstanding_for_account(account).await.unwrap();
    assert!(outstanding.is_empty());
}

#[tokio::test]
async fn account_without_readings_in_scope_errors() {
    let harness = BillingHarness::new();
    let account = IdFixtures::account_id();
    harness.seed_meter(account).await;
    harness.seed_tariff(dec!(0.25)).await;

    let result = harness
        .generator
        .generate_for_account(account, PeriodFixtures::jan_2025())
        .await;
    assert!(matches!(result, Err(BillingError::NoReadings { .. })));
}

#[tokio::test]
async fn multiple_meters_aggregate_into_one_bill() {
    let harness = BillingHarness::new();
    let account = IdFixtures::account_id();
    let electricity = harness.seed_meter(account).await;
    let second = harness.seed_meter(account).await;
    harness.seed_tariff(dec!(0.25)).await;

    harness
        .seed_reading(&electricity, dec!(500), PeriodFixtures::date(2024, 12, 31))
        .await;
    harness
        .seed_reading(&electricity, dec!(700), PeriodFixtures::date(2025, 1, 31))
        .await;
    harness
        .seed_reading(&second, dec!(100), PeriodFixtures::date(2024, 12, 30))
        .await;
    harness
        .seed_reading(&second, dec!(140), PeriodFixtures::date(2025, 1, 30))
        .await;

    let report = harness
        .generator
        .generate_for_account(account, PeriodFixtures::jan_2025())
        .await
        .unwrap();

    assert_eq!(report.bill.lines.len(), 2);
    // 200 * 0.25 + 40 * 0.25
    assert_eq!(report.bill.total.amount(), dec!(60.00));
    assert!(report.bill.verify_total().is_ok());
}

#[tokio::test]
async fn generated_bill_marks_readings_billed() {
    let harness = BillingHarness::new();
    let account = IdFixtures::account_id();
    let meter = harness.seed_meter(account).await;
    harness.seed_tariff(dec!(0.25)).await;
    let baseline = harness
        .seed_reading(&meter, dec!(500), PeriodFixtures::date(2024, 12, 31))
        .await;
    let current = harness
        .seed_reading(&meter, dec!(750), PeriodFixtures::date(2025, 1, 31))
        .await;

    harness
        .generator
        .generate_for_account(account, PeriodFixtures::jan_2025())
        .await
        .unwrap();

    assert!(harness.readings.find(current.id).await.unwrap().unwrap().billed);
    assert!(harness.readings.find(baseline.id).await.unwrap().unwrap().billed);
}
