//! Property tests for the ledger and monotonic invariants

use proptest::prelude::*;
use rust_decimal::Decimal;

use core_kernel::{BillingPeriod, Currency, Money};
use domain_billing::BillStore;
use domain_metering::ReadingStore;
use test_utils::{
    assert_ledger_consistent, monotone_values_strategy, BillBuilder, BillingHarness, IdFixtures,
};

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("test runtime")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// allocations + carry-forward always account for the payment, and no
    /// bill balance ever goes negative
    #[test]
    fn ledger_identity_holds_for_any_payment(
        bill_minor in proptest::collection::vec(100i64..1_000_000i64, 1..5),
        payment_minor in 100i64..2_000_000i64,
    ) {
        runtime().block_on(async {
            let harness = BillingHarness::new();
            let account = IdFixtures::account_id();

            for (index, minor) in bill_minor.iter().enumerate() {
                let bill = BillBuilder::new()
                    .with_account(account)
                    .with_period(BillingPeriod::new(2025, index as u32 + 1).expect("valid period"))
                    .with_amounts(&[Decimal::new(*minor, 2)])
                    .build();
                harness.bills.insert(bill).await.expect("insert bill");
            }

            let payment = harness
                .seed_payment(account, Money::from_minor(payment_minor, Currency::USD))
                .await;
            let report = harness.engine.reconcile(payment.id).await.expect("reconcile");

            assert_ledger_consistent(&report, &payment.amount);
            for bill in &report.updated_bills {
                assert!(!bill.balance().is_negative());
                bill.verify_total().expect("total matches lines");
            }
            // allocations to one bill never exceed its total
            for bill in &report.updated_bills {
                assert!(bill.paid.amount() <= bill.total.amount());
            }
        });
    }

    /// every prefix of a monotone dial history is accepted, and the stored
    /// sequence stays monotone
    #[test]
    fn monotone_histories_are_accepted(values in monotone_values_strategy(6)) {
        runtime().block_on(async {
            let harness = BillingHarness::new();
            let meter = harness.seed_meter(IdFixtures::account_id()).await;

            for (index, value) in values.iter().enumerate() {
                let month0 = index as u32;
                let period = BillingPeriod::new(2024 + (month0 / 12) as i32, month0 % 12 + 1)
                    .expect("valid period");
                harness.seed_reading(&meter, *value, period.end_date()).await;
            }

            // walk the stored history newest-to-oldest and confirm ordering
            let mut date = BillingPeriod::new(2024, 6).expect("valid period").end_date();
            let mut previous_value = None;
            while let Some(reading) = harness
                .readings
                .nearest_prior(meter.id, date, None)
                .await
                .expect("query")
            {
                if let Some(later) = previous_value {
                    assert!(reading.value <= later, "history must be non-decreasing");
                }
                previous_value = Some(reading.value);
                date = reading.reading_date;
            }
        });
    }

    /// a value strictly below the running maximum is always rejected
    #[test]
    fn regressing_value_is_rejected(
        values in monotone_values_strategy(3),
        regress_minor in 1i64..500i64,
    ) {
        runtime().block_on(async {
            let harness = BillingHarness::new();
            let meter = harness.seed_meter(IdFixtures::account_id()).await;

            for (index, value) in values.iter().enumerate() {
                let period = BillingPeriod::new(2024, index as u32 + 1).expect("valid period");
                harness.seed_reading(&meter, *value, period.end_date()).await;
            }

            let last = values.last().expect("non-empty");
            let regressing = last - Decimal::new(regress_minor, 0);
            if regressing.is_sign_negative() {
                return;
            }
            if regressing >= *last {
                return;
            }

            let result = harness
                .reading_service
                .capture(
                    test_utils::ReadingBuilder::new()
                        .with_meter(meter.id)
                        .with_value(regressing)
                        .with_date(
                            BillingPeriod::new(2024, 4).expect("valid period").end_date(),
                        )
                        .as_input(),
                )
                .await;
            assert!(result.is_err(), "regression {regressing} after {last} must fail");
        });
    }
}
