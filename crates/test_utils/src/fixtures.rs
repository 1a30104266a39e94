//! Pre-built Test Fixtures
//!
//! Ready-to-use test data for common entities. Fixtures are consistent and
//! predictable so unit tests read as scenarios, not setup.

use chrono::NaiveDate;
use core_kernel::{AccountId, BillingPeriod, Currency, MeterId, Money, PaymentId, UnitRate};
use fake::faker::company::en::CompanyName;
use fake::Fake;
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Canonical "today" used across scenario tests
pub static TODAY: Lazy<NaiveDate> = Lazy::new(|| NaiveDate::from_ymd_opt(2025, 2, 1).expect("valid date"));

/// Fixture for Money test data
pub struct MoneyFixtures;

impl MoneyFixtures {
    pub fn usd(amount: Decimal) -> Money {
        Money::new(amount, Currency::USD)
    }

    /// A standard USD amount
    pub fn usd_100() -> Money {
        Money::new(dec!(100.00), Currency::USD)
    }

    /// A typical monthly bill total
    pub fn usd_bill() -> Money {
        Money::new(dec!(62.50), Currency::USD)
    }

    pub fn usd_zero() -> Money {
        Money::zero(Currency::USD)
    }

    /// EUR amount for currency-mismatch tests
    pub fn eur_100() -> Money {
        Money::new(dec!(100.00), Currency::EUR)
    }

    /// A typical per-kWh rate
    pub fn usd_rate() -> UnitRate {
        UnitRate::new(Money::new(dec!(0.25), Currency::USD)).expect("non-negative rate")
    }
}

/// Fixture for period and date test data
pub struct PeriodFixtures;

impl PeriodFixtures {
    pub fn jan_2025() -> BillingPeriod {
        BillingPeriod::new(2025, 1).expect("valid period")
    }

    pub fn feb_2025() -> BillingPeriod {
        BillingPeriod::new(2025, 2).expect("valid period")
    }

    pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    /// End of December 2024, the usual baseline reading date
    pub fn baseline_date() -> NaiveDate {
        Self::date(2024, 12, 31)
    }

    /// End of January 2025, the usual in-period reading date
    pub fn period_reading_date() -> NaiveDate {
        Self::date(2025, 1, 31)
    }
}

/// Fixture for identifiers
pub struct IdFixtures;

impl IdFixtures {
    pub fn account_id() -> AccountId {
        AccountId::new()
    }

    pub fn meter_id() -> MeterId {
        MeterId::new()
    }

    pub fn payment_id() -> PaymentId {
        PaymentId::new()
    }
}

/// Fixture for string data
pub struct StringFixtures;

impl StringFixtures {
    /// A random account holder name
    pub fn account_name() -> String {
        CompanyName().fake()
    }

    pub fn meter_serial(n: u32) -> String {
        format!("EL-{n:04}")
    }

    pub fn recorded_by() -> String {
        "field-app".to_string()
    }
}
