//! Test Data Builders
//!
//! Builder patterns for constructing test data with sensible defaults.
//! Tests specify only the fields they care about.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{AccountId, BillingPeriod, Currency, MeterId, Money, UnitRate};
use domain_billing::{Bill, BillLine, Payment, PaymentMethod};
use domain_metering::{Meter, MeterReading, MeterType, NewReading, ReadingType, Tariff};

use crate::fixtures::{PeriodFixtures, StringFixtures};

/// Builder for test meters
pub struct MeterBuilder {
    account_id: AccountId,
    meter_type: MeterType,
    serial: String,
    installed_on: NaiveDate,
}

impl Default for MeterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MeterBuilder {
    pub fn new() -> Self {
        Self {
            account_id: AccountId::new(),
            meter_type: MeterType::Electricity,
            serial: StringFixtures::meter_serial(1),
            installed_on: PeriodFixtures::date(2024, 1, 1),
        }
    }

    pub fn with_account(mut self, account_id: AccountId) -> Self {
        self.account_id = account_id;
        self
    }

    pub fn with_type(mut self, meter_type: MeterType) -> Self {
        self.meter_type = meter_type;
        self
    }

    pub fn with_serial(mut self, serial: impl Into<String>) -> Self {
        self.serial = serial.into();
        self
    }

    pub fn build(self) -> Meter {
        Meter::new(self.account_id, self.meter_type, self.serial, self.installed_on)
    }
}

/// Builder for test readings
pub struct ReadingBuilder {
    meter_id: MeterId,
    value: Decimal,
    reading_date: NaiveDate,
    reading_type: ReadingType,
    recorded_by: String,
}

impl Default for ReadingBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadingBuilder {
    pub fn new() -> Self {
        Self {
            meter_id: MeterId::new(),
            value: dec!(100),
            reading_date: PeriodFixtures::period_reading_date(),
            reading_type: ReadingType::Actual,
            recorded_by: StringFixtures::recorded_by(),
        }
    }

    pub fn with_meter(mut self, meter_id: MeterId) -> Self {
        self.meter_id = meter_id;
        self
    }

    pub fn with_value(mut self, value: Decimal) -> Self {
        self.value = value;
        self
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.reading_date = date;
        self
    }

    pub fn with_type(mut self, reading_type: ReadingType) -> Self {
        self.reading_type = reading_type;
        self
    }

    /// The capture input, for driving the reading service
    pub fn as_input(self) -> NewReading {
        NewReading {
            meter_id: self.meter_id,
            value: self.value,
            reading_date: self.reading_date,
            reading_type: self.reading_type,
            recorded_by: self.recorded_by,
            notes: None,
        }
    }

    pub fn build(self) -> MeterReading {
        MeterReading::new(self.as_input()).expect("valid test reading")
    }
}

/// Builder for test tariffs
pub struct TariffBuilder {
    name: String,
    meter_type: Option<MeterType>,
    rate: UnitRate,
    effective_from: NaiveDate,
    effective_to: Option<NaiveDate>,
    is_default: bool,
}

impl Default for TariffBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TariffBuilder {
    pub fn new() -> Self {
        Self {
            name: "standard".to_string(),
            meter_type: None,
            rate: UnitRate::new(Money::new(dec!(0.25), Currency::USD)).expect("non-negative rate"),
            effective_from: PeriodFixtures::date(2024, 1, 1),
            effective_to: None,
            is_default: false,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_scope(mut self, meter_type: MeterType) -> Self {
        self.meter_type = Some(meter_type);
        self
    }

    pub fn with_rate(mut self, price: Decimal) -> Self {
        self.rate =
            UnitRate::new(Money::new(price, Currency::USD)).expect("non-negative rate");
        self
    }

    pub fn with_effective_from(mut self, date: NaiveDate) -> Self {
        self.effective_from = date;
        self
    }

    pub fn with_effective_to(mut self, date: NaiveDate) -> Self {
        self.effective_to = Some(date);
        self
    }

    pub fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }

    pub fn build(self) -> Tariff {
        let mut tariff = Tariff::new(self.name, self.meter_type, self.rate, self.effective_from);
        tariff.effective_to = self.effective_to;
        tariff.is_default = self.is_default;
        tariff
    }
}

/// Builder for test bills
pub struct BillBuilder {
    account_id: AccountId,
    period: BillingPeriod,
    line_amounts: Vec<Decimal>,
    issued_on: NaiveDate,
    due_date: NaiveDate,
}

impl Default for BillBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BillBuilder {
    pub fn new() -> Self {
        Self {
            account_id: AccountId::new(),
            period: PeriodFixtures::jan_2025(),
            line_amounts: vec![dec!(100)],
            issued_on: *crate::fixtures::TODAY,
            // far future: status derivation must not flip to Overdue under
            // the real clock unless a test asks for it
            due_date: PeriodFixtures::date(2099, 12, 31),
        }
    }

    pub fn with_account(mut self, account_id: AccountId) -> Self {
        self.account_id = account_id;
        self
    }

    pub fn with_period(mut self, period: BillingPeriod) -> Self {
        self.period = period;
        self
    }

    pub fn with_amounts(mut self, amounts: &[Decimal]) -> Self {
        self.line_amounts = amounts.to_vec();
        self
    }

    pub fn with_issued_on(mut self, date: NaiveDate) -> Self {
        self.issued_on = date;
        self
    }

    pub fn with_due_date(mut self, date: NaiveDate) -> Self {
        self.due_date = date;
        self
    }

    pub fn build(self) -> Bill {
        let rate = UnitRate::new(Money::new(dec!(1), Currency::USD)).expect("non-negative rate");
        let lines = self
            .line_amounts
            .iter()
            .map(|amount| {
                BillLine::new(
                    MeterId::new(),
                    None,
                    *amount,
                    *amount,
                    rate,
                    Money::new(*amount, Currency::USD),
                )
                .expect("valid test line")
            })
            .collect();
        Bill::new(self.account_id, self.period, lines, self.issued_on, self.due_date)
            .expect("valid test bill")
    }
}

/// Builder for test payments
pub struct PaymentBuilder {
    account_id: AccountId,
    amount: Money,
    method: PaymentMethod,
    reference: Option<String>,
    completed: bool,
}

impl Default for PaymentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PaymentBuilder {
    pub fn new() -> Self {
        Self {
            account_id: AccountId::new(),
            amount: Money::new(dec!(100), Currency::USD),
            method: PaymentMethod::BankTransfer,
            reference: None,
            completed: true,
        }
    }

    pub fn with_account(mut self, account_id: AccountId) -> Self {
        self.account_id = account_id;
        self
    }

    pub fn with_amount(mut self, amount: Decimal) -> Self {
        self.amount = Money::new(amount, Currency::USD);
        self
    }

    pub fn with_method(mut self, method: PaymentMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn pending(mut self) -> Self {
        self.completed = false;
        self
    }

    pub fn build(self) -> Payment {
        let mut payment =
            Payment::new(self.account_id, self.amount, self.method).expect("positive test payment");
        if let Some(reference) = self.reference {
            payment = payment.with_reference(reference);
        }
        if self.completed {
            payment.complete();
        }
        payment
    }
}
