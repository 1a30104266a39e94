//! Fully wired in-memory billing stack
//!
//! One call wires every in-memory store to the reading service, the bill
//! generator, and the reconciliation engine under a single configuration,
//! giving scenario tests the whole pipeline to drive end to end.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use core_kernel::{AccountId, Money};
use domain_billing::{
    AccountLock, BillStore, BillingConfig, BillingGenerator, CarryForwardStore, Payment,
    PaymentMethod, PaymentStore, ReconciliationEngine,
};
use domain_metering::{
    Meter, MeterReading, MeterReadingService, MeterStore, MeterType, NewReading, ReadingStore,
    ReadingType, Tariff, TariffResolver, TariffStore,
};
use infra_mem::{
    AccountLockRegistry, InMemoryBillStore, InMemoryCarryForwardStore, InMemoryMeterStore,
    InMemoryPaymentStore, InMemoryReadingStore, InMemoryTariffStore,
};

use crate::builders::TariffBuilder;
use crate::fixtures::StringFixtures;

/// The in-memory billing stack under one configuration
pub struct BillingHarness {
    pub meters: Arc<InMemoryMeterStore>,
    pub readings: Arc<InMemoryReadingStore>,
    pub tariffs: Arc<InMemoryTariffStore>,
    pub bills: Arc<InMemoryBillStore>,
    pub payments: Arc<InMemoryPaymentStore>,
    pub carry_forward: Arc<InMemoryCarryForwardStore>,
    pub locks: Arc<AccountLockRegistry>,
    pub resolver: Arc<TariffResolver>,
    pub reading_service: MeterReadingService,
    pub generator: BillingGenerator,
    pub engine: ReconciliationEngine,
    pub config: BillingConfig,
}

impl Default for BillingHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl BillingHarness {
    /// Harness with the default configuration
    pub fn new() -> Self {
        Self::with_config(BillingConfig::default())
    }

    /// Harness configured from `BILLING_`-prefixed environment variables,
    /// falling back to defaults
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::with_config(BillingConfig::from_env().unwrap_or_default())
    }

    pub fn with_config(config: BillingConfig) -> Self {
        let meters = Arc::new(InMemoryMeterStore::new());
        let readings = Arc::new(InMemoryReadingStore::new());
        let tariffs = Arc::new(InMemoryTariffStore::new());
        let bills = Arc::new(InMemoryBillStore::new());
        let payments = Arc::new(InMemoryPaymentStore::new());
        let carry_forward = Arc::new(InMemoryCarryForwardStore::new());
        let locks = Arc::new(AccountLockRegistry::new());

        let resolver = Arc::new(TariffResolver::new(
            Arc::clone(&tariffs) as Arc<dyn TariffStore>
        ));
        let reading_service = MeterReadingService::new(
            Arc::clone(&meters) as Arc<dyn MeterStore>,
            Arc::clone(&readings) as Arc<dyn ReadingStore>,
        );
        let generator = BillingGenerator::new(
            Arc::clone(&meters) as Arc<dyn MeterStore>,
            Arc::clone(&readings) as Arc<dyn ReadingStore>,
            Arc::clone(&resolver),
            Arc::clone(&bills) as Arc<dyn BillStore>,
            config.clone(),
        );
        let engine = ReconciliationEngine::new(
            Arc::clone(&bills) as Arc<dyn BillStore>,
            Arc::clone(&payments) as Arc<dyn PaymentStore>,
            Arc::clone(&carry_forward) as Arc<dyn CarryForwardStore>,
            Arc::clone(&locks) as Arc<dyn AccountLock>,
            config.clone(),
        );

        Self {
            meters,
            readings,
            tariffs,
            bills,
            payments,
            carry_forward,
            locks,
            resolver,
            reading_service,
            generator,
            engine,
            config,
        }
    }

    /// Seeds an active electricity meter on the account
    pub async fn seed_meter(&self, account_id: AccountId) -> Meter {
        let meter = Meter::new(
            account_id,
            MeterType::Electricity,
            StringFixtures::meter_serial(1),
            NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date"),
        );
        self.meters
            .insert(meter.clone())
            .await
            .expect("seed meter");
        meter
    }

    /// Captures a reading through the full validation path
    pub async fn seed_reading(
        &self,
        meter: &Meter,
        value: Decimal,
        date: NaiveDate,
    ) -> MeterReading {
        let (reading, _events) = self
            .reading_service
            .capture(NewReading {
                meter_id: meter.id,
                value,
                reading_date: date,
                reading_type: ReadingType::Actual,
                recorded_by: StringFixtures::recorded_by(),
                notes: None,
            })
            .await
            .expect("seed reading");
        reading
    }

    /// Seeds an unscoped tariff at the given per-unit price
    pub async fn seed_tariff(&self, price: Decimal) -> Tariff {
        let tariff = TariffBuilder::new().with_rate(price).build();
        self.tariffs
            .insert(tariff.clone())
            .await
            .expect("seed tariff");
        self.resolver.invalidate();
        tariff
    }

    /// Records a completed payment on the account
    pub async fn seed_payment(&self, account_id: AccountId, amount: Money) -> Payment {
        let mut payment = Payment::new(account_id, amount, PaymentMethod::BankTransfer)
            .expect("positive payment");
        payment.complete();
        self.payments
            .insert(payment.clone())
            .await
            .expect("seed payment");
        payment
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_env_falls_back_to_defaults() {
        let harness = BillingHarness::from_env();
        assert_eq!(harness.config.amount_precision, 2);
        assert_eq!(harness.config.lock_timeout_ms, 30_000);
    }
}
