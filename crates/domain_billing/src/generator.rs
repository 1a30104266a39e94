//! Bill generation
//!
//! Aggregates all active meters of an account over a billing period into one
//! bill with per-meter lines. The bill is assembled fully in memory and
//! verified before the single store write, so a failure on any meter (most
//! importantly an unresolvable tariff) leaves nothing behind.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use core_kernel::{AccountId, BillingPeriod, ReadingId, StoreError};
use domain_metering::{ConsumptionResolver, MeterStore, ReadingStore, TariffResolver};

use crate::bill::{Bill, BillLine};
use crate::config::BillingConfig;
use crate::error::BillingError;
use crate::events::BillingEvent;
use crate::ports::BillStore;

/// Result of a successful generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationReport {
    pub bill: Bill,
    pub events: Vec<BillingEvent>,
}

/// Generates one bill per account per billing period
pub struct BillingGenerator {
    meters: Arc<dyn MeterStore>,
    readings: Arc<dyn ReadingStore>,
    tariffs: Arc<TariffResolver>,
    bills: Arc<dyn BillStore>,
    config: BillingConfig,
}

impl BillingGenerator {
    pub fn new(
        meters: Arc<dyn MeterStore>,
        readings: Arc<dyn ReadingStore>,
        tariffs: Arc<TariffResolver>,
        bills: Arc<dyn BillStore>,
        config: BillingConfig,
    ) -> Self {
        Self {
            meters,
            readings,
            tariffs,
            bills,
            config,
        }
    }

    /// Generates the bill for an account and period
    ///
    /// For each active meter the latest reading dated within the period is
    /// priced against the period baseline (the latest reading before the
    /// period start). Generating twice for the same period is an explicit
    /// `DuplicatePeriod` error, never a second bill.
    ///
    /// # Errors
    ///
    /// - `DuplicatePeriod` if a bill exists for (account, period)
    /// - `NoReadings` if no meter has a reading in scope
    /// - `Metering(NoTariff)` if any meter lacks a resolvable tariff; the
    ///   whole generation fails and nothing persists
    pub async fn generate_for_account(
        &self,
        account_id: AccountId,
        period: BillingPeriod,
    ) -> Result<GenerationReport, BillingError> {
        if self.bills.exists_for_period(account_id, period).await? {
            return Err(BillingError::DuplicatePeriod { account_id, period });
        }

        let period_start = period.start_date();
        let period_end = period.end_date();
        let meters = self.meters.active_for_account(account_id).await?;

        let mut lines: Vec<BillLine> = Vec::new();
        let mut billed_readings: Vec<ReadingId> = Vec::new();

        for meter in &meters {
            let Some(current) = self
                .readings
                .latest_on_or_before(meter.id, period_end)
                .await?
            else {
                continue;
            };
            if current.reading_date < period_start {
                // nothing new captured this period; the reading was already
                // billed in its own period
                continue;
            }

            let baseline = self.readings.latest_before(meter.id, period_start).await?;
            let units = ConsumptionResolver::between(&current, baseline.as_ref());
            if units.is_zero() && self.config.exclude_zero_bills {
                continue;
            }

            let tariff = self.tariffs.resolve(meter, period_end).await?;
            let amount = tariff
                .rate
                .charge(units)
                .round_with(self.config.rounding_method, self.config.amount_precision);

            lines.push(BillLine::new(
                meter.id,
                baseline.as_ref().map(|r| r.value),
                current.value,
                units,
                tariff.rate,
                amount,
            )?);
            billed_readings.push(current.id);
            if let Some(baseline) = &baseline {
                billed_readings.push(baseline.id);
            }
        }

        if lines.is_empty() {
            return Err(BillingError::NoReadings { account_id, period });
        }

        let issued_on = Utc::now().date_naive();
        let due_date = issued_on + chrono::Duration::days(self.config.grace_period_days as i64);
        let bill = Bill::new(account_id, period, lines, issued_on, due_date)?;
        bill.verify_total()?;

        // the adapter's unique index backstops the pre-check under races
        self.bills.insert(bill.clone()).await.map_err(|err| match err {
            StoreError::Conflict { .. } => BillingError::DuplicatePeriod { account_id, period },
            other => BillingError::Store(other),
        })?;
        self.readings.mark_billed(&billed_readings).await?;

        tracing::info!(
            bill = %bill.id,
            account = %account_id,
            %period,
            total = %bill.total,
            lines = bill.lines.len(),
            "bill generated"
        );

        let events = vec![BillingEvent::BillGenerated {
            bill_id: bill.id,
            account_id,
            period,
            total: bill.total,
            timestamp: Utc::now(),
        }];
        Ok(GenerationReport { bill, events })
    }
}
