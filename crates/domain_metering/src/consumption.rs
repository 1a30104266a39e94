//! Consumption derivation
//!
//! The single place consumption is computed. BillingGenerator and every
//! reporting path call into this resolver so displayed and billed figures
//! always agree.

use rust_decimal::Decimal;
use std::sync::Arc;

use crate::error::MeteringError;
use crate::ports::ReadingStore;
use crate::reading::MeterReading;

/// Derives consumption between readings, clamped at zero
pub struct ConsumptionResolver {
    readings: Arc<dyn ReadingStore>,
}

impl ConsumptionResolver {
    pub fn new(readings: Arc<dyn ReadingStore>) -> Self {
        Self { readings }
    }

    /// Consumption between a reading and its baseline
    ///
    /// `current.value - prior.value`, clamped at zero. A missing prior
    /// (first reading on the meter) yields zero consumption.
    pub fn between(current: &MeterReading, prior: Option<&MeterReading>) -> Decimal {
        match prior {
            Some(prior) => (current.value - prior.value).max(Decimal::ZERO),
            None => Decimal::ZERO,
        }
    }

    /// Consumption for a stored reading against its nearest prior by date
    pub async fn resolve(&self, current: &MeterReading) -> Result<Decimal, MeteringError> {
        let prior = self
            .readings
            .nearest_prior(current.meter_id, current.reading_date, Some(current.id))
            .await?;
        Ok(Self::between(current, prior.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reading::{NewReading, ReadingType};
    use chrono::NaiveDate;
    use core_kernel::MeterId;
    use rust_decimal_macros::dec;

    fn reading(value: Decimal, day: u32) -> MeterReading {
        MeterReading::new(NewReading {
            meter_id: MeterId::new(),
            value,
            reading_date: NaiveDate::from_ymd_opt(2025, 1, day).unwrap(),
            reading_type: ReadingType::Actual,
            recorded_by: "tester".to_string(),
            notes: None,
        })
        .unwrap()
    }

    #[test]
    fn test_consumption_is_difference() {
        let prior = reading(dec!(500), 1);
        let current = reading(dec!(750), 31);
        assert_eq!(ConsumptionResolver::between(&current, Some(&prior)), dec!(250));
    }

    #[test]
    fn test_first_reading_yields_zero() {
        let current = reading(dec!(750), 31);
        assert_eq!(ConsumptionResolver::between(&current, None), Decimal::ZERO);
    }

    #[test]
    fn test_negative_difference_clamped() {
        // only reachable with corrected history; billing must still never
        // charge negative units
        let prior = reading(dec!(800), 1);
        let current = reading(dec!(750), 31);
        assert_eq!(ConsumptionResolver::between(&current, Some(&prior)), Decimal::ZERO);
    }
}
