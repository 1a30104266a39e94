//! Reading validation
//!
//! Enforces the two rules that keep a meter's reading history usable for
//! consumption derivation:
//!
//! - **Monotonic constraint**: ordered by date, values never decrease. The
//!   check is bidirectional (nearest prior and nearest following), so
//!   historical readings can be back-filled without breaking consumption
//!   figures already derived from later readings.
//! - **Duplicate prevention**: at most one reading per meter per calendar
//!   month, unless explicitly replacing one (the replaced id is excluded).
//!
//! The validator only reads; callers persist and emit audit events.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use core_kernel::{BillingPeriod, MeterId, ReadingId};

use crate::error::MeteringError;
use crate::ports::ReadingStore;
use crate::reading::MeterReading;

/// Which neighbor a monotonic violation conflicts with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationDirection {
    /// The new value is below the nearest earlier reading
    Prior,
    /// The new value is above the nearest later reading
    Following,
}

impl fmt::Display for ViolationDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationDirection::Prior => write!(f, "prior"),
            ViolationDirection::Following => write!(f, "following"),
        }
    }
}

/// Validates candidate readings against a meter's stored history
pub struct ReadingValidator {
    readings: Arc<dyn ReadingStore>,
}

impl ReadingValidator {
    pub fn new(readings: Arc<dyn ReadingStore>) -> Self {
        Self { readings }
    }

    /// Checks a candidate value/date against the meter's neighbors
    ///
    /// `exclude` names a stored reading to ignore, allowing an update to
    /// re-validate against everything but itself.
    ///
    /// # Errors
    ///
    /// - `MonotonicViolation` if the value is below the nearest prior or
    ///   above the nearest following reading
    /// - `DuplicateReading` if another reading exists in the same calendar
    ///   month
    pub async fn validate(
        &self,
        meter_id: MeterId,
        value: Decimal,
        reading_date: NaiveDate,
        exclude: Option<ReadingId>,
    ) -> Result<(), MeteringError> {
        let prior = self
            .readings
            .nearest_prior(meter_id, reading_date, exclude)
            .await?;
        let following = self
            .readings
            .nearest_following(meter_id, reading_date, exclude)
            .await?;

        check_monotonic(value, prior.as_ref(), following.as_ref())?;

        let period = BillingPeriod::containing(reading_date);
        let same_month = self.readings.in_month(meter_id, period, exclude).await?;
        if let Some(existing) = same_month.first() {
            tracing::debug!(
                meter = %meter_id,
                existing = %existing.id,
                "duplicate reading prevented for {period}"
            );
            return Err(MeteringError::DuplicateReading {
                meter_id,
                year: period.year(),
                month: period.month(),
            });
        }

        Ok(())
    }
}

/// Pure monotonic check against the two nearest neighbors
pub(crate) fn check_monotonic(
    value: Decimal,
    prior: Option<&MeterReading>,
    following: Option<&MeterReading>,
) -> Result<(), MeteringError> {
    if let Some(prior) = prior {
        if value < prior.value {
            return Err(MeteringError::MonotonicViolation {
                submitted: value,
                conflicting_value: prior.value,
                conflicting_date: prior.reading_date,
                direction: ViolationDirection::Prior,
            });
        }
    }
    if let Some(following) = following {
        if value > following.value {
            return Err(MeteringError::MonotonicViolation {
                submitted: value,
                conflicting_value: following.value,
                conflicting_date: following.reading_date,
                direction: ViolationDirection::Following,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reading::{NewReading, ReadingType};
    use rust_decimal_macros::dec;

    fn reading(value: Decimal, date: NaiveDate) -> MeterReading {
        MeterReading::new(NewReading {
            meter_id: MeterId::new(),
            value,
            reading_date: date,
            reading_type: ReadingType::Actual,
            recorded_by: "tester".to_string(),
            notes: None,
        })
        .unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_value_below_prior_fails() {
        let prior = reading(dec!(1000), date(2025, 1, 1));
        let result = check_monotonic(dec!(950), Some(&prior), None);
        assert!(matches!(
            result,
            Err(MeteringError::MonotonicViolation {
                direction: ViolationDirection::Prior,
                ..
            })
        ));
    }

    #[test]
    fn test_value_above_following_fails() {
        let following = reading(dec!(800), date(2025, 3, 1));
        let result = check_monotonic(dec!(900), None, Some(&following));
        assert!(matches!(
            result,
            Err(MeteringError::MonotonicViolation {
                direction: ViolationDirection::Following,
                ..
            })
        ));
    }

    #[test]
    fn test_backfill_between_neighbors_passes() {
        let prior = reading(dec!(500), date(2024, 12, 31));
        let following = reading(dec!(750), date(2025, 2, 28));
        assert!(check_monotonic(dec!(600), Some(&prior), Some(&following)).is_ok());
    }

    #[test]
    fn test_equal_values_pass() {
        // no consumption in the interval is valid
        let prior = reading(dec!(500), date(2024, 12, 31));
        assert!(check_monotonic(dec!(500), Some(&prior), None).is_ok());
    }

    #[test]
    fn test_no_neighbors_passes() {
        assert!(check_monotonic(dec!(0), None, None).is_ok());
    }
}
