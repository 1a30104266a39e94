//! Meter readings
//!
//! A reading is a single dial observation. Values are non-negative by
//! construction; ordering and duplicate rules are enforced by the
//! [`ReadingValidator`](crate::validator::ReadingValidator) before storage.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{MeterId, ReadingId};

use crate::error::MeteringError;

/// How a reading was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingType {
    /// Observed on the physical dial
    Actual,
    /// Estimated from history
    Estimated,
    /// Correction of an earlier capture
    Corrected,
    /// First reading at installation
    Initial,
}

/// A single meter observation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeterReading {
    /// Unique identifier
    pub id: ReadingId,
    /// Meter observed
    pub meter_id: MeterId,
    /// Dial value, non-negative
    pub value: Decimal,
    /// Observation date
    pub reading_date: NaiveDate,
    /// Capture kind
    pub reading_type: ReadingType,
    /// Who recorded it (user or system identity)
    pub recorded_by: String,
    /// Free-form notes
    pub notes: Option<String>,
    /// Set once the reading is referenced by a generated bill;
    /// billed readings are immutable
    pub billed: bool,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

impl MeterReading {
    /// Creates a reading, rejecting negative values
    pub fn new(input: NewReading) -> Result<Self, MeteringError> {
        if input.value.is_sign_negative() {
            return Err(MeteringError::NegativeValue(input.value));
        }
        Ok(Self {
            id: ReadingId::new_v7(),
            meter_id: input.meter_id,
            value: input.value,
            reading_date: input.reading_date,
            reading_type: input.reading_type,
            recorded_by: input.recorded_by,
            notes: input.notes,
            billed: false,
            created_at: Utc::now(),
        })
    }
}

/// Input for capturing a reading
#[derive(Debug, Clone)]
pub struct NewReading {
    pub meter_id: MeterId,
    pub value: Decimal,
    pub reading_date: NaiveDate,
    pub reading_type: ReadingType,
    pub recorded_by: String,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn input(value: Decimal) -> NewReading {
        NewReading {
            meter_id: MeterId::new(),
            value,
            reading_date: NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
            reading_type: ReadingType::Actual,
            recorded_by: "tester".to_string(),
            notes: None,
        }
    }

    #[test]
    fn test_new_reading_starts_unbilled() {
        let reading = MeterReading::new(input(dec!(750))).unwrap();
        assert!(!reading.billed);
        assert_eq!(reading.value, dec!(750));
    }

    #[test]
    fn test_negative_value_rejected() {
        let result = MeterReading::new(input(dec!(-1)));
        assert!(matches!(result, Err(MeteringError::NegativeValue(_))));
    }

    #[test]
    fn test_zero_value_allowed() {
        // a brand new meter legitimately starts at zero
        assert!(MeterReading::new(input(dec!(0))).is_ok());
    }
}
