//! Metering domain errors

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use core_kernel::{MeterId, StoreError};

use crate::validator::ViolationDirection;

/// Errors that can occur in the metering domain
#[derive(Debug, Error)]
pub enum MeteringError {
    /// A reading would break the monotonic sequence on its meter
    #[error(
        "Monotonic violation: value {submitted} conflicts with the {direction} reading \
         of {conflicting_value} on {conflicting_date}"
    )]
    MonotonicViolation {
        submitted: Decimal,
        conflicting_value: Decimal,
        conflicting_date: NaiveDate,
        direction: ViolationDirection,
    },

    /// A reading already exists for the meter in the same calendar month
    #[error("Duplicate reading: meter {meter_id} already has a reading in {year:04}-{month:02}")]
    DuplicateReading {
        meter_id: MeterId,
        year: i32,
        month: u32,
    },

    /// Reading values are dial totals and cannot be negative
    #[error("Reading value cannot be negative: {0}")]
    NegativeValue(Decimal),

    /// Meter not found
    #[error("Meter not found: {0}")]
    MeterNotFound(MeterId),

    /// Meter is not accepting readings
    #[error("Meter {0} is not active")]
    MeterInactive(MeterId),

    /// Reading not found
    #[error("Reading not found: {0}")]
    ReadingNotFound(String),

    /// The reading is referenced by a generated bill and is immutable
    #[error("Reading {0} is referenced by a bill and cannot be changed")]
    ReadingBilled(String),

    /// A later reading depends on this one for its consumption derivation
    #[error("Reading {0} has later readings depending on it and cannot be deleted")]
    ReadingRequiredByLater(String),

    /// No active tariff resolves for the meter at the given date
    #[error("No tariff found for meter {meter_id} at {date}")]
    NoTariff {
        meter_id: MeterId,
        date: NaiveDate,
    },

    /// Storage failure
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
