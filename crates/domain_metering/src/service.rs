//! Meter reading service
//!
//! Orchestrates reading capture, correction, and removal: meter checks,
//! validation, storage, and the domain-event list the caller dispatches to
//! audit collaborators.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;

use core_kernel::ReadingId;

use crate::error::MeteringError;
use crate::events::MeteringEvent;
use crate::ports::{MeterStore, ReadingStore};
use crate::reading::{MeterReading, NewReading, ReadingType};
use crate::validator::ReadingValidator;

/// Application service for the reading lifecycle
pub struct MeterReadingService {
    meters: Arc<dyn MeterStore>,
    readings: Arc<dyn ReadingStore>,
    validator: ReadingValidator,
}

impl MeterReadingService {
    pub fn new(meters: Arc<dyn MeterStore>, readings: Arc<dyn ReadingStore>) -> Self {
        let validator = ReadingValidator::new(Arc::clone(&readings));
        Self {
            meters,
            readings,
            validator,
        }
    }

    /// Captures a new reading
    ///
    /// The meter must exist and be active; the candidate must pass the
    /// monotonic and duplicate checks. Returns the stored reading and the
    /// events for the caller to dispatch.
    pub async fn capture(
        &self,
        input: NewReading,
    ) -> Result<(MeterReading, Vec<MeteringEvent>), MeteringError> {
        let meter = self
            .meters
            .find(input.meter_id)
            .await?
            .ok_or(MeteringError::MeterNotFound(input.meter_id))?;
        if !meter.is_active() {
            return Err(MeteringError::MeterInactive(meter.id));
        }

        if let Err(err) = self
            .validator
            .validate(input.meter_id, input.value, input.reading_date, None)
            .await
        {
            // the audit collaborator consumes the failure event from the log
            // stream; the typed error goes back to the caller
            let event = MeteringEvent::ValidationFailed {
                meter_id: input.meter_id,
                value: input.value,
                reading_date: input.reading_date,
                reason: err.to_string(),
                timestamp: Utc::now(),
            };
            tracing::warn!(?event, "reading rejected");
            return Err(err);
        }

        let reading = MeterReading::new(input)?;
        self.readings.insert(reading.clone()).await?;

        let events = vec![MeteringEvent::ReadingCreated {
            reading_id: reading.id,
            meter_id: reading.meter_id,
            value: reading.value,
            reading_date: reading.reading_date,
            recorded_by: reading.recorded_by.clone(),
            timestamp: Utc::now(),
        }];
        Ok((reading, events))
    }

    /// Corrects a stored reading's value
    ///
    /// Rejected once the reading is referenced by a bill. The correction is
    /// re-validated against the meter's history with the reading's own id
    /// excluded.
    pub async fn correct(
        &self,
        reading_id: ReadingId,
        new_value: Decimal,
        recorded_by: impl Into<String>,
    ) -> Result<(MeterReading, Vec<MeteringEvent>), MeteringError> {
        let mut reading = self.load(reading_id).await?;
        if reading.billed {
            return Err(MeteringError::ReadingBilled(reading_id.to_string()));
        }
        if new_value.is_sign_negative() {
            return Err(MeteringError::NegativeValue(new_value));
        }

        self.validator
            .validate(
                reading.meter_id,
                new_value,
                reading.reading_date,
                Some(reading_id),
            )
            .await?;

        let previous_value = reading.value;
        reading.value = new_value;
        reading.reading_type = ReadingType::Corrected;
        reading.recorded_by = recorded_by.into();
        self.readings.save(reading.clone()).await?;

        let events = vec![MeteringEvent::ReadingUpdated {
            reading_id,
            meter_id: reading.meter_id,
            previous_value,
            value: new_value,
            recorded_by: reading.recorded_by.clone(),
            timestamp: Utc::now(),
        }];
        Ok((reading, events))
    }

    /// Removes a stored reading
    ///
    /// Rejected if the reading is billed, or if a later reading on the
    /// meter exists (its consumption derivation depends on this one).
    pub async fn remove(
        &self,
        reading_id: ReadingId,
    ) -> Result<Vec<MeteringEvent>, MeteringError> {
        let reading = self.load(reading_id).await?;
        if reading.billed {
            return Err(MeteringError::ReadingBilled(reading_id.to_string()));
        }
        if self
            .readings
            .exists_after(reading.meter_id, reading.reading_date)
            .await?
        {
            return Err(MeteringError::ReadingRequiredByLater(reading_id.to_string()));
        }

        self.readings.delete(reading_id).await?;

        Ok(vec![MeteringEvent::ReadingDeleted {
            reading_id,
            meter_id: reading.meter_id,
            timestamp: Utc::now(),
        }])
    }

    async fn load(&self, reading_id: ReadingId) -> Result<MeterReading, MeteringError> {
        self.readings
            .find(reading_id)
            .await?
            .ok_or_else(|| MeteringError::ReadingNotFound(reading_id.to_string()))
    }
}
