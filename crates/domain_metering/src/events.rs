//! Domain events for the metering domain
//!
//! Events are returned from service operations as an explicit list; the
//! calling layer dispatches them to audit and notification collaborators.
//! There is no global event bus.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{MeterId, ReadingId};

/// Domain events emitted by metering operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MeteringEvent {
    /// A reading was captured
    ReadingCreated {
        reading_id: ReadingId,
        meter_id: MeterId,
        value: Decimal,
        reading_date: NaiveDate,
        recorded_by: String,
        timestamp: DateTime<Utc>,
    },

    /// A reading was corrected in place
    ReadingUpdated {
        reading_id: ReadingId,
        meter_id: MeterId,
        previous_value: Decimal,
        value: Decimal,
        recorded_by: String,
        timestamp: DateTime<Utc>,
    },

    /// A reading was removed
    ReadingDeleted {
        reading_id: ReadingId,
        meter_id: MeterId,
        timestamp: DateTime<Utc>,
    },

    /// A candidate reading failed validation
    ValidationFailed {
        meter_id: MeterId,
        value: Decimal,
        reading_date: NaiveDate,
        reason: String,
        timestamp: DateTime<Utc>,
    },
}
