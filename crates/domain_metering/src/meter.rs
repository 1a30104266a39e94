//! Metering points
//!
//! A meter belongs to exactly one account and accumulates readings over its
//! lifetime. Meters with billing history are deactivated or replaced, never
//! deleted.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{AccountId, MeterId};

/// The utility a meter measures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeterType {
    Electricity,
    Water,
    Gas,
    Heating,
}

/// Meter lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeterStatus {
    /// In service, readings accepted
    Active,
    /// Taken out of service
    Inactive,
    /// Superseded by a replacement meter
    Replaced,
    /// Flagged faulty; readings are suspect
    Faulty,
}

/// A metering point
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meter {
    /// Unique identifier
    pub id: MeterId,
    /// Owning account
    pub account_id: AccountId,
    /// Utility measured
    pub meter_type: MeterType,
    /// Lifecycle status
    pub status: MeterStatus,
    /// Physical serial number
    pub serial: String,
    /// Installation date
    pub installed_on: NaiveDate,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

impl Meter {
    /// Creates a new active meter
    pub fn new(
        account_id: AccountId,
        meter_type: MeterType,
        serial: impl Into<String>,
        installed_on: NaiveDate,
    ) -> Self {
        Self {
            id: MeterId::new_v7(),
            account_id,
            meter_type,
            status: MeterStatus::Active,
            serial: serial.into(),
            installed_on,
            created_at: Utc::now(),
        }
    }

    /// Returns true if the meter accepts readings and is billable
    pub fn is_active(&self) -> bool {
        self.status == MeterStatus::Active
    }

    /// Takes the meter out of service
    pub fn deactivate(&mut self) {
        self.status = MeterStatus::Inactive;
    }

    /// Marks the meter as replaced by a successor
    pub fn replace(&mut self) {
        self.status = MeterStatus::Replaced;
    }

    /// Flags the meter as faulty
    pub fn mark_faulty(&mut self) {
        self.status = MeterStatus::Faulty;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_meter() -> Meter {
        Meter::new(
            AccountId::new(),
            MeterType::Electricity,
            "EL-0042",
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        )
    }

    #[test]
    fn test_new_meter_is_active() {
        let meter = test_meter();
        assert!(meter.is_active());
        assert_eq!(meter.serial, "EL-0042");
    }

    #[test]
    fn test_lifecycle_transitions() {
        let mut meter = test_meter();

        meter.deactivate();
        assert_eq!(meter.status, MeterStatus::Inactive);
        assert!(!meter.is_active());

        meter.replace();
        assert_eq!(meter.status, MeterStatus::Replaced);

        meter.mark_faulty();
        assert_eq!(meter.status, MeterStatus::Faulty);
    }
}
