//! Metering Domain - Meters, Readings, Consumption, and Tariffs
//!
//! This crate gates everything that happens before a bill exists:
//!
//! - **Readings** are validated against the monotonic constraint (later
//!   readings never show less on the dial) and the one-reading-per-month
//!   rule before they are stored.
//! - **Consumption** between two readings is derived in exactly one place
//!   so billed and reported figures can never disagree.
//! - **Tariffs** are resolved for a meter at a point in time through a
//!   deterministic precedence order with an explicit degraded-match
//!   fallback.
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_metering::{MeterReadingService, NewReading};
//!
//! let (reading, events) = service.capture(NewReading {
//!     meter_id,
//!     value: dec!(750),
//!     reading_date: date,
//!     reading_type: ReadingType::Actual,
//!     recorded_by: "field-app".into(),
//!     notes: None,
//! }).await?;
//! ```

pub mod meter;
pub mod reading;
pub mod validator;
pub mod consumption;
pub mod tariff;
pub mod service;
pub mod ports;
pub mod events;
pub mod error;

pub use meter::{Meter, MeterType, MeterStatus};
pub use reading::{MeterReading, ReadingType, NewReading};
pub use validator::{ReadingValidator, ViolationDirection};
pub use consumption::ConsumptionResolver;
pub use tariff::{Tariff, TariffResolver};
pub use service::MeterReadingService;
pub use ports::{MeterStore, ReadingStore, TariffStore};
pub use events::MeteringEvent;
pub use error::MeteringError;
