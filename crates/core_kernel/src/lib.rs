//! Core Kernel - Foundational types and utilities for the utility billing system
//!
//! This crate provides the fundamental building blocks used across all domain modules:
//! - Money types with precise decimal arithmetic
//! - Billing periods and date ranges
//! - Strongly-typed identifiers
//! - The repository port error taxonomy

pub mod money;
pub mod period;
pub mod identifiers;
pub mod error;
pub mod ports;

pub use money::{Money, Currency, MoneyError, RoundingMethod, UnitRate};
pub use period::{BillingPeriod, DateRange, PeriodError};
pub use identifiers::{
    AccountId, MeterId, ReadingId, TariffId, BillId, BillLineId,
    PaymentId, AllocationId, CarryForwardId, AuditEventId,
};
pub use error::CoreError;
pub use ports::{StoreError, DomainPort};
