//! Property-Based Test Generators
//!
//! Proptest strategies for generating random test data that maintains
//! domain invariants.

use core_kernel::{BillingPeriod, Currency, Money};
use proptest::prelude::*;
use rust_decimal::Decimal;

/// Strategy for positive amounts in minor units (cents)
pub fn positive_amount_minor_strategy() -> impl Strategy<Value = i64> {
    1i64..1_000_000_000i64
}

/// Strategy for positive USD Money values
pub fn positive_money_strategy() -> impl Strategy<Value = Money> {
    positive_amount_minor_strategy().prop_map(|minor| Money::from_minor(minor, Currency::USD))
}

/// Strategy for per-unit prices between 0.01 and 10.00 USD
pub fn unit_price_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..1000i64).prop_map(|n| Decimal::new(n, 2))
}

/// Strategy for a non-decreasing sequence of dial values
///
/// Models a meter's history: each step adds a non-negative delta.
pub fn monotone_values_strategy(len: usize) -> impl Strategy<Value = Vec<Decimal>> {
    proptest::collection::vec(0i64..10_000i64, len..=len).prop_map(|deltas| {
        let mut value = Decimal::ZERO;
        deltas
            .into_iter()
            .map(|delta| {
                value += Decimal::new(delta, 0);
                value
            })
            .collect()
    })
}

/// Strategy for billing periods in 2024-2025
pub fn billing_period_strategy() -> impl Strategy<Value = BillingPeriod> {
    (2024i32..=2025i32, 1u32..=12u32)
        .prop_map(|(year, month)| BillingPeriod::new(year, month).expect("valid period"))
}
