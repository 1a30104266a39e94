//! Custom Test Assertions
//!
//! Specialized assertion helpers for domain types that give more meaningful
//! error messages than standard assertions.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::Money;
use domain_billing::ReconciliationReport;

/// Asserts that two Money values are approximately equal within a tolerance
pub fn assert_money_approx_eq(actual: &Money, expected: &Money, tolerance: Decimal) {
    assert_eq!(
        actual.currency(),
        expected.currency(),
        "Currency mismatch: actual={}, expected={}",
        actual.currency(),
        expected.currency()
    );

    let diff = (actual.amount() - expected.amount()).abs();
    assert!(
        diff <= tolerance,
        "Money amounts differ by more than tolerance: actual={}, expected={}, diff={}, tolerance={}",
        actual.amount(),
        expected.amount(),
        diff,
        tolerance
    );
}

/// Asserts that a Money value is zero
pub fn assert_money_zero(money: &Money) {
    assert!(
        money.is_zero(),
        "Expected zero money, got {} {}",
        money.currency().symbol(),
        money.amount()
    );
}

/// Asserts the ledger identity for a reconciliation:
/// allocations + carry-forward account for the payment plus any consumed
/// credit, within the 0.01 rounding tolerance
pub fn assert_ledger_consistent(report: &ReconciliationReport, payment_amount: &Money) {
    let currency = payment_amount.currency();
    let mut accounted = Money::zero(currency);
    for allocation in &report.allocations {
        accounted = accounted
            .checked_add(&allocation.amount)
            .expect("single-currency ledger");
    }
    if let Some(carry) = &report.carry_forward {
        accounted = accounted
            .checked_add(&carry.amount)
            .expect("single-currency ledger");
    }

    let expected = payment_amount
        .checked_add(&report.consumed_credit)
        .expect("single-currency ledger");
    let residual = expected
        .checked_sub(&accounted)
        .expect("single-currency ledger")
        .amount();

    assert!(
        residual >= Decimal::ZERO && residual <= dec!(0.01),
        "ledger inconsistent: payment + consumed credit = {}, accounted = {}, residual = {}",
        expected.amount(),
        accounted.amount(),
        residual
    );
}
