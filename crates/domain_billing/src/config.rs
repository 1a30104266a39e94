//! Billing configuration
//!
//! All policy knobs live in one explicit struct passed into the generator
//! and the reconciliation engine at construction. Nothing reads global
//! state.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;

use core_kernel::{Currency, RoundingMethod};

/// Which outstanding bills a payment is applied to first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AllocationOrder {
    /// Oldest issued first
    #[default]
    Fifo,
    /// Most recently issued first
    Lifo,
    /// Earliest due date first
    OldestDue,
    /// Smallest balance first
    SmallestFirst,
}

/// What happens to a payment remainder after the allocation walk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OverpaymentHandling {
    /// Remainder becomes an active carry-forward credit
    #[default]
    CarryForward,
    /// Remainder is reported for refund processing
    Refund,
    /// Remainder is held for manual review
    Manual,
}

/// Configuration for bill generation and payment reconciliation
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BillingConfig {
    /// Ledger currency
    pub currency: Currency,
    /// Bill ordering policy for allocation
    pub allocation_strategy: AllocationOrder,
    /// Reconcile automatically when a payment completes
    pub auto_reconcile: bool,
    /// Remainder policy
    pub overpayment_handling: OverpaymentHandling,
    /// Allocation walk stops below this remainder
    pub minimum_allocation: Decimal,
    /// Remainders below this are absorbed into rounding tolerance instead
    /// of creating a carry-forward entry
    pub carry_forward_minimum: Decimal,
    /// Consume active credits before allocating the payment itself
    pub apply_credit_before_allocation: bool,
    /// Skip zero-consumption lines during generation
    pub exclude_zero_bills: bool,
    /// Days between issue and due date
    pub grace_period_days: u32,
    /// Decimal places for derived amounts
    pub amount_precision: u32,
    /// Rounding method for derived amounts
    pub rounding_method: RoundingMethod,
    /// Reversals allowed only this many days after reconciliation
    pub reversal_window_days: Option<u32>,
    /// Per-account lock acquisition timeout
    pub lock_timeout_ms: u64,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            currency: Currency::USD,
            allocation_strategy: AllocationOrder::Fifo,
            auto_reconcile: false,
            overpayment_handling: OverpaymentHandling::CarryForward,
            minimum_allocation: dec!(0.01),
            carry_forward_minimum: dec!(0.01),
            apply_credit_before_allocation: true,
            exclude_zero_bills: false,
            grace_period_days: 14,
            amount_precision: 2,
            rounding_method: RoundingMethod::Round,
            reversal_window_days: None,
            lock_timeout_ms: 30_000,
        }
    }
}

impl BillingConfig {
    /// Loads configuration from `BILLING_`-prefixed environment variables
    ///
    /// Unset variables fall back to the defaults.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix("BILLING"))
            .build()?
            .try_deserialize()
    }
}
