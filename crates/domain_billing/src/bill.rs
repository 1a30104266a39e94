//! Bills and bill lines
//!
//! One bill per account per billing period, with one line per billed meter.
//! Totals are derived from the lines at construction and never drift from
//! them; the paid amount only moves through [`record_payment`](Bill::record_payment)
//! and its inverse.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use core_kernel::{AccountId, BillId, BillLineId, BillingPeriod, MeterId, Money, UnitRate};

use crate::error::BillingError;

/// Tolerance for total-versus-lines and ledger checks
pub(crate) const AMOUNT_TOLERANCE: Decimal = dec!(0.01);

/// Bill lifecycle status
///
/// `Void` is sticky; every other status is derived from the paid amount and
/// the due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillStatus {
    /// Issued, nothing paid
    Pending,
    /// Partially paid
    PartiallyPaid,
    /// Fully paid
    Paid,
    /// Unpaid past the due date
    Overdue,
    /// Cancelled; excluded from reconciliation
    Void,
}

/// One line per meter within a bill
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillLine {
    /// Unique identifier
    pub id: BillLineId,
    /// Meter billed
    pub meter_id: MeterId,
    /// Baseline dial value; `None` for a meter's first bill
    pub previous_value: Option<Decimal>,
    /// Dial value at the end of the period
    pub current_value: Decimal,
    /// Units consumed, never negative
    pub units: Decimal,
    /// Rate applied
    pub rate: UnitRate,
    /// units × rate, rounded at derivation time
    pub amount: Money,
}

impl BillLine {
    pub fn new(
        meter_id: MeterId,
        previous_value: Option<Decimal>,
        current_value: Decimal,
        units: Decimal,
        rate: UnitRate,
        amount: Money,
    ) -> Result<Self, BillingError> {
        if units.is_sign_negative() {
            return Err(BillingError::invariant(format!(
                "negative units {units} on meter {meter_id}"
            )));
        }
        if amount.is_negative() {
            return Err(BillingError::invariant(format!(
                "negative line amount {amount} on meter {meter_id}"
            )));
        }
        Ok(Self {
            id: BillLineId::new_v7(),
            meter_id,
            previous_value,
            current_value,
            units,
            rate,
            amount,
        })
    }
}

/// A bill for one account and one billing period
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bill {
    /// Unique identifier
    pub id: BillId,
    /// Billed account
    pub account_id: AccountId,
    /// Billing period (one bill per account per period)
    pub period: BillingPeriod,
    /// Per-meter lines
    pub lines: Vec<BillLine>,
    /// Sum of line amounts
    pub total: Money,
    /// Amount paid so far
    pub paid: Money,
    /// Status
    pub status: BillStatus,
    /// Issue date
    pub issued_on: NaiveDate,
    /// Payment due date
    pub due_date: NaiveDate,
    /// Optional late fee, included in the total when present
    pub late_fee: Option<Money>,
    /// Disputed bills are excluded from allocation
    pub disputed: bool,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Bill {
    /// Assembles a bill from its lines
    ///
    /// The total is the sum of the line amounts; an empty line list or a
    /// negative sum is rejected.
    pub fn new(
        account_id: AccountId,
        period: BillingPeriod,
        lines: Vec<BillLine>,
        issued_on: NaiveDate,
        due_date: NaiveDate,
    ) -> Result<Self, BillingError> {
        let first = lines
            .first()
            .ok_or_else(|| BillingError::invariant("bill must have at least one line"))?;
        let currency = first.amount.currency();

        let mut total = Money::zero(currency);
        for line in &lines {
            total = total.checked_add(&line.amount)?;
        }
        let total = Money::try_non_negative(total.amount(), currency)?;

        let now = Utc::now();
        Ok(Self {
            id: BillId::new_v7(),
            account_id,
            period,
            lines,
            total,
            paid: Money::zero(currency),
            status: BillStatus::Pending,
            issued_on,
            due_date,
            late_fee: None,
            disputed: false,
            created_at: now,
            updated_at: now,
        })
    }

    /// Adds a late fee onto the total
    pub fn apply_late_fee(&mut self, fee: Money) -> Result<(), BillingError> {
        self.total = self.total.checked_add(&fee)?;
        self.late_fee = Some(fee);
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Outstanding balance, never negative
    pub fn balance(&self) -> Money {
        self.total
            .saturating_sub(&self.paid)
            .unwrap_or_else(|_| Money::zero(self.total.currency()))
    }

    /// Returns true if the bill can receive allocations
    pub fn is_outstanding(&self) -> bool {
        self.status != BillStatus::Void && !self.disputed && self.balance().is_positive()
    }

    /// Records an allocation against the bill
    ///
    /// # Errors
    ///
    /// Rejects amounts exceeding the balance; the allocation sum for a bill
    /// can never exceed its total.
    pub fn record_payment(&mut self, amount: Money, today: NaiveDate) -> Result<(), BillingError> {
        if self.status == BillStatus::Void {
            return Err(BillingError::BillVoid(self.id));
        }
        let balance = self.balance();
        if amount.checked_sub(&balance)?.amount() > AMOUNT_TOLERANCE {
            return Err(BillingError::invariant(format!(
                "allocation {amount} exceeds balance {balance} on bill {}",
                self.id
            )));
        }
        self.paid = self.paid.checked_add(&amount)?;
        self.refresh_status(today);
        Ok(())
    }

    /// Exact inverse of [`record_payment`](Self::record_payment), used by reversal
    pub fn revert_payment(&mut self, amount: Money, today: NaiveDate) -> Result<(), BillingError> {
        let reverted = self.paid.checked_sub(&amount)?;
        if reverted.is_negative() {
            return Err(BillingError::invariant(format!(
                "reverting {amount} would drive paid amount negative on bill {}",
                self.id
            )));
        }
        self.paid = reverted;
        self.refresh_status(today);
        Ok(())
    }

    /// Voids the bill; void is terminal
    pub fn void(&mut self) {
        self.status = BillStatus::Void;
        self.updated_at = Utc::now();
    }

    /// Re-derives the status from amounts and the due date
    ///
    /// Precedence: Paid > PartiallyPaid > Overdue > Pending. Void is never
    /// overwritten.
    pub fn refresh_status(&mut self, today: NaiveDate) {
        if self.status == BillStatus::Void {
            return;
        }
        self.status = if !self.balance().is_positive() {
            BillStatus::Paid
        } else if self.paid.is_positive() {
            BillStatus::PartiallyPaid
        } else if today > self.due_date {
            BillStatus::Overdue
        } else {
            BillStatus::Pending
        };
        self.updated_at = Utc::now();
    }

    /// Defensive invariant: total equals the sum of line amounts plus any
    /// late fee, within tolerance
    pub fn verify_total(&self) -> Result<(), BillingError> {
        let currency = self.total.currency();
        let mut sum = Money::zero(currency);
        for line in &self.lines {
            sum = sum.checked_add(&line.amount)?;
        }
        if let Some(fee) = &self.late_fee {
            sum = sum.checked_add(fee)?;
        }
        let diff = self.total.checked_sub(&sum)?.amount().abs();
        if diff > AMOUNT_TOLERANCE {
            return Err(BillingError::invariant(format!(
                "bill {} total {} does not match line sum {}",
                self.id, self.total, sum
            )));
        }
        Ok(())
    }
}
