//! Allocation ordering strategies
//!
//! A strategy does exactly one thing: order the outstanding bills a payment
//! will walk. Filtering (void, disputed, zero-balance) happens in the
//! outstanding-bills query before ordering. Every strategy breaks ties by
//! bill id ascending so allocation is deterministic.

use crate::bill::Bill;
use crate::config::AllocationOrder;

/// Orders outstanding bills for the allocation walk
pub trait AllocationStrategy: Send + Sync {
    /// Strategy name for logs and reports
    fn name(&self) -> &'static str;

    /// Returns the bills in allocation order
    fn order(&self, bills: Vec<Bill>) -> Vec<Bill>;
}

/// Oldest issued first
pub struct Fifo;

impl AllocationStrategy for Fifo {
    fn name(&self) -> &'static str {
        "fifo"
    }

    fn order(&self, mut bills: Vec<Bill>) -> Vec<Bill> {
        bills.sort_by(|a, b| a.issued_on.cmp(&b.issued_on).then(a.id.cmp(&b.id)));
        bills
    }
}

/// Most recently issued first
pub struct Lifo;

impl AllocationStrategy for Lifo {
    fn name(&self) -> &'static str {
        "lifo"
    }

    fn order(&self, mut bills: Vec<Bill>) -> Vec<Bill> {
        bills.sort_by(|a, b| b.issued_on.cmp(&a.issued_on).then(a.id.cmp(&b.id)));
        bills
    }
}

/// Earliest due date first
pub struct OldestDue;

impl AllocationStrategy for OldestDue {
    fn name(&self) -> &'static str {
        "oldest_due"
    }

    fn order(&self, mut bills: Vec<Bill>) -> Vec<Bill> {
        bills.sort_by(|a, b| a.due_date.cmp(&b.due_date).then(a.id.cmp(&b.id)));
        bills
    }
}

/// Smallest balance first
pub struct SmallestFirst;

impl AllocationStrategy for SmallestFirst {
    fn name(&self) -> &'static str {
        "smallest_first"
    }

    fn order(&self, mut bills: Vec<Bill>) -> Vec<Bill> {
        bills.sort_by(|a, b| {
            a.balance()
                .amount()
                .cmp(&b.balance().amount())
                .then(a.id.cmp(&b.id))
        });
        bills
    }
}

/// Resolves the configured ordering policy to a strategy
pub fn strategy_for(order: AllocationOrder) -> Box<dyn AllocationStrategy> {
    match order {
        AllocationOrder::Fifo => Box::new(Fifo),
        AllocationOrder::Lifo => Box::new(Lifo),
        AllocationOrder::OldestDue => Box::new(OldestDue),
        AllocationOrder::SmallestFirst => Box::new(SmallestFirst),
    }
}
