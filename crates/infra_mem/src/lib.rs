//! In-Memory Infrastructure Layer
//!
//! Index-style in-memory adapters for every repository port: BTreeMap date
//! indexes give the reading store its neighbor queries, and hash indexes
//! enforce the unique constraints the domain relies on: one reading per
//! (meter, calendar month), one bill per (account, billing period), unique
//! payment external references.
//!
//! The [`AccountLockRegistry`] serializes mutations per account with a
//! bounded acquisition timeout, surfacing expiry as the retryable
//! `StoreError::Locked`.
//!
//! These adapters back the test suite and development setups; production
//! deployments implement the same port traits over real storage.

pub mod meters;
pub mod readings;
pub mod tariffs;
pub mod billing;
pub mod locks;

pub use meters::InMemoryMeterStore;
pub use readings::InMemoryReadingStore;
pub use tariffs::InMemoryTariffStore;
pub use billing::{InMemoryBillStore, InMemoryCarryForwardStore, InMemoryPaymentStore};
pub use locks::AccountLockRegistry;
