//! Per-account lock registry
//!
//! One tokio mutex per account, acquired with a bounded timeout. All
//! mutations to an account's bills, payments, and carry-forward entries
//! happen under this lock; cross-account operations proceed concurrently.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use core_kernel::{AccountId, DomainPort, StoreError};
use domain_billing::{AccountLock, AccountLockGuard};

/// Registry of per-account tokio mutexes
#[derive(Default)]
pub struct AccountLockRegistry {
    locks: Mutex<HashMap<AccountId, Arc<Mutex<()>>>>,
}

impl AccountLockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    async fn lock_for(&self, account: AccountId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(account)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

impl DomainPort for AccountLockRegistry {}

#[async_trait]
impl AccountLock for AccountLockRegistry {
    async fn acquire(
        &self,
        account: AccountId,
        timeout: Duration,
    ) -> Result<AccountLockGuard, StoreError> {
        let lock = self.lock_for(account).await;
        match tokio::time::timeout(timeout, lock.lock_owned()).await {
            Ok(guard) => Ok(AccountLockGuard::new(guard)),
            Err(_) => {
                tracing::warn!(account = %account, timeout_ms = timeout.as_millis() as u64, "account lock timed out");
                Err(StoreError::Locked {
                    account: account.to_string(),
                    timeout_ms: timeout.as_millis() as u64,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_same_account_serializes() {
        let registry = AccountLockRegistry::new();
        let account = AccountId::new();

        let guard = registry
            .acquire(account, Duration::from_millis(100))
            .await
            .unwrap();

        let err = registry
            .acquire(account, Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(err.is_transient());

        drop(guard);
        registry
            .acquire(account, Duration::from_millis(100))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_different_accounts_do_not_block() {
        let registry = AccountLockRegistry::new();

        let _a = registry
            .acquire(AccountId::new(), Duration::from_millis(100))
            .await
            .unwrap();
        let _b = registry
            .acquire(AccountId::new(), Duration::from_millis(100))
            .await
            .unwrap();
    }
}
