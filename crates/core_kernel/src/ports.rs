//! Repository port infrastructure
//!
//! Each domain defines its own port traits (stores, locks) against the
//! shared error type here. Adapters live outside the domain crates:
//! index-style in-memory stores for tests and development, real storage
//! in production.

use std::fmt;
use thiserror::Error;

/// Error type for repository port operations
///
/// All port implementations surface failures through this type so domain
/// code can classify them uniformly (unique-constraint conflicts, lock
/// timeouts, missing rows).
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested entity was not found
    #[error("Not found: {entity_type} with id {id}")]
    NotFound {
        entity_type: String,
        id: String,
    },

    /// The operation conflicts with existing data (unique constraint)
    #[error("Conflict: {message}")]
    Conflict {
        message: String,
    },

    /// A validation error occurred at the storage boundary
    #[error("Validation error: {message}")]
    Validation {
        message: String,
    },

    /// A per-account lock could not be acquired within the timeout
    ///
    /// Retryable: the caller may attempt the operation again.
    #[error("Account {account} is locked (timed out after {timeout_ms}ms)")]
    Locked {
        account: String,
        timeout_ms: u64,
    },

    /// An internal storage error occurred
    #[error("Internal store error: {message}")]
    Internal {
        message: String,
    },
}

impl StoreError {
    /// Creates a NotFound error
    pub fn not_found(entity_type: impl Into<String>, id: impl fmt::Display) -> Self {
        StoreError::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    /// Creates a Conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        StoreError::Conflict {
            message: message.into(),
        }
    }

    /// Creates a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        StoreError::Validation {
            message: message.into(),
        }
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        StoreError::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this error indicates a transient failure that may succeed on retry
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Locked { .. })
    }

    /// Returns true if this error indicates the entity was not found
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    /// Returns true if this error is a unique-constraint conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }
}

/// Marker trait for all domain ports
///
/// All port traits extend this marker to ensure they are thread-safe and
/// usable in async contexts.
pub trait DomainPort: Send + Sync + 'static {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_classification() {
        let error = StoreError::not_found("Bill", "BIL-123");
        assert!(error.is_not_found());
        assert!(!error.is_transient());
        assert!(error.to_string().contains("Bill"));
    }

    #[test]
    fn test_locked_is_transient() {
        let error = StoreError::Locked {
            account: "ACC-1".to_string(),
            timeout_ms: 30_000,
        };
        assert!(error.is_transient());
        assert!(!error.is_conflict());
    }

    #[test]
    fn test_conflict_classification() {
        let error = StoreError::conflict("bill already exists for 2025-01");
        assert!(error.is_conflict());
        assert!(!error.is_not_found());
    }
}
