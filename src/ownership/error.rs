//! Contract errors for ownership bookkeeping

use thiserror::Error;

/// A caller broke the define-before-use contract of the ownership trackers
///
/// These indicate a defect in whoever drives the trackers, never a property of
/// the analyzed runtime, so they are reported immediately.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OwnershipError {
    #[error("key already defined: {0}")]
    KeyAlreadyDefined(String),

    #[error("key not defined: {0}")]
    KeyNotDefined(String),

    #[error("no resolved value defined for child key {0}")]
    ChildKeyNotDefined(String),

    #[error("no resolved value defined for owner key {0}")]
    OwnerKeyNotDefined(String),
}

/// Result type for ownership operations
pub type OwnershipResult<T> = Result<T, OwnershipError>;
