//! Ledger error model.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::id::EntryId;

/// Result type used across the ledger domain and services.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Ledger-level error.
///
/// Validation and referential errors are deterministic and caller-correctable.
/// `StoreUnavailable` is transient infrastructure failure, propagated unmodified
/// for the caller to retry with backoff (no internal retries here).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// A value failed validation (e.g. malformed input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An entry amount was zero or negative. Sign is carried by the movement
    /// kind, never by the amount.
    #[error("amount must be strictly positive (got {0})")]
    InvalidAmount(Decimal),

    /// No account exists with the given code.
    #[error("unknown account: {0}")]
    UnknownAccount(String),

    /// The account exists but has been deactivated; it cannot receive new entries.
    #[error("inactive account: {0}")]
    InactiveAccount(String),

    /// An account with the given code already exists.
    #[error("duplicate account code: {0}")]
    DuplicateCode(String),

    /// A parent code was given but no such account exists.
    #[error("parent account not found: {0}")]
    InvalidParent(String),

    /// The correlation reference already has persisted journal rows. A caller
    /// retrying after a timeout must inspect the existing rows instead of
    /// writing a second pair.
    #[error("correlation reference already recorded: {0}")]
    DuplicateReference(String),

    /// A concurrent operation raced this one (e.g. the same correlation
    /// reference is mid-write in another task).
    #[error("conflict: {0}")]
    Conflict(String),

    /// A double-entry write failed after its first row was durably written and
    /// the compensating delete also failed. The orphaned row must be reconciled
    /// manually; this condition is never silently swallowed.
    #[error("partial double-entry write: orphaned entry {orphan} (reference {reference})")]
    PartialWrite { orphan: EntryId, reference: String },

    /// Transient infrastructure failure talking to the backing store.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

impl LedgerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn unknown_account(code: impl Into<String>) -> Self {
        Self::UnknownAccount(code.into())
    }

    pub fn inactive_account(code: impl Into<String>) -> Self {
        Self::InactiveAccount(code.into())
    }

    pub fn duplicate_code(code: impl Into<String>) -> Self {
        Self::DuplicateCode(code.into())
    }

    pub fn invalid_parent(code: impl Into<String>) -> Self {
        Self::InvalidParent(code.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn store_unavailable(msg: impl Into<String>) -> Self {
        Self::StoreUnavailable(msg.into())
    }
}
