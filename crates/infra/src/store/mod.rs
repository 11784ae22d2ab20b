//! Store traits and shared query types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use libromayor_accounting::{Account, JournalEntry};
use libromayor_core::{AccountCode, EntryId, LedgerError};

pub mod memory;
pub mod postgres;

/// Storage-level error.
///
/// Kept separate from `LedgerError`: the domain layer decides what a duplicate
/// key *means* (e.g. `DuplicateCode` for accounts), while everything transient
/// folds into `StoreUnavailable` for the caller to retry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Unique constraint violation (Postgres `23505` or the in-memory
    /// equivalent).
    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    /// A persisted row could not be decoded into its domain type.
    #[error("row decode failed: {0}")]
    Decode(String),

    /// Transient infrastructure failure (connectivity, pool closed, timeout).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateKey(msg) => LedgerError::Conflict(msg),
            StoreError::Decode(msg) | StoreError::Unavailable(msg) => {
                LedgerError::StoreUnavailable(msg)
            }
        }
    }
}

/// Date-range/account filter for journal selects.
///
/// `None` bounds are unbounded (a balance sheet reads from the beginning of
/// time up to its cutoff).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryFilter {
    pub account: Option<AccountCode>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl EntryFilter {
    pub fn matches(&self, entry: &JournalEntry) -> bool {
        if let Some(account) = &self.account {
            if &entry.account != account {
                return false;
            }
        }
        if let Some(from) = self.from {
            if entry.date < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if entry.date > to {
                return false;
            }
        }
        true
    }
}

/// Pagination parameters for journal selects.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Pagination {
    /// Maximum number of rows to return.
    pub limit: u32,
    /// Offset (0-based) into the stable `(fecha, created_at, id)` ordering.
    pub offset: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: 500,
            offset: 0,
        }
    }
}

impl Pagination {
    pub fn new(limit: Option<u32>, offset: Option<u64>) -> Self {
        Self {
            limit: limit.unwrap_or(500).min(1000), // cap for safety
            offset: offset.unwrap_or(0),
        }
    }

    pub fn next_page(self) -> Self {
        Self {
            limit: self.limit,
            offset: self.offset + u64::from(self.limit),
        }
    }
}

/// Outcome of asking a backend to write both rows of a pair atomically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairInsert {
    /// Both rows were committed in one multi-row transaction.
    Committed,
    /// The backend has no multi-row transaction; the caller must fall back to
    /// the two-phase write with compensation.
    Unsupported,
}

/// Chart-of-accounts persistence.
#[async_trait::async_trait]
pub trait AccountStore: Send + Sync {
    /// Insert a new account. `DuplicateKey` when the code already exists.
    async fn insert(&self, account: &Account) -> Result<(), StoreError>;

    async fn fetch(&self, code: &AccountCode) -> Result<Option<Account>, StoreError>;

    /// Toggle the `active` flag. Returns `false` when no such account exists.
    async fn set_active(&self, code: &AccountCode, active: bool) -> Result<bool, StoreError>;

    /// All accounts, sorted by code.
    async fn list(&self) -> Result<Vec<Account>, StoreError>;
}

/// Journal entry persistence (append-mostly log).
#[async_trait::async_trait]
pub trait JournalStore: Send + Sync {
    async fn insert(&self, entry: &JournalEntry) -> Result<(), StoreError>;

    /// Write both rows of a double-entry pair atomically, if the backend can.
    ///
    /// The default reports `Unsupported`, matching the observed remote store.
    async fn insert_pair(
        &self,
        debit: &JournalEntry,
        credit: &JournalEntry,
    ) -> Result<PairInsert, StoreError> {
        let _ = (debit, credit);
        Ok(PairInsert::Unsupported)
    }

    /// Delete one row. Returns `false` when no such entry exists.
    async fn delete(&self, id: EntryId) -> Result<bool, StoreError>;

    async fn fetch_entry(&self, id: EntryId) -> Result<Option<JournalEntry>, StoreError>;

    /// Page through entries matching the filter, ordered by
    /// `(fecha, created_at, id)` ascending. The ordering is stable so that
    /// repeated paging with no intervening writes sees each row exactly once.
    async fn select(
        &self,
        filter: &EntryFilter,
        page: Pagination,
    ) -> Result<Vec<JournalEntry>, StoreError>;

    /// All rows carrying a correlation reference (a pair, an orphaned half of
    /// one, or nothing).
    async fn select_by_reference(&self, reference: &str)
        -> Result<Vec<JournalEntry>, StoreError>;
}
