//! Ledger services: the operations callers use against the store.
//!
//! Four services, dependency order leaves-first:
//! - [`AccountRegistry`] owns the chart of accounts.
//! - [`JournalService`] records immutable financial facts (single and
//!   double-entry).
//! - [`LedgerAggregator`] computes per-account totals over a date range.
//! - [`FinancialStatementBuilder`] derives the balance sheet and income
//!   statement.
//!
//! Reads are side-effect-free and may run concurrently with writes: a
//! statement built while a write is in flight may or may not include that
//! write. That staleness window is accepted behavior, not masked.

pub mod aggregate;
pub mod journal;
pub mod registry;
pub mod statements;

pub use aggregate::LedgerAggregator;
pub use journal::JournalService;
pub use registry::AccountRegistry;
pub use statements::FinancialStatementBuilder;
