//! Accounting domain (chart of accounts, journal entries, ledger lines,
//! financial statements).
//!
//! Pure domain logic only: no IO, no persistence concerns. Everything here is
//! deterministic and safe to recompute any number of times.

pub mod account;
pub mod journal;
pub mod ledger;
pub mod statements;

pub use account::{Account, AccountType, NormalBalance};
pub use journal::{JournalEntry, MovementKind};
pub use ledger::{LedgerFold, LedgerLine, LedgerView};
pub use statements::{
    BalanceSheet, BalanceSheetSection, IncomeStatement, IncomeStatementSection, ResultFraming,
};
