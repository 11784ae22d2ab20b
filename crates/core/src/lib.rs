//! `libromayor-core`: domain foundation building blocks for the ledger.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod code;
pub mod error;
pub mod id;

pub use code::AccountCode;
pub use error::{LedgerError, LedgerResult};
pub use id::EntryId;
