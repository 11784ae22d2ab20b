//! Infrastructure layer: storage adapters for the ledger.
//!
//! The backing store is modeled after the observed integration: three logical
//! relations reachable via simple insert/update/select operations. A backend
//! may or may not offer a multi-row transaction; `JournalStore::insert_pair`
//! lets it say so.

pub mod store;

pub use store::{
    AccountStore, EntryFilter, JournalStore, PairInsert, Pagination, StoreError,
};
pub use store::memory::InMemoryLedgerStore;
pub use store::postgres::PostgresLedgerStore;
