//! In-memory store.
//!
//! Intended for tests/dev. Deliberately implements only the contract of the
//! observed remote store: single-row inserts, updates and selects with **no**
//! multi-row transaction (`insert_pair` keeps the `Unsupported` default), so
//! the two-phase double-entry write path gets exercised for real. Fault
//! injection hooks let tests fail the next insert or delete.

use std::collections::BTreeMap;
use std::sync::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};

use libromayor_accounting::{Account, JournalEntry};
use libromayor_core::{AccountCode, EntryId};

use super::{AccountStore, EntryFilter, JournalStore, Pagination, StoreError};

#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    accounts: RwLock<BTreeMap<AccountCode, Account>>,
    entries: RwLock<Vec<JournalEntry>>,
    /// `Some(n)`: let `n` more journal inserts succeed, then fail one.
    fail_insert_after: Mutex<Option<u32>>,
    fail_next_delete: AtomicBool,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next journal insert fail with `Unavailable`.
    pub fn fail_next_insert(&self) {
        self.fail_insert_after(0);
    }

    /// Let `n` journal inserts succeed, then fail the one after with
    /// `Unavailable`. `n = 1` fails the credit half of a two-phase pair write.
    pub fn fail_insert_after(&self, n: u32) {
        if let Ok(mut slot) = self.fail_insert_after.lock() {
            *slot = Some(n);
        }
    }

    /// Make the next journal delete fail with `Unavailable`.
    pub fn fail_next_delete(&self) {
        self.fail_next_delete.store(true, Ordering::SeqCst);
    }

    fn insert_should_fail(&self) -> bool {
        let Ok(mut slot) = self.fail_insert_after.lock() else {
            return false;
        };
        match slot.take() {
            Some(0) => true,
            Some(n) => {
                *slot = Some(n - 1);
                false
            }
            None => false,
        }
    }

    fn take_flag(flag: &AtomicBool) -> bool {
        flag.swap(false, Ordering::SeqCst)
    }

    fn sort_key(entry: &JournalEntry) -> (chrono::NaiveDate, chrono::DateTime<chrono::Utc>, [u8; 16]) {
        (entry.date, entry.created_at, *entry.id.as_uuid().as_bytes())
    }
}

#[async_trait::async_trait]
impl AccountStore for InMemoryLedgerStore {
    async fn insert(&self, account: &Account) -> Result<(), StoreError> {
        let mut accounts = self
            .accounts
            .write()
            .map_err(|_| StoreError::Unavailable("accounts lock poisoned".to_string()))?;
        if accounts.contains_key(&account.code) {
            return Err(StoreError::DuplicateKey(account.code.to_string()));
        }
        accounts.insert(account.code.clone(), account.clone());
        Ok(())
    }

    async fn fetch(&self, code: &AccountCode) -> Result<Option<Account>, StoreError> {
        let accounts = self
            .accounts
            .read()
            .map_err(|_| StoreError::Unavailable("accounts lock poisoned".to_string()))?;
        Ok(accounts.get(code).cloned())
    }

    async fn set_active(&self, code: &AccountCode, active: bool) -> Result<bool, StoreError> {
        let mut accounts = self
            .accounts
            .write()
            .map_err(|_| StoreError::Unavailable("accounts lock poisoned".to_string()))?;
        match accounts.get_mut(code) {
            Some(account) => {
                account.active = active;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list(&self) -> Result<Vec<Account>, StoreError> {
        let accounts = self
            .accounts
            .read()
            .map_err(|_| StoreError::Unavailable("accounts lock poisoned".to_string()))?;
        // BTreeMap iteration is already code-ordered.
        Ok(accounts.values().cloned().collect())
    }
}

#[async_trait::async_trait]
impl JournalStore for InMemoryLedgerStore {
    async fn insert(&self, entry: &JournalEntry) -> Result<(), StoreError> {
        if self.insert_should_fail() {
            return Err(StoreError::Unavailable("injected insert failure".to_string()));
        }
        let mut entries = self
            .entries
            .write()
            .map_err(|_| StoreError::Unavailable("entries lock poisoned".to_string()))?;
        if entries.iter().any(|e| e.id == entry.id) {
            return Err(StoreError::DuplicateKey(entry.id.to_string()));
        }
        entries.push(entry.clone());
        Ok(())
    }

    async fn delete(&self, id: EntryId) -> Result<bool, StoreError> {
        if Self::take_flag(&self.fail_next_delete) {
            return Err(StoreError::Unavailable("injected delete failure".to_string()));
        }
        let mut entries = self
            .entries
            .write()
            .map_err(|_| StoreError::Unavailable("entries lock poisoned".to_string()))?;
        let before = entries.len();
        entries.retain(|e| e.id != id);
        Ok(entries.len() < before)
    }

    async fn fetch_entry(&self, id: EntryId) -> Result<Option<JournalEntry>, StoreError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| StoreError::Unavailable("entries lock poisoned".to_string()))?;
        Ok(entries.iter().find(|e| e.id == id).cloned())
    }

    async fn select(
        &self,
        filter: &EntryFilter,
        page: Pagination,
    ) -> Result<Vec<JournalEntry>, StoreError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| StoreError::Unavailable("entries lock poisoned".to_string()))?;
        let mut matching: Vec<JournalEntry> =
            entries.iter().filter(|e| filter.matches(e)).cloned().collect();
        matching.sort_by_key(Self::sort_key);
        Ok(matching
            .into_iter()
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .collect())
    }

    async fn select_by_reference(
        &self,
        reference: &str,
    ) -> Result<Vec<JournalEntry>, StoreError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| StoreError::Unavailable("entries lock poisoned".to_string()))?;
        let mut matching: Vec<JournalEntry> = entries
            .iter()
            .filter(|e| e.reference.as_deref() == Some(reference))
            .cloned()
            .collect();
        matching.sort_by_key(Self::sort_key);
        Ok(matching)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use libromayor_accounting::{AccountType, MovementKind};
    use rust_decimal::Decimal;

    fn code(s: &str) -> AccountCode {
        AccountCode::new(s).unwrap()
    }

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn entry(account: &str, date: &str, amount: i64) -> JournalEntry {
        JournalEntry::new(
            day(date),
            code(account),
            MovementKind::Debit,
            Decimal::from(amount),
            None,
            Some("ref-a".to_string()),
            "cajero1",
        )
        .unwrap()
    }

    #[tokio::test]
    async fn account_insert_is_unique_by_code() {
        let store = InMemoryLedgerStore::new();
        let account = Account::new(code("1010"), "Caja", AccountType::Asset, None);
        AccountStore::insert(&store, &account).await.unwrap();

        let err = AccountStore::insert(&store, &account).await.unwrap_err();
        assert_eq!(err, StoreError::DuplicateKey("1010".to_string()));
    }

    #[tokio::test]
    async fn select_filters_by_account_and_date_range() {
        let store = InMemoryLedgerStore::new();
        JournalStore::insert(&store, &entry("1010", "2024-01-05", 10)).await.unwrap();
        JournalStore::insert(&store, &entry("1010", "2024-02-05", 20)).await.unwrap();
        JournalStore::insert(&store, &entry("4010", "2024-01-10", 30)).await.unwrap();

        let filter = EntryFilter {
            account: Some(code("1010")),
            from: Some(day("2024-01-01")),
            to: Some(day("2024-01-31")),
        };
        let rows = store.select(&filter, Pagination::default()).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].amount, Decimal::from(10));
    }

    #[tokio::test]
    async fn paging_sees_each_row_exactly_once() {
        let store = InMemoryLedgerStore::new();
        for i in 1..=7 {
            JournalStore::insert(&store, &entry("1010", "2024-01-05", i)).await.unwrap();
        }

        let mut seen = Vec::new();
        let mut page = Pagination::new(Some(3), None);
        loop {
            let rows = store.select(&EntryFilter::default(), page).await.unwrap();
            let count = rows.len();
            seen.extend(rows);
            if count < page.limit as usize {
                break;
            }
            page = page.next_page();
        }
        assert_eq!(seen.len(), 7);
        let mut ids: Vec<String> = seen.iter().map(|e| e.id.to_string()).collect();
        ids.dedup();
        assert_eq!(ids.len(), 7);
    }

    #[tokio::test]
    async fn fault_injection_fails_exactly_one_operation() {
        let store = InMemoryLedgerStore::new();
        store.fail_next_insert();
        let e = entry("1010", "2024-01-05", 10);
        assert!(JournalStore::insert(&store, &e).await.is_err());
        JournalStore::insert(&store, &e).await.unwrap();

        store.fail_next_delete();
        assert!(store.delete(e.id).await.is_err());
        assert!(store.delete(e.id).await.unwrap());
    }

    #[tokio::test]
    async fn counted_fault_skips_then_fails() {
        let store = InMemoryLedgerStore::new();
        store.fail_insert_after(1);

        JournalStore::insert(&store, &entry("1010", "2024-01-05", 1)).await.unwrap();
        let err = JournalStore::insert(&store, &entry("1010", "2024-01-05", 2))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
        // One failure only; the store recovers.
        JournalStore::insert(&store, &entry("1010", "2024-01-05", 3)).await.unwrap();
    }

    #[tokio::test]
    async fn reference_lookup_returns_both_halves_of_a_pair() {
        let store = InMemoryLedgerStore::new();
        JournalStore::insert(&store, &entry("1010", "2024-01-05", 10)).await.unwrap();
        JournalStore::insert(&store, &entry("4010", "2024-01-05", 10)).await.unwrap();

        let rows = store.select_by_reference("ref-a").await.unwrap();
        assert_eq!(rows.len(), 2);
        assert!(store.select_by_reference("ref-z").await.unwrap().is_empty());
    }
}
