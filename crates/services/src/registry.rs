//! Chart-of-accounts registry.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::instrument;

use libromayor_accounting::{Account, AccountType};
use libromayor_core::{AccountCode, LedgerError, LedgerResult};
use libromayor_infra::{AccountStore, StoreError};

/// Administrative operations over the chart of accounts.
#[derive(Debug, Clone)]
pub struct AccountRegistry<S> {
    store: Arc<S>,
}

impl<S: AccountStore> AccountRegistry<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Create a new account.
    ///
    /// Fails `DuplicateCode` when the code exists and `InvalidParent` when a
    /// parent code is given but not found.
    #[instrument(skip(self), fields(code = %code, kind = ?kind), err)]
    pub async fn create(
        &self,
        code: AccountCode,
        name: &str,
        kind: AccountType,
        parent: Option<AccountCode>,
    ) -> LedgerResult<Account> {
        if let Some(parent_code) = &parent {
            if self.store.fetch(parent_code).await?.is_none() {
                return Err(LedgerError::invalid_parent(parent_code.as_str()));
            }
        }

        let account = Account::new(code.clone(), name, kind, parent);
        match self.store.insert(&account).await {
            Ok(()) => Ok(account),
            Err(StoreError::DuplicateKey(_)) => Err(LedgerError::duplicate_code(code.as_str())),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn lookup(&self, code: &AccountCode) -> LedgerResult<Account> {
        self.store
            .fetch(code)
            .await?
            .ok_or_else(|| LedgerError::unknown_account(code.as_str()))
    }

    /// Active accounts sorted by code, optionally restricted to a set of
    /// account types.
    pub async fn list_active(
        &self,
        types: Option<&[AccountType]>,
    ) -> LedgerResult<Vec<Account>> {
        let mut accounts = self.store.list().await?;
        accounts.retain(|a| a.active && types.map_or(true, |t| t.contains(&a.kind)));
        Ok(accounts)
    }

    /// Soft-deactivate an account. Historical entries and statements for
    /// periods where the account was active are unaffected.
    #[instrument(skip(self), fields(code = %code), err)]
    pub async fn deactivate(&self, code: &AccountCode) -> LedgerResult<()> {
        self.toggle(code, false).await
    }

    #[instrument(skip(self), fields(code = %code), err)]
    pub async fn reactivate(&self, code: &AccountCode) -> LedgerResult<()> {
        self.toggle(code, true).await
    }

    async fn toggle(&self, code: &AccountCode, active: bool) -> LedgerResult<()> {
        if self.store.set_active(code, active).await? {
            Ok(())
        } else {
            Err(LedgerError::unknown_account(code.as_str()))
        }
    }

    /// The whole chart keyed by code (used when resolving ledger lines).
    pub async fn chart(&self) -> LedgerResult<BTreeMap<AccountCode, Account>> {
        Ok(self
            .store
            .list()
            .await?
            .into_iter()
            .map(|a| (a.code.clone(), a))
            .collect())
    }
}
