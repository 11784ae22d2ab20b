//! Journal recording service.
//!
//! Single-row writes need no coordination. The double-entry write is the one
//! critical section: it is keyed by its correlation reference (in-process
//! in-flight set plus a persisted-rows check) so a retried caller cannot
//! produce a duplicate pair, and it compensates the first row when the second
//! insert fails on a backend without multi-row transactions.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{error, instrument, warn};
use uuid::Uuid;

use libromayor_accounting::journal::balanced_pair;
use libromayor_accounting::{Account, JournalEntry, MovementKind};
use libromayor_core::{AccountCode, EntryId, LedgerError, LedgerResult};
use libromayor_infra::{AccountStore, JournalStore, PairInsert};

pub struct JournalService<S> {
    store: Arc<S>,
    in_flight: Mutex<HashSet<String>>,
}

/// Removes the claimed reference from the in-flight set on drop, so a failed
/// write never wedges the reference.
struct ReferenceClaim<'a> {
    set: &'a Mutex<HashSet<String>>,
    reference: String,
}

impl Drop for ReferenceClaim<'_> {
    fn drop(&mut self) {
        if let Ok(mut set) = self.set.lock() {
            set.remove(&self.reference);
        }
    }
}

impl<S: AccountStore + JournalStore> JournalService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Record one journal entry.
    #[instrument(
        skip(self, description, reference),
        fields(cuenta = %account, kind = ?kind, %amount),
        err
    )]
    #[allow(clippy::too_many_arguments)]
    pub async fn record_single(
        &self,
        date: NaiveDate,
        account: AccountCode,
        kind: MovementKind,
        amount: Decimal,
        description: Option<String>,
        reference: Option<String>,
        recorded_by: &str,
    ) -> LedgerResult<JournalEntry> {
        self.require_active(&account).await?;
        let entry =
            JournalEntry::new(date, account, kind, amount, description, reference, recorded_by)?;
        JournalStore::insert(self.store.as_ref(), &entry).await?;
        Ok(entry)
    }

    /// Record a balanced double-entry pair.
    ///
    /// When the backend supports a multi-row transaction both rows commit
    /// atomically. Otherwise: insert the debit row, then the credit row; if
    /// the credit insert fails, delete the debit row (compensation); if the
    /// compensation also fails, return [`LedgerError::PartialWrite`] carrying
    /// the orphaned entry id for manual reconciliation.
    #[instrument(
        skip(self, description, reference),
        fields(debe = %debit_account, haber = %credit_account, %amount),
        err
    )]
    #[allow(clippy::too_many_arguments)]
    pub async fn record_double_entry(
        &self,
        date: NaiveDate,
        debit_account: AccountCode,
        credit_account: AccountCode,
        amount: Decimal,
        description: Option<String>,
        reference: Option<String>,
        recorded_by: &str,
    ) -> LedgerResult<(JournalEntry, JournalEntry)> {
        self.require_active(&debit_account).await?;
        self.require_active(&credit_account).await?;

        let reference = reference.unwrap_or_else(|| Uuid::now_v7().to_string());
        let (debit, credit) = balanced_pair(
            date,
            debit_account,
            credit_account,
            amount,
            description,
            reference.clone(),
            recorded_by,
        )?;

        let _claim = self.claim_reference(&reference)?;

        if !self.store.select_by_reference(&reference).await?.is_empty() {
            return Err(LedgerError::DuplicateReference(reference));
        }

        if self.store.insert_pair(&debit, &credit).await? == PairInsert::Committed {
            return Ok((debit, credit));
        }

        // Two-phase write on a backend without multi-row transactions.
        JournalStore::insert(self.store.as_ref(), &debit).await?;
        if let Err(credit_err) = JournalStore::insert(self.store.as_ref(), &credit).await {
            warn!(
                reference = %reference,
                error = %credit_err,
                "credit insert failed, compensating debit row"
            );
            return match self.store.delete(debit.id).await {
                Ok(_) => Err(credit_err.into()),
                Err(compensation_err) => {
                    error!(
                        orphan = %debit.id,
                        reference = %reference,
                        error = %compensation_err,
                        "compensation failed, orphaned debit row needs manual reconciliation"
                    );
                    Err(LedgerError::PartialWrite {
                        orphan: debit.id,
                        reference,
                    })
                }
            };
        }

        Ok((debit, credit))
    }

    /// Remove a single journal entry with no compensating reversal.
    ///
    /// This breaks double-entry balance when applied to half of a pair;
    /// callers that need auditability should use [`Self::record_reversal`]
    /// instead. Returns whether a row was removed.
    #[instrument(skip(self), fields(entry_id = %id), err)]
    pub async fn delete(&self, id: EntryId) -> LedgerResult<bool> {
        let removed = self.store.delete(id).await?;
        if removed {
            warn!(entry_id = %id, "journal entry deleted without a reversing entry");
        }
        Ok(removed)
    }

    /// Append the entry that undoes an existing one (opposite movement kind,
    /// same account/amount/reference), preserving the append-only trail.
    #[instrument(skip(self), fields(entry_id = %id), err)]
    pub async fn record_reversal(
        &self,
        id: EntryId,
        date: NaiveDate,
        recorded_by: &str,
    ) -> LedgerResult<JournalEntry> {
        let original = self
            .store
            .fetch_entry(id)
            .await?
            .ok_or_else(|| LedgerError::validation(format!("no journal entry {id}")))?;
        let reversal = original.reversal(date, recorded_by);
        JournalStore::insert(self.store.as_ref(), &reversal).await?;
        Ok(reversal)
    }

    async fn require_active(&self, code: &AccountCode) -> LedgerResult<Account> {
        let account = self
            .store
            .fetch(code)
            .await?
            .ok_or_else(|| LedgerError::unknown_account(code.as_str()))?;
        if !account.active {
            return Err(LedgerError::inactive_account(code.as_str()));
        }
        Ok(account)
    }

    fn claim_reference(&self, reference: &str) -> LedgerResult<ReferenceClaim<'_>> {
        let mut set = self
            .in_flight
            .lock()
            .map_err(|_| LedgerError::store_unavailable("in-flight set poisoned"))?;
        if !set.insert(reference.to_string()) {
            return Err(LedgerError::conflict(format!(
                "double entry for reference {reference} already in flight"
            )));
        }
        drop(set);
        Ok(ReferenceClaim {
            set: &self.in_flight,
            reference: reference.to_string(),
        })
    }
}
