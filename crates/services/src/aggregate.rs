//! Ledger aggregation over the persisted journal.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{instrument, warn};

use libromayor_accounting::{LedgerFold, LedgerView};
use libromayor_core::{AccountCode, LedgerResult};
use libromayor_infra::{AccountStore, EntryFilter, JournalStore, Pagination};

/// Computes per-account debit/credit totals and sign-adjusted balances.
///
/// Pure read: no state is kept between calls, so calling twice with identical
/// arguments and no intervening writes returns identical results.
#[derive(Debug, Clone)]
pub struct LedgerAggregator<S> {
    store: Arc<S>,
    page_size: u32,
}

impl<S: AccountStore + JournalStore> LedgerAggregator<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            page_size: Pagination::default().limit,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Aggregate entries in `[from, to]` (unbounded where `None`), for one
    /// account or for every account touched in the range.
    ///
    /// Entries are streamed page by page rather than materialized, bounding
    /// memory as the journal grows. Output lines are sorted by account code.
    #[instrument(skip(self), fields(account = ?account.as_ref().map(AccountCode::as_str)), err)]
    pub async fn aggregate(
        &self,
        account: Option<AccountCode>,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> LedgerResult<LedgerView> {
        let filter = EntryFilter { account, from, to };
        let mut fold = LedgerFold::new();
        let mut page = Pagination::new(Some(self.page_size), None);

        loop {
            let rows = self.store.select(&filter, page).await?;
            let fetched = rows.len();
            for entry in &rows {
                fold.add(entry);
            }
            if fetched < page.limit as usize {
                break;
            }
            page = page.next_page();
        }

        let chart: BTreeMap<_, _> = self
            .store
            .list()
            .await?
            .into_iter()
            .map(|a| (a.code.clone(), a))
            .collect();

        let view = fold.finish(&chart);
        for code in view.unresolved_codes() {
            // Statement building must not fail on data content; these lines
            // fell back to the raw debit-normal convention.
            warn!(cuenta = %code, "journal references an account missing from the registry");
        }
        Ok(view)
    }
}
