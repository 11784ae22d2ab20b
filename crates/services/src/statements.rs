//! Financial statement derivation.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{instrument, warn};

use libromayor_accounting::statements;
use libromayor_accounting::{BalanceSheet, IncomeStatement};
use libromayor_core::{LedgerError, LedgerResult};
use libromayor_infra::{AccountStore, JournalStore};

use crate::aggregate::LedgerAggregator;

/// Derives the balance sheet and income statement.
///
/// Both builders are pure functions of (registry state, entry log, dates):
/// safe to recompute any number of times and to call concurrently with
/// unrelated writes. They fail only on store unavailability, never on data
/// content.
#[derive(Debug, Clone)]
pub struct FinancialStatementBuilder<S> {
    aggregator: LedgerAggregator<S>,
}

impl<S: AccountStore + JournalStore> FinancialStatementBuilder<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            aggregator: LedgerAggregator::new(store),
        }
    }

    pub fn from_aggregator(aggregator: LedgerAggregator<S>) -> Self {
        Self { aggregator }
    }

    /// Balance sheet at `cutoff`: cumulative from the beginning of the journal.
    ///
    /// An imbalance (assets ≠ liabilities + equity beyond 0.01) is attached to
    /// the result as a non-fatal warning; historical data may legitimately be
    /// inconsistent when entries were deleted without reversal, and with no
    /// period-closing step any unclosed revenue/expense activity also lands in
    /// the difference.
    #[instrument(skip(self), err)]
    pub async fn build_balance_sheet(&self, cutoff: NaiveDate) -> LedgerResult<BalanceSheet> {
        let view = self.aggregator.aggregate(None, None, Some(cutoff)).await?;
        let sheet = statements::balance_sheet(cutoff, &view);
        if sheet.imbalance {
            warn!(
                cutoff = %cutoff,
                difference = %sheet.difference,
                "balance sheet does not satisfy assets = liabilities + equity"
            );
        }
        Ok(sheet)
    }

    /// Income statement over `[start, end]`: in-range activity only, not
    /// cumulative-to-date.
    #[instrument(skip(self), err)]
    pub async fn build_income_statement(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> LedgerResult<IncomeStatement> {
        if end < start {
            return Err(LedgerError::validation(format!(
                "period end {end} precedes start {start}"
            )));
        }
        let view = self
            .aggregator
            .aggregate(None, Some(start), Some(end))
            .await?;
        Ok(statements::income_statement(start, end, &view))
    }
}
