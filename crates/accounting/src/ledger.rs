//! Ledger aggregation: per-account debit/credit totals and sign-adjusted
//! balances over a set of journal entries.
//!
//! The fold is incremental so callers can stream entries page by page instead
//! of materializing a whole date range in memory.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use libromayor_core::AccountCode;

use crate::account::{Account, AccountType};
use crate::journal::{JournalEntry, MovementKind};

/// Per-account aggregate over a date range. Derived, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerLine {
    pub account_code: AccountCode,
    pub account_name: String,
    /// `None` when the entry log references a code missing from the registry;
    /// such lines fall back to the raw debit-normal convention.
    pub account_type: Option<AccountType>,
    pub total_debit: Decimal,
    pub total_credit: Decimal,
    /// Sign-adjusted balance: debit-normal types net `debit - credit`,
    /// credit-normal types net `credit - debit`.
    pub balance: Decimal,
}

/// Ordered ledger lines plus trial-balance grand totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerView {
    /// Sorted by account code (lexicographic).
    pub lines: Vec<LedgerLine>,
    pub total_debit: Decimal,
    pub total_credit: Decimal,
}

impl LedgerView {
    /// Codes that could not be resolved against the chart of accounts.
    pub fn unresolved_codes(&self) -> impl Iterator<Item = &AccountCode> {
        self.lines
            .iter()
            .filter(|l| l.account_type.is_none())
            .map(|l| &l.account_code)
    }
}

/// Incremental debit/credit accumulator, keyed by account code.
#[derive(Debug, Default)]
pub struct LedgerFold {
    totals: BTreeMap<AccountCode, (Decimal, Decimal)>,
}

impl LedgerFold {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, entry: &JournalEntry) {
        let slot = self
            .totals
            .entry(entry.account.clone())
            .or_insert((Decimal::ZERO, Decimal::ZERO));
        match entry.kind {
            MovementKind::Debit => slot.0 += entry.amount,
            MovementKind::Credit => slot.1 += entry.amount,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    /// Resolve the accumulated totals against the chart of accounts.
    ///
    /// Output order follows the `BTreeMap` key order, i.e. sorted by code.
    pub fn finish(self, accounts: &BTreeMap<AccountCode, Account>) -> LedgerView {
        let mut total_debit = Decimal::ZERO;
        let mut total_credit = Decimal::ZERO;
        let mut lines = Vec::with_capacity(self.totals.len());

        for (code, (debit, credit)) in self.totals {
            total_debit += debit;
            total_credit += credit;

            let account = accounts.get(&code);
            let kind = account.map(|a| a.kind);
            let name = account
                .map(|a| a.name.clone())
                .unwrap_or_else(|| code.to_string());

            lines.push(LedgerLine {
                account_code: code,
                account_name: name,
                account_type: kind,
                total_debit: debit,
                total_credit: credit,
                balance: signed_balance(kind, debit, credit),
            });
        }

        LedgerView {
            lines,
            total_debit,
            total_credit,
        }
    }
}

/// Apply the fixed sign table of the account type to raw totals.
pub fn signed_balance(
    kind: Option<AccountType>,
    total_debit: Decimal,
    total_credit: Decimal,
) -> Decimal {
    match kind {
        Some(k) if !k.is_debit_normal() => total_credit - total_debit,
        // Debit-normal, and the fallback for unresolved accounts.
        _ => total_debit - total_credit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn code(s: &str) -> AccountCode {
        AccountCode::new(s).unwrap()
    }

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn entry(account: &str, kind: MovementKind, amount: i64) -> JournalEntry {
        JournalEntry::new(
            day("2024-01-15"),
            code(account),
            kind,
            Decimal::from(amount),
            None,
            None,
            "cajero1",
        )
        .unwrap()
    }

    fn chart() -> BTreeMap<AccountCode, Account> {
        let mut accounts = BTreeMap::new();
        for (c, name, kind) in [
            ("1010", "Caja", AccountType::Asset),
            ("2010", "Proveedores", AccountType::Liability),
            ("4010", "Ventas", AccountType::Revenue),
            ("5010", "Gastos", AccountType::Expense),
        ] {
            accounts.insert(code(c), Account::new(code(c), name, kind, None));
        }
        accounts
    }

    #[test]
    fn folds_totals_per_account_sorted_by_code() {
        let mut fold = LedgerFold::new();
        fold.add(&entry("4010", MovementKind::Credit, 500));
        fold.add(&entry("1010", MovementKind::Debit, 500));
        fold.add(&entry("1010", MovementKind::Credit, 120));
        fold.add(&entry("5010", MovementKind::Debit, 120));

        let view = fold.finish(&chart());
        let codes: Vec<&str> = view.lines.iter().map(|l| l.account_code.as_str()).collect();
        assert_eq!(codes, vec!["1010", "4010", "5010"]);

        assert_eq!(view.lines[0].balance, Decimal::from(380)); // asset: 500 - 120
        assert_eq!(view.lines[1].balance, Decimal::from(500)); // revenue: 500 - 0
        assert_eq!(view.lines[2].balance, Decimal::from(120)); // expense: 120 - 0
        assert_eq!(view.total_debit, Decimal::from(620));
        assert_eq!(view.total_credit, Decimal::from(620));
    }

    #[test]
    fn unresolved_account_falls_back_to_debit_normal() {
        let mut fold = LedgerFold::new();
        fold.add(&entry("9999", MovementKind::Debit, 70));
        fold.add(&entry("9999", MovementKind::Credit, 20));

        let view = fold.finish(&chart());
        assert_eq!(view.lines.len(), 1);
        assert_eq!(view.lines[0].account_type, None);
        assert_eq!(view.lines[0].balance, Decimal::from(50));
        assert_eq!(
            view.unresolved_codes().collect::<Vec<_>>(),
            vec![&code("9999")]
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: the folded balance equals the sign-adjusted cumulative
        /// sum of the entry sequence, for both normal-balance conventions.
        #[test]
        fn balance_is_sign_adjusted_cumulative_sum(
            movements in prop::collection::vec((any::<bool>(), 1i64..1_000_000i64), 1..50)
        ) {
            let mut debit_sum = Decimal::ZERO;
            let mut credit_sum = Decimal::ZERO;
            let mut fold = LedgerFold::new();

            for (is_debit, amount) in &movements {
                let kind = if *is_debit { MovementKind::Debit } else { MovementKind::Credit };
                // 1010 = asset (debit-normal), 4010 = revenue (credit-normal).
                fold.add(&entry("1010", kind, *amount));
                fold.add(&entry("4010", kind, *amount));
                if *is_debit {
                    debit_sum += Decimal::from(*amount);
                } else {
                    credit_sum += Decimal::from(*amount);
                }
            }

            let view = fold.finish(&chart());
            let asset = view.lines.iter().find(|l| l.account_code.as_str() == "1010").unwrap();
            let revenue = view.lines.iter().find(|l| l.account_code.as_str() == "4010").unwrap();

            prop_assert_eq!(asset.balance, debit_sum - credit_sum);
            prop_assert_eq!(revenue.balance, credit_sum - debit_sum);
            prop_assert_eq!(asset.balance + revenue.balance, Decimal::ZERO);
        }
    }
}
