//! Financial statement assembly.
//!
//! Pure projections over ledger lines and account metadata; never cached as a
//! source of truth. Statement building never fails on data content: an
//! inconsistent entry log surfaces as a non-fatal `imbalance` flag, not an
//! error (historical data may legitimately be inconsistent when entries were
//! deleted without a reversal).

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::account::AccountType;
use crate::ledger::{LedgerLine, LedgerView};

/// Tolerance for the accounting equation check.
fn imbalance_tolerance() -> Decimal {
    // 0.01 in the statement currency.
    Decimal::new(1, 2)
}

/// One bucket of the balance sheet (assets, liabilities or equity).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BalanceSheetSection {
    pub lines: Vec<LedgerLine>,
    pub total: Decimal,
}

impl BalanceSheetSection {
    fn push(&mut self, line: LedgerLine) {
        self.total += line.balance;
        self.lines.push(line);
    }
}

/// Balance sheet at a cutoff date. Derived, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceSheet {
    pub cutoff: NaiveDate,
    pub assets: BalanceSheetSection,
    pub liabilities: BalanceSheetSection,
    pub equity: BalanceSheetSection,
    pub total_assets: Decimal,
    pub total_liabilities_plus_equity: Decimal,
    /// `total_assets - total_liabilities_plus_equity`.
    pub difference: Decimal,
    /// Non-fatal warning: the accounting equation does not hold within
    /// tolerance. With no period-closing step, any revenue/expense activity
    /// before the cutoff will generically set this flag.
    pub imbalance: bool,
}

/// Bucket cumulative-to-cutoff ledger lines into a balance sheet.
///
/// Zero-balance accounts are dropped. Revenue/expense lines (and lines whose
/// account no longer resolves) carry value but belong to no bucket; whatever
/// they hold shows up in `difference`.
pub fn balance_sheet(cutoff: NaiveDate, view: &LedgerView) -> BalanceSheet {
    let mut assets = BalanceSheetSection::default();
    let mut liabilities = BalanceSheetSection::default();
    let mut equity = BalanceSheetSection::default();

    for line in &view.lines {
        if line.balance == Decimal::ZERO {
            continue;
        }
        match line.account_type {
            Some(AccountType::Asset) => assets.push(line.clone()),
            Some(AccountType::Liability) => liabilities.push(line.clone()),
            Some(AccountType::Equity) => equity.push(line.clone()),
            Some(AccountType::Revenue) | Some(AccountType::Expense) | None => {}
        }
    }

    let total_assets = assets.total;
    let total_liabilities_plus_equity = liabilities.total + equity.total;
    let difference = total_assets - total_liabilities_plus_equity;

    BalanceSheet {
        cutoff,
        assets,
        liabilities,
        equity,
        total_assets,
        total_liabilities_plus_equity,
        difference,
        imbalance: difference.abs() > imbalance_tolerance(),
    }
}

/// How a period result is framed for presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultFraming {
    /// `net_income >= 0`.
    Utilidad,
    /// `net_income < 0`.
    Perdida,
}

/// One side of the income statement (revenue or expenses).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IncomeStatementSection {
    pub lines: Vec<LedgerLine>,
    pub total: Decimal,
}

/// Income statement over `[start, end]`. Derived, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeStatement {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub revenue: IncomeStatementSection,
    pub expense: IncomeStatementSection,
    pub total_revenue: Decimal,
    pub total_expense: Decimal,
    /// `total_revenue - total_expense`; the numeric contract is the same
    /// regardless of the `framing` label.
    pub net_income: Decimal,
    pub framing: ResultFraming,
}

/// Net in-range ledger lines into an income statement.
///
/// Only revenue/expense accounts contribute; accounts with zero net activity
/// in the period are excluded from the line items.
pub fn income_statement(start: NaiveDate, end: NaiveDate, view: &LedgerView) -> IncomeStatement {
    let mut revenue = IncomeStatementSection::default();
    let mut expense = IncomeStatementSection::default();

    for line in &view.lines {
        if line.balance == Decimal::ZERO {
            continue;
        }
        match line.account_type {
            Some(AccountType::Revenue) => {
                revenue.total += line.balance;
                revenue.lines.push(line.clone());
            }
            Some(AccountType::Expense) => {
                expense.total += line.balance;
                expense.lines.push(line.clone());
            }
            _ => {}
        }
    }

    let net_income = revenue.total - expense.total;
    IncomeStatement {
        start,
        end,
        total_revenue: revenue.total,
        total_expense: expense.total,
        revenue,
        expense,
        net_income,
        framing: if net_income >= Decimal::ZERO {
            ResultFraming::Utilidad
        } else {
            ResultFraming::Perdida
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::Account;
    use crate::journal::{JournalEntry, MovementKind};
    use crate::ledger::LedgerFold;
    use libromayor_core::AccountCode;
    use std::collections::BTreeMap;

    fn code(s: &str) -> AccountCode {
        AccountCode::new(s).unwrap()
    }

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn chart() -> BTreeMap<AccountCode, Account> {
        let mut accounts = BTreeMap::new();
        for (c, name, kind) in [
            ("1010", "Caja", AccountType::Asset),
            ("2010", "Proveedores", AccountType::Liability),
            ("3010", "Capital", AccountType::Equity),
            ("4010", "Ventas", AccountType::Revenue),
            ("5010", "Gastos", AccountType::Expense),
        ] {
            accounts.insert(code(c), Account::new(code(c), name, kind, None));
        }
        accounts
    }

    fn view(entries: &[(&str, MovementKind, i64)]) -> LedgerView {
        let mut fold = LedgerFold::new();
        for (account, kind, amount) in entries {
            fold.add(
                &JournalEntry::new(
                    day("2024-01-01"),
                    code(account),
                    *kind,
                    Decimal::from(*amount),
                    None,
                    None,
                    "cajero1",
                )
                .unwrap(),
            );
        }
        fold.finish(&chart())
    }

    #[test]
    fn caja_ventas_scenario() {
        // Debit Caja 500, credit Ventas 500.
        let v = view(&[
            ("1010", MovementKind::Debit, 500),
            ("4010", MovementKind::Credit, 500),
        ]);

        let income = income_statement(day("2024-01-01"), day("2024-01-31"), &v);
        assert_eq!(income.total_revenue, Decimal::from(500));
        assert_eq!(income.total_expense, Decimal::ZERO);
        assert_eq!(income.net_income, Decimal::from(500));
        assert_eq!(income.framing, ResultFraming::Utilidad);

        let sheet = balance_sheet(day("2024-01-31"), &v);
        assert_eq!(sheet.assets.lines.len(), 1);
        assert_eq!(sheet.assets.lines[0].account_name, "Caja");
        assert_eq!(sheet.total_assets, Decimal::from(500));
        // Revenue was never closed into equity, so the equation cannot hold.
        assert!(sheet.imbalance);
        assert_eq!(sheet.difference, Decimal::from(500));
    }

    #[test]
    fn balanced_sheet_has_no_imbalance_flag() {
        // Asset funded by equity: 1000 into Caja against Capital.
        let v = view(&[
            ("1010", MovementKind::Debit, 1000),
            ("3010", MovementKind::Credit, 1000),
        ]);
        let sheet = balance_sheet(day("2024-06-30"), &v);
        assert_eq!(sheet.total_assets, Decimal::from(1000));
        assert_eq!(sheet.total_liabilities_plus_equity, Decimal::from(1000));
        assert_eq!(sheet.difference, Decimal::ZERO);
        assert!(!sheet.imbalance);
    }

    #[test]
    fn zero_balance_accounts_are_dropped_from_both_statements() {
        // Caja nets to zero; Ventas/Gastos both carry value.
        let v = view(&[
            ("1010", MovementKind::Debit, 200),
            ("1010", MovementKind::Credit, 200),
            ("4010", MovementKind::Credit, 200),
            ("5010", MovementKind::Debit, 200),
        ]);

        let sheet = balance_sheet(day("2024-01-31"), &v);
        assert!(sheet.assets.lines.is_empty());

        let income = income_statement(day("2024-01-01"), day("2024-01-31"), &v);
        assert_eq!(income.revenue.lines.len(), 1);
        assert_eq!(income.expense.lines.len(), 1);
        assert_eq!(income.net_income, Decimal::ZERO);
        assert_eq!(income.framing, ResultFraming::Utilidad);
    }

    #[test]
    fn expenses_above_revenue_frame_as_perdida() {
        let v = view(&[
            ("5010", MovementKind::Debit, 300),
            ("4010", MovementKind::Credit, 100),
        ]);
        let income = income_statement(day("2024-03-01"), day("2024-03-31"), &v);
        assert_eq!(income.net_income, Decimal::from(-200));
        assert_eq!(income.framing, ResultFraming::Perdida);
    }

    #[test]
    fn liabilities_bucket_uses_credit_normal_balance() {
        let v = view(&[
            ("1010", MovementKind::Debit, 750),
            ("2010", MovementKind::Credit, 750),
        ]);
        let sheet = balance_sheet(day("2024-02-29"), &v);
        assert_eq!(sheet.liabilities.total, Decimal::from(750));
        assert!(!sheet.imbalance);
    }
}
