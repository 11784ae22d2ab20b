//! Chart-of-accounts model and sign conventions.

use serde::{Deserialize, Serialize};

use libromayor_core::AccountCode;

/// High-level account kind (determines normal balance side).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Asset,
    Liability,
    Equity,
    Revenue,
    Expense,
}

/// Which movement side increases an account of a given type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalBalance {
    Debit,
    Credit,
}

impl AccountType {
    /// Fixed sign table: assets and expenses are debit-normal, the rest
    /// credit-normal.
    pub fn normal_balance(self) -> NormalBalance {
        match self {
            AccountType::Asset | AccountType::Expense => NormalBalance::Debit,
            AccountType::Liability | AccountType::Equity | AccountType::Revenue => {
                NormalBalance::Credit
            }
        }
    }

    pub fn is_debit_normal(self) -> bool {
        self.normal_balance() == NormalBalance::Debit
    }

    /// Whether accounts of this type belong on the income statement
    /// (revenue/expense) rather than the balance sheet.
    pub fn is_result_type(self) -> bool {
        matches!(self, AccountType::Revenue | AccountType::Expense)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AccountType::Asset => "asset",
            AccountType::Liability => "liability",
            AccountType::Equity => "equity",
            AccountType::Revenue => "revenue",
            AccountType::Expense => "expense",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "asset" => Some(AccountType::Asset),
            "liability" => Some(AccountType::Liability),
            "equity" => Some(AccountType::Equity),
            "revenue" => Some(AccountType::Revenue),
            "expense" => Some(AccountType::Expense),
            _ => None,
        }
    }
}

/// An account in the chart of accounts.
///
/// Accounts are never hard-deleted: historical entries reference them by code,
/// so the only lifecycle transition after creation is toggling `active`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub code: AccountCode,
    pub name: String,
    pub kind: AccountType,
    /// Optional parent code (self-reference, forms a tree).
    pub parent: Option<AccountCode>,
    pub active: bool,
}

impl Account {
    pub fn new(
        code: AccountCode,
        name: impl Into<String>,
        kind: AccountType,
        parent: Option<AccountCode>,
    ) -> Self {
        Self {
            code,
            name: name.into(),
            kind,
            parent,
            active: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_table_matches_convention() {
        assert!(AccountType::Asset.is_debit_normal());
        assert!(AccountType::Expense.is_debit_normal());
        assert!(!AccountType::Liability.is_debit_normal());
        assert!(!AccountType::Equity.is_debit_normal());
        assert!(!AccountType::Revenue.is_debit_normal());
    }

    #[test]
    fn result_types_are_revenue_and_expense_only() {
        assert!(AccountType::Revenue.is_result_type());
        assert!(AccountType::Expense.is_result_type());
        assert!(!AccountType::Asset.is_result_type());
        assert!(!AccountType::Liability.is_result_type());
        assert!(!AccountType::Equity.is_result_type());
    }

    #[test]
    fn type_round_trips_through_str() {
        for kind in [
            AccountType::Asset,
            AccountType::Liability,
            AccountType::Equity,
            AccountType::Revenue,
            AccountType::Expense,
        ] {
            assert_eq!(AccountType::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(AccountType::parse("banana"), None);
    }
}
