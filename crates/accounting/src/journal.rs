//! Journal entry model.
//!
//! A journal entry is an immutable financial fact: once created there is no
//! update path. Sign is carried by the movement kind; the amount is always
//! strictly positive.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use libromayor_core::{AccountCode, EntryId, LedgerError};

/// The two movement kinds of a journal entry.
///
/// Persisted as the original Spanish column values (`debe`/`haber`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementKind {
    #[serde(rename = "debe")]
    Debit,
    #[serde(rename = "haber")]
    Credit,
}

impl MovementKind {
    pub fn opposite(self) -> Self {
        match self {
            MovementKind::Debit => MovementKind::Credit,
            MovementKind::Credit => MovementKind::Debit,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MovementKind::Debit => "debe",
            MovementKind::Credit => "haber",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "debe" => Some(MovementKind::Debit),
            "haber" => Some(MovementKind::Credit),
            _ => None,
        }
    }
}

/// A single journal entry row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: EntryId,
    /// Business date of the movement (`fecha`).
    pub date: NaiveDate,
    /// Account posted to (`cuenta`).
    pub account: AccountCode,
    pub description: Option<String>,
    pub kind: MovementKind,
    /// Strictly positive fixed-point amount (`monto`).
    pub amount: Decimal,
    /// Free-text correlation to a source document (`referencia`). Double-entry
    /// pairs share this value.
    pub reference: Option<String>,
    /// Opaque identity label of whoever recorded the entry (`usuario`).
    pub recorded_by: String,
    pub created_at: DateTime<Utc>,
}

impl JournalEntry {
    /// Validating constructor; the one place `amount > 0` is enforced.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        date: NaiveDate,
        account: AccountCode,
        kind: MovementKind,
        amount: Decimal,
        description: Option<String>,
        reference: Option<String>,
        recorded_by: impl Into<String>,
    ) -> Result<Self, LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(amount));
        }
        Ok(Self {
            id: EntryId::new(),
            date,
            account,
            description,
            kind,
            amount,
            reference,
            recorded_by: recorded_by.into(),
            created_at: Utc::now(),
        })
    }

    /// Signed amount under the raw debit-positive convention.
    pub fn signed_amount(&self) -> Decimal {
        match self.kind {
            MovementKind::Debit => self.amount,
            MovementKind::Credit => -self.amount,
        }
    }

    /// Build the entry that undoes this one: same account, date as given,
    /// opposite movement kind, same amount and reference.
    pub fn reversal(&self, date: NaiveDate, recorded_by: impl Into<String>) -> Self {
        Self {
            id: EntryId::new(),
            date,
            account: self.account.clone(),
            description: Some(match &self.description {
                Some(d) => format!("reversa: {d}"),
                None => "reversa".to_string(),
            }),
            kind: self.kind.opposite(),
            amount: self.amount,
            reference: self.reference.clone(),
            recorded_by: recorded_by.into(),
            created_at: Utc::now(),
        }
    }
}

/// Build the two rows of a double-entry pair.
///
/// Both rows share date, description, reference, amount and creation time;
/// they differ only in account and movement kind (one debit, one credit).
#[allow(clippy::too_many_arguments)]
pub fn balanced_pair(
    date: NaiveDate,
    debit_account: AccountCode,
    credit_account: AccountCode,
    amount: Decimal,
    description: Option<String>,
    reference: String,
    recorded_by: &str,
) -> Result<(JournalEntry, JournalEntry), LedgerError> {
    if debit_account == credit_account {
        return Err(LedgerError::validation(
            "double entry requires two distinct accounts",
        ));
    }
    let mut debit = JournalEntry::new(
        date,
        debit_account,
        MovementKind::Debit,
        amount,
        description.clone(),
        Some(reference.clone()),
        recorded_by,
    )?;
    let credit = JournalEntry::new(
        date,
        credit_account,
        MovementKind::Credit,
        amount,
        description,
        Some(reference),
        recorded_by,
    )?;
    // Pairing is logical (shared reference/timestamp), not a foreign key.
    debit.created_at = credit.created_at;
    Ok((debit, credit))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(s: &str) -> AccountCode {
        AccountCode::new(s).unwrap()
    }

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn rejects_non_positive_amounts() {
        for amount in [Decimal::ZERO, Decimal::from(-5)] {
            let err = JournalEntry::new(
                day("2024-01-01"),
                code("1010"),
                MovementKind::Debit,
                amount,
                None,
                None,
                "cajero1",
            )
            .unwrap_err();
            assert_eq!(err, LedgerError::InvalidAmount(amount));
        }
    }

    #[test]
    fn balanced_pair_shares_reference_and_amount() {
        let (debit, credit) = balanced_pair(
            day("2024-01-01"),
            code("1010"),
            code("4010"),
            Decimal::from(500),
            Some("venta mostrador".to_string()),
            "ref-77".to_string(),
            "cajero1",
        )
        .unwrap();

        assert_eq!(debit.kind, MovementKind::Debit);
        assert_eq!(credit.kind, MovementKind::Credit);
        assert_eq!(debit.amount, credit.amount);
        assert_eq!(debit.reference, credit.reference);
        assert_eq!(debit.date, credit.date);
        assert_eq!(debit.created_at, credit.created_at);
        assert_ne!(debit.account, credit.account);
        assert_ne!(debit.id, credit.id);
        // Pair property: debit total equals credit total.
        assert_eq!(debit.signed_amount() + credit.signed_amount(), Decimal::ZERO);
    }

    #[test]
    fn balanced_pair_rejects_same_account_on_both_sides() {
        let err = balanced_pair(
            day("2024-01-01"),
            code("1010"),
            code("1010"),
            Decimal::from(10),
            None,
            "ref-1".to_string(),
            "cajero1",
        )
        .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[test]
    fn reversal_flips_kind_and_keeps_amount() {
        let entry = JournalEntry::new(
            day("2024-02-10"),
            code("1010"),
            MovementKind::Debit,
            Decimal::from(125),
            Some("ajuste".to_string()),
            Some("ref-9".to_string()),
            "admin",
        )
        .unwrap();

        let rev = entry.reversal(day("2024-02-11"), "admin");
        assert_eq!(rev.kind, MovementKind::Credit);
        assert_eq!(rev.amount, entry.amount);
        assert_eq!(rev.account, entry.account);
        assert_eq!(rev.reference, entry.reference);
        assert_eq!(entry.signed_amount() + rev.signed_amount(), Decimal::ZERO);
    }
}
