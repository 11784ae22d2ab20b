//! Postgres-backed ledger store.
//!
//! Unlike the remote store the original integration talked to, Postgres *does*
//! offer multi-row transactions, so `insert_pair` commits both halves of a
//! double-entry pair atomically and the two-phase compensation path is never
//! needed on this backend.
//!
//! ## Error mapping
//!
//! | SQLx error | Postgres code | StoreError |
//! |------------|---------------|------------|
//! | Database (unique violation) | `23505` | `DuplicateKey` |
//! | ColumnDecode / Decode | n/a | `Decode` |
//! | everything else (pool, io, timeouts) | any | `Unavailable` |

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use libromayor_accounting::{Account, AccountType, JournalEntry, MovementKind};
use libromayor_core::{AccountCode, EntryId};

use super::{AccountStore, EntryFilter, JournalStore, PairInsert, Pagination, StoreError};

/// Thread-safe (pool is `Arc + Send + Sync`); clone freely.
#[derive(Debug, Clone)]
pub struct PostgresLedgerStore {
    pool: Arc<PgPool>,
}

impl PostgresLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            if db_err.code().as_deref() == Some("23505") {
                StoreError::DuplicateKey(msg)
            } else {
                StoreError::Unavailable(msg)
            }
        }
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
            StoreError::Decode(format!("decode failure in {operation}: {err}"))
        }
        _ => StoreError::Unavailable(format!("sqlx error in {operation}: {err}")),
    }
}

// Row shapes, decoded once at the boundary into validated domain types.

struct AccountRow {
    code: String,
    name: String,
    kind: String,
    parent_code: Option<String>,
    active: bool,
}

impl AccountRow {
    fn read(row: &sqlx::postgres::PgRow) -> Result<Self, StoreError> {
        Ok(Self {
            code: row.try_get("code").map_err(decode)?,
            name: row.try_get("name").map_err(decode)?,
            kind: row.try_get("type").map_err(decode)?,
            parent_code: row.try_get("parent_code").map_err(decode)?,
            active: row.try_get("active").map_err(decode)?,
        })
    }

    fn into_account(self) -> Result<Account, StoreError> {
        let kind = AccountType::parse(&self.kind)
            .ok_or_else(|| StoreError::Decode(format!("unknown account type: {}", self.kind)))?;
        let code = AccountCode::new(self.code)
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        let parent = match self.parent_code {
            Some(p) => Some(AccountCode::new(p).map_err(|e| StoreError::Decode(e.to_string()))?),
            None => None,
        };
        Ok(Account {
            code,
            name: self.name,
            kind,
            parent,
            active: self.active,
        })
    }
}

struct EntryRow {
    id: Uuid,
    fecha: NaiveDate,
    cuenta: String,
    descripcion: Option<String>,
    tipo_movimiento: String,
    monto: Decimal,
    referencia: Option<String>,
    usuario: String,
    created_at: DateTime<Utc>,
}

impl EntryRow {
    fn read(row: &sqlx::postgres::PgRow) -> Result<Self, StoreError> {
        Ok(Self {
            id: row.try_get("id").map_err(decode)?,
            fecha: row.try_get("fecha").map_err(decode)?,
            cuenta: row.try_get("cuenta").map_err(decode)?,
            descripcion: row.try_get("descripcion").map_err(decode)?,
            tipo_movimiento: row.try_get("tipo_movimiento").map_err(decode)?,
            monto: row.try_get("monto").map_err(decode)?,
            referencia: row.try_get("referencia").map_err(decode)?,
            usuario: row.try_get("usuario").map_err(decode)?,
            created_at: row.try_get("created_at").map_err(decode)?,
        })
    }

    fn into_entry(self) -> Result<JournalEntry, StoreError> {
        let kind = MovementKind::parse(&self.tipo_movimiento).ok_or_else(|| {
            StoreError::Decode(format!("unknown movement kind: {}", self.tipo_movimiento))
        })?;
        let account = AccountCode::new(self.cuenta)
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        Ok(JournalEntry {
            id: EntryId::from_uuid(self.id),
            date: self.fecha,
            account,
            description: self.descripcion,
            kind,
            amount: self.monto,
            reference: self.referencia,
            recorded_by: self.usuario,
            created_at: self.created_at,
        })
    }
}

fn decode(err: sqlx::Error) -> StoreError {
    StoreError::Decode(err.to_string())
}

const INSERT_ENTRY_SQL: &str = r#"
    INSERT INTO journal_entries (
        id, fecha, cuenta, descripcion, tipo_movimiento, monto, referencia, usuario, created_at
    )
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
"#;

fn bind_entry<'q>(
    query: sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>,
    entry: &'q JournalEntry,
) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
    query
        .bind(entry.id.as_uuid())
        .bind(entry.date)
        .bind(entry.account.as_str())
        .bind(entry.description.as_deref())
        .bind(entry.kind.as_str())
        .bind(entry.amount)
        .bind(entry.reference.as_deref())
        .bind(entry.recorded_by.as_str())
        .bind(entry.created_at)
}

const SELECT_ENTRY_COLUMNS: &str = r#"
    SELECT id, fecha, cuenta, descripcion, tipo_movimiento, monto, referencia, usuario, created_at
    FROM journal_entries
"#;

#[async_trait::async_trait]
impl AccountStore for PostgresLedgerStore {
    #[instrument(skip(self, account), fields(code = %account.code), err)]
    async fn insert(&self, account: &Account) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO accounts (code, name, type, parent_code, active)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(account.code.as_str())
        .bind(account.name.as_str())
        .bind(account.kind.as_str())
        .bind(account.parent.as_ref().map(AccountCode::as_str))
        .bind(account.active)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_account", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(code = %code), err)]
    async fn fetch(&self, code: &AccountCode) -> Result<Option<Account>, StoreError> {
        let row = sqlx::query(
            "SELECT code, name, type, parent_code, active FROM accounts WHERE code = $1",
        )
        .bind(code.as_str())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("fetch_account", e))?;

        match row {
            Some(row) => Ok(Some(AccountRow::read(&row)?.into_account()?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self), fields(code = %code, active), err)]
    async fn set_active(&self, code: &AccountCode, active: bool) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE accounts SET active = $2 WHERE code = $1")
            .bind(code.as_str())
            .bind(active)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("set_active", e))?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), err)]
    async fn list(&self) -> Result<Vec<Account>, StoreError> {
        let rows = sqlx::query(
            "SELECT code, name, type, parent_code, active FROM accounts ORDER BY code ASC",
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_accounts", e))?;

        let mut accounts = Vec::with_capacity(rows.len());
        for row in rows {
            accounts.push(AccountRow::read(&row)?.into_account()?);
        }
        Ok(accounts)
    }
}

#[async_trait::async_trait]
impl JournalStore for PostgresLedgerStore {
    #[instrument(skip(self, entry), fields(entry_id = %entry.id, cuenta = %entry.account), err)]
    async fn insert(&self, entry: &JournalEntry) -> Result<(), StoreError> {
        bind_entry(sqlx::query(INSERT_ENTRY_SQL), entry)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert_entry", e))?;
        Ok(())
    }

    #[instrument(
        skip(self, debit, credit),
        fields(debit_id = %debit.id, credit_id = %credit.id),
        err
    )]
    async fn insert_pair(
        &self,
        debit: &JournalEntry,
        credit: &JournalEntry,
    ) -> Result<PairInsert, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_pair", e))?;

        bind_entry(sqlx::query(INSERT_ENTRY_SQL), debit)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("insert_pair_debit", e))?;
        bind_entry(sqlx::query(INSERT_ENTRY_SQL), credit)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("insert_pair_credit", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_pair", e))?;
        Ok(PairInsert::Committed)
    }

    #[instrument(skip(self), fields(entry_id = %id), err)]
    async fn delete(&self, id: EntryId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM journal_entries WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_entry", e))?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), fields(entry_id = %id), err)]
    async fn fetch_entry(&self, id: EntryId) -> Result<Option<JournalEntry>, StoreError> {
        let sql = format!("{SELECT_ENTRY_COLUMNS} WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("fetch_entry", e))?;

        match row {
            Some(row) => Ok(Some(EntryRow::read(&row)?.into_entry()?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, filter), err)]
    async fn select(
        &self,
        filter: &EntryFilter,
        page: Pagination,
    ) -> Result<Vec<JournalEntry>, StoreError> {
        let sql = format!(
            r#"{SELECT_ENTRY_COLUMNS}
            WHERE ($1::text IS NULL OR cuenta = $1)
                AND ($2::date IS NULL OR fecha >= $2)
                AND ($3::date IS NULL OR fecha <= $3)
            ORDER BY fecha ASC, created_at ASC, id ASC
            LIMIT $4 OFFSET $5
            "#
        );
        let rows = sqlx::query(&sql)
            .bind(filter.account.as_ref().map(AccountCode::as_str))
            .bind(filter.from)
            .bind(filter.to)
            .bind(i64::from(page.limit))
            .bind(page.offset as i64)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("select_entries", e))?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            entries.push(EntryRow::read(&row)?.into_entry()?);
        }
        Ok(entries)
    }

    #[instrument(skip(self), err)]
    async fn select_by_reference(
        &self,
        reference: &str,
    ) -> Result<Vec<JournalEntry>, StoreError> {
        let sql = format!(
            "{SELECT_ENTRY_COLUMNS} WHERE referencia = $1 ORDER BY fecha ASC, created_at ASC, id ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(reference)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("select_by_reference", e))?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            entries.push(EntryRow::read(&row)?.into_entry()?);
        }
        Ok(entries)
    }
}
