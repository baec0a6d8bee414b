//! SQLite repository adapter.
#![allow(clippy::collapsible_if)]

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{FromRow, Sqlite, SqlitePool};
use std::str::FromStr;
use tokio::sync::Mutex;

use balance_types::{
    BalanceRepository, Deposit, DepositStore, HistoryQuery, NewTransaction, OwnerId, RepoError,
    Transaction, TransactionId, TransactionLedger, UnitOfWork,
};

use crate::types::{check_new_transaction, decode_error, map_db_error, map_tx_error, order_clause};

// ─────────────────────────────────────────────────────────────────────────────
// Rows
// ─────────────────────────────────────────────────────────────────────────────

#[derive(FromRow)]
struct DepositRow {
    owner_id: String,
    balance: i64,
}

impl DepositRow {
    fn into_domain(self) -> Result<Deposit, RepoError> {
        let owner_id = OwnerId::from_str(&self.owner_id).map_err(decode_error)?;
        Ok(Deposit::from_parts(owner_id, self.balance)?)
    }
}

#[derive(FromRow)]
struct TransactionRow {
    id: i64,
    sender_id: Option<String>,
    recipient_id: Option<String>,
    amount: i64,
    description: String,
    transaction_date: String,
}

impl TransactionRow {
    fn into_domain(self) -> Result<Transaction, RepoError> {
        let parse_owner = |s: Option<String>| {
            s.map(|s| OwnerId::from_str(&s))
                .transpose()
                .map_err(decode_error)
        };

        Ok(Transaction {
            id: TransactionId::from_i64(self.id),
            sender_id: parse_owner(self.sender_id)?,
            recipient_id: parse_owner(self.recipient_id)?,
            amount: self.amount,
            description: self.description,
            transaction_date: DateTime::parse_from_rfc3339(&self.transaction_date)
                .map_err(decode_error)?
                .with_timezone(&Utc),
        })
    }
}

/// Fixed-width RFC 3339 so that text order is time order.
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

// ─────────────────────────────────────────────────────────────────────────────
// Queries (shared by the pool and by units of work)
// ─────────────────────────────────────────────────────────────────────────────

async fn get_deposit<'e, E>(exec: E, owner_id: OwnerId) -> Result<Option<Deposit>, RepoError>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let row: Option<DepositRow> =
        sqlx::query_as(r#"SELECT owner_id, balance FROM deposits WHERE owner_id = ?"#)
            .bind(owner_id.to_string())
            .fetch_optional(exec)
            .await
            .map_err(map_db_error)?;

    row.map(DepositRow::into_domain).transpose()
}

async fn create_deposit<'e, E>(exec: E, deposit: &Deposit) -> Result<(), RepoError>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query(r#"INSERT INTO deposits (owner_id, balance) VALUES (?, ?)"#)
        .bind(deposit.owner_id.to_string())
        .bind(deposit.balance())
        .execute(exec)
        .await
        .map_err(map_db_error)?;
    Ok(())
}

async fn update_deposit<'e, E>(exec: E, deposit: &Deposit) -> Result<(), RepoError>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(r#"UPDATE deposits SET balance = ? WHERE owner_id = ?"#)
        .bind(deposit.balance())
        .bind(deposit.owner_id.to_string())
        .execute(exec)
        .await
        .map_err(map_db_error)?;

    if result.rows_affected() == 0 {
        return Err(RepoError::NotFound);
    }
    Ok(())
}

async fn count_deposits<'e, E>(exec: E) -> Result<i64, RepoError>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query_scalar(r#"SELECT COUNT(*) FROM deposits"#)
        .fetch_one(exec)
        .await
        .map_err(map_db_error)
}

async fn append_transaction<'e, E>(exec: E, tx: NewTransaction) -> Result<Transaction, RepoError>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    check_new_transaction(&tx)?;

    let result = sqlx::query(
        r#"INSERT INTO transactions (sender_id, recipient_id, amount, description, transaction_date)
           VALUES (?, ?, ?, ?, ?)"#,
    )
    .bind(tx.sender_id.map(|id| id.to_string()))
    .bind(tx.recipient_id.map(|id| id.to_string()))
    .bind(tx.amount)
    .bind(&tx.description)
    .bind(format_timestamp(&tx.transaction_date))
    .execute(exec)
    .await
    .map_err(map_db_error)?;

    Ok(tx.into_transaction(TransactionId::from_i64(result.last_insert_rowid())))
}

async fn list_for_account<'e, E>(exec: E, query: &HistoryQuery) -> Result<Vec<Transaction>, RepoError>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    // LIMIT -1 is unbounded in SQLite
    let sql = format!(
        "SELECT id, sender_id, recipient_id, amount, description, transaction_date \
         FROM transactions WHERE sender_id = ?1 OR recipient_id = ?1 {} LIMIT ?2 OFFSET ?3",
        order_clause(query)
    );

    let rows: Vec<TransactionRow> = sqlx::query_as(&sql)
        .bind(query.owner_id.to_string())
        .bind(query.limit.unwrap_or(-1))
        .bind(query.offset)
        .fetch_all(exec)
        .await
        .map_err(map_db_error)?;

    rows.into_iter().map(TransactionRow::into_domain).collect()
}

async fn count_transactions<'e, E>(exec: E) -> Result<i64, RepoError>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query_scalar(r#"SELECT COUNT(*) FROM transactions"#)
        .fetch_one(exec)
        .await
        .map_err(map_db_error)
}

// ─────────────────────────────────────────────────────────────────────────────
// SQLite Repository
// ─────────────────────────────────────────────────────────────────────────────

/// SQLite repository implementation.
///
/// SQLite has a single writer, so the pool holds exactly one connection and
/// keeps it for the life of the repository (this also keeps `:memory:`
/// databases alive). While a unit of work is open, pool-level calls wait for
/// it to finish.
pub struct SqliteRepo {
    pool: SqlitePool,
}

/// Executes SQL statements from a migration file, splitting by semicolons.
async fn run_migrations(pool: &SqlitePool) -> Result<(), RepoError> {
    let ddl = include_str!("../migrations/0001_create_deposits_and_transactions.sql");
    for statement in ddl.split(';') {
        let stmt = statement.trim();
        if !stmt.is_empty() {
            sqlx::query(stmt)
                .execute(pool)
                .await
                .map_err(|e| RepoError::Database(format!("Migration 0001 failed: {}", e)))?;
        }
    }
    Ok(())
}

impl SqliteRepo {
    /// Creates a new SQLite repository with automatic migration.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Ensure on-disk SQLite target directory exists (no-op for in-memory).
        if let Some(path) = database_url.strip_prefix("sqlite://") {
            let path = path.split('?').next().unwrap_or(path);
            if path != ":memory:" {
                if let Some(parent) = std::path::Path::new(path).parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        run_migrations(&pool).await?;
        tracing::debug!(url = %database_url, "SQLite repository ready");

        Ok(Self { pool })
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl DepositStore for SqliteRepo {
    async fn get_deposit(&self, owner_id: OwnerId) -> Result<Option<Deposit>, RepoError> {
        get_deposit(&self.pool, owner_id).await
    }

    async fn create_deposit(&self, deposit: &Deposit) -> Result<(), RepoError> {
        create_deposit(&self.pool, deposit).await
    }

    async fn update_deposit(&self, deposit: &Deposit) -> Result<(), RepoError> {
        update_deposit(&self.pool, deposit).await
    }

    async fn count_deposits(&self) -> Result<i64, RepoError> {
        count_deposits(&self.pool).await
    }
}

#[async_trait]
impl TransactionLedger for SqliteRepo {
    async fn append_transaction(&self, tx: NewTransaction) -> Result<Transaction, RepoError> {
        append_transaction(&self.pool, tx).await
    }

    async fn list_for_account(&self, query: &HistoryQuery) -> Result<Vec<Transaction>, RepoError> {
        list_for_account(&self.pool, query).await
    }

    async fn count_transactions(&self) -> Result<i64, RepoError> {
        count_transactions(&self.pool).await
    }
}

#[async_trait]
impl BalanceRepository for SqliteRepo {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, RepoError> {
        let tx = self.pool.begin().await.map_err(map_tx_error)?;
        Ok(Box::new(SqliteUnitOfWork { tx: Mutex::new(tx) }))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Unit of work
// ─────────────────────────────────────────────────────────────────────────────

/// One SQLite transaction. Dropped without commit, it rolls back.
pub struct SqliteUnitOfWork {
    tx: Mutex<sqlx::Transaction<'static, Sqlite>>,
}

#[async_trait]
impl DepositStore for SqliteUnitOfWork {
    async fn get_deposit(&self, owner_id: OwnerId) -> Result<Option<Deposit>, RepoError> {
        let mut tx = self.tx.lock().await;
        get_deposit(&mut **tx, owner_id).await
    }

    async fn create_deposit(&self, deposit: &Deposit) -> Result<(), RepoError> {
        let mut tx = self.tx.lock().await;
        create_deposit(&mut **tx, deposit).await
    }

    async fn update_deposit(&self, deposit: &Deposit) -> Result<(), RepoError> {
        let mut tx = self.tx.lock().await;
        update_deposit(&mut **tx, deposit).await
    }

    async fn count_deposits(&self) -> Result<i64, RepoError> {
        let mut tx = self.tx.lock().await;
        count_deposits(&mut **tx).await
    }
}

#[async_trait]
impl TransactionLedger for SqliteUnitOfWork {
    async fn append_transaction(&self, new_tx: NewTransaction) -> Result<Transaction, RepoError> {
        let mut tx = self.tx.lock().await;
        append_transaction(&mut **tx, new_tx).await
    }

    async fn list_for_account(&self, query: &HistoryQuery) -> Result<Vec<Transaction>, RepoError> {
        let mut tx = self.tx.lock().await;
        list_for_account(&mut **tx, query).await
    }

    async fn count_transactions(&self) -> Result<i64, RepoError> {
        let mut tx = self.tx.lock().await;
        count_transactions(&mut **tx).await
    }
}

#[async_trait]
impl UnitOfWork for SqliteUnitOfWork {
    async fn commit(self: Box<Self>) -> Result<(), RepoError> {
        self.tx.into_inner().commit().await.map_err(map_tx_error)
    }
}
