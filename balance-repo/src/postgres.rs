//! PostgreSQL repository adapter.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, PgPool, Postgres};
use tokio::sync::Mutex;
use uuid::Uuid;

use balance_types::{
    BalanceRepository, Deposit, DepositStore, HistoryQuery, NewTransaction, OwnerId, RepoError,
    Transaction, TransactionId, TransactionLedger, UnitOfWork,
};

use crate::types::{check_new_transaction, map_db_error, map_tx_error, order_clause};

// ─────────────────────────────────────────────────────────────────────────────
// Rows
// ─────────────────────────────────────────────────────────────────────────────

#[derive(FromRow)]
struct DepositRow {
    owner_id: Uuid,
    balance: i64,
}

impl DepositRow {
    fn into_domain(self) -> Result<Deposit, RepoError> {
        Ok(Deposit::from_parts(
            OwnerId::from_uuid(self.owner_id),
            self.balance,
        )?)
    }
}

#[derive(FromRow)]
struct TransactionRow {
    id: i64,
    sender_id: Option<Uuid>,
    recipient_id: Option<Uuid>,
    amount: i64,
    description: String,
    transaction_date: DateTime<Utc>,
}

impl From<TransactionRow> for Transaction {
    fn from(row: TransactionRow) -> Self {
        Transaction {
            id: TransactionId::from_i64(row.id),
            sender_id: row.sender_id.map(OwnerId::from_uuid),
            recipient_id: row.recipient_id.map(OwnerId::from_uuid),
            amount: row.amount,
            description: row.description,
            transaction_date: row.transaction_date,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Queries (shared by the pool and by units of work)
// ─────────────────────────────────────────────────────────────────────────────

/// `for_update` takes a row lock held until the enclosing transaction ends.
async fn get_deposit<'e, E>(
    exec: E,
    owner_id: OwnerId,
    for_update: bool,
) -> Result<Option<Deposit>, RepoError>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    let sql = if for_update {
        r#"SELECT owner_id, balance FROM deposits WHERE owner_id = $1 FOR UPDATE"#
    } else {
        r#"SELECT owner_id, balance FROM deposits WHERE owner_id = $1"#
    };

    let row: Option<DepositRow> = sqlx::query_as(sql)
        .bind(owner_id.into_uuid())
        .fetch_optional(exec)
        .await
        .map_err(map_db_error)?;

    row.map(DepositRow::into_domain).transpose()
}

async fn create_deposit<'e, E>(exec: E, deposit: &Deposit) -> Result<(), RepoError>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    sqlx::query(r#"INSERT INTO deposits (owner_id, balance) VALUES ($1, $2)"#)
        .bind(deposit.owner_id.into_uuid())
        .bind(deposit.balance())
        .execute(exec)
        .await
        .map_err(map_db_error)?;
    Ok(())
}

/// Inserts an empty deposit unless one exists, then reads it under a row
/// lock. Concurrent creators of the same owner both succeed.
async fn get_or_create_deposit(
    conn: &mut PgConnection,
    owner_id: OwnerId,
) -> Result<Deposit, RepoError> {
    sqlx::query(
        r#"INSERT INTO deposits (owner_id, balance) VALUES ($1, 0)
           ON CONFLICT (owner_id) DO NOTHING"#,
    )
    .bind(owner_id.into_uuid())
    .execute(&mut *conn)
    .await
    .map_err(map_db_error)?;

    get_deposit(&mut *conn, owner_id, true)
        .await?
        .ok_or(RepoError::NotFound)
}

async fn update_deposit<'e, E>(exec: E, deposit: &Deposit) -> Result<(), RepoError>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(r#"UPDATE deposits SET balance = $1 WHERE owner_id = $2"#)
        .bind(deposit.balance())
        .bind(deposit.owner_id.into_uuid())
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
    E: sqlx::Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(r#"SELECT COUNT(*) FROM deposits"#)
        .fetch_one(exec)
        .await
        .map_err(map_db_error)
}

async fn append_transaction<'e, E>(exec: E, tx: NewTransaction) -> Result<Transaction, RepoError>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    check_new_transaction(&tx)?;

    let id: i64 = sqlx::query_scalar(
        r#"INSERT INTO transactions (sender_id, recipient_id, amount, description, transaction_date)
           VALUES ($1, $2, $3, $4, $5)
           RETURNING id"#,
    )
    .bind(tx.sender_id.map(OwnerId::into_uuid))
    .bind(tx.recipient_id.map(OwnerId::into_uuid))
    .bind(tx.amount)
    .bind(&tx.description)
    .bind(tx.transaction_date)
    .fetch_one(exec)
    .await
    .map_err(map_db_error)?;

    Ok(tx.into_transaction(TransactionId::from_i64(id)))
}

async fn list_for_account<'e, E>(exec: E, query: &HistoryQuery) -> Result<Vec<Transaction>, RepoError>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    // LIMIT NULL is LIMIT ALL
    let sql = format!(
        "SELECT id, sender_id, recipient_id, amount, description, transaction_date \
         FROM transactions WHERE sender_id = $1 OR recipient_id = $1 {} LIMIT $2 OFFSET $3",
        order_clause(query)
    );

    let rows: Vec<TransactionRow> = sqlx::query_as(&sql)
        .bind(query.owner_id.into_uuid())
        .bind(query.limit)
        .bind(query.offset)
        .fetch_all(exec)
        .await
        .map_err(map_db_error)?;

    Ok(rows.into_iter().map(Transaction::from).collect())
}

async fn count_transactions<'e, E>(exec: E) -> Result<i64, RepoError>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(r#"SELECT COUNT(*) FROM transactions"#)
        .fetch_one(exec)
        .await
        .map_err(map_db_error)
}

// ─────────────────────────────────────────────────────────────────────────────
// PostgreSQL Repository
// ─────────────────────────────────────────────────────────────────────────────

/// PostgreSQL repository with row-level locking.
pub struct PostgresRepo {
    pool: PgPool,
}

/// Executes SQL statements from a migration file, splitting by semicolons.
async fn execute_migration(pool: &PgPool, sql: &str, name: &str) -> Result<(), anyhow::Error> {
    for statement in sql.split(';') {
        let stmt = statement.trim();
        if !stmt.is_empty() {
            sqlx::query(stmt)
                .execute(pool)
                .await
                .map_err(|e| anyhow::anyhow!("Migration {} failed: {}", name, e))?;
        }
    }
    Ok(())
}

impl PostgresRepo {
    /// Connects and runs migrations.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        execute_migration(
            &pool,
            include_str!("../migrations/0001_create_deposits_and_transactions_pg.sql"),
            "0001",
        )
        .await?;
        tracing::debug!("PostgreSQL repository ready");

        Ok(Self { pool })
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl DepositStore for PostgresRepo {
    async fn get_deposit(&self, owner_id: OwnerId) -> Result<Option<Deposit>, RepoError> {
        get_deposit(&self.pool, owner_id, false).await
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
impl TransactionLedger for PostgresRepo {
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
impl BalanceRepository for PostgresRepo {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, RepoError> {
        let tx = self.pool.begin().await.map_err(map_tx_error)?;
        Ok(Box::new(PgUnitOfWork { tx: Mutex::new(tx) }))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Unit of work
// ─────────────────────────────────────────────────────────────────────────────

/// One PostgreSQL transaction. Deposit reads lock the row until commit or
/// rollback, so concurrent writers on the same owner queue up.
pub struct PgUnitOfWork {
    tx: Mutex<sqlx::Transaction<'static, Postgres>>,
}

#[async_trait]
impl DepositStore for PgUnitOfWork {
    async fn get_deposit(&self, owner_id: OwnerId) -> Result<Option<Deposit>, RepoError> {
        let mut tx = self.tx.lock().await;
        get_deposit(&mut **tx, owner_id, true).await
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

    async fn get_or_create_deposit(&self, owner_id: OwnerId) -> Result<Deposit, RepoError> {
        let mut tx = self.tx.lock().await;
        get_or_create_deposit(&mut **tx, owner_id).await
    }
}

#[async_trait]
impl TransactionLedger for PgUnitOfWork {
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
impl UnitOfWork for PgUnitOfWork {
    async fn commit(self: Box<Self>) -> Result<(), RepoError> {
        self.tx.into_inner().commit().await.map_err(map_tx_error)
    }
}
