//! Storage ports.
//!
//! Adapters (Postgres, SQLite, in-memory mocks) implement these traits. The
//! engine never touches a database handle directly: reads go through the
//! auto-commit methods of [`BalanceRepository`], mutations through a
//! [`UnitOfWork`] obtained from [`BalanceRepository::begin`].

use crate::domain::{Deposit, HistoryQuery, NewTransaction, OwnerId, Transaction};
use crate::error::RepoError;

/// Durable mapping from owner to balance.
#[async_trait::async_trait]
pub trait DepositStore: Send + Sync {
    /// Absence is not an error; the caller decides whether to materialise.
    async fn get_deposit(&self, owner_id: OwnerId) -> Result<Option<Deposit>, RepoError>;

    /// Fails with `Conflict` if the owner already has a deposit.
    async fn create_deposit(&self, deposit: &Deposit) -> Result<(), RepoError>;

    /// Replaces the stored balance. Fails with `NotFound` for an unknown owner.
    async fn update_deposit(&self, deposit: &Deposit) -> Result<(), RepoError>;

    async fn count_deposits(&self) -> Result<i64, RepoError>;

    /// Returns the owner's deposit, storing an empty one first if absent.
    async fn get_or_create_deposit(&self, owner_id: OwnerId) -> Result<Deposit, RepoError> {
        if let Some(deposit) = self.get_deposit(owner_id).await? {
            return Ok(deposit);
        }
        let deposit = Deposit::new(owner_id);
        self.create_deposit(&deposit).await?;
        Ok(deposit)
    }
}

/// Append-only transaction log.
#[async_trait::async_trait]
pub trait TransactionLedger: Send + Sync {
    /// Stores the entry and returns it with its assigned id.
    async fn append_transaction(&self, tx: NewTransaction) -> Result<Transaction, RepoError>;

    /// Transactions where the owner is sender or recipient.
    async fn list_for_account(&self, query: &HistoryQuery) -> Result<Vec<Transaction>, RepoError>;

    async fn count_transactions(&self) -> Result<i64, RepoError>;
}

/// A set of deposit and ledger writes that land together or not at all.
///
/// Dropping a unit of work without calling [`commit`](UnitOfWork::commit)
/// rolls every write back.
#[async_trait::async_trait]
pub trait UnitOfWork: DepositStore + TransactionLedger {
    async fn commit(self: Box<Self>) -> Result<(), RepoError>;
}

/// The main repository port.
#[async_trait::async_trait]
pub trait BalanceRepository: DepositStore + TransactionLedger + 'static {
    /// Opens a unit of work. Its reads see its own uncommitted writes.
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, RepoError>;
}
