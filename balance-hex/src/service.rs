//! Balance Application Service
//!
//! Orchestrates deposits and the ledger through the repository port.
//! Contains NO infrastructure logic - pure business orchestration.
//!
//! Every mutation follows the same shape: validate, lock the affected
//! owners, open a unit of work, read, apply the domain rule, write the
//! deposit(s) and exactly one ledger entry, commit. Any failure or a missed
//! deadline drops the unit of work, which rolls it back.

use std::future::Future;
use std::time::Duration;

use balance_types::{
    AppError, BalanceChange, BalanceQuery, BalanceRepository, CurrencyCode, Deposit, DepositStore,
    DomainError, ExchangeRateProvider, GetBalanceRequest, GetHistoryRequest, NewTransaction,
    OwnerId, RepoError, Transaction, TransactionLedger, TransferOrder, TransferRequest, UnitOfWork,
    UpdateBalanceRequest,
};

use crate::locks::AccountLocks;

/// Default deadline for a single operation.
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(5);

/// Tunables of the service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Upper bound for one call, lock waits included.
    pub operation_timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
        }
    }
}

/// Application service for balance operations.
///
/// Generic over `R: BalanceRepository` and `X: ExchangeRateProvider` - the
/// adapters are injected at compile time.
pub struct BalanceService<R: BalanceRepository, X: ExchangeRateProvider> {
    repo: R,
    rates: X,
    locks: AccountLocks,
    config: ServiceConfig,
}

impl<R: BalanceRepository, X: ExchangeRateProvider> BalanceService<R, X> {
    /// Creates a service with the default configuration.
    pub fn new(repo: R, rates: X) -> Self {
        Self::with_config(repo, rates, ServiceConfig::default())
    }

    pub fn with_config(repo: R, rates: X, config: ServiceConfig) -> Self {
        Self {
            repo,
            rates,
            locks: AccountLocks::new(),
            config,
        }
    }

    /// Returns a reference to the underlying repository.
    pub fn repo(&self) -> &R {
        &self.repo
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Reads
    // ─────────────────────────────────────────────────────────────────────────────

    /// Balance of a deposit, in the base currency or converted.
    ///
    /// An unknown owner reads as 0 and nothing is stored.
    #[tracing::instrument(skip(self, req), fields(owner_id = %req.owner_id, currency = ?req.currency))]
    pub async fn get_balance(&self, req: GetBalanceRequest) -> Result<f64, AppError> {
        let query = req.validate()?;
        self.with_deadline("get_balance", self.read_balance(query))
            .await
    }

    async fn read_balance(&self, query: BalanceQuery) -> Result<f64, AppError> {
        let balance = self
            .repo
            .get_deposit(query.owner_id)
            .await?
            .map(|d| d.balance())
            .unwrap_or(0);

        let Some(raw) = query.currency else {
            return Ok(balance as f64);
        };
        let code = CurrencyCode::new(&raw).map_err(|e| {
            tracing::warn!(currency = %raw, error = %e, "Rejected currency code");
            currency_unavailable()
        })?;
        if code == *self.rates.base_currency() {
            return Ok(balance as f64);
        }

        match self.rates.rate(&code).await {
            Ok(rate) => Ok(balance as f64 * rate),
            Err(e) => {
                tracing::warn!(currency = %code, error = %e, "Exchange rate lookup failed");
                Err(currency_unavailable())
            }
        }
    }

    /// A page of the owner's transactions, as sender or recipient.
    #[tracing::instrument(skip(self, req), fields(owner_id = %req.owner_id))]
    pub async fn get_history(&self, req: GetHistoryRequest) -> Result<Vec<Transaction>, AppError> {
        let query = req.validate()?;
        self.with_deadline("get_history", async {
            self.repo
                .list_for_account(&query)
                .await
                .map_err(AppError::from)
        })
        .await
    }

    /// Number of materialised deposits.
    pub async fn count(&self) -> Result<i64, AppError> {
        self.with_deadline("count", async {
            self.repo.count_deposits().await.map_err(AppError::from)
        })
        .await
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────────────

    /// Adds a signed amount to a deposit, creating it on first use.
    #[tracing::instrument(skip(self, req), fields(owner_id = %req.owner_id, amount = req.amount))]
    pub async fn update_balance(&self, req: UpdateBalanceRequest) -> Result<Transaction, AppError> {
        let change = req.validate()?;
        self.with_deadline("update_balance", self.apply_change(change))
            .await
    }

    async fn apply_change(&self, change: BalanceChange) -> Result<Transaction, AppError> {
        let _guard = self.locks.lock(change.owner_id).await;
        let uow = self.repo.begin().await?;

        let mut deposit = uow.get_or_create_deposit(change.owner_id).await?;
        deposit.apply(change.amount).map_err(log_refusal)?;
        uow.update_deposit(&deposit).await?;

        let tx = uow
            .append_transaction(NewTransaction::for_balance_change(
                change.owner_id,
                change.amount,
                change.description,
            ))
            .await?;
        uow.commit().await?;

        tracing::info!(
            transaction_id = %tx.id,
            balance = deposit.balance(),
            "Balance updated"
        );
        Ok(tx)
    }

    /// Moves money between two deposits as one ledger entry.
    ///
    /// The sender must already hold the amount; the recipient is created on
    /// first use.
    #[tracing::instrument(
        skip(self, req),
        fields(sender_id = %req.sender_id, recipient_id = %req.recipient_id, amount = req.amount)
    )]
    pub async fn transfer(&self, req: TransferRequest) -> Result<Transaction, AppError> {
        let order = req.validate()?;
        self.with_deadline("transfer", self.apply_transfer(order))
            .await
    }

    async fn apply_transfer(&self, order: TransferOrder) -> Result<Transaction, AppError> {
        let _guards = self.locks.lock_pair(order.sender_id, order.recipient_id).await;
        let uow = self.repo.begin().await?;

        // Row reads follow the same ascending order as the account locks.
        let (mut sender, mut recipient) = if order.sender_id <= order.recipient_id {
            let sender = read_sender(uow.as_ref(), order.sender_id).await?;
            let recipient = uow.get_or_create_deposit(order.recipient_id).await?;
            (sender, recipient)
        } else {
            let recipient = uow.get_or_create_deposit(order.recipient_id).await?;
            let sender = read_sender(uow.as_ref(), order.sender_id).await?;
            (sender, recipient)
        };

        sender.debit(order.amount).map_err(log_refusal)?;
        uow.update_deposit(&sender).await?;
        recipient.credit(order.amount)?;
        uow.update_deposit(&recipient).await?;

        let tx = uow
            .append_transaction(NewTransaction::transfer(
                order.sender_id,
                order.recipient_id,
                order.amount,
                order.description,
            ))
            .await?;
        uow.commit().await?;

        tracing::info!(
            transaction_id = %tx.id,
            sender_balance = sender.balance(),
            recipient_balance = recipient.balance(),
            "Transfer committed"
        );
        Ok(tx)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Helpers
    // ─────────────────────────────────────────────────────────────────────────────

    /// Runs `fut` under the operation deadline. On expiry the future is
    /// dropped together with any open unit of work.
    async fn with_deadline<T, F>(&self, operation: &'static str, fut: F) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, AppError>>,
    {
        match tokio::time::timeout(self.config.operation_timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    operation,
                    timeout_ms = self.config.operation_timeout.as_millis() as u64,
                    "Operation deadline exceeded"
                );
                Err(AppError::ServiceUnavailable(format!(
                    "{} did not finish in time",
                    operation
                )))
            }
        }
    }
}

/// An absent sender reads as an empty deposit: it has nothing to give.
async fn read_sender(uow: &dyn UnitOfWork, owner_id: OwnerId) -> Result<Deposit, RepoError> {
    Ok(uow
        .get_deposit(owner_id)
        .await?
        .unwrap_or_else(|| Deposit::new(owner_id)))
}

fn log_refusal(err: DomainError) -> DomainError {
    if let DomainError::InsufficientFunds {
        available,
        requested,
    } = &err
    {
        tracing::warn!(available, requested, "Insufficient funds");
    }
    err
}

fn currency_unavailable() -> AppError {
    AppError::ServiceUnavailable("requested currency is not available".into())
}
