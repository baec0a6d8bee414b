//! # Balance Types
//!
//! Domain types and port traits for the users balance service.
//! This crate performs no IO: only data structures, business rules,
//! request validation and trait definitions.
//!
//! ## Architecture
//!
//! This crate represents the **innermost core** of the hexagonal architecture:
//! - `domain/` - Pure domain types (Deposit, Transaction, HistoryQuery)
//! - `ports/` - Trait definitions that adapters must implement
//! - `dto` - Request/response shapes and their `validate()` rules
//! - `error` - Domain, repository and application error types

pub mod domain;
pub mod dto;
pub mod error;
pub mod ports;
pub mod validation;

// Re-export commonly used types
pub use domain::{
    Deposit, HistoryQuery, MAX_DESCRIPTION_LEN, NewTransaction, OrderBy, OwnerId, SortDirection,
    Transaction, TransactionId, TransactionType,
};
pub use dto::*;
pub use error::{AppError, DomainError, RepoError};
pub use exchange_rates::{CurrencyCode, ExchangeError};
pub use ports::{BalanceRepository, DepositStore, ExchangeRateProvider, TransactionLedger, UnitOfWork};
pub use validation::{FieldError, ValidationErrors};
