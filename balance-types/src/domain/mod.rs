//! Domain models for the balance service.

pub mod deposit;
pub mod history;
pub mod transaction;

pub use deposit::{Deposit, OwnerId};
pub use history::{HistoryQuery, OrderBy, SortDirection};
pub use transaction::{
    MAX_DESCRIPTION_LEN, NewTransaction, Transaction, TransactionId, TransactionType,
};
