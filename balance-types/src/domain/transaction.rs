//! Transaction domain model.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use super::deposit::OwnerId;

/// Maximum length of a transaction description, in characters.
pub const MAX_DESCRIPTION_LEN: usize = 100;

/// Store-assigned, strictly increasing transaction identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(i64);

impl TransactionId {
    pub fn from_i64(id: i64) -> Self {
        Self(id)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The type/direction of a transaction, derived from which sides are present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// Money coming into a deposit from outside the system
    TopUp,
    /// Money leaving a deposit to outside the system
    Withdrawal,
    /// Money moving between two deposits
    Transfer,
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionType::TopUp => write!(f, "TOP_UP"),
            TransactionType::Withdrawal => write!(f, "WITHDRAWAL"),
            TransactionType::Transfer => write!(f, "TRANSFER"),
        }
    }
}

/// Creation time, truncated to the microsecond precision both stores keep.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// A ledger entry that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    pub sender_id: Option<OwnerId>,
    pub recipient_id: Option<OwnerId>,
    pub amount: i64,
    pub description: String,
    pub transaction_date: DateTime<Utc>,
}

impl NewTransaction {
    /// Money credited to `recipient` from outside.
    pub fn top_up(recipient: OwnerId, amount: i64, description: String) -> Self {
        Self {
            sender_id: None,
            recipient_id: Some(recipient),
            amount,
            description,
            transaction_date: now(),
        }
    }

    /// Money debited from `sender` to outside.
    pub fn withdrawal(sender: OwnerId, amount: i64, description: String) -> Self {
        Self {
            sender_id: Some(sender),
            recipient_id: None,
            amount,
            description,
            transaction_date: now(),
        }
    }

    /// Money moved from `sender` to `recipient`.
    pub fn transfer(sender: OwnerId, recipient: OwnerId, amount: i64, description: String) -> Self {
        Self {
            sender_id: Some(sender),
            recipient_id: Some(recipient),
            amount,
            description,
            transaction_date: now(),
        }
    }

    /// Builds the record for a signed balance change on one deposit.
    ///
    /// Negative changes make `owner` the sender, positive ones the recipient;
    /// the stored amount is always the magnitude.
    pub fn for_balance_change(owner: OwnerId, signed_amount: i64, description: String) -> Self {
        if signed_amount < 0 {
            Self::withdrawal(owner, signed_amount.saturating_neg(), description)
        } else {
            Self::top_up(owner, signed_amount, description)
        }
    }

    /// Attaches the store-assigned id.
    pub fn into_transaction(self, id: TransactionId) -> Transaction {
        Transaction {
            id,
            sender_id: self.sender_id,
            recipient_id: self.recipient_id,
            amount: self.amount,
            description: self.description,
            transaction_date: self.transaction_date,
        }
    }
}

/// A recorded balance change.
///
/// Transactions are immutable once created - the ledger only ever appends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    /// Debited deposit (None for top-ups)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub sender_id: Option<OwnerId>,
    /// Credited deposit (None for withdrawals)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub recipient_id: Option<OwnerId>,
    /// Magnitude moved, always positive
    pub amount: i64,
    pub description: String,
    pub transaction_date: DateTime<Utc>,
}

impl Transaction {
    pub fn transaction_type(&self) -> TransactionType {
        match (self.sender_id, self.recipient_id) {
            (Some(_), Some(_)) => TransactionType::Transfer,
            (Some(_), None) => TransactionType::Withdrawal,
            _ => TransactionType::TopUp,
        }
    }

    /// True when `owner` is either side of this transaction.
    pub fn involves(&self, owner: OwnerId) -> bool {
        self.sender_id == Some(owner) || self.recipient_id == Some(owner)
    }
}
