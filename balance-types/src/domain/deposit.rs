//! Deposit domain model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Unique identifier of a deposit owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(Uuid);

impl OwnerId {
    /// Creates a new random OwnerId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an OwnerId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Returns the UUID value.
    pub fn into_uuid(self) -> Uuid {
        self.0
    }
}

impl Default for OwnerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for OwnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for OwnerId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A user's balance in minor units of the base currency.
///
/// The balance is never negative; every mutator refuses to go below zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Deposit {
    pub owner_id: OwnerId,
    balance: i64,
}

impl Deposit {
    /// Creates an empty deposit.
    pub fn new(owner_id: OwnerId) -> Self {
        Self {
            owner_id,
            balance: 0,
        }
    }

    /// Rebuilds a deposit from stored fields.
    pub fn from_parts(owner_id: OwnerId, balance: i64) -> Result<Self, DomainError> {
        if balance < 0 {
            return Err(DomainError::NegativeBalance(balance));
        }
        Ok(Self { owner_id, balance })
    }

    pub fn balance(&self) -> i64 {
        self.balance
    }

    /// Applies a signed change.
    ///
    /// Leaves the deposit untouched and returns `InsufficientFunds` when the
    /// result would be negative.
    pub fn apply(&mut self, delta: i64) -> Result<(), DomainError> {
        let next = self
            .balance
            .checked_add(delta)
            .ok_or(DomainError::BalanceOverflow)?;
        if next < 0 {
            return Err(DomainError::InsufficientFunds {
                available: self.balance,
                requested: delta.saturating_neg(),
            });
        }
        self.balance = next;
        Ok(())
    }

    /// Credits (adds) a positive amount.
    pub fn credit(&mut self, amount: i64) -> Result<(), DomainError> {
        if amount <= 0 {
            return Err(DomainError::NonPositiveAmount(amount));
        }
        self.apply(amount)
    }

    /// Debits (subtracts) a positive amount.
    pub fn debit(&mut self, amount: i64) -> Result<(), DomainError> {
        if amount <= 0 {
            return Err(DomainError::NonPositiveAmount(amount));
        }
        self.apply(-amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_deposit_is_empty() {
        let deposit = Deposit::new(OwnerId::new());
        assert_eq!(deposit.balance(), 0);
    }

    #[test]
    fn test_from_parts_rejects_negative() {
        let result = Deposit::from_parts(OwnerId::new(), -1);
        assert!(matches!(result, Err(DomainError::NegativeBalance(-1))));
    }

    #[test]
    fn test_apply_signed_changes() {
        let mut deposit = Deposit::from_parts(OwnerId::new(), 1000).unwrap();
        deposit.apply(500).unwrap();
        assert_eq!(deposit.balance(), 1500);
        deposit.apply(-1500).unwrap();
        assert_eq!(deposit.balance(), 0);
    }

    #[test]
    fn test_insufficient_funds_leaves_balance() {
        let mut deposit = Deposit::from_parts(OwnerId::new(), 1000).unwrap();
        let result = deposit.apply(-5000);
        assert!(matches!(
            result,
            Err(DomainError::InsufficientFunds {
                available: 1000,
                requested: 5000
            })
        ));
        assert_eq!(deposit.balance(), 1000);
    }

    #[test]
    fn test_overflow_is_rejected() {
        let mut deposit = Deposit::from_parts(OwnerId::new(), i64::MAX).unwrap();
        assert!(matches!(deposit.apply(1), Err(DomainError::BalanceOverflow)));
        assert_eq!(deposit.balance(), i64::MAX);
    }

    #[test]
    fn test_credit_debit_require_positive_amounts() {
        let mut deposit = Deposit::new(OwnerId::new());
        assert!(matches!(deposit.credit(0), Err(DomainError::NonPositiveAmount(0))));
        assert!(matches!(deposit.debit(-5), Err(DomainError::NonPositiveAmount(-5))));
        deposit.credit(300).unwrap();
        deposit.debit(100).unwrap();
        assert_eq!(deposit.balance(), 200);
    }

    #[test]
    fn test_owner_id_parse() {
        let id: OwnerId = "615f3e76-37d3-11ec-8d3d-0242ac130003".parse().unwrap();
        assert_eq!(id.to_string(), "615f3e76-37d3-11ec-8d3d-0242ac130003");
        assert!("0123456789".parse::<OwnerId>().is_err());
    }
}
