//! Data Transfer Objects (DTOs) for requests and responses.
//!
//! Requests arrive with raw strings; `validate()` turns them into the typed
//! commands the engine executes.

use serde::{Deserialize, Serialize};

use crate::domain::{HistoryQuery, OrderBy, OwnerId, SortDirection};
use crate::validation::{self, ValidationErrors};

// ─────────────────────────────────────────────────────────────────────────────
// Balance DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Request to read a deposit's balance, optionally converted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GetBalanceRequest {
    pub owner_id: String,
    /// Target currency code; empty or absent means the base currency
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

/// Validated balance read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceQuery {
    pub owner_id: OwnerId,
    pub currency: Option<String>,
}

impl GetBalanceRequest {
    pub fn validate(&self) -> Result<BalanceQuery, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let owner_id = validation::owner_id(&mut errors, "owner_id", &self.owner_id);
        let currency = validation::non_blank(&self.currency).map(str::to_owned);

        match owner_id {
            Some(owner_id) if errors.is_empty() => Ok(BalanceQuery { owner_id, currency }),
            _ => Err(errors),
        }
    }
}

/// Request to add a signed amount to a deposit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateBalanceRequest {
    pub owner_id: String,
    /// Positive tops up, negative withdraws; zero is rejected
    #[serde(default)]
    pub amount: i64,
    #[serde(default)]
    pub description: String,
}

/// Validated balance change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceChange {
    pub owner_id: OwnerId,
    pub amount: i64,
    pub description: String,
}

impl UpdateBalanceRequest {
    pub fn validate(&self) -> Result<BalanceChange, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let owner_id = validation::owner_id(&mut errors, "owner_id", &self.owner_id);
        if self.amount == 0 {
            errors.add("amount", "cannot be blank");
        }
        validation::description(&mut errors, &self.description);

        match owner_id {
            Some(owner_id) if errors.is_empty() => Ok(BalanceChange {
                owner_id,
                amount: self.amount,
                description: self.description.clone(),
            }),
            _ => Err(errors),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Transfer DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Request to move money between two deposits.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransferRequest {
    pub sender_id: String,
    pub recipient_id: String,
    #[serde(default)]
    pub amount: i64,
    #[serde(default)]
    pub description: String,
}

/// Validated transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferOrder {
    pub sender_id: OwnerId,
    pub recipient_id: OwnerId,
    pub amount: i64,
    pub description: String,
}

impl TransferRequest {
    pub fn validate(&self) -> Result<TransferOrder, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let sender_id = validation::owner_id(&mut errors, "sender_id", &self.sender_id);
        let recipient_id = validation::owner_id(&mut errors, "recipient_id", &self.recipient_id);
        if let (Some(s), Some(r)) = (sender_id, recipient_id) {
            if s == r {
                errors.add("recipient_id", "must differ from sender_id");
            }
        }
        if self.amount <= 0 {
            errors.add("amount", "must be greater than zero");
        }
        validation::description(&mut errors, &self.description);

        match (sender_id, recipient_id) {
            (Some(sender_id), Some(recipient_id)) if errors.is_empty() => Ok(TransferOrder {
                sender_id,
                recipient_id,
                amount: self.amount,
                description: self.description.clone(),
            }),
            _ => Err(errors),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// History DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Request for a page of a deposit's transactions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GetHistoryRequest {
    pub owner_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    /// Absent means no limit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    /// `transaction_date` or `amount`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_by: Option<String>,
    /// `ASC` or `DESC`; ignored without `order_by`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_direction: Option<String>,
}

impl GetHistoryRequest {
    pub fn validate(&self) -> Result<HistoryQuery, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let owner_id = validation::owner_id(&mut errors, "owner_id", &self.owner_id);

        let offset = self.offset.unwrap_or(0);
        if offset < 0 {
            errors.add("offset", "must be no less than 0");
        }
        if matches!(self.limit, Some(limit) if limit < 1) {
            errors.add("limit", "must be no less than 1");
        }

        let order_by = validation::non_blank(&self.order_by).and_then(|raw| {
            raw.parse::<OrderBy>()
                .map_err(|_| errors.add("order_by", "must be a valid value"))
                .ok()
        });
        let direction = validation::non_blank(&self.order_direction).and_then(|raw| {
            raw.parse::<SortDirection>()
                .map_err(|_| errors.add("order_direction", "must be a valid value"))
                .ok()
        });

        match owner_id {
            Some(owner_id) if errors.is_empty() => Ok(HistoryQuery {
                owner_id,
                order: order_by.map(|column| (column, direction.unwrap_or_default())),
                offset,
                limit: self.limit,
            }),
            _ => Err(errors),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Responses
// ─────────────────────────────────────────────────────────────────────────────

/// Liveness probe body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Error body returned by the HTTP adapter.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<ValidationErrors>,
}
