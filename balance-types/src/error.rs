//! Error types for the balance service.

use crate::validation::ValidationErrors;

/// Domain-level errors (business rule violations).
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(ValidationErrors),

    #[error("Insufficient funds: available {available}, requested {requested}")]
    InsufficientFunds { available: i64, requested: i64 },

    #[error("Balance cannot be negative: {0}")]
    NegativeBalance(i64),

    #[error("Amount must be positive: {0}")]
    NonPositiveAmount(i64),

    #[error("Balance would overflow")]
    BalanceOverflow,
}

/// Repository-level errors (data access failures).
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Entity not found")]
    NotFound,

    #[error("Conflict: {0}")]
    Conflict(String),

    /// A stored row broke a schema rule (e.g. a CHECK constraint).
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

/// Application-level errors (for HTTP responses).
///
/// Maps cleanly to HTTP status codes.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(ValidationErrors),

    #[error("Insufficient funds: available {available}, requested {requested}")]
    InsufficientFunds { available: i64, requested: i64 },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// A dependency (rate source, deadline) could not serve the request.
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Caller mistakes, as opposed to failures on our side.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AppError::InvalidArgument(_) | AppError::InsufficientFunds { .. } | AppError::NotFound(_)
        )
    }

    /// Whether repeating the same request later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::ServiceUnavailable(_) | AppError::StorageUnavailable(_) | AppError::Conflict(_)
        )
    }

    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        AppError::InvalidArgument(ValidationErrors::single(field, message))
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::InvalidArgument(errors)
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::InvalidArgument(errors) => AppError::InvalidArgument(errors),
            DomainError::InsufficientFunds {
                available,
                requested,
            } => AppError::InsufficientFunds {
                available,
                requested,
            },
            DomainError::BalanceOverflow => {
                AppError::invalid("amount", "would overflow the balance")
            }
            e @ (DomainError::NegativeBalance(_) | DomainError::NonPositiveAmount(_)) => {
                AppError::Internal(e.to_string())
            }
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Domain(e) => e.into(),
            RepoError::NotFound => AppError::NotFound("Resource not found".into()),
            RepoError::Database(e) => AppError::StorageUnavailable(e),
            RepoError::Transaction(e) => AppError::StorageUnavailable(e),
            RepoError::Conflict(e) => AppError::Conflict(e),
            RepoError::ConstraintViolation(e) => AppError::Internal(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_funds_survives_repo_layer() {
        let err: AppError = RepoError::Domain(DomainError::InsufficientFunds {
            available: 1000,
            requested: 5000,
        })
        .into();

        assert!(matches!(
            err,
            AppError::InsufficientFunds {
                available: 1000,
                requested: 5000
            }
        ));
        assert!(err.is_client_error());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_storage_failures_are_retryable() {
        let err: AppError = RepoError::Database("connection reset".into()).into();
        assert!(matches!(err, AppError::StorageUnavailable(_)));
        assert!(err.is_retryable());
        assert!(!err.is_client_error());

        let err: AppError = RepoError::Transaction("commit failed".into()).into();
        assert!(matches!(err, AppError::StorageUnavailable(_)));
    }

    #[test]
    fn test_constraint_violation_is_internal() {
        let err: AppError = RepoError::ConstraintViolation("balance >= 0".into()).into();
        assert!(matches!(err, AppError::Internal(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_overflow_points_at_amount() {
        let err: AppError = DomainError::BalanceOverflow.into();
        match err {
            AppError::InvalidArgument(errors) => assert!(errors.has("amount")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
