//! Helpers shared by the SQLite and PostgreSQL adapters.

use balance_types::{HistoryQuery, NewTransaction, RepoError};

// ─────────────────────────────────────────────────────────────────────────────
// Error mapping
// ─────────────────────────────────────────────────────────────────────────────

/// Maps a driver error onto the repository error the engine understands.
pub fn map_db_error(err: sqlx::Error) -> RepoError {
    if let Some(db) = err.as_database_error() {
        if db.is_unique_violation() {
            return RepoError::Conflict(db.message().to_string());
        }
        if db.is_check_violation() {
            return RepoError::ConstraintViolation(db.message().to_string());
        }
    }
    RepoError::Database(err.to_string())
}

pub fn map_tx_error(err: sqlx::Error) -> RepoError {
    RepoError::Transaction(err.to_string())
}

/// Corrupt stored value (bad uuid, bad timestamp).
#[cfg(feature = "sqlite")]
pub fn decode_error(err: impl std::fmt::Display) -> RepoError {
    RepoError::Database(format!("failed to decode row: {}", err))
}

// ─────────────────────────────────────────────────────────────────────────────
// Ledger rules
// ─────────────────────────────────────────────────────────────────────────────

/// Rejects entries the schema would refuse, before reaching the database.
pub fn check_new_transaction(tx: &NewTransaction) -> Result<(), RepoError> {
    if tx.amount <= 0 {
        return Err(RepoError::ConstraintViolation(format!(
            "transaction amount must be positive, got {}",
            tx.amount
        )));
    }
    if tx.sender_id.is_none() && tx.recipient_id.is_none() {
        return Err(RepoError::ConstraintViolation(
            "transaction needs a sender or a recipient".into(),
        ));
    }
    Ok(())
}

/// `ORDER BY` for a history query.
///
/// Column and keyword come from closed enums, so the string is never built
/// from caller input. Ties fall back to `id` in the same direction.
pub fn order_clause(query: &HistoryQuery) -> String {
    match query.order {
        None => "ORDER BY id ASC".to_string(),
        Some((column, direction)) => format!(
            "ORDER BY {} {}, id {}",
            column.column(),
            direction.keyword(),
            direction.keyword()
        ),
    }
}
