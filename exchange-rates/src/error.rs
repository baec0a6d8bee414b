//! Error type for exchange rate operations.

use crate::CurrencyCode;

/// Error type for exchange rate operations.
#[derive(Debug, thiserror::Error)]
pub enum ExchangeError {
    #[error("Invalid currency code: {0:?}")]
    InvalidCurrency(String),

    #[error("Currency {0} is not present in either the cache or the rate source response")]
    CurrencyUnavailable(CurrencyCode),

    #[error("Rate source unavailable: {0}")]
    RateSourceUnavailable(String),
}
