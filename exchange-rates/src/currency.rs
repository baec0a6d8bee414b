//! ISO-4217 style currency codes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ExchangeError;

/// Currency balances are stored in unless configured otherwise.
pub const DEFAULT_BASE_CURRENCY: &str = "RUB";

/// A three-letter currency code, always upper case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Parses and normalises a currency code (`"usd"` becomes `"USD"`).
    pub fn new(code: &str) -> Result<Self, ExchangeError> {
        let code = code.trim();
        if code.len() != 3 || !code.bytes().all(|b| b.is_ascii_alphabetic()) {
            return Err(ExchangeError::InvalidCurrency(code.to_string()));
        }
        Ok(Self(code.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CurrencyCode {
    type Err = ExchangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = ExchangeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_code_parse() {
        assert_eq!(CurrencyCode::new("USD").unwrap().as_str(), "USD");
        assert_eq!("eur".parse::<CurrencyCode>().unwrap().as_str(), "EUR");
        assert_eq!(CurrencyCode::new(" gbp ").unwrap().as_str(), "GBP");
    }

    #[test]
    fn test_currency_code_rejects_garbage() {
        for bad in ["", "US", "USDT", "U$D", "12A"] {
            assert!(
                matches!(CurrencyCode::new(bad), Err(ExchangeError::InvalidCurrency(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_currency_code_display() {
        assert_eq!(CurrencyCode::new("rub").unwrap().to_string(), "RUB");
    }
}
