//! Configuration loading from environment.

use std::env;
use std::time::Duration;

use exchange_rates::{DEFAULT_BASE_CURRENCY, DEFAULT_RATES_URL, MAX_TTL};

/// Application configuration.
#[derive(Debug)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub base_currency: String,
    pub rates_api_url: String,
    pub rates_ttl: Duration,
    pub rates_cleanup_interval: Duration,
    pub operation_timeout: Duration,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let port = parse_or(&var, "PORT", 8080)?;

        let database_url = var("DATABASE_URL")
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let base_currency = var("BASE_CURRENCY").unwrap_or_else(|| DEFAULT_BASE_CURRENCY.into());
        let rates_api_url = var("RATES_API_URL").unwrap_or_else(|| DEFAULT_RATES_URL.into());

        let rates_ttl_secs: u64 = parse_or(&var, "RATES_TTL_SECS", 30 * 60)?;
        if rates_ttl_secs == 0 || rates_ttl_secs > MAX_TTL.as_secs() {
            anyhow::bail!(
                "RATES_TTL_SECS must be between 1 and {}, got {rates_ttl_secs}",
                MAX_TTL.as_secs()
            );
        }

        let rates_cleanup_secs: u64 = parse_or(&var, "RATES_CLEANUP_SECS", 5 * 60)?;
        if rates_cleanup_secs == 0 {
            anyhow::bail!("RATES_CLEANUP_SECS must be positive");
        }

        let operation_timeout_ms: u64 = parse_or(&var, "OPERATION_TIMEOUT_MS", 5000)?;
        if operation_timeout_ms == 0 {
            anyhow::bail!("OPERATION_TIMEOUT_MS must be positive");
        }

        Ok(Self {
            port,
            database_url,
            base_currency,
            rates_api_url,
            rates_ttl: Duration::from_secs(rates_ttl_secs),
            rates_cleanup_interval: Duration::from_secs(rates_cleanup_secs),
            operation_timeout: Duration::from_millis(operation_timeout_ms),
        })
    }
}

fn parse_or<T>(var: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match var(key) {
        Some(raw) => raw
            .parse()
            .map_err(|e| anyhow::anyhow!("{key} has an invalid value {raw:?}: {e}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("DATABASE_URL", "sqlite://data/balance.db")]).unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.base_currency, "RUB");
        assert_eq!(config.rates_api_url, DEFAULT_RATES_URL);
        assert_eq!(config.rates_ttl, Duration::from_secs(1800));
        assert_eq!(config.rates_cleanup_interval, Duration::from_secs(300));
        assert_eq!(config.operation_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("DATABASE_URL", "postgres://localhost/balance"),
            ("PORT", "3000"),
            ("BASE_CURRENCY", "EUR"),
            ("RATES_TTL_SECS", "60"),
            ("OPERATION_TIMEOUT_MS", "250"),
        ])
        .unwrap();

        assert_eq!(config.port, 3000);
        assert_eq!(config.base_currency, "EUR");
        assert_eq!(config.rates_ttl, Duration::from_secs(60));
        assert_eq!(config.operation_timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_database_url_is_required() {
        let err = load(&[]).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn test_invalid_number_is_rejected() {
        let err = load(&[("DATABASE_URL", "sqlite::memory:"), ("PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_zero_cleanup_interval_is_rejected() {
        let err = load(&[("DATABASE_URL", "sqlite::memory:"), ("RATES_CLEANUP_SECS", "0")])
            .unwrap_err();
        assert!(err.to_string().contains("RATES_CLEANUP_SECS"));
    }

    #[test]
    fn test_out_of_range_ttl_is_rejected() {
        for ttl in ["0", "18446744073709551615"] {
            let err = load(&[("DATABASE_URL", "sqlite::memory:"), ("RATES_TTL_SECS", ttl)])
                .unwrap_err();
            assert!(err.to_string().contains("RATES_TTL_SECS"), "ttl {ttl}");
        }

        let max = MAX_TTL.as_secs().to_string();
        let config = load(&[("DATABASE_URL", "sqlite::memory:"), ("RATES_TTL_SECS", max.as_str())]).unwrap();
        assert_eq!(config.rates_ttl, MAX_TTL);
    }

    #[test]
    fn test_zero_operation_timeout_is_rejected() {
        let err = load(&[("DATABASE_URL", "sqlite::memory:"), ("OPERATION_TIMEOUT_MS", "0")])
            .unwrap_err();
        assert!(err.to_string().contains("OPERATION_TIMEOUT_MS"));
    }
}
