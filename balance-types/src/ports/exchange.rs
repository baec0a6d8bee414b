//! Exchange rate provider port.
//!
//! The engine only needs "how many units of `code` does one unit of the base
//! currency buy". [`RateCache`] is the production implementation.

use std::sync::Arc;

use exchange_rates::{Clock, CurrencyCode, ExchangeError, RateCache, RateSource};

/// Port trait for exchange rate providers.
#[async_trait::async_trait]
pub trait ExchangeRateProvider: Send + Sync + 'static {
    /// Currency balances are stored in.
    fn base_currency(&self) -> &CurrencyCode;

    /// Units of `code` per one unit of the base currency.
    async fn rate(&self, code: &CurrencyCode) -> Result<f64, ExchangeError>;
}

#[async_trait::async_trait]
impl<S: RateSource, C: Clock> ExchangeRateProvider for RateCache<S, C> {
    fn base_currency(&self) -> &CurrencyCode {
        self.base()
    }

    async fn rate(&self, code: &CurrencyCode) -> Result<f64, ExchangeError> {
        self.get(code).await
    }
}

#[async_trait::async_trait]
impl<P: ExchangeRateProvider + ?Sized> ExchangeRateProvider for Arc<P> {
    fn base_currency(&self) -> &CurrencyCode {
        (**self).base_currency()
    }

    async fn rate(&self, code: &CurrencyCode) -> Result<f64, ExchangeError> {
        (**self).rate(code).await
    }
}
