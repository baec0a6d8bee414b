//! Upstream rate sources.
//!
//! A source returns the whole rate table for a base currency in one call;
//! the cache never asks for a single code.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;

use crate::{CurrencyCode, ExchangeError};

/// Public endpoint the service talks to by default.
pub const DEFAULT_RATES_URL: &str = "https://api.exchangerate.host/latest";

/// Snapshot of `code -> rate` ratios relative to the requested base.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RatesResponse {
    pub rates: HashMap<String, f64>,
}

/// Port for anything able to produce a rate snapshot.
#[async_trait::async_trait]
pub trait RateSource: Send + Sync + 'static {
    async fn fetch(&self, base: &CurrencyCode) -> Result<RatesResponse, ExchangeError>;
}

#[async_trait::async_trait]
impl<S: RateSource + ?Sized> RateSource for Arc<S> {
    async fn fetch(&self, base: &CurrencyCode) -> Result<RatesResponse, ExchangeError> {
        (**self).fetch(base).await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// HTTP source
// ─────────────────────────────────────────────────────────────────────────────

/// Fetches `GET {url}?base={BASE}` and decodes `{"rates": {...}}`.
pub struct HttpRateSource {
    url: String,
    http: reqwest::Client,
}

impl HttpRateSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(url, reqwest::Client::new())
    }

    pub fn with_client(url: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            url: url.into(),
            http,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl RateSource for HttpRateSource {
    #[tracing::instrument(skip(self), fields(url = %self.url))]
    async fn fetch(&self, base: &CurrencyCode) -> Result<RatesResponse, ExchangeError> {
        let response = self
            .http
            .get(&self.url)
            .query(&[("base", base.as_str())])
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(|e| ExchangeError::RateSourceUnavailable(e.to_string()))?;

        response
            .json::<RatesResponse>()
            .await
            .map_err(|e| ExchangeError::RateSourceUnavailable(format!("malformed response: {e}")))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Static source
// ─────────────────────────────────────────────────────────────────────────────

/// Serves a fixed snapshot. Useful for development and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticRateSource {
    rates: HashMap<String, f64>,
}

impl StaticRateSource {
    pub fn new<I, K>(rates: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        Self {
            rates: rates.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

#[async_trait::async_trait]
impl RateSource for StaticRateSource {
    async fn fetch(&self, _base: &CurrencyCode) -> Result<RatesResponse, ExchangeError> {
        Ok(RatesResponse {
            rates: self.rates.clone(),
        })
    }
}
