//! Exchange Rates Library
//!
//! Answers "how many units of currency X does one unit of the base currency
//! buy" cheaply, by caching a bulk snapshot fetched from an upstream source.
//!
//! The cache is an explicitly owned value: construct it once, wrap it in an
//! `Arc` and hand it to whoever needs conversions. The upstream source and the
//! clock are injected, so tests can drive expiry deterministically.
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use exchange_rates::{CurrencyCode, HttpRateSource, RateCache, DEFAULT_CLEANUP_INTERVAL, DEFAULT_TTL};
//!
//! # async fn demo() -> Result<(), exchange_rates::ExchangeError> {
//! let source = HttpRateSource::new(exchange_rates::DEFAULT_RATES_URL);
//! let cache = Arc::new(RateCache::new(source, CurrencyCode::new("RUB")?, DEFAULT_TTL));
//! let _janitor = cache.spawn_janitor(DEFAULT_CLEANUP_INTERVAL);
//!
//! let usd = cache.get(&CurrencyCode::new("usd")?).await?;
//! println!("1 RUB = {usd} USD");
//! # Ok(())
//! # }
//! ```

mod cache;
mod clock;
mod currency;
mod error;
mod source;

pub use cache::{DEFAULT_CLEANUP_INTERVAL, DEFAULT_TTL, MAX_TTL, MIN_CLEANUP_INTERVAL, RateCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use currency::{CurrencyCode, DEFAULT_BASE_CURRENCY};
pub use error::ExchangeError;
pub use source::{DEFAULT_RATES_URL, HttpRateSource, RateSource, RatesResponse, StaticRateSource};
