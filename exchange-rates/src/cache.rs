//! Time-bounded rate cache with bulk refresh on miss.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, RwLock};

use crate::{Clock, CurrencyCode, ExchangeError, RateSource, SystemClock};

/// How long a fetched snapshot stays valid.
pub const DEFAULT_TTL: Duration = Duration::from_secs(30 * 60);

/// How often the janitor sweeps expired entries.
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Longest accepted TTL; larger values are clamped.
pub const MAX_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Shortest janitor period; smaller values are raised to it.
pub const MIN_CLEANUP_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy)]
struct CachedRate {
    rate: f64,
    expires_at: Instant,
}

#[derive(Debug, Default)]
struct RateTable {
    entries: HashMap<CurrencyCode, CachedRate>,
    /// Expiry of the last successful refresh. While it lies in the future a
    /// miss is answered from the table without asking the source again.
    fresh_until: Option<Instant>,
}

/// Exchange rate cache keyed by currency code.
///
/// Rates are ratios of the base currency to the requested code. All entries
/// are replaced together by one upstream fetch; eviction is plain TTL.
pub struct RateCache<S, C = SystemClock> {
    source: S,
    clock: C,
    base: CurrencyCode,
    ttl: Duration,
    table: RwLock<RateTable>,
    /// Serialises refreshes so concurrent misses share one fetch.
    refresh: Mutex<()>,
}

impl<S: RateSource> RateCache<S, SystemClock> {
    /// Creates a cache using the system clock.
    pub fn new(source: S, base: CurrencyCode, ttl: Duration) -> Self {
        Self::with_clock(source, SystemClock, base, ttl)
    }
}

impl<S: RateSource, C: Clock> RateCache<S, C> {
    /// Creates a cache with an explicit clock. `ttl` is clamped to [`MAX_TTL`].
    pub fn with_clock(source: S, clock: C, base: CurrencyCode, ttl: Duration) -> Self {
        if ttl > MAX_TTL {
            tracing::warn!(
                requested_secs = ttl.as_secs(),
                max_secs = MAX_TTL.as_secs(),
                "exchange rate ttl clamped"
            );
        }
        Self {
            source,
            clock,
            base,
            ttl: ttl.min(MAX_TTL),
            table: RwLock::new(RateTable::default()),
            refresh: Mutex::new(()),
        }
    }

    pub fn base(&self) -> &CurrencyCode {
        &self.base
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the base-to-`code` rate.
    ///
    /// The base code is answered with `1.0` without touching the table. A
    /// miss triggers at most one refresh; if the code is still missing
    /// afterwards it is reported as [`ExchangeError::CurrencyUnavailable`].
    pub async fn get(&self, code: &CurrencyCode) -> Result<f64, ExchangeError> {
        if *code == self.base {
            return Ok(1.0);
        }

        if let Some(rate) = self.lookup(code).await {
            tracing::debug!(%code, rate, "exchange rate cache hit");
            return Ok(rate);
        }

        tracing::debug!(%code, "exchange rate cache miss");
        let _guard = self.refresh.lock().await;

        // Someone else may have refreshed while we waited for the lock.
        if !self.is_fresh().await {
            self.refresh_locked().await?;
        }

        match self.lookup(code).await {
            Some(rate) => Ok(rate),
            None => {
                tracing::info!(%code, "requested rate was not found in the rate source response");
                Err(ExchangeError::CurrencyUnavailable(code.clone()))
            }
        }
    }

    /// Unconditionally refetches the whole table. Returns the number of
    /// currencies stored.
    pub async fn refresh(&self) -> Result<usize, ExchangeError> {
        let _guard = self.refresh.lock().await;
        self.refresh_locked().await
    }

    async fn refresh_locked(&self) -> Result<usize, ExchangeError> {
        let snapshot = match self.source.fetch(&self.base).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(base = %self.base, error = %e, "failed to fetch exchange rates");
                return Err(e);
            }
        };

        let Some(expires_at) = self.clock.now().checked_add(self.ttl) else {
            return Err(ExchangeError::RateSourceUnavailable(
                "rate expiry is out of the clock range".into(),
            ));
        };
        let entries: HashMap<CurrencyCode, CachedRate> = snapshot
            .rates
            .into_iter()
            .filter_map(|(code, rate)| match CurrencyCode::new(&code) {
                Ok(code) if rate.is_finite() && rate > 0.0 => {
                    Some((code, CachedRate { rate, expires_at }))
                }
                _ => {
                    tracing::debug!(%code, rate, "skipping unusable rate");
                    None
                }
            })
            .collect();

        let count = entries.len();
        *self.table.write().await = RateTable {
            entries,
            fresh_until: Some(expires_at),
        };

        tracing::info!(base = %self.base, currencies = count, "exchange rates refreshed");
        Ok(count)
    }

    async fn lookup(&self, code: &CurrencyCode) -> Option<f64> {
        let now = self.clock.now();
        self.table
            .read()
            .await
            .entries
            .get(code)
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.rate)
    }

    async fn is_fresh(&self) -> bool {
        let now = self.clock.now();
        self.table
            .read()
            .await
            .fresh_until
            .is_some_and(|until| until > now)
    }

    /// Drops every expired entry. Returns how many were removed.
    pub async fn evict_expired(&self) -> usize {
        let now = self.clock.now();
        let mut table = self.table.write().await;
        let before = table.entries.len();
        table.entries.retain(|_, entry| entry.expires_at > now);
        before - table.entries.len()
    }

    /// Number of entries currently held, expired or not.
    pub async fn len(&self) -> usize {
        self.table.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Starts a background task evicting expired entries every `interval`.
    ///
    /// The task only keeps a weak reference and exits once the cache is dropped.
    /// Periods below [`MIN_CLEANUP_INTERVAL`] are raised to it.
    pub fn spawn_janitor(self: &Arc<Self>, interval: Duration) -> tokio::task::JoinHandle<()> {
        if interval < MIN_CLEANUP_INTERVAL {
            tracing::warn!(
                requested_ms = interval.as_millis() as u64,
                "janitor interval raised to the minimum"
            );
        }
        let interval = interval.max(MIN_CLEANUP_INTERVAL);
        let cache = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(cache) = cache.upgrade() else {
                    break;
                };
                let evicted = cache.evict_expired().await;
                if evicted > 0 {
                    tracing::debug!(evicted, "evicted expired exchange rates");
                }
            }
        })
    }
}
