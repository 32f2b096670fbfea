//! Percentage source for transfer fees.
//!
//! [`RateCache`] wraps a [`RateProvider`] and never fails: a fresh value is
//! served from memory for the configured TTL, and when the provider cannot
//! deliver, the last known value (however old) or the configured fallback
//! percentage is returned instead.

pub mod http;

pub use http::{parse_rate, HttpRateProvider};

use crate::config::GameConfig;
use crate::error::{RateError, Result};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Source of the published percentage
#[cfg_attr(test, mockall::automock)]
pub trait RateProvider: Send + Sync {
    fn fetch_rate(&self) -> std::result::Result<f64, RateError>;
}

/// Provider that always answers with the same percentage
#[derive(Debug, Clone, Copy)]
pub struct FixedRate(pub f64);

impl RateProvider for FixedRate {
    fn fetch_rate(&self) -> std::result::Result<f64, RateError> {
        if self.0 > 0.0 {
            Ok(self.0)
        } else {
            Err(RateError::InvalidValue(self.0.to_string()))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateCacheEntry {
    pub value: f64,
    pub fetched_at: DateTime<Utc>,
}

pub struct RateCache {
    provider: Box<dyn RateProvider>,
    ttl: Duration,
    fallback_percent: f64,
    entry: Mutex<Option<RateCacheEntry>>,
}

impl RateCache {
    pub fn new(provider: Box<dyn RateProvider>, ttl: Duration, fallback_percent: f64) -> Self {
        Self {
            provider,
            ttl,
            fallback_percent,
            entry: Mutex::new(None),
        }
    }

    /// Build the cache a config describes: a fixed rate when one is set,
    /// otherwise the HTTP provider
    pub fn from_config(config: &GameConfig) -> Result<Self> {
        let provider: Box<dyn RateProvider> = match config.fixed_rate {
            Some(rate) => Box::new(FixedRate(rate)),
            None => Box::new(HttpRateProvider::new(
                &config.rate_url,
                &config.rate_label,
                config.fetch_timeout,
            )?),
        };

        Ok(Self::new(
            provider,
            config.cache_ttl,
            config.fallback_percent,
        ))
    }

    /// Current percentage, e.g. `21.0` for 21%
    pub fn get_rate(&self) -> f64 {
        if let Some(entry) = self.fresh_entry() {
            tracing::debug!("Using cached rate: {}%", entry.value);
            return entry.value;
        }

        match self.provider.fetch_rate() {
            Ok(value) => {
                *self.entry.lock() = Some(RateCacheEntry {
                    value,
                    fetched_at: Utc::now(),
                });
                tracing::info!("Updated rate cache: {}%", value);
                value
            }
            Err(e) => {
                tracing::warn!("Rate fetch failed: {}", e);

                if let Some(entry) = *self.entry.lock() {
                    tracing::warn!("Using stale cached rate: {}%", entry.value);
                    return entry.value;
                }

                tracing::warn!(
                    "No cached rate, using fallback rate: {}%",
                    self.fallback_percent
                );
                self.fallback_percent
            }
        }
    }

    pub fn cached(&self) -> Option<RateCacheEntry> {
        *self.entry.lock()
    }

    fn fresh_entry(&self) -> Option<RateCacheEntry> {
        let entry = (*self.entry.lock())?;

        // an entry stamped in the future counts as fresh
        let fresh = match Utc::now().signed_duration_since(entry.fetched_at).to_std() {
            Ok(age) => age < self.ttl,
            Err(_) => true,
        };

        fresh.then_some(entry)
    }
}

impl std::fmt::Debug for RateCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateCache")
            .field("ttl", &self.ttl)
            .field("fallback_percent", &self.fallback_percent)
            .field("entry", &*self.entry.lock())
            .finish()
    }
}
