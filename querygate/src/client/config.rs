use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_with::{DurationMilliSeconds, serde_as};
use thiserror::Error;

/// A configuration value that cannot work.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("retry.maxAttempts must be at least 1")]
    NoAttempts,
    #[error("retry.multiplier must be a finite number >= 1")]
    InvalidMultiplier,
    #[error("retry.initialBackoff must not exceed retry.maxBackoff")]
    BackoffOrder,
    #[error("cache.staleAfter must not exceed cache.evictAfter")]
    CacheOrder,
    #[error("timeout must be greater than zero")]
    ZeroTimeout,
}

/// Bounded exponential backoff.
///
/// Attempt `n` (1-based) that fails transiently is followed by a delay of
/// `initial_backoff * multiplier^(n-1)`, capped at `max_backoff`.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub initial_backoff: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub max_backoff: Duration,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(5),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay after the failed attempt number `attempt` (1-based).
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        let secs = self.initial_backoff.as_secs_f64() * self.multiplier.powi(exponent);
        Duration::try_from_secs_f64(secs)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::NoAttempts);
        }
        if !self.multiplier.is_finite() || self.multiplier < 1.0 {
            return Err(ConfigError::InvalidMultiplier);
        }
        if self.initial_backoff > self.max_backoff {
            return Err(ConfigError::BackoffOrder);
        }
        Ok(())
    }
}

/// What a read does when it finds an entry past `stale_after`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StalePolicy {
    /// Return the stale value now and refresh it in the background.
    #[default]
    ServeStale,
    /// Wait for a fresh value.
    Refresh,
}

/// Lifetime of cached responses.
#[serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CachePolicy {
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub stale_after: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub evict_after: Duration,
    pub on_stale: StalePolicy,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            stale_after: Duration::from_secs(30),
            evict_after: Duration::from_secs(5 * 60),
            on_stale: StalePolicy::ServeStale,
        }
    }
}

impl CachePolicy {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.stale_after > self.evict_after {
            return Err(ConfigError::CacheOrder);
        }
        Ok(())
    }
}

/// Settings shared by every request of a [`RequestPipeline`](super::RequestPipeline).
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientConfig {
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub timeout: Duration,
    pub user_agent: String,
    pub retry: RetryPolicy,
    pub cache: CachePolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: concat!("querygate/", env!("CARGO_PKG_VERSION")).to_string(),
            retry: RetryPolicy::default(),
            cache: CachePolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Check that the settings describe a working client.
    ///
    /// # Errors
    ///
    /// Returns the first invalid setting found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        self.retry.validate()?;
        self.cache.validate()
    }
}
