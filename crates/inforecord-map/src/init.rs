//! Map loading with retry.
//!
//! Loading the external map engine is the one asynchronous step on the
//! weather map. Failures back off exponentially; only
//! `ProviderUnavailable` is retried.

use std::time::Duration;

use inforecord_core::{MapConfig, MapError};

use crate::provider::{MapHandle, MapOptions, MapProvider};
use crate::surface::MapSurface;

pub const DEFAULT_INITIAL_DELAY_MS: u64 = 200;
pub const DEFAULT_MAX_DELAY_MS: u64 = 3000;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Wait before the first attempt
    pub load_delay: Duration,
    /// Total attempts, at least one is always made
    pub attempts: u32,
    /// Delay after the first failure (doubles each attempt)
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&MapConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &MapConfig) -> Self {
        Self {
            load_delay: Duration::from_millis(config.load_delay_ms),
            attempts: config.init_retries,
            initial_delay: Duration::from_millis(DEFAULT_INITIAL_DELAY_MS),
            max_delay: Duration::from_millis(DEFAULT_MAX_DELAY_MS),
        }
    }

    /// No waiting at all.
    pub fn immediate(attempts: u32) -> Self {
        Self {
            load_delay: Duration::ZERO,
            attempts,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Backoff after failed attempt number `attempt` (0-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.initial_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }
}

/// Initialize `surface`, retrying provider load failures per `policy`.
///
/// # Errors
/// The last `ProviderUnavailable` once attempts run out, or any
/// non-retryable error immediately.
pub async fn initialize_with_retry<P: MapProvider>(
    surface: &mut MapSurface<P>,
    options: &MapOptions,
    policy: &RetryPolicy,
) -> Result<MapHandle, MapError> {
    if !policy.load_delay.is_zero() {
        tokio::time::sleep(policy.load_delay).await;
    }

    let attempts = policy.attempts.max(1);
    let mut attempt = 0;
    loop {
        match surface.initialize(options) {
            Ok(handle) => {
                if attempt > 0 {
                    tracing::info!("Map loaded after {} retries", attempt);
                }
                return Ok(handle);
            }
            Err(e) if e.is_retryable() && attempt + 1 < attempts => {
                let delay = policy.delay_for_attempt(attempt);
                tracing::warn!(
                    "Map load attempt {}/{} failed ({}), retrying in {:?}",
                    attempt + 1,
                    attempts,
                    e,
                    delay
                );
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                attempt += 1;
            }
            Err(e) => {
                tracing::error!("Map load gave up after {} attempt(s): {}", attempt + 1, e);
                return Err(e);
            }
        }
    }
}
