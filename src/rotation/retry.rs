//! Retry configuration and the credential-rotating executor.
//!
//! [`KeyRotator::execute`] runs one caller-supplied request at a time,
//! handing it a credential from the live pool. Failures are classified by
//! [`AcebotError::failure_class()`]:
//!
//! - invalid credential: blacklisted for the life of the rotator, cursor advances
//! - rate limited / overloaded: cursor advances, overload also waits
//!   [`RetryConfig::overload_delay`]
//! - anything else: cursor advances
//!
//! Success leaves the cursor where it is, so a working credential stays
//! selected until it fails.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::state::{ResilienceState, RotationReason, RotationStatus};
use crate::credentials::{CredentialSource, DEFAULT_MIN_CREDENTIAL_LEN, parse_pool};
use crate::error::FailureClass;
use crate::telemetry;
use crate::{AcebotError, Result};

/// Configuration for the rotation loop.
///
/// ```rust
/// # use acebot::RetryConfig;
/// # use std::time::Duration;
/// let config = RetryConfig::new()
///     .max_attempts(5)
///     .overload_delay(Duration::from_millis(200))
///     .random_start(true);
/// ```
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Attempts across all credentials combined. Default: 20.
    pub max_attempts: u32,
    /// Wait after a 503 before the next attempt. Default: 800ms.
    pub overload_delay: Duration,
    /// Start the cursor at a random offset. Default: false.
    pub random_start: bool,
    /// Shorter tokens are dropped from the pool. Default: 10.
    pub min_credential_len: usize,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 20,
            overload_delay: Duration::from_millis(800),
            random_start: false,
            min_credential_len: DEFAULT_MIN_CREDENTIAL_LEN,
        }
    }
}

impl RetryConfig {
    /// Create a new config with sensible defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the attempt budget.
    ///
    /// At least one attempt is always made: a budget of 0 runs once and
    /// reports `ExhaustedRetries { attempts: 1, .. }` on failure.
    pub fn max_attempts(mut self, n: u32) -> Self {
        self.max_attempts = n;
        self
    }

    /// Set the wait applied after an overload response.
    pub fn overload_delay(mut self, delay: Duration) -> Self {
        self.overload_delay = delay;
        self
    }

    /// Enable or disable a random starting cursor.
    pub fn random_start(mut self, enabled: bool) -> Self {
        self.random_start = enabled;
        self
    }

    /// Set the minimum credential length.
    pub fn min_credential_len(mut self, len: usize) -> Self {
        self.min_credential_len = len;
        self
    }
}

/// Rotates requests across a credential pool.
///
/// Each rotator owns its own [`ResilienceState`]; use one rotator per
/// upstream service that has an independent key pool.
pub struct KeyRotator {
    source: Arc<dyn CredentialSource>,
    state: ResilienceState,
    config: RetryConfig,
}

impl KeyRotator {
    pub fn new(source: Arc<dyn CredentialSource>, config: RetryConfig) -> Self {
        let state = if config.random_start {
            ResilienceState::with_cursor(rand::random::<u32>() as usize)
        } else {
            ResilienceState::new()
        };
        Self {
            source,
            state,
            config,
        }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    pub fn state(&self) -> &ResilienceState {
        &self.state
    }

    /// Configured credentials minus the blacklist. May be empty.
    pub fn pool(&self) -> Vec<String> {
        let raw = self.source.raw().unwrap_or_default();
        self.state
            .filter(parse_pool(&raw, self.config.min_credential_len))
    }

    /// Like [`pool`](Self::pool), but an empty pool is an error.
    pub fn live_pool(&self) -> Result<Vec<String>> {
        let pool = self.pool();
        if pool.is_empty() {
            return Err(AcebotError::NoCredentialsAvailable);
        }
        Ok(pool)
    }

    /// Snapshot for status displays.
    pub fn status(&self) -> RotationStatus {
        let active = self.pool().len();
        RotationStatus {
            active_credentials: active,
            current_index: self.state.index_for(active).map_or(0, |i| i + 1),
            last_reason: self.state.last_reason(),
        }
    }

    /// Run `f` with the configured attempt budget.
    pub async fn execute<F, Fut, T>(&self, f: F) -> Result<T>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.execute_with_attempts(f, self.config.max_attempts)
            .await
    }

    /// Run `f`, rotating credentials on failure, for at most `max_attempts`
    /// calls (0 counts as 1). `f` must be safe to call repeatedly.
    pub async fn execute_with_attempts<F, Fut, T>(&self, mut f: F, max_attempts: u32) -> Result<T>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = max_attempts.max(1);
        let mut last_err = None;

        for attempt in 0..max_attempts {
            let pool = match self.live_pool() {
                Ok(pool) => pool,
                Err(e) => {
                    metrics::counter!(telemetry::REQUESTS_TOTAL, "status" => "error")
                        .increment(1);
                    return Err(e);
                }
            };
            let index = self.state.index_for(pool.len()).unwrap_or_default();
            let credential = pool[index].clone();
            debug!(
                index = index + 1,
                pool_size = pool.len(),
                attempt = attempt + 1,
                "selected credential"
            );

            let err = match f(credential.clone()).await {
                Ok(value) => {
                    self.state.clear_reason();
                    metrics::counter!(telemetry::REQUESTS_TOTAL, "status" => "ok").increment(1);
                    return Ok(value);
                }
                Err(e) => e,
            };

            self.state.advance();
            match err.failure_class() {
                FailureClass::InvalidCredential => {
                    self.state.blacklist(&credential);
                    metrics::counter!(telemetry::BLACKLISTED_TOTAL).increment(1);
                    metrics::counter!(telemetry::ROTATIONS_TOTAL, "reason" => "invalid")
                        .increment(1);
                    warn!(
                        index = index + 1,
                        attempt = attempt + 1,
                        error = %err,
                        "credential rejected, blacklisting"
                    );
                    if self.pool().is_empty() {
                        metrics::counter!(telemetry::REQUESTS_TOTAL, "status" => "error")
                            .increment(1);
                        return Err(AcebotError::NoCredentialsAvailable);
                    }
                }
                FailureClass::Transient { overloaded } => {
                    let reason = if overloaded {
                        RotationReason::ServerBusy
                    } else {
                        RotationReason::LimitReached
                    };
                    self.state.set_reason(reason);
                    metrics::counter!(telemetry::ROTATIONS_TOTAL,
                        "reason" => if overloaded { "overloaded" } else { "rate_limited" },
                    )
                    .increment(1);
                    warn!(
                        index = index + 1,
                        attempt = attempt + 1,
                        max_attempts,
                        reason = %reason,
                        "rotating after transient error"
                    );
                    if overloaded && attempt + 1 < max_attempts {
                        tokio::time::sleep(self.config.overload_delay).await;
                    }
                }
                FailureClass::Unclassified => {
                    metrics::counter!(telemetry::ROTATIONS_TOTAL, "reason" => "other")
                        .increment(1);
                    warn!(
                        index = index + 1,
                        attempt = attempt + 1,
                        error = %err,
                        "rotating after unclassified error"
                    );
                }
            }
            last_err = Some(err);
        }

        metrics::counter!(telemetry::REQUESTS_TOTAL, "status" => "error").increment(1);
        Err(AcebotError::ExhaustedRetries {
            attempts: max_attempts,
            source: Box::new(last_err.unwrap_or(AcebotError::NoCredentialsAvailable)),
        })
    }
}
