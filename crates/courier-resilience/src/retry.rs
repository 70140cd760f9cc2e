// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retry with capped exponential backoff for transient failures.
//!
//! [`retry`] wraps any asynchronous operation returning
//! `Result<T, CourierError>`. Failures are retried when they match the
//! policy's explicit retryable categories, or, when no set is configured,
//! when they pass the transient predicate on [`CourierError::is_transient`].
//! The dispatch core never calls this around message processing; retry
//! belongs inside handlers, around their own outbound calls.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use courier_core::{CourierError, ErrorCategory};

/// All retry attempts have been exhausted (or the failure was not retryable).
#[derive(Debug, Error)]
#[error("failed after {attempts} attempts: {source}")]
pub struct RetryExhausted {
    /// Number of attempts actually made.
    pub attempts: u32,
    /// The last failure observed.
    #[source]
    pub source: CourierError,
}

/// Configuration for [`retry`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first (>= 1).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry, in seconds (> 0).
    #[serde(default = "default_base_delay_secs")]
    pub base_delay_secs: f64,

    /// Upper bound on any computed delay, in seconds (>= base).
    #[serde(default = "default_max_delay_secs")]
    pub max_delay_secs: f64,

    /// Double the delay on each attempt; otherwise every delay is the base.
    #[serde(default = "default_exponential_backoff")]
    pub exponential_backoff: bool,

    /// Explicit retryable categories. When set, only failures in these
    /// categories are retried; when unset, the transient predicate decides.
    #[serde(default)]
    pub retryable: Option<Vec<ErrorCategory>>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_secs: default_base_delay_secs(),
            max_delay_secs: default_max_delay_secs(),
            exponential_backoff: default_exponential_backoff(),
            retryable: None,
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_secs() -> f64 {
    1.0
}

fn default_max_delay_secs() -> f64 {
    60.0
}

fn default_exponential_backoff() -> bool {
    true
}

impl RetryPolicy {
    /// Restrict retries to the given failure categories.
    pub fn with_retryable(mut self, categories: Vec<ErrorCategory>) -> Self {
        self.retryable = Some(categories);
        self
    }

    /// Check the policy knobs are internally consistent.
    pub fn validate(&self) -> Result<(), CourierError> {
        if self.max_attempts < 1 {
            return Err(CourierError::Config("max_attempts must be >= 1".into()));
        }
        if self.base_delay_secs <= 0.0 {
            return Err(CourierError::Config("base_delay_secs must be > 0".into()));
        }
        if self.max_delay_secs < self.base_delay_secs {
            return Err(CourierError::Config(
                "max_delay_secs must be >= base_delay_secs".into(),
            ));
        }
        Ok(())
    }

    /// Whether `err` should be retried under this policy.
    pub fn is_retryable(&self, err: &CourierError) -> bool {
        match &self.retryable {
            Some(categories) => categories.contains(&err.category()),
            None => err.is_transient(),
        }
    }

    /// The delay to sleep after a failed `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let delay = if self.exponential_backoff {
            let factor = 2f64.powi(attempt.saturating_sub(1) as i32);
            (self.base_delay_secs * factor).min(self.max_delay_secs)
        } else {
            self.base_delay_secs
        };
        Duration::from_secs_f64(delay)
    }
}

/// Run `op` under `policy`, sleeping between failed attempts.
///
/// Returns the first success, or [`RetryExhausted`] wrapping the last failure
/// once the failure is non-retryable or the attempt budget is spent.
pub async fn retry<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, RetryExhausted>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CourierError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1u32;

    loop {
        debug!(attempt, max_attempts, "attempting operation");
        match op().await {
            Ok(value) => {
                if attempt > 1 {
                    info!(attempt, "operation succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) => {
                if !policy.is_retryable(&err) || attempt >= max_attempts {
                    error!(
                        attempt,
                        error = %err,
                        "operation failed permanently"
                    );
                    return Err(RetryExhausted {
                        attempts: attempt,
                        source: err,
                    });
                }

                let delay = policy.delay_for(attempt);
                warn!(
                    attempt,
                    max_attempts,
                    error = %err,
                    delay_ms = delay.as_millis() as u64,
                    "operation failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
