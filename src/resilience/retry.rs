//! # Retry Policy
//!
//! Attempt budget and delay schedule for remote calls.
//!
//! A call gets one initial attempt plus up to `max_retries` further attempts.
//! Between attempts the policy waits either the classified retry-after of a
//! rate-limited failure, or `base_delay × multiplier^attempt_index` for every
//! other retryable kind, capped at `max_delay`.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::constants::retry::{
    DEFAULT_BACKOFF_MULTIPLIER, DEFAULT_BASE_DELAY_MS, DEFAULT_MAX_DELAY_MS, DEFAULT_MAX_RETRIES,
};
use crate::resilience::error_classifier::{ClassifiedError, ErrorKind};

/// What the retry loop should do after a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Wait this long, then attempt again
    RetryAfter(Duration),
    /// Stop and surface the error
    GiveUp,
}

/// Retry budget and backoff schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Attempts allowed beyond the first
    pub max_retries: u32,
    /// Delay before the first retry, in milliseconds
    pub base_delay_ms: u64,
    /// Growth factor applied per attempt
    pub multiplier: f64,
    /// Upper bound on any exponential delay, in milliseconds
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            multiplier: DEFAULT_BACKOFF_MULTIPLIER,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Total number of attempts a call may make
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Exponential delay after the attempt with the given 0-based index
    pub fn backoff_delay(&self, attempt_index: u32) -> Duration {
        let exponent = i32::try_from(attempt_index).unwrap_or(i32::MAX);
        let delay_ms = self.base_delay_ms as f64 * self.multiplier.powi(exponent);
        let capped = delay_ms.min(self.max_delay_ms as f64).max(0.0);
        Duration::from_millis(capped as u64)
    }

    /// Decide whether to retry after `error` ended the attempt at `attempt_index`
    pub fn decide(&self, attempt_index: u32, error: &ClassifiedError) -> RetryDecision {
        if !error.is_retryable() || attempt_index >= self.max_retries {
            return RetryDecision::GiveUp;
        }

        match (error.kind, error.retry_after()) {
            (ErrorKind::RateLimit, Some(wait)) => RetryDecision::RetryAfter(wait),
            _ => RetryDecision::RetryAfter(self.backoff_delay(attempt_index)),
        }
    }
}
