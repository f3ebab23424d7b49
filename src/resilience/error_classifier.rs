//! # Remote Failure Classification
//!
//! Maps raw failures reported by a remote transport onto the closed set of
//! [`ErrorKind`]s that the rest of the crate reasons about.
//!
//! ## Overview
//!
//! Every failure that leaves a [`RemoteTransport`](crate::client::RemoteTransport)
//! is a [`RawFailure`]: an optional HTTP-like status, the message text, an
//! optional server-supplied retry-after and, when the service answered with a
//! structured error body, the kind it declared. The classifier turns that into
//! a [`ClassifiedError`] carrying a user-facing message.
//!
//! Rules, first match wins:
//!
//! 1. A kind declared by the service itself.
//! 2. Status 401/403: `api_error` with a session-expired message, terminal.
//! 3. Status 429 or "rate limit" in the message: `rate_limit`, retry-after
//!    defaults to 60 seconds.
//! 4. "quota": `quota_exceeded`.
//! 5. "timeout" / "timed out": `timeout`.
//! 6. "validation" / "invalid": `validation_error`.
//! 7. Anything else: `api_error`.
//!
//! ## Usage
//!
//! ```rust
//! use post_planner::resilience::{ErrorClassifier, ErrorKind, RawFailure, StandardErrorClassifier};
//!
//! let classifier = StandardErrorClassifier::new();
//! let error = classifier.classify(&RawFailure::with_status(429, "Too Many Requests"));
//!
//! assert_eq!(error.kind, ErrorKind::RateLimit);
//! assert_eq!(error.retry_after_secs, Some(60));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::constants::retry::DEFAULT_RATE_LIMIT_RETRY_AFTER_SECS;

/// Closed taxonomy of remote-call failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Too many requests, retry after a wait
    RateLimit,
    /// Monthly generation quota used up
    QuotaExceeded,
    /// Generic service failure
    ApiError,
    /// Request rejected as malformed
    ValidationError,
    /// No response before the deadline
    Timeout,
}

impl ErrorKind {
    /// All kinds, in declaration order
    pub const ALL: [ErrorKind; 5] = [
        ErrorKind::RateLimit,
        ErrorKind::QuotaExceeded,
        ErrorKind::ApiError,
        ErrorKind::ValidationError,
        ErrorKind::Timeout,
    ];

    /// Whether a failure of this kind may succeed on a later attempt
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::QuotaExceeded | Self::ValidationError)
    }

    /// Default message shown to the user for this kind
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::RateLimit => {
                "Too many requests. Please wait a moment before trying again."
            }
            Self::QuotaExceeded => {
                "Monthly quota exceeded. The quota resets on the 1st of next month."
            }
            Self::ApiError => "Something went wrong during generation. Please try again.",
            Self::ValidationError => "The submitted data is invalid. Please check your input.",
            Self::Timeout => "Generation took too long. Please try again.",
        }
    }

    /// Stable identifier, matching the serialized form
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RateLimit => "rate_limit",
            Self::QuotaExceeded => "quota_exceeded",
            Self::ApiError => "api_error",
            Self::ValidationError => "validation_error",
            Self::Timeout => "timeout",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ErrorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rate_limit" => Ok(Self::RateLimit),
            "quota_exceeded" => Ok(Self::QuotaExceeded),
            "api_error" => Ok(Self::ApiError),
            "validation_error" => Ok(Self::ValidationError),
            "timeout" => Ok(Self::Timeout),
            _ => Err(format!("Invalid error kind: {s}")),
        }
    }
}

/// Unclassified failure as reported by a transport
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFailure {
    /// HTTP-like status code, when the transport got that far
    pub status: Option<u16>,
    /// Message text from the transport or the response body
    pub message: String,
    /// Server-supplied wait before retrying, in seconds
    pub retry_after_secs: Option<u64>,
    /// Kind declared by the service in a structured error body
    pub declared_kind: Option<ErrorKind>,
}

impl RawFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn retry_after(mut self, seconds: u64) -> Self {
        self.retry_after_secs = Some(seconds);
        self
    }

    #[must_use]
    pub fn declared(mut self, kind: ErrorKind) -> Self {
        self.declared_kind = Some(kind);
        self
    }
}

/// A failure mapped onto an [`ErrorKind`], ready to surface to a caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ClassifiedError {
    pub kind: ErrorKind,
    /// Human-readable message
    pub message: String,
    /// Wait before the next attempt, only set for `rate_limit`
    pub retry_after_secs: Option<u64>,
    /// Set when the failure must never be retried regardless of kind
    #[serde(default)]
    pub terminal: bool,
}

impl ClassifiedError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retry_after_secs: None,
            terminal: false,
        }
    }

    /// Error with the default user-facing message for `kind`
    pub fn from_kind(kind: ErrorKind) -> Self {
        Self::new(kind, kind.user_message())
    }

    pub fn rate_limited(retry_after_secs: u64) -> Self {
        Self {
            retry_after_secs: Some(retry_after_secs),
            ..Self::from_kind(ErrorKind::RateLimit)
        }
    }

    pub fn timeout() -> Self {
        Self::from_kind(ErrorKind::Timeout)
    }

    /// No valid session: surfaced as `api_error`, never retried
    pub fn session_expired() -> Self {
        Self {
            terminal: true,
            ..Self::new(
                ErrorKind::ApiError,
                "Your session has expired. Please sign in again.",
            )
        }
    }

    /// Whether the retry loop may attempt the call again
    pub fn is_retryable(&self) -> bool {
        !self.terminal && self.kind.is_retryable()
    }

    /// Whether the UI should offer the user a retry affordance
    pub fn offers_retry(&self) -> bool {
        self.is_retryable()
    }

    pub fn retry_after(&self) -> Option<Duration> {
        self.retry_after_secs.map(Duration::from_secs)
    }
}

/// Strategy for mapping raw failures to classified errors
pub trait ErrorClassifier: Send + Sync {
    /// Classify a single raw failure
    fn classify(&self, failure: &RawFailure) -> ClassifiedError;

    /// Classifier name for logging
    fn classifier_name(&self) -> &'static str;
}

/// Configuration for [`StandardErrorClassifier`]
#[derive(Debug, Clone)]
pub struct ErrorClassifierConfig {
    /// Retry-after used for rate limits when the server gives none
    pub default_rate_limit_retry_after_secs: u64,
}

impl Default for ErrorClassifierConfig {
    fn default() -> Self {
        Self {
            default_rate_limit_retry_after_secs: DEFAULT_RATE_LIMIT_RETRY_AFTER_SECS,
        }
    }
}

/// Status- and message-based classifier used by the remote call client
#[derive(Debug, Clone, Default)]
pub struct StandardErrorClassifier {
    config: ErrorClassifierConfig,
}

impl StandardErrorClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ErrorClassifierConfig) -> Self {
        Self { config }
    }

    fn rate_limit(&self, failure: &RawFailure) -> ClassifiedError {
        ClassifiedError::rate_limited(
            failure
                .retry_after_secs
                .unwrap_or(self.config.default_rate_limit_retry_after_secs),
        )
    }

    fn classify_declared(&self, kind: ErrorKind, failure: &RawFailure) -> ClassifiedError {
        match kind {
            ErrorKind::RateLimit => self.rate_limit(failure),
            ErrorKind::ApiError if failure.message.trim().is_empty() => {
                ClassifiedError::from_kind(kind)
            }
            ErrorKind::ApiError => ClassifiedError::new(kind, failure.message.clone()),
            _ => ClassifiedError::from_kind(kind),
        }
    }
}

impl ErrorClassifier for StandardErrorClassifier {
    fn classify(&self, failure: &RawFailure) -> ClassifiedError {
        if let Some(kind) = failure.declared_kind {
            if !matches!(failure.status, Some(401 | 403)) {
                return self.classify_declared(kind, failure);
            }
        }

        if matches!(failure.status, Some(401 | 403)) {
            return ClassifiedError::session_expired();
        }

        let message = failure.message.to_lowercase();

        if failure.status == Some(429) || message.contains("rate limit") {
            return self.rate_limit(failure);
        }

        if message.contains("quota") {
            return ClassifiedError::from_kind(ErrorKind::QuotaExceeded);
        }

        if message.contains("timeout") || message.contains("timed out") {
            return ClassifiedError::timeout();
        }

        if message.contains("validation") || message.contains("invalid") {
            return ClassifiedError::from_kind(ErrorKind::ValidationError);
        }

        if failure.message.trim().is_empty() {
            ClassifiedError::from_kind(ErrorKind::ApiError)
        } else {
            ClassifiedError::new(ErrorKind::ApiError, failure.message.clone())
        }
    }

    fn classifier_name(&self) -> &'static str {
        "StandardErrorClassifier"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn classify(failure: RawFailure) -> ClassifiedError {
        StandardErrorClassifier::new().classify(&failure)
    }

    #[test]
    fn test_status_429_is_rate_limit_with_default_wait() {
        let error = classify(RawFailure::with_status(429, "Too Many Requests"));

        assert_eq!(error.kind, ErrorKind::RateLimit);
        assert_eq!(error.retry_after_secs, Some(60));
        assert!(error.is_retryable());
    }

    #[test]
    fn test_server_retry_after_is_kept() {
        let error = classify(RawFailure::new("Rate limit reached").retry_after(12));

        assert_eq!(error.kind, ErrorKind::RateLimit);
        assert_eq!(error.retry_after(), Some(Duration::from_secs(12)));
    }

    #[test]
    fn test_message_rules() {
        assert_eq!(
            classify(RawFailure::new("Monthly quota exceeded")).kind,
            ErrorKind::QuotaExceeded
        );
        assert_eq!(
            classify(RawFailure::new("upstream timed out")).kind,
            ErrorKind::Timeout
        );
        assert_eq!(
            classify(RawFailure::new("Gateway Timeout")).kind,
            ErrorKind::Timeout
        );
        assert_eq!(
            classify(RawFailure::new("Invalid platform")).kind,
            ErrorKind::ValidationError
        );
        assert_eq!(
            classify(RawFailure::new("schema validation failed")).kind,
            ErrorKind::ValidationError
        );
    }

    #[test]
    fn test_unknown_failure_keeps_message() {
        let error = classify(RawFailure::with_status(500, "model overloaded"));

        assert_eq!(error.kind, ErrorKind::ApiError);
        assert_eq!(error.message, "model overloaded");
        assert!(error.is_retryable());
    }

    #[test]
    fn test_empty_message_falls_back_to_default_text() {
        let error = classify(RawFailure::with_status(502, ""));
        assert_eq!(error.message, ErrorKind::ApiError.user_message());
    }

    #[test]
    fn test_auth_failures_are_terminal_session_expired() {
        for status in [401, 403] {
            let error = classify(RawFailure::with_status(status, "rate limit invalid quota"));
            assert_eq!(error.kind, ErrorKind::ApiError);
            assert!(error.terminal);
            assert!(!error.is_retryable());
        }
    }

    #[test]
    fn test_declared_kind_wins_over_status() {
        let failure = RawFailure::with_status(429, "Monthly post generation quota exceeded")
            .declared(ErrorKind::QuotaExceeded);

        let error = classify(failure);

        assert_eq!(error.kind, ErrorKind::QuotaExceeded);
        assert!(!error.is_retryable());
    }

    #[test]
    fn test_error_kind_round_trips_through_str() {
        for kind in ErrorKind::ALL {
            assert_eq!(kind.as_str().parse::<ErrorKind>(), Ok(kind));
        }
        assert!("unknown".parse::<ErrorKind>().is_err());
    }

    proptest! {
        #[test]
        fn prop_rate_limit_always_carries_wait(message in ".*", retry_after in proptest::option::of(0u64..3600)) {
            let mut failure = RawFailure::with_status(429, message);
            failure.retry_after_secs = retry_after;
            let error = classify(failure);
            prop_assert_eq!(error.kind, ErrorKind::RateLimit);
            prop_assert_eq!(error.retry_after_secs, Some(retry_after.unwrap_or(60)));
        }

        #[test]
        fn prop_only_rate_limit_has_retry_after(status in proptest::option::of(400u16..600), message in "[a-z ]{0,40}") {
            let error = classify(RawFailure { status, message, ..RawFailure::default() });
            prop_assert_eq!(error.retry_after_secs.is_some(), error.kind == ErrorKind::RateLimit);
        }
    }
}
