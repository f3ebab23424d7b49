//! # Resilience Module
//!
//! Failure classification and retry scheduling for calls to unreliable
//! remote services.
//!
//! - **Error classification**: raw transport failures become one of five
//!   [`ErrorKind`]s with a user-facing message
//! - **Retry policy**: attempt budget, exponential backoff, rate-limit waits
//!
//! ## Usage
//!
//! ```rust
//! use post_planner::resilience::{ClassifiedError, RetryDecision, RetryPolicy};
//! use std::time::Duration;
//!
//! let policy = RetryPolicy::default();
//! let decision = policy.decide(1, &ClassifiedError::timeout());
//! assert_eq!(decision, RetryDecision::RetryAfter(Duration::from_secs(2)));
//! ```

pub mod error_classifier;
pub mod retry;

pub use error_classifier::{
    ClassifiedError, ErrorClassifier, ErrorClassifierConfig, ErrorKind, RawFailure,
    StandardErrorClassifier,
};
pub use retry::{RetryDecision, RetryPolicy};
