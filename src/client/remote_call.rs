//! # Remote Call Client
//!
//! Issues one logical remote call with a hard deadline per attempt, retries
//! with backoff, and classified errors.
//!
//! Every attempt asks the [`CredentialProvider`] for a fresh credential. A
//! missing session ends the call immediately. Transport failures go through
//! the [`ErrorClassifier`] and the [`RetryPolicy`] decides whether, and after
//! how long, another attempt is made. Only the final classified error ever
//! reaches the caller.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, warn};

use crate::client::traits::{CredentialProvider, RemoteTransport};
use crate::constants::events;
use crate::logging::log_remote_call;
use crate::resilience::{
    ClassifiedError, ErrorClassifier, ErrorKind, RetryDecision, RetryPolicy,
    StandardErrorClassifier,
};

/// How a single attempt ended
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    Succeeded,
    Failed(ClassifiedError),
}

/// One transport invocation within a logical call
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteCallAttempt {
    /// 0-based attempt index
    pub index: u32,
    /// Offset from the start of the logical call
    pub started_after: Duration,
    pub elapsed: Duration,
    pub outcome: AttemptOutcome,
}

impl RemoteCallAttempt {
    pub fn succeeded(&self) -> bool {
        matches!(self.outcome, AttemptOutcome::Succeeded)
    }

    pub fn error(&self) -> Option<&ClassifiedError> {
        match &self.outcome {
            AttemptOutcome::Succeeded => None,
            AttemptOutcome::Failed(error) => Some(error),
        }
    }
}

/// Result of a logical call together with its attempt history
#[derive(Debug)]
pub struct CallReport<R> {
    pub operation: String,
    pub attempts: Vec<RemoteCallAttempt>,
    pub result: Result<R, ClassifiedError>,
}

impl<R> CallReport<R> {
    pub fn attempt_count(&self) -> usize {
        self.attempts.len()
    }

    /// Gaps between the end of one attempt and the start of the next
    pub fn inter_attempt_delays(&self) -> Vec<Duration> {
        self.attempts
            .windows(2)
            .map(|pair| {
                pair[1]
                    .started_after
                    .saturating_sub(pair[0].started_after + pair[0].elapsed)
            })
            .collect()
    }
}

/// Remote-call client with timeout, retry and classification
#[derive(Clone)]
pub struct RemoteCallClient {
    transport: Arc<dyn RemoteTransport>,
    credentials: Arc<dyn CredentialProvider>,
    classifier: Arc<dyn ErrorClassifier>,
    retry_policy: RetryPolicy,
}

impl std::fmt::Debug for RemoteCallClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteCallClient")
            .field("transport", &self.transport.transport_name())
            .field("classifier", &self.classifier.classifier_name())
            .field("retry_policy", &self.retry_policy)
            .finish()
    }
}

impl RemoteCallClient {
    /// Client with the standard classifier and default retry policy
    pub fn new(
        transport: Arc<dyn RemoteTransport>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        Self {
            transport,
            credentials,
            classifier: Arc::new(StandardErrorClassifier::new()),
            retry_policy: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    #[must_use]
    pub fn with_classifier(mut self, classifier: Arc<dyn ErrorClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Issue `operation` and decode its response
    pub async fn call<R: DeserializeOwned>(
        &self,
        operation: &str,
        payload: Value,
        timeout: Duration,
    ) -> Result<R, ClassifiedError> {
        self.call_with_attempts(operation, payload, timeout)
            .await
            .result
    }

    /// Issue `operation` and keep the history of every attempt
    pub async fn call_with_attempts<R: DeserializeOwned>(
        &self,
        operation: &str,
        payload: Value,
        timeout: Duration,
    ) -> CallReport<R> {
        let call_started = Instant::now();
        let mut attempts = Vec::new();
        let mut attempt_index: u32 = 0;

        debug!(
            operation = %operation,
            timeout_ms = timeout.as_millis() as u64,
            max_attempts = self.retry_policy.max_attempts(),
            event = events::REMOTE_CALL_STARTED,
            "Starting remote call"
        );

        loop {
            let Some(credential) = self.credentials.credential().await else {
                let error = ClassifiedError::session_expired();
                error!(
                    operation = %operation,
                    attempt = attempt_index,
                    event = events::REMOTE_CALL_FAILED,
                    "No valid session, remote call aborted"
                );
                return CallReport {
                    operation: operation.to_string(),
                    attempts,
                    result: Err(error),
                };
            };

            let attempt_started = Instant::now();
            let outcome: Result<R, ClassifiedError> = match tokio::time::timeout(
                timeout,
                self.transport.invoke(operation, &payload, &credential),
            )
            .await
            {
                Ok(Ok(value)) => decode_response(operation, value),
                Ok(Err(failure)) => Err(self.classifier.classify(&failure)),
                Err(_) => Err(ClassifiedError::timeout()),
            };
            let elapsed = attempt_started.elapsed();
            let started_after = attempt_started.duration_since(call_started);

            match outcome {
                Ok(response) => {
                    attempts.push(RemoteCallAttempt {
                        index: attempt_index,
                        started_after,
                        elapsed,
                        outcome: AttemptOutcome::Succeeded,
                    });
                    log_remote_call(
                        operation,
                        attempt_index,
                        events::REMOTE_CALL_SUCCEEDED,
                        elapsed.as_millis() as u64,
                        None,
                    );
                    return CallReport {
                        operation: operation.to_string(),
                        attempts,
                        result: Ok(response),
                    };
                }
                Err(error) => {
                    attempts.push(RemoteCallAttempt {
                        index: attempt_index,
                        started_after,
                        elapsed,
                        outcome: AttemptOutcome::Failed(error.clone()),
                    });

                    match self.retry_policy.decide(attempt_index, &error) {
                        RetryDecision::GiveUp => {
                            error!(
                                operation = %operation,
                                attempts = attempt_index + 1,
                                kind = %error.kind,
                                error = %error.message,
                                event = events::REMOTE_CALL_FAILED,
                                "Remote call failed"
                            );
                            return CallReport {
                                operation: operation.to_string(),
                                attempts,
                                result: Err(error),
                            };
                        }
                        RetryDecision::RetryAfter(delay) => {
                            warn!(
                                operation = %operation,
                                attempt = attempt_index + 1,
                                max_attempts = self.retry_policy.max_attempts(),
                                kind = %error.kind,
                                delay_ms = delay.as_millis() as u64,
                                event = events::REMOTE_CALL_RETRYING,
                                "Remote call failed, will retry"
                            );
                            tokio::time::sleep(delay).await;
                            attempt_index += 1;
                        }
                    }
                }
            }
        }
    }
}

/// An undecodable success body is a service defect, not a transient failure
fn decode_response<R: DeserializeOwned>(operation: &str, value: Value) -> Result<R, ClassifiedError> {
    serde_json::from_value(value).map_err(|e| ClassifiedError {
        terminal: true,
        ..ClassifiedError::new(
            ErrorKind::ApiError,
            format!("Invalid response from {operation}: {e}"),
        )
    })
}
