//! # HTTP Transport
//!
//! [`RemoteTransport`] over the hosted function endpoint of the generation
//! service: `POST {base_url}/functions/v1/{operation}` with a bearer token.
//!
//! Error bodies of the form `{ "error": { "type": ..., "message": ... } }`
//! are unpacked into the [`RawFailure`] so the classifier can honour the
//! declared kind. A numeric `Retry-After` header is carried along.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, RETRY_AFTER};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

use crate::client::traits::{Credential, RemoteTransport};
use crate::config::{ConfigurationError, GenerationConfig};
use crate::resilience::{ErrorKind, RawFailure};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// reqwest-backed transport for the generation service
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(config: &GenerationConfig) -> Result<Self, ConfigurationError> {
        let mut default_headers = HeaderMap::new();
        if let Some(api_key) = &config.api_key {
            let value = HeaderValue::from_str(api_key).map_err(|e| {
                ConfigurationError::invalid_value("generation.api_key", "[MASKED]", e.to_string())
            })?;
            default_headers.insert("apikey", value);
        }

        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .default_headers(default_headers)
            .build()
            .map_err(|e| {
                ConfigurationError::invalid_value(
                    "generation.base_url",
                    config.base_url.clone(),
                    format!("Failed to create HTTP client: {e}"),
                )
            })?;

        let base_url = config.base_url.trim_end_matches('/').to_string();
        info!(base_url = %base_url, "Created generation service transport");

        Ok(Self { client, base_url })
    }

    pub fn endpoint(&self, operation: &str) -> String {
        format!("{}/functions/v1/{}", self.base_url, operation)
    }
}

#[async_trait]
impl RemoteTransport for HttpTransport {
    async fn invoke(
        &self,
        operation: &str,
        payload: &Value,
        credential: &Credential,
    ) -> Result<Value, RawFailure> {
        let url = self.endpoint(operation);
        debug!(url = %url, "Invoking generation function");

        let response = self
            .client
            .post(&url)
            .bearer_auth(credential.access_token())
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RawFailure::new(format!("Request timed out: {e}"))
                } else {
                    RawFailure::new(format!("Network error: {e}"))
                }
            })?;

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_retry_after);

        let text = response
            .text()
            .await
            .map_err(|e| RawFailure::with_status(status, format!("Failed to read response: {e}")))?;
        let body: Value = serde_json::from_str(&text).unwrap_or(Value::String(text));

        if (200..300).contains(&status) && body.get("error").is_none() {
            return Ok(body);
        }

        Err(failure_from_body(status, &body, retry_after))
    }

    fn transport_name(&self) -> &'static str {
        "http"
    }
}

/// Seconds form of `Retry-After`; HTTP-date values are ignored
fn parse_retry_after(value: &str) -> Option<u64> {
    value.trim().parse().ok()
}

/// Build a [`RawFailure`] from an error response body
pub(crate) fn failure_from_body(status: u16, body: &Value, retry_after: Option<u64>) -> RawFailure {
    let (declared, message) = match body.get("error") {
        Some(Value::Object(error)) => (
            error
                .get("type")
                .and_then(Value::as_str)
                .and_then(|kind| kind.parse::<ErrorKind>().ok()),
            error
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string),
        ),
        Some(Value::String(message)) => (None, Some(message.clone())),
        _ => (
            None,
            body.get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .or_else(|| body.as_str().map(str::to_string)),
        ),
    };

    RawFailure {
        status: Some(status),
        message: message.unwrap_or_else(|| format!("HTTP {status}")),
        retry_after_secs: retry_after,
        declared_kind: declared,
    }
}
