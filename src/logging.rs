//! # Structured Logging Module
//!
//! Environment-aware structured logging for remote calls, batch runs and
//! auto-save cycles.

use chrono::Utc;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::constants::system::DEFAULT_ENVIRONMENT;

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging with environment-specific configuration
///
/// `RUST_LOG` wins over the environment default. `PLANNER_LOG_FORMAT=json`
/// switches the console layer to JSON lines.
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let log_level = get_log_level(&environment);
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level));
        let json = wants_json_output();

        let layer = if json {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_ansi(false)
                .json()
                .with_filter(filter)
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_ansi(true)
                .with_filter(filter)
                .boxed()
        };

        // A host application may already own the global subscriber
        if tracing_subscriber::registry().with(layer).try_init().is_err() {
            tracing::debug!(
                "Global tracing subscriber already initialized - continuing with existing subscriber"
            );
        }

        tracing::info!(
            environment = %environment,
            log_level = %log_level,
            json = json,
            "🔧 STRUCTURED LOGGING: Initialized"
        );
    });
}

/// Get current environment from environment variables
pub(crate) fn get_environment() -> String {
    std::env::var("PLANNER_ENV")
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENVIRONMENT.to_string())
}

/// Get log level based on environment
fn get_log_level(environment: &str) -> String {
    match environment {
        "production" => "info".to_string(),
        _ => "debug".to_string(),
    }
}

fn wants_json_output() -> bool {
    std::env::var("PLANNER_LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

/// Log structured data for remote call attempts
pub fn log_remote_call(
    operation: &str,
    attempt: u32,
    status: &str,
    elapsed_ms: u64,
    details: Option<&str>,
) {
    tracing::info!(
        operation = %operation,
        attempt = attempt,
        status = %status,
        elapsed_ms = elapsed_ms,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "🌐 REMOTE_CALL"
    );
}

/// Log structured data for batch operations
pub fn log_batch_operation(
    operation: &str,
    item_index: Option<usize>,
    total_items: usize,
    status: &str,
    details: Option<&str>,
) {
    tracing::info!(
        operation = %operation,
        item_index = item_index,
        total_items = total_items,
        status = %status,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "📦 BATCH_OPERATION"
    );
}

/// Log structured data for auto-save operations
pub fn log_save_operation(
    operation: &str,
    status: &str,
    revision: Option<u64>,
    details: Option<&str>,
) {
    tracing::info!(
        operation = %operation,
        status = %status,
        revision = revision,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "💾 SAVE_OPERATION"
    );
}

/// Log error with full context
pub fn log_error(component: &str, operation: &str, error: &str, context: Option<&str>) {
    tracing::error!(
        component = %component,
        operation = %operation,
        error = %error,
        context = context,
        timestamp = %Utc::now().to_rfc3339(),
        "❌ ERROR"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_mapping() {
        assert_eq!(get_log_level("test"), "debug");
        assert_eq!(get_log_level("development"), "debug");
        assert_eq!(get_log_level("production"), "info");
        assert_eq!(get_log_level("unknown"), "debug");
    }

    #[test]
    fn test_initialization_is_idempotent() {
        init_structured_logging();
        init_structured_logging();
        log_save_operation("save", "saved", Some(2), None);
    }
}
