//! # Planner Configuration System
//!
//! YAML-based configuration with per-environment overrides for the generation
//! service endpoint, operation deadlines, retry policy, batch plan and
//! auto-save settings.
//!
//! ## Architecture
//!
//! - **Single file**: `planner-config.yaml` in the configuration directory
//! - **Environment awareness**: `development` / `test` / `production`
//!   sections override the base document
//! - **Explicit validation**: a loaded configuration is always validated
//! - **Defaults**: [`PlannerConfig::default`] works without any file
//!
//! ## Usage
//!
//! ```rust,no_run
//! use post_planner::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let policy = manager.config().retry.to_policy();
//! println!("{} attempts per call", policy.max_attempts());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

use crate::autosave::AutoSaveConfig;
use crate::client::{
    CredentialProvider, GenerationClient, OperationTimeouts, RemoteCallClient, RemoteTransport,
};
use crate::constants::{retry, system, timeouts};
use crate::orchestration::BatchPlan;
use crate::resilience::{ErrorClassifierConfig, RetryPolicy, StandardErrorClassifier};

/// Root configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Environment the configuration was loaded for
    pub environment: String,
    pub generation: GenerationConfig,
    pub retry: RetryConfig,
    pub batch: BatchPlan,
    pub auto_save: AutoSaveConfig,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            environment: system::DEFAULT_ENVIRONMENT.to_string(),
            generation: GenerationConfig::default(),
            retry: RetryConfig::default(),
            batch: BatchPlan::default(),
            auto_save: AutoSaveConfig::default(),
        }
    }
}

/// Generation service endpoint and per-operation deadlines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub base_url: String,
    /// Public project key sent alongside the bearer token
    pub api_key: Option<String>,
    pub ideas_timeout_ms: u64,
    pub post_timeout_ms: u64,
    pub variants_timeout_ms: u64,
    pub quota_timeout_ms: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:54321".to_string(),
            api_key: None,
            ideas_timeout_ms: timeouts::GENERATE_IDEAS_MS,
            post_timeout_ms: timeouts::GENERATE_POST_MS,
            variants_timeout_ms: timeouts::GENERATE_VARIANTS_MS,
            quota_timeout_ms: timeouts::CHECK_QUOTA_MS,
        }
    }
}

/// Retry and classification settings for remote calls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub multiplier: f64,
    pub max_delay_ms: u64,
    /// Wait for a rate limit whose response names none, in seconds
    pub rate_limit_default_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: retry::DEFAULT_MAX_RETRIES,
            base_delay_ms: retry::DEFAULT_BASE_DELAY_MS,
            multiplier: retry::DEFAULT_BACKOFF_MULTIPLIER,
            max_delay_ms: retry::DEFAULT_MAX_DELAY_MS,
            rate_limit_default_secs: retry::DEFAULT_RATE_LIMIT_RETRY_AFTER_SECS,
        }
    }
}

impl RetryConfig {
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay_ms: self.base_delay_ms,
            multiplier: self.multiplier,
            max_delay_ms: self.max_delay_ms,
        }
    }

    pub fn classifier_config(&self) -> ErrorClassifierConfig {
        ErrorClassifierConfig {
            default_rate_limit_retry_after_secs: self.rate_limit_default_secs,
        }
    }
}

impl PlannerConfig {
    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let base_url = self.generation.base_url.trim();
        if base_url.is_empty() {
            return Err(ConfigurationError::invalid_value(
                "generation.base_url",
                base_url,
                "must not be empty",
            ));
        }
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigurationError::invalid_value(
                "generation.base_url",
                base_url,
                "must start with http:// or https://",
            ));
        }

        for (field, value) in [
            ("generation.ideas_timeout_ms", self.generation.ideas_timeout_ms),
            ("generation.post_timeout_ms", self.generation.post_timeout_ms),
            ("generation.variants_timeout_ms", self.generation.variants_timeout_ms),
            ("generation.quota_timeout_ms", self.generation.quota_timeout_ms),
            ("retry.base_delay_ms", self.retry.base_delay_ms),
            ("auto_save.delay_ms", self.auto_save.delay_ms),
        ] {
            if value == 0 {
                return Err(ConfigurationError::invalid_value(
                    field,
                    value.to_string(),
                    "must be greater than 0",
                ));
            }
        }

        if !self.retry.multiplier.is_finite() || self.retry.multiplier < 1.0 {
            return Err(ConfigurationError::invalid_value(
                "retry.multiplier",
                self.retry.multiplier.to_string(),
                "must be at least 1.0",
            ));
        }

        if self.retry.max_delay_ms < self.retry.base_delay_ms {
            return Err(ConfigurationError::invalid_value(
                "retry.max_delay_ms",
                self.retry.max_delay_ms.to_string(),
                "must not be lower than retry.base_delay_ms",
            ));
        }

        Ok(())
    }

    pub fn is_test_environment(&self) -> bool {
        self.environment == "test"
    }

    pub fn is_production_environment(&self) -> bool {
        self.environment == "production"
    }

    /// Remote call client using this configuration's retry settings
    pub fn remote_call_client(
        &self,
        transport: Arc<dyn RemoteTransport>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> RemoteCallClient {
        RemoteCallClient::new(transport, credentials)
            .with_retry_policy(self.retry.to_policy())
            .with_classifier(Arc::new(StandardErrorClassifier::with_config(
                self.retry.classifier_config(),
            )))
    }

    /// Generation client using this configuration's deadlines and retry settings
    pub fn generation_client(
        &self,
        transport: Arc<dyn RemoteTransport>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> GenerationClient {
        GenerationClient::new(self.remote_call_client(transport, credentials))
            .with_timeouts(OperationTimeouts::from(&self.generation))
    }
}
