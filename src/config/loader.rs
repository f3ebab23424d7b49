//! Configuration Loader
//!
//! Environment-aware configuration loading: YAML file discovery, environment
//! detection, override merging and environment variable overrides.

use super::error::{ConfigResult, ConfigurationError};
use super::PlannerConfig;
use serde_yaml::Value as YamlValue;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::constants::system::{CONFIG_FILE_NAME, DEFAULT_ENVIRONMENT, KNOWN_ENVIRONMENTS};

/// Loaded configuration together with where it came from
#[derive(Debug)]
pub struct ConfigManager {
    config: PlannerConfig,
    environment: String,
    config_directory: PathBuf,
}

impl ConfigManager {
    /// Load configuration with environment auto-detection
    pub fn load() -> ConfigResult<Arc<ConfigManager>> {
        Self::load_from_directory(None)
    }

    /// Load configuration from a specific directory
    pub fn load_from_directory(config_dir: Option<PathBuf>) -> ConfigResult<Arc<ConfigManager>> {
        let environment = Self::detect_environment();
        Self::load_from_directory_with_env(config_dir, &environment)
    }

    /// Load configuration from a specific directory with explicit environment
    ///
    /// Environment variable overrides are not applied here, so tests can call
    /// it without touching process-wide state.
    pub fn load_from_directory_with_env(
        config_dir: Option<PathBuf>,
        environment: &str,
    ) -> ConfigResult<Arc<ConfigManager>> {
        let config_directory = config_dir.unwrap_or_else(Self::default_config_directory);

        debug!(
            "Loading configuration for environment '{}' from directory: {}",
            environment,
            config_directory.display()
        );

        let config = Self::load_and_merge_config(&config_directory, environment)?;
        config.validate()?;

        Ok(Arc::new(Self::finish(config, environment, config_directory)))
    }

    /// Load with auto-detected environment and `PLANNER_*` variable overrides
    pub fn load_with_overrides(config_dir: Option<PathBuf>) -> ConfigResult<Arc<ConfigManager>> {
        let environment = Self::detect_environment();
        let config_directory = config_dir.unwrap_or_else(Self::default_config_directory);

        let mut config = Self::load_and_merge_config(&config_directory, &environment)?;
        Self::apply_env_overrides(&mut config)?;
        config.validate()?;

        Ok(Arc::new(Self::finish(config, &environment, config_directory)))
    }

    fn finish(config: PlannerConfig, environment: &str, config_directory: PathBuf) -> Self {
        debug!(
            "Configuration loaded successfully: {}",
            serde_json::to_string_pretty(&Self::sanitize_config_for_logging(&config))
                .unwrap_or_else(|_| "[serialization error]".to_string())
        );

        info!(
            environment = %environment,
            base_url = %config.generation.base_url,
            max_retries = config.retry.max_retries,
            auto_save_delay_ms = config.auto_save.delay_ms,
            "Configuration loaded successfully"
        );

        ConfigManager {
            config,
            environment: environment.to_string(),
            config_directory,
        }
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Configuration as JSON with sensitive fields masked
    pub fn debug_config(&self) -> serde_json::Value {
        Self::sanitize_config_for_logging(&self.config)
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn config_directory(&self) -> &Path {
        &self.config_directory
    }

    fn sanitize_config_for_logging(config: &PlannerConfig) -> serde_json::Value {
        let mut config_json = serde_json::json!(config);
        let sensitive_patterns = ["password", "secret", "key", "token", "credential"];
        Self::sanitize_json_recursive(&mut config_json, &sensitive_patterns);
        config_json
    }

    fn sanitize_json_recursive(value: &mut serde_json::Value, sensitive_patterns: &[&str]) {
        match value {
            serde_json::Value::Object(map) => {
                for (key, val) in map.iter_mut() {
                    let key_lower = key.to_lowercase();
                    let is_sensitive = sensitive_patterns
                        .iter()
                        .any(|pattern| key_lower.contains(pattern));

                    if is_sensitive {
                        *val = match &*val {
                            serde_json::Value::Null => serde_json::Value::Null,
                            serde_json::Value::String(s) if s.is_empty() => {
                                serde_json::Value::String("[EMPTY]".to_string())
                            }
                            _ => serde_json::Value::String("[MASKED]".to_string()),
                        };
                    } else {
                        Self::sanitize_json_recursive(val, sensitive_patterns);
                    }
                }
            }
            serde_json::Value::Array(arr) => {
                for item in arr.iter_mut() {
                    Self::sanitize_json_recursive(item, sensitive_patterns);
                }
            }
            _ => {}
        }
    }

    /// Detect current environment: PLANNER_ENV || APP_ENV || 'development'
    pub fn detect_environment() -> String {
        env::var("PLANNER_ENV")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| DEFAULT_ENVIRONMENT.to_string())
            .to_lowercase()
    }

    /// PLANNER_CONFIG_DIR, else `./config`
    fn default_config_directory() -> PathBuf {
        env::var("PLANNER_CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config"))
    }

    fn find_config_file(config_directory: &Path) -> ConfigResult<PathBuf> {
        let possible_names = [CONFIG_FILE_NAME, "planner-config.yml"];
        let mut searched_paths = Vec::new();

        for name in possible_names {
            let config_path = config_directory.join(name);
            searched_paths.push(config_path.clone());

            if config_path.is_file() {
                debug!("Found configuration file: {}", config_path.display());
                return Ok(config_path);
            }
        }

        Err(ConfigurationError::config_file_not_found(searched_paths))
    }

    fn read_config_file_safely(path: &Path) -> ConfigResult<String> {
        const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

        let metadata = std::fs::metadata(path)
            .map_err(|e| ConfigurationError::file_read_error(path.display().to_string(), e))?;

        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigurationError::invalid_value(
                "file_size",
                metadata.len().to_string(),
                format!(
                    "Configuration file too large ({} bytes > {} bytes limit)",
                    metadata.len(),
                    MAX_CONFIG_FILE_SIZE
                ),
            ));
        }

        std::fs::read_to_string(path)
            .map_err(|e| ConfigurationError::file_read_error(path.display().to_string(), e))
    }

    /// Load and merge configuration with environment-specific overrides
    fn load_and_merge_config(
        config_directory: &Path,
        environment: &str,
    ) -> ConfigResult<PlannerConfig> {
        let config_file = Self::find_config_file(config_directory)?;
        let yaml_content = Self::read_config_file_safely(&config_file)?;

        let mut yaml_data: YamlValue = serde_yaml::from_str(&yaml_content)
            .map_err(|e| ConfigurationError::invalid_yaml(config_file.display().to_string(), e))?;

        if let Some(env_overrides) = yaml_data
            .get(YamlValue::String(environment.to_string()))
            .cloned()
        {
            debug!("Applying environment-specific overrides for: {}", environment);
            Self::merge_yaml_values(&mut yaml_data, env_overrides);
        }

        if let YamlValue::Mapping(ref mut map) = yaml_data {
            for name in KNOWN_ENVIRONMENTS {
                map.remove(YamlValue::String((*name).to_string()));
            }
            map.remove(YamlValue::String(environment.to_string()));
        }

        let mut config: PlannerConfig = serde_yaml::from_value(yaml_data).map_err(|e| {
            ConfigurationError::invalid_yaml(
                config_file.display().to_string(),
                format!("Failed to deserialize configuration: {e}"),
            )
        })?;

        config.environment = environment.to_string();
        Ok(config)
    }

    /// Recursively merge YAML values (environment overrides into base config)
    fn merge_yaml_values(base: &mut YamlValue, override_value: YamlValue) {
        match (&mut *base, override_value) {
            (YamlValue::Mapping(base_map), YamlValue::Mapping(override_map)) => {
                for (key, value) in override_map {
                    if let Some(existing_value) = base_map.get_mut(&key) {
                        Self::merge_yaml_values(existing_value, value);
                    } else {
                        base_map.insert(key, value);
                    }
                }
            }
            (base_ref, override_val) => {
                *base_ref = override_val;
            }
        }
    }

    /// Apply `PLANNER_GENERATION_BASE_URL`, `PLANNER_GENERATION_API_KEY` and
    /// `PLANNER_AUTO_SAVE_ENABLED`
    fn apply_env_overrides(config: &mut PlannerConfig) -> ConfigResult<()> {
        if let Ok(base_url) = env::var("PLANNER_GENERATION_BASE_URL") {
            debug!("Overriding generation.base_url from environment");
            config.generation.base_url = base_url;
        }
        if let Ok(api_key) = env::var("PLANNER_GENERATION_API_KEY") {
            config.generation.api_key = Some(api_key);
        }
        if let Ok(enabled) = env::var("PLANNER_AUTO_SAVE_ENABLED") {
            config.auto_save.enabled = enabled.parse().map_err(|_| {
                ConfigurationError::environment_override_error(
                    "PLANNER_AUTO_SAVE_ENABLED",
                    format!("expected true or false, got '{enabled}'"),
                )
            })?;
        }
        Ok(())
    }
}
