//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `SOCRATIC` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use socratic_dialogue::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Loop budget: {}", config.dialogue.max_loops);
//! ```

mod ai;
mod dialogue;
mod error;
mod logging;
mod storage;

pub use ai::{AiConfig, AiProvider};
pub use dialogue::DialogueConfig;
pub use error::{ConfigError, ValidationError};
pub use logging::LoggingConfig;
pub use storage::{StorageBackend, StorageConfig};

use serde::Deserialize;

/// Environment variable prefix for every setting.
pub const ENV_PREFIX: &str = "SOCRATIC";

/// Root application configuration
///
/// Every section has working defaults; only the provider API key is needed
/// for a real deployment. Load using [`AppConfig::load()`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// AI provider configuration (OpenAI/Anthropic/mock)
    #[serde(default)]
    pub ai: AiConfig,

    /// Dialogue loop bounds
    #[serde(default)]
    pub dialogue: DialogueConfig,

    /// Dialogue state storage
    #[serde(default)]
    pub storage: StorageConfig,

    /// Tracing subscriber settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `SOCRATIC` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `SOCRATIC__AI__ANTHROPIC_API_KEY=...` -> `ai.anthropic_api_key = ...`
    /// - `SOCRATIC__DIALOGUE__MAX_LOOPS=4` -> `dialogue.max_loops = 4`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix(ENV_PREFIX)
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Load and validate in one step
    pub fn load_validated() -> Result<Self, ConfigError> {
        let config = Self::load()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.ai.validate()?;
        self.dialogue.validate()?;
        self.storage.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::env;
    use std::sync::Mutex;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: [&str; 6] = [
        "SOCRATIC__AI__ANTHROPIC_API_KEY",
        "SOCRATIC__AI__PRIMARY_PROVIDER",
        "SOCRATIC__DIALOGUE__MAX_LOOPS",
        "SOCRATIC__DIALOGUE__MIN_LOOPS_FOR_CLOSURE",
        "SOCRATIC__STORAGE__BACKEND",
        "SOCRATIC__LOGGING__JSON",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_load_defaults_without_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let config = AppConfig::load().unwrap();

        assert_eq!(config.dialogue.max_loops, 3);
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.ai.primary_provider, AiProvider::Anthropic);
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("SOCRATIC__AI__ANTHROPIC_API_KEY", "sk-ant-xxx");
        env::set_var("SOCRATIC__DIALOGUE__MAX_LOOPS", "5");
        env::set_var("SOCRATIC__DIALOGUE__MIN_LOOPS_FOR_CLOSURE", "2");
        env::set_var("SOCRATIC__STORAGE__BACKEND", "file");
        env::set_var("SOCRATIC__LOGGING__JSON", "true");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(
            config.ai.anthropic_api_key.unwrap().expose_secret(),
            "sk-ant-xxx"
        );
        assert_eq!(config.dialogue.max_loops, 5);
        assert_eq!(config.dialogue.min_loops_for_closure, 2);
        assert_eq!(config.storage.backend, StorageBackend::File);
        assert!(config.logging.json);
    }

    #[test]
    fn test_validate_full_config() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("SOCRATIC__AI__ANTHROPIC_API_KEY", "sk-ant-xxx");
        let result = AppConfig::load_validated();
        clear_env();

        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());
    }

    #[test]
    fn test_invalid_loop_bounds_fail_validation() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("SOCRATIC__AI__PRIMARY_PROVIDER", "mock");
        env::set_var("SOCRATIC__DIALOGUE__MAX_LOOPS", "1");
        env::set_var("SOCRATIC__DIALOGUE__MIN_LOOPS_FOR_CLOSURE", "2");
        let result = AppConfig::load_validated();
        clear_env();

        assert!(matches!(
            result,
            Err(ConfigError::ValidationFailed(ValidationError::InvalidLoopBounds(_)))
        ));
    }
}
