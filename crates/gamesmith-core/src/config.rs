//! Generator configuration.
//!
//! [`GeneratorConfig`] is assembled in layers: built-in defaults, an optional
//! TOML file, then environment overrides.  Every field has a default so a
//! config file only needs to name what it changes.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GenerationError, Result};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Default chat-completion endpoint.
pub const DEFAULT_API_URL: &str = "https://api.deepseek.com/chat/completions";

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "deepseek-chat";

/// Environment variable overriding the endpoint URL.
pub const ENV_API_URL: &str = "GAMESMITH_API_URL";

/// Environment variable holding the API key.
pub const ENV_API_KEY: &str = "GAMESMITH_API_KEY";

/// Fallback environment variable holding the API key.
pub const ENV_API_KEY_FALLBACK: &str = "DEEPSEEK_API_KEY";

/// Environment variable overriding the model.
pub const ENV_MODEL: &str = "GAMESMITH_MODEL";

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Settings for one [`GenerationRequestFlow`](crate::GenerationRequestFlow).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Full URL of the chat-completion endpoint.
    pub api_url: String,

    /// Bearer token sent in the `Authorization` header.
    #[serde(skip_serializing)]
    pub api_key: String,

    /// Model identifier sent in the request body.
    pub model: String,

    /// Maximum tokens the model may produce.
    pub max_tokens: u32,

    /// Sampling temperature.
    pub temperature: f64,

    /// Retries allowed after a timed-out attempt (0 = single attempt).
    pub max_retries: u32,

    /// Timeout for a single attempt, in seconds.
    pub attempt_timeout_secs: u64,

    /// Pause before reissuing a timed-out attempt, in seconds.
    pub retry_backoff_secs: u64,

    /// Tick interval of the progress simulation, in milliseconds.
    pub progress_interval_ms: u64,

    /// Percentage added on each progress tick.
    pub progress_step: u8,

    /// Highest percentage the simulation shows before a response arrives.
    pub progress_ceiling: u8,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_owned(),
            api_key: String::new(),
            model: DEFAULT_MODEL.to_owned(),
            max_tokens: 4000,
            temperature: 0.7,
            max_retries: 3,
            attempt_timeout_secs: 300,
            retry_backoff_secs: 5,
            progress_interval_ms: 500,
            progress_step: 10,
            progress_ceiling: 90,
        }
    }
}

impl GeneratorConfig {
    /// Load a configuration from a TOML file, falling back to defaults for
    /// missing fields.  A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "config file does not exist, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| GenerationError::Config {
            reason: format!("failed to read {}: {e}", path.display()),
        })?;

        let config = Self::from_toml(&content)?;
        debug!(path = %path.display(), "config file loaded");
        Ok(config)
    }

    /// Parse a configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| GenerationError::Config {
            reason: format!("invalid config: {e}"),
        })
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides using `lookup` to resolve variable names.  Empty
    /// values are ignored.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(ENV_API_URL) {
            self.api_url = url;
        }
        if let Some(key) = get(ENV_API_KEY).or_else(|| get(ENV_API_KEY_FALLBACK)) {
            self.api_key = key;
        }
        if let Some(model) = get(ENV_MODEL) {
            self.model = model;
        }
    }

    /// Check the configuration for values the flow cannot work with.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| -> Result<()> {
            Err(GenerationError::Config {
                reason: reason.to_owned(),
            })
        };

        if self.api_url.trim().is_empty() {
            return invalid("api_url must not be empty");
        }
        if self.model.trim().is_empty() {
            return invalid("model must not be empty");
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return invalid("temperature must be within 0.0..=2.0");
        }
        if self.attempt_timeout_secs == 0 {
            return invalid("attempt_timeout_secs must be positive");
        }
        if self.progress_interval_ms == 0 {
            return invalid("progress_interval_ms must be positive");
        }
        if self.progress_ceiling > 100 {
            return invalid("progress_ceiling must not exceed 100");
        }
        Ok(())
    }

    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_secs(self.attempt_timeout_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_secs(self.retry_backoff_secs)
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }
}
