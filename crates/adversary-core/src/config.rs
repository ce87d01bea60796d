//! Configuration for Adversary services.
//!
//! Loaded from top-level keys in `adversary.toml` or from `ADVERSARY__`
//! environment variables. The generation API key always comes from here;
//! it is never baked into the binary.

use serde::Deserialize;

use crate::error::AdversaryError;

/// Top-level Adversary configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AdversaryConfig {
    /// Chat-completion endpoint of the generation service.
    #[serde(default)]
    pub api_endpoint: Option<String>,

    /// API key for the generation service.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model name passed to the generation service.
    #[serde(default = "default_model")]
    pub model: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Directory for the scenario history store.
    #[serde(default = "default_history_dir")]
    pub history_dir: String,

    /// Maximum number of retained history entries.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Step cap for turn-based play.
    #[serde(default = "default_max_steps")]
    pub max_steps: u32,
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_history_dir() -> String {
    "./history".to_string()
}

fn default_history_limit() -> usize {
    20
}

fn default_max_steps() -> u32 {
    12
}

impl Default for AdversaryConfig {
    fn default() -> Self {
        Self {
            api_endpoint: None,
            api_key: None,
            model: default_model(),
            request_timeout_secs: default_timeout_secs(),
            history_dir: default_history_dir(),
            history_limit: default_history_limit(),
            max_steps: default_max_steps(),
        }
    }
}

impl AdversaryConfig {
    /// Load configuration from `{file_prefix}.toml` (optional) and
    /// `ADVERSARY__` environment variables, falling back to defaults for
    /// anything unset.
    pub fn load(file_prefix: &str) -> Result<Self, AdversaryError> {
        let cfg = config::Config::builder()
            .add_source(config::File::with_name(file_prefix).required(false))
            .add_source(
                config::Environment::with_prefix("ADVERSARY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AdversaryError::Config(e.to_string()))?;

        cfg.try_deserialize()
            .map_err(|e| AdversaryError::Config(e.to_string()))
    }
}
