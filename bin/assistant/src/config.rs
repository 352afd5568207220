//! Centralized assistant configuration.
//!
//! Loaded via the `config` crate from environment variables. Nested keys use
//! a double underscore, e.g. `LLM__API_KEY`.

use serde::Deserialize;
use std::path::PathBuf;
use travel_assistant_ai::OpenAiConfig;
use travel_assistant_core::UserId;

/// Assistant configuration composed from library configs.
#[derive(Debug, Deserialize)]
pub struct AssistantConfig {
    /// PostgreSQL connection URL. Conversations are kept in memory when unset.
    #[serde(default)]
    pub database_url: Option<String>,

    /// The user this terminal session speaks for.
    #[serde(default = "default_user_id")]
    pub user_id: String,

    /// Number of persisted messages sent to the model. Unbounded when unset.
    #[serde(default)]
    pub history_window: Option<usize>,

    /// JSON file with travel records. Built-in sample data when unset.
    #[serde(default)]
    pub travel_data_path: Option<PathBuf>,

    /// Language model configuration.
    pub llm: OpenAiConfig,
}

fn default_user_id() -> String {
    "local".to_string()
}

impl AssistantConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::from_environment(config::Environment::default())
    }

    fn from_environment(environment: config::Environment) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(environment.separator("__").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Returns the configured user.
    #[must_use]
    pub fn user(&self) -> UserId {
        UserId::new(self.user_id.clone())
    }
}
