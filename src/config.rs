use std::env::VarError;
use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::models::Topic;

/// On-disk shape of `config.json`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileConfig {
    #[serde(default)]
    topics: Vec<Topic>,
    telegram_api_token: Option<String>,
    chat_id: Option<String>,
}

/// Resolved process configuration, constructed once at startup and passed
/// by reference into the scheduler and each topic runner.
#[derive(Debug, Clone)]
pub struct Config {
    pub topics: Vec<Topic>,
    pub api_token: String,
    pub chat_id: String,
}

impl Config {
    /// Load configuration from a JSON file, with `API_TOKEN` / `CHAT_ID`
    /// environment variables taking precedence over the file for the
    /// Telegram credentials.
    ///
    /// Calls `dotenvy::dotenv().ok()` so a local `.env` file is honored.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingCredentials` if either credential is
    /// absent from both the environment and the file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        let file: FileConfig = serde_json::from_str(&raw).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::resolve(file, |key| std::env::var(key))
    }

    /// Merge the file config with an env-var lookup. Split out from
    /// [`Config::load`] so tests can drive it with a plain map instead of
    /// mutating the process environment.
    fn resolve<F>(file: FileConfig, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<String, VarError>,
    {
        let api_token = lookup("API_TOKEN").ok().or(file.telegram_api_token);
        let chat_id = lookup("CHAT_ID").ok().or(file.chat_id);
        match (api_token, chat_id) {
            (Some(api_token), Some(chat_id)) => Ok(Self {
                topics: file.topics,
                api_token,
                chat_id,
            }),
            _ => Err(ConfigError::MissingCredentials),
        }
    }

    /// Topics that are not disabled, in configuration order.
    pub fn enabled_topics(&self) -> impl Iterator<Item = &Topic> {
        self.topics.iter().filter(|t| !t.disabled)
    }
}
