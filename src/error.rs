use thiserror::Error;

/// Failure taxonomy for a topic run.
///
/// Everything except `Delivery` during the photo fallback is fatal to the
/// run that raised it; one topic's failure never affects its siblings.
#[derive(Debug, Error)]
pub enum ScoutError {
    #[error("data island error: {0}")]
    Extraction(String),

    #[error("listing feed error: {0}")]
    Parse(String),

    #[error("bot detection challenge page returned instead of the listing")]
    BotBlocked,

    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("snapshot storage error for {path}: {reason}")]
    Storage { path: String, reason: String },

    #[error("Telegram API error: {status} - {description}")]
    Delivery { status: u16, description: String },
}

/// Errors raised while assembling the process configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("missing API_TOKEN or CHAT_ID; set them in the environment, a .env file, or the config file")]
    MissingCredentials,
}
