use std::fmt;

/// Errors from the audio engine's configuration boundary.
///
/// The engine itself is fail-soft: playback and update paths degrade to
/// silence instead of erroring, so only configuration parsing can fail.
#[derive(Debug)]
pub enum AudioError {
    Config(ConfigError),
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidJson { message: String },
}

impl fmt::Display for AudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioError::Config(e) => write!(f, "Config error: {e}"),
        }
    }
}

impl std::error::Error for AudioError {}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidJson { message } => write!(f, "invalid JSON: {message}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for AudioError {
    fn from(e: ConfigError) -> Self {
        AudioError::Config(e)
    }
}

impl From<serde_json::Error> for AudioError {
    fn from(e: serde_json::Error) -> Self {
        AudioError::Config(ConfigError::InvalidJson {
            message: e.to_string(),
        })
    }
}
