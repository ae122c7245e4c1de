//! Error types for configuration loading
//!
//! Gameplay code never returns errors; bad data is clamped where it is used.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Config text is not valid JSON for the expected shape
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;
