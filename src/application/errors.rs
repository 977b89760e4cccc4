//! Application layer errors

use thiserror::Error;

/// General bot errors
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Plugin error: {0}")]
    Plugin(#[from] PluginError),

    #[error("AI provider error: {0}")]
    Ai(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Plugin registration and execution errors
#[derive(Error, Debug)]
pub enum PluginError {
    #[error("Plugin '{0}' already registered")]
    Duplicate(String),

    #[error("{0} is not configured: {1} is not set")]
    NotConfigured(String, String),

    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variables: {0}")]
    MissingEnv(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Fatal startup errors. Every variant ends the process with status 1.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to prepare data directory: {0}")]
    DataDir(#[from] StorageError),

    #[error("Failed to install signal handlers: {0}")]
    Signal(std::io::Error),

    #[error(transparent)]
    Client(#[from] BotError),
}

impl From<PluginError> for StartupError {
    fn from(e: PluginError) -> Self {
        StartupError::Client(BotError::Plugin(e))
    }
}
