//! Startup sequence
//!
//! Credentials, data directory, configuration, client, plugins, signals.
//! Each step runs only when the previous one succeeded.

use std::future::Future;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::application::client::TelegentClient;
use crate::application::errors::{BotError, StartupError};
use crate::application::lifecycle::{serve, ShutdownSignal};
use crate::domain::traits::Client;
use crate::infrastructure::config::{BotConfig, Credentials, Settings};
use crate::infrastructure::storage::ensure_dir;
use crate::plugins;

/// Options for `telegent-bot run`
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub config_path: PathBuf,
    pub data_dir: Option<PathBuf>,
}

/// Read credentials, make sure the data directory exists and assemble the
/// configuration. `data_dir` overrides the directory from the settings.
pub async fn prepare<F>(lookup: F, settings: &Settings, data_dir: Option<&Path>) -> Result<BotConfig, StartupError>
where
    F: Fn(&str) -> Option<String>,
{
    let credentials = Credentials::from_lookup(lookup)?;

    let data_dir = data_dir.unwrap_or(settings.data_dir.as_path());
    ensure_dir(data_dir).await?;

    Ok(BotConfig::assemble(credentials, settings, data_dir))
}

/// Full startup with an injectable environment, client and shutdown trigger
pub async fn run_with<F, C, B, S>(
    lookup: F,
    settings: &Settings,
    data_dir: Option<&Path>,
    build: B,
    shutdown: S,
) -> Result<(), StartupError>
where
    F: Fn(&str) -> Option<String>,
    C: Client,
    B: FnOnce(&BotConfig) -> Result<C, BotError>,
    S: Future<Output = &'static str>,
{
    let config = prepare(lookup, settings, data_dir).await?;
    let mut client = build(&config)?;
    let plugins = plugins::plugin_set(&config)?;
    serve(&mut client, plugins, shutdown).await
}

/// Run the bot against the real environment until SIGINT or SIGTERM
pub async fn run(options: &RunOptions) -> Result<(), StartupError> {
    let settings = Settings::load_or_default(&options.config_path)?;
    let shutdown = ShutdownSignal::install().map_err(StartupError::Signal)?;

    info!("Starting {}...", settings.bot.name);

    run_with(
        |key| std::env::var(key).ok(),
        &settings,
        options.data_dir.as_deref(),
        TelegentClient::new,
        shutdown.recv(),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::errors::ConfigError;

    fn env(key: &str) -> Option<String> {
        match key {
            "TELEGRAM_TOKEN" => Some("123:abc".to_string()),
            "CLAUDE_API_KEY" => Some("sk-ant".to_string()),
            _ => None,
        }
    }

    #[tokio::test]
    async fn test_prepare_creates_data_dir() {
        let root = tempfile::tempdir().unwrap();
        let data = root.path().join("data");

        let config = prepare(env, &Settings::default(), Some(data.as_path())).await.unwrap();

        assert!(data.is_dir());
        assert_eq!(config.memory.path, data);
        assert_eq!(config.solana.data_path, data);
        assert_eq!(config.telegram.token, "123:abc");
        assert!(config.openai.api_key.is_none());
    }

    #[tokio::test]
    async fn test_prepare_accepts_existing_dir() {
        let root = tempfile::tempdir().unwrap();
        prepare(env, &Settings::default(), Some(root.path())).await.unwrap();
        prepare(env, &Settings::default(), Some(root.path())).await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_env_checked_before_data_dir() {
        let root = tempfile::tempdir().unwrap();
        let data = root.path().join("data");

        let err = prepare(|_| None, &Settings::default(), Some(data.as_path())).await.err().unwrap();

        assert!(matches!(err, StartupError::Config(ConfigError::MissingEnv(_))));
        assert_eq!(
            err.to_string(),
            "Missing required environment variables: TELEGRAM_TOKEN, CLAUDE_API_KEY"
        );
        assert!(!data.exists());
    }

    #[tokio::test]
    async fn test_data_dir_blocked_by_file() {
        let root = tempfile::tempdir().unwrap();
        let blocker = root.path().join("data");
        std::fs::write(&blocker, b"not a dir").unwrap();

        let err = prepare(env, &Settings::default(), Some(blocker.as_path())).await.err().unwrap();
        assert!(matches!(err, StartupError::DataDir(_)));
    }

    #[tokio::test]
    async fn test_settings_data_dir_used_without_override() {
        let root = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.data_dir = root.path().join("from-settings");

        let config = prepare(env, &settings, None).await.unwrap();
        assert_eq!(config.memory.path, settings.data_dir);
        assert!(settings.data_dir.is_dir());
    }
}
