//! Startup Integration Tests
//! Run with: cargo test --test startup_test

use async_trait::async_trait;
use std::cell::Cell;
use std::sync::{Arc, Mutex, Once};

use telegent_bot::application::errors::{BotError, ConfigError, StartupError};
use telegent_bot::application::startup::run_with;
use telegent_bot::domain::traits::Client;
use telegent_bot::infrastructure::config::{BotConfig, Settings};
use telegent_bot::plugins::{Plugin, PluginKind};

static INIT: Once = Once::new();

fn ensure_init() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

type Log = Arc<Mutex<Vec<String>>>;

/// Client that records every lifecycle call
struct MockClient {
    log: Log,
    fail_start: bool,
}

#[async_trait]
impl Client for MockClient {
    async fn register_plugin(&mut self, plugin: Box<dyn Plugin>) -> Result<(), BotError> {
        self.log.lock().unwrap().push(format!("register:{}", plugin.name()));
        Ok(())
    }

    async fn start(&mut self) -> Result<(), BotError> {
        self.log.lock().unwrap().push("start".to_string());
        if self.fail_start {
            return Err(BotError::Network("getMe: 401 Unauthorized".to_string()));
        }
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), BotError> {
        self.log.lock().unwrap().push("stop".to_string());
        Ok(())
    }
}

fn full_env(key: &str) -> Option<String> {
    match key {
        "TELEGRAM_TOKEN" => Some("123456:ABC-DEF".to_string()),
        "CLAUDE_API_KEY" => Some("sk-ant-test".to_string()),
        "OPENAI_API_KEY" => Some("sk-openai".to_string()),
        _ => None,
    }
}

#[tokio::test]
async fn test_plugins_registered_in_fixed_order_and_stopped_once() {
    ensure_init();
    let root = tempfile::tempdir().unwrap();
    let data = root.path().join("data");
    let log: Log = Arc::default();

    let build_log = log.clone();
    run_with(
        full_env,
        &Settings::default(),
        Some(data.as_path()),
        move |_config: &BotConfig| Ok(MockClient { log: build_log, fail_start: false }),
        async { "SIGTERM" },
    )
    .await
    .unwrap();

    assert!(data.is_dir());
    assert_eq!(
        *log.lock().unwrap(),
        vec![
            "register:logger",
            "register:solana",
            "register:image-generation",
            "register:codex",
            "start",
            "stop",
        ]
    );
}

#[tokio::test]
async fn test_missing_token_never_builds_client() {
    ensure_init();
    let root = tempfile::tempdir().unwrap();
    let built = Cell::new(false);

    let err = run_with(
        |key| (key == "CLAUDE_API_KEY").then(|| "sk-ant-test".to_string()),
        &Settings::default(),
        Some(root.path()),
        |_config: &BotConfig| {
            built.set(true);
            Ok(MockClient { log: Arc::default(), fail_start: false })
        },
        async { "SIGINT" },
    )
    .await
    .unwrap_err();

    assert!(matches!(err, StartupError::Config(ConfigError::MissingEnv(ref keys)) if keys == "TELEGRAM_TOKEN"));
    assert!(!built.get());
}

#[tokio::test]
async fn test_optional_keys_reach_config() {
    ensure_init();
    let root = tempfile::tempdir().unwrap();
    let seen = Cell::new((false, false));

    run_with(
        full_env,
        &Settings::default(),
        Some(root.path()),
        |config: &BotConfig| {
            seen.set((config.openai.api_key.is_some(), config.codex.api_key.is_some()));
            Ok(MockClient { log: Arc::default(), fail_start: false })
        },
        async { "SIGINT" },
    )
    .await
    .unwrap();

    assert_eq!(seen.get(), (true, false));
}

#[tokio::test]
async fn test_start_failure_is_reported_without_stop() {
    ensure_init();
    let root = tempfile::tempdir().unwrap();
    let log: Log = Arc::default();

    let build_log = log.clone();
    let err = run_with(
        full_env,
        &Settings::default(),
        Some(root.path()),
        move |_config: &BotConfig| Ok(MockClient { log: build_log, fail_start: true }),
        async { "SIGINT" },
    )
    .await
    .unwrap_err();

    assert!(matches!(err, StartupError::Client(BotError::Network(_))));
    assert!(!log.lock().unwrap().contains(&"stop".to_string()));
}

#[tokio::test]
async fn test_client_build_failure_is_fatal() {
    ensure_init();
    let root = tempfile::tempdir().unwrap();

    let err = run_with(
        full_env,
        &Settings::default(),
        Some(root.path()),
        |_config: &BotConfig| -> Result<MockClient, BotError> {
            Err(BotError::Internal("no client".to_string()))
        },
        async { "SIGINT" },
    )
    .await
    .unwrap_err();

    assert!(err.to_string().contains("no client"));
}

#[tokio::test]
async fn test_enabled_subset_keeps_canonical_order() {
    ensure_init();
    let root = tempfile::tempdir().unwrap();
    let log: Log = Arc::default();

    let settings = Settings::from_yaml(
        "plugins:\n  enabled: [codex, logger]\n",
    )
    .unwrap();
    assert_eq!(settings.plugins.enabled, vec![PluginKind::Codex, PluginKind::Logger]);

    let build_log = log.clone();
    run_with(
        full_env,
        &settings,
        Some(root.path()),
        move |_config: &BotConfig| Ok(MockClient { log: build_log, fail_start: false }),
        async { "SIGINT" },
    )
    .await
    .unwrap();

    assert_eq!(
        *log.lock().unwrap(),
        vec!["register:logger", "register:codex", "start", "stop"]
    );
}

/// Client whose start never completes
struct StalledClient {
    log: Log,
}

#[async_trait]
impl Client for StalledClient {
    async fn register_plugin(&mut self, _plugin: Box<dyn Plugin>) -> Result<(), BotError> {
        Ok(())
    }

    async fn start(&mut self) -> Result<(), BotError> {
        self.log.lock().unwrap().push("start".to_string());
        std::future::pending::<()>().await;
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), BotError> {
        self.log.lock().unwrap().push("stop".to_string());
        Ok(())
    }
}

#[tokio::test]
async fn test_signal_while_start_stalls_stops_once() {
    ensure_init();
    let root = tempfile::tempdir().unwrap();
    let log: Log = Arc::default();

    let build_log = log.clone();
    let result = tokio::time::timeout(
        std::time::Duration::from_secs(2),
        run_with(
            full_env,
            &Settings::default(),
            Some(root.path()),
            move |_config: &BotConfig| Ok(StalledClient { log: build_log }),
            async { "SIGTERM" },
        ),
    )
    .await
    .expect("signal swallowed while start was pending");

    assert!(result.is_ok());
    assert_eq!(*log.lock().unwrap(), vec!["start", "stop"]);
}
