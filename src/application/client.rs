//! Telegram client - long-polling runtime behind the `Client` trait

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::application::errors::BotError;
use crate::application::messaging::dispatcher::{builtin_commands, ChatSettings};
use crate::application::messaging::{MessageDispatcher, MessageParser};
use crate::domain::entities::{Reply, User};
use crate::domain::traits::{BotInfo, Client, MemoryStore};
use crate::infrastructure::adapters::telegram::{TelegramApi, Update};
use crate::infrastructure::config::BotConfig;
use crate::infrastructure::database::SqliteMemory;
use crate::infrastructure::llm::{build_provider, LLM};
use crate::plugins::{Plugin, PluginManager};

/// Long-poll timeout passed to getUpdates
const POLL_TIMEOUT_SECS: u64 = 30;

/// Pause after a failed poll
const RETRY_DELAY: Duration = Duration::from_secs(5);

enum State {
    /// Collecting plugins, not connected yet
    Idle(PluginManager),
    Running {
        shutdown: watch::Sender<bool>,
        task: JoinHandle<()>,
        plugins: Arc<PluginManager>,
    },
    Stopped,
}

/// Telegram bot client
pub struct TelegentClient {
    api: TelegramApi,
    llm: Arc<dyn LLM>,
    memory: Arc<dyn MemoryStore>,
    chat: ChatSettings,
    state: State,
}

impl TelegentClient {
    /// Build the client from assembled configuration. Nothing touches the
    /// network until `start`.
    pub fn new(config: &BotConfig) -> Result<Self, BotError> {
        let api = TelegramApi::new(config.telegram.token.clone())?;
        let llm = build_provider(&config.ai)?;
        let memory = SqliteMemory::open(&config.memory.path)?;

        info!(
            provider = llm.name(),
            "Client ready (token {}…, memory in {})",
            api.token_hint(),
            config.memory.path.display()
        );

        Ok(Self {
            api,
            llm,
            memory: Arc::new(memory),
            chat: ChatSettings::from_ai(config.bot.name.clone(), &config.ai),
            state: State::Idle(PluginManager::new()),
        })
    }

    /// Identify the bot, start plugins and publish the command menu
    async fn prepare(&self, plugins: &PluginManager) -> Result<BotInfo, BotError> {
        let bot = self.api.get_me().await?;
        info!("Connected to Telegram as @{} ({})", bot.username, bot.name);

        plugins.start_all(&bot).await?;

        let mut commands = builtin_commands();
        commands.extend(plugins.commands());
        if let Err(e) = self.api.set_my_commands(&commands).await {
            warn!("Failed to register bot commands: {}", e);
        }

        Ok(bot)
    }
}

#[async_trait]
impl Client for TelegentClient {
    async fn register_plugin(&mut self, plugin: Box<dyn Plugin>) -> Result<(), BotError> {
        match &mut self.state {
            State::Idle(plugins) => Ok(plugins.register(plugin)?),
            _ => Err(BotError::Internal(format!(
                "cannot register plugin '{}' after the client started",
                plugin.name()
            ))),
        }
    }

    async fn start(&mut self) -> Result<(), BotError> {
        let State::Idle(plugins) = &self.state else {
            return Err(BotError::Internal("client already started".to_string()));
        };
        if plugins.is_empty() {
            warn!("Starting without plugins");
        }

        // Plugins stay in `Idle` until startup succeeds, so a cancelled
        // start still reaches them through `stop`
        let prepared = self.prepare(plugins).await;

        let State::Idle(plugins) = std::mem::replace(&mut self.state, State::Stopped) else {
            return Err(BotError::Internal("client state changed during start".to_string()));
        };

        let bot = match prepared {
            Ok(bot) => bot,
            Err(e) => {
                plugins.stop_all().await;
                return Err(e);
            }
        };

        let plugins = Arc::new(plugins);
        let poller = Poller {
            api: self.api.clone(),
            parser: MessageParser::new(Some(bot.username.clone())),
            dispatcher: MessageDispatcher::new(
                plugins.clone(),
                self.llm.clone(),
                self.memory.clone(),
                self.chat.clone(),
            ),
            plugins: plugins.clone(),
        };

        let (shutdown, rx) = watch::channel(false);
        let task = tokio::spawn(poller.run(rx));

        info!("Polling for updates with {} plugins: {}", plugins.len(), plugins.names().join(", "));
        self.state = State::Running { shutdown, task, plugins };
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), BotError> {
        match std::mem::replace(&mut self.state, State::Stopped) {
            State::Running { shutdown, task, plugins } => {
                let _ = shutdown.send(true);
                if let Err(e) = task.await {
                    warn!("Polling task ended abnormally: {}", e);
                }
                plugins.stop_all().await;
                info!("Client stopped");
            }
            State::Idle(plugins) => {
                plugins.stop_all().await;
                debug!("Client stopped before it was running");
            }
            State::Stopped => debug!("Client not running, nothing to stop"),
        }
        Ok(())
    }
}

/// The polling loop and everything it needs to answer messages
struct Poller {
    api: TelegramApi,
    parser: MessageParser,
    dispatcher: MessageDispatcher,
    plugins: Arc<PluginManager>,
}

impl Poller {
    async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut offset: i64 = 0;

        info!("Starting message loop...");

        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                result = self.api.get_updates(offset, POLL_TIMEOUT_SECS) => match result {
                    Ok(updates) => {
                        if !updates.is_empty() {
                            debug!("Received {} updates", updates.len());
                        }
                        for update in &updates {
                            self.handle_update(update).await;
                        }
                        offset = TelegramApi::next_offset(offset, &updates);
                    }
                    Err(e) => {
                        error!("Failed to get updates: {}", e);
                        tokio::select! {
                            _ = shutdown.changed() => break,
                            _ = tokio::time::sleep(RETRY_DELAY) => {}
                        }
                    }
                },
            }
        }

        info!("Message loop stopped");
    }

    async fn handle_update(&self, update: &Update) {
        let Some(msg) = &update.message else { return };
        let Some(text) = msg.text.as_deref() else { return };

        let sender = msg.from.as_ref().map(User::from);
        if sender.as_ref().is_some_and(|u| u.is_bot) {
            return;
        }

        let parsed = self.parser.parse(msg.chat.id.to_string(), text, sender);
        self.plugins.observe(&parsed.message).await;

        if !parsed.addressed {
            return;
        }

        let chat_id = parsed.message.chat_id.as_str();
        if let Err(e) = self.api.send_chat_action(chat_id, "typing").await {
            debug!("Failed to send typing action: {}", e);
        }

        let Some(reply) = self.dispatcher.handle(&parsed.message).await else {
            return;
        };

        if let Err(e) = self.deliver(chat_id, reply).await {
            error!("Failed to send reply to {}: {}", chat_id, e);
        }
    }

    async fn deliver(&self, chat_id: &str, reply: Reply) -> Result<(), BotError> {
        match reply {
            Reply::Text(text) => self.api.send_message(chat_id, &text).await,
            Reply::Photo { url, caption } => {
                match self.api.send_photo(chat_id, &url, caption.as_deref()).await {
                    Ok(()) => Ok(()),
                    Err(e) => {
                        warn!("sendPhoto failed, sending link instead: {}", e);
                        let text = match caption {
                            Some(caption) => format!("{}\n{}", caption, url),
                            None => url,
                        };
                        self.api.send_message(chat_id, &text).await
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::errors::PluginError;
    use crate::infrastructure::config::{Credentials, Settings};
    use crate::infrastructure::http::test_support::json_server;
    use crate::plugins::LoggerPlugin;
    use std::sync::Mutex;

    const GET_ME: &str = r#"{"ok":true,"result":{"id":42,"is_bot":true,"first_name":"Telegent","username":"telegent_bot"}}"#;

    /// Plugin that records its hooks and can refuse to start
    struct Hooked {
        name: &'static str,
        refuse: bool,
        log: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Plugin for Hooked {
        fn name(&self) -> &str {
            self.name
        }

        fn description(&self) -> &str {
            "records hooks"
        }

        async fn on_start(&self, _bot: &BotInfo) -> Result<(), PluginError> {
            self.log.lock().unwrap().push(format!("start:{}", self.name));
            if self.refuse {
                return Err(PluginError::Upstream(format!("{} refused", self.name)));
            }
            Ok(())
        }

        async fn on_stop(&self) {
            self.log.lock().unwrap().push(format!("stop:{}", self.name));
        }
    }

    fn hooked(name: &'static str, refuse: bool, log: &Arc<Mutex<Vec<String>>>) -> Box<dyn Plugin> {
        Box::new(Hooked { name, refuse, log: log.clone() })
    }

    fn client(dir: &std::path::Path) -> TelegentClient {
        let creds = Credentials::from_lookup(|key| match key {
            "TELEGRAM_TOKEN" => Some("123456:test-token".to_string()),
            "CLAUDE_API_KEY" => Some("sk-ant-test".to_string()),
            _ => None,
        })
        .unwrap();
        let config = BotConfig::assemble(creds, &Settings::default(), dir);
        TelegentClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_duplicate_plugin_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut client = client(dir.path());

        client.register_plugin(Box::new(LoggerPlugin::new())).await.unwrap();
        let err = client.register_plugin(Box::new(LoggerPlugin::new())).await.unwrap_err();
        assert!(err.to_string().contains("already registered"));
    }

    #[tokio::test]
    async fn test_stop_without_start_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let mut client = client(dir.path());

        client.stop().await.unwrap();
        client.stop().await.unwrap();
        assert!(matches!(client.state, State::Stopped));
    }

    #[tokio::test]
    async fn test_failed_start_stops_started_plugins() {
        let dir = tempfile::tempdir().unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut client = client(dir.path());
        client.api = client.api.clone().with_base_url(json_server(GET_ME).await);

        client.register_plugin(hooked("first", false, &log)).await.unwrap();
        client.register_plugin(hooked("second", true, &log)).await.unwrap();

        let err = client.start().await.unwrap_err();
        assert!(err.to_string().contains("second refused"));
        assert_eq!(
            *log.lock().unwrap(),
            vec!["start:first", "start:second", "stop:second", "stop:first"]
        );
        assert!(matches!(client.state, State::Stopped));

        client.stop().await.unwrap();
        assert_eq!(log.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_stop_during_start_reaches_plugins() {
        let dir = tempfile::tempdir().unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut client = client(dir.path());
        client.register_plugin(hooked("only", false, &log)).await.unwrap();

        client.stop().await.unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["stop:only"]);
    }

    #[tokio::test]
    async fn test_register_after_stop_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut client = client(dir.path());
        client.stop().await.unwrap();

        let err = client.register_plugin(Box::new(LoggerPlugin::new())).await.unwrap_err();
        assert!(matches!(err, BotError::Internal(_)));
    }

    #[test]
    fn test_memory_db_created_in_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let _client = client(dir.path());
        assert!(dir.path().join(crate::infrastructure::database::MEMORY_DB).exists());
    }
}
