//! Logger plugin - traces every incoming message

use async_trait::async_trait;

use crate::application::errors::PluginError;
use crate::domain::entities::Message;
use crate::domain::traits::BotInfo;
use crate::plugins::trait_def::Plugin;

const PREVIEW_CHARS: usize = 80;

#[derive(Debug, Default)]
pub struct LoggerPlugin;

impl LoggerPlugin {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Plugin for LoggerPlugin {
    fn name(&self) -> &str {
        "logger"
    }

    fn description(&self) -> &str {
        "Logs incoming messages"
    }

    async fn on_start(&self, bot: &BotInfo) -> Result<(), PluginError> {
        tracing::info!(bot = %bot.username, "Logger plugin active");
        Ok(())
    }

    async fn on_message(&self, message: &Message) {
        let sender = message
            .sender
            .as_ref()
            .map(|u| u.display_name())
            .unwrap_or_else(|| "unknown".to_string());

        tracing::info!(
            chat_id = %message.chat_id,
            sender = %sender,
            command = message.content.is_command(),
            "{}",
            message.content.preview(PREVIEW_CHARS)
        );
    }

    async fn on_stop(&self) {
        tracing::info!("Logger plugin stopped");
    }
}
