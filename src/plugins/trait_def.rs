//! Plugin trait definitions

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::application::errors::PluginError;
use crate::domain::entities::{CommandSpec, Message, Reply};
use crate::domain::traits::BotInfo;

/// Core plugin trait that all plugins must implement
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Unique identifier for the plugin
    fn name(&self) -> &str;

    /// Human-readable description
    fn description(&self) -> &str;

    /// Commands this plugin answers to
    fn commands(&self) -> Vec<CommandSpec> {
        Vec::new()
    }

    /// Called once when the client starts, after the bot identity is known
    async fn on_start(&self, _bot: &BotInfo) -> Result<(), PluginError> {
        Ok(())
    }

    /// Observe every incoming message before it is dispatched
    async fn on_message(&self, _message: &Message) {}

    /// Answer one of the commands returned by [`Plugin::commands`]
    async fn handle_command(
        &self,
        command: &str,
        _args: &[String],
        _message: &Message,
    ) -> Result<Reply, PluginError> {
        Err(PluginError::InvalidArgs(format!("'{}' does not handle /{}", self.name(), command)))
    }

    /// Called once when the client stops
    async fn on_stop(&self) {}
}

/// Built-in plugin kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PluginKind {
    Logger,
    Solana,
    ImageGeneration,
    Codex,
}

impl PluginKind {
    /// Registration order
    pub const ALL: [PluginKind; 4] = [
        PluginKind::Logger,
        PluginKind::Solana,
        PluginKind::ImageGeneration,
        PluginKind::Codex,
    ];
}

/// Join command arguments back into free text
pub fn joined_args(args: &[String]) -> String {
    args.join(" ").trim().to_string()
}
