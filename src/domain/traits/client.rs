use async_trait::async_trait;
use crate::application::errors::BotError;
use crate::plugins::Plugin;

/// Client trait - the bot runtime that owns the message loop and lifecycle
#[async_trait]
pub trait Client: Send {
    /// Attach a plugin. Plugins see messages in registration order.
    async fn register_plugin(&mut self, plugin: Box<dyn Plugin>) -> Result<(), BotError>;

    /// Connect and begin serving; returns once the message loop is running
    async fn start(&mut self) -> Result<(), BotError>;

    /// Stop serving and release plugins
    async fn stop(&mut self) -> Result<(), BotError>;
}

/// Bot identity as reported by the platform
#[derive(Debug, Clone)]
pub struct BotInfo {
    pub id: String,
    pub name: String,
    pub username: String,
}
