//! Plugin manager - keeps plugins in registration order

use std::sync::Arc;
use tracing::{info, warn};

use crate::application::errors::PluginError;
use crate::domain::entities::{CommandSpec, Message};
use crate::domain::traits::BotInfo;
use crate::plugins::trait_def::Plugin;

/// Ordered set of registered plugins
#[derive(Default)]
pub struct PluginManager {
    plugins: Vec<Arc<dyn Plugin>>,
}

impl PluginManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin after the ones already present
    pub fn register(&mut self, plugin: Box<dyn Plugin>) -> Result<(), PluginError> {
        let name = plugin.name().to_string();

        if self.has_plugin(&name) {
            return Err(PluginError::Duplicate(name));
        }

        for command in plugin.commands() {
            if let Some(owner) = self.command_owner(&command.name) {
                warn!(
                    "Command /{} of plugin '{}' is shadowed by plugin '{}'",
                    command.name, name, owner.name()
                );
            }
        }

        info!("Registering plugin: {}", name);
        self.plugins.push(Arc::from(plugin));
        Ok(())
    }

    /// Check if a plugin exists
    pub fn has_plugin(&self, name: &str) -> bool {
        self.plugins.iter().any(|p| p.name() == name)
    }

    /// Plugin names in registration order
    pub fn names(&self) -> Vec<String> {
        self.plugins.iter().map(|p| p.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Every plugin command, in registration order
    pub fn commands(&self) -> Vec<CommandSpec> {
        self.plugins.iter().flat_map(|p| p.commands()).collect()
    }

    /// First registered plugin that declares `command`
    pub fn command_owner(&self, command: &str) -> Option<Arc<dyn Plugin>> {
        self.plugins
            .iter()
            .find(|p| p.commands().iter().any(|c| c.matches(command)))
            .cloned()
    }

    pub async fn start_all(&self, bot: &BotInfo) -> Result<(), PluginError> {
        for plugin in &self.plugins {
            plugin.on_start(bot).await?;
        }
        Ok(())
    }

    /// Let every plugin observe a message, in registration order
    pub async fn observe(&self, message: &Message) {
        for plugin in &self.plugins {
            plugin.on_message(message).await;
        }
    }

    /// Stop plugins, last registered first
    pub async fn stop_all(&self) {
        for plugin in self.plugins.iter().rev() {
            plugin.on_stop().await;
            info!("Stopped plugin: {}", plugin.name());
        }
    }
}
