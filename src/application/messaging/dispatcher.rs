//! Message dispatcher - Routes messages to built-ins, plugins or the AI

use std::sync::Arc;

use crate::application::errors::{BotError, PluginError};
use crate::domain::entities::{ChatTurn, CommandSpec, Content, Message, Reply};
use crate::domain::traits::MemoryStore;
use crate::infrastructure::config::AiConfig;
use crate::infrastructure::llm::{LLMMessage, Sampling, LLM};
use crate::plugins::{Plugin, PluginManager};

/// Where a message goes
pub enum Route {
    Help,
    Clear,
    Plugin(Arc<dyn Plugin>),
    Unknown(String),
    Chat,
    Ignore,
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Route::Help => write!(f, "Help"),
            Route::Clear => write!(f, "Clear"),
            Route::Plugin(p) => write!(f, "Plugin({})", p.name()),
            Route::Unknown(name) => write!(f, "Unknown({})", name),
            Route::Chat => write!(f, "Chat"),
            Route::Ignore => write!(f, "Ignore"),
        }
    }
}

/// Commands answered by the dispatcher itself; they take precedence over
/// plugin commands of the same name
pub fn builtin_commands() -> Vec<CommandSpec> {
    vec![
        CommandSpec::new("start", "Start the bot"),
        CommandSpec::new("help", "Show available commands"),
        CommandSpec::new("clear", "Forget this conversation"),
    ]
}

/// Chat settings for free-text messages
#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub bot_name: String,
    pub system_prompt: String,
    pub history_limit: usize,
    pub sampling: Sampling,
}

impl ChatSettings {
    pub fn from_ai(bot_name: impl Into<String>, ai: &AiConfig) -> Self {
        Self {
            bot_name: bot_name.into(),
            system_prompt: ai.system_prompt.clone(),
            history_limit: ai.history_limit,
            sampling: Sampling {
                temperature: Some(ai.temperature),
                max_tokens: ai.max_tokens,
            },
        }
    }
}

/// Message dispatcher - answers built-ins, forwards plugin commands and
/// sends free text to the AI provider with conversation memory
pub struct MessageDispatcher {
    plugins: Arc<PluginManager>,
    llm: Arc<dyn LLM>,
    memory: Arc<dyn MemoryStore>,
    settings: ChatSettings,
}

impl MessageDispatcher {
    pub fn new(
        plugins: Arc<PluginManager>,
        llm: Arc<dyn LLM>,
        memory: Arc<dyn MemoryStore>,
        settings: ChatSettings,
    ) -> Self {
        Self { plugins, llm, memory, settings }
    }

    pub fn route(&self, message: &Message) -> Route {
        match &message.content {
            Content::Command { name, .. } => match name.as_str() {
                "start" | "help" => Route::Help,
                "clear" => Route::Clear,
                other => match self.plugins.command_owner(other) {
                    Some(plugin) => Route::Plugin(plugin),
                    None => Route::Unknown(other.to_string()),
                },
            },
            Content::Text(_) => Route::Chat,
            Content::Empty => Route::Ignore,
        }
    }

    /// Produce the reply for a message, if any. Failures become replies.
    pub async fn handle(&self, message: &Message) -> Option<Reply> {
        let reply = match self.route(message) {
            Route::Help => Ok(Reply::Text(self.help_text())),
            Route::Clear => self.clear(&message.chat_id).await,
            Route::Plugin(plugin) => self.run_plugin(plugin, message).await,
            Route::Unknown(name) => Ok(Reply::Text(format!(
                "Unknown command: /{}\nSend /help to see what I can do.",
                name
            ))),
            Route::Chat => self.chat(message).await,
            Route::Ignore => return None,
        };

        Some(reply.unwrap_or_else(|e| {
            tracing::error!(chat_id = %message.chat_id, "Failed to handle message: {}", e);
            Reply::Text(format!("⚠️ {}", user_facing(&e)))
        }))
    }

    pub fn help_text(&self) -> String {
        let mut lines = vec![format!("Hi, I'm {}. Send me a message to chat.", self.settings.bot_name), String::new()];
        lines.extend(builtin_commands().iter().map(CommandSpec::help_line));
        lines.extend(self.plugins.commands().iter().map(CommandSpec::help_line));
        lines.join("\n")
    }

    async fn clear(&self, chat_id: &str) -> Result<Reply, BotError> {
        let removed = self.memory.clear(chat_id).await?;
        tracing::info!(chat_id = %chat_id, removed, "Cleared conversation memory");
        Ok(Reply::text("Conversation cleared."))
    }

    async fn run_plugin(&self, plugin: Arc<dyn Plugin>, message: &Message) -> Result<Reply, BotError> {
        let Content::Command { name, args } = &message.content else {
            return Err(BotError::Internal("plugin route without command".to_string()));
        };
        tracing::debug!(plugin = plugin.name(), "Dispatching /{}", name);
        Ok(plugin.handle_command(name, args, message).await?)
    }

    async fn chat(&self, message: &Message) -> Result<Reply, BotError> {
        let Some(text) = message.content.text() else {
            return Err(BotError::Internal("chat route without text".to_string()));
        };

        let history = self.memory.recent(&message.chat_id, self.settings.history_limit).await?;

        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(LLMMessage::system(&self.settings.system_prompt));
        messages.extend(history.iter().map(LLMMessage::from));
        messages.push(LLMMessage::user(text));

        let response = self.llm.chat(messages, self.settings.sampling).await?;

        if let Some(usage) = &response.usage {
            tracing::debug!(
                provider = self.llm.name(),
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "AI response"
            );
        }

        self.memory.append(&message.chat_id, &ChatTurn::user(text)).await?;
        self.memory.append(&message.chat_id, &ChatTurn::assistant(&response.content)).await?;

        Ok(Reply::Text(response.content))
    }
}

/// Plugin argument and configuration errors are shown verbatim; everything
/// else gets a generic message
fn user_facing(error: &BotError) -> String {
    match error {
        BotError::Plugin(e @ (PluginError::InvalidArgs(_) | PluginError::NotConfigured(..))) => e.to_string(),
        BotError::Ai(_) => "The AI provider is unavailable right now. Please try again later.".to_string(),
        _ => "Something went wrong. Please try again later.".to_string(),
    }
}
