//! Telegram Bot API adapter

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::application::errors::BotError;
use crate::domain::entities::{CommandSpec, User as ChatUser};
use crate::domain::traits::BotInfo;
use crate::infrastructure::http;

/// Telegram API base URL
const API_BASE: &str = "https://api.telegram.org";

/// Longest text Telegram accepts in one message
pub const MAX_MESSAGE_CHARS: usize = 4096;

/// Timeout for every method except long polling
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Extra time a long poll may take beyond its server-side timeout
const POLL_MARGIN: Duration = Duration::from_secs(10);

/// Telegram update type
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    pub username: Option<String>,
    pub first_name: Option<String>,
}

impl From<&User> for ChatUser {
    fn from(user: &User) -> Self {
        let mut chat_user = ChatUser::new(user.id.to_string())
            .with_username(user.username.clone())
            .with_first_name(user.first_name.clone());
        chat_user.is_bot = user.is_bot;
        chat_user
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Chat {
    pub id: i64,
}

/// Envelope every Bot API method returns
#[derive(Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

/// Thin client over the Telegram Bot HTTP API
#[derive(Clone)]
pub struct TelegramApi {
    base: String,
    token: String,
    client: Client,
}

impl TelegramApi {
    pub fn new(token: impl Into<String>) -> Result<Self, BotError> {
        let client = http::client(REQUEST_TIMEOUT)
            .map_err(|e| BotError::Network(format!("HTTP client: {}", e)))?;

        Ok(Self {
            base: API_BASE.to_string(),
            token: token.into(),
            client,
        })
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(mut self, base: impl Into<String>) -> Self {
        self.base = base.into();
        self
    }

    /// Get the API URL for a method
    fn api_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base, self.token, method)
    }

    /// Token prefix safe to print in logs
    pub fn token_hint(&self) -> &str {
        let end = self.token.find(':').unwrap_or(self.token.len()).min(10);
        self.token.get(..end).unwrap_or_default()
    }

    async fn call<B: Serialize + ?Sized, T: DeserializeOwned>(&self, method: &str, body: &B) -> Result<T, BotError> {
        self.call_with_timeout(method, body, REQUEST_TIMEOUT).await
    }

    async fn call_with_timeout<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: &str,
        body: &B,
        timeout: Duration,
    ) -> Result<T, BotError> {
        let response = self.client
            .post(self.api_url(method))
            .timeout(timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| BotError::Network(format!("{}: {}", method, e.without_url())))?;

        let status = response.status();
        let data: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| BotError::Parse(format!("{}: {}", method, e.without_url())))?;

        if !data.ok {
            return Err(BotError::Network(format!(
                "Telegram API error on {} ({}): {}",
                method,
                status,
                data.description.unwrap_or_default()
            )));
        }

        data.result
            .ok_or_else(|| BotError::Parse(format!("{}: response missing result", method)))
    }

    /// Fetch bot identity; fails when the token is invalid
    pub async fn get_me(&self) -> Result<BotInfo, BotError> {
        #[derive(Deserialize)]
        struct Me {
            id: i64,
            first_name: String,
            username: Option<String>,
        }

        let me: Me = self.call("getMe", &serde_json::json!({})).await?;

        Ok(BotInfo {
            id: me.id.to_string(),
            name: me.first_name,
            username: me.username.unwrap_or_default(),
        })
    }

    /// Long-poll for updates
    pub async fn get_updates(&self, offset: i64, timeout: u64) -> Result<Vec<Update>, BotError> {
        #[derive(Serialize)]
        struct GetUpdatesRequest {
            offset: i64,
            timeout: u64,
            allowed_updates: [&'static str; 1],
        }

        let request = GetUpdatesRequest {
            offset,
            timeout,
            allowed_updates: ["message"],
        };

        let timeout = Duration::from_secs(timeout) + POLL_MARGIN;
        self.call_with_timeout("getUpdates", &request, timeout).await
    }

    /// Offset acknowledging every update in `updates`
    pub fn next_offset(current: i64, updates: &[Update]) -> i64 {
        updates.iter()
            .map(|u| u.update_id + 1)
            .max()
            .unwrap_or(current)
            .max(current)
    }

    /// Send text, splitting it into chunks Telegram accepts. Markdown is
    /// tried first and plain text used when Telegram rejects the markup.
    pub async fn send_message(&self, chat_id: &str, text: &str) -> Result<(), BotError> {
        for chunk in split_message(text, MAX_MESSAGE_CHARS) {
            if let Err(e) = self.send_message_with_format(chat_id, &chunk, Some("Markdown")).await {
                tracing::debug!("Markdown rejected, sending plain text: {}", e);
                self.send_message_with_format(chat_id, &chunk, None).await?;
            }
        }
        Ok(())
    }

    async fn send_message_with_format(&self, chat_id: &str, text: &str, parse_mode: Option<&str>) -> Result<(), BotError> {
        #[derive(Serialize)]
        struct SendMessageRequest<'a> {
            chat_id: &'a str,
            text: &'a str,
            #[serde(skip_serializing_if = "Option::is_none")]
            parse_mode: Option<&'a str>,
        }

        let _: serde_json::Value = self
            .call("sendMessage", &SendMessageRequest { chat_id, text, parse_mode })
            .await?;
        Ok(())
    }

    pub async fn send_photo(&self, chat_id: &str, url: &str, caption: Option<&str>) -> Result<(), BotError> {
        #[derive(Serialize)]
        struct SendPhotoRequest<'a> {
            chat_id: &'a str,
            photo: &'a str,
            #[serde(skip_serializing_if = "Option::is_none")]
            caption: Option<&'a str>,
        }

        let _: serde_json::Value = self
            .call("sendPhoto", &SendPhotoRequest { chat_id, photo: url, caption })
            .await?;
        Ok(())
    }

    /// Send chat action (typing, upload_photo, etc.)
    pub async fn send_chat_action(&self, chat_id: &str, action: &str) -> Result<(), BotError> {
        let _: bool = self
            .call("sendChatAction", &serde_json::json!({ "chat_id": chat_id, "action": action }))
            .await?;
        Ok(())
    }

    /// Publish the command menu
    pub async fn set_my_commands(&self, commands: &[CommandSpec]) -> Result<(), BotError> {
        #[derive(Serialize)]
        struct BotCommand<'a> {
            command: &'a str,
            description: &'a str,
        }

        let commands: Vec<BotCommand<'_>> = commands
            .iter()
            .map(|c| BotCommand { command: &c.name, description: &c.description })
            .collect();

        let _: bool = self
            .call("setMyCommands", &serde_json::json!({ "commands": commands }))
            .await?;

        tracing::info!("Registered {} bot commands with Telegram", commands.len());
        Ok(())
    }
}

/// Split text into chunks of at most `max_chars` characters, preferring
/// newline boundaries
pub fn split_message(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.split_inclusive('\n') {
        let line_len = line.chars().count();

        if current_len + line_len > max_chars && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if line_len > max_chars {
            let chars: Vec<char> = line.chars().collect();
            for piece in chars.chunks(max_chars) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }

        current.push_str(line);
        current_len += line_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    if chunks.is_empty() {
        chunks.push(String::new());
    }
    chunks
}
