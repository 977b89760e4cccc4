//! Message parser - Parses raw text into structured messages

use crate::domain::entities::{Content, Message, User};

/// A parsed message and whether the bot should answer it
#[derive(Debug, Clone)]
pub struct Parsed {
    pub message: Message,
    pub addressed: bool,
}

/// Parses incoming text into structured Message objects
pub struct MessageParser {
    bot_username: Option<String>,
}

impl MessageParser {
    pub fn new(bot_username: Option<String>) -> Self {
        Self {
            bot_username: bot_username.filter(|u| !u.is_empty()),
        }
    }

    /// Parse a text message.
    ///
    /// Commands addressed to another bot (`/help@other_bot`) are not ours.
    /// In group chats plain text is only answered when the bot is mentioned,
    /// and the mention is stripped from the text.
    pub fn parse(&self, chat_id: impl Into<String>, text: &str, sender: Option<User>) -> Parsed {
        let chat_id = chat_id.into();
        let text = text.trim();

        if text.is_empty() {
            return Parsed {
                message: Message::new(chat_id, Content::Empty).with_sender(sender),
                addressed: false,
            };
        }

        if let Some(rest) = text.strip_prefix('/') {
            return self.parse_command(chat_id, rest, sender);
        }

        let message = Message::from_text(chat_id, text).with_sender(sender);
        if !message.is_group() {
            return Parsed { message, addressed: true };
        }

        match self.strip_mention(text) {
            Some(stripped) if !stripped.is_empty() => Parsed {
                message: Message {
                    content: Content::Text(stripped),
                    ..message
                },
                addressed: true,
            },
            _ => Parsed { message, addressed: false },
        }
    }

    /// Parse a command message
    fn parse_command(&self, chat_id: String, cmd_text: &str, sender: Option<User>) -> Parsed {
        let mut parts = cmd_text.split_whitespace();
        let head = parts.next().unwrap_or_default();
        let args: Vec<String> = parts.map(str::to_string).collect();

        let (name, target) = match head.split_once('@') {
            Some((name, target)) => (name, Some(target)),
            None => (head, None),
        };

        let addressed = !name.is_empty()
            && match (target, &self.bot_username) {
                (Some(target), Some(own)) => target.eq_ignore_ascii_case(own),
                _ => true,
            };

        Parsed {
            message: Message::from_command(chat_id, name.to_lowercase(), args).with_sender(sender),
            addressed,
        }
    }

    /// Remove `@bot_username` from text when present
    fn strip_mention(&self, text: &str) -> Option<String> {
        let username = self.bot_username.as_ref()?;
        let mention = format!("@{}", username.to_ascii_lowercase());
        // ASCII lowercasing keeps byte offsets aligned with `text`
        let start = text.to_ascii_lowercase().find(&mention)?;
        let end = start + mention.len();
        let stripped = format!("{}{}", &text[..start], &text[end..]);
        Some(stripped.split_whitespace().collect::<Vec<_>>().join(" "))
    }
}
