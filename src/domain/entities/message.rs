use super::User;
use chrono::{DateTime, Utc};

/// Message content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Text(String),
    Command { name: String, args: Vec<String> },
    Empty,
}

impl Content {
    pub fn text(&self) -> Option<&str> {
        match self {
            Content::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_command(&self) -> bool {
        matches!(self, Content::Command { .. })
    }

    /// Short single-line preview for logs
    pub fn preview(&self, max_chars: usize) -> String {
        let full = match self {
            Content::Text(s) => s.clone(),
            Content::Command { name, args } if args.is_empty() => format!("/{}", name),
            Content::Command { name, args } => format!("/{} {}", name, args.join(" ")),
            Content::Empty => return "[empty]".to_string(),
        };
        let mut preview: String = full.chars().take(max_chars).collect();
        if full.chars().count() > max_chars {
            preview.push('…');
        }
        preview.replace('\n', " ")
    }
}

/// An incoming chat message
#[derive(Debug, Clone)]
pub struct Message {
    pub id: String,
    pub chat_id: String,
    pub sender: Option<User>,
    pub content: Content,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(chat_id: impl Into<String>, content: Content) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            chat_id: chat_id.into(),
            sender: None,
            content,
            timestamp: Utc::now(),
        }
    }

    pub fn from_text(chat_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(chat_id, Content::Text(text.into()))
    }

    pub fn from_command(chat_id: impl Into<String>, name: impl Into<String>, args: Vec<String>) -> Self {
        Self::new(chat_id, Content::Command { name: name.into(), args })
    }

    pub fn with_sender(mut self, user: Option<User>) -> Self {
        self.sender = user;
        self
    }

    /// Group chats have negative ids on Telegram
    pub fn is_group(&self) -> bool {
        self.chat_id.starts_with('-')
    }
}

/// What a handler sends back to the chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    Photo { url: String, caption: Option<String> },
}

impl Reply {
    pub fn text(s: impl Into<String>) -> Self {
        Reply::Text(s.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_truncates_and_flattens() {
        let content = Content::Text("line one\nline two is long".to_string());
        assert_eq!(content.preview(12), "line one lin…");
        assert_eq!(content.preview(100), "line one line two is long");
    }

    #[test]
    fn test_command_preview() {
        let content = Content::Command { name: "balance".into(), args: vec!["abc".into()] };
        assert_eq!(content.preview(50), "/balance abc");
    }

    #[test]
    fn test_group_detection() {
        assert!(Message::from_text("-100123", "hi").is_group());
        assert!(!Message::from_text("42", "hi").is_group());
    }
}
