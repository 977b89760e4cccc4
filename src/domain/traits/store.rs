use async_trait::async_trait;
use crate::application::errors::StorageError;
use crate::domain::entities::ChatTurn;

/// Conversation memory - per-chat message history
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Append a turn to a chat's history
    async fn append(&self, chat_id: &str, turn: &ChatTurn) -> Result<(), StorageError>;

    /// Most recent `limit` turns for a chat, oldest first
    async fn recent(&self, chat_id: &str, limit: usize) -> Result<Vec<ChatTurn>, StorageError>;

    /// Forget a chat's history, returning the number of removed turns
    async fn clear(&self, chat_id: &str) -> Result<usize, StorageError>;
}
