//! SQLite-backed conversation memory

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;

use crate::application::errors::StorageError;
use crate::domain::entities::{ChatTurn, Role};
use crate::domain::traits::MemoryStore;

/// File name of the memory database inside the data directory
pub const MEMORY_DB: &str = "memory.db";

pub struct SqliteMemory {
    conn: Mutex<Connection>,
}

impl SqliteMemory {
    /// Open (or create) `memory.db` inside `data_dir`
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let conn = Connection::open(data_dir.as_ref().join(MEMORY_DB))?;
        Self::with_connection(conn)
    }

    pub fn in_memory() -> Result<Self, StorageError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StorageError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS turns (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                chat_id TEXT NOT NULL,
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_turns_chat ON turns(chat_id, id)",
            [],
        )?;

        Ok(Self { conn: Mutex::new(conn) })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StorageError> {
        self.conn
            .lock()
            .map_err(|_| StorageError::Serialization("memory lock poisoned".to_string()))
    }
}

#[async_trait]
impl MemoryStore for SqliteMemory {
    async fn append(&self, chat_id: &str, turn: &ChatTurn) -> Result<(), StorageError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO turns (chat_id, role, content, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![chat_id, turn.role.as_str(), turn.content, turn.created_at.to_rfc3339()],
        )?;
        Ok(())
    }

    async fn recent(&self, chat_id: &str, limit: usize) -> Result<Vec<ChatTurn>, StorageError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT role, content, created_at FROM turns
             WHERE chat_id = ?1 ORDER BY id DESC LIMIT ?2",
        )?;

        let rows = stmt.query_map(params![chat_id, limit as i64], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut turns = Vec::new();
        for row in rows {
            let (role, content, created_at) = row?;
            let Some(role) = Role::parse(&role) else {
                tracing::warn!("Skipping memory row with unknown role '{}'", role);
                continue;
            };
            let created_at = DateTime::parse_from_rfc3339(&created_at)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|e| StorageError::Serialization(e.to_string()))?;
            turns.push(ChatTurn { role, content, created_at });
        }

        turns.reverse();
        Ok(turns)
    }

    async fn clear(&self, chat_id: &str) -> Result<usize, StorageError> {
        let conn = self.lock()?;
        let removed = conn.execute("DELETE FROM turns WHERE chat_id = ?1", [chat_id])?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_recent_returns_latest_in_order() {
        let memory = SqliteMemory::in_memory().unwrap();
        for i in 0..5 {
            memory.append("1", &ChatTurn::user(format!("q{}", i))).await.unwrap();
            memory.append("1", &ChatTurn::assistant(format!("a{}", i))).await.unwrap();
        }

        let turns = memory.recent("1", 3).await.unwrap();
        let contents: Vec<&str> = turns.iter().map(|t| t.content.as_str()).collect();

        assert_eq!(contents, vec!["a3", "q4", "a4"]);
        assert_eq!(turns[1].role, Role::User);
    }

    #[tokio::test]
    async fn test_chats_are_isolated() {
        let memory = SqliteMemory::in_memory().unwrap();
        memory.append("1", &ChatTurn::user("hello")).await.unwrap();
        memory.append("2", &ChatTurn::user("other")).await.unwrap();

        let removed = memory.clear("1").await.unwrap();

        assert_eq!(removed, 1);
        assert!(memory.recent("1", 10).await.unwrap().is_empty());
        assert_eq!(memory.recent("2", 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_open_persists_across_connections() {
        let tmp = tempfile::tempdir().unwrap();
        {
            let memory = SqliteMemory::open(tmp.path()).unwrap();
            memory.append("7", &ChatTurn::user("remember me")).await.unwrap();
        }

        let memory = SqliteMemory::open(tmp.path()).unwrap();
        let turns = memory.recent("7", 5).await.unwrap();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].content, "remember me");
        assert!(tmp.path().join(MEMORY_DB).exists());
    }
}
