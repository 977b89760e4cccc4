//! Infrastructure layer - External concerns
//!
//! This layer contains:
//! - Config: Environment credentials and YAML settings
//! - Storage: Data directory and JSON files
//! - Database: SQLite conversation memory
//! - Adapters: Telegram Bot API
//! - HTTP: Shared client construction
//! - LLM: AI providers

pub mod config;
pub mod storage;
pub mod database;
pub mod adapters;
pub mod llm;
pub mod http;
