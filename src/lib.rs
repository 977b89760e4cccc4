//! telegent-bot - a Telegram assistant with AI chat and plugins
//!
//! Layers:
//! - `domain`: messages, users, commands and the client/memory traits
//! - `application`: errors, message handling, the Telegram client and startup
//! - `infrastructure`: configuration, storage, SQLite memory, Telegram and AI APIs
//! - `plugins`: the plugin trait, manager and built-in plugins

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod plugins;
