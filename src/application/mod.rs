//! Application layer - Use cases and business logic
//!
//! This layer contains:
//! - Errors: Error types for every layer
//! - Messaging: Message parsing and dispatching
//! - Client: The Telegram runtime
//! - Lifecycle / Startup: Boot sequence and signal-driven shutdown

pub mod errors;
pub mod messaging;
pub mod client;
pub mod lifecycle;
pub mod startup;

pub use client::TelegentClient;
pub use startup::{run, RunOptions};
