//! Domain traits - Abstractions for infrastructure implementations

pub mod client;
pub mod store;

pub use client::{BotInfo, Client};
pub use store::MemoryStore;
