//! Domain layer - Core types shared by every layer
//!
//! This layer contains:
//! - Entities: Messages, users, commands and conversation turns
//! - Traits: The client and memory abstractions

pub mod entities;
pub mod traits;
