//! Domain entities - Core business objects with no external dependencies

pub mod user;
pub mod message;
pub mod command;
pub mod conversation;

pub use user::User;
pub use message::{Message, Content, Reply};
pub use command::CommandSpec;
pub use conversation::{ChatTurn, Role};
