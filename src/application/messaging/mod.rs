//! Message handling - parsing and dispatching incoming messages

pub mod dispatcher;
pub mod parser;

pub use dispatcher::{ChatSettings, MessageDispatcher, Route};
pub use parser::{MessageParser, Parsed};
