//! LLM integration - Multi-provider AI support

pub mod traits;
pub mod config;
pub mod providers;


pub use traits::{LLM, LLMMessage, LLMResponse, LLMError, LLMResult, LLMUsage, Sampling};
pub use config::{AiProvider, build_provider};
pub use providers::{ClaudeProvider, OpenAiCompatProvider};
