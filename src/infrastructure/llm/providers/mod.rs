//! LLM Providers

pub mod claude;
pub mod openai_compat;

pub use claude::ClaudeProvider;
pub use openai_compat::{OpenAiCompatProvider, DEEPSEEK_API_BASE, OPENAI_API_BASE};
