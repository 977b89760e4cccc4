//! LLM provider selection

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::application::errors::{BotError, ConfigError};
use crate::infrastructure::config::{AiConfig, DEEPSEEK_API_KEY};
use super::providers::{ClaudeProvider, OpenAiCompatProvider, DEEPSEEK_API_BASE};
use super::LLM;

/// LLM Provider type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AiProvider {
    #[default]
    Claude,
    DeepSeek,
}

/// Build the chat provider selected by the config's provider tag
pub fn build_provider(config: &AiConfig) -> Result<Arc<dyn LLM>, BotError> {
    match config.provider {
        AiProvider::Claude => Ok(Arc::new(ClaudeProvider::new(
            config.claude_api_key.clone(),
            Some(&config.claude_model),
        )?)),
        AiProvider::DeepSeek => {
            let key = config.deepseek_api_key.clone().ok_or_else(|| {
                ConfigError::MissingEnv(format!("{} (ai.provider is deepseek)", DEEPSEEK_API_KEY))
            })?;
            Ok(Arc::new(OpenAiCompatProvider::new(
                "deepseek",
                DEEPSEEK_API_BASE,
                key,
                &config.deepseek_model,
            )?))
        }
    }
}
