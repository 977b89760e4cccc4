//! Codex plugin - coding assistant over an OpenAI-compatible model

use async_trait::async_trait;
use std::sync::Arc;

use crate::application::errors::PluginError;
use crate::domain::entities::{CommandSpec, Message, Reply};
use crate::infrastructure::config::{CodexConfig, CODEX_API_KEY};
use crate::infrastructure::llm::providers::OPENAI_API_BASE;
use crate::infrastructure::llm::{LLMMessage, OpenAiCompatProvider, Sampling, LLM};
use crate::plugins::trait_def::{joined_args, Plugin};

const SYSTEM_PROMPT: &str = "You are an expert programmer. Answer with working code in fenced \
code blocks, followed by at most two sentences of explanation.";

const SAMPLING: Sampling = Sampling {
    temperature: Some(0.2),
    max_tokens: 2048,
};

pub struct CodexPlugin {
    llm: Option<Arc<dyn LLM>>,
}

impl CodexPlugin {
    pub fn new(config: &CodexConfig) -> Result<Self, PluginError> {
        let llm = match &config.api_key {
            Some(key) => {
                let provider = OpenAiCompatProvider::new("codex", OPENAI_API_BASE, key.clone(), &config.model)
                    .map_err(|e| PluginError::Upstream(e.to_string()))?;
                Some(Arc::new(provider) as Arc<dyn LLM>)
            }
            None => {
                tracing::warn!("{} not set, /code will be unavailable", CODEX_API_KEY);
                None
            }
        };
        Ok(Self { llm })
    }

    /// Use an explicit model backend
    pub fn with_llm(llm: Arc<dyn LLM>) -> Self {
        Self { llm: Some(llm) }
    }
}

#[async_trait]
impl Plugin for CodexPlugin {
    fn name(&self) -> &str {
        "codex"
    }

    fn description(&self) -> &str {
        "Writes code for a described task"
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![CommandSpec::new("code", "Write code for a task").with_usage("<task>")]
    }

    async fn handle_command(
        &self,
        _command: &str,
        args: &[String],
        _message: &Message,
    ) -> Result<Reply, PluginError> {
        let llm = self.llm.as_ref().ok_or_else(|| {
            PluginError::NotConfigured("Code assistant".to_string(), CODEX_API_KEY.to_string())
        })?;

        let task = joined_args(args);
        if task.is_empty() {
            return Err(PluginError::InvalidArgs(
                "Usage: /code <task>\nExample: /code write a hello world in python".to_string(),
            ));
        }

        let response = llm
            .chat(vec![LLMMessage::system(SYSTEM_PROMPT), LLMMessage::user(task)], SAMPLING)
            .await
            .map_err(|e| PluginError::Upstream(e.to_string()))?;

        tracing::debug!(model = %response.model, "Codex answered");
        Ok(Reply::Text(response.content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::llm::{LLMResponse, LLMResult};
    use std::sync::Mutex;

    struct CannedLLM {
        seen: Mutex<Vec<LLMMessage>>,
    }

    #[async_trait]
    impl LLM for CannedLLM {
        fn name(&self) -> &str {
            "canned"
        }

        async fn chat(&self, messages: Vec<LLMMessage>, _sampling: Sampling) -> LLMResult<LLMResponse> {
            *self.seen.lock().unwrap() = messages;
            Ok(LLMResponse {
                content: "```py\nprint('hi')\n```".to_string(),
                model: "canned".to_string(),
                usage: None,
                finish_reason: None,
            })
        }
    }

    #[tokio::test]
    async fn test_code_sends_task_with_system_prompt() {
        let llm = Arc::new(CannedLLM { seen: Mutex::new(Vec::new()) });
        let codex = CodexPlugin::with_llm(llm.clone());
        let args = vec!["hello".to_string(), "world".to_string()];
        let message = Message::from_command("1", "code", args.clone());

        let reply = codex.handle_command("code", &args, &message).await.unwrap();

        assert_eq!(reply, Reply::text("```py\nprint('hi')\n```"));
        let seen = llm.seen.lock().unwrap();
        assert!(seen[0].is_system());
        assert_eq!(seen[1].content, "hello world");
    }

    #[tokio::test]
    async fn test_missing_key_reports_not_configured() {
        let codex = CodexPlugin::new(&CodexConfig { api_key: None, model: "gpt-4o-mini".into() }).unwrap();
        let message = Message::from_command("1", "code", vec!["x".into()]);

        let err = codex.handle_command("code", &["x".to_string()], &message).await.unwrap_err();
        assert!(err.to_string().contains(CODEX_API_KEY));
    }
}
