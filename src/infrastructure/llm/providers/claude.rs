//! Anthropic Claude Provider

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::infrastructure::http;
use crate::infrastructure::llm::{LLMMessage, LLMResponse, LLMError, LLMResult, LLM, LLMUsage, Sampling};

/// Claude API endpoint
const API_BASE: &str = "https://api.anthropic.com/v1";

const API_VERSION: &str = "2023-06-01";

const DEFAULT_MODEL: &str = "claude-3-5-sonnet-latest";

/// Claude provider
pub struct ClaudeProvider {
    api_key: String,
    client: Client,
    model: String,
}

impl ClaudeProvider {
    pub fn new(api_key: impl Into<String>, model: Option<&str>) -> LLMResult<Self> {
        let client = http::client(http::REQUEST_TIMEOUT)
            .map_err(|e| LLMError::NetworkError(e.to_string()))?;

        Ok(Self {
            api_key: api_key.into(),
            client,
            model: model.unwrap_or(DEFAULT_MODEL).to_string(),
        })
    }

    /// Get base URL for API
    fn base_url(&self) -> String {
        format!("{}/messages", API_BASE)
    }
}

/// API request structure
#[derive(Serialize, Debug)]
struct ChatRequest {
    model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<ClaudeMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    max_tokens: u32,
}

/// Claude message format
#[derive(Serialize, Debug, PartialEq)]
struct ClaudeMessage {
    role: String,
    content: String,
}

/// The Messages API takes the system prompt as a top-level field, not as a
/// message. System messages are lifted out and joined.
fn build_request(model: &str, messages: Vec<LLMMessage>, sampling: Sampling) -> ChatRequest {
    let (system, rest): (Vec<LLMMessage>, Vec<LLMMessage>) =
        messages.into_iter().partition(LLMMessage::is_system);

    let system = if system.is_empty() {
        None
    } else {
        Some(system.into_iter().map(|m| m.content).collect::<Vec<_>>().join("\n\n"))
    };

    ChatRequest {
        model: model.to_string(),
        system,
        messages: rest
            .into_iter()
            .map(|m| ClaudeMessage { role: m.role, content: m.content })
            .collect(),
        temperature: sampling.temperature,
        max_tokens: sampling.max_tokens,
    }
}

/// API response structure
#[derive(Deserialize, Debug)]
struct ChatResponse {
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
    usage: Option<Usage>,
}

/// Content block
#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { text: String },
    #[serde(other)]
    Other,
}

/// Usage information
#[derive(Deserialize, Debug)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

#[async_trait]
impl LLM for ClaudeProvider {
    fn name(&self) -> &str {
        "claude"
    }

    async fn chat(&self, messages: Vec<LLMMessage>, sampling: Sampling) -> LLMResult<LLMResponse> {
        let request = build_request(&self.model, messages, sampling);

        let response = self.client
            .post(self.base_url())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| LLMError::NetworkError(e.to_string()))?;

        if response.status() == 429 {
            return Err(LLMError::RateLimited);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LLMError::ApiError(format!("status: {}, body: {}", status, body)));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| LLMError::ParseError(e.to_string()))?;

        let content = chat_response.content
            .into_iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text),
                ContentBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("\n");

        if content.trim().is_empty() {
            return Err(LLMError::EmptyResponse);
        }

        Ok(LLMResponse {
            content,
            model: self.model.clone(),
            usage: chat_response.usage.map(|u| LLMUsage {
                prompt_tokens: u.input_tokens,
                completion_tokens: u.output_tokens,
            }),
            finish_reason: chat_response.stop_reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_messages_are_lifted() {
        let request = build_request(
            "claude-test",
            vec![
                LLMMessage::system("Be brief."),
                LLMMessage::user("Hi"),
                LLMMessage::assistant("Hello!"),
                LLMMessage::user("Bye"),
            ],
            Sampling { temperature: Some(0.2), max_tokens: 64 },
        );

        assert_eq!(request.system.as_deref(), Some("Be brief."));
        assert_eq!(request.messages.len(), 3);
        assert_eq!(request.messages[0], ClaudeMessage { role: "user".into(), content: "Hi".into() });

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["max_tokens"], 64);
        assert_eq!(json["system"], "Be brief.");
    }

    #[test]
    fn test_no_system_field_without_system_messages() {
        let request = build_request(
            "claude-test",
            vec![LLMMessage::user("Hi")],
            Sampling { temperature: None, max_tokens: 16 },
        );
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("system").is_none());
        assert!(json.get("temperature").is_none());
    }

    #[test]
    fn test_response_parsing_skips_non_text_blocks() {
        let body = r#"{
            "id": "msg_1", "type": "message", "role": "assistant",
            "content": [
                {"type": "text", "text": "Hello"},
                {"type": "tool_use", "id": "t", "name": "x", "input": {}}
            ],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 3, "output_tokens": 1}
        }"#;
        let parsed: ChatResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.content.len(), 2);
        assert!(matches!(parsed.content[1], ContentBlock::Other));
        assert_eq!(parsed.usage.unwrap().output_tokens, 1);
    }
}
