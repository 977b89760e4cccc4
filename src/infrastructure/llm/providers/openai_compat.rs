//! OpenAI-compatible chat completions (OpenAI, DeepSeek)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::infrastructure::http;
use crate::infrastructure::llm::{LLMMessage, LLMResponse, LLMError, LLMResult, LLM, LLMUsage, Sampling};

pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
pub const DEEPSEEK_API_BASE: &str = "https://api.deepseek.com/v1";

/// Provider for any endpoint speaking the `/chat/completions` dialect
pub struct OpenAiCompatProvider {
    name: String,
    api_base: String,
    api_key: String,
    client: Client,
    model: String,
}

impl OpenAiCompatProvider {
    pub fn new(
        name: impl Into<String>,
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        model: &str,
    ) -> LLMResult<Self> {
        let client = http::client(http::REQUEST_TIMEOUT)
            .map_err(|e| LLMError::NetworkError(e.to_string()))?;

        Ok(Self {
            name: name.into(),
            api_base: api_base.into(),
            api_key: api_key.into(),
            client,
            model: model.to_string(),
        })
    }

    fn base_url(&self) -> String {
        format!("{}/chat/completions", self.api_base.trim_end_matches('/'))
    }
}

/// API request structure
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [LLMMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    max_tokens: u32,
    stream: bool,
}

/// API response structure
#[derive(Deserialize, Debug)]
struct ChatResponse {
    model: Option<String>,
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize, Debug)]
struct Choice {
    message: ResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize, Debug)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

fn into_response(parsed: ChatResponse, fallback_model: &str) -> LLMResult<LLMResponse> {
    let model = parsed.model.unwrap_or_else(|| fallback_model.to_string());
    let usage = parsed.usage.map(|u| LLMUsage {
        prompt_tokens: u.prompt_tokens,
        completion_tokens: u.completion_tokens,
    });

    let choice = parsed.choices.into_iter().next().ok_or(LLMError::EmptyResponse)?;
    let content = choice
        .message
        .content
        .filter(|c| !c.trim().is_empty())
        .ok_or(LLMError::EmptyResponse)?;

    Ok(LLMResponse {
        content,
        model,
        usage,
        finish_reason: choice.finish_reason,
    })
}

#[async_trait]
impl LLM for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn chat(&self, messages: Vec<LLMMessage>, sampling: Sampling) -> LLMResult<LLMResponse> {
        let request = ChatRequest {
            model: &self.model,
            messages: &messages,
            temperature: sampling.temperature,
            max_tokens: sampling.max_tokens,
            stream: false,
        };

        let response = self.client
            .post(self.base_url())
            .bearer_auth(&self.api_key)
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

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| LLMError::ParseError(e.to_string()))?;

        into_response(parsed, &self.model)
    }
}
