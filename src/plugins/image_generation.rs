//! Image generation plugin - OpenAI images API

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::application::errors::PluginError;
use crate::domain::entities::{CommandSpec, Message, Reply};
use crate::infrastructure::config::{BotConfig, OPENAI_API_KEY};
use crate::infrastructure::http;
use crate::infrastructure::llm::providers::OPENAI_API_BASE;
use crate::plugins::trait_def::{joined_args, Plugin};

const CAPTION_CHARS: usize = 200;

/// Image models take noticeably longer than chat completions
const GENERATION_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Serialize)]
struct ImageRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u8,
    size: &'a str,
}

#[derive(Deserialize)]
struct ImageResponse {
    data: Vec<ImageData>,
}

#[derive(Deserialize)]
struct ImageData {
    url: Option<String>,
}

pub struct ImageGenerationPlugin {
    api_key: Option<String>,
    model: String,
    size: String,
    http: Client,
}

impl ImageGenerationPlugin {
    pub fn new(config: &BotConfig) -> Result<Self, PluginError> {
        if config.openai.api_key.is_none() {
            tracing::warn!("{} not set, /image will be unavailable", OPENAI_API_KEY);
        }
        Ok(Self {
            api_key: config.openai.api_key.clone(),
            model: config.openai.image_model.clone(),
            size: config.openai.image_size.clone(),
            http: http::client(GENERATION_TIMEOUT).map_err(|e| PluginError::Upstream(e.to_string()))?,
        })
    }

    async fn generate(&self, api_key: &str, prompt: &str) -> Result<String, PluginError> {
        let request = ImageRequest {
            model: &self.model,
            prompt,
            n: 1,
            size: &self.size,
        };

        let response = self.http
            .post(format!("{}/images/generations", OPENAI_API_BASE))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| PluginError::Upstream(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PluginError::Upstream(format!("images API {}: {}", status, body)));
        }

        let parsed: ImageResponse = response
            .json()
            .await
            .map_err(|e| PluginError::Upstream(e.to_string()))?;

        first_url(parsed)
    }
}

fn first_url(response: ImageResponse) -> Result<String, PluginError> {
    response
        .data
        .into_iter()
        .find_map(|d| d.url)
        .ok_or_else(|| PluginError::Upstream("No image URL in response".to_string()))
}

fn caption(prompt: &str) -> String {
    if prompt.chars().count() <= CAPTION_CHARS {
        prompt.to_string()
    } else {
        let mut caption: String = prompt.chars().take(CAPTION_CHARS).collect();
        caption.push('…');
        caption
    }
}

#[async_trait]
impl Plugin for ImageGenerationPlugin {
    fn name(&self) -> &str {
        "image-generation"
    }

    fn description(&self) -> &str {
        "Generates images from text prompts"
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![CommandSpec::new("image", "Generate an image from a prompt").with_usage("<prompt>")]
    }

    async fn handle_command(
        &self,
        _command: &str,
        args: &[String],
        _message: &Message,
    ) -> Result<Reply, PluginError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            PluginError::NotConfigured("Image generation".to_string(), OPENAI_API_KEY.to_string())
        })?;

        let prompt = joined_args(args);
        if prompt.is_empty() {
            return Err(PluginError::InvalidArgs("Usage: /image <prompt>".to_string()));
        }

        tracing::info!(model = %self.model, "Generating image: {}", caption(&prompt));
        let url = self.generate(api_key, &prompt).await?;

        Ok(Reply::Photo {
            url,
            caption: Some(caption(&prompt)),
        })
    }
}
