//! Configuration management
//!
//! Secrets come from the environment, everything else from an optional YAML
//! settings file. The two are merged once at startup into a [`BotConfig`].

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::application::errors::ConfigError;
use crate::infrastructure::llm::AiProvider;
use crate::plugins::PluginKind;

pub const TELEGRAM_TOKEN: &str = "TELEGRAM_TOKEN";
pub const CLAUDE_API_KEY: &str = "CLAUDE_API_KEY";
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const CODEX_API_KEY: &str = "CODEX_API_KEY";
pub const DEEPSEEK_API_KEY: &str = "DEEPSEEK_API_KEY";

/// API credentials read from the environment
#[derive(Clone)]
pub struct Credentials {
    pub telegram_token: String,
    pub claude_api_key: String,
    pub openai_api_key: Option<String>,
    pub codex_api_key: Option<String>,
    pub deepseek_api_key: Option<String>,
}

impl Credentials {
    /// Read credentials through an arbitrary lookup.
    ///
    /// Empty values count as missing; any other value is taken verbatim. Both required keys are checked before
    /// failing so the error names every missing variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let telegram_token = read(TELEGRAM_TOKEN);
        let claude_api_key = read(CLAUDE_API_KEY);

        match (telegram_token, claude_api_key) {
            (Some(telegram_token), Some(claude_api_key)) => Ok(Self {
                telegram_token,
                claude_api_key,
                openai_api_key: read(OPENAI_API_KEY),
                codex_api_key: read(CODEX_API_KEY),
                deepseek_api_key: read(DEEPSEEK_API_KEY),
            }),
            (telegram, claude) => {
                let mut missing = Vec::new();
                if telegram.is_none() {
                    missing.push(TELEGRAM_TOKEN);
                }
                if claude.is_none() {
                    missing.push(CLAUDE_API_KEY);
                }
                Err(ConfigError::MissingEnv(missing.join(", ")))
            }
        }
    }
}

/// Non-secret settings, loaded from YAML
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Settings {
    pub bot: BotSection,
    pub data_dir: PathBuf,
    pub ai: AiSection,
    pub plugins: PluginsSection,
    pub solana: SolanaSection,
    pub codex: CodexSection,
    pub image: ImageSection,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct BotSection {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct AiSection {
    pub provider: AiProvider,
    pub claude_model: String,
    pub deepseek_model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub system_prompt: String,
    /// Previous messages sent along with each prompt
    pub history_limit: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct PluginsSection {
    pub enabled: Vec<PluginKind>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SolanaSection {
    pub rpc_url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CodexSection {
    pub model: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ImageSection {
    pub model: String,
    pub size: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bot: BotSection::default(),
            data_dir: PathBuf::from("data"),
            ai: AiSection::default(),
            plugins: PluginsSection::default(),
            solana: SolanaSection::default(),
            codex: CodexSection::default(),
            image: ImageSection::default(),
        }
    }
}

impl Default for BotSection {
    fn default() -> Self {
        Self {
            name: "telegent-bot".to_string(),
        }
    }
}

impl Default for AiSection {
    fn default() -> Self {
        Self {
            provider: AiProvider::Claude,
            claude_model: "claude-3-5-sonnet-latest".to_string(),
            deepseek_model: "deepseek-chat".to_string(),
            max_tokens: 1024,
            temperature: 0.7,
            system_prompt: "You are a helpful and friendly AI assistant on Telegram.".to_string(),
            history_limit: 20,
        }
    }
}

impl Default for PluginsSection {
    fn default() -> Self {
        Self {
            enabled: PluginKind::ALL.to_vec(),
        }
    }
}

impl Default for SolanaSection {
    fn default() -> Self {
        Self {
            rpc_url: "https://api.mainnet-beta.solana.com".to_string(),
        }
    }
}

impl Default for CodexSection {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
        }
    }
}

impl Default for ImageSection {
    fn default() -> Self {
        Self {
            model: "dall-e-3".to_string(),
            size: "1024x1024".to_string(),
        }
    }
}

impl Settings {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Parse(format!("Failed to read config: {}", e)))?;

        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let settings: Self = serde_yaml::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load the file when it exists, otherwise fall back to defaults
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!("No settings file at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.ai.temperature) {
            return Err(ConfigError::InvalidValue(format!(
                "ai.temperature must be within 0.0..=2.0, got {}",
                self.ai.temperature
            )));
        }
        if self.ai.max_tokens == 0 {
            return Err(ConfigError::InvalidValue("ai.max-tokens must be positive".to_string()));
        }
        Ok(())
    }
}

/// Assembled bot configuration, built once and never mutated
#[derive(Clone)]
pub struct BotConfig {
    pub bot: BotSection,
    pub telegram: TelegramSection,
    pub ai: AiConfig,
    pub memory: MemorySection,
    pub openai: OpenAiSection,
    pub codex: CodexConfig,
    pub solana: SolanaConfig,
    pub plugins: PluginsSection,
}

#[derive(Clone)]
pub struct TelegramSection {
    pub token: String,
}

#[derive(Clone)]
pub struct AiConfig {
    pub provider: AiProvider,
    pub claude_api_key: String,
    pub deepseek_api_key: Option<String>,
    pub claude_model: String,
    pub deepseek_model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub system_prompt: String,
    pub history_limit: usize,
}

#[derive(Clone)]
pub struct MemorySection {
    pub path: PathBuf,
}

#[derive(Clone)]
pub struct OpenAiSection {
    pub api_key: Option<String>,
    pub image_model: String,
    pub image_size: String,
}

#[derive(Clone)]
pub struct CodexConfig {
    pub api_key: Option<String>,
    pub model: String,
}

#[derive(Clone)]
pub struct SolanaConfig {
    pub rpc_url: String,
    pub data_path: PathBuf,
}

impl BotConfig {
    pub fn assemble(credentials: Credentials, settings: &Settings, data_dir: &Path) -> Self {
        Self {
            bot: settings.bot.clone(),
            telegram: TelegramSection {
                token: credentials.telegram_token,
            },
            ai: AiConfig {
                provider: settings.ai.provider,
                claude_api_key: credentials.claude_api_key,
                deepseek_api_key: credentials.deepseek_api_key,
                claude_model: settings.ai.claude_model.clone(),
                deepseek_model: settings.ai.deepseek_model.clone(),
                max_tokens: settings.ai.max_tokens,
                temperature: settings.ai.temperature,
                system_prompt: settings.ai.system_prompt.clone(),
                history_limit: settings.ai.history_limit,
            },
            memory: MemorySection {
                path: data_dir.to_path_buf(),
            },
            openai: OpenAiSection {
                api_key: credentials.openai_api_key,
                image_model: settings.image.model.clone(),
                image_size: settings.image.size.clone(),
            },
            codex: CodexConfig {
                api_key: credentials.codex_api_key,
                model: settings.codex.model.clone(),
            },
            solana: SolanaConfig {
                rpc_url: settings.solana.rpc_url.clone(),
                data_path: data_dir.to_path_buf(),
            },
            plugins: settings.plugins.clone(),
        }
    }
}
