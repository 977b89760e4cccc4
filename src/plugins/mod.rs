//! Plugin system
//!
//! Plugins observe incoming messages and answer their own commands. The
//! built-in set is registered in the fixed order of [`PluginKind::ALL`].

pub mod manager;
pub mod trait_def;
pub mod logger;
pub mod solana;
pub mod image_generation;
pub mod codex;

pub use manager::PluginManager;
pub use trait_def::{Plugin, PluginKind};
pub use logger::LoggerPlugin;
pub use solana::SolanaPlugin;
pub use image_generation::ImageGenerationPlugin;
pub use codex::CodexPlugin;

use crate::application::errors::PluginError;
use crate::infrastructure::config::BotConfig;

/// Construct one built-in plugin
pub fn build(kind: PluginKind, config: &BotConfig) -> Result<Box<dyn Plugin>, PluginError> {
    let plugin: Box<dyn Plugin> = match kind {
        PluginKind::Logger => Box::new(LoggerPlugin::new()),
        PluginKind::Solana => Box::new(SolanaPlugin::new(&config.solana)?),
        PluginKind::ImageGeneration => Box::new(ImageGenerationPlugin::new(config)?),
        PluginKind::Codex => Box::new(CodexPlugin::new(&config.codex)?),
    };
    Ok(plugin)
}

/// Enabled plugin kinds in registration order. The order of the enabled
/// list in the settings does not matter.
pub fn enabled_kinds(config: &BotConfig) -> Vec<PluginKind> {
    PluginKind::ALL
        .into_iter()
        .filter(|kind| config.plugins.enabled.contains(kind))
        .collect()
}

/// The enabled built-in plugins, ready to register
pub fn plugin_set(config: &BotConfig) -> Result<Vec<Box<dyn Plugin>>, PluginError> {
    enabled_kinds(config)
        .into_iter()
        .map(|kind| build(kind, config))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::config::{Credentials, Settings};

    fn config(enabled: Vec<PluginKind>) -> BotConfig {
        let creds = Credentials::from_lookup(|key| match key {
            "TELEGRAM_TOKEN" | "CLAUDE_API_KEY" => Some("x".to_string()),
            _ => None,
        })
        .unwrap();
        let mut settings = Settings::default();
        settings.plugins.enabled = enabled;
        BotConfig::assemble(creds, &settings, std::path::Path::new("data"))
    }

    #[test]
    fn test_default_set_in_fixed_order() {
        let names: Vec<String> = plugin_set(&config(PluginKind::ALL.to_vec()))
            .unwrap()
            .iter()
            .map(|p| p.name().to_string())
            .collect();
        assert_eq!(names, vec!["logger", "solana", "image-generation", "codex"]);
    }

    #[test]
    fn test_settings_order_is_ignored() {
        let kinds = enabled_kinds(&config(vec![PluginKind::Codex, PluginKind::Logger]));
        assert_eq!(kinds, vec![PluginKind::Logger, PluginKind::Codex]);
    }

    #[test]
    fn test_empty_set() {
        assert!(plugin_set(&config(vec![])).unwrap().is_empty());
    }
}
