//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.smartnutri/config.json`) and
//! environment. Kept minimal: Telegram credentials, agent defaults, and the
//! attachment storage directory.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application config.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Telegram bot settings.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Agent defaults (model, Ollama endpoint, system prompt).
    #[serde(default)]
    pub agent: AgentConfig,

    /// Directory for inbound photo attachments (default "storage", relative
    /// to the working directory).
    #[serde(default = "default_storage_dir")]
    pub storage_dir: PathBuf,
}

/// Telegram bot config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelegramConfig {
    /// Bot token from BotFather. Overridden by TELEGRAM_BOT_TOKEN env when set.
    pub bot_token: Option<String>,
    /// Display name used in startup logs (default "SmartNutri").
    pub bot_name: Option<String>,
    /// Bot API base URL override (for tests or self-hosted Bot API servers).
    pub api_base: Option<String>,
}

/// Agent defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentConfig {
    /// Ollama model name, exact tag from `ollama list` (e.g. "llama3.2:latest").
    pub model: Option<String>,
    /// Ollama base URL (default http://127.0.0.1:11434).
    pub ollama_url: Option<String>,
    /// Override for the built-in nutritionist system prompt.
    pub system_prompt: Option<String>,
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from("storage")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            telegram: TelegramConfig::default(),
            agent: AgentConfig::default(),
            storage_dir: default_storage_dir(),
        }
    }
}

/// Resolve the Telegram bot token: env TELEGRAM_BOT_TOKEN overrides config.
pub fn resolve_telegram_token(config: &Config) -> Option<String> {
    std::env::var("TELEGRAM_BOT_TOKEN")
        .ok()
        .and_then(|s| {
            let t = s.trim();
            if t.is_empty() {
                None
            } else {
                Some(t.to_string())
            }
        })
        .or_else(|| {
            config
                .telegram
                .bot_token
                .as_ref()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("SMARTNUTRI_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".smartnutri").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the default path (or SMARTNUTRI_CONFIG_PATH). Missing file => default config.
/// Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_storage_dir_is_storage() {
        let c = Config::default();
        assert_eq!(c.storage_dir, PathBuf::from("storage"));
    }

    #[test]
    fn empty_json_gives_defaults() {
        let c: Config = serde_json::from_str("{}").expect("parse empty config");
        assert!(c.telegram.bot_token.is_none());
        assert!(c.agent.model.is_none());
        assert_eq!(c.storage_dir, PathBuf::from("storage"));
    }

    #[test]
    fn telegram_fields_are_camel_case() {
        let c: Config = serde_json::from_str(
            r#"{ "telegram": { "botToken": "t0k", "botName": "SmartNutri", "apiBase": "http://localhost:8081" } }"#,
        )
        .expect("parse telegram config");
        assert_eq!(c.telegram.bot_token.as_deref(), Some("t0k"));
        assert_eq!(c.telegram.bot_name.as_deref(), Some("SmartNutri"));
        assert_eq!(c.telegram.api_base.as_deref(), Some("http://localhost:8081"));
    }

    #[test]
    fn blank_config_token_is_ignored() {
        let mut c = Config::default();
        c.telegram.bot_token = Some("   ".to_string());
        // env override may apply on dev machines; only assert when env is unset
        if std::env::var("TELEGRAM_BOT_TOKEN").is_err() {
            assert_eq!(resolve_telegram_token(&c), None);
        }
    }
}
