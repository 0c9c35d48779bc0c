// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Settings management for Parley
//!
//! Describes the chat models a host wants registered. Settings are plain
//! JSON; where the file lives and how keys are obtained is up to the host.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{ParleyError, Result};
use crate::llm::provider::ProviderKind;

/// Main settings structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Models to register as assistants, in display order
    #[serde(default)]
    pub models: Vec<ModelConfig>,

    /// Per-character delay used by echo assistants
    #[serde(default = "default_echo_delay_ms")]
    pub echo_delay_ms: u64,
}

/// One configured chat model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Display name; the assistant identifier is derived from it
    pub name: String,

    /// Wire format family
    pub provider: ProviderKind,

    /// Vendor model identifier
    #[serde(default)]
    pub model: String,

    /// API key passed to the vendor
    #[serde(default)]
    pub api_key: String,

    /// Base URL for API (for custom endpoints)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Maximum tokens for response (Anthropic only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

fn default_echo_delay_ms() -> u64 {
    10
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            models: Vec::new(),
            echo_delay_ms: default_echo_delay_ms(),
        }
    }
}

impl Settings {
    /// Parse settings from JSON text
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Load settings from a specific path. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn echo_delay(&self) -> Duration {
        Duration::from_millis(self.echo_delay_ms)
    }

    /// Check every model entry
    pub fn validate(&self) -> Result<()> {
        self.models.iter().try_for_each(ModelConfig::validate)
    }
}

impl ModelConfig {
    /// Create a config entry
    pub fn new(name: impl Into<String>, provider: ProviderKind) -> Self {
        Self {
            name: name.into(),
            provider,
            model: String::new(),
            api_key: String::new(),
            base_url: None,
            max_tokens: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Assistant identifier: the name lowercased, each whitespace run
    /// (leading and trailing ones included) replaced by a single `-`
    pub fn identifier(&self) -> String {
        let mut id = String::with_capacity(self.name.len());
        let mut in_whitespace = false;
        for ch in self.name.to_lowercase().chars() {
            if ch.is_whitespace() {
                if !in_whitespace {
                    id.push('-');
                }
                in_whitespace = true;
            } else {
                id.push(ch);
                in_whitespace = false;
            }
        }
        id
    }

    /// Network providers need a model and a key
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ParleyError::Config("Model name must not be empty".into()));
        }
        if self.provider != ProviderKind::Echo {
            if self.model.is_empty() {
                return Err(ParleyError::Config(format!(
                    "Model '{}' has no model identifier",
                    self.name
                )));
            }
            if self.api_key.is_empty() {
                return Err(ParleyError::Config(format!(
                    "Model '{}' has no API key",
                    self.name
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_settings_default() {
        let settings = Settings::default();
        assert!(settings.models.is_empty());
        assert_eq!(settings.echo_delay(), Duration::from_millis(10));
    }

    #[test]
    fn test_settings_from_json() {
        let settings = Settings::from_json(
            r#"{
                "models": [
                    {"name": "Echo", "provider": "echo"},
                    {"name": "GPT 4o", "provider": "openai", "model": "gpt-4o", "api_key": "sk"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(settings.models.len(), 2);
        assert_eq!(settings.models[0].provider, ProviderKind::Echo);
        assert_eq!(settings.models[1].api_key, "sk");
        assert_eq!(settings.echo_delay_ms, 10);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_settings_unknown_provider_rejected() {
        let result = Settings::from_json(r#"{"models": [{"name": "G", "provider": "gemini"}]}"#);
        assert!(matches!(result, Err(ParleyError::Json(_))));
    }

    #[test]
    fn test_settings_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::load_from(&dir.path().join("absent.json")).unwrap();
        assert!(settings.models.is_empty());
    }

    #[test]
    fn test_settings_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let settings = Settings {
            models: vec![ModelConfig::new("Claude", ProviderKind::Anthropic)
                .with_model("claude-3-5-sonnet-20241022")
                .with_api_key("key")],
            echo_delay_ms: 5,
        };
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(&path).unwrap();
        assert_eq!(loaded.models[0].name, "Claude");
        assert_eq!(loaded.echo_delay(), Duration::from_millis(5));
    }

    #[test]
    fn test_identifier_from_name() {
        let config = ModelConfig::new("My  Fancy\tModel", ProviderKind::Echo);
        assert_eq!(config.identifier(), "my-fancy-model");
    }

    #[test]
    fn test_identifier_keeps_edge_whitespace() {
        let config = ModelConfig::new(" Foo ", ProviderKind::Echo);
        assert_eq!(config.identifier(), "-foo-");

        let config = ModelConfig::new("\tGPT  4o\n", ProviderKind::Echo);
        assert_eq!(config.identifier(), "-gpt-4o-");
    }

    #[test]
    fn test_validate_network_model_requires_key() {
        let config = ModelConfig::new("GPT", ProviderKind::OpenAi).with_model("gpt-4o");
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("no API key"));

        let config = ModelConfig::new("GPT", ProviderKind::OpenAi).with_api_key("k");
        assert!(config.validate().unwrap_err().to_string().contains("no model"));

        assert!(ModelConfig::new("Echo", ProviderKind::Echo).validate().is_ok());
        assert!(ModelConfig::new("  ", ProviderKind::Echo).validate().is_err());
    }
}
