// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Provider factory for creating chat providers
//!
//! Maps the provider tag of a [`ModelConfig`] to the matching constructor.

use std::sync::Arc;
use std::time::Duration;

use crate::config::{ModelConfig, Settings};
use crate::error::Result;
use crate::llm::provider::{ChatProvider, ProviderKind};
use crate::llm::providers::{AnthropicProvider, EchoProvider, OpenAiProvider};

/// A provider built from configuration, ready for registration
pub struct ConfiguredProvider {
    /// Assistant identifier derived from the display name
    pub id: String,
    /// Display name shown in the assistant picker
    pub display_name: String,
    pub provider: Arc<dyn ChatProvider>,
}

/// Factory for creating chat providers
pub struct ProviderFactory;

impl ProviderFactory {
    /// Create a provider for one model entry
    ///
    /// # Arguments
    /// * `config` - The model entry; validated before construction
    /// * `echo_delay` - Per-character delay for echo providers
    pub fn create(config: &ModelConfig, echo_delay: Duration) -> Result<Arc<dyn ChatProvider>> {
        config.validate()?;

        let provider: Arc<dyn ChatProvider> = match config.provider {
            ProviderKind::Echo => Arc::new(EchoProvider::with_delay(echo_delay)),
            ProviderKind::OpenAi => Arc::new(match &config.base_url {
                Some(base_url) => {
                    OpenAiProvider::with_base_url(&config.api_key, &config.model, base_url)
                }
                None => OpenAiProvider::new(&config.api_key, &config.model),
            }),
            ProviderKind::Anthropic => {
                let provider = match &config.base_url {
                    Some(base_url) => {
                        AnthropicProvider::with_base_url(&config.api_key, &config.model, base_url)
                    }
                    None => AnthropicProvider::new(&config.api_key, &config.model),
                };
                Arc::new(match config.max_tokens {
                    Some(max_tokens) => provider.with_max_tokens(max_tokens),
                    None => provider,
                })
            }
        };

        Ok(provider)
    }

    /// Create every configured provider, in configuration order
    pub fn create_all(settings: &Settings) -> Result<Vec<ConfiguredProvider>> {
        settings
            .models
            .iter()
            .map(|config| {
                Ok(ConfiguredProvider {
                    id: config.identifier(),
                    display_name: config.name.clone(),
                    provider: Self::create(config, settings.echo_delay())?,
                })
            })
            .collect()
    }

    /// List all supported provider tags
    pub fn supported_providers() -> Vec<&'static str> {
        ProviderKind::all().iter().map(|kind| kind.as_str()).collect()
    }
}
