// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Chat provider trait and related types
//!
//! Defines the abstraction layer for the different chat backends.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::llm::message::ChatRequest;

/// Receiver of incremental response text.
///
/// Called synchronously, once per delta, in the order the provider produces
/// them.
pub type DeltaSink = dyn Fn(&str) + Send + Sync;

/// Main trait for chat providers
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Get the provider name (e.g., "echo", "openai", "anthropic")
    fn name(&self) -> &str;

    /// Stream a response for `request`, handing each text delta to `emit`.
    ///
    /// Cancellation is cooperative: once `cancel` fires the provider stops
    /// at its next suspension point and returns `Ok(())`. Transport and
    /// decode failures are returned as errors and end the whole call.
    async fn stream(
        &self,
        request: ChatRequest,
        emit: &DeltaSink,
        cancel: &CancellationToken,
    ) -> Result<()>;
}

/// Wire format family of a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Local echo, no network
    Echo,
    /// OpenAI chat completions
    #[serde(rename = "openai")]
    OpenAi,
    /// Anthropic messages
    Anthropic,
}

impl ProviderKind {
    /// Tag used in configuration files
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Echo => "echo",
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
        }
    }

    /// All supported provider kinds
    pub fn all() -> &'static [ProviderKind] {
        &[ProviderKind::Echo, ProviderKind::OpenAi, ProviderKind::Anthropic]
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = crate::error::ParleyError;

    fn from_str(s: &str) -> Result<Self> {
        ProviderKind::all()
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| crate::error::ParleyError::Config(format!("Unsupported provider: {}", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_kind_round_trip_tags() {
        for kind in ProviderKind::all() {
            assert_eq!(kind.as_str().parse::<ProviderKind>().unwrap(), *kind);
        }
    }

    #[test]
    fn test_provider_kind_serde_tags() {
        let kind: ProviderKind = serde_json::from_str("\"openai\"").unwrap();
        assert_eq!(kind, ProviderKind::OpenAi);
        assert_eq!(
            serde_json::to_string(&ProviderKind::Anthropic).unwrap(),
            "\"anthropic\""
        );
    }

    #[test]
    fn test_provider_kind_unknown() {
        let err = "gemini".parse::<ProviderKind>().unwrap_err();
        assert!(err.to_string().contains("Unsupported provider: gemini"));
    }
}
