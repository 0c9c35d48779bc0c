// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Anthropic Claude API provider implementation
//!
//! Streams `content_block_delta` text from the messages endpoint. The persona
//! travels in the top-level `system` field rather than as a message.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::{ApiError, Result};
use crate::llm::message::{ChatRequest, Role};
use crate::llm::provider::{ChatProvider, DeltaSink};
use crate::llm::providers::common::{
    conversation_messages, drive_events, send_streaming, WireMessage, ASSISTANT_PERSONA,
};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Default cap on generated tokens
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Anthropic Claude provider
pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    max_tokens: u32,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_base_url(api_key, model, ANTHROPIC_API_URL)
    }

    /// Create with a custom base URL
    pub fn with_base_url(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: base_url.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    /// Set max tokens
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Build the request body
    fn build_request(&self, request: &ChatRequest) -> AnthropicRequest {
        AnthropicRequest {
            model: self.model.clone(),
            // The messages API only accepts user/assistant turns
            messages: conversation_messages(request, |role| role != Role::System),
            max_tokens: self.max_tokens,
            system: ASSISTANT_PERSONA.to_string(),
            stream: true,
        }
    }

    /// Project a stream event to the text it carries, if any
    fn event_text(event: AnthropicStreamEvent) -> Result<Option<String>> {
        match event {
            AnthropicStreamEvent::ContentBlockDelta { delta } => Ok(delta.text),
            AnthropicStreamEvent::Error { error } => Err(ApiError::StreamError(format!(
                "{}: {}",
                error.error_type, error.message
            ))
            .into()),
            AnthropicStreamEvent::MessageStart
            | AnthropicStreamEvent::ContentBlockStart
            | AnthropicStreamEvent::MessageDelta
            | AnthropicStreamEvent::Other => Ok(None),
        }
    }
}

#[async_trait]
impl ChatProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn stream(
        &self,
        request: ChatRequest,
        emit: &DeltaSink,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let body = self.build_request(&request);
        tracing::debug!(
            target: "parley.provider",
            provider = "anthropic",
            model = %self.model,
            messages = body.messages.len(),
            "sending streaming request"
        );

        let http = self
            .client
            .post(&self.base_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body);

        let Some(response) = send_streaming("anthropic", http, cancel).await? else {
            return Ok(());
        };

        drive_events("anthropic", response, cancel, |event: AnthropicStreamEvent| {
            if let Some(text) = Self::event_text(event)? {
                emit(&text);
            }
            Ok(())
        })
        .await
    }
}

// Anthropic API types

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    messages: Vec<WireMessage>,
    max_tokens: u32,
    system: String,
    stream: bool,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicStreamEvent {
    MessageStart,
    ContentBlockStart,
    ContentBlockDelta {
        delta: AnthropicDelta,
    },
    MessageDelta,
    Error {
        error: AnthropicErrorDetail,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct AnthropicDelta {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorDetail {
    #[serde(rename = "type")]
    error_type: String,
    message: String,
}
