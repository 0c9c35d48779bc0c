// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! OpenAI chat completions provider
//!
//! Streams `choices[0].delta.content` fragments from the OpenAI-compatible
//! `/v1/chat/completions` endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::llm::message::{ChatRequest, Role};
use crate::llm::provider::{ChatProvider, DeltaSink};
use crate::llm::providers::common::{
    conversation_messages, drive_events, send_streaming, WireMessage, ASSISTANT_PERSONA,
};

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// OpenAI provider
pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiProvider {
    /// Create a new OpenAI provider
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_base_url(api_key, model, OPENAI_API_URL)
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
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Build the request body: persona first, then the shared conversation
    fn build_request(&self, request: &ChatRequest) -> OpenAiRequest {
        let mut messages = vec![WireMessage::new(Role::System, ASSISTANT_PERSONA)];
        messages.extend(conversation_messages(request, |_| true));

        OpenAiRequest {
            model: self.model.clone(),
            messages,
            stream: true,
        }
    }

    /// Project a stream chunk to the text it carries, if any
    fn chunk_text(chunk: OpenAiStreamChunk) -> Option<String> {
        chunk.choices.into_iter().next()?.delta.content
    }
}

#[async_trait]
impl ChatProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
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
            provider = "openai",
            model = %self.model,
            messages = body.messages.len(),
            "sending streaming request"
        );

        let http = self
            .client
            .post(&self.base_url)
            .header("Authorization", format!("Bearer {}", &self.api_key))
            .header("Content-Type", "application/json")
            .json(&body);

        let Some(response) = send_streaming("openai", http, cancel).await? else {
            return Ok(());
        };

        drive_events("openai", response, cancel, |chunk: OpenAiStreamChunk| {
            if let Some(text) = Self::chunk_text(chunk) {
                emit(&text);
            }
            Ok(())
        })
        .await
    }
}

// OpenAI API types

#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<WireMessage>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct OpenAiStreamChunk {
    choices: Vec<OpenAiStreamChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiStreamChoice {
    delta: OpenAiDelta,
}

#[derive(Debug, Deserialize)]
struct OpenAiDelta {
    #[serde(default)]
    content: Option<String>,
}
