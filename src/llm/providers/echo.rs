// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Echo provider
//!
//! Replays the prompt back one character at a time. Makes no network calls,
//! which makes it the reference behaviour the network providers are checked
//! against.

use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::llm::message::ChatRequest;
use crate::llm::provider::{ChatProvider, DeltaSink};

/// Delay between echoed characters
pub const DEFAULT_ECHO_DELAY: Duration = Duration::from_millis(10);

/// Local echo provider
#[derive(Debug, Clone)]
pub struct EchoProvider {
    delay: Duration,
}

impl Default for EchoProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl EchoProvider {
    /// Create an echo provider with the default per-character delay
    pub fn new() -> Self {
        Self {
            delay: DEFAULT_ECHO_DELAY,
        }
    }

    /// Create an echo provider with a custom per-character delay
    pub fn with_delay(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Preamble describing the request context
    pub fn context_preamble(context: &serde_json::Value) -> String {
        format!("Context: {}.", context)
    }
}

#[async_trait]
impl ChatProvider for EchoProvider {
    fn name(&self) -> &str {
        "echo"
    }

    async fn stream(
        &self,
        request: ChatRequest,
        emit: &DeltaSink,
        cancel: &CancellationToken,
    ) -> Result<()> {
        if let Some(context) = &request.context {
            emit(&Self::context_preamble(context));
        }

        let mut buf = [0u8; 4];
        for ch in request.prompt.chars() {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::debug!(target: "parley.provider", provider = "echo", "echo cancelled");
                    return Ok(());
                }
                _ = tokio::time::sleep(self.delay) => {}
            }
            emit(ch.encode_utf8(&mut buf));
        }

        Ok(())
    }
}
