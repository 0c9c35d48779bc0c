// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::error::{ApiError, ParleyError, Result};
use crate::llm::decoder::decode_stream;
use crate::llm::message::{ChatRequest, Role};

/// Persona given to every network model
pub(crate) const ASSISTANT_PERSONA: &str = "You are a helpful coding assistant.";

/// Synthetic assistant reply that follows the injected context message
pub(crate) const CONTEXT_ACKNOWLEDGEMENT: &str = "Acknowledged. I won't explicitly mention this context if it is irrelevant, but I will keep it in mind for my responses.";

/// A `{role, content}` pair in vendor request bodies
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct WireMessage {
    pub role: String,
    pub content: String,
}

impl WireMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: content.into(),
        }
    }
}

/// Build the conversation shared by the network providers: non-empty history,
/// the context exchange (when a context is present), then the live prompt.
pub(crate) fn conversation_messages(
    request: &ChatRequest,
    keep_role: impl Fn(Role) -> bool,
) -> Vec<WireMessage> {
    let mut messages: Vec<WireMessage> = request
        .non_empty_history()
        .filter(|m| keep_role(m.role))
        .map(|m| WireMessage::new(m.role, m.content.clone()))
        .collect();

    if let Some(context) = &request.context {
        messages.push(WireMessage::new(Role::User, context.to_string()));
        messages.push(WireMessage::new(Role::Assistant, CONTEXT_ACKNOWLEDGEMENT));
    }

    messages.push(WireMessage::new(Role::User, request.prompt.clone()));
    messages
}

/// Construct a standardized server error.
pub(crate) fn server_error(status: u16, message: impl Into<String>) -> ParleyError {
    ParleyError::Api(ApiError::ServerError {
        status,
        message: message.into(),
    })
}

/// Send a streaming request, racing it against cancellation.
///
/// Returns `Ok(None)` when cancelled before the response headers arrived, or
/// while an error body is still being read.
/// Non-success statuses become [`ApiError::ServerError`] carrying the body.
pub(crate) async fn send_streaming(
    provider: &str,
    request: reqwest::RequestBuilder,
    cancel: &CancellationToken,
) -> Result<Option<reqwest::Response>> {
    let response = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            tracing::debug!(target: "parley.provider", provider, "cancelled before response");
            return Ok(None);
        }
        response = request.send() => response.map_err(|e| ApiError::Network(e.to_string()))?,
    };

    let status = response.status();
    if !status.is_success() {
        let body = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!(target: "parley.provider", provider, status = status.as_u16(), "cancelled while reading error body");
                return Ok(None);
            }
            body = response.text() => body.unwrap_or_default(),
        };
        tracing::warn!(
            target: "parley.provider",
            provider,
            status = status.as_u16(),
            "provider returned an error status"
        );
        return Err(server_error(status.as_u16(), body));
    }

    Ok(Some(response))
}

/// Decode the response body and hand each event to `on_event` until the
/// stream ends, an error occurs, or `cancel` fires.
///
/// Dropping the body on cancellation closes the underlying connection.
pub(crate) async fn drive_events<E, F>(
    provider: &str,
    response: reqwest::Response,
    cancel: &CancellationToken,
    mut on_event: F,
) -> Result<()>
where
    E: DeserializeOwned,
    F: FnMut(E) -> Result<()>,
{
    let mut events = Box::pin(decode_stream::<E, _, _, _>(response.bytes_stream()));
    let mut count = 0usize;

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!(target: "parley.provider", provider, events = count, "stream cancelled");
                return Ok(());
            }
            next = events.next() => next,
        };

        match next {
            Some(event) => {
                on_event(event?)?;
                count += 1;
            }
            None => break,
        }
    }

    tracing::debug!(target: "parley.provider", provider, events = count, "stream finished");
    Ok(())
}
