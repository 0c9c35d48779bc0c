// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Chat session management
//!
//! A [`ChatSession`] owns one conversation and moves between two states:
//! idle, and generating a response. Starting a response pushes the user
//! message plus an empty assistant placeholder and hands out a
//! [`PendingResponse`]; running it streams provider deltas into that
//! placeholder. Each generation is numbered, and only the current one may
//! touch history, so a cancelled generation that keeps emitting (or settles
//! late) cannot disturb a newer one.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::chat::events::{Emitter, Subscription};
use crate::error::{ParleyError, Result};
use crate::llm::message::{ChatRequest, Message};
use crate::llm::provider::ChatProvider;

/// Title given to new sessions
pub const DEFAULT_SESSION_TITLE: &str = "Untitled Chat";

/// Unique session identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Identifier carried by the null session
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

struct SessionState {
    history: Vec<Message>,
    prompt: String,
    /// Present exactly while a generation is active
    cancellation: Option<CancellationToken>,
    /// Number of the most recently started generation
    generation: u64,
    scroll_top: f64,
    title: String,
    summary: Option<String>,
}

impl SessionState {
    fn owns(&self, generation: u64) -> bool {
        self.cancellation.is_some() && self.generation == generation
    }
}

/// One conversation thread
pub struct ChatSession {
    id: SessionId,
    is_null: bool,
    created_at: DateTime<Utc>,
    state: Mutex<SessionState>,
    on_response: Emitter<Message>,
    on_did_change_active: Emitter<bool>,
}

impl ChatSession {
    /// Create an empty, idle session
    pub fn new(id: SessionId) -> Self {
        Self::build(id, false, DEFAULT_SESSION_TITLE)
    }

    /// Create the null session: never responds, never holds history
    pub fn null() -> Self {
        Self::build(SessionId::nil(), true, "")
    }

    fn build(id: SessionId, is_null: bool, title: &str) -> Self {
        Self {
            id,
            is_null,
            created_at: Utc::now(),
            state: Mutex::new(SessionState {
                history: Vec::new(),
                prompt: String::new(),
                cancellation: None,
                generation: 0,
                scroll_top: 0.0,
                title: title.to_string(),
                summary: is_null.then(String::new),
            }),
            on_response: Emitter::new(),
            on_did_change_active: Emitter::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!(target: "parley.session", session = %self.id, "session lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn is_null(&self) -> bool {
        self.is_null
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// True while a generation is running
    pub fn is_active(&self) -> bool {
        self.lock().cancellation.is_some()
    }

    /// Snapshot of the history
    pub fn history(&self) -> Vec<Message> {
        self.lock().history.clone()
    }

    /// Read the history in place. The closure runs under the session lock
    /// and must not call back into this session.
    pub fn with_history<R>(&self, f: impl FnOnce(&[Message]) -> R) -> R {
        f(&self.lock().history)
    }

    pub fn last_message(&self) -> Option<Message> {
        self.lock().history.last().cloned()
    }

    /// Current draft prompt
    pub fn prompt(&self) -> String {
        self.lock().prompt.clone()
    }

    pub fn set_prompt(&self, prompt: impl Into<String>) {
        self.lock().prompt = prompt.into();
    }

    /// Take the draft prompt, leaving it empty
    pub fn take_prompt(&self) -> String {
        std::mem::take(&mut self.lock().prompt)
    }

    pub fn scroll_top(&self) -> f64 {
        self.lock().scroll_top
    }

    pub fn set_scroll_top(&self, scroll_top: f64) {
        self.lock().scroll_top = scroll_top;
    }

    pub fn title(&self) -> String {
        self.lock().title.clone()
    }

    pub fn set_title(&self, title: impl Into<String>) {
        if !self.is_null {
            self.lock().title = title.into();
        }
    }

    pub fn summary(&self) -> Option<String> {
        self.lock().summary.clone()
    }

    pub fn set_summary(&self, summary: Option<String>) {
        if !self.is_null {
            self.lock().summary = summary;
        }
    }

    /// Observe the assistant message being generated. Fires with the
    /// placeholder, after every delta, and once more when the generation ends.
    pub fn on_response(&self, listener: impl Fn(&Message) + Send + Sync + 'static) -> Subscription {
        self.on_response.subscribe(listener)
    }

    /// Observe idle/generating transitions
    pub fn on_did_change_active(
        &self,
        listener: impl Fn(&bool) + Send + Sync + 'static,
    ) -> Subscription {
        self.on_did_change_active.subscribe(listener)
    }

    /// Begin a response to the current draft prompt.
    ///
    /// Fails without touching any state when this is the null session, when
    /// no provider is given, or when a generation is already running. On
    /// success the session is active before this returns.
    pub fn start_response(
        self: &Arc<Self>,
        provider: Option<Arc<dyn ChatProvider>>,
        context: Option<serde_json::Value>,
    ) -> Result<PendingResponse> {
        if self.is_null {
            return Err(ParleyError::Session(
                "Null chat session cannot provide chat responses".into(),
            ));
        }
        let provider = provider.ok_or_else(|| {
            ParleyError::Config("Can't provide chat response: No assistant selected".into())
        })?;

        let (request, placeholder, cancel, generation) = {
            let mut state = self.lock();
            if state.cancellation.is_some() {
                return Err(ParleyError::Session(
                    "A response is already being generated for this session".into(),
                ));
            }

            let request = ChatRequest {
                prompt: state.prompt.clone(),
                history: state.history.clone(),
                context,
            };

            let prompt = std::mem::take(&mut state.prompt);
            state.history.push(Message::user(prompt));
            let placeholder = Message::assistant("");
            state.history.push(placeholder.clone());

            let cancel = CancellationToken::new();
            state.cancellation = Some(cancel.clone());
            state.generation += 1;

            (request, placeholder, cancel, state.generation)
        };

        tracing::debug!(
            target: "parley.session",
            session = %self.id,
            generation,
            provider = provider.name(),
            history = request.history.len(),
            "generation started"
        );

        self.on_did_change_active.fire(&true);
        self.on_response.fire(&placeholder);

        Ok(PendingResponse {
            guard: GenerationGuard {
                session: self.clone(),
                generation,
                settled: false,
            },
            provider,
            request,
            cancel,
        })
    }

    /// Start a response and drive it to completion
    pub async fn provide_chat_response(
        self: &Arc<Self>,
        provider: Option<Arc<dyn ChatProvider>>,
        context: Option<serde_json::Value>,
    ) -> Result<()> {
        self.start_response(provider, context)?.run().await
    }

    /// Stop the running generation, if any. The session is idle when this
    /// returns; calling it again, or while idle, does nothing.
    pub fn cancel(&self) {
        let snapshot = {
            let mut state = self.lock();
            let Some(cancel) = state.cancellation.take() else {
                return;
            };
            cancel.cancel();
            state.history.last().cloned()
        };

        tracing::debug!(target: "parley.session", session = %self.id, "generation cancelled");

        self.on_did_change_active.fire(&false);
        if let Some(message) = snapshot {
            self.on_response.fire(&message);
        }
    }

    fn apply_delta(&self, generation: u64, delta: &str) {
        let snapshot = {
            let mut state = self.lock();
            if !state.owns(generation) {
                tracing::trace!(target: "parley.session", session = %self.id, generation, "dropping stale delta");
                return;
            }
            let Some(message) = state.history.last_mut() else {
                return;
            };
            message.content.push_str(delta);
            message.clone()
        };

        self.on_response.fire(&snapshot);
    }

    fn settle(&self, generation: u64, error: Option<&ParleyError>) {
        let snapshot = {
            let mut state = self.lock();
            if !state.owns(generation) {
                // Cancelled or superseded; cancel() already reset the state
                if let Some(error) = error {
                    tracing::debug!(target: "parley.session", session = %self.id, generation, error = %error, "ignoring error from cancelled generation");
                }
                return;
            }
            state.cancellation = None;
            if let (Some(error), Some(message)) = (error, state.history.last_mut()) {
                message.error = Some(error.to_string());
            }
            state.history.last().cloned()
        };

        match error {
            Some(error) => tracing::warn!(
                target: "parley.session",
                session = %self.id,
                generation,
                error = %error,
                "generation failed"
            ),
            None => tracing::debug!(target: "parley.session", session = %self.id, generation, "generation finished"),
        }

        self.on_did_change_active.fire(&false);
        if let Some(message) = snapshot {
            self.on_response.fire(&message);
        }
    }
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("id", &self.id)
            .field("is_null", &self.is_null)
            .field("active", &self.is_active())
            .finish()
    }
}

/// Returns the session to idle if a generation is abandoned without settling
struct GenerationGuard {
    session: Arc<ChatSession>,
    generation: u64,
    settled: bool,
}

impl GenerationGuard {
    fn settle(mut self, error: Option<&ParleyError>) {
        self.settled = true;
        self.session.settle(self.generation, error);
    }
}

impl Drop for GenerationGuard {
    fn drop(&mut self) {
        if !self.settled {
            self.session.settle(self.generation, None);
        }
    }
}

/// A generation that has been started but not yet driven
#[must_use = "the session stays active until the response is run or dropped"]
pub struct PendingResponse {
    guard: GenerationGuard,
    provider: Arc<dyn ChatProvider>,
    request: ChatRequest,
    cancel: CancellationToken,
}

impl PendingResponse {
    /// The request snapshot handed to the provider
    pub fn request(&self) -> &ChatRequest {
        &self.request
    }

    pub fn session(&self) -> &Arc<ChatSession> {
        &self.guard.session
    }

    /// Token that cancels this generation
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stream the response into the session.
    ///
    /// Provider errors are recorded on the assistant message and returned;
    /// the session is idle again either way.
    pub async fn run(self) -> Result<()> {
        let PendingResponse {
            guard,
            provider,
            request,
            cancel,
        } = self;

        let sink = {
            let session = guard.session.clone();
            let generation = guard.generation;
            move |delta: &str| session.apply_delta(generation, delta)
        };

        let result = provider.stream(request, &sink, &cancel).await;
        guard.settle(result.as_ref().err());
        result
    }
}

impl std::fmt::Debug for PendingResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingResponse")
            .field("session", &self.guard.session.id())
            .field("generation", &self.guard.generation)
            .field("provider", &self.provider.name())
            .finish()
    }
}
