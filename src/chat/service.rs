// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Assistant service
//!
//! Ties the registry and the session directory together. This is the object
//! a host holds: it routes a send to the current session with the selected
//! assistant, creating a session on first use.

use std::sync::Arc;

use crate::chat::directory::SessionDirectory;
use crate::chat::registry::{AssistantRegistration, AssistantRegistry};
use crate::chat::session::{ChatSession, PendingResponse};
use crate::config::Settings;
use crate::error::{ParleyError, Result};
use crate::llm::factory::ProviderFactory;
use crate::llm::provider::ChatProvider;

/// Produces the environment snapshot attached to each request
pub type ContextProvider = dyn Fn() -> Option<serde_json::Value> + Send + Sync;

/// Chat orchestrator
#[derive(Default)]
pub struct AssistantService {
    registry: AssistantRegistry,
    directory: SessionDirectory,
    context_provider: Option<Arc<ContextProvider>>,
}

impl AssistantService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a context source, consulted once per send
    pub fn with_context_provider(
        mut self,
        provider: impl Fn() -> Option<serde_json::Value> + Send + Sync + 'static,
    ) -> Self {
        self.context_provider = Some(Arc::new(provider));
        self
    }

    pub fn registry(&self) -> &AssistantRegistry {
        &self.registry
    }

    pub fn directory(&self) -> &SessionDirectory {
        &self.directory
    }

    /// The current session, or the null session
    pub fn current_session(&self) -> Arc<ChatSession> {
        self.directory.current_session()
    }

    /// Write the draft prompt of the current session
    pub fn set_prompt(&self, prompt: impl Into<String>) {
        self.directory.current_session().set_prompt(prompt);
    }

    pub fn register_assistant(
        &self,
        id: impl Into<String>,
        display_name: impl Into<String>,
        provider: Arc<dyn ChatProvider>,
    ) -> AssistantRegistration {
        self.registry.register(id, display_name, provider)
    }

    pub fn select_assistant(&self, id: &str) -> Result<()> {
        self.registry.select(id)
    }

    /// Build and register every configured model, in configuration order
    pub fn load_models(&self, settings: &Settings) -> Result<Vec<AssistantRegistration>> {
        if settings.models.is_empty() {
            return Err(ParleyError::Config("No chat models configured".into()));
        }

        let registrations: Vec<_> = ProviderFactory::create_all(settings)?
            .into_iter()
            .map(|configured| {
                self.registry
                    .register(configured.id, configured.display_name, configured.provider)
            })
            .collect();

        tracing::info!(
            target: "parley.registry",
            count = registrations.len(),
            "registered configured assistants"
        );
        Ok(registrations)
    }

    /// Start a response to the current draft.
    ///
    /// Fails before touching any session when no assistant is registered.
    /// Without a current session, one is created and selected, and the draft
    /// typed into the null session moves over to it.
    pub fn send(&self) -> Result<PendingResponse> {
        let provider = self.registry.selected_provider().ok_or_else(|| {
            ParleyError::Config("Can't provide chat response: No assistant selected".into())
        })?;

        let session = self.ensure_session()?;
        let context = self.context_provider.as_ref().and_then(|provider| provider());

        session.start_response(Some(provider), context)
    }

    /// Send and drive the response to completion
    pub async fn submit(&self) -> Result<()> {
        self.send()?.run().await
    }

    /// Cancel the generation in the current session, if any
    pub fn cancel(&self) {
        self.directory.current_session().cancel();
    }

    fn ensure_session(&self) -> Result<Arc<ChatSession>> {
        let current = self.directory.current_session();
        if !current.is_null() {
            return Ok(current);
        }

        let (id, session) = self.directory.new_session();
        session.set_prompt(current.take_prompt());
        self.directory.select(Some(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::provider::ProviderKind;
    use crate::llm::providers::EchoProvider;
    use crate::config::ModelConfig;
    use std::time::Duration;

    fn echo() -> Arc<dyn ChatProvider> {
        Arc::new(EchoProvider::with_delay(Duration::ZERO))
    }

    #[test]
    fn test_send_without_assistant_fails_fast() {
        let service = AssistantService::new();
        service.set_prompt("hello");

        let err = service.send().err().unwrap();

        assert!(err.is_config());
        assert!(service.directory().sessions().is_empty());
        assert_eq!(service.current_session().prompt(), "hello");
    }

    #[test]
    fn test_send_creates_session_and_moves_draft() {
        let service = AssistantService::new();
        service.register_assistant("echo", "Echo", echo());
        service.set_prompt("hi");

        let pending = service.send().unwrap();

        let current = service.current_session();
        assert!(!current.is_null());
        assert!(current.is_active());
        assert_eq!(pending.request().prompt, "hi");
        assert_eq!(service.directory().null_session().prompt(), "");
        assert_eq!(service.directory().sessions().len(), 1);
    }

    #[tokio::test]
    async fn test_submit_reuses_current_session() {
        let service = AssistantService::new();
        service.register_assistant("echo", "Echo", echo());

        service.set_prompt("one");
        service.submit().await.unwrap();
        service.set_prompt("two");
        service.submit().await.unwrap();

        assert_eq!(service.directory().sessions().len(), 1);
        assert_eq!(service.current_session().history().len(), 4);
    }

    #[tokio::test]
    async fn test_context_provider_feeds_request() {
        let service = AssistantService::new()
            .with_context_provider(|| Some(serde_json::json!({"file": "main.rs"})));
        service.register_assistant("echo", "Echo", echo());
        service.set_prompt("x");

        let pending = service.send().unwrap();
        assert_eq!(
            pending.request().context,
            Some(serde_json::json!({"file": "main.rs"}))
        );
        pending.run().await.unwrap();

        let last = service.current_session().last_message().unwrap();
        assert_eq!(last.content, r#"Context: {"file":"main.rs"}.x"#);
    }

    #[test]
    fn test_cancel_without_session_is_harmless() {
        let service = AssistantService::new();
        service.cancel();
        assert!(!service.current_session().is_active());
    }

    #[test]
    fn test_load_models_registers_in_order() {
        let service = AssistantService::new();
        let settings = Settings {
            models: vec![
                ModelConfig::new("Local Echo", ProviderKind::Echo),
                ModelConfig::new("Second Echo", ProviderKind::Echo),
            ],
            ..Settings::default()
        };

        let registrations = service.load_models(&settings).unwrap();

        assert_eq!(registrations.len(), 2);
        assert_eq!(registrations[0].id(), "local-echo");
        assert_eq!(service.registry().selected().as_deref(), Some("local-echo"));
    }

    #[test]
    fn test_load_models_rejects_empty_configuration() {
        let service = AssistantService::new();
        let err = service.load_models(&Settings::default()).unwrap_err();
        assert!(err.is_config());
        assert!(service.registry().is_empty());
    }
}
