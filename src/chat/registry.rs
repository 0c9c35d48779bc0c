// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Assistant registry
//!
//! Maps assistant identifiers to providers and tracks which one is selected.
//! The selection heals itself on read: when nothing valid is selected, the
//! first registered assistant becomes the selection.

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use crate::chat::events::{Emitter, Subscription};
use crate::error::{ParleyError, Result};
use crate::llm::provider::ChatProvider;

/// Public view of one registered assistant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantInfo {
    pub id: String,
    pub display_name: String,
}

struct Entry {
    id: String,
    display_name: String,
    provider: Arc<dyn ChatProvider>,
    /// Distinguishes this registration from later ones under the same id
    token: u64,
}

#[derive(Default)]
struct RegistryState {
    entries: Vec<Entry>,
    selected: Option<String>,
    next_token: u64,
}

impl RegistryState {
    fn position(&self, id: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry.id == id)
    }

    fn heal_selection(&mut self) -> Option<String> {
        let valid = self
            .selected
            .as_deref()
            .is_some_and(|id| self.position(id).is_some());
        if !valid {
            self.selected = self.entries.first().map(|entry| entry.id.clone());
        }
        self.selected.clone()
    }
}

#[derive(Default)]
struct RegistryInner {
    state: Mutex<RegistryState>,
    on_did_register: Emitter<String>,
    on_did_unregister: Emitter<String>,
    on_did_select: Emitter<String>,
}

impl RegistryInner {
    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!(target: "parley.registry", "registry lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    /// Remove `id`, optionally only if it still belongs to registration `token`
    fn remove(&self, id: &str, token: Option<u64>) -> bool {
        let removed = {
            let mut state = self.lock();
            match state.position(id) {
                Some(index) if token.map_or(true, |t| state.entries[index].token == t) => {
                    state.entries.remove(index);
                    true
                }
                _ => false,
            }
        };

        if removed {
            tracing::debug!(target: "parley.registry", assistant = id, "assistant unregistered");
            self.on_did_unregister.fire(&id.to_string());
        }
        removed
    }
}

/// Registered assistants and the current selection
#[derive(Default)]
pub struct AssistantRegistry {
    inner: Arc<RegistryInner>,
}

impl AssistantRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `provider` under `id`. Registering an id again replaces the
    /// previous entry in place; handles from the older registration go inert.
    pub fn register(
        &self,
        id: impl Into<String>,
        display_name: impl Into<String>,
        provider: Arc<dyn ChatProvider>,
    ) -> AssistantRegistration {
        let id = id.into();
        let display_name = display_name.into();

        let (token, replaced) = {
            let mut state = self.inner.lock();
            let token = state.next_token;
            state.next_token += 1;
            let entry = Entry {
                id: id.clone(),
                display_name: display_name.clone(),
                provider,
                token,
            };
            match state.position(&id) {
                Some(index) => {
                    state.entries[index] = entry;
                    (token, true)
                }
                None => {
                    state.entries.push(entry);
                    (token, false)
                }
            }
        };

        tracing::debug!(
            target: "parley.registry",
            assistant = %id,
            display_name = %display_name,
            replaced,
            "assistant registered"
        );
        self.inner.on_did_register.fire(&display_name);

        AssistantRegistration {
            registry: Arc::downgrade(&self.inner),
            id,
            token,
        }
    }

    /// Remove an assistant by id. Returns false if it was not registered.
    pub fn unregister(&self, id: &str) -> bool {
        self.inner.remove(id, None)
    }

    /// Every registered assistant, in registration order
    pub fn registered(&self) -> Vec<AssistantInfo> {
        self.inner
            .lock()
            .entries
            .iter()
            .map(|entry| AssistantInfo {
                id: entry.id.clone(),
                display_name: entry.display_name.clone(),
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    pub fn provider(&self, id: &str) -> Option<Arc<dyn ChatProvider>> {
        let state = self.inner.lock();
        state
            .position(id)
            .map(|index| state.entries[index].provider.clone())
    }

    /// Make `id` the selected assistant
    pub fn select(&self, id: &str) -> Result<()> {
        {
            let mut state = self.inner.lock();
            if state.position(id).is_none() {
                return Err(ParleyError::Config(format!("Unknown assistant: {}", id)));
            }
            state.selected = Some(id.to_string());
        }

        tracing::debug!(target: "parley.registry", assistant = id, "assistant selected");
        self.inner.on_did_select.fire(&id.to_string());
        Ok(())
    }

    /// The selected assistant id. An empty or stale selection is replaced by
    /// the first registered assistant, without notifying.
    pub fn selected(&self) -> Option<String> {
        self.inner.lock().heal_selection()
    }

    /// Provider of the selected assistant, healing the selection first
    pub fn selected_provider(&self) -> Option<Arc<dyn ChatProvider>> {
        let mut state = self.inner.lock();
        let id = state.heal_selection()?;
        state
            .position(&id)
            .map(|index| state.entries[index].provider.clone())
    }

    /// Fires with the display name of each new registration
    pub fn on_did_register(&self, listener: impl Fn(&String) + Send + Sync + 'static) -> Subscription {
        self.inner.on_did_register.subscribe(listener)
    }

    /// Fires with the id of each removed assistant
    pub fn on_did_unregister(
        &self,
        listener: impl Fn(&String) + Send + Sync + 'static,
    ) -> Subscription {
        self.inner.on_did_unregister.subscribe(listener)
    }

    /// Fires with the id passed to a successful [`select`](Self::select)
    pub fn on_did_select(&self, listener: impl Fn(&String) + Send + Sync + 'static) -> Subscription {
        self.inner.on_did_select.subscribe(listener)
    }
}

/// Handle for one registration
///
/// Dropping the handle keeps the assistant registered; call
/// [`deregister`](Self::deregister) to remove it.
#[derive(Debug, Clone)]
pub struct AssistantRegistration {
    registry: Weak<RegistryInner>,
    id: String,
    token: u64,
}

impl AssistantRegistration {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Remove this registration. Does nothing if it was already removed or
    /// has been replaced by a newer registration of the same id.
    pub fn deregister(&self) -> bool {
        match self.registry.upgrade() {
            Some(inner) => inner.remove(&self.id, Some(self.token)),
            None => false,
        }
    }
}
