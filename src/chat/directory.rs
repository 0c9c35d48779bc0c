// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Session directory
//!
//! Owns every session and tracks which one is current. With no current
//! session, lookups return the null session rather than nothing.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::chat::events::{Emitter, Subscription};
use crate::chat::session::{ChatSession, SessionId};
use crate::error::{ParleyError, Result};

#[derive(Default)]
struct DirectoryState {
    sessions: Vec<Arc<ChatSession>>,
    current: Option<SessionId>,
}

impl DirectoryState {
    fn find(&self, id: SessionId) -> Option<Arc<ChatSession>> {
        self.sessions
            .iter()
            .find(|session| session.id() == id)
            .cloned()
    }
}

/// All sessions plus the current selection
pub struct SessionDirectory {
    null: Arc<ChatSession>,
    state: Mutex<DirectoryState>,
    on_did_create_session: Emitter<Arc<ChatSession>>,
    on_did_select_session: Emitter<Arc<ChatSession>>,
}

impl Default for SessionDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionDirectory {
    pub fn new() -> Self {
        Self {
            null: Arc::new(ChatSession::null()),
            state: Mutex::new(DirectoryState::default()),
            on_did_create_session: Emitter::new(),
            on_did_select_session: Emitter::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, DirectoryState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!(target: "parley.session", "session directory lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    /// Create a session. It does not become current.
    pub fn new_session(&self) -> (SessionId, Arc<ChatSession>) {
        let id = SessionId::new();
        let session = Arc::new(ChatSession::new(id));
        self.lock().sessions.push(session.clone());

        tracing::debug!(target: "parley.session", session = %id, "session created");
        self.on_did_create_session.fire(&session);
        (id, session)
    }

    /// Make `id` current, or clear the selection with `None`.
    /// Returns the newly current session (the null session when cleared).
    pub fn select(&self, id: Option<SessionId>) -> Result<Arc<ChatSession>> {
        let session = {
            let mut state = self.lock();
            let session = match id {
                Some(id) => state
                    .find(id)
                    .ok_or_else(|| ParleyError::Session(format!("Unknown chat session: {}", id)))?,
                None => self.null.clone(),
            };
            state.current = id;
            session
        };

        tracing::debug!(target: "parley.session", session = %session.id(), "session selected");
        self.on_did_select_session.fire(&session);
        Ok(session)
    }

    /// The current session, or the null session if none is selected
    pub fn current_session(&self) -> Arc<ChatSession> {
        let state = self.lock();
        state
            .current
            .and_then(|id| state.find(id))
            .unwrap_or_else(|| self.null.clone())
    }

    pub fn current_id(&self) -> Option<SessionId> {
        self.lock().current
    }

    pub fn null_session(&self) -> Arc<ChatSession> {
        self.null.clone()
    }

    pub fn get(&self, id: SessionId) -> Option<Arc<ChatSession>> {
        self.lock().find(id)
    }

    /// Every session, in creation order
    pub fn sessions(&self) -> Vec<Arc<ChatSession>> {
        self.lock().sessions.clone()
    }

    pub fn on_did_create_session(
        &self,
        listener: impl Fn(&Arc<ChatSession>) + Send + Sync + 'static,
    ) -> Subscription {
        self.on_did_create_session.subscribe(listener)
    }

    pub fn on_did_select_session(
        &self,
        listener: impl Fn(&Arc<ChatSession>) + Send + Sync + 'static,
    ) -> Subscription {
        self.on_did_select_session.subscribe(listener)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_current_session_means_null() {
        let directory = SessionDirectory::new();
        assert!(directory.current_session().is_null());
        assert_eq!(directory.current_id(), None);
        assert!(directory.sessions().is_empty());
    }

    #[test]
    fn test_new_session_is_not_selected() {
        let directory = SessionDirectory::new();
        let created = Arc::new(Mutex::new(Vec::new()));
        let _subscription = {
            let created = created.clone();
            directory.on_did_create_session(move |s: &Arc<ChatSession>| {
                created.lock().unwrap().push(s.id())
            })
        };

        let (id, session) = directory.new_session();

        assert_eq!(session.id(), id);
        assert!(directory.current_session().is_null());
        assert_eq!(*created.lock().unwrap(), vec![id]);
        assert!(directory.get(id).is_some());
    }

    #[test]
    fn test_select_and_clear() {
        let directory = SessionDirectory::new();
        let (first, _) = directory.new_session();
        let (second, _) = directory.new_session();
        let selected = Arc::new(Mutex::new(Vec::new()));
        let _subscription = {
            let selected = selected.clone();
            directory.on_did_select_session(move |s: &Arc<ChatSession>| {
                selected.lock().unwrap().push(s.is_null())
            })
        };

        assert_eq!(directory.select(Some(second)).unwrap().id(), second);
        assert_eq!(directory.current_id(), Some(second));
        assert!(directory.select(None).unwrap().is_null());
        assert!(directory.current_session().is_null());

        let order: Vec<_> = directory.sessions().iter().map(|s| s.id()).collect();
        assert_eq!(order, vec![first, second]);
        assert_eq!(*selected.lock().unwrap(), vec![false, true]);
    }

    #[test]
    fn test_select_unknown_keeps_selection() {
        let directory = SessionDirectory::new();
        let (id, _) = directory.new_session();
        directory.select(Some(id)).unwrap();

        let err = directory.select(Some(SessionId::new())).unwrap_err();

        assert!(matches!(err, ParleyError::Session(_)));
        assert_eq!(directory.current_id(), Some(id));
    }

    #[test]
    fn test_null_session_is_shared() {
        let directory = SessionDirectory::new();
        directory.null_session().set_prompt("draft");
        assert_eq!(directory.current_session().prompt(), "draft");
    }
}
