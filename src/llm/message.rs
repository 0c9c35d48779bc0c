// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Message types for chat interactions
//!
//! Defines the message and request structures passed between sessions and
//! providers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A message in a chat history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier for the message
    pub id: Uuid,

    /// Role of the message sender
    pub role: Role,

    /// Text content of the message
    pub content: String,

    /// When the message was created
    pub timestamp: DateTime<Utc>,

    /// Error raised while this (assistant) message was being generated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Role of the message sender
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// User message
    User,
    /// Assistant response
    Assistant,
    /// System prompt
    System,
}

impl Message {
    fn with_role(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
            error: None,
        }
    }

    /// Create a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(Role::User, content)
    }

    /// Create a new assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(Role::Assistant, content)
    }

    /// Create a new system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(Role::System, content)
    }

    /// Check if the message carries no text
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Check if generation of this message failed
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::System => write!(f, "system"),
        }
    }
}

/// A request for a streamed chat response
///
/// Built fresh for every send. `history` is an owned copy, so a request in
/// flight never observes later edits to the session it came from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The prompt being submitted
    pub prompt: String,

    /// Messages exchanged before this prompt
    pub history: Vec<Message>,

    /// Snapshot of editor/environment state, forwarded opaquely to providers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Value>,
}

impl ChatRequest {
    /// Create a request with no history and no context
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            history: Vec::new(),
            context: None,
        }
    }

    /// Set the history
    pub fn with_history(mut self, history: Vec<Message>) -> Self {
        self.history = history;
        self
    }

    /// Set the environment context
    pub fn with_context(mut self, context: serde_json::Value) -> Self {
        self.context = Some(context);
        self
    }

    /// History with empty-content messages removed
    pub fn non_empty_history(&self) -> impl Iterator<Item = &Message> {
        self.history.iter().filter(|m| !m.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_constructors() {
        assert_eq!(Message::user("hi").role, Role::User);
        assert_eq!(Message::assistant("hi").role, Role::Assistant);
        assert_eq!(Message::system("hi").role, Role::System);
        assert_eq!(Message::user("hi").content, "hi");
    }

    #[test]
    fn test_message_ids_are_unique() {
        assert_ne!(Message::user("a").id, Message::user("a").id);
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&Role::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
        assert_eq!(Role::User.to_string(), "user");
    }

    #[test]
    fn test_error_marker_skipped_when_absent() {
        let json = serde_json::to_value(Message::assistant("done")).unwrap();
        assert!(json.get("error").is_none());

        let mut failed = Message::assistant("part");
        failed.error = Some("boom".to_string());
        assert!(failed.is_error());
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["error"], "boom");
    }

    #[test]
    fn test_request_non_empty_history() {
        let request = ChatRequest::new("next").with_history(vec![
            Message::user("q"),
            Message::assistant(""),
            Message::assistant("a"),
        ]);
        let kept: Vec<_> = request.non_empty_history().map(|m| m.content.as_str()).collect();
        assert_eq!(kept, vec!["q", "a"]);
    }

    #[test]
    fn test_request_context_optional() {
        let request = ChatRequest::new("hi");
        assert!(request.context.is_none());
        let request = request.with_context(serde_json::json!({"file": "main.rs"}));
        assert_eq!(request.context.unwrap()["file"], "main.rs");
    }
}
