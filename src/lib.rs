// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Parley - streaming chat core for editor assistants.
//!
//! The crate holds everything behind a chat panel except the panel itself:
//! - `llm`: wire decoding, the provider trait, echo/OpenAI/Anthropic adapters
//! - `chat`: sessions, the assistant registry, the session directory and the
//!   `AssistantService` that ties them together
//! - `config`: model settings feeding the provider factory
//!
//! A host creates an [`AssistantService`], registers assistants (directly or
//! through [`AssistantService::load_models`]), subscribes to session
//! notifications and calls `send`/`submit`.

pub mod chat;
pub mod config;
pub mod error;
pub mod llm;
pub mod logging;

pub use chat::AssistantService;
pub use error::{ParleyError, Result};
