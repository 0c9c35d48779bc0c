// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Chat session management
//!
//! Sessions, the assistant registry, the session directory and the service
//! that routes a prompt from one to the other.

pub mod directory;
pub mod events;
pub mod registry;
pub mod service;
pub mod session;

pub use directory::SessionDirectory;
pub use events::{Emitter, Subscription};
pub use registry::{AssistantInfo, AssistantRegistration, AssistantRegistry};
pub use service::{AssistantService, ContextProvider};
pub use session::{ChatSession, PendingResponse, SessionId, DEFAULT_SESSION_TITLE};
