// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! LLM module for Parley
//!
//! Provides the provider abstraction, the vendor implementations, and the
//! incremental decoder their streamed responses go through.

pub mod decoder;
pub mod factory;
pub mod message;
pub mod provider;
pub mod providers;

pub use message::*;
pub use provider::*;
