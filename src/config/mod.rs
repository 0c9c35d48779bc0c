// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Configuration module for Parley
//!
//! Handles loading and saving the model list assistants are built from.

pub mod settings;

pub use settings::*;
