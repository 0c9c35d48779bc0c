// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Error types for Parley
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Main error type for Parley operations
#[derive(Error, Debug)]
pub enum ParleyError {
    /// API-related errors
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Configuration errors (no assistant registered or selected, unknown ids)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Session errors
    #[error("Session error: {0}")]
    Session(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// API-specific error types
#[derive(Error, Debug)]
pub enum ApiError {
    /// Network connectivity error
    #[error("Network error: {0}")]
    Network(String),

    /// API returned a non-success status
    #[error("API error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// Successful response without a body to stream
    #[error("Response body is empty")]
    MissingBody,

    /// Streaming error
    #[error("Streaming error: {0}")]
    StreamError(String),

    /// A `data:` line whose payload could not be parsed
    #[error("Error parsing chunk `{line}`: {message}")]
    Decode { line: String, message: String },
}

/// Result type alias for Parley operations
pub type Result<T> = std::result::Result<T, ParleyError>;

impl ParleyError {
    /// Whether this error was raised before any work started (selection or
    /// configuration problems rather than a failed generation)
    pub fn is_config(&self) -> bool {
        matches!(self, ParleyError::Config(_))
    }
}
