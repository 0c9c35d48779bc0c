// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

use std::io;
use parley::error::{ApiError, ParleyError};

#[test]
fn test_io_error_conversion() {
    let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
    let parley_error: ParleyError = io_error.into();

    match parley_error {
        ParleyError::Io(_) => {} // Expected
        _ => panic!("Expected Io error, got different error type"),
    }
}

#[test]
fn test_json_error_conversion() {
    let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let parley_error: ParleyError = json_error.into();
    assert!(matches!(parley_error, ParleyError::Json(_)));
}

#[test]
fn test_config_error_display() {
    let error = ParleyError::Config("No assistant selected".to_string());
    assert_eq!(error.to_string(), "Configuration error: No assistant selected");
    assert!(error.is_config());
}

#[test]
fn test_session_error_display() {
    let error = ParleyError::Session("busy".to_string());
    assert_eq!(error.to_string(), "Session error: busy");
    assert!(!error.is_config());
}

#[test]
fn test_api_server_error() {
    let error = ApiError::ServerError {
        status: 500,
        message: "Internal server error".to_string(),
    };
    assert_eq!(error.to_string(), "API error (500): Internal server error");
}

#[test]
fn test_api_missing_body_error() {
    assert_eq!(ApiError::MissingBody.to_string(), "Response body is empty");
}

#[test]
fn test_api_decode_error_names_the_line() {
    let error = ApiError::Decode {
        line: "data: {oops".to_string(),
        message: "key must be a string".to_string(),
    };
    assert_eq!(
        error.to_string(),
        "Error parsing chunk `data: {oops`: key must be a string"
    );
}

#[test]
fn test_api_error_wraps_into_parley_error() {
    let error: ParleyError = ApiError::StreamError("connection reset".to_string()).into();
    assert_eq!(
        error.to_string(),
        "API error: Streaming error: connection reset"
    );
}

#[test]
fn test_network_error_display() {
    let error = ApiError::Network("connection refused".to_string());
    assert_eq!(error.to_string(), "Network error: connection refused");
}

fn kind(error: &ParleyError) -> &'static str {
    match error {
        ParleyError::Api(_) => "api",
        ParleyError::Config(_) => "config",
        ParleyError::Session(_) => "session",
        ParleyError::Io(_) => "io",
        ParleyError::Json(_) => "json",
    }
}

#[tokio::test]
async fn test_every_error_kind_has_a_producer() {
    use parley::chat::{AssistantRegistry, ChatSession};
    use parley::config::Settings;
    use parley::llm::decoder::StreamDecoder;
    use std::sync::Arc;

    let dir = tempfile::TempDir::new().unwrap();

    let api = StreamDecoder::<serde_json::Value>::new()
        .feed(b"data: {broken\n")
        .pop()
        .unwrap()
        .unwrap_err();
    let config = AssistantRegistry::new().select("missing").unwrap_err();
    let session = Arc::new(ChatSession::null())
        .provide_chat_response(None, None)
        .await
        .unwrap_err();
    let io = Settings::load_from(dir.path()).unwrap_err();
    let json = Settings::from_json("{").unwrap_err();

    let kinds: Vec<_> = [&api, &config, &session, &io, &json]
        .into_iter()
        .map(kind)
        .collect();
    assert_eq!(kinds, vec!["api", "config", "session", "io", "json"]);
}
