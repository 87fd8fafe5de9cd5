//! Tests for error types

use xai_study::{Error, StudyConfig};

#[test]
fn test_session_not_found_error() {
    let error = Error::SessionNotFound("abc-123".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("Session not found"));
    assert!(error_str.contains("abc-123"));
    assert!(error_str.contains("POST /v1/sessions"));
}

#[test]
fn test_insufficient_data_error() {
    let error = Error::InsufficientData("need two rows".to_string());
    assert!(format!("{error}").contains("Insufficient data: need two rows"));
}

#[test]
fn test_storage_error() {
    let error = Error::StorageError("rename failed".to_string());
    assert!(format!("{error}").contains("Storage error"));
}

#[test]
fn test_invalid_input_error() {
    let error = Error::InvalidInput("bad".to_string());
    assert_eq!(format!("{error}"), "Invalid input: bad");
}

#[test]
fn test_io_error_conversion() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    let error: Error = io.into();
    assert!(matches!(error, Error::Io(_)));
    assert!(format!("{error}").contains("IO error"));
}

#[test]
fn test_config_error_conversion() {
    let result = StudyConfig::from_toml_str("sample_size = \"five\"");
    let error = result.unwrap_err();
    assert!(matches!(error, Error::Config(_)));
    assert!(format!("{error}").starts_with("Config error"));
}

#[test]
fn test_json_error_conversion() {
    let error: Error = serde_json::from_str::<u32>("nope").unwrap_err().into();
    assert!(matches!(error, Error::Json(_)));
}

#[test]
fn test_error_debug() {
    let error = Error::SessionNotFound("x".to_string());
    assert!(format!("{error:?}").contains("SessionNotFound"));
}
