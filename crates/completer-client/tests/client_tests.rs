//! Engine client facade with a user-defined engine binary
#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use completer_client::{AutocompleteRequest, ClientError, CompleterConfig, EngineClient};
use serde_json::json;
use serial_test::serial;

fn write_script(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("engine");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn client_for(dir: &Path, body: &str) -> EngineClient {
    let config = CompleterConfig {
        binary_path: Some(write_script(dir, body)),
        storage_path: dir.join("storage"),
        ..Default::default()
    };
    EngineClient::new(config).unwrap()
}

fn answering(reply: &str) -> String {
    format!("while IFS= read -r line; do echo '{reply}'; done")
}

const ECHO: &str = r#"while IFS= read -r line; do printf '%s\n' "$line"; done"#;

#[tokio::test]
#[serial]
async fn test_autocomplete_parses_typed_response() {
    let dir = tempfile::tempdir().unwrap();
    let client = client_for(
        dir.path(),
        &answering(
            r#"{"old_prefix":"pri","results":[{"new_prefix":"println!(","old_suffix":"","new_suffix":")","detail":"3%"}],"user_message":[]}"#,
        ),
    );

    let response = client
        .autocomplete(AutocompleteRequest::from_buffer("main.rs", "pri", 3))
        .await
        .unwrap();
    assert_eq!(response.old_prefix, "pri");
    assert_eq!(response.results.len(), 1);
    assert_eq!(response.results[0].label(), "println!()");
    assert_eq!(response.results[0].detail.as_deref(), Some("3%"));
}

#[tokio::test]
#[serial]
async fn test_requests_use_configured_protocol_version() {
    let dir = tempfile::tempdir().unwrap();
    let client = client_for(dir.path(), ECHO);

    let reply = client.open_hub().await.unwrap();
    assert_eq!(reply, json!({"version": "2.0.0", "request": {"Configuration": {}}}));

    let reply = client
        .request_version("1.0.7", &json!({"Prefetch": {"filename": "a.rs"}}))
        .await
        .unwrap();
    assert_eq!(reply["version"], "1.0.7");
}

#[tokio::test]
#[serial]
async fn test_config_dir_and_file() {
    let dir = tempfile::tempdir().unwrap();
    let client = client_for(
        dir.path(),
        &answering(
            r#"{"old_prefix":"","results":[{"new_prefix":"/home/dev/.config/TabNine","old_suffix":"","new_suffix":""}],"user_message":[]}"#,
        ),
    );

    assert_eq!(
        client.config_dir().await.unwrap(),
        PathBuf::from("/home/dev/.config/TabNine")
    );
    assert_eq!(
        client.config_file().await.unwrap(),
        PathBuf::from("/home/dev/.config/TabNine/tabnine_config.json")
    );
}

#[tokio::test]
#[serial]
async fn test_config_dir_without_results() {
    let dir = tempfile::tempdir().unwrap();
    let client = client_for(
        dir.path(),
        &answering(r#"{"old_prefix":"","results":[],"user_message":[]}"#),
    );

    assert!(matches!(
        client.config_dir().await,
        Err(ClientError::EmptyResponse(_))
    ));
}

#[tokio::test]
#[serial]
async fn test_unexpected_reply_shape_is_protocol_error() {
    let dir = tempfile::tempdir().unwrap();
    let client = client_for(dir.path(), &answering(r#"{"results":"nope"}"#));

    let err = client
        .autocomplete(AutocompleteRequest::from_buffer("a", "", 0))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::ProtocolError(_)));
}

#[tokio::test]
#[serial]
async fn test_user_defined_binary_is_never_updated() {
    let dir = tempfile::tempdir().unwrap();
    let client = client_for(dir.path(), ECHO);

    assert!(matches!(
        client.force_update(None).await,
        Err(ClientError::UserDefinedBinary(_))
    ));
    assert!(matches!(
        client.update(true, None).await,
        Err(ClientError::UserDefinedBinary(_))
    ));

    let path = client.ensure_installed(None).await.unwrap();
    assert_eq!(path, dir.path().join("engine"));
    assert!(!dir.path().join("storage").join("binaries").exists());
}

#[test]
fn test_missing_user_binary_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config = CompleterConfig {
        binary_path: Some(dir.path().join("missing")),
        ..Default::default()
    };
    assert!(matches!(
        EngineClient::new(config),
        Err(ClientError::BinaryPathMissing(_))
    ));
}
