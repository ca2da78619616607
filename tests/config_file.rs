//! Integration tests for loading configuration from a TOML file.
//!
//! These tests exercise the flow: TOML file -> raw parse -> key resolution
//! -> final Config with KeySource metadata.
//!
//! Each test uses unique file paths and env var names to avoid parallel test interference.

use std::fs;
use std::path::Path;

use gemini_relay::config::{Config, ConfigError, ErrorMode, KeySource};

/// Test that ${VAR} references in api_key are expanded from environment.
#[test]
fn test_file_key_reference_resolves_var() {
    let var_name = "RELAY_E2E_FILE_KEY";
    let config_path = "/tmp/gemini_relay_e2e_expand.toml";

    unsafe { std::env::set_var(var_name, "AIza-from-env") };

    let toml_content = format!(
        r#"
[server]
listen = "127.0.0.1:19876"

[upstream]
model = "gemini-2.5-flash"
api_key = "${{{}}}"
"#,
        var_name
    );
    fs::write(config_path, toml_content).expect("Failed to write temp config");

    let raw = Config::load_raw(Some(Path::new(config_path))).unwrap();
    let (config, source) = Config::from_raw(raw).unwrap();

    assert_eq!(source, KeySource::EnvExpanded);
    assert_eq!(config.upstream.api_key.expose_secret(), "AIza-from-env");
    assert_eq!(config.server.listen, "127.0.0.1:19876");

    unsafe { std::env::remove_var(var_name) };
    let _ = fs::remove_file(config_path);
}

/// Test that a file without an api_key falls back to the credential lookup.
#[test]
fn test_file_without_key_uses_lookup() {
    let config_path = "/tmp/gemini_relay_e2e_nokey.toml";
    fs::write(
        config_path,
        r#"
[relay]
error_mode = "strict"
"#,
    )
    .expect("Failed to write temp config");

    let raw = Config::load_raw(Some(Path::new(config_path))).unwrap();
    let (config, source) = Config::from_raw_with(raw, |name| {
        (name == "GEMINI_API_KEY").then(|| "AIza-lookup".to_string())
    })
    .unwrap();

    assert_eq!(
        source,
        KeySource::Environment("GEMINI_API_KEY".to_string())
    );
    assert_eq!(config.upstream.api_key.expose_secret(), "AIza-lookup");
    assert_eq!(config.relay.error_mode, ErrorMode::Strict);

    let _ = fs::remove_file(config_path);
}

/// Test that an explicit config path that does not exist is an error.
#[test]
fn test_explicit_missing_file_fails() {
    let result = Config::load_raw(Some(Path::new(
        "/tmp/gemini_relay_definitely_missing_9f3c.toml",
    )));
    match result {
        Err(ConfigError::Io { path, .. }) => {
            assert!(path.contains("gemini_relay_definitely_missing_9f3c"))
        }
        other => panic!("expected Io error, got {:?}", other.map(|_| ())),
    }
}

/// Test that malformed TOML is reported as a parse error.
#[test]
fn test_malformed_file_fails() {
    let config_path = "/tmp/gemini_relay_e2e_malformed.toml";
    fs::write(config_path, "[server\nlisten = ").expect("Failed to write temp config");

    let result = Config::load_raw(Some(Path::new(config_path)));
    assert!(matches!(result, Err(ConfigError::Parse(_))));

    let _ = fs::remove_file(config_path);
}

/// Test that a missing credential aborts config resolution.
#[test]
fn test_missing_credential_is_fatal() {
    let config_path = "/tmp/gemini_relay_e2e_nocred.toml";
    fs::write(config_path, "[server]\nlisten = \"0.0.0.0:5001\"\n")
        .expect("Failed to write temp config");

    let raw = Config::load_raw(Some(Path::new(config_path))).unwrap();
    let err = Config::from_raw_with(raw, |_| None).unwrap_err();
    assert_eq!(err.to_string(), "GEMINI_API_KEY not set in environment");

    let _ = fs::remove_file(config_path);
}
