//! Integration tests for configuration and snapshot types
//!
//! Exercises the public surface the way the loader and runner use it: raw
//! config text in, resolved credentials and durations out.

use std::time::Duration;

use basket_domain::{Config, Credentials, ErrorKind, ListSnapshot, SyncError};

#[test]
fn test_json_config_with_refresh_token() {
    let config: Config = serde_json::from_str(
        r#"{
            "service": { "timeout_seconds": 5 },
            "sync": { "enabled": false },
            "credentials": { "refresh_token": "rt-0" }
        }"#,
    )
    .expect("valid json config");

    assert_eq!(config.service.timeout(), Duration::from_secs(5));
    assert_eq!(config.service.api_version, "3");
    assert!(!config.sync.enabled);
    assert_eq!(config.sync.target_list_name, "Groceries");
    assert_eq!(config.credentials().expect("token mode"), Credentials::refresh_token("rt-0"));
}

#[test]
fn test_toml_config_without_credentials() {
    let config: Config = toml::from_str(
        r#"
[service]
base_url = "http://127.0.0.1:9000"

[sync]
refresh_interval_seconds = 60
"#,
    )
    .expect("valid toml config");

    assert_eq!(config.sync.refresh_interval(), Duration::from_secs(60));
    let err = config.credentials().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
    assert!(matches!(err, SyncError::Config(msg) if msg.contains("No credentials")));
}

#[test]
fn test_half_password_pair_rejected() {
    let config: Config =
        toml::from_str("[credentials]\npassword = \"pw\"\n").expect("valid toml config");
    let err = config.credentials().unwrap_err();
    assert!(err.to_string().contains("together"));
}

#[test]
fn test_snapshot_survives_json_round_trip() {
    let raw = r#"{"id":"L1","name":"Groceries","items":[
        {"id":"i1","name":"Milk","details":"","checked":false},
        {"id":"i2","name":"Bread","details":"sourdough","checked":true}
    ]}"#;

    let snapshot: ListSnapshot = serde_json::from_str(raw).expect("snapshot json");
    assert_eq!(snapshot.unchecked_count(), 1);
    assert_eq!(snapshot.item("i2").map(|i| i.details.as_str()), Some("sourdough"));

    let again: ListSnapshot =
        serde_json::from_str(&serde_json::to_string(&snapshot).expect("serialize")).expect("parse");
    assert_eq!(again, snapshot);
}
