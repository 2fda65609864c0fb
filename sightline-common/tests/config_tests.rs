//! Integration tests for configuration file loading and path resolution
//!
//! Tests that manipulate SIGHTLINE_CONFIG are marked with #[serial] so they
//! never run in parallel with each other.

use serial_test::serial;
use sightline_common::config::{resolve_config_path, TomlConfig, CONFIG_ENV_VAR};
use sightline_common::Error;
use std::env;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[test]
fn test_missing_file_is_not_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("absent.toml");

    let loaded = TomlConfig::load(&path).unwrap();
    assert!(loaded.is_none());
}

#[test]
fn test_load_full_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[server]
bind = "0.0.0.0:9000"

[database]
path = "/var/lib/sightline/test.db"

[logging]
level = "debug"

[validation]
min_distance_meters = 2500.0
reject_future = false
require_after_reference = true

[notifications]
dispatch_timeout_ms = 1500
template = "sighting_notification"

[smtp]
host = "localhost"
port = 1025
sender = "alerts@example.org"
starttls = false
"#,
    )
    .unwrap();

    let config = TomlConfig::load(&path).unwrap().expect("file exists");
    assert_eq!(config.server.bind, "0.0.0.0:9000");
    assert_eq!(
        config.database_path(),
        PathBuf::from("/var/lib/sightline/test.db")
    );
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.validation.min_distance_meters, 2500.0);
    assert!(!config.validation.reject_future);
    assert_eq!(config.notifications.dispatch_timeout_ms, 1500);

    let smtp = config.smtp.expect("smtp section");
    assert_eq!(smtp.port, 1025);
    assert!(!smtp.starttls);
}

#[test]
fn test_malformed_file_reports_path() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("broken.toml");
    std::fs::write(&path, "[validation\n").unwrap();

    match TomlConfig::load(&path) {
        Err(Error::Config(msg)) => assert!(msg.contains("broken.toml"), "message: {}", msg),
        other => panic!("expected config error, got {:?}", other),
    }
}

#[test]
#[serial]
fn test_cli_path_beats_environment() {
    env::set_var(CONFIG_ENV_VAR, "/from/env.toml");
    let resolved = resolve_config_path(Some(Path::new("/from/cli.toml")));
    env::remove_var(CONFIG_ENV_VAR);

    assert_eq!(resolved, Some(PathBuf::from("/from/cli.toml")));
}

#[test]
#[serial]
fn test_environment_path_used_without_cli() {
    env::set_var(CONFIG_ENV_VAR, "/from/env.toml");
    let resolved = resolve_config_path(None);
    env::remove_var(CONFIG_ENV_VAR);

    assert_eq!(resolved, Some(PathBuf::from("/from/env.toml")));
}
