// ABOUTME: Tests for configuration loading and validation
// ABOUTME: Verifies TOML parsing, env var overrides, defaults, and rejection of bad values

use serial_test::serial;
use std::io::Write;
use symphony_mock::MockConfig;

/// Helper to clear all config-related env vars
fn clear_config_env_vars() {
    for var in [
        "SYMPHONY_MOCK_CONFIG_PATH",
        "SYMPHONY_MOCK_HOST",
        "SYMPHONY_MOCK_KM_HOST",
        "SYMPHONY_MOCK_AGENT_HOST",
        "SYMPHONY_MOCK_SESSION_AUTH_HOST",
        "SYMPHONY_MOCK_HELLO_WORLD",
        "SYMPHONY_MOCK_BIND_ADDRESS",
    ] {
        std::env::remove_var(var);
    }
}

fn write_config(dir: &tempfile::TempDir, content: &str) -> std::path::PathBuf {
    let path = dir.path().join("symphony-mock.toml");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    path
}

#[test]
#[serial]
fn test_config_loads_from_toml_file() {
    clear_config_env_vars();
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        r#"
host = "pod.example.com"
km_host = "km.example.com"
agent_host = "agent.example.com"
start_with_hello_world_message = false
"#,
    );
    std::env::set_var("SYMPHONY_MOCK_CONFIG_PATH", &path);

    let config = MockConfig::load().unwrap();
    assert_eq!(config.host, "pod.example.com");
    assert_eq!(config.km_host.as_deref(), Some("km.example.com"));
    assert_eq!(config.agent_host.as_deref(), Some("agent.example.com"));
    assert_eq!(config.session_auth_host, None);
    assert!(!config.start_with_hello_world_message);
    assert_eq!(config.bind_address, "127.0.0.1");

    let hosts = config.resolved_hosts();
    assert_eq!(hosts.session_auth_host, "agent.example.com");

    clear_config_env_vars();
}

#[test]
#[serial]
fn test_env_vars_override_file() {
    clear_config_env_vars();
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, r#"host = "pod.example.com""#);
    std::env::set_var("SYMPHONY_MOCK_CONFIG_PATH", &path);
    std::env::set_var("SYMPHONY_MOCK_HOST", "override.example.com");
    std::env::set_var("SYMPHONY_MOCK_SESSION_AUTH_HOST", "auth.example.com");
    std::env::set_var("SYMPHONY_MOCK_HELLO_WORLD", "false");

    let config = MockConfig::load().unwrap();
    assert_eq!(config.host, "override.example.com");
    assert_eq!(config.session_auth_host.as_deref(), Some("auth.example.com"));
    assert!(!config.start_with_hello_world_message);

    clear_config_env_vars();
}

#[test]
#[serial]
fn test_missing_file_uses_defaults() {
    clear_config_env_vars();
    std::env::set_var("SYMPHONY_MOCK_CONFIG_PATH", "/nonexistent/symphony-mock.toml");

    let config = MockConfig::load().unwrap();
    assert!(!config.host.is_empty());
    assert!(config.start_with_hello_world_message);

    clear_config_env_vars();
}

#[test]
#[serial]
fn test_invalid_hello_world_flag_is_rejected() {
    clear_config_env_vars();
    std::env::set_var("SYMPHONY_MOCK_CONFIG_PATH", "/nonexistent/symphony-mock.toml");
    std::env::set_var("SYMPHONY_MOCK_HELLO_WORLD", "sometimes");

    let err = MockConfig::load().unwrap_err();
    assert!(err.to_string().contains("SYMPHONY_MOCK_HELLO_WORLD"));

    clear_config_env_vars();
}

#[test]
#[serial]
fn test_blank_host_is_rejected() {
    clear_config_env_vars();
    std::env::set_var("SYMPHONY_MOCK_CONFIG_PATH", "/nonexistent/symphony-mock.toml");
    std::env::set_var("SYMPHONY_MOCK_HOST", "   ");

    assert!(MockConfig::load().is_err());

    clear_config_env_vars();
}

#[test]
#[serial]
fn test_malformed_toml_is_an_error() {
    clear_config_env_vars();
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "host = [not valid");
    std::env::set_var("SYMPHONY_MOCK_CONFIG_PATH", &path);

    let err = MockConfig::load().unwrap_err();
    assert!(err.to_string().contains("Failed to parse"));

    clear_config_env_vars();
}
