// ABOUTME: Mock server configuration: the logical hosts each endpoint family answers on
// ABOUTME: Builder API for tests, plus TOML file loading with environment overrides for the binary

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for one mock server instance.
///
/// Only `host` is required. The other hosts fall back along a chain:
/// key manager and agent default to `host`, session auth defaults to the
/// agent host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockConfig {
    /// Pod host; also answers the unauthenticated echo
    pub host: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub km_host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_auth_host: Option<String>,
    /// Seed the queue with one "Hello World" message
    #[serde(default = "default_true")]
    pub start_with_hello_world_message: bool,
    /// Interface the loopback listeners bind to
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

/// Every logical host after defaults have been applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedHosts {
    pub host: String,
    pub km_host: String,
    pub agent_host: String,
    pub session_auth_host: String,
}

fn default_true() -> bool {
    true
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_host() -> String {
    "localhost".to_string()
}

impl MockConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            km_host: None,
            agent_host: None,
            session_auth_host: None,
            start_with_hello_world_message: default_true(),
            bind_address: default_bind_address(),
        }
    }

    pub fn with_km_host(mut self, host: impl Into<String>) -> Self {
        self.km_host = Some(host.into());
        self
    }

    pub fn with_agent_host(mut self, host: impl Into<String>) -> Self {
        self.agent_host = Some(host.into());
        self
    }

    pub fn with_session_auth_host(mut self, host: impl Into<String>) -> Self {
        self.session_auth_host = Some(host.into());
        self
    }

    pub fn with_hello_world_message(mut self, enabled: bool) -> Self {
        self.start_with_hello_world_message = enabled;
        self
    }

    pub fn with_bind_address(mut self, addr: impl Into<String>) -> Self {
        self.bind_address = addr.into();
        self
    }

    pub fn resolved_hosts(&self) -> ResolvedHosts {
        let km_host = self.km_host.clone().unwrap_or_else(|| self.host.clone());
        let agent_host = self.agent_host.clone().unwrap_or_else(|| self.host.clone());
        let session_auth_host = self
            .session_auth_host
            .clone()
            .unwrap_or_else(|| agent_host.clone());
        ResolvedHosts {
            host: self.host.clone(),
            km_host,
            agent_host,
            session_auth_host,
        }
    }

    /// Reject blank hosts and bind addresses
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            anyhow::bail!("host is required (set in symphony-mock.toml or SYMPHONY_MOCK_HOST)");
        }
        let optional = [
            ("km_host", &self.km_host),
            ("agent_host", &self.agent_host),
            ("session_auth_host", &self.session_auth_host),
        ];
        for (name, value) in optional {
            if matches!(value, Some(v) if v.trim().is_empty()) {
                anyhow::bail!("{} must not be empty when set", name);
            }
        }
        if self.bind_address.trim().is_empty() {
            anyhow::bail!("bind_address must not be empty");
        }
        Ok(())
    }

    /// Find the config file, checking in order:
    /// 1. SYMPHONY_MOCK_CONFIG_PATH env var (if set and present)
    /// 2. ./symphony-mock.toml
    fn find_config_file() -> Option<PathBuf> {
        if let Ok(env_path) = std::env::var("SYMPHONY_MOCK_CONFIG_PATH") {
            let path = PathBuf::from(&env_path);
            if path.exists() {
                return Some(path);
            }
        }

        let local_config = PathBuf::from("symphony-mock.toml");
        if local_config.exists() {
            return Some(local_config);
        }

        None
    }

    /// Load configuration from a TOML file with environment variable overrides
    pub fn load() -> Result<Self> {
        let mut config = if let Some(config_path) = Self::find_config_file() {
            tracing::info!(
                path = %config_path.display(),
                "Loading configuration from file"
            );
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read {}", config_path.display()))?;
            toml::from_str::<MockConfig>(&content)
                .with_context(|| format!("Failed to parse {}", config_path.display()))?
        } else {
            tracing::info!("No config file found, using environment variables and defaults");
            MockConfig::new(default_host())
        };

        if let Ok(val) = std::env::var("SYMPHONY_MOCK_HOST") {
            config.host = val;
        }
        if let Ok(val) = std::env::var("SYMPHONY_MOCK_KM_HOST") {
            config.km_host = Some(val);
        }
        if let Ok(val) = std::env::var("SYMPHONY_MOCK_AGENT_HOST") {
            config.agent_host = Some(val);
        }
        if let Ok(val) = std::env::var("SYMPHONY_MOCK_SESSION_AUTH_HOST") {
            config.session_auth_host = Some(val);
        }
        if let Ok(val) = std::env::var("SYMPHONY_MOCK_HELLO_WORLD") {
            config.start_with_hello_world_message = val.parse().with_context(|| {
                format!("SYMPHONY_MOCK_HELLO_WORLD must be true or false, got: {}", val)
            })?;
        }
        if let Ok(val) = std::env::var("SYMPHONY_MOCK_BIND_ADDRESS") {
            config.bind_address = val;
        }

        config.validate()?;
        Ok(config)
    }
}
