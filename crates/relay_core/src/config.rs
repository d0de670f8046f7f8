//! Runtime configuration
//!
//! Loaded from an optional `config.toml` in the working directory, then
//! overridden by environment variables.

use serde::{Deserialize, Serialize};
use std::time::Duration;

const CONFIG_FILE_PATH: &str = "config.toml";

const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 120;

/// Which upstream backend the relay forwards to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UpstreamMode {
    /// Direct OpenAI-compatible completion API.
    #[default]
    Direct,
    /// External flow-execution service addressed by flow id.
    Flow,
}

impl UpstreamMode {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "direct" => Some(Self::Direct),
            "flow" => Some(Self::Flow),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default)]
    pub upstream_mode: UpstreamMode,
    pub api_base: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub flow_id: Option<String>,
    #[serde(default = "default_upstream_timeout_secs")]
    pub upstream_timeout_secs: u64,
    #[serde(default = "default_streaming")]
    pub default_streaming: bool,
    #[serde(default)]
    pub session_tokens: Vec<String>,
}

fn default_upstream_timeout_secs() -> u64 {
    DEFAULT_UPSTREAM_TIMEOUT_SECS
}

fn default_streaming() -> bool {
    true
}

fn parse_bool_env(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            upstream_mode: UpstreamMode::Direct,
            api_base: None,
            api_key: None,
            model: None,
            flow_id: None,
            upstream_timeout_secs: DEFAULT_UPSTREAM_TIMEOUT_SECS,
            default_streaming: true,
            session_tokens: Vec::new(),
        }
    }
}

impl RelayConfig {
    /// Load configuration: file first, environment variables win.
    ///
    /// Environment variables:
    /// - `UPSTREAM_MODE`: `direct` or `flow`
    /// - `UPSTREAM_API_BASE`, `UPSTREAM_API_KEY`, `UPSTREAM_MODEL`
    /// - `UPSTREAM_FLOW_ID`: flow id for `flow` mode
    /// - `UPSTREAM_TIMEOUT_SECS`: upstream timeout (default: 120)
    /// - `RELAY_DEFAULT_STREAMING`: default delivery mode (default: true)
    /// - `RELAY_SESSION_TOKENS`: comma-separated accepted session tokens
    pub fn new() -> Self {
        let mut config = RelayConfig::default();

        if std::path::Path::new(CONFIG_FILE_PATH).exists() {
            if let Ok(content) = std::fs::read_to_string(CONFIG_FILE_PATH) {
                if let Ok(file_config) = toml::from_str::<RelayConfig>(&content) {
                    config = file_config;
                }
            }
        }

        if let Ok(mode) = std::env::var("UPSTREAM_MODE") {
            if let Some(mode) = UpstreamMode::parse(&mode) {
                config.upstream_mode = mode;
            }
        }
        if let Ok(api_base) = std::env::var("UPSTREAM_API_BASE") {
            config.api_base = Some(api_base);
        }
        if let Ok(api_key) = std::env::var("UPSTREAM_API_KEY") {
            config.api_key = Some(api_key);
        }
        if let Ok(model) = std::env::var("UPSTREAM_MODEL") {
            config.model = Some(model);
        }
        if let Ok(flow_id) = std::env::var("UPSTREAM_FLOW_ID") {
            config.flow_id = Some(flow_id);
        }
        if let Ok(secs) = std::env::var("UPSTREAM_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse() {
                config.upstream_timeout_secs = secs;
            }
        }
        if let Ok(streaming) = std::env::var("RELAY_DEFAULT_STREAMING") {
            config.default_streaming = parse_bool_env(&streaming);
        }
        if let Ok(tokens) = std::env::var("RELAY_SESSION_TOKENS") {
            config.session_tokens = tokens
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect();
        }

        config
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }
}
