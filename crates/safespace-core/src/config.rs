//! Remote service configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings for the remote classification/rewrite service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// OpenAI-compatible API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model name sent with every request
    #[serde(default = "default_model")]
    pub model: String,

    /// Bearer token; absent or empty means the remote path is disabled
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Hard timeout for one round trip
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_classify_max_tokens")]
    pub classify_max_tokens: u32,

    #[serde(default = "default_classify_temperature")]
    pub classify_temperature: f32,

    #[serde(default = "default_rewrite_max_tokens")]
    pub rewrite_max_tokens: u32,

    #[serde(default = "default_rewrite_temperature")]
    pub rewrite_temperature: f32,
}

impl RemoteConfig {
    /// Whether usable credentials are present
    pub fn has_credentials(&self) -> bool {
        self.api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Set the API key
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
            classify_max_tokens: default_classify_max_tokens(),
            classify_temperature: default_classify_temperature(),
            rewrite_max_tokens: default_rewrite_max_tokens(),
            rewrite_temperature: default_rewrite_temperature(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_model() -> String {
    "llama-3.1-8b-instant".to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_classify_max_tokens() -> u32 {
    100
}

fn default_classify_temperature() -> f32 {
    0.1
}

fn default_rewrite_max_tokens() -> u32 {
    150
}

fn default_rewrite_temperature() -> f32 {
    0.7
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials() {
        assert!(!RemoteConfig::default().has_credentials());
        assert!(!RemoteConfig::default().with_api_key("   ").has_credentials());
        assert!(RemoteConfig::default().with_api_key("gsk_test").has_credentials());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: RemoteConfig = serde_json::from_str(r#"{"model": "llama-3.3-70b"}"#).unwrap();

        assert_eq!(config.model, "llama-3.3-70b");
        assert_eq!(config.timeout(), Duration::from_secs(15));
        assert_eq!(config.classify_max_tokens, 100);
        assert!(config.api_key.is_none());
    }
}
