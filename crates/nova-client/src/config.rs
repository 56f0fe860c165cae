use std::time::Duration;

use nova_core::AttachmentPolicy;
use serde::{Deserialize, Serialize};

/// Transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL for the completion API
    pub base_url: String,
    /// Bearer credential
    pub api_key: String,
    /// Model identifier sent with every request
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Completion token cap
    pub max_tokens: u32,
    /// Request timeout in seconds
    #[serde(with = "serde_duration", default = "default_timeout")]
    pub timeout: Duration,
    /// Which attachment types this deployment accepts
    #[serde(default)]
    pub attachment_policy: AttachmentPolicy,
}

impl ClientConfig {
    /// Create a config for a custom endpoint
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Set the API key
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = key.into();
        self
    }

    /// Set the model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the completion token cap
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the attachment policy
    pub fn with_attachment_policy(mut self, policy: AttachmentPolicy) -> Self {
        self.attachment_policy = policy;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.siliconflow.cn/v1".to_string(),
            api_key: String::new(),
            model: "Qwen/Qwen2.5-7B-Instruct".to_string(),
            temperature: 0.7,
            max_tokens: 2048,
            timeout: default_timeout(),
            attachment_policy: AttachmentPolicy::default(),
        }
    }
}

fn default_timeout() -> Duration {
    Duration::from_secs(60)
}

// Custom serialization for Duration
mod serde_duration {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = ClientConfig::new("https://example.com/v1")
            .with_api_key("sk-test")
            .with_model("Qwen/Qwen2.5-72B-Instruct")
            .with_temperature(0.2);

        assert_eq!(config.base_url, "https://example.com/v1");
        assert_eq!(config.api_key, "sk-test");
        assert_eq!(config.model, "Qwen/Qwen2.5-72B-Instruct");
        assert!((config.temperature - 0.2).abs() < 0.001);
    }
}
