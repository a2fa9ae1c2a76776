use std::fmt;
use std::time::Duration;

use serde::Deserialize;

/// Connection settings for the remote MDM API.
#[derive(Clone, Deserialize)]
pub struct MdmClientConfig {
    /// Base URL every API path is appended to.
    pub base_url: String,

    /// Bearer credential sent as `Authorization`, if set.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Timeout for the whole streamed download.
    #[serde(default = "default_download_timeout_secs")]
    pub download_timeout_secs: u64,

    /// Retries for idempotent calls. Job creation is never retried.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    #[serde(default)]
    pub accept_invalid_certs: bool,
}

// Default value functions
fn default_timeout_secs() -> u64 {
    30
}
fn default_download_timeout_secs() -> u64 {
    300
}
fn default_max_retries() -> u32 {
    3
}
fn default_retry_backoff_ms() -> u64 {
    200
}

impl MdmClientConfig {
    /// Settings with defaults for everything but the base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
            download_timeout_secs: default_download_timeout_secs(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            accept_invalid_certs: false,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    /// Delay before retry number `attempt` (1-based): `backoff * 2^(attempt-1)`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.saturating_sub(1).min(16);
        Duration::from_millis(self.retry_backoff_ms.saturating_mul(factor))
    }
}

impl fmt::Debug for MdmClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MdmClientConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MdmClientConfig::new("https://mdm.example.com/api/v1");
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.download_timeout(), Duration::from_secs(300));
        assert_eq!(config.max_retries, 3);
        assert!(!config.accept_invalid_certs);
    }

    #[test]
    fn test_backoff_doubles() {
        let config = MdmClientConfig::new("http://localhost");
        assert_eq!(config.backoff(1), Duration::from_millis(200));
        assert_eq!(config.backoff(2), Duration::from_millis(400));
        assert_eq!(config.backoff(3), Duration::from_millis(800));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let mut config = MdmClientConfig::new("http://localhost");
        config.api_key = Some("super-secret".into());
        let debug = format!("{:?}", config);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }
}
