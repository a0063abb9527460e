use crate::error::{PromptError, Result};
use std::time::Duration;

/// Name of the routing file looked up at the root of a guild repository.
pub const ROUTING_FILE_NAME: &str = "PATH";

/// Configuration for the prompt resolution engine
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// How long a resolved template stays fresh in the cache. Default: 5 minutes.
    pub cache_ttl: Duration,

    /// Maximum number of cached templates across all guilds. Default: 10 000.
    pub cache_capacity: usize,

    /// Upper bound for a single remote file fetch. Default: 10 seconds.
    pub fetch_timeout: Duration,

    /// Base URL raw file content is fetched from.
    /// Default: https://raw.githubusercontent.com
    pub raw_base_url: String,

    /// Base URL used to build human-viewable links.
    /// Default: https://github.com
    pub web_base_url: String,

    /// Remote files larger than this are treated as absent. Default: 512 KiB.
    pub max_file_bytes: usize,

    /// Routing file looked up at repository root. Default: `PATH`.
    pub routing_file: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(300),
            cache_capacity: 10_000,
            fetch_timeout: Duration::from_secs(10),
            raw_base_url: "https://raw.githubusercontent.com".to_string(),
            web_base_url: "https://github.com".to_string(),
            max_file_bytes: 512 * 1024,
            routing_file: ROUTING_FILE_NAME.to_string(),
        }
    }
}

impl ResolverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn with_raw_base_url(mut self, url: impl Into<String>) -> Self {
        self.raw_base_url = url.into();
        self
    }

    pub fn with_web_base_url(mut self, url: impl Into<String>) -> Self {
        self.web_base_url = url.into();
        self
    }

    pub fn with_max_file_bytes(mut self, max: usize) -> Self {
        self.max_file_bytes = max;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.cache_ttl.is_zero() {
            return Err(PromptError::InvalidConfig("cache_ttl must be > 0".into()));
        }

        if self.cache_capacity == 0 {
            return Err(PromptError::InvalidConfig(
                "cache_capacity must be > 0".into(),
            ));
        }

        if self.fetch_timeout.is_zero() {
            return Err(PromptError::InvalidConfig(
                "fetch_timeout must be > 0".into(),
            ));
        }

        if self.max_file_bytes == 0 {
            return Err(PromptError::InvalidConfig(
                "max_file_bytes must be > 0".into(),
            ));
        }

        for (name, url) in [
            ("raw_base_url", &self.raw_base_url),
            ("web_base_url", &self.web_base_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(PromptError::InvalidConfig(format!(
                    "{name} must be an http(s) URL, got '{url}'"
                )));
            }
        }

        if self.routing_file.trim().is_empty() {
            return Err(PromptError::InvalidConfig(
                "routing_file must not be empty".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ResolverConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.routing_file, "PATH");
        assert_eq!(config.cache_ttl, Duration::from_secs(300));
    }

    #[test]
    fn zero_ttl_rejected() {
        let config = ResolverConfig::new().with_cache_ttl(Duration::ZERO);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("cache_ttl"), "{err}");
    }

    #[test]
    fn non_http_base_rejected() {
        let config = ResolverConfig::new().with_raw_base_url("ftp://example.com");
        assert!(config.validate().is_err());
    }
}
