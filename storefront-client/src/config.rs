//! Client configuration

use std::path::PathBuf;
use std::time::Duration;

/// Connection settings for the catalog API
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the backend API
    pub base_url: String,

    /// Per-request timeout
    pub timeout: Duration,

    /// Override for the token file location (None = per-user data dir)
    pub token_file: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout: Duration::from_secs(10),
            token_file: None,
        }
    }
}

impl ClientConfig {
    /// Build configuration from the environment, falling back to defaults
    ///
    /// Recognized variables: `STOREFRONT_API_URL`, `STOREFRONT_TIMEOUT_SECS`,
    /// `STOREFRONT_TOKEN_FILE`.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("STOREFRONT_API_URL") {
            if !url.is_empty() {
                config.base_url = url;
            }
        }
        if let Ok(secs) = std::env::var("STOREFRONT_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse::<u64>() {
                config.timeout = Duration::from_secs(secs);
            }
        }
        if let Ok(path) = std::env::var("STOREFRONT_TOKEN_FILE") {
            if !path.is_empty() {
                config.token_file = Some(PathBuf::from(path));
            }
        }

        config
    }
}
