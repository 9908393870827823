//! Client configuration loaded from the environment.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::rest::client::REQUEST_TIMEOUT;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Where upload commands are sent and how they identify the application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestEndpoint {
    /// Base server URL, e.g. `https://api.example.com/parse`
    pub server_url: String,
    pub application_id: String,
    pub client_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub endpoint: RestEndpoint,
    /// Session token sent with uploads
    pub session_token: Option<String>,
    /// Directory holding one cached file per file name
    pub cache_dir: PathBuf,
    pub request_timeout: Duration,
}

impl ClientConfig {
    pub fn new(endpoint: RestEndpoint) -> Self {
        Self {
            endpoint,
            session_token: None,
            cache_dir: default_cache_dir(),
            request_timeout: REQUEST_TIMEOUT,
        }
    }

    /// Load configuration from `CLOUDFILE_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let endpoint = RestEndpoint {
            server_url: required("CLOUDFILE_SERVER_URL")?,
            application_id: required("CLOUDFILE_APP_ID")?,
            client_key: lookup("CLOUDFILE_CLIENT_KEY").filter(|v| !v.is_empty()),
        };

        let mut config = Self::new(endpoint);
        config.session_token = lookup("CLOUDFILE_SESSION_TOKEN").filter(|v| !v.is_empty());

        if let Some(dir) = lookup("CLOUDFILE_CACHE_DIR").filter(|v| !v.is_empty()) {
            config.cache_dir = PathBuf::from(dir);
        }

        if let Some(value) = lookup("CLOUDFILE_TIMEOUT_SECS") {
            let secs: u64 = value.parse().map_err(|_| ConfigError::Invalid {
                name: "CLOUDFILE_TIMEOUT_SECS",
                value: value.clone(),
            })?;
            config.request_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

/// Platform cache directory for downloaded and uploaded files
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("cloudfile")
        .join("files")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_minimal_env() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("CLOUDFILE_SERVER_URL", "https://api.example.com/parse"),
            ("CLOUDFILE_APP_ID", "app"),
        ]))
        .unwrap();

        assert_eq!(config.endpoint.server_url, "https://api.example.com/parse");
        assert_eq!(config.endpoint.application_id, "app");
        assert_eq!(config.endpoint.client_key, None);
        assert_eq!(config.session_token, None);
        assert_eq!(config.cache_dir, default_cache_dir());
        assert_eq!(config.request_timeout, REQUEST_TIMEOUT);
    }

    #[test]
    fn test_full_env() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("CLOUDFILE_SERVER_URL", "https://api.example.com"),
            ("CLOUDFILE_APP_ID", "app"),
            ("CLOUDFILE_CLIENT_KEY", "key"),
            ("CLOUDFILE_SESSION_TOKEN", "r:abc"),
            ("CLOUDFILE_CACHE_DIR", "/var/cache/files"),
            ("CLOUDFILE_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();

        assert_eq!(config.endpoint.client_key.as_deref(), Some("key"));
        assert_eq!(config.session_token.as_deref(), Some("r:abc"));
        assert_eq!(config.cache_dir, PathBuf::from("/var/cache/files"));
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_missing_server_url() {
        let err = ClientConfig::from_lookup(lookup(&[("CLOUDFILE_APP_ID", "app")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("CLOUDFILE_SERVER_URL")));
    }

    #[test]
    fn test_invalid_timeout() {
        let err = ClientConfig::from_lookup(lookup(&[
            ("CLOUDFILE_SERVER_URL", "https://api.example.com"),
            ("CLOUDFILE_APP_ID", "app"),
            ("CLOUDFILE_TIMEOUT_SECS", "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "CLOUDFILE_TIMEOUT_SECS", .. }));
    }
}
