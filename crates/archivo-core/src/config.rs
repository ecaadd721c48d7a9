//! Configuration module
//!
//! Client settings are read from the environment (with `.env` support), the
//! same way for the CLI and any embedding application.

use std::env;
use std::time::Duration;

const DEFAULT_API_URL: &str = "http://localhost:8000/api";
const REQUEST_TIMEOUT_SECS: u64 = 60;
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// HTTP client configuration.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub base_url: String,
    pub token: Option<String>,
    /// Applies to list, lookup and create calls.
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    /// Whole-request limit for uploads. `None` lets large media take as long as needed.
    pub upload_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            token: None,
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            upload_timeout: None,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// ARCHIVO_API_URL (or API_URL), ARCHIVO_API_TOKEN (or API_TOKEN),
    /// ARCHIVO_REQUEST_TIMEOUT_SECS, ARCHIVO_CONNECT_TIMEOUT_SECS, ARCHIVO_UPLOAD_TIMEOUT_SECS.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let base_url = env::var("ARCHIVO_API_URL")
            .or_else(|_| env::var("API_URL"))
            .unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        let token = env::var("ARCHIVO_API_TOKEN")
            .or_else(|_| env::var("API_TOKEN"))
            .ok()
            .filter(|t| !t.trim().is_empty());

        let request_timeout =
            parse_secs("ARCHIVO_REQUEST_TIMEOUT_SECS")?.unwrap_or(REQUEST_TIMEOUT_SECS);
        let connect_timeout =
            parse_secs("ARCHIVO_CONNECT_TIMEOUT_SECS")?.unwrap_or(CONNECT_TIMEOUT_SECS);
        let upload_timeout = parse_secs("ARCHIVO_UPLOAD_TIMEOUT_SECS")?
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        let config = Self {
            base_url,
            token,
            request_timeout: Duration::from_secs(request_timeout),
            connect_timeout: Duration::from_secs(connect_timeout),
            upload_timeout,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(anyhow::anyhow!(
                "ARCHIVO_API_URL must start with http:// or https:// (got '{}')",
                self.base_url
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(anyhow::anyhow!(
                "ARCHIVO_REQUEST_TIMEOUT_SECS must be greater than 0"
            ));
        }
        Ok(())
    }
}

fn parse_secs(key: &str) -> Result<Option<u64>, anyhow::Error> {
    match env::var(key) {
        Ok(raw) if raw.trim().is_empty() => Ok(None),
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("{} must be a whole number of seconds: {}", key, e)),
        Err(_) => Ok(None),
    }
}

fn parse_bool(key: &str) -> Option<bool> {
    env::var(key)
        .ok()
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}

/// Behaviour switches for one upload session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionOptions {
    /// Recreate dropped folder structure as remote directories.
    pub preserve_folders: bool,
    /// Refuse admission while the existing-asset index is not fresh.
    pub block_on_stale_index: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            preserve_folders: true,
            block_on_stale_index: false,
        }
    }
}

impl SessionOptions {
    /// ARCHIVO_PRESERVE_FOLDERS, ARCHIVO_BLOCK_ON_STALE_INDEX
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            preserve_folders: parse_bool("ARCHIVO_PRESERVE_FOLDERS")
                .unwrap_or(defaults.preserve_folders),
            block_on_stale_index: parse_bool("ARCHIVO_BLOCK_ON_STALE_INDEX")
                .unwrap_or(defaults.block_on_stale_index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:8000/api");
        assert_eq!(config.request_timeout, Duration::from_secs(60));
        assert!(config.upload_timeout.is_none());
        assert!(config.validate().is_ok());

        let options = SessionOptions::default();
        assert!(options.preserve_folders);
        assert!(!options.block_on_stale_index);
    }

    #[test]
    fn rejects_non_http_url() {
        let config = ClientConfig::new("ftp://example.com");
        assert!(config.validate().is_err());
    }
}
