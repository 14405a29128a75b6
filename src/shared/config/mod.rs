//! Application configuration module
//!
//! Client-side configuration: where the board API lives and where its
//! realtime socket lives. The socket URL defaults to the server URL with the
//! scheme swapped (`http` → `ws`, `https` → `wss`) and `/ws` appended.

use thiserror::Error;

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Base URL of the HTTP API, without a trailing slash
    pub server_url: String,
    /// Full URL of the realtime WebSocket endpoint
    pub ws_url: String,
}

impl AppConfig {
    /// Create a new AppConfigBuilder
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.server_url.starts_with("http://") || self.server_url.starts_with("https://")) {
            return Err(ConfigError::InvalidUrl(self.server_url.clone()));
        }
        if !(self.ws_url.starts_with("ws://") || self.ws_url.starts_with("wss://")) {
            return Err(ConfigError::InvalidUrl(self.ws_url.clone()));
        }
        Ok(())
    }

    /// Absolute URL for an API path such as `/api/boards`
    pub fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.server_url, path)
    }
}

/// Builder for AppConfig
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    server_url: Option<String>,
    ws_url: Option<String>,
}

impl AppConfigBuilder {
    /// Set the server URL
    pub fn server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = Some(url.into());
        self
    }

    /// Override the WebSocket URL
    pub fn ws_url(mut self, url: impl Into<String>) -> Self {
        self.ws_url = Some(url.into());
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<AppConfig, ConfigError> {
        let server_url = self
            .server_url
            .ok_or(ConfigError::MissingValue("server_url"))?
            .trim_end_matches('/')
            .to_string();
        let ws_url = match self.ws_url {
            Some(url) => url,
            None => derive_ws_url(&server_url)?,
        };
        let config = AppConfig { server_url, ws_url };
        config.validate()?;
        Ok(config)
    }
}

fn derive_ws_url(server_url: &str) -> Result<String, ConfigError> {
    if let Some(rest) = server_url.strip_prefix("https://") {
        Ok(format!("wss://{}/ws", rest))
    } else if let Some(rest) = server_url.strip_prefix("http://") {
        Ok(format!("ws://{}/ws", rest))
    } else {
        Err(ConfigError::InvalidUrl(server_url.to_string()))
    }
}

/// Configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("missing value: {0}")]
    MissingValue(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ws_url_is_derived() {
        let config = AppConfig::builder()
            .server_url("https://boards.example.com/")
            .build()
            .unwrap();
        assert_eq!(config.server_url, "https://boards.example.com");
        assert_eq!(config.ws_url, "wss://boards.example.com/ws");
        assert_eq!(config.api_url("/api/boards"), "https://boards.example.com/api/boards");
    }

    #[test]
    fn test_explicit_ws_url_wins() {
        let config = AppConfig::builder()
            .server_url("http://localhost:3000")
            .ws_url("ws://localhost:4000/socket")
            .build()
            .unwrap();
        assert_eq!(config.ws_url, "ws://localhost:4000/socket");
    }

    #[test]
    fn test_rejects_bad_values() {
        assert_eq!(
            AppConfig::builder().build(),
            Err(ConfigError::MissingValue("server_url"))
        );
        assert!(matches!(
            AppConfig::builder().server_url("ftp://x").build(),
            Err(ConfigError::InvalidUrl(_))
        ));
        assert!(matches!(
            AppConfig::builder()
                .server_url("http://x")
                .ws_url("http://x/ws")
                .build(),
            Err(ConfigError::InvalidUrl(_))
        ));
    }
}
