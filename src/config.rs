//! Client configuration.

use crate::OpenApiError;
use reqwest::Url;
use std::time::Duration;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default `Accept-Language` sent with every request.
pub const DEFAULT_ACCEPT_LANGUAGE: &str = "zh-CN";

/// Configuration for an API gateway client.
///
/// Holds the gateway base URL and the access id / secret key pair used to
/// sign every request. One config produces one client handle; the pair is
/// never mutated after construction.
#[derive(Clone)]
pub struct ClientConfig {
    /// Gateway base URL (e.g. `https://api.example.com/`).
    /// API paths passed to the client are joined against it.
    pub base_url: String,

    /// Access id issued by the gateway.
    pub access_id: String,

    /// Secret key paired with `access_id`. Used as the HMAC key.
    pub secret_key: String,

    /// Default timeout for a whole request.
    pub timeout: Duration,

    /// `Accept-Language` header value.
    pub accept_language: String,

    /// Upper bound on concurrent in-flight requests (async client only).
    pub max_in_flight: Option<usize>,
}

impl ClientConfig {
    /// Create a config with default timeout and language.
    pub fn new(
        base_url: impl Into<String>,
        access_id: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            access_id: access_id.into(),
            secret_key: secret_key.into(),
            timeout: DEFAULT_TIMEOUT,
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
            max_in_flight: None,
        }
    }

    /// Validate configuration for obvious errors.
    pub fn validate(&self) -> Result<(), OpenApiError> {
        if self.access_id.is_empty() {
            return Err(OpenApiError::ConfigError(
                "access_id cannot be empty".to_string(),
            ));
        }
        if self.secret_key.is_empty() {
            return Err(OpenApiError::ConfigError(
                "secret_key cannot be empty".to_string(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(OpenApiError::ConfigError(
                "timeout must be greater than zero".to_string(),
            ));
        }
        if self.max_in_flight == Some(0) {
            return Err(OpenApiError::ConfigError(
                "max_in_flight must be greater than zero".to_string(),
            ));
        }
        self.parsed_base_url()?;
        Ok(())
    }

    /// Parse `base_url`.
    pub fn parsed_base_url(&self) -> Result<Url, OpenApiError> {
        Url::parse(&self.base_url).map_err(|e| {
            OpenApiError::ConfigError(format!("invalid base_url {:?}: {}", self.base_url, e))
        })
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("access_id", &self.access_id)
            .field("secret_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("accept_language", &self.accept_language)
            .field("max_in_flight", &self.max_in_flight)
            .finish()
    }
}
