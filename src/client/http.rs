//! Blocking gateway client built on `reqwest::blocking`.
//!
//! Every call resolves the API path against the configured base URL, signs
//! the fully resolved URL in the requested mode, and turns gateway failures
//! into [`OpenApiError::GatewayResponse`].

use crate::client::option::RequestOption;
use crate::client::result::RequestResult;
use crate::client::{default_headers, gateway_failure, ClientCore};
use crate::clock::{Clock, SystemClock};
use crate::config::ClientConfig;
use crate::OpenApiError;
use http::header::CONTENT_TYPE;
use http::Method;
use reqwest::blocking::Client;
use reqwest::Url;
use std::sync::Arc;
use tracing::{debug, info};

/// Blocking client for the open API gateway.
///
/// Safe to share across threads; the underlying connection pool is reused.
#[derive(Clone)]
pub struct OpenApiClient {
    client: Client,
    core: ClientCore,
}

impl OpenApiClient {
    /// Create a client from config.
    ///
    /// # Errors
    /// * `ConfigError` - empty credentials, zero timeout or bad base URL
    /// * `Transport` - the HTTP client could not be built
    pub fn new(config: ClientConfig) -> Result<Self, OpenApiError> {
        Self::build(config, Arc::new(SystemClock))
    }

    /// Create a client with a custom clock (for testing).
    #[cfg(any(test, feature = "test-seams"))]
    pub fn with_clock(config: ClientConfig, clock: Arc<dyn Clock>) -> Result<Self, OpenApiError> {
        Self::build(config, clock)
    }

    fn build(config: ClientConfig, clock: Arc<dyn Clock>) -> Result<Self, OpenApiError> {
        let core = ClientCore::new(&config, clock)?;
        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(default_headers(&config)?)
            .build()?;
        info!(base_url = %core.base_url(), "Created gateway client");
        Ok(Self { client, core })
    }

    /// Gateway base URL.
    pub fn base_url(&self) -> &Url {
        self.core.base_url()
    }

    /// `GET api_path`.
    pub fn get(&self, api_path: &str, option: &RequestOption) -> Result<RequestResult, OpenApiError> {
        self.request(Method::GET, api_path, option)
    }

    /// `POST api_path`.
    pub fn post(&self, api_path: &str, option: &RequestOption) -> Result<RequestResult, OpenApiError> {
        self.request(Method::POST, api_path, option)
    }

    /// `PUT api_path`.
    pub fn put(&self, api_path: &str, option: &RequestOption) -> Result<RequestResult, OpenApiError> {
        self.request(Method::PUT, api_path, option)
    }

    /// `PATCH api_path`.
    pub fn patch(&self, api_path: &str, option: &RequestOption) -> Result<RequestResult, OpenApiError> {
        self.request(Method::PATCH, api_path, option)
    }

    /// `DELETE api_path`.
    pub fn delete(&self, api_path: &str, option: &RequestOption) -> Result<RequestResult, OpenApiError> {
        self.request(Method::DELETE, api_path, option)
    }

    /// Sign and send a request with any method.
    ///
    /// # Errors
    /// * `ValidationError` - the request cannot be signed (nothing is sent)
    /// * `Transport` - connection, timeout or body read failure
    /// * `GatewayResponse` - the gateway answered 4xx/5xx
    pub fn request(
        &self,
        method: Method,
        api_path: &str,
        option: &RequestOption,
    ) -> Result<RequestResult, OpenApiError> {
        let prepared = self.core.prepare(method, api_path, option)?;
        debug!(
            method = %prepared.method,
            url = %prepared.url,
            mode = ?prepared.signed.mode,
            "Sending signed request"
        );

        let mut builder = self
            .client
            .request(prepared.method, prepared.url)
            .headers(prepared.headers);
        if let Some(body) = prepared.body {
            builder = builder.body(body);
        }
        if let Some(timeout) = prepared.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send()?;
        let status = response.status();
        debug!(status = status.as_u16(), "Gateway responded");

        if status.is_client_error() || status.is_server_error() {
            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(String::from);
            let body = response.bytes()?;
            return Err(gateway_failure(
                status.as_u16(),
                content_type.as_deref(),
                &body,
            ));
        }

        Ok(RequestResult::new(response))
    }
}

impl std::fmt::Debug for OpenApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenApiClient")
            .field("base_url", &self.core.base_url().as_str())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config() -> ClientConfig {
        ClientConfig::new("https://api.example.com/", "test-access-id", "test-secret")
    }

    #[test]
    fn test_client_creation() {
        let client = OpenApiClient::new(config()).unwrap();
        assert_eq!(client.base_url().as_str(), "https://api.example.com/");
    }

    #[test]
    fn test_client_rejects_bad_config() {
        let mut c = config();
        c.timeout = Duration::ZERO;
        assert!(matches!(
            OpenApiClient::new(c),
            Err(OpenApiError::ConfigError(_))
        ));
    }

    #[test]
    fn test_client_rejects_bad_language() {
        let mut c = config();
        c.accept_language = "zh\nCN".to_string();
        assert!(matches!(
            OpenApiClient::new(c),
            Err(OpenApiError::ConfigError(_))
        ));
    }

    #[test]
    fn test_validation_error_before_network() {
        // Unroutable base URL: reaching the network would surface as Transport
        let c = ClientConfig::new("http://127.0.0.1:1/", "id", "secret");
        let client = OpenApiClient::new(c).unwrap();
        let option = RequestOption::builder().content("<body></body>").build();

        let result = client.post("/x", &option);
        assert!(matches!(result, Err(OpenApiError::ValidationError(_))));
    }

    #[test]
    fn test_debug_hides_credentials() {
        let client = OpenApiClient::new(config()).unwrap();
        let debug = format!("{:?}", client);
        assert!(debug.contains("api.example.com"));
        assert!(!debug.contains("test-secret"));
    }
}
