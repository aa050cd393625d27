//! Async gateway client built on `reqwest`.
//!
//! Same signing and error handling as [`OpenApiClient`](crate::OpenApiClient).
//! `max_in_flight` bounds concurrent requests with a semaphore; a slot is
//! held from signing until the response body is consumed.

use crate::client::option::RequestOption;
use crate::client::result::AsyncRequestResult;
use crate::client::{default_headers, gateway_failure, ClientCore};
use crate::clock::{Clock, SystemClock};
use crate::config::ClientConfig;
use crate::OpenApiError;
use http::header::CONTENT_TYPE;
use http::Method;
use reqwest::{Client, Url};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info};

/// Async client for the open API gateway.
#[derive(Clone)]
pub struct AsyncOpenApiClient {
    client: Client,
    core: ClientCore,
    in_flight: Option<Arc<Semaphore>>,
}

impl AsyncOpenApiClient {
    /// Create a client from config.
    ///
    /// # Errors
    /// * `ConfigError` - empty credentials, zero timeout, zero `max_in_flight`
    ///   or bad base URL
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
        let in_flight = config.max_in_flight.map(|n| Arc::new(Semaphore::new(n)));
        info!(
            base_url = %core.base_url(),
            max_in_flight = ?config.max_in_flight,
            "Created async gateway client"
        );
        Ok(Self {
            client,
            core,
            in_flight,
        })
    }

    /// Gateway base URL.
    pub fn base_url(&self) -> &Url {
        self.core.base_url()
    }

    /// Free in-flight slots, or `None` when unbounded.
    pub fn available_slots(&self) -> Option<usize> {
        self.in_flight.as_ref().map(|s| s.available_permits())
    }

    /// `GET api_path`.
    pub async fn get(
        &self,
        api_path: &str,
        option: &RequestOption,
    ) -> Result<AsyncRequestResult, OpenApiError> {
        self.request(Method::GET, api_path, option).await
    }

    /// `POST api_path`.
    pub async fn post(
        &self,
        api_path: &str,
        option: &RequestOption,
    ) -> Result<AsyncRequestResult, OpenApiError> {
        self.request(Method::POST, api_path, option).await
    }

    /// `PUT api_path`.
    pub async fn put(
        &self,
        api_path: &str,
        option: &RequestOption,
    ) -> Result<AsyncRequestResult, OpenApiError> {
        self.request(Method::PUT, api_path, option).await
    }

    /// `PATCH api_path`.
    pub async fn patch(
        &self,
        api_path: &str,
        option: &RequestOption,
    ) -> Result<AsyncRequestResult, OpenApiError> {
        self.request(Method::PATCH, api_path, option).await
    }

    /// `DELETE api_path`.
    pub async fn delete(
        &self,
        api_path: &str,
        option: &RequestOption,
    ) -> Result<AsyncRequestResult, OpenApiError> {
        self.request(Method::DELETE, api_path, option).await
    }

    /// Sign and send a request with any method.
    ///
    /// # Errors
    /// Same as [`OpenApiClient::request`](crate::OpenApiClient::request).
    pub async fn request(
        &self,
        method: Method,
        api_path: &str,
        option: &RequestOption,
    ) -> Result<AsyncRequestResult, OpenApiError> {
        let permit = match &self.in_flight {
            Some(semaphore) => Some(semaphore.clone().acquire_owned().await.map_err(|e| {
                OpenApiError::ConfigError(format!("in-flight limiter closed: {}", e))
            })?),
            None => None,
        };

        // Signed after the slot is acquired so the date or expiry is fresh
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

        let response = builder.send().await?;
        let status = response.status();
        debug!(status = status.as_u16(), "Gateway responded");

        if status.is_client_error() || status.is_server_error() {
            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(String::from);
            let body = response.bytes().await?;
            return Err(gateway_failure(
                status.as_u16(),
                content_type.as_deref(),
                &body,
            ));
        }

        Ok(AsyncRequestResult::new(response, permit))
    }
}

impl std::fmt::Debug for AsyncOpenApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncOpenApiClient")
            .field("base_url", &self.core.base_url().as_str())
            .field("available_slots", &self.available_slots())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ClientConfig {
        ClientConfig::new("https://api.example.com/", "test-access-id", "test-secret")
    }

    #[test]
    fn test_unbounded_by_default() {
        let client = AsyncOpenApiClient::new(config()).unwrap();
        assert_eq!(client.available_slots(), None);
    }

    #[test]
    fn test_bounded_slots() {
        let mut c = config();
        c.max_in_flight = Some(4);
        let client = AsyncOpenApiClient::new(c).unwrap();
        assert_eq!(client.available_slots(), Some(4));
    }

    #[test]
    fn test_zero_slots_rejected() {
        let mut c = config();
        c.max_in_flight = Some(0);
        assert!(matches!(
            AsyncOpenApiClient::new(c),
            Err(OpenApiError::ConfigError(_))
        ));
    }

    #[tokio::test]
    async fn test_validation_error_releases_slot() {
        let mut c = ClientConfig::new("http://127.0.0.1:1/", "id", "secret");
        c.max_in_flight = Some(1);
        let client = AsyncOpenApiClient::new(c).unwrap();
        let option = RequestOption::builder().content("<body></body>").build();

        let result = client.put("/x", &option).await;
        assert!(matches!(result, Err(OpenApiError::ValidationError(_))));
        assert_eq!(client.available_slots(), Some(1));
    }
}
