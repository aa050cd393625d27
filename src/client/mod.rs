//! HTTP clients that sign every request for the gateway.

pub mod async_http;
pub mod http;
pub mod option;
pub mod result;

use crate::clock::Clock;
use crate::config::ClientConfig;
use crate::crypto::attach::Attachment;
use crate::crypto::pipeline::{generate_signature, SignedResult};
use crate::crypto::signing::{Credentials, SignatureRequest};
use crate::protocol::gateway_error::{decode_error, GatewayError};
use crate::OpenApiError;
use ::http::header::{HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE};
use ::http::{HeaderMap, Method};
use option::{RequestBody, RequestOption, JSON_CONTENT_TYPE};
use reqwest::Url;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// `Accept` sent with every request.
pub const ACCEPT_VALUE: &str = "application/json, application/xml, */*";

/// A request that has been resolved and signed, ready to hand to reqwest.
#[derive(Debug)]
pub(crate) struct PreparedRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
    pub timeout: Option<Duration>,
    pub signed: SignedResult,
}

/// State shared by the blocking and async clients.
#[derive(Clone)]
pub(crate) struct ClientCore {
    base_url: Url,
    credentials: Credentials,
    clock: Arc<dyn Clock>,
}

impl ClientCore {
    pub fn new(config: &ClientConfig, clock: Arc<dyn Clock>) -> Result<Self, OpenApiError> {
        config.validate()?;
        Ok(Self {
            base_url: config.parsed_base_url()?,
            credentials: Credentials::new(config.access_id.as_str(), config.secret_key.as_str())?,
            clock,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve the URL, assemble headers and body, and sign.
    pub fn prepare(
        &self,
        method: Method,
        api_path: &str,
        option: &RequestOption,
    ) -> Result<PreparedRequest, OpenApiError> {
        let mut url = self.base_url.join(api_path).map_err(|e| {
            OpenApiError::ValidationError(format!("invalid api path {:?}: {}", api_path, e))
        })?;
        if !option.query().is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in option.query() {
                pairs.append_pair(key, value);
            }
        }

        let mut headers = HeaderMap::new();
        for (name, value) in option.headers() {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                OpenApiError::ValidationError(format!("invalid header name {:?}: {}", name, e))
            })?;
            headers.insert(name, header_value(value)?);
        }

        let (body, content_type) = match option.body() {
            Some(RequestBody::Json(value)) => {
                let bytes = serde_json::to_vec(value).map_err(|e| {
                    OpenApiError::ValidationError(format!("failed to serialize JSON body: {}", e))
                })?;
                let content_type = option.content_type().unwrap_or(JSON_CONTENT_TYPE);
                (Some(bytes), Some(content_type))
            }
            Some(RequestBody::Content(bytes)) => (Some(bytes.clone()), option.content_type()),
            None => (None, option.content_type()),
        };
        if let Some(content_type) = content_type {
            headers.insert(CONTENT_TYPE, header_value(content_type)?);
        }

        let has_body = body.as_ref().is_some_and(|b| !b.is_empty());
        let signature_request = SignatureRequest::new(method.clone(), url.as_str())
            .with_headers(headers.clone())
            .with_body(has_body);
        let signed = generate_signature(
            &option.signed_by(),
            &self.credentials,
            &signature_request,
            self.clock.as_ref(),
        )?;

        match &signed.attachment {
            Attachment::Headers(extra) => {
                for (name, value) in extra {
                    headers.insert(name.clone(), value.clone());
                }
            }
            Attachment::Query(extra) => {
                let mut pairs = url.query_pairs_mut();
                for (key, value) in extra {
                    pairs.append_pair(key, value);
                }
            }
        }

        Ok(PreparedRequest {
            method,
            url,
            headers,
            body,
            timeout: option.timeout(),
            signed,
        })
    }
}

/// Headers every client sends regardless of the request.
pub(crate) fn default_headers(config: &ClientConfig) -> Result<HeaderMap, OpenApiError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_VALUE));
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_str(&config.accept_language).map_err(|e| {
            OpenApiError::ConfigError(format!("invalid accept_language: {}", e))
        })?,
    );
    Ok(headers)
}

/// Turn a failed response into `GatewayResponse`.
///
/// Undecodable bodies (proxy error pages, empty bodies) fall back to the raw
/// body as the message.
pub(crate) fn gateway_failure(status: u16, content_type: Option<&str>, body: &[u8]) -> OpenApiError {
    let error = decode_error(body, content_type).unwrap_or_else(|e| {
        warn!(status, error = %e, "Undecodable gateway error body, using raw body");
        GatewayError::from_raw_body(status, &String::from_utf8_lossy(body))
    });
    OpenApiError::GatewayResponse { status, error }
}

fn header_value(value: &str) -> Result<HeaderValue, OpenApiError> {
    HeaderValue::from_str(value)
        .map_err(|e| OpenApiError::ValidationError(format!("invalid header value {:?}: {}", value, e)))
}
