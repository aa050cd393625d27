//! Legacy header-only signer for already-built `reqwest` requests.
//!
//! Older gateway deployments expect a simpler canonical resource: every
//! query pair is kept (auth and `x-iwop-*` keys included, duplicates too)
//! and pairs are stable-sorted by key. Only HEADER mode exists here.

use crate::clock::{Clock, SystemClock};
use crate::crypto::attach::authorization_value;
use crate::crypto::digest::sign;
use crate::crypto::freshness::{format_http_date, supplied_date};
use crate::crypto::mode::SignatureMode;
use crate::crypto::signing::{
    custom_params, encode_query, parse_query, Credentials, ResourceParts, SignatureRequest,
};
use crate::OpenApiError;
use http::header::{AUTHORIZATION, DATE};
use http::HeaderValue;
use std::sync::Arc;
use tracing::debug;

/// Signs a `reqwest::Request` in place.
#[derive(Clone)]
pub struct GatewayAuthenticator {
    credentials: Credentials,
    clock: Arc<dyn Clock>,
}

impl GatewayAuthenticator {
    /// Create an authenticator using the system clock.
    ///
    /// # Errors
    /// * `ConfigError` - empty access id or secret key
    pub fn new(
        access_id: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Result<Self, OpenApiError> {
        Ok(Self {
            credentials: Credentials::new(access_id, secret_key)?,
            clock: Arc::new(SystemClock),
        })
    }

    /// Create an authenticator with a custom clock (for testing).
    #[cfg(any(test, feature = "test-seams"))]
    pub fn with_clock(
        access_id: impl Into<String>,
        secret_key: impl Into<String>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, OpenApiError> {
        Ok(Self {
            credentials: Credentials::new(access_id, secret_key)?,
            clock,
        })
    }

    /// Add `date` (unless present) and `authorization` to `request`.
    ///
    /// Returns the string that was signed.
    ///
    /// # Errors
    /// * `ValidationError` - POST/PUT/PATCH with a body and no content type
    pub fn authenticate(&self, request: &mut reqwest::Request) -> Result<String, OpenApiError> {
        let has_body = request
            .body()
            .and_then(|b| b.as_bytes())
            .map(|bytes| !bytes.is_empty())
            .unwrap_or(request.body().is_some());

        let signature_request =
            SignatureRequest::new(request.method().clone(), request.url().as_str())
                .with_headers(request.headers().clone())
                .with_body(has_body);
        signature_request.validate()?;

        let date = match supplied_date(request.headers()) {
            Some(date) => date,
            None => {
                let date = format_http_date(self.clock.now_utc());
                request.headers_mut().insert(DATE, header_value(&date)?);
                date
            }
        };

        let mut items: Vec<String> = vec![request.method().as_str().to_uppercase()];
        if let Some(content_type) = signature_request.content_type() {
            items.push(content_type.to_string());
        }
        items.push(date);
        for (key, value) in custom_params(&signature_request, &SignatureMode::Header) {
            items.push(format!("{}:{}", key, value));
        }
        items.push(sorted_resource(request.url().as_str()));
        let canonical = items.join("\n");
        debug!(string_to_sign = ?canonical, "Built legacy string to sign");

        let signature = sign(&canonical, self.credentials.secret_key());
        request.headers_mut().insert(
            AUTHORIZATION,
            header_value(&authorization_value(self.credentials.access_id(), &signature))?,
        );
        Ok(canonical)
    }
}

impl std::fmt::Debug for GatewayAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayAuthenticator")
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

/// Resource with every query pair kept, stable-sorted by key.
pub fn sorted_resource(resource: &str) -> String {
    let parts = ResourceParts::split(resource);
    let mut pairs = parse_query(parts.query.unwrap_or_default());
    pairs.sort_by(|a, b| a.0.cmp(&b.0));
    let encoded = encode_query(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    parts.reassemble(&encoded)
}

fn header_value(value: &str) -> Result<HeaderValue, OpenApiError> {
    HeaderValue::from_str(value)
        .map_err(|e| OpenApiError::ValidationError(format!("invalid header value: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MockClock;
    use reqwest::{Method, Url};

    const SECRET: &str = "test-secret-key-0123456789";
    const DATE_VALUE: &str = "Wed, 09 Jun 2021 16:08:15 GMT";

    fn authenticator() -> GatewayAuthenticator {
        GatewayAuthenticator::with_clock(
            "test-access-id",
            SECRET,
            Arc::new(MockClock::from_http_date(DATE_VALUE)),
        )
        .unwrap()
    }

    fn request(method: Method, url: &str) -> reqwest::Request {
        reqwest::Request::new(method, Url::parse(url).unwrap())
    }

    #[test]
    fn test_sorted_resource_keeps_everything() {
        assert_eq!(sorted_resource("/p?b=2&a=1&b=1"), "/p?a=1&b=2&b=1");
        assert_eq!(
            sorted_resource("/p?Signature=s&x-iwop-k=v&a=1"),
            "/p?Signature=s&a=1&x-iwop-k=v"
        );
        assert_eq!(sorted_resource("/p"), "/p");
        assert_eq!(sorted_resource("/p?"), "/p");
    }

    #[test]
    fn test_authenticate_fixture() {
        let mut req = request(
            Method::GET,
            "https://api.example.com/org-api/projects?start=0&limit=2&Signature=abc",
        );
        let canonical = authenticator().authenticate(&mut req).unwrap();

        assert_eq!(
            canonical,
            "GET\nWed, 09 Jun 2021 16:08:15 GMT\nhttps://api.example.com/org-api/projects?Signature=abc&limit=2&start=0"
        );
        assert_eq!(req.headers()[DATE], DATE_VALUE);
        assert_eq!(
            req.headers()[AUTHORIZATION],
            "IWOP test-access-id:3AzmbfmCYxL1cpHZc+2S5p54gCk="
        );
    }

    #[test]
    fn test_authenticate_reuses_date() {
        let supplied = "Thu, 01 Jan 2015 00:00:00 GMT";
        let mut req = request(Method::GET, "https://api.example.com/x");
        req.headers_mut()
            .insert(DATE, HeaderValue::from_static(supplied));

        let canonical = authenticator().authenticate(&mut req).unwrap();
        assert!(canonical.contains(supplied));
        assert_eq!(req.headers().get_all(DATE).iter().count(), 1);
    }

    #[test]
    fn test_authenticate_rejects_body_without_content_type() {
        let mut req = request(Method::POST, "https://api.example.com/x");
        *req.body_mut() = Some(reqwest::Body::from("<body></body>"));

        let result = authenticator().authenticate(&mut req);
        assert!(matches!(result, Err(OpenApiError::ValidationError(_))));
        assert!(req.headers().get(AUTHORIZATION).is_none());
    }

    #[test]
    fn test_authenticate_empty_body_allowed() {
        let mut req = request(Method::POST, "https://api.example.com/x");
        *req.body_mut() = Some(reqwest::Body::from(""));
        assert!(authenticator().authenticate(&mut req).is_ok());
    }

    #[test]
    fn test_new_rejects_empty_credentials() {
        assert!(matches!(
            GatewayAuthenticator::new("", SECRET),
            Err(OpenApiError::ConfigError(_))
        ));
    }
}
