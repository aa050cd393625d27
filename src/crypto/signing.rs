//! String-to-sign construction.
//!
//! The canonical string is newline-joined, no trailing newline:
//! ```text
//! GET
//! application/json; charset=UTF-8      (only when a content type is set)
//! Wed, 09 Jun 2021 16:08:15 GMT        (or the QUERY-mode expiry, e.g. 1623258495)
//! x-iwop-after:wq666                   (custom parameters, sorted by lowercased key)
//! x-iwop-before:wq666
//! /org-api/projects?limit=2&start=0    (resource, auth and custom keys removed, query sorted)
//! ```

use crate::crypto::mode::SignatureMode;
use crate::crypto::{CUSTOM_PREFIX, QUERY_ACCESS_ID, QUERY_EXPIRES, QUERY_SIGNATURE};
use crate::OpenApiError;
use http::{HeaderMap, Method};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::collections::BTreeMap;
use std::fmt;

/// Query keys reserved for QUERY-mode authentication; never part of the resource.
pub const RESERVED_QUERY_KEYS: [&str; 3] = [QUERY_ACCESS_ID, QUERY_SIGNATURE, QUERY_EXPIRES];

/// Bytes left literal when re-encoding query pairs: `A-Z a-z 0-9 - _ . ~`.
const QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Access id / secret key pair used to sign requests.
#[derive(Clone)]
pub struct Credentials {
    access_id: String,
    secret_key: String,
}

impl Credentials {
    /// Both values must be non-empty.
    pub fn new(
        access_id: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Result<Self, OpenApiError> {
        let access_id = access_id.into();
        let secret_key = secret_key.into();
        if access_id.is_empty() {
            return Err(OpenApiError::ConfigError(
                "access_id cannot be empty".to_string(),
            ));
        }
        if secret_key.is_empty() {
            return Err(OpenApiError::ConfigError(
                "secret_key cannot be empty".to_string(),
            ));
        }
        Ok(Self {
            access_id,
            secret_key,
        })
    }

    /// The public access id.
    pub fn access_id(&self) -> &str {
        &self.access_id
    }

    /// The HMAC key.
    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_id", &self.access_id)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

/// The parts of an outgoing request that take part in signing.
#[derive(Debug, Clone)]
pub struct SignatureRequest {
    method: Method,
    resource: String,
    has_body: bool,
    content_type: Option<String>,
    headers: HeaderMap,
}

impl SignatureRequest {
    /// A body-less request for `resource` (path + query, or a full URL).
    pub fn new(method: Method, resource: impl Into<String>) -> Self {
        Self {
            method,
            resource: resource.into(),
            has_body: false,
            content_type: None,
            headers: HeaderMap::new(),
        }
    }

    /// Request headers. A `content-type` header is used when no explicit
    /// content type was set.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Explicit content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Whether a non-empty body will be sent.
    pub fn with_body(mut self, has_body: bool) -> Self {
        self.has_body = has_body;
        self
    }

    /// HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Resource exactly as it will be sent.
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Whether a body will be sent.
    pub fn has_body(&self) -> bool {
        self.has_body
    }

    /// Request headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Effective content type; empty values count as absent.
    pub fn content_type(&self) -> Option<&str> {
        self.content_type
            .as_deref()
            .or_else(|| {
                self.headers
                    .get(http::header::CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
            })
            .filter(|ct| !ct.is_empty())
    }

    /// Reject a POST/PUT/PATCH that carries a body but no content type.
    pub fn validate(&self) -> Result<(), OpenApiError> {
        if requires_content_type(&self.method) && self.has_body && self.content_type().is_none() {
            return Err(OpenApiError::ValidationError(format!(
                "missing 'content-type' header: required for {} requests with a body",
                self.method
            )));
        }
        Ok(())
    }
}

/// Methods whose body must be described by a content type.
pub fn requires_content_type(method: &Method) -> bool {
    *method == Method::POST || *method == Method::PUT || *method == Method::PATCH
}

/// Immutable string to sign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalString(String);

impl CanonicalString {
    /// Borrow the string to sign.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Take ownership of the string to sign.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CanonicalString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CanonicalString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Build the canonical string for `request` signed at `time`.
///
/// `time` is the HTTP date (HEADER mode) or the decimal expiry (QUERY mode);
/// see [`crate::crypto::freshness::time_token`].
///
/// # Errors
/// * `ValidationError` - POST/PUT/PATCH with a body and no content type
pub fn build_canonical_string(
    request: &SignatureRequest,
    mode: &SignatureMode,
    time: &str,
) -> Result<CanonicalString, OpenApiError> {
    request.validate()?;

    let mut items: Vec<String> = Vec::new();
    items.push(request.method.as_str().to_uppercase());
    if let Some(content_type) = request.content_type() {
        items.push(content_type.to_string());
    }
    items.push(time.to_string());

    for (key, value) in custom_params(request, mode) {
        items.push(format!("{}:{}", key, value));
    }

    items.push(normalize_resource(&request.resource));

    Ok(CanonicalString(items.join("\n")))
}

/// Custom `x-iwop-*` parameters keyed by lowercased name, in ascending order.
///
/// HEADER mode reads the request headers (repeated values joined with `", "`);
/// QUERY mode reads the resource's query string.
pub fn custom_params(request: &SignatureRequest, mode: &SignatureMode) -> BTreeMap<String, String> {
    let mut params = BTreeMap::new();
    match mode {
        SignatureMode::Header => {
            for name in request.headers.keys() {
                let name = name.as_str().to_lowercase();
                if !name.starts_with(CUSTOM_PREFIX) {
                    continue;
                }
                let value = request
                    .headers
                    .get_all(name.as_str())
                    .iter()
                    .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
                    .collect::<Vec<_>>()
                    .join(", ");
                params.insert(name, value);
            }
        }
        SignatureMode::Query { .. } => {
            let parts = ResourceParts::split(&request.resource);
            for (key, value) in parse_query(parts.query.unwrap_or_default()) {
                let key = key.to_lowercase();
                if key.starts_with(CUSTOM_PREFIX) {
                    params.insert(key, value);
                }
            }
        }
    }
    params
}

/// Whether a query key is dropped from the signed resource.
pub fn is_excluded_query_key(key: &str) -> bool {
    RESERVED_QUERY_KEYS.contains(&key) || key.to_lowercase().starts_with(CUSTOM_PREFIX)
}

/// Normalize the resource that gets signed.
///
/// Drops auth-reserved keys (`AccessId`, `Signature`, `Expires`, exact match)
/// and `x-iwop-*` keys (any case), then re-encodes the remaining pairs sorted
/// by key. A resource without a query string is returned unchanged.
pub fn normalize_resource(resource: &str) -> String {
    let parts = ResourceParts::split(resource);
    let query = match parts.query {
        Some(q) if !q.is_empty() => q,
        _ => return resource.to_string(),
    };

    // Later duplicates overwrite earlier ones.
    let mut params: BTreeMap<String, String> = BTreeMap::new();
    for (key, value) in parse_query(query) {
        if is_excluded_query_key(&key) {
            continue;
        }
        params.insert(key, value);
    }

    let encoded = encode_query(params.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    parts.reassemble(&encoded)
}

/// A resource split into base, query and fragment.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ResourceParts<'a> {
    pub base: &'a str,
    pub query: Option<&'a str>,
    pub fragment: Option<&'a str>,
}

impl<'a> ResourceParts<'a> {
    pub fn split(resource: &'a str) -> Self {
        let (rest, fragment) = match resource.split_once('#') {
            Some((rest, fragment)) => (rest, Some(fragment)),
            None => (resource, None),
        };
        let (base, query) = match rest.split_once('?') {
            Some((base, query)) => (base, Some(query)),
            None => (rest, None),
        };
        Self {
            base,
            query,
            fragment,
        }
    }

    /// Rebuild with a new query; empty query and fragment are omitted.
    pub fn reassemble(&self, query: &str) -> String {
        let mut out = String::from(self.base);
        if !query.is_empty() {
            out.push('?');
            out.push_str(query);
        }
        if let Some(fragment) = self.fragment.filter(|f| !f.is_empty()) {
            out.push('#');
            out.push_str(fragment);
        }
        out
    }
}

/// Decode a form-urlencoded query string.
///
/// `+` is a space, percent escapes are decoded (invalid UTF-8 replaced),
/// and pairs with an empty value or without `=` are dropped.
pub fn parse_query(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter_map(|segment| segment.split_once('='))
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| (decode_component(key), decode_component(value)))
        .collect()
}

/// Form-urlencode pairs in the given order.
pub fn encode_query<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    pairs
        .into_iter()
        .map(|(key, value)| format!("{}={}", encode_component(key), encode_component(value)))
        .collect::<Vec<_>>()
        .join("&")
}

fn decode_component(s: &str) -> String {
    let s = s.replace('+', " ");
    percent_decode_str(&s).decode_utf8_lossy().into_owned()
}

fn encode_component(s: &str) -> String {
    // A literal "%20" in the input is escaped as "%2520", so only spaces map here.
    utf8_percent_encode(s, QUERY_ENCODE_SET)
        .to_string()
        .replace("%20", "+")
}
