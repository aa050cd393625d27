//! Per-request options.

use crate::crypto::mode::SignatureMode;
use serde_json::Value;
use std::time::Duration;

/// Default content type for JSON bodies.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=UTF-8";

/// Request body.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// Serialized as JSON; content type defaults to [`JSON_CONTENT_TYPE`].
    Json(Value),
    /// Raw bytes; a content type must be set for POST/PUT/PATCH.
    Content(Vec<u8>),
}

/// Immutable options for one request. Build with [`RequestOption::builder`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOption {
    signed_by: SignatureMode,
    timeout: Option<Duration>,
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    content_type: Option<String>,
    body: Option<RequestBody>,
}

impl RequestOption {
    /// Start building options.
    pub fn builder() -> RequestOptionBuilder {
        RequestOptionBuilder::default()
    }

    /// Signing mode (HEADER unless set).
    pub fn signed_by(&self) -> SignatureMode {
        self.signed_by
    }

    /// Per-request timeout overriding the client default.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Query pairs to append, in insertion order.
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    /// Extra headers, in insertion order.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Explicit content type.
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Request body.
    pub fn body(&self) -> Option<&RequestBody> {
        self.body.as_ref()
    }
}

/// Builder for [`RequestOption`].
///
/// Setting the same query key or header name twice keeps the last value.
#[derive(Debug, Clone, Default)]
pub struct RequestOptionBuilder {
    option: RequestOption,
}

impl RequestOptionBuilder {
    /// Choose HEADER or QUERY signing.
    pub fn signed_by(mut self, mode: SignatureMode) -> Self {
        self.option.signed_by = mode;
        self
    }

    /// Per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.option.timeout = Some(timeout);
        self
    }

    /// Add a query pair.
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        upsert(&mut self.option.query, key.into(), value.to_string(), false);
        self
    }

    /// Add several query pairs.
    pub fn queries<K, V, I>(mut self, pairs: I) -> Self
    where
        K: Into<String>,
        V: ToString,
        I: IntoIterator<Item = (K, V)>,
    {
        for (key, value) in pairs {
            upsert(&mut self.option.query, key.into(), value.to_string(), false);
        }
        self
    }

    /// Add a header. Names compare case-insensitively.
    pub fn header(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        upsert(&mut self.option.headers, name.into(), value.to_string(), true);
        self
    }

    /// Add several headers.
    pub fn headers<K, V, I>(mut self, pairs: I) -> Self
    where
        K: Into<String>,
        V: ToString,
        I: IntoIterator<Item = (K, V)>,
    {
        for (name, value) in pairs {
            upsert(&mut self.option.headers, name.into(), value.to_string(), true);
        }
        self
    }

    /// Content type of the body.
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.option.content_type = Some(content_type.into());
        self
    }

    /// JSON body.
    pub fn json(mut self, body: Value) -> Self {
        self.option.body = Some(RequestBody::Json(body));
        self
    }

    /// Raw body.
    pub fn content(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.option.body = Some(RequestBody::Content(body.into()));
        self
    }

    /// Finish.
    pub fn build(self) -> RequestOption {
        self.option
    }
}

fn upsert(pairs: &mut Vec<(String, String)>, key: String, value: String, ignore_case: bool) {
    let existing = pairs.iter_mut().find(|(k, _)| {
        if ignore_case {
            k.eq_ignore_ascii_case(&key)
        } else {
            *k == key
        }
    });
    match existing {
        Some(pair) => pair.1 = value,
        None => pairs.push((key, value)),
    }
}
