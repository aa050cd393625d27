//! Successful responses.

use crate::OpenApiError;
use http::header::CONTENT_TYPE;
use http::HeaderMap;
use serde::de::DeserializeOwned;
use std::io::Read;
use tokio::sync::OwnedSemaphorePermit;

fn content_type_of(headers: &HeaderMap) -> &str {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

fn parse_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, OpenApiError> {
    serde_json::from_slice(body)
        .map_err(|e| OpenApiError::ResponseDecode(format!("invalid JSON response: {}", e)))
}

/// A 2xx/3xx response from the blocking client. The body is not read yet.
#[derive(Debug)]
pub struct RequestResult {
    response: reqwest::blocking::Response,
}

impl RequestResult {
    pub(crate) fn new(response: reqwest::blocking::Response) -> Self {
        Self { response }
    }

    /// HTTP status code.
    pub fn status(&self) -> u16 {
        self.response.status().as_u16()
    }

    /// Response headers.
    pub fn headers(&self) -> &HeaderMap {
        self.response.headers()
    }

    /// `Content-Type` of the response, or `""`.
    pub fn content_type(&self) -> &str {
        content_type_of(self.response.headers())
    }

    /// Read the whole body as text, decoded as UTF-8 (invalid bytes replaced).
    pub fn text(self) -> Result<String, OpenApiError> {
        Ok(self.response.text()?)
    }

    /// Read the whole body as raw bytes.
    pub fn bytes(self) -> Result<Vec<u8>, OpenApiError> {
        Ok(self.response.bytes()?.to_vec())
    }

    /// Read the whole body and deserialize it as JSON.
    ///
    /// # Errors
    /// * `Transport` - body read failure
    /// * `ResponseDecode` - the body is not valid JSON for `T`
    pub fn json<T: DeserializeOwned>(self) -> Result<T, OpenApiError> {
        let body = self.response.bytes()?;
        parse_json(&body)
    }

    /// Stream the body.
    pub fn into_reader(self) -> impl Read {
        self.response
    }
}

/// A 2xx/3xx response from the async client.
///
/// Holds the in-flight slot until the body is consumed or the result dropped.
#[derive(Debug)]
pub struct AsyncRequestResult {
    response: reqwest::Response,
    _permit: Option<OwnedSemaphorePermit>,
}

impl AsyncRequestResult {
    pub(crate) fn new(response: reqwest::Response, permit: Option<OwnedSemaphorePermit>) -> Self {
        Self {
            response,
            _permit: permit,
        }
    }

    /// HTTP status code.
    pub fn status(&self) -> u16 {
        self.response.status().as_u16()
    }

    /// Response headers.
    pub fn headers(&self) -> &HeaderMap {
        self.response.headers()
    }

    /// `Content-Type` of the response, or `""`.
    pub fn content_type(&self) -> &str {
        content_type_of(self.response.headers())
    }

    /// Read the whole body as text, decoded as UTF-8 (invalid bytes replaced).
    pub async fn text(self) -> Result<String, OpenApiError> {
        Ok(self.response.text().await?)
    }

    /// Read the whole body as raw bytes.
    pub async fn bytes(self) -> Result<Vec<u8>, OpenApiError> {
        Ok(self.response.bytes().await?.to_vec())
    }

    /// Read the whole body and deserialize it as JSON.
    pub async fn json<T: DeserializeOwned>(self) -> Result<T, OpenApiError> {
        let body = self.response.bytes().await?;
        parse_json(&body)
    }

    /// Next chunk of the body, or `None` at the end.
    pub async fn chunk(&mut self) -> Result<Option<Vec<u8>>, OpenApiError> {
        Ok(self.response.chunk().await?.map(|b| b.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;
    use serde_json::Value;

    #[test]
    fn test_content_type_of() {
        let mut headers = HeaderMap::new();
        assert_eq!(content_type_of(&headers), "");
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        assert_eq!(content_type_of(&headers), "application/json");
    }

    #[test]
    fn test_parse_json() {
        let value: Value = parse_json(br#"{"data":[1,2]}"#).unwrap();
        assert_eq!(value["data"][1], 2);
    }

    #[test]
    fn test_parse_json_invalid() {
        let result: Result<Value, _> = parse_json(b"<html>");
        assert!(matches!(result, Err(OpenApiError::ResponseDecode(_))));
    }
}
