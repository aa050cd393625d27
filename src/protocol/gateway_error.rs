//! Gateway error bodies.
//!
//! The gateway reports rejections as a flat XML document:
//! ```xml
//! <Error>
//!   <Code>SIGNATURE_NOT_MATCH</Code>
//!   <Message>...</Message>
//!   <ClientIP>192.168.1.1</ClientIP>
//!   <StringToSign>...</StringToSign>
//! </Error>
//! ```
//! Every element becomes a `tag -> text` entry (later duplicates win).

use crate::OpenApiError;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Element name of the error code.
pub const PROP_CODE: &str = "Code";
/// Element name of the human-readable message.
pub const PROP_MESSAGE: &str = "Message";
/// Element name of the caller IP as seen by the gateway.
pub const PROP_CLIENT_IP: &str = "ClientIP";
/// Element name of the gateway's string-to-sign bytes.
pub const PROP_STRING_TO_SIGN_BYTES: &str = "StringToSignBytes";
/// Element name of the signature the gateway received.
pub const PROP_SIGNATURE_PROVIDED: &str = "SignatureProvided";
/// Element name of the gateway's string to sign.
pub const PROP_STRING_TO_SIGN: &str = "StringToSign";
/// Element name of the access id the gateway received.
pub const PROP_ACCESS_KEY_ID: &str = "AccessKeyId";

/// Structured diagnostics from a gateway rejection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GatewayError {
    #[serde(rename = "Code")]
    code: String,
    #[serde(rename = "Message")]
    message: String,
    #[serde(rename = "ClientIP", skip_serializing_if = "Option::is_none")]
    client_ip: Option<String>,
    #[serde(rename = "StringToSignBytes", skip_serializing_if = "Option::is_none")]
    string_to_sign_bytes: Option<String>,
    #[serde(rename = "SignatureProvided", skip_serializing_if = "Option::is_none")]
    signature_provided: Option<String>,
    #[serde(rename = "StringToSign", skip_serializing_if = "Option::is_none")]
    string_to_sign: Option<String>,
    #[serde(rename = "AccessKeyId", skip_serializing_if = "Option::is_none")]
    access_key_id: Option<String>,
    #[serde(skip)]
    properties: BTreeMap<String, String>,
}

impl GatewayError {
    /// Build from a tag map. Tags without text are absent.
    ///
    /// # Errors
    /// * `ParseError` - `Code` or `Message` missing
    pub fn from_properties(
        properties: BTreeMap<String, Option<String>>,
    ) -> Result<Self, OpenApiError> {
        let properties: BTreeMap<String, String> = properties
            .into_iter()
            .filter_map(|(k, v)| v.map(|v| (k, v)))
            .collect();
        let get = |name: &str| properties.get(name).cloned();
        let required = |name: &str| {
            get(name).ok_or_else(|| {
                OpenApiError::ParseError(format!("gateway error body has no <{}>", name))
            })
        };

        let code = required(PROP_CODE)?;
        let message = required(PROP_MESSAGE)?;
        let client_ip = get(PROP_CLIENT_IP);
        let string_to_sign_bytes = get(PROP_STRING_TO_SIGN_BYTES);
        let signature_provided = get(PROP_SIGNATURE_PROVIDED);
        let string_to_sign = get(PROP_STRING_TO_SIGN);
        let access_key_id = get(PROP_ACCESS_KEY_ID);

        Ok(Self {
            code,
            message,
            client_ip,
            string_to_sign_bytes,
            signature_provided,
            string_to_sign,
            access_key_id,
            properties,
        })
    }

    /// Generic error for a body that could not be decoded.
    ///
    /// Code is `HTTP_<status>`, message is the raw body.
    pub fn from_raw_body(status: u16, body: &str) -> Self {
        let code = format!("HTTP_{}", status);
        let mut properties = BTreeMap::new();
        properties.insert(PROP_CODE.to_string(), code.clone());
        properties.insert(PROP_MESSAGE.to_string(), body.to_string());
        Self {
            code,
            message: body.to_string(),
            client_ip: None,
            string_to_sign_bytes: None,
            signature_provided: None,
            string_to_sign: None,
            access_key_id: None,
            properties,
        }
    }

    /// Error code, e.g. `SERVICE_NOT_FOUND`.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Caller IP as seen by the gateway.
    pub fn client_ip(&self) -> Option<&str> {
        self.client_ip.as_deref()
    }

    /// Gateway's string to sign, as bytes rendering.
    pub fn string_to_sign_bytes(&self) -> Option<&str> {
        self.string_to_sign_bytes.as_deref()
    }

    /// Signature the gateway received.
    pub fn signature_provided(&self) -> Option<&str> {
        self.signature_provided.as_deref()
    }

    /// Gateway's string to sign. Compare against the client's canonical string
    /// when debugging signature mismatches.
    pub fn string_to_sign(&self) -> Option<&str> {
        self.string_to_sign.as_deref()
    }

    /// Access id the gateway received.
    pub fn access_key_id(&self) -> Option<&str> {
        self.access_key_id.as_deref()
    }

    /// Any other element of the body by tag name.
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => f.write_str(&json),
            Err(_) => write!(f, "{}: {}", self.code, self.message),
        }
    }
}

/// Decode a gateway error body.
///
/// JSON is used when `content_type` mentions `json`, or when no content type
/// is given and the body looks like a JSON object. Everything else is
/// parsed as XML.
///
/// # Errors
/// * `ParseError` - body is not well-formed, or lacks `Code` / `Message`
pub fn decode_error(payload: &[u8], content_type: Option<&str>) -> Result<GatewayError, OpenApiError> {
    let is_json = match content_type {
        Some(ct) => ct.to_ascii_lowercase().contains("json"),
        None => payload.iter().find(|b| !b.is_ascii_whitespace()) == Some(&b'{'),
    };
    let properties = if is_json {
        json_tag_map(payload)?
    } else {
        xml_tag_map(payload)?
    };
    GatewayError::from_properties(properties)
}

/// Map every element name to its own text (text before the first child).
pub fn xml_tag_map(payload: &[u8]) -> Result<BTreeMap<String, Option<String>>, OpenApiError> {
    let mut reader = Reader::from_reader(payload);

    // Elements in document order, so duplicates resolve the same way as a tree walk.
    let mut elements: Vec<(String, String)> = Vec::new();
    let mut has_text: Vec<bool> = Vec::new();
    // (index into `elements`, saw a child element)
    let mut open: Vec<(usize, bool)> = Vec::new();
    let mut root_done = false;

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) => {
                if root_done {
                    return Err(OpenApiError::ParseError(
                        "junk after document element".to_string(),
                    ));
                }
                if let Some(parent) = open.last_mut() {
                    parent.1 = true;
                }
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                elements.push((name, String::new()));
                has_text.push(false);
                open.push((elements.len() - 1, false));
            }
            Event::Empty(e) => {
                if root_done {
                    return Err(OpenApiError::ParseError(
                        "junk after document element".to_string(),
                    ));
                }
                if let Some(parent) = open.last_mut() {
                    parent.1 = true;
                }
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                elements.push((name, String::new()));
                has_text.push(false);
                if open.is_empty() {
                    root_done = true;
                }
            }
            Event::End(_) => {
                open.pop();
                if open.is_empty() {
                    root_done = true;
                }
            }
            Event::Text(e) => {
                let decoded = e.decode().map_err(|err| OpenApiError::ParseError(err.to_string()))?;
                let text = quick_xml::escape::unescape(&decoded)
                    .map_err(|err| OpenApiError::ParseError(err.to_string()))?;
                push_text(&mut elements, &mut has_text, &open, &text)?;
            }
            Event::CData(e) => {
                let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                push_text(&mut elements, &mut has_text, &open, &text)?;
            }
            Event::GeneralRef(e) => {
                let name = e.decode().map_err(|err| OpenApiError::ParseError(err.to_string()))?;
                let text = resolve_entity(&name)?;
                push_text(&mut elements, &mut has_text, &open, &text)?;
            }
            Event::Eof => break,
            // Declaration, comments, processing instructions, doctype.
            _ => {}
        }
    }

    if !open.is_empty() {
        return Err(OpenApiError::ParseError(
            "unexpected end of document: unclosed element".to_string(),
        ));
    }
    if elements.is_empty() {
        return Err(OpenApiError::ParseError(
            "no element found in error body".to_string(),
        ));
    }

    Ok(elements
        .into_iter()
        .zip(has_text)
        .map(|((name, text), has_text)| (name, has_text.then_some(text)))
        .collect())
}

fn push_text(
    elements: &mut [(String, String)],
    has_text: &mut [bool],
    open: &[(usize, bool)],
    text: &str,
) -> Result<(), OpenApiError> {
    match open.last() {
        Some(&(index, false)) => {
            elements[index].1.push_str(text);
            has_text[index] = true;
            Ok(())
        }
        // Tail text after a child element is not part of the parent's text.
        Some(_) => Ok(()),
        None if text.trim().is_empty() => Ok(()),
        None => Err(OpenApiError::ParseError(
            "text outside of the document element".to_string(),
        )),
    }
}

fn resolve_entity(name: &str) -> Result<String, OpenApiError> {
    if let Some(reference) = name.strip_prefix('#') {
        let code = match reference.strip_prefix('x').or_else(|| reference.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16),
            None => reference.parse::<u32>(),
        };
        return code
            .ok()
            .and_then(char::from_u32)
            .map(String::from)
            .ok_or_else(|| OpenApiError::ParseError(format!("invalid character reference &{};", name)));
    }
    quick_xml::escape::resolve_predefined_entity(name)
        .map(String::from)
        .ok_or_else(|| OpenApiError::ParseError(format!("undefined entity &{};", name)))
}

fn xml_error(err: quick_xml::Error) -> OpenApiError {
    OpenApiError::ParseError(format!("malformed XML: {}", err))
}

/// Map every key of a JSON object (recursively) to its scalar value.
pub fn json_tag_map(payload: &[u8]) -> Result<BTreeMap<String, Option<String>>, OpenApiError> {
    let value: Value = serde_json::from_slice(payload)
        .map_err(|e| OpenApiError::ParseError(format!("malformed JSON: {}", e)))?;
    let Value::Object(_) = value else {
        return Err(OpenApiError::ParseError(
            "JSON error body is not an object".to_string(),
        ));
    };

    let mut map = BTreeMap::new();
    collect_json(&value, &mut map);
    Ok(map)
}

fn collect_json(value: &Value, map: &mut BTreeMap<String, Option<String>>) {
    match value {
        Value::Object(object) => {
            for (key, child) in object {
                let text = match child {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    Value::Bool(b) => Some(b.to_string()),
                    Value::Null | Value::Object(_) | Value::Array(_) => None,
                };
                map.insert(key.clone(), text);
                collect_json(child, map);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_json(item, map);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOT_FOUND: &str = "<Error><Code>SERVICE_NOT_FOUND</Code><Message>service not found</Message><ClientIP>192.168.1.1</ClientIP></Error>";

    #[test]
    fn test_decode_service_not_found() {
        let error = decode_error(NOT_FOUND.as_bytes(), Some("application/xml")).unwrap();
        assert_eq!(error.code(), "SERVICE_NOT_FOUND");
        assert_eq!(error.message(), "service not found");
        assert_eq!(error.client_ip(), Some("192.168.1.1"));
        assert_eq!(error.signature_provided(), None);
        assert_eq!(error.access_key_id(), None);
    }

    #[test]
    fn test_decode_signature_mismatch_diagnostics() {
        let body = r#"<?xml version="1.0" encoding="UTF-8"?>
<Error>
  <Code>SIGNATURE_NOT_MATCH</Code>
  <Message>signature does not match</Message>
  <ClientIP>10.0.0.7</ClientIP>
  <StringToSign>GET&#10;Wed, 09 Jun 2021 16:08:15 GMT&#10;/x?a=1&amp;b=2</StringToSign>
  <StringToSignBytes>47 45 54</StringToSignBytes>
  <SignatureProvided>abc=</SignatureProvided>
  <AccessKeyId>test-access-id</AccessKeyId>
  <RequestId>req-1</RequestId>
</Error>"#;
        let error = decode_error(body.as_bytes(), None).unwrap();
        assert_eq!(error.code(), "SIGNATURE_NOT_MATCH");
        assert_eq!(
            error.string_to_sign(),
            Some("GET\nWed, 09 Jun 2021 16:08:15 GMT\n/x?a=1&b=2")
        );
        assert_eq!(error.string_to_sign_bytes(), Some("47 45 54"));
        assert_eq!(error.signature_provided(), Some("abc="));
        assert_eq!(error.access_key_id(), Some("test-access-id"));
        assert_eq!(error.property("RequestId"), Some("req-1"));
    }

    #[test]
    fn test_empty_element_is_absent() {
        let body = "<Error><Code>X</Code><Message>m</Message><ClientIP></ClientIP><AccessKeyId/></Error>";
        let error = decode_error(body.as_bytes(), None).unwrap();
        assert_eq!(error.client_ip(), None);
        assert_eq!(error.access_key_id(), None);
    }

    #[test]
    fn test_duplicate_tags_last_wins() {
        let body = "<Error><Code>FIRST</Code><Message>m</Message><Detail><Code>SECOND</Code></Detail></Error>";
        let error = decode_error(body.as_bytes(), None).unwrap();
        assert_eq!(error.code(), "SECOND");
    }

    #[test]
    fn test_cdata_text() {
        let body = "<Error><Code>X</Code><Message><![CDATA[a <b> c]]></Message></Error>";
        let error = decode_error(body.as_bytes(), None).unwrap();
        assert_eq!(error.message(), "a <b> c");
    }

    #[test]
    fn test_malformed_xml() {
        let result = decode_error(b"<Error><Code>X</Message></Error>", None);
        assert!(matches!(result, Err(OpenApiError::ParseError(_))));
    }

    #[test]
    fn test_unclosed_xml() {
        let result = decode_error(b"<Error><Code>X</Code>", None);
        assert!(matches!(result, Err(OpenApiError::ParseError(_))));
    }

    #[test]
    fn test_empty_body() {
        let result = decode_error(b"", Some("text/xml"));
        assert!(matches!(result, Err(OpenApiError::ParseError(_))));
    }

    #[test]
    fn test_plain_text_body() {
        let result = decode_error(b"502 Bad Gateway", Some("text/plain"));
        assert!(matches!(result, Err(OpenApiError::ParseError(_))));
    }

    #[test]
    fn test_missing_code() {
        let result = decode_error(b"<Error><Message>m</Message></Error>", None);
        assert!(matches!(result, Err(OpenApiError::ParseError(_))));
    }

    #[test]
    fn test_decode_json() {
        let body = br#"{"Code":"SERVICE_NOT_FOUND","Message":"service not found","ClientIP":"192.168.1.1","AccessKeyId":null,"Status":404}"#;
        let error = decode_error(body, Some("application/json; charset=UTF-8")).unwrap();
        assert_eq!(error.code(), "SERVICE_NOT_FOUND");
        assert_eq!(error.client_ip(), Some("192.168.1.1"));
        assert_eq!(error.access_key_id(), None);
        assert_eq!(error.property("Status"), Some("404"));
    }

    #[test]
    fn test_json_sniffed_without_content_type() {
        let body = br#"  {"Code":"X","Message":"m"}"#;
        assert_eq!(decode_error(body, None).unwrap().code(), "X");
    }

    #[test]
    fn test_json_not_object() {
        let result = decode_error(b"[1,2]", Some("application/json"));
        assert!(matches!(result, Err(OpenApiError::ParseError(_))));
    }

    #[test]
    fn test_raw_body_fallback() {
        let error = GatewayError::from_raw_body(502, "Bad Gateway");
        assert_eq!(error.code(), "HTTP_502");
        assert_eq!(error.message(), "Bad Gateway");
        assert_eq!(error.client_ip(), None);
    }

    #[test]
    fn test_display_is_json() {
        let error = decode_error(NOT_FOUND.as_bytes(), None).unwrap();
        assert_eq!(
            error.to_string(),
            r#"{"Code":"SERVICE_NOT_FOUND","Message":"service not found","ClientIP":"192.168.1.1"}"#
        );
    }
}
