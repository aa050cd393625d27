//! Turning a computed signature into headers or query parameters.

use crate::crypto::mode::SignatureMode;
use crate::crypto::{AUTHORIZATION_SCHEME, QUERY_ACCESS_ID, QUERY_EXPIRES, QUERY_SIGNATURE};
use crate::OpenApiError;
use http::header::{AUTHORIZATION, DATE};
use http::{HeaderMap, HeaderValue};

/// What must be merged into the outgoing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attachment {
    /// Headers to set (HEADER mode).
    Headers(HeaderMap),
    /// Query pairs to append, in order (QUERY mode).
    Query(Vec<(&'static str, String)>),
}

impl Attachment {
    /// Headers to merge, if HEADER mode.
    pub fn headers(&self) -> Option<&HeaderMap> {
        match self {
            Attachment::Headers(headers) => Some(headers),
            Attachment::Query(_) => None,
        }
    }

    /// Query pairs to merge, if QUERY mode.
    pub fn query(&self) -> Option<&[(&'static str, String)]> {
        match self {
            Attachment::Headers(_) => None,
            Attachment::Query(pairs) => Some(pairs),
        }
    }
}

/// `Authorization` header value: `IWOP <access_id>:<signature>`.
pub fn authorization_value(access_id: &str, signature: &str) -> String {
    format!("{} {}:{}", AUTHORIZATION_SCHEME, access_id, signature)
}

/// Build the attachment for `mode`.
///
/// HEADER mode yields `Date` and `Authorization`; `Date` is left out when the
/// caller already supplied one (`time` then is that value). QUERY mode yields
/// `AccessId`, `Expires` and `Signature`.
///
/// # Errors
/// * `ValidationError` - the access id or time cannot be carried in a header
pub fn attach(
    mode: &SignatureMode,
    time: &str,
    access_id: &str,
    signature: &str,
    date_supplied: bool,
) -> Result<Attachment, OpenApiError> {
    match mode {
        SignatureMode::Header => {
            let mut headers = HeaderMap::new();
            if !date_supplied {
                headers.insert(DATE, header_value(time)?);
            }
            headers.insert(
                AUTHORIZATION,
                header_value(&authorization_value(access_id, signature))?,
            );
            Ok(Attachment::Headers(headers))
        }
        SignatureMode::Query { .. } => Ok(Attachment::Query(vec![
            (QUERY_ACCESS_ID, access_id.to_string()),
            (QUERY_EXPIRES, time.to_string()),
            (QUERY_SIGNATURE, signature.to_string()),
        ])),
    }
}

fn header_value(value: &str) -> Result<HeaderValue, OpenApiError> {
    HeaderValue::from_str(value)
        .map_err(|e| OpenApiError::ValidationError(format!("invalid header value: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATE_VALUE: &str = "Wed, 09 Jun 2021 16:08:15 GMT";

    #[test]
    fn test_header_attachment() {
        let attachment = attach(
            &SignatureMode::Header,
            DATE_VALUE,
            "test-access-id",
            "wcoO6oOrbVLbwARJq/yBSefH7nM=",
            false,
        )
        .unwrap();

        let headers = attachment.headers().unwrap();
        assert_eq!(headers.len(), 2);
        assert_eq!(headers[DATE], DATE_VALUE);
        assert_eq!(
            headers[AUTHORIZATION],
            "IWOP test-access-id:wcoO6oOrbVLbwARJq/yBSefH7nM="
        );
        assert!(attachment.query().is_none());
    }

    #[test]
    fn test_header_attachment_keeps_supplied_date() {
        let attachment =
            attach(&SignatureMode::Header, DATE_VALUE, "id", "sig=", true).unwrap();
        let headers = attachment.headers().unwrap();
        assert!(headers.get(DATE).is_none());
        assert_eq!(headers[AUTHORIZATION], "IWOP id:sig=");
    }

    #[test]
    fn test_query_attachment() {
        let attachment = attach(
            &SignatureMode::query_for(3600),
            "1623258495",
            "test-access-id",
            "rSOD2kZyuin0YKdCaM0K7Vw7DmI=",
            false,
        )
        .unwrap();

        assert_eq!(
            attachment.query().unwrap(),
            &[
                ("AccessId", "test-access-id".to_string()),
                ("Expires", "1623258495".to_string()),
                ("Signature", "rSOD2kZyuin0YKdCaM0K7Vw7DmI=".to_string()),
            ][..]
        );
        assert!(attachment.headers().is_none());
    }

    #[test]
    fn test_invalid_header_value_rejected() {
        let result = attach(&SignatureMode::Header, DATE_VALUE, "bad\nid", "sig=", false);
        assert!(matches!(result, Err(OpenApiError::ValidationError(_))));
    }
}
