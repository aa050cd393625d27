//! Time tokens for the string to sign.
//!
//! HEADER mode signs the HTTP `Date` value; QUERY mode signs the absolute
//! expiry in unix seconds. Whatever is signed here is exactly what ends up
//! on the wire.

use crate::clock::Clock;
use crate::crypto::mode::SignatureMode;
use crate::OpenApiError;
use chrono::{DateTime, Utc};
use http::HeaderMap;

/// Format a timestamp as an HTTP date (RFC 1123, always GMT).
///
/// Example: "Wed, 09 Jun 2021 16:08:15 GMT"
pub fn format_http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Absolute QUERY-mode expiry: now plus `duration` seconds.
///
/// # Errors
/// * `ValidationError` - the expiry does not fit in an `i64`
pub fn expires_at<C: Clock + ?Sized>(clock: &C, duration: i64) -> Result<i64, OpenApiError> {
    clock.unix_seconds().checked_add(duration).ok_or_else(|| {
        OpenApiError::ValidationError(format!("query expiry of {}s overflows", duration))
    })
}

/// Caller-supplied `date` header, if any.
pub fn supplied_date(headers: &HeaderMap) -> Option<String> {
    headers
        .get(http::header::DATE)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

/// Resolve the time token for `mode`.
///
/// HEADER mode reuses a caller-supplied `date` header verbatim, otherwise
/// renders the clock's current time. QUERY mode always renders a fresh expiry.
pub fn time_token<C: Clock + ?Sized>(
    mode: &SignatureMode,
    headers: &HeaderMap,
    clock: &C,
) -> Result<String, OpenApiError> {
    match mode.expires_in() {
        Some(duration) => Ok(expires_at(clock, duration)?.to_string()),
        None => Ok(supplied_date(headers).unwrap_or_else(|| format_http_date(clock.now_utc()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MockClock;
    use http::HeaderValue;

    #[test]
    fn test_format_http_date() {
        let clock = MockClock::at_unix(1_623_254_895);
        assert_eq!(
            format_http_date(clock.now_utc()),
            "Wed, 09 Jun 2021 16:08:15 GMT"
        );
    }

    #[test]
    fn test_format_pads_day() {
        let clock = MockClock::from_http_date("Sun, 05 Jan 2025 03:04:05 GMT");
        assert_eq!(
            format_http_date(clock.now_utc()),
            "Sun, 05 Jan 2025 03:04:05 GMT"
        );
    }

    #[test]
    fn test_query_token_is_expiry() {
        let clock = MockClock::at_unix(1_623_254_895);
        let token = time_token(&SignatureMode::query_for(3600), &HeaderMap::new(), &clock).unwrap();
        assert_eq!(token, "1623258495");
    }

    #[test]
    fn test_query_token_default_duration() {
        let clock = MockClock::at_unix(1_000);
        let token = time_token(&SignatureMode::query_for(0), &HeaderMap::new(), &clock).unwrap();
        assert_eq!(token, "1030");
    }

    #[test]
    fn test_query_token_overflow_rejected() {
        let clock = MockClock::at_unix(1_623_254_895);
        let result = time_token(&SignatureMode::query_for(i64::MAX), &HeaderMap::new(), &clock);
        assert!(matches!(result, Err(OpenApiError::ValidationError(_))));
    }

    #[test]
    fn test_expires_at_upper_bound() {
        let clock = MockClock::at_unix(0);
        assert_eq!(expires_at(&clock, i64::MAX).unwrap(), i64::MAX);
        let clock = MockClock::at_unix(1);
        assert!(expires_at(&clock, i64::MAX).is_err());
    }

    #[test]
    fn test_header_token_reuses_supplied_date() {
        let clock = MockClock::at_unix(1_623_254_895);
        let mut headers = HeaderMap::new();
        headers.insert("Date", HeaderValue::from_static("Thu, 01 Jan 2015 00:00:00 GMT"));
        let token = time_token(&SignatureMode::Header, &headers, &clock).unwrap();
        assert_eq!(token, "Thu, 01 Jan 2015 00:00:00 GMT");
    }

    #[test]
    fn test_query_token_ignores_supplied_date() {
        let clock = MockClock::at_unix(1_000);
        let mut headers = HeaderMap::new();
        headers.insert("date", HeaderValue::from_static("Thu, 01 Jan 2015 00:00:00 GMT"));
        let token = time_token(&SignatureMode::query_for(10), &headers, &clock).unwrap();
        assert_eq!(token, "1010");
    }
}
