//! Where the signature is carried on the outgoing request.

/// Default QUERY-mode time-to-live, in seconds.
pub const DEFAULT_QUERY_EXPIRES_SECS: i64 = 30;

/// Signing mode.
///
/// `Header` sends `Date` and `Authorization` headers. `Query` embeds
/// `AccessId`, `Expires` and `Signature` query parameters, with the
/// signature valid for `duration` seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignatureMode {
    /// Sign into `Date` + `Authorization` headers.
    #[default]
    Header,
    /// Sign into query parameters.
    Query {
        /// Lifetime in seconds; values `<= 0` fall back to 30.
        duration: i64,
    },
}

impl SignatureMode {
    /// QUERY mode with the default lifetime.
    pub fn query() -> Self {
        SignatureMode::Query {
            duration: DEFAULT_QUERY_EXPIRES_SECS,
        }
    }

    /// QUERY mode valid for `seconds`.
    pub fn query_for(seconds: i64) -> Self {
        SignatureMode::Query { duration: seconds }
    }

    /// Whether the signature goes into the query string.
    pub fn is_query(&self) -> bool {
        matches!(self, SignatureMode::Query { .. })
    }

    /// Effective QUERY lifetime in seconds, `None` for HEADER mode.
    pub fn expires_in(&self) -> Option<i64> {
        match *self {
            SignatureMode::Header => None,
            SignatureMode::Query { duration } if duration > 0 => Some(duration),
            SignatureMode::Query { .. } => Some(DEFAULT_QUERY_EXPIRES_SECS),
        }
    }
}
