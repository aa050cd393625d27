//! Request signing: canonicalization, HMAC, and signature attachment.

pub mod attach;
pub mod digest;
pub mod freshness;
pub mod legacy;
pub mod mode;
pub mod pipeline;
pub mod signing;

/// Scheme prefix of the `Authorization` header value.
pub const AUTHORIZATION_SCHEME: &str = "IWOP";

/// Prefix (compared lowercased) of headers and query keys that take part in signing.
pub const CUSTOM_PREFIX: &str = "x-iwop-";

/// Query parameter carrying the access id in QUERY mode.
pub const QUERY_ACCESS_ID: &str = "AccessId";

/// Query parameter carrying the absolute expiry in QUERY mode.
pub const QUERY_EXPIRES: &str = "Expires";

/// Query parameter carrying the signature in QUERY mode.
pub const QUERY_SIGNATURE: &str = "Signature";
