//! Error types for signing and gateway calls.

use crate::protocol::gateway_error::GatewayError;
use thiserror::Error;

/// Errors that can occur while signing or sending a request.
#[derive(Debug, Error)]
pub enum OpenApiError {
    /// Configuration is invalid (empty credentials, bad base URL, ...).
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The request cannot be signed as described (e.g. body without content type).
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// HTTP transport error talking to the gateway.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The gateway answered with a failure status.
    #[error("Gateway rejected request with status {status}: {}", error.message())]
    GatewayResponse {
        /// HTTP status code of the response.
        status: u16,
        /// Diagnostic fields decoded from the response body.
        error: GatewayError,
    },

    /// A gateway error body could not be decoded.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// A successful response body could not be decoded as requested.
    #[error("Response decode error: {0}")]
    ResponseDecode(String),
}

impl OpenApiError {
    /// HTTP status of a gateway rejection, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            OpenApiError::GatewayResponse { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Decoded gateway diagnostics, if this is a gateway rejection.
    pub fn gateway_error(&self) -> Option<&GatewayError> {
        match self {
            OpenApiError::GatewayResponse { error, .. } => Some(error),
            _ => None,
        }
    }
}
