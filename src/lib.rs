//! # iwop-openapi
//!
//! **Request signing and HTTP client for the IWOP open API gateway.**
//!
//! Every request is signed with HMAC-SHA1 over a canonical string built from
//! the method, content type, a time token, `x-iwop-*` custom parameters and
//! the normalized resource. The signature travels either in headers
//! (`Date` + `Authorization: IWOP {access_id}:{signature}`) or in the query
//! string (`AccessId`, `Expires`, `Signature`).
//!
//! ## Features
//!
//! - **Two signing modes**: HEADER (default) and QUERY with an expiry window
//! - **Blocking and async clients** over `reqwest`, with an optional
//!   in-flight limit for the async one
//! - **Gateway error decoding**: XML or JSON error bodies become a typed
//!   [`GatewayError`] carrying the gateway's signature diagnostics
//! - **Legacy signer** for already-built `reqwest::Request`s
//!
//! ## Quickstart
//!
//! ```no_run
//! use iwop_openapi::{ClientConfig, OpenApiClient, RequestOption, SignatureMode};
//!
//! fn main() -> Result<(), iwop_openapi::OpenApiError> {
//!     let config = ClientConfig::new("https://api.example.com/", "access-id", "secret-key");
//!     let client = OpenApiClient::new(config)?;
//!
//!     let option = RequestOption::builder()
//!         .query("start", 0)
//!         .query("limit", 2)
//!         .build();
//!     let projects: serde_json::Value = client.get("/org-api/projects", &option)?.json()?;
//!     println!("{}", projects);
//!
//!     let presigned = RequestOption::builder()
//!         .signed_by(SignatureMode::query_for(3600))
//!         .build();
//!     let text = client.get("/org-api/projects", &presigned)?.text()?;
//!     println!("{}", text);
//!     Ok(())
//! }
//! ```
//!
//! ## Errors
//!
//! A 4xx/5xx answer surfaces as [`OpenApiError::GatewayResponse`]. When the
//! gateway rejects a signature, [`GatewayError::string_to_sign`] holds what
//! the gateway computed; compare it with the `debug!` log of the local
//! string to sign.

#![warn(missing_docs)]

// Core modules
pub mod clock;
pub mod config;
pub mod errors;

// Crypto layer
pub mod crypto;

// Protocol layer
pub mod protocol;

// Client layer
pub mod client;

// Re-exports for public API
pub use client::async_http::AsyncOpenApiClient;
pub use client::http::OpenApiClient;
pub use client::option::{RequestBody, RequestOption, RequestOptionBuilder};
pub use client::result::{AsyncRequestResult, RequestResult};
pub use clock::{Clock, SystemClock};
pub use config::ClientConfig;
pub use crypto::legacy::GatewayAuthenticator;
pub use crypto::mode::SignatureMode;
pub use crypto::pipeline::{generate_signature, SignedResult};
pub use crypto::signing::{Credentials, SignatureRequest};
pub use errors::OpenApiError;
pub use protocol::gateway_error::{decode_error, GatewayError};

#[cfg(any(test, feature = "test-seams"))]
pub use clock::MockClock;
