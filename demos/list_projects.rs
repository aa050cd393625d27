//! List projects through the gateway, signed both ways.
//!
//! # Running
//!
//! ```bash
//! export IWOP_BASE_URL="https://api.example.com/"
//! export IWOP_ACCESS_ID="your-access-id"
//! export IWOP_SECRET_KEY="your-secret-key"
//! RUST_LOG=iwop_openapi=debug cargo run --example list_projects
//! ```
//!
//! With `debug` logging the local string to sign is printed, which is what
//! to compare against `StringToSign` when the gateway reports a mismatch.

use iwop_openapi::{ClientConfig, OpenApiClient, OpenApiError, RequestOption, SignatureMode};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let base_url = std::env::var("IWOP_BASE_URL").expect("Set IWOP_BASE_URL environment variable");
    let access_id =
        std::env::var("IWOP_ACCESS_ID").expect("Set IWOP_ACCESS_ID environment variable");
    let secret_key =
        std::env::var("IWOP_SECRET_KEY").expect("Set IWOP_SECRET_KEY environment variable");

    let client = match OpenApiClient::new(ClientConfig::new(base_url, access_id, secret_key)) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    // Signature in Date + Authorization headers
    let option = RequestOption::builder()
        .query("start", 0)
        .query("limit", 2)
        .build();
    report("header", client.get("/org-api/projects", &option));

    // Signature in the query string, valid for one hour
    let option = RequestOption::builder()
        .signed_by(SignatureMode::query_for(3600))
        .query("start", 0)
        .query("limit", 2)
        .build();
    report("query", client.get("/org-api/projects", &option));
}

fn report(label: &str, result: Result<iwop_openapi::RequestResult, OpenApiError>) {
    match result.and_then(|r| r.text()) {
        Ok(body) => println!("[{}] {}", label, body),
        Err(OpenApiError::GatewayResponse { status, error }) => {
            eprintln!("[{}] gateway answered {}: {}", label, status, error);
            if let Some(string_to_sign) = error.string_to_sign() {
                eprintln!("[{}] gateway string to sign: {:?}", label, string_to_sign);
            }
        }
        Err(e) => eprintln!("[{}] request failed: {}", label, e),
    }
}
