//! Basic smoke test to verify the public API is exported.

#[test]
fn crate_compiles() {
    // If this test runs, the crate skeleton is valid.
    let _ = std::any::type_name::<iwop_openapi::ClientConfig>();
    let _ = std::any::type_name::<iwop_openapi::OpenApiClient>();
    let _ = std::any::type_name::<iwop_openapi::AsyncOpenApiClient>();
    let _ = std::any::type_name::<iwop_openapi::OpenApiError>();
    let _ = std::any::type_name::<iwop_openapi::GatewayError>();
}

#[test]
fn default_mode_is_header() {
    assert_eq!(
        iwop_openapi::SignatureMode::default(),
        iwop_openapi::SignatureMode::Header
    );
}
