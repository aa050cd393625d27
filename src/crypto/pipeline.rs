//! Signing pipeline composing all steps.
//!
//! 1. Validate the request (content type for bodies)
//! 2. Resolve the time token (HTTP date or absolute expiry)
//! 3. Build the canonical string
//! 4. HMAC-SHA1 it with the secret key
//! 5. Produce the headers or query pairs to merge

use crate::clock::Clock;
use crate::crypto::{
    attach::{attach, Attachment},
    digest::sign,
    freshness::{supplied_date, time_token},
    mode::SignatureMode,
    signing::{build_canonical_string, CanonicalString, Credentials, SignatureRequest},
};
use crate::OpenApiError;
use tracing::debug;

/// Outcome of signing one request.
#[derive(Debug, Clone)]
pub struct SignedResult {
    /// Mode the request was signed for.
    pub mode: SignatureMode,
    /// The string that was signed.
    pub canonical: CanonicalString,
    /// Base64 HMAC-SHA1 of `canonical`.
    pub signature: String,
    /// What to merge into the outgoing request.
    pub attachment: Attachment,
}

/// Sign `request` for `mode`.
///
/// Pure computation: the only input besides the arguments is `clock`.
///
/// # Errors
/// * `ValidationError` - POST/PUT/PATCH with a body and no content type,
///   a QUERY expiry that overflows, or values that cannot be carried in headers
pub fn generate_signature<C: Clock + ?Sized>(
    mode: &SignatureMode,
    credentials: &Credentials,
    request: &SignatureRequest,
    clock: &C,
) -> Result<SignedResult, OpenApiError> {
    // 1. Fail before any signing work
    request.validate()?;

    // 2. Time token
    let time = time_token(mode, request.headers(), clock)?;
    let date_supplied = !mode.is_query() && supplied_date(request.headers()).is_some();

    // 3. Canonical string
    let canonical = build_canonical_string(request, mode, &time)?;
    debug!(
        method = %request.method(),
        mode = ?mode,
        string_to_sign = ?canonical.as_str(),
        "Built string to sign"
    );

    // 4. Signature
    let signature = sign(canonical.as_str(), credentials.secret_key());

    // 5. Attachment
    let attachment = attach(mode, &time, credentials.access_id(), &signature, date_supplied)?;

    Ok(SignedResult {
        mode: *mode,
        canonical,
        signature,
        attachment,
    })
}
