//! HMAC-SHA1 signature computation.

use base64::{engine::general_purpose::STANDARD, Engine};
use hmac::{Hmac, Mac};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// Length of a base64-encoded SHA-1 MAC (20 bytes).
pub const SIGNATURE_B64_LEN: usize = 28;

/// Compute `base64(HMAC-SHA1(secret_key, canonical))`.
///
/// Both inputs are taken as UTF-8 bytes. Output is standard base64 with
/// padding, always [`SIGNATURE_B64_LEN`] characters.
pub fn sign(canonical: &str, secret_key: &str) -> String {
    let mut mac =
        HmacSha1::new_from_slice(secret_key.as_bytes()).expect("HMAC can take key of any size");
    mac.update(canonical.as_bytes());
    STANDARD.encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-0123456789";

    #[test]
    fn test_known_signature() {
        let canonical = "GET\nWed, 09 Jun 2021 16:08:15 GMT\n/org-api/projects?limit=2&start=0";
        assert_eq!(sign(canonical, SECRET), "wcoO6oOrbVLbwARJq/yBSefH7nM=");
    }

    #[test]
    fn test_rfc2202_vector() {
        // RFC 2202 test case 2
        let sig = sign("what do ya want for nothing?", "Jefe");
        assert_eq!(sig, "7/zfauXrL6LSdBbV8YTfnCWafHk=");
    }

    #[test]
    fn test_deterministic() {
        let canonical = "GET\n1623258495\n/x";
        assert_eq!(sign(canonical, SECRET), sign(canonical, SECRET));
    }

    #[test]
    fn test_one_byte_changes_signature() {
        let a = sign("GET\n1623258495\n/x?start=0", SECRET);
        let b = sign("GET\n1623258495\n/x?start=1", SECRET);
        assert_ne!(a, b);
    }

    #[test]
    fn test_key_changes_signature() {
        assert_ne!(sign("GET\n/x", SECRET), sign("GET\n/x", "other-secret"));
    }

    #[test]
    fn test_output_length() {
        for canonical in ["", "GET", "a much longer canonical string\nwith several\nlines"] {
            assert_eq!(sign(canonical, SECRET).len(), SIGNATURE_B64_LEN);
        }
    }
}
