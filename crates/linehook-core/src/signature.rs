//! Request signature verification.
//!
//! The platform signs every webhook body with HMAC-SHA256 keyed by the
//! channel secret and sends the base64-encoded digest in the
//! `x-line-signature` header. Verification recomputes the digest over the
//! raw body bytes and compares with `Mac::verify_slice`, which is
//! constant-time and rejects length mismatches without inspecting content.

use std::{fmt, sync::Arc};

use base64::prelude::*;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::SignatureError;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the body signature.
pub const SIGNATURE_HEADER: &str = "x-line-signature";

/// Verifies webhook bodies against a fixed channel secret.
///
/// Built once at startup and shared read-only across requests.
///
/// # Example
///
/// ```
/// use linehook_core::signature::{sign, SignatureVerifier};
///
/// let verifier = SignatureVerifier::new("channel-secret").unwrap();
/// let body = br#"{"events":[]}"#;
/// let signature = sign(body, b"channel-secret").unwrap();
///
/// assert!(verifier.verify(body, &signature).is_ok());
/// ```
#[derive(Clone)]
pub struct SignatureVerifier {
    secret: Arc<[u8]>,
}

impl SignatureVerifier {
    /// Creates a verifier for the given secret.
    ///
    /// # Errors
    ///
    /// Returns `SignatureError::InvalidSecret` for an empty secret.
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, SignatureError> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(SignatureError::InvalidSecret);
        }
        Ok(Self { secret: Arc::from(secret) })
    }

    /// Checks `signature` (base64) against the HMAC of `body`.
    ///
    /// # Errors
    ///
    /// - `MissingSignature` when the header value is empty
    /// - `InvalidEncoding` when it is not base64
    /// - `VerificationFailed` on any digest or length mismatch
    pub fn verify(&self, body: &[u8], signature: &str) -> Result<(), SignatureError> {
        if signature.is_empty() {
            return Err(SignatureError::MissingSignature);
        }

        let decoded = BASE64_STANDARD
            .decode(signature)
            .map_err(|e| SignatureError::InvalidEncoding(e.to_string()))?;

        let mut mac = new_mac(&self.secret)?;
        mac.update(body);
        mac.verify_slice(&decoded).map_err(|_| SignatureError::VerificationFailed)
    }
}

impl fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignatureVerifier").field("secret", &"***").finish()
    }
}

/// Returns true when `signature` is a valid signature of `body` under
/// `secret`. Never panics; every failure maps to `false`.
pub fn verify(body: &[u8], signature: &str, secret: &[u8]) -> bool {
    SignatureVerifier::new(secret).and_then(|verifier| verifier.verify(body, signature)).is_ok()
}

/// Computes the base64 HMAC-SHA256 signature of `body`.
///
/// # Errors
///
/// Returns `SignatureError::InvalidSecret` for an empty secret.
pub fn sign(body: &[u8], secret: &[u8]) -> Result<String, SignatureError> {
    if secret.is_empty() {
        return Err(SignatureError::InvalidSecret);
    }
    let mut mac = new_mac(secret)?;
    mac.update(body);
    Ok(BASE64_STANDARD.encode(mac.finalize().into_bytes()))
}

fn new_mac(secret: &[u8]) -> Result<HmacSha256, SignatureError> {
    HmacSha256::new_from_slice(secret).map_err(|_| SignatureError::InvalidSecret)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test_secret";

    #[test]
    fn verify_accepts_own_signature() {
        let body = br#"{"destination":"U0","events":[]}"#;
        let signature = sign(body, SECRET).unwrap();

        assert!(verify(body, &signature, SECRET));
    }

    #[test]
    fn verify_rejects_other_secret() {
        let body = b"payload";
        let signature = sign(body, b"other_secret").unwrap();

        assert!(!verify(body, &signature, SECRET));
    }

    #[test]
    fn verify_rejects_modified_body() {
        let signature = sign(b"payload", SECRET).unwrap();

        assert!(!verify(b"payload ", &signature, SECRET));
    }

    #[test]
    fn empty_signature_reported_as_missing() {
        let verifier = SignatureVerifier::new(SECRET).unwrap();
        assert_eq!(verifier.verify(b"payload", ""), Err(SignatureError::MissingSignature));
    }

    #[test]
    fn non_base64_signature_reported_as_encoding_error() {
        let verifier = SignatureVerifier::new(SECRET).unwrap();
        let result = verifier.verify(b"payload", "not-valid-base64!!!");

        assert!(matches!(result, Err(SignatureError::InvalidEncoding(_))));
    }

    #[test]
    fn truncated_signature_fails_verification() {
        let verifier = SignatureVerifier::new(SECRET).unwrap();
        let full = BASE64_STANDARD.decode(sign(b"payload", SECRET).unwrap()).unwrap();
        let truncated = BASE64_STANDARD.encode(&full[..16]);

        assert_eq!(verifier.verify(b"payload", &truncated), Err(SignatureError::VerificationFailed));
    }

    #[test]
    fn empty_secret_rejected() {
        assert_eq!(SignatureVerifier::new("").unwrap_err(), SignatureError::InvalidSecret);
        assert!(!verify(b"payload", "AAAA", b""));
    }

    #[test]
    fn signature_is_base64_sha256_digest() {
        let signature = sign(b"payload", SECRET).unwrap();
        let decoded = BASE64_STANDARD.decode(&signature).unwrap();

        assert_eq!(decoded.len(), 32);
        assert_eq!(signature, sign(b"payload", SECRET).unwrap());
    }

    #[test]
    fn debug_output_redacts_secret() {
        let verifier = SignatureVerifier::new("super-secret").unwrap();
        assert!(!format!("{verifier:?}").contains("super-secret"));
    }
}
