//! Test infrastructure for linehook.
//!
//! Provides builders for webhook event JSON, request signing with a known
//! channel secret, and in-memory reply transports that record or fail
//! replies so tests can assert on exactly what would have been sent.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod fixtures;
pub mod transport;

pub use fixtures::{EventBuilder, SignedWebhook, WebhookBodyBuilder};
use linehook_core::SignatureError;
pub use transport::{FailingTransport, RecordingTransport};

/// Channel secret used by fixtures unless a test overrides it.
pub const TEST_CHANNEL_SECRET: &str = "test-channel-secret";

/// Channel access token used by fixtures unless a test overrides it.
pub const TEST_CHANNEL_TOKEN: &str = "test-channel-token";

/// Computes the `x-line-signature` value for `body` under `secret`.
///
/// # Errors
///
/// Returns `SignatureError::InvalidSecret` for an empty secret.
pub fn sign_body(body: &[u8], secret: &str) -> Result<String, SignatureError> {
    linehook_core::sign(body, secret.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_verifies_with_same_secret() {
        let body = br#"{"events":[]}"#;
        let signature = sign_body(body, TEST_CHANNEL_SECRET).unwrap();

        assert!(linehook_core::verify(body, &signature, TEST_CHANNEL_SECRET.as_bytes()));
    }

    #[test]
    fn empty_secret_rejected() {
        assert_eq!(sign_body(b"{}", ""), Err(SignatureError::InvalidSecret));
    }
}
