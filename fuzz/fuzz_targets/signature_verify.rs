#![no_main]

//! Fuzz target for signature verification.
//!
//! Splits the input into secret, header value and body. Verification must
//! never panic, and must accept the freshly computed signature.

use libfuzzer_sys::fuzz_target;
use linehook_core::{sign, SignatureVerifier};

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }
    let secret_len = usize::from(data[0]) % (data.len() - 1) + 1;
    let (secret, rest) = data[1..].split_at(secret_len.min(data.len() - 1));
    let header = String::from_utf8_lossy(rest);

    let Ok(verifier) = SignatureVerifier::new(secret) else {
        return;
    };

    let _ = verifier.verify(rest, &header);

    let signature = sign(rest, secret).expect("non-empty secret signs");
    assert!(verifier.verify(rest, &signature).is_ok());
});
