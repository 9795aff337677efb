#![no_main]

//! Fuzz target for webhook body decoding.
//!
//! Arbitrary bytes must either decode or produce a `DecodeError`; never a
//! panic. Whatever decodes must re-encode into a body that decodes to the
//! same batch.

use libfuzzer_sys::fuzz_target;
use linehook_core::{decode, encode};

fuzz_target!(|data: &[u8]| {
    let Ok(batch) = decode(data) else {
        return;
    };

    let encoded = encode(&batch).expect("decoded batch must re-encode");
    let again = decode(&encoded).expect("re-encoded batch must decode");
    assert_eq!(again, batch);
});
