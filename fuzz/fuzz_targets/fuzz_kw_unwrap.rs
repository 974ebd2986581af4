#![no_main]
use libfuzzer_sys::fuzz_target;
use modekit_crypto::modes::wrap::{key_unwrap, key_wrap};

const KEK: [u8; 16] = [0x0f; 16];

fuzz_target!(|data: &[u8]| {
    // Arbitrary ciphertext must be rejected or unwrap to len - 8 bytes.
    if let Ok(key) = key_unwrap(&KEK, data) {
        assert_eq!(key.len() + 8, data.len());
        assert_eq!(key_wrap(&KEK, &key).unwrap(), data);
    }
});
