#![no_main]
use libfuzzer_sys::fuzz_target;
use modekit_crypto::modes::wrap_pad::{key_unwrap_pad, key_wrap_pad};

const KEK: [u8; 24] = [0x5a; 24];

fuzz_target!(|data: &[u8]| {
    if let Ok(key) = key_unwrap_pad(&KEK, data) {
        assert!(!key.is_empty() && key.len() + 8 <= data.len());
        assert_eq!(key_wrap_pad(&KEK, &key).unwrap(), data);
    }
    if !data.is_empty() {
        let wrapped = key_wrap_pad(&KEK, data).unwrap();
        assert_eq!(key_unwrap_pad(&KEK, &wrapped).unwrap(), data);
    }
});
