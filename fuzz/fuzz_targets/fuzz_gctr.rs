#![no_main]
use libfuzzer_sys::fuzz_target;
use modekit_crypto::aes::AesTransform;
use modekit_crypto::modes::gctr::Gctr;
use modekit_crypto::provider::ModeEngine;
use modekit_crypto::Direction;

fuzz_target!(|data: &[u8]| {
    // First 4 bytes pick the counter field, so rollover is reachable.
    if data.len() < 4 {
        return;
    }
    let mut icb = [0u8; 16];
    icb[12..].copy_from_slice(&data[..4]);
    let body = &data[4..];

    let mut engine = Gctr::new(AesTransform::new()).unwrap();
    engine.init(Direction::Encrypt, &[7u8; 16], Some(&icb)).unwrap();
    let mut ct = vec![0u8; body.len()];
    engine.encrypt_final(body, &mut ct).unwrap();
    assert_eq!(engine.iv(), &icb[..]);

    engine.init(Direction::Decrypt, &[7u8; 16], Some(&icb)).unwrap();
    let mut pt = vec![0u8; body.len()];
    engine.decrypt_final(&ct, &mut pt).unwrap();
    assert_eq!(pt, body);
});
