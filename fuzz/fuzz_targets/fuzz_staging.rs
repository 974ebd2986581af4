#![no_main]
use libfuzzer_sys::fuzz_target;
use modekit_crypto::staging::{ByteStaging, ExactStaging, GrowableStaging};

fuzz_target!(|data: &[u8]| {
    // Each leading byte is the length of the next chunk.
    let mut g = GrowableStaging::new();
    let mut e = ExactStaging::new();
    let mut expected = Vec::new();
    let mut rest = data;
    while let Some((&n, tail)) = rest.split_first() {
        let n = (n as usize).min(tail.len());
        g.write_range(tail, 0, n).unwrap();
        e.write(&tail[..n]);
        expected.extend_from_slice(&tail[..n]);
        rest = &tail[n..];
    }
    assert_eq!(g.contents(), &expected[..]);
    assert_eq!(e.take().into_vec(), expected);
});
