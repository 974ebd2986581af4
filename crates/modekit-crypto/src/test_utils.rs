//! Shared helpers for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use modekit_types::CryptoError;

use crate::aes::AesTransform;
use crate::provider::BlockTransform;

pub(crate) fn hex(s: &str) -> Vec<u8> {
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
        .collect()
}

pub(crate) fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// AES transform that counts block operations, to prove rejected calls
/// never reach the cipher.
#[derive(Clone, Default)]
pub(crate) struct CountingAes {
    inner: AesTransform,
    calls: Arc<AtomicUsize>,
}

impl CountingAes {
    pub(crate) fn new() -> (Self, Arc<AtomicUsize>) {
        let t = Self::default();
        let calls = Arc::clone(&t.calls);
        (t, calls)
    }
}

impl BlockTransform for CountingAes {
    fn block_size(&self) -> usize {
        self.inner.block_size()
    }

    fn set_encrypt_key(&mut self, key: &[u8]) -> Result<(), CryptoError> {
        self.inner.set_encrypt_key(key)
    }

    fn set_decrypt_key(&mut self, key: &[u8]) -> Result<(), CryptoError> {
        self.inner.set_decrypt_key(key)
    }

    fn encrypt_block(&self, block: &mut [u8]) -> Result<(), CryptoError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.inner.encrypt_block(block)
    }

    fn decrypt_block(&self, block: &mut [u8]) -> Result<(), CryptoError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.inner.decrypt_block(block)
    }
}

/// A transform with an 8-byte block, for construction-time rejections.
pub(crate) struct NarrowBlock;

impl BlockTransform for NarrowBlock {
    fn block_size(&self) -> usize {
        8
    }

    fn set_encrypt_key(&mut self, _key: &[u8]) -> Result<(), CryptoError> {
        Ok(())
    }

    fn set_decrypt_key(&mut self, _key: &[u8]) -> Result<(), CryptoError> {
        Ok(())
    }

    fn encrypt_block(&self, _block: &mut [u8]) -> Result<(), CryptoError> {
        Ok(())
    }

    fn decrypt_block(&self, _block: &mut [u8]) -> Result<(), CryptoError> {
        Ok(())
    }
}
