//! AES as a [`BlockTransform`].
//!
//! Wraps the RustCrypto `aes` block ciphers so the mode engines can run over
//! AES-128, AES-192, and AES-256. Key schedule and round function live in the
//! `aes` crate; this module only adapts them to the transform contract.

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use modekit_types::CryptoError;

use crate::provider::BlockTransform;

/// AES block size in bytes (128 bits).
pub const AES_BLOCK_SIZE: usize = 16;

#[derive(Clone)]
enum Keyed {
    Aes128(aes::Aes128),
    Aes192(aes::Aes192),
    Aes256(aes::Aes256),
}

/// An AES block transform. Starts unkeyed; engines key it from `init`.
#[derive(Clone, Default)]
pub struct AesTransform {
    keyed: Option<Keyed>,
}

impl AesTransform {
    /// Create an unkeyed transform.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transform keyed with `key` (16, 24, or 32 bytes).
    pub fn with_key(key: &[u8]) -> Result<Self, CryptoError> {
        let mut t = Self::new();
        t.set_key(key)?;
        Ok(t)
    }

    fn set_key(&mut self, key: &[u8]) -> Result<(), CryptoError> {
        let keyed = match key.len() {
            16 => aes::Aes128::new_from_slice(key).map(Keyed::Aes128),
            24 => aes::Aes192::new_from_slice(key).map(Keyed::Aes192),
            32 => aes::Aes256::new_from_slice(key).map(Keyed::Aes256),
            _ => return Err(CryptoError::InvalidKey),
        }
        .map_err(|_| CryptoError::InvalidKey)?;
        self.keyed = Some(keyed);
        Ok(())
    }

    fn keyed(&self, block: &[u8]) -> Result<&Keyed, CryptoError> {
        if block.len() != AES_BLOCK_SIZE {
            return Err(CryptoError::illegal_block_size(
                block.len(),
                "AES operates on 16-byte blocks",
            ));
        }
        self.keyed
            .as_ref()
            .ok_or(CryptoError::WrongState("AES transform is not keyed"))
    }
}

impl BlockTransform for AesTransform {
    fn block_size(&self) -> usize {
        AES_BLOCK_SIZE
    }

    fn set_encrypt_key(&mut self, key: &[u8]) -> Result<(), CryptoError> {
        self.set_key(key)
    }

    fn set_decrypt_key(&mut self, key: &[u8]) -> Result<(), CryptoError> {
        self.set_key(key)
    }

    fn encrypt_block(&self, block: &mut [u8]) -> Result<(), CryptoError> {
        let keyed = self.keyed(block)?;
        let block = GenericArray::from_mut_slice(block);
        match keyed {
            Keyed::Aes128(c) => c.encrypt_block(block),
            Keyed::Aes192(c) => c.encrypt_block(block),
            Keyed::Aes256(c) => c.encrypt_block(block),
        }
        Ok(())
    }

    fn decrypt_block(&self, block: &mut [u8]) -> Result<(), CryptoError> {
        let keyed = self.keyed(block)?;
        let block = GenericArray::from_mut_slice(block);
        match keyed {
            Keyed::Aes128(c) => c.decrypt_block(block),
            Keyed::Aes192(c) => c.decrypt_block(block),
            Keyed::Aes256(c) => c.decrypt_block(block),
        }
        Ok(())
    }
}
