//! CTR (Counter) mode of operation, NIST SP 800-38A §6.5.
//!
//! The whole 16-byte counter block is a big-endian integer incremented by one
//! per block. Any input length is accepted per call; keystream bytes left
//! over from a partial block are consumed by the next call.

use modekit_types::{CryptoError, Direction, ModeId};
use tracing::debug;
use zeroize::Zeroize;

use super::counter::{increment_be, COUNTER_BLOCK_SIZE};
use super::xor_in_place;
use crate::provider::{BlockTransform, Checkpointable, ModeEngine, Resettable};

const BLOCK: usize = COUNTER_BLOCK_SIZE;

#[derive(Clone, Copy, Zeroize)]
struct Position {
    counter: [u8; BLOCK],
    /// Keystream for the block before `counter`.
    keystream: [u8; BLOCK],
    /// Bytes of `keystream` already consumed; `BLOCK` means none left.
    used: usize,
}

impl Position {
    fn at(counter: [u8; BLOCK]) -> Self {
        Self {
            counter,
            keystream: [0u8; BLOCK],
            used: BLOCK,
        }
    }
}

/// Streaming full-width CTR engine.
pub struct Ctr<C: BlockTransform> {
    cipher: C,
    original: [u8; BLOCK],
    pos: Position,
    saved: Position,
    direction: Option<Direction>,
}

impl<C: BlockTransform> Ctr<C> {
    /// Create an engine over `cipher`. The transform must have a 16-byte block.
    pub fn new(cipher: C) -> Result<Self, CryptoError> {
        if cipher.block_size() != BLOCK {
            return Err(CryptoError::InvalidParameter(
                "CTR requires a 16-byte block cipher",
            ));
        }
        Ok(Self {
            cipher,
            original: [0u8; BLOCK],
            pos: Position::at([0u8; BLOCK]),
            saved: Position::at([0u8; BLOCK]),
            direction: None,
        })
    }

    fn ensure_ready(&self) -> Result<(), CryptoError> {
        match self.direction {
            Some(_) => Ok(()),
            None => Err(CryptoError::WrongState("CTR engine is not initialized")),
        }
    }

    /// XOR `input` with the keystream into `output`. Any length is accepted.
    pub fn apply_keystream(
        &mut self,
        input: &[u8],
        output: &mut [u8],
    ) -> Result<usize, CryptoError> {
        self.ensure_ready()?;
        let len = input.len();
        CryptoError::check_capacity(len, output.len())?;

        let data = &mut output[..len];
        data.copy_from_slice(input);
        self.xor_stream(data)?;
        Ok(len)
    }

    /// XOR the keystream into `data` in place. Any length is accepted.
    pub fn apply_keystream_in_place(&mut self, data: &mut [u8]) -> Result<usize, CryptoError> {
        self.ensure_ready()?;
        self.xor_stream(data)?;
        Ok(data.len())
    }

    /// On failure `data` is wiped and the stream position rolls back.
    fn xor_stream(&mut self, data: &mut [u8]) -> Result<(), CryptoError> {
        let start = self.pos;
        let len = data.len();
        let mut i = 0;
        while i < len {
            if self.pos.used == BLOCK {
                self.pos.keystream = self.pos.counter;
                if let Err(e) = self.cipher.encrypt_block(&mut self.pos.keystream) {
                    data.zeroize();
                    self.pos = start;
                    return Err(e);
                }
                increment_be(&mut self.pos.counter);
                self.pos.used = 0;
            }
            let take = (BLOCK - self.pos.used).min(len - i);
            let ks = &self.pos.keystream[self.pos.used..self.pos.used + take];
            xor_in_place(&mut data[i..i + take], ks);
            self.pos.used += take;
            i += take;
        }
        Ok(())
    }

    fn finish(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize, CryptoError> {
        let res = self.apply_keystream(input, output);
        self.reset();
        res
    }
}

impl<C: BlockTransform> ModeEngine for Ctr<C> {
    fn mode_id(&self) -> ModeId {
        ModeId::Ctr
    }

    fn block_size(&self) -> usize {
        BLOCK
    }

    fn init(
        &mut self,
        direction: Direction,
        key: &[u8],
        iv: Option<&[u8]>,
    ) -> Result<(), CryptoError> {
        let iv = iv.ok_or(CryptoError::InvalidParameter("CTR requires an IV"))?;
        let iv: [u8; BLOCK] = iv
            .try_into()
            .map_err(|_| CryptoError::InvalidParameter("CTR IV must be 16 bytes"))?;
        self.cipher.set_encrypt_key(key)?;
        self.original = iv;
        self.pos = Position::at(iv);
        self.saved = self.pos;
        self.direction = Some(direction);
        debug!(mode = %ModeId::Ctr, %direction, "mode engine initialized");
        Ok(())
    }

    fn iv(&self) -> &[u8] {
        &self.pos.counter
    }

    fn encrypt(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize, CryptoError> {
        self.apply_keystream(input, output)
    }

    fn decrypt(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize, CryptoError> {
        self.apply_keystream(input, output)
    }

    fn encrypt_final(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize, CryptoError> {
        self.finish(input, output)
    }

    fn decrypt_final(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize, CryptoError> {
        self.finish(input, output)
    }
}

impl<C: BlockTransform> Resettable for Ctr<C> {
    fn reset(&mut self) {
        self.pos.zeroize();
        self.pos = Position::at(self.original);
    }
}

impl<C: BlockTransform> Checkpointable for Ctr<C> {
    fn save(&mut self) {
        self.saved = self.pos;
    }

    fn restore(&mut self) {
        self.pos = self.saved;
    }
}

impl<C: BlockTransform> Drop for Ctr<C> {
    fn drop(&mut self) {
        self.original.zeroize();
        self.pos.zeroize();
        self.saved.zeroize();
    }
}

/// Encrypt or decrypt data in-place using CTR mode with AES.
/// `nonce` must be 16 bytes (used as the initial counter value).
#[cfg(feature = "aes")]
pub fn ctr_crypt(key: &[u8], nonce: &[u8], data: &mut [u8]) -> Result<(), CryptoError> {
    let mut engine = Ctr::new(crate::aes::AesTransform::new())?;
    engine.init(Direction::Encrypt, key, Some(nonce))?;
    engine.apply_keystream_in_place(data).map(|_| ())
}
