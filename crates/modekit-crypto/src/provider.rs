//! Trait-based seams between mode engines and the block ciphers beneath them.
//!
//! [`BlockTransform`] is the only thing an engine needs from a cipher: a
//! keyed, fixed-size, single-block permutation. [`ModeEngine`] is the surface
//! a higher-level cipher driver talks to. Optional behaviour is split into
//! capability traits ([`Resettable`], [`Checkpointable`]) that only the modes
//! able to honour them implement.

use modekit_types::{CryptoError, Direction, ModeId};

/// A keyed single-block cipher (e.g., AES).
///
/// Once keyed, the transform is treated as immutable; engines never call the
/// key-setting methods except from their own `init`.
pub trait BlockTransform {
    /// Block size in bytes.
    fn block_size(&self) -> usize;

    /// Key the transform for the forward direction.
    fn set_encrypt_key(&mut self, key: &[u8]) -> Result<(), CryptoError>;

    /// Key the transform for the inverse direction.
    fn set_decrypt_key(&mut self, key: &[u8]) -> Result<(), CryptoError>;

    /// Encrypt a single block in-place. `block.len()` must equal `block_size()`.
    fn encrypt_block(&self, block: &mut [u8]) -> Result<(), CryptoError>;

    /// Decrypt a single block in-place. `block.len()` must equal `block_size()`.
    fn decrypt_block(&self, block: &mut [u8]) -> Result<(), CryptoError>;
}

impl<T: BlockTransform + ?Sized> BlockTransform for Box<T> {
    fn block_size(&self) -> usize {
        (**self).block_size()
    }

    fn set_encrypt_key(&mut self, key: &[u8]) -> Result<(), CryptoError> {
        (**self).set_encrypt_key(key)
    }

    fn set_decrypt_key(&mut self, key: &[u8]) -> Result<(), CryptoError> {
        (**self).set_decrypt_key(key)
    }

    fn encrypt_block(&self, block: &mut [u8]) -> Result<(), CryptoError> {
        (**self).encrypt_block(block)
    }

    fn decrypt_block(&self, block: &mut [u8]) -> Result<(), CryptoError> {
        (**self).decrypt_block(block)
    }
}

/// The operation surface every mode of operation exposes.
///
/// Lengths are taken from `input.len()`; `output` must be large enough for
/// the bytes the call produces. On error nothing is written to `output`
/// that could be mistaken for valid data.
pub trait ModeEngine {
    /// Identifier of the mode, used for diagnostics.
    fn mode_id(&self) -> ModeId;

    /// Block size of the underlying transform.
    fn block_size(&self) -> usize;

    /// Key the transform and establish the initial register.
    ///
    /// `iv == None` selects the mode default; modes without a default reject
    /// it with [`CryptoError::InvalidParameter`].
    fn init(
        &mut self,
        direction: Direction,
        key: &[u8],
        iv: Option<&[u8]>,
    ) -> Result<(), CryptoError>;

    /// Current contents of the IV/counter register.
    fn iv(&self) -> &[u8];

    /// Encrypt `input` into `output`, returning the number of bytes written.
    fn encrypt(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize, CryptoError>;

    /// Decrypt `input` into `output`, returning the number of bytes written.
    fn decrypt(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize, CryptoError>;

    /// Last encryption step. Modes without special final handling forward
    /// to [`encrypt`](Self::encrypt).
    fn encrypt_final(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize, CryptoError> {
        self.encrypt(input, output)
    }

    /// Last decryption step. Modes without special final handling forward
    /// to [`decrypt`](Self::decrypt).
    fn decrypt_final(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize, CryptoError> {
        self.decrypt(input, output)
    }

    /// Feed associated data. Only AEAD-capable modes accept it.
    fn update_aad(&mut self, _aad: &[u8]) -> Result<(), CryptoError> {
        Err(CryptoError::WrongState("mode does not accept associated data"))
    }

    /// Bytes accepted but not yet emitted.
    fn buffered_len(&self) -> usize {
        0
    }
}

/// Modes that can return to the register state established by `init`.
pub trait Resettable {
    /// Restore the register to the IV captured at `init`.
    fn reset(&mut self);
}

/// Modes that can checkpoint their register and roll back to it.
pub trait Checkpointable {
    /// Record the current register state.
    fn save(&mut self);

    /// Return to the last saved state (or the `init` state if none was saved).
    fn restore(&mut self);
}
