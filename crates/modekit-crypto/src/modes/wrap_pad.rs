//! AES Key Wrap with Padding (NIST SP 800-38F §6.3 KWP, RFC 5649).
//!
//! Accepts key data of any length from 1 to 2³²−1 bytes. The alternative
//! initial value carries a 32-bit prefix and the message length indicator
//! (MLI); key data is zero-padded to a semi-block boundary. When the padded
//! data is a single semi-block, the wrap is one cipher call on `AIV || P`.

use modekit_types::{CryptoError, Direction, ModeId};
use subtle::{Choice, ConstantTimeEq, ConstantTimeGreater, ConstantTimeLess};
use tracing::{debug, warn};
use zeroize::Zeroize;

use super::wrap::{w, w_inv, SEMI_BLOCK};
use crate::provider::{BlockTransform, ModeEngine};

/// Default 32-bit AIV prefix (ICV2 in SP 800-38F).
pub const DEFAULT_AIV_PREFIX: [u8; 4] = [0xA6, 0x59, 0x59, 0xA6];

const BLOCK: usize = 2 * SEMI_BLOCK;

fn padded_len(len: usize) -> usize {
    len.div_ceil(SEMI_BLOCK) * SEMI_BLOCK
}

/// KWP engine over a 16-byte block transform.
pub struct KeyWrapPad<C: BlockTransform> {
    cipher: C,
    prefix: [u8; 4],
    direction: Option<Direction>,
}

impl<C: BlockTransform> KeyWrapPad<C> {
    /// Create an engine over `cipher`. The transform must have a 16-byte block.
    pub fn new(cipher: C) -> Result<Self, CryptoError> {
        if cipher.block_size() != BLOCK {
            return Err(CryptoError::InvalidParameter(
                "key wrap requires a 16-byte block cipher",
            ));
        }
        Ok(Self {
            cipher,
            prefix: DEFAULT_AIV_PREFIX,
            direction: None,
        })
    }

    fn ensure(&self, want: Direction) -> Result<(), CryptoError> {
        match self.direction {
            Some(d) if d == want => Ok(()),
            Some(_) => Err(CryptoError::WrongState(
                "key wrap engine initialized for the other direction",
            )),
            None => Err(CryptoError::WrongState("key wrap engine is not initialized")),
        }
    }

    /// Wrap `key_data`, returning `padded_len + 8` bytes.
    pub fn wrap_key(&mut self, key_data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let mut out = vec![0u8; padded_len(key_data.len()) + SEMI_BLOCK];
        let n = self.encrypt_final(key_data, &mut out)?;
        out.truncate(n);
        Ok(out)
    }

    /// Unwrap `wrapped`, returning exactly MLI bytes of key data.
    pub fn unwrap_key(&mut self, wrapped: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let mut out = vec![0u8; wrapped.len().saturating_sub(SEMI_BLOCK)];
        match self.decrypt_final(wrapped, &mut out) {
            Ok(n) => {
                out.truncate(n);
                Ok(out)
            }
            Err(e) => {
                out.zeroize();
                Err(e)
            }
        }
    }

    /// Constant-time check of the recovered AIV and padding. Returns the MLI
    /// when every check passes.
    fn verify(&self, aiv: &[u8; SEMI_BLOCK], padded: &[u8]) -> Option<usize> {
        let mut mli_bytes = [0u8; 4];
        mli_bytes.copy_from_slice(&aiv[4..]);
        let mli = u64::from(u32::from_be_bytes(mli_bytes));
        let plen = padded.len() as u64;

        let mut ok: Choice = aiv[..4].ct_eq(&self.prefix[..]);
        ok &= mli.ct_gt(&(plen - SEMI_BLOCK as u64));
        ok &= !mli.ct_gt(&plen);
        for (i, byte) in padded.iter().enumerate() {
            let in_pad = !(i as u64).ct_lt(&mli);
            ok &= !(in_pad & !byte.ct_eq(&0));
        }
        if ok.unwrap_u8() == 1 {
            Some(mli as usize)
        } else {
            None
        }
    }
}

impl<C: BlockTransform> ModeEngine for KeyWrapPad<C> {
    fn mode_id(&self) -> ModeId {
        ModeId::Kwp
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
        let prefix = match iv {
            None => DEFAULT_AIV_PREFIX,
            Some(iv) => iv
                .try_into()
                .map_err(|_| CryptoError::InvalidParameter("key wrap pad ICV must be 4 bytes"))?,
        };
        // Unwrap runs the inverse cipher.
        if direction.is_decrypt() {
            self.cipher.set_decrypt_key(key)?;
        } else {
            self.cipher.set_encrypt_key(key)?;
        }
        self.prefix = prefix;
        self.direction = Some(direction);
        debug!(mode = %ModeId::Kwp, %direction, "mode engine initialized");
        Ok(())
    }

    fn iv(&self) -> &[u8] {
        &self.prefix
    }

    fn encrypt(&mut self, _input: &[u8], _output: &mut [u8]) -> Result<usize, CryptoError> {
        Err(CryptoError::UnsupportedOperation(
            "key wrap only supports single-part operation",
        ))
    }

    fn decrypt(&mut self, _input: &[u8], _output: &mut [u8]) -> Result<usize, CryptoError> {
        Err(CryptoError::UnsupportedOperation(
            "key wrap only supports single-part operation",
        ))
    }

    fn encrypt_final(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize, CryptoError> {
        self.ensure(Direction::Encrypt)?;
        let len = input.len();
        if len == 0 {
            return Err(CryptoError::illegal_block_size(
                len,
                "key wrap pad needs at least 1 byte",
            ));
        }
        let mli = u32::try_from(len).map_err(|_| {
            CryptoError::illegal_block_size(len, "key wrap pad input exceeds 2^32 - 1 bytes")
        })?;
        let plen = padded_len(len);
        let out_len = plen + SEMI_BLOCK;
        CryptoError::check_capacity(out_len, output.len())?;

        let mut a = [0u8; SEMI_BLOCK];
        a[..4].copy_from_slice(&self.prefix);
        a[4..].copy_from_slice(&mli.to_be_bytes());

        if plen == SEMI_BLOCK {
            let mut block = [0u8; BLOCK];
            block[..SEMI_BLOCK].copy_from_slice(&a);
            block[SEMI_BLOCK..SEMI_BLOCK + len].copy_from_slice(input);
            let res = self.cipher.encrypt_block(&mut block);
            if res.is_ok() {
                output[..BLOCK].copy_from_slice(&block);
            }
            block.zeroize();
            return res.map(|_| BLOCK);
        }

        let mut r = vec![0u8; plen];
        r[..len].copy_from_slice(input);
        let res = w(&self.cipher, &mut a, &mut r);
        if res.is_ok() {
            output[..SEMI_BLOCK].copy_from_slice(&a);
            output[SEMI_BLOCK..out_len].copy_from_slice(&r);
        }
        r.zeroize();
        res.map(|_| out_len)
    }

    fn decrypt_final(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize, CryptoError> {
        self.ensure(Direction::Decrypt)?;
        let len = input.len();
        if len < BLOCK || len % SEMI_BLOCK != 0 {
            return Err(CryptoError::illegal_block_size(
                len,
                "key wrap pad input must be a multiple of 8 and at least 16 bytes",
            ));
        }
        let plen = len - SEMI_BLOCK;
        CryptoError::check_capacity(plen, output.len())?;

        let mut a = [0u8; SEMI_BLOCK];
        let mut r = vec![0u8; plen];
        let res = if len == BLOCK {
            let mut block = [0u8; BLOCK];
            block.copy_from_slice(input);
            let res = self.cipher.decrypt_block(&mut block);
            a.copy_from_slice(&block[..SEMI_BLOCK]);
            r.copy_from_slice(&block[SEMI_BLOCK..]);
            block.zeroize();
            res
        } else {
            a.copy_from_slice(&input[..SEMI_BLOCK]);
            r.copy_from_slice(&input[SEMI_BLOCK..]);
            w_inv(&self.cipher, &mut a, &mut r)
        };

        let res = res.and_then(|_| match self.verify(&a, &r) {
            Some(mli) => {
                output[..mli].copy_from_slice(&r[..mli]);
                Ok(mli)
            }
            None => {
                warn!(mode = %ModeId::Kwp, len, "key unwrap integrity check failed");
                Err(CryptoError::IntegrityCheckFailed)
            }
        });
        r.zeroize();
        a.zeroize();
        res
    }
}

impl<C: BlockTransform> Drop for KeyWrapPad<C> {
    fn drop(&mut self) {
        self.prefix.zeroize();
    }
}

/// Wrap a key of any length using AES Key Wrap with Padding (RFC 5649).
#[cfg(feature = "aes")]
pub fn key_wrap_pad(kek: &[u8], plaintext_key: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let mut engine = KeyWrapPad::new(crate::aes::AesTransform::new())?;
    engine.init(Direction::Encrypt, kek, None)?;
    engine.wrap_key(plaintext_key)
}

/// Unwrap a key using AES Key Wrap with Padding (RFC 5649).
#[cfg(feature = "aes")]
pub fn key_unwrap_pad(kek: &[u8], wrapped_key: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let mut engine = KeyWrapPad::new(crate::aes::AesTransform::new())?;
    engine.init(Direction::Decrypt, kek, None)?;
    engine.unwrap_key(wrapped_key)
}
