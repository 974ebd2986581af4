//! AES Key Wrap (NIST SP 800-38F §6.2 KW, RFC 3394).
//!
//! KW is single-shot: the wrapping function W threads every semi-block
//! through 6·(n−1) cipher invocations before any output exists, so there is
//! no meaningful multi-part decomposition. [`ModeEngine::encrypt`] and
//! [`ModeEngine::decrypt`] therefore fail with
//! [`CryptoError::UnsupportedOperation`].
//!
//! At the engine surface the input to `encrypt_final` is the full n
//! semi-blocks, the first of which is a placeholder for the ICV; output has
//! the same length. `decrypt_final` produces `len − 8` bytes of key data.

use modekit_types::{CryptoError, Direction, ModeId};
use subtle::ConstantTimeEq;
use tracing::{debug, warn};
use zeroize::Zeroize;

use crate::provider::{BlockTransform, ModeEngine};

/// Semi-block size in bytes.
pub const SEMI_BLOCK: usize = 8;

/// Default ICV from SP 800-38F §6.2 (ICV1).
pub const DEFAULT_ICV: [u8; SEMI_BLOCK] = [0xA6; SEMI_BLOCK];

const BLOCK: usize = 2 * SEMI_BLOCK;

/// Smallest valid KW buffer: ICV slot plus two semi-blocks of key data.
pub const MIN_WRAP_LEN: usize = BLOCK + SEMI_BLOCK;

/// Wrapping function W. `a` holds the ICV on entry and C0 on exit; `r` holds
/// the n−1 data semi-blocks and is transformed in place.
pub(crate) fn w<C: BlockTransform + ?Sized>(
    cipher: &C,
    a: &mut [u8; SEMI_BLOCK],
    r: &mut [u8],
) -> Result<(), CryptoError> {
    debug_assert!(r.len() % SEMI_BLOCK == 0 && r.len() >= BLOCK);
    let n = (r.len() / SEMI_BLOCK) as u64;
    let mut b = [0u8; BLOCK];
    let res = (|| -> Result<(), CryptoError> {
        for j in 0..6u64 {
            for (i, ri) in r.chunks_mut(SEMI_BLOCK).enumerate() {
                b[..SEMI_BLOCK].copy_from_slice(a);
                b[SEMI_BLOCK..].copy_from_slice(ri);
                cipher.encrypt_block(&mut b)?;
                let t = n * j + i as u64 + 1;
                a.copy_from_slice(&b[..SEMI_BLOCK]);
                *a = (u64::from_be_bytes(*a) ^ t).to_be_bytes();
                ri.copy_from_slice(&b[SEMI_BLOCK..]);
            }
        }
        Ok(())
    })();
    b.zeroize();
    res
}

/// Unwrapping function W⁻¹. `a` holds C0 on entry and the candidate ICV on
/// exit; `r` holds C1..Cn−1 and is transformed in place.
pub(crate) fn w_inv<C: BlockTransform + ?Sized>(
    cipher: &C,
    a: &mut [u8; SEMI_BLOCK],
    r: &mut [u8],
) -> Result<(), CryptoError> {
    debug_assert!(r.len() % SEMI_BLOCK == 0 && r.len() >= BLOCK);
    let n = (r.len() / SEMI_BLOCK) as u64;
    let mut b = [0u8; BLOCK];
    let res = (|| -> Result<(), CryptoError> {
        for j in (0..6u64).rev() {
            for (i, ri) in r.chunks_mut(SEMI_BLOCK).enumerate().rev() {
                let t = n * j + i as u64 + 1;
                b[..SEMI_BLOCK].copy_from_slice(&(u64::from_be_bytes(*a) ^ t).to_be_bytes());
                b[SEMI_BLOCK..].copy_from_slice(ri);
                cipher.decrypt_block(&mut b)?;
                a.copy_from_slice(&b[..SEMI_BLOCK]);
                ri.copy_from_slice(&b[SEMI_BLOCK..]);
            }
        }
        Ok(())
    })();
    b.zeroize();
    res
}

fn check_wrap_len(len: usize) -> Result<(), CryptoError> {
    if len < MIN_WRAP_LEN {
        return Err(CryptoError::illegal_block_size(
            len,
            "key wrap needs at least 24 bytes",
        ));
    }
    if len % SEMI_BLOCK != 0 {
        return Err(CryptoError::illegal_block_size(
            len,
            "key wrap length must be a multiple of 8",
        ));
    }
    Ok(())
}

/// KW engine over a 16-byte block transform.
pub struct KeyWrap<C: BlockTransform> {
    cipher: C,
    icv: [u8; SEMI_BLOCK],
    direction: Option<Direction>,
}

impl<C: BlockTransform> KeyWrap<C> {
    /// Create an engine over `cipher`. The transform must have a 16-byte block.
    pub fn new(cipher: C) -> Result<Self, CryptoError> {
        if cipher.block_size() != BLOCK {
            return Err(CryptoError::InvalidParameter(
                "key wrap requires a 16-byte block cipher",
            ));
        }
        Ok(Self {
            cipher,
            icv: DEFAULT_ICV,
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

    /// Wrap `key_data` (at least 16 bytes, a multiple of 8), returning
    /// `key_data.len() + 8` bytes.
    pub fn wrap_key(&mut self, key_data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let mut buf = vec![0u8; SEMI_BLOCK + key_data.len()];
        buf[SEMI_BLOCK..].copy_from_slice(key_data);
        let mut out = vec![0u8; buf.len()];
        let res = self.encrypt_final(&buf, &mut out);
        buf.zeroize();
        res.map(|_| out)
    }

    /// Unwrap `wrapped`, returning `wrapped.len() - 8` bytes of key data.
    pub fn unwrap_key(&mut self, wrapped: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let mut out = vec![0u8; wrapped.len().saturating_sub(SEMI_BLOCK)];
        let n = self.decrypt_final(wrapped, &mut out)?;
        out.truncate(n);
        Ok(out)
    }
}

impl<C: BlockTransform> ModeEngine for KeyWrap<C> {
    fn mode_id(&self) -> ModeId {
        ModeId::Kw
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
        let icv = match iv {
            None => DEFAULT_ICV,
            Some(iv) => iv
                .try_into()
                .map_err(|_| CryptoError::InvalidParameter("key wrap ICV must be 8 bytes"))?,
        };
        // Unwrap runs the inverse cipher.
        if direction.is_decrypt() {
            self.cipher.set_decrypt_key(key)?;
        } else {
            self.cipher.set_encrypt_key(key)?;
        }
        self.icv = icv;
        self.direction = Some(direction);
        debug!(
            mode = %ModeId::Kw,
            %direction,
            custom_icv = iv.is_some(),
            "mode engine initialized"
        );
        Ok(())
    }

    fn iv(&self) -> &[u8] {
        &self.icv
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
        check_wrap_len(len)?;
        CryptoError::check_capacity(len, output.len())?;

        let mut a = self.icv;
        let mut r = input[SEMI_BLOCK..].to_vec();
        let res = w(&self.cipher, &mut a, &mut r);
        if res.is_ok() {
            output[..SEMI_BLOCK].copy_from_slice(&a);
            output[SEMI_BLOCK..len].copy_from_slice(&r);
        }
        r.zeroize();
        res.map(|_| len)
    }

    fn decrypt_final(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize, CryptoError> {
        self.ensure(Direction::Decrypt)?;
        let len = input.len();
        check_wrap_len(len)?;
        let out_len = len - SEMI_BLOCK;
        CryptoError::check_capacity(out_len, output.len())?;

        let mut a = [0u8; SEMI_BLOCK];
        a.copy_from_slice(&input[..SEMI_BLOCK]);
        let mut r = input[SEMI_BLOCK..].to_vec();
        let res = w_inv(&self.cipher, &mut a, &mut r).and_then(|_| {
            if a[..].ct_eq(&self.icv[..]).unwrap_u8() == 1 {
                Ok(out_len)
            } else {
                warn!(mode = %ModeId::Kw, len, "key unwrap integrity check failed");
                Err(CryptoError::IntegrityCheckFailed)
            }
        });
        if res.is_ok() {
            output[..out_len].copy_from_slice(&r);
        }
        r.zeroize();
        a.zeroize();
        res
    }
}

impl<C: BlockTransform> Drop for KeyWrap<C> {
    fn drop(&mut self) {
        self.icv.zeroize();
    }
}

/// Wrap a key using AES Key Wrap (RFC 3394) with the default ICV.
#[cfg(feature = "aes")]
pub fn key_wrap(kek: &[u8], plaintext_key: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let mut engine = KeyWrap::new(crate::aes::AesTransform::new())?;
    engine.init(Direction::Encrypt, kek, None)?;
    engine.wrap_key(plaintext_key)
}

/// Unwrap a key using AES Key Wrap (RFC 3394) with the default ICV.
#[cfg(feature = "aes")]
pub fn key_unwrap(kek: &[u8], wrapped_key: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let mut engine = KeyWrap::new(crate::aes::AesTransform::new())?;
    engine.init(Direction::Decrypt, kek, None)?;
    engine.unwrap_key(wrapped_key)
}

#[cfg(all(test, feature = "aes"))]
mod tests {
    use super::*;
    use crate::aes::AesTransform;
    use crate::test_utils::{hex, to_hex, CountingAes};
    use std::sync::atomic::Ordering;

    const KEK: &str = "000102030405060708090a0b0c0d0e0f";

    fn engine(direction: Direction, icv: Option<&[u8]>) -> KeyWrap<AesTransform> {
        let mut kw = KeyWrap::new(AesTransform::new()).unwrap();
        kw.init(direction, &hex(KEK), icv).unwrap();
        kw
    }

    // RFC 3394 §4.1: 128-bit key data with a 128-bit KEK.
    #[test]
    fn test_kw_rfc3394_4_1() {
        let wrapped = key_wrap(&hex(KEK), &hex("00112233445566778899aabbccddeeff")).unwrap();
        assert_eq!(
            to_hex(&wrapped),
            "1fa68b0a8112b447aef34bd8fb5a7b829d3e862371d2cfe5"
        );
        let key = key_unwrap(&hex(KEK), &wrapped).unwrap();
        assert_eq!(to_hex(&key), "00112233445566778899aabbccddeeff");
    }

    #[test]
    fn test_kw_engine_output_length_equals_input_length() {
        for data_len in [16usize, 24, 32, 40] {
            let mut buf = vec![0u8; SEMI_BLOCK + data_len];
            for (i, b) in buf[SEMI_BLOCK..].iter_mut().enumerate() {
                *b = i as u8;
            }
            let mut wrapped = vec![0u8; buf.len()];
            let n = engine(Direction::Encrypt, None)
                .encrypt_final(&buf, &mut wrapped)
                .unwrap();
            assert_eq!(n, buf.len());

            let mut unwrapped = vec![0u8; data_len];
            let n = engine(Direction::Decrypt, None)
                .decrypt_final(&wrapped, &mut unwrapped)
                .unwrap();
            assert_eq!(n, data_len);
            assert_eq!(unwrapped, &buf[SEMI_BLOCK..]);
        }
    }

    #[test]
    fn test_kw_icv_slot_contents_are_ignored() {
        let mut a = [0u8; 24];
        let mut b = [0xffu8; 24];
        a[8..].copy_from_slice(&[7u8; 16]);
        b[8..].copy_from_slice(&[7u8; 16]);
        let mut wa = [0u8; 24];
        let mut wb = [0u8; 24];
        engine(Direction::Encrypt, None).encrypt_final(&a, &mut wa).unwrap();
        engine(Direction::Encrypt, None).encrypt_final(&b, &mut wb).unwrap();
        assert_eq!(wa, wb);
    }

    #[test]
    fn test_kw_every_bit_flip_is_detected() {
        let data = hex("00112233445566778899aabbccddeeff0001020304050607");
        let wrapped = engine(Direction::Encrypt, None).wrap_key(&data).unwrap();
        for bit in 0..wrapped.len() * 8 {
            let mut tampered = wrapped.clone();
            tampered[bit / 8] ^= 1 << (bit % 8);
            let mut out = vec![0x55u8; data.len()];
            let res = engine(Direction::Decrypt, None).decrypt_final(&tampered, &mut out);
            assert_eq!(res, Err(CryptoError::IntegrityCheckFailed), "bit {bit}");
            assert_eq!(out, vec![0x55u8; data.len()], "output touched at bit {bit}");
        }
    }

    #[test]
    fn test_kw_custom_icv() {
        let icv_a = hex("0102030405060708");
        let icv_b = hex("0807060504030201");
        let data = [0x42u8; 32];

        let wrapped = engine(Direction::Encrypt, Some(&icv_a))
            .wrap_key(&data)
            .unwrap();
        assert_eq!(
            engine(Direction::Decrypt, Some(&icv_b)).unwrap_key(&wrapped),
            Err(CryptoError::IntegrityCheckFailed)
        );
        assert_eq!(
            engine(Direction::Decrypt, None).unwrap_key(&wrapped),
            Err(CryptoError::IntegrityCheckFailed)
        );
        assert_eq!(
            engine(Direction::Decrypt, Some(&icv_a))
                .unwrap_key(&wrapped)
                .unwrap(),
            data
        );

        // Omitting the ICV uses and checks A6A6A6A6A6A6A6A6.
        let wrapped = engine(Direction::Encrypt, None).wrap_key(&data).unwrap();
        assert!(engine(Direction::Decrypt, Some(&DEFAULT_ICV))
            .unwrap_key(&wrapped)
            .is_ok());
        assert!(engine(Direction::Decrypt, Some(&icv_a))
            .unwrap_key(&wrapped)
            .is_err());
        assert_eq!(engine(Direction::Encrypt, None).iv(), &DEFAULT_ICV);
    }

    #[test]
    fn test_kw_length_rejected_before_cipher() {
        let (cipher, calls) = CountingAes::new();
        let mut kw = KeyWrap::new(cipher).unwrap();
        kw.init(Direction::Encrypt, &hex(KEK), None).unwrap();
        let mut out = [0u8; 64];
        for len in [0usize, 8, 16, 23, 25, 31, 33] {
            assert!(matches!(
                kw.encrypt_final(&vec![0u8; len], &mut out),
                Err(CryptoError::IllegalBlockSize { .. })
            ));
        }

        let (cipher, dcalls) = CountingAes::new();
        let mut kw = KeyWrap::new(cipher).unwrap();
        kw.init(Direction::Decrypt, &hex(KEK), None).unwrap();
        for len in [0usize, 16, 20, 28] {
            assert!(matches!(
                kw.decrypt_final(&vec![0u8; len], &mut out),
                Err(CryptoError::IllegalBlockSize { .. })
            ));
        }
        assert_eq!(calls.load(Ordering::Relaxed), 0);
        assert_eq!(dcalls.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_kw_multi_part_and_state_errors() {
        let mut kw = engine(Direction::Encrypt, None);
        let mut out = [0u8; 32];
        assert!(matches!(
            kw.encrypt(&[0u8; 24], &mut out),
            Err(CryptoError::UnsupportedOperation(_))
        ));
        assert!(matches!(
            kw.decrypt(&[0u8; 24], &mut out),
            Err(CryptoError::UnsupportedOperation(_))
        ));
        assert!(matches!(
            kw.decrypt_final(&[0u8; 24], &mut out),
            Err(CryptoError::WrongState(_))
        ));
        assert!(matches!(kw.update_aad(b"x"), Err(CryptoError::WrongState(_))));
        assert_eq!(kw.buffered_len(), 0);

        let mut fresh = KeyWrap::new(AesTransform::new()).unwrap();
        assert!(matches!(
            fresh.encrypt_final(&[0u8; 24], &mut out),
            Err(CryptoError::WrongState(_))
        ));
        assert!(matches!(
            fresh.init(Direction::Encrypt, &hex(KEK), Some(&[0u8; 16])),
            Err(CryptoError::InvalidParameter(_))
        ));
        assert!(matches!(
            fresh.init(Direction::Encrypt, &[0u8; 7], None),
            Err(CryptoError::InvalidKey)
        ));
    }

    #[test]
    fn test_kw_short_output() {
        let mut kw = engine(Direction::Encrypt, None);
        let mut out = [0u8; 23];
        assert_eq!(
            kw.encrypt_final(&[0u8; 24], &mut out),
            Err(CryptoError::ShortBuffer { need: 24, got: 23 })
        );
        let mut kw = engine(Direction::Decrypt, None);
        let mut out = [0u8; 15];
        assert_eq!(
            kw.decrypt_final(&[0u8; 24], &mut out),
            Err(CryptoError::ShortBuffer { need: 16, got: 15 })
        );
    }
}
