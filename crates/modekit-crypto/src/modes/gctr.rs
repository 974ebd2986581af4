//! GCTR: the counter mode beneath GCM (NIST SP 800-38D §6.5).
//!
//! Only the trailing 32 bits of the counter block are incremented, modulo
//! 2^32. Whole-block batches that cannot wrap the counter field take a bulk
//! path that precomputes keystream for several blocks at once; a batch that
//! would wrap is processed one block at a time with INC32.

use modekit_types::{CryptoError, Direction, ModeId};
use tracing::{debug, trace};
use zeroize::Zeroize;

use super::counter::{CounterBlock, COUNTER_BLOCK_SIZE};
use super::xor_in_place;
use crate::provider::{BlockTransform, Checkpointable, ModeEngine, Resettable};

const BLOCK: usize = COUNTER_BLOCK_SIZE;

/// Blocks of keystream generated per bulk batch.
const BATCH_BLOCKS: usize = 8;

/// GCTR engine over a 16-byte block transform.
pub struct Gctr<C: BlockTransform> {
    cipher: C,
    /// Initial counter block captured at init.
    icb: CounterBlock,
    counter: CounterBlock,
    saved: CounterBlock,
    /// Wire form of `counter`, kept in sync for [`ModeEngine::iv`].
    register: [u8; BLOCK],
    direction: Option<Direction>,
}

impl<C: BlockTransform> Gctr<C> {
    /// Create an engine over `cipher`. The transform must have a 16-byte block.
    pub fn new(cipher: C) -> Result<Self, CryptoError> {
        if cipher.block_size() != BLOCK {
            return Err(CryptoError::InvalidParameter(
                "GCTR requires a 16-byte block cipher",
            ));
        }
        let zero = CounterBlock::from_bytes(&[0u8; BLOCK]);
        Ok(Self {
            cipher,
            icb: zero,
            counter: zero,
            saved: zero,
            register: [0u8; BLOCK],
            direction: None,
        })
    }

    /// Create an engine over an already-keyed transform, starting at `icb`.
    ///
    /// This is how a GCM driver builds its GCTR after deriving J0.
    pub fn with_counter(cipher: C, icb: &[u8]) -> Result<Self, CryptoError> {
        let mut engine = Self::new(cipher)?;
        engine.load_icb(icb)?;
        engine.direction = Some(Direction::Encrypt);
        Ok(engine)
    }

    fn load_icb(&mut self, icb: &[u8]) -> Result<(), CryptoError> {
        let icb: &[u8; BLOCK] = icb.try_into().map_err(|_| {
            CryptoError::InvalidParameter("initial counter block must be 16 bytes")
        })?;
        self.icb = CounterBlock::from_bytes(icb);
        self.counter = self.icb;
        self.saved = self.icb;
        self.register = *icb;
        Ok(())
    }

    fn ensure_ready(&self) -> Result<(), CryptoError> {
        match self.direction {
            Some(_) => Ok(()),
            None => Err(CryptoError::WrongState("GCTR engine is not initialized")),
        }
    }

    fn check_update(&self, len: usize) -> Result<(), CryptoError> {
        self.ensure_ready()?;
        if len % BLOCK != 0 {
            return Err(CryptoError::illegal_block_size(
                len,
                "GCTR update requires a multiple of 16 bytes",
            ));
        }
        Ok(())
    }

    /// Process whole blocks. `input.len()` must be a multiple of 16.
    pub fn update(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize, CryptoError> {
        let len = input.len();
        self.check_update(len)?;
        CryptoError::check_capacity(len, output.len())?;

        let data = &mut output[..len];
        data.copy_from_slice(input);
        self.crypt_blocks(data)?;
        Ok(len)
    }

    /// In-place form of [`update`](Self::update).
    pub fn update_in_place(&mut self, data: &mut [u8]) -> Result<usize, CryptoError> {
        self.check_update(data.len())?;
        self.crypt_blocks(data)?;
        Ok(data.len())
    }

    /// Process all of `input`, including a trailing partial block, then
    /// return the counter to the initial counter block.
    ///
    /// The reset happens whether or not processing succeeds.
    pub fn do_final(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize, CryptoError> {
        let len = input.len();
        let res = self
            .ensure_ready()
            .and_then(|_| CryptoError::check_capacity(len, output.len()))
            .and_then(|_| {
                let data = &mut output[..len];
                data.copy_from_slice(input);
                self.finish_in_place(data)
            });
        self.finalize(res, len)
    }

    /// In-place form of [`do_final`](Self::do_final).
    pub fn do_final_in_place(&mut self, data: &mut [u8]) -> Result<usize, CryptoError> {
        let len = data.len();
        let res = self
            .ensure_ready()
            .and_then(|_| self.finish_in_place(data));
        self.finalize(res, len)
    }

    fn finalize(
        &mut self,
        res: Result<usize, CryptoError>,
        len: usize,
    ) -> Result<usize, CryptoError> {
        trace!(ok = res.is_ok(), len, "GCTR final, counter reset");
        self.reset();
        res
    }

    fn finish_in_place(&mut self, data: &mut [u8]) -> Result<usize, CryptoError> {
        let len = data.len();
        let whole = len - len % BLOCK;
        self.crypt_blocks(&mut data[..whole])?;
        if whole < len {
            let mut keystream = self.counter.to_bytes();
            if let Err(e) = self.cipher.encrypt_block(&mut keystream) {
                data.zeroize();
                return Err(e);
            }
            xor_in_place(&mut data[whole..], &keystream);
            keystream.zeroize();
            self.counter.inc32();
        }
        Ok(len)
    }

    /// Whole blocks, already validated. On failure `data` is wiped and the
    /// counter rolls back.
    fn crypt_blocks(&mut self, data: &mut [u8]) -> Result<(), CryptoError> {
        let start = self.counter;
        let blocks = (data.len() / BLOCK) as u64;
        let until = self.counter.blocks_until_rollover();
        let res = if blocks < until {
            self.crypt_bulk(data)
        } else {
            debug!(
                blocks,
                blocks_until_rollover = until,
                "GCTR batch reaches the 32-bit counter rollover, processing block by block"
            );
            self.crypt_blockwise(data)
        };

        if let Err(e) = res {
            data.zeroize();
            self.counter = start;
            self.sync_register();
            return Err(e);
        }
        self.sync_register();
        Ok(())
    }

    /// Bulk path: the batch is known not to wrap the counter field.
    fn crypt_bulk(&mut self, data: &mut [u8]) -> Result<(), CryptoError> {
        let mut keystream = [0u8; BATCH_BLOCKS * BLOCK];
        let res = (|| -> Result<(), CryptoError> {
            for chunk in data.chunks_mut(BATCH_BLOCKS * BLOCK) {
                let n = chunk.len() / BLOCK;
                for (i, ks) in keystream[..chunk.len()].chunks_mut(BLOCK).enumerate() {
                    self.counter.encode_ahead(i as u32, ks);
                    self.cipher.encrypt_block(ks)?;
                }
                xor_in_place(chunk, &keystream[..chunk.len()]);
                self.counter.advance(n as u32);
            }
            Ok(())
        })();
        keystream.zeroize();
        res
    }

    /// Rollover-safe path: one block at a time with INC32.
    fn crypt_blockwise(&mut self, data: &mut [u8]) -> Result<(), CryptoError> {
        let mut keystream = [0u8; BLOCK];
        let res = (|| -> Result<(), CryptoError> {
            for block in data.chunks_mut(BLOCK) {
                keystream = self.counter.to_bytes();
                self.cipher.encrypt_block(&mut keystream)?;
                xor_in_place(block, &keystream);
                self.counter.inc32();
            }
            Ok(())
        })();
        keystream.zeroize();
        res
    }

    fn sync_register(&mut self) {
        self.register = self.counter.to_bytes();
    }
}

impl<C: BlockTransform> ModeEngine for Gctr<C> {
    fn mode_id(&self) -> ModeId {
        ModeId::Gctr
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
        let icb = iv.ok_or(CryptoError::InvalidParameter(
            "GCTR requires an initial counter block",
        ))?;
        if icb.len() != BLOCK {
            return Err(CryptoError::InvalidParameter(
                "initial counter block must be 16 bytes",
            ));
        }
        // Counter modes only ever run the forward cipher.
        self.cipher.set_encrypt_key(key)?;
        self.load_icb(icb)?;
        self.direction = Some(direction);
        debug!(mode = %ModeId::Gctr, %direction, "mode engine initialized");
        Ok(())
    }

    fn iv(&self) -> &[u8] {
        &self.register
    }

    fn encrypt(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize, CryptoError> {
        self.update(input, output)
    }

    fn decrypt(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize, CryptoError> {
        self.update(input, output)
    }

    fn encrypt_final(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize, CryptoError> {
        self.do_final(input, output)
    }

    fn decrypt_final(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize, CryptoError> {
        self.do_final(input, output)
    }
}

impl<C: BlockTransform> Resettable for Gctr<C> {
    fn reset(&mut self) {
        self.counter = self.icb;
        self.sync_register();
    }
}

impl<C: BlockTransform> Checkpointable for Gctr<C> {
    fn save(&mut self) {
        self.saved = self.counter;
    }

    fn restore(&mut self) {
        self.counter = self.saved;
        self.sync_register();
    }
}

impl<C: BlockTransform> Drop for Gctr<C> {
    fn drop(&mut self) {
        self.icb.zeroize();
        self.counter.zeroize();
        self.saved.zeroize();
        self.register.zeroize();
    }
}

/// Apply GCTR with AES to `data` in-place, starting from `icb`.
#[cfg(feature = "aes")]
pub fn gctr_crypt(key: &[u8], icb: &[u8], data: &mut [u8]) -> Result<(), CryptoError> {
    let mut engine = Gctr::new(crate::aes::AesTransform::new())?;
    engine.init(Direction::Encrypt, key, Some(icb))?;
    engine.do_final_in_place(data).map(|_| ())
}
