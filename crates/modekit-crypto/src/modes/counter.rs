//! Counter block arithmetic shared by the CTR-family modes.
//!
//! The GCM convention treats the trailing four bytes of a 16-byte block as a
//! big-endian `u32` and leaves the leading 12 bytes alone; plain CTR treats
//! the whole block as one big-endian 128-bit integer.

use zeroize::Zeroize;

/// Counter block size in bytes.
pub const COUNTER_BLOCK_SIZE: usize = 16;

/// Bytes that precede the 32-bit counter field.
const PREFIX_LEN: usize = COUNTER_BLOCK_SIZE - 4;

/// A 16-byte counter block split into a fixed prefix and a 32-bit counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Zeroize)]
pub struct CounterBlock {
    prefix: [u8; PREFIX_LEN],
    low: u32,
}

impl CounterBlock {
    /// Decode a counter block from its wire layout.
    pub fn from_bytes(block: &[u8; COUNTER_BLOCK_SIZE]) -> Self {
        let mut prefix = [0u8; PREFIX_LEN];
        prefix.copy_from_slice(&block[..PREFIX_LEN]);
        let low = u32::from_be_bytes([block[12], block[13], block[14], block[15]]);
        Self { prefix, low }
    }

    /// Encode the counter block back to its wire layout.
    pub fn to_bytes(&self) -> [u8; COUNTER_BLOCK_SIZE] {
        let mut out = [0u8; COUNTER_BLOCK_SIZE];
        out[..PREFIX_LEN].copy_from_slice(&self.prefix);
        out[PREFIX_LEN..].copy_from_slice(&self.low.to_be_bytes());
        out
    }

    /// Value of the 32-bit counter field.
    pub fn low32(&self) -> u32 {
        self.low
    }

    /// INC32: increment the counter field modulo 2^32.
    pub fn inc32(&mut self) {
        self.low = self.low.wrapping_add(1);
    }

    /// Number of increments before the counter field wraps back to zero.
    pub fn blocks_until_rollover(&self) -> u64 {
        (1u64 << 32) - u64::from(self.low)
    }

    /// Encode the block `offset` increments ahead without touching `self`.
    ///
    /// Callers must ensure `offset < blocks_until_rollover()`.
    pub(crate) fn encode_ahead(&self, offset: u32, out: &mut [u8]) {
        debug_assert!(u64::from(offset) < self.blocks_until_rollover());
        out[..PREFIX_LEN].copy_from_slice(&self.prefix);
        out[PREFIX_LEN..].copy_from_slice(&(self.low + offset).to_be_bytes());
    }

    /// Advance by `n` increments that are known not to wrap.
    pub(crate) fn advance(&mut self, n: u32) {
        debug_assert!(u64::from(n) < self.blocks_until_rollover());
        self.low += n;
    }
}

/// Increment a 128-bit big-endian counter by 1, wrapping to zero.
pub fn increment_be(counter: &mut [u8]) {
    for byte in counter.iter_mut().rev() {
        *byte = byte.wrapping_add(1);
        if *byte != 0 {
            break;
        }
    }
}
