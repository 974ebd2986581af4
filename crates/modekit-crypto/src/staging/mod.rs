//! Byte staging buffers for partial, not-yet-block-aligned input.
//!
//! Two strategies:
//! - [`GrowableStaging`] amortizes many small appends by doubling its
//!   storage.
//! - [`ExactStaging`] keeps storage sized to exactly the staged bytes and
//!   hands it off with [`ByteStaging::take`].
//!
//! Both separate logical length from physical capacity. Consumers must
//! treat [`StagedBytes::len`] as authoritative, never the storage size.

mod exact;
mod growable;

pub use exact::ExactStaging;
pub use growable::GrowableStaging;

use bytes::Buf;
use modekit_types::CryptoError;
use zeroize::Zeroize;

/// Owned storage handed out by a staging buffer, plus its logical length.
pub struct StagedBytes {
    storage: Vec<u8>,
    len: usize,
}

impl StagedBytes {
    pub(crate) fn new(storage: Vec<u8>, len: usize) -> Self {
        debug_assert!(len <= storage.len());
        Self { storage, len }
    }

    /// The staged content, `len()` bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.storage[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Physical size of the storage.
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Consume into a `Vec` holding only the content. Slack is wiped first.
    pub fn into_vec(mut self) -> Vec<u8> {
        let mut storage = std::mem::take(&mut self.storage);
        storage[self.len..].zeroize();
        storage.truncate(self.len);
        storage
    }
}

impl AsRef<[u8]> for StagedBytes {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl Drop for StagedBytes {
    fn drop(&mut self) {
        self.storage.zeroize();
    }
}

/// Common interface of the staging strategies.
pub trait ByteStaging {
    /// Append `data`.
    fn write(&mut self, data: &[u8]);

    /// Logical length of the staged content.
    fn len(&self) -> usize;

    /// Hand the staged content to the caller and empty the buffer.
    fn take(&mut self) -> StagedBytes;

    /// Discard the staged content, wiping it.
    fn reset(&mut self);

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append `bytes[offset..offset + length]`.
    fn write_range(
        &mut self,
        bytes: &[u8],
        offset: usize,
        length: usize,
    ) -> Result<(), CryptoError> {
        let end = offset
            .checked_add(length)
            .filter(|&end| end <= bytes.len())
            .ok_or(CryptoError::InvalidArg)?;
        self.write(&bytes[offset..end]);
        Ok(())
    }

    /// Drain `buf`, copying each contiguous chunk straight from its storage.
    fn write_buf<B: Buf>(&mut self, buf: &mut B)
    where
        Self: Sized,
    {
        while buf.has_remaining() {
            let chunk = buf.chunk();
            let n = chunk.len();
            self.write(chunk);
            buf.advance(n);
        }
    }
}
