use zeroize::Zeroize;

use super::{ByteStaging, StagedBytes};

/// Staging buffer with amortized doubling growth.
///
/// Storage is a zero-filled allocation whose size is the capacity; bytes past
/// the logical length are slack. [`raw`](Self::raw) exposes both without
/// copying.
#[derive(Default)]
pub struct GrowableStaging {
    storage: Vec<u8>,
    len: usize,
}

impl GrowableStaging {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            storage: vec![0u8; capacity],
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Backing storage and logical length. The storage may be longer than the
    /// content.
    pub fn raw(&self) -> (&[u8], usize) {
        (&self.storage, self.len)
    }

    /// The staged content.
    pub fn contents(&self) -> &[u8] {
        &self.storage[..self.len]
    }

    fn grow(&mut self, required: usize) {
        let new_cap = required.max(self.storage.len().saturating_mul(2));
        let mut grown = vec![0u8; new_cap];
        grown[..self.len].copy_from_slice(&self.storage[..self.len]);
        let mut old = std::mem::replace(&mut self.storage, grown);
        old.zeroize();
    }
}

impl ByteStaging for GrowableStaging {
    fn write(&mut self, data: &[u8]) {
        if data.is_empty() {
            return;
        }
        let required = self.len + data.len();
        if required > self.storage.len() {
            self.grow(required);
        }
        self.storage[self.len..required].copy_from_slice(data);
        self.len = required;
    }

    fn len(&self) -> usize {
        self.len
    }

    fn take(&mut self) -> StagedBytes {
        let staged = StagedBytes::new(std::mem::take(&mut self.storage), self.len);
        self.len = 0;
        staged
    }

    fn reset(&mut self) {
        self.storage[..self.len].zeroize();
        self.len = 0;
    }
}

impl Drop for GrowableStaging {
    fn drop(&mut self) {
        self.storage.zeroize();
    }
}
