use zeroize::Zeroize;

use super::{ByteStaging, StagedBytes};

/// Staging buffer whose storage always matches its content exactly.
///
/// Every write reallocates to `old + incoming`, so this suits a few large
/// writes followed by one [`take`](ByteStaging::take). After a take the
/// next write starts from fresh storage.
#[derive(Default)]
pub struct ExactStaging {
    storage: Vec<u8>,
}

impl ExactStaging {
    pub fn new() -> Self {
        Self::default()
    }

    /// The staged content.
    pub fn contents(&self) -> &[u8] {
        &self.storage
    }
}

impl ByteStaging for ExactStaging {
    fn write(&mut self, data: &[u8]) {
        if data.is_empty() {
            return;
        }
        if self.storage.is_empty() {
            self.storage = data.to_vec();
            return;
        }
        let mut joined = Vec::with_capacity(self.storage.len() + data.len());
        joined.extend_from_slice(&self.storage);
        joined.extend_from_slice(data);
        let mut old = std::mem::replace(&mut self.storage, joined);
        old.zeroize();
    }

    fn len(&self) -> usize {
        self.storage.len()
    }

    fn take(&mut self) -> StagedBytes {
        let storage = std::mem::take(&mut self.storage);
        let len = storage.len();
        StagedBytes::new(storage, len)
    }

    fn reset(&mut self) {
        self.storage.zeroize();
        self.storage = Vec::new();
    }
}

impl Drop for ExactStaging {
    fn drop(&mut self) {
        self.storage.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_sized_exactly() {
        let mut e = ExactStaging::new();
        e.write(&[1, 2, 3]);
        e.write(&[4]);
        let staged = e.take();
        assert_eq!(staged.len(), 4);
        assert_eq!(staged.capacity(), 4);
        assert_eq!(staged.as_slice(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_take_hands_off_and_resets() {
        let mut e = ExactStaging::new();
        e.write(b"first");
        let first = e.take();
        assert!(e.is_empty());
        assert!(e.take().is_empty());

        e.write(b"second");
        assert_eq!(e.contents(), b"second");
        assert_eq!(first.as_slice(), b"first");
    }

    #[test]
    fn test_reset_discards() {
        let mut e = ExactStaging::new();
        e.write(b"abc");
        e.reset();
        assert_eq!(e.len(), 0);
        e.write(b"d");
        assert_eq!(e.take().into_vec(), b"d");
    }
}
