//! Block cipher modes of operation.
//!
//! Each mode runs on top of a keyed single-block cipher through the
//! [`BlockTransform`](crate::provider::BlockTransform) trait and exposes the
//! [`ModeEngine`](crate::provider::ModeEngine) surface.
//!
//! - [`gctr`]: GCM counter mode with 32-bit counter rollover handling.
//! - [`ctr`]: full-width streaming counter mode.
//! - [`wrap`]: AES Key Wrap (KW).
//! - [`wrap_pad`]: AES Key Wrap with Padding (KWP).

pub mod counter;
pub mod ctr;
pub mod gctr;
pub mod wrap;
pub mod wrap_pad;

/// `data[i] ^= keystream[i]` over the shorter of the two.
#[inline]
pub(crate) fn xor_in_place(data: &mut [u8], keystream: &[u8]) {
    for (d, &k) in data.iter_mut().zip(keystream) {
        *d ^= k;
    }
}
