#![doc = "Block cipher modes of operation: GCTR, CTR, AES key wrap, and byte staging."]
#![forbid(unsafe_code)]

// Core traits
pub mod provider;

// Block ciphers
#[cfg(feature = "aes")]
pub mod aes;

// Modes of operation
#[cfg(feature = "modes")]
pub mod modes;

// Partial-block buffering
#[cfg(feature = "staging")]
pub mod staging;

#[cfg(all(test, feature = "aes"))]
mod test_utils;

pub use modekit_types::{CryptoError, Direction, ModeId};
