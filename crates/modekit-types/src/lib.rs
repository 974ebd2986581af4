#![forbid(unsafe_code)]
#![doc = "Common error codes and mode identifiers for modekit."]

pub mod algorithm;
pub mod error;

pub use algorithm::*;
pub use error::*;
