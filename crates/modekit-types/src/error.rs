/// Errors raised by block cipher mode engines and staging buffers.
///
/// Every variant describes a caller-input problem; none of them is retried
/// internally.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CryptoError {
    #[error("invalid argument")]
    InvalidArg,
    #[error("invalid key")]
    InvalidKey,
    #[error("invalid parameter: {0}")]
    InvalidParameter(&'static str),

    // Length errors
    #[error("illegal block size: {len} bytes ({reason})")]
    IllegalBlockSize { len: usize, reason: &'static str },
    #[error("buffer length not enough: need {need}, got {got}")]
    ShortBuffer { need: usize, got: usize },

    // Integrity errors
    #[error("integrity check failed")]
    IntegrityCheckFailed,

    // State errors
    #[error("operation not supported: {0}")]
    UnsupportedOperation(&'static str),
    #[error("wrong state: {0}")]
    WrongState(&'static str),
}

impl CryptoError {
    /// Shorthand for [`CryptoError::IllegalBlockSize`].
    pub const fn illegal_block_size(len: usize, reason: &'static str) -> Self {
        Self::IllegalBlockSize { len, reason }
    }

    /// Ensure `got` bytes of output capacity cover `need` bytes.
    pub const fn check_capacity(need: usize, got: usize) -> Result<(), Self> {
        if got < need {
            Err(Self::ShortBuffer { need, got })
        } else {
            Ok(())
        }
    }
}
