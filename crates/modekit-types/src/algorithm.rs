use core::fmt;

/// Mode-of-operation identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModeId {
    /// Full-width counter mode (128-bit big-endian increment).
    Ctr,
    /// GCM counter mode (32-bit increment of the trailing counter field).
    Gctr,
    /// AES Key Wrap (NIST SP 800-38F KW, RFC 3394).
    Kw,
    /// AES Key Wrap with Padding (NIST SP 800-38F KWP, RFC 5649).
    Kwp,
}

impl ModeId {
    /// Canonical upper-case mode name.
    pub const fn name(self) -> &'static str {
        match self {
            ModeId::Ctr => "CTR",
            ModeId::Gctr => "GCTR",
            ModeId::Kw => "KW",
            ModeId::Kwp => "KWP",
        }
    }
}

impl fmt::Display for ModeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Cipher direction selected at engine initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Encrypt,
    Decrypt,
}

impl Direction {
    pub const fn is_decrypt(self) -> bool {
        matches!(self, Direction::Decrypt)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Encrypt => f.write_str("encrypt"),
            Direction::Decrypt => f.write_str("decrypt"),
        }
    }
}
