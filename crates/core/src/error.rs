//! Error types shared by the core crate.

use thiserror::Error;

/// Errors produced by core serialization, parsing and crypto.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Input bytes do not form a valid value of the expected type.
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    /// A read ran past the end of the input.
    #[error("unexpected end of stream")]
    EndOfStream,

    /// A length prefix exceeded the allowed maximum.
    #[error("length {length} exceeds maximum {max}")]
    Oversized { length: u64, max: u64 },

    /// Trailing bytes after a complete value.
    #[error("{0} trailing bytes after value")]
    TrailingBytes(usize),

    /// A cryptographic operation failed.
    #[error("crypto error: {0}")]
    Crypto(String),

    /// Arithmetic overflow in fixed-point math.
    #[error("fixed-point overflow")]
    Overflow,
}

/// Result alias used throughout the core crate.
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
