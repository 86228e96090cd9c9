//! Errors reported while building a coding.

use thiserror::Error;

/// Error detected while building a coding from bit lengths or frequencies.
///
/// All failures are reported synchronously by the constructors; an
/// [`Encoder`](crate::Encoder) or [`Decoder`](crate::Decoder) that exists
/// is always internally consistent.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodingError {
    /// A declared codeword length exceeds
    /// [`MAX_CODE_SIZE`](crate::MAX_CODE_SIZE).
    #[error("invalid bit length {got}, max {max}")]
    InvalidLength {
        /// The offending length.
        got: u8,
        /// The largest permitted length.
        max: u8,
    },

    /// The bit lengths claim more code space than a prefix tree provides.
    #[error("oversubscribed code: {used} of {available} code values used")]
    Oversubscribed {
        /// Size of the code space the lengths have to share.
        available: u64,
        /// Number of code values the lengths would consume.
        used: u64,
    },

    /// The bit lengths leave part of the code space unused, so some bit
    /// patterns would decode to nothing. Codings with zero or one symbol
    /// are the permitted exceptions and do not raise this.
    #[error("undersubscribed code: {used} of {available} code values used")]
    Undersubscribed {
        /// Size of the code space the lengths have to fill.
        available: u64,
        /// Number of code values the lengths consume.
        used: u64,
    },
}
