use thiserror::Error;

/// Failures reported by [`encrypt`](super::encrypt) and
/// [`decrypt`](super::decrypt).
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum CipherError {
    /// The output buffer cannot hold the result.
    #[error("output buffer too small: need {needed} bytes, have {available}")]
    BufferTooSmall {
        /// Bytes required.
        needed: usize,
        /// Bytes available.
        available: usize,
    },
    /// The channel has no shared secret.
    #[error("no shared secret for this channel")]
    NoKey,
    /// Nothing to process.
    #[error("empty input")]
    EmptyInput,
    /// The payload length does not fit the block's length field.
    #[error("payload of {len} bytes is too large to encrypt")]
    InputTooLarge {
        /// Payload length.
        len: usize,
    },
    /// The block does not decode to a consistent payload.
    #[error("invalid ciphertext of {len} bytes")]
    InvalidCiphertext {
        /// Block length.
        len: usize,
    },
}
