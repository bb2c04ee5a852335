//! Errors raised while decoding or encoding frame headers.

use thiserror::Error;

/// Wire-level violations of the RIPC frame layout.
///
/// These are detected before any payload is interpreted. A framing error
/// leaves the byte stream without a trustworthy frame boundary, so callers
/// normally tear the channel down.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum FramingError {
    /// The declared frame length cannot even hold the fixed header.
    #[error("frame length {length} is shorter than the {minimum}-byte header")]
    InvalidFrameLength {
        /// Length read from the wire.
        length: usize,
        /// Smallest acceptable length.
        minimum: usize,
    },

    /// An optional header runs past the end of its frame.
    #[error("truncated optional header: have {have} bytes, need {need}")]
    TruncatedHeader {
        /// Bytes available after the fixed header.
        have: usize,
        /// Bytes required by the optional header.
        need: usize,
    },

    /// The extended flags name neither a first nor a continuation fragment.
    #[error("unsupported extended flags {flags:#04x}")]
    UnknownExtendedFlags {
        /// Raw extended-flags byte.
        flags: u8,
    },

    /// An outbound frame would not fit the 16-bit length field or the
    /// configured frame size.
    #[error("frame of {size} bytes exceeds maximum {max}")]
    FrameTooLarge {
        /// Size the frame would have.
        size: usize,
        /// Largest permitted frame.
        max: usize,
    },
}
