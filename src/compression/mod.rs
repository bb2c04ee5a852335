//! Payload compression used by compressed and packed-compressed frames.
//!
//! A [`Compressor`] turns a payload into one self-contained compressed block
//! and back. The compressed output is borrowed from the compressor and stays
//! valid until its next call, so the write path can copy it straight into a
//! frame without an intermediate allocation.

mod error;
mod zlib;

use derive_more::Display;
pub use error::CompressionError;
pub use zlib::ZlibCompressor;

/// Swappable compression algorithm.
pub trait Compressor: Send + std::fmt::Debug {
    /// Compress `src` into the compressor's scratch buffer.
    ///
    /// # Errors
    ///
    /// Returns [`CompressionError`] if the engine fails or stalls.
    fn compress(&mut self, src: &[u8]) -> Result<&[u8], CompressionError>;

    /// Decompress `src` into `dst`, replacing its contents, and return the
    /// decompressed length.
    ///
    /// # Errors
    ///
    /// Returns [`CompressionError`] if `src` is not a complete stream.
    fn decompress(&mut self, src: &[u8], dst: &mut Vec<u8>) -> Result<usize, CompressionError>;
}

/// Compression algorithm negotiated for a channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Display)]
pub enum CompressionType {
    /// Payloads travel uncompressed.
    #[default]
    #[display("none")]
    None,
    /// Payloads are zlib streams.
    #[display("zlib")]
    Zlib,
}

impl CompressionType {
    /// Code carried in the connection handshake.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Zlib => 1,
        }
    }

    /// Parse a handshake code.
    ///
    /// # Errors
    ///
    /// Returns [`CompressionError::Unsupported`] for codes without an
    /// implementation.
    pub fn from_code(code: u8) -> Result<Self, CompressionError> {
        match code {
            0 => Ok(Self::None),
            1 => Ok(Self::Zlib),
            _ => Err(CompressionError::Unsupported { code }),
        }
    }

    /// Build a compressor for this algorithm, or `None` when compression is
    /// off.
    #[must_use]
    pub fn compressor(self, level: u32) -> Option<Box<dyn Compressor>> {
        match self {
            Self::None => None,
            Self::Zlib => Some(Box::new(ZlibCompressor::new(level))),
        }
    }
}

#[cfg(test)]
mod tests;
