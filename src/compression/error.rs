use thiserror::Error;

/// Failure reported by a [`Compressor`](super::Compressor).
#[derive(Debug, Error)]
pub enum CompressionError {
    /// The deflate engine rejected the input.
    #[error("compression failed: {0}")]
    Compress(#[from] flate2::CompressError),

    /// The compressed bytes are not a valid zlib stream.
    #[error("decompression failed: {0}")]
    Decompress(#[from] flate2::DecompressError),

    /// Input ran out before the compressed stream was terminated.
    #[error("compressed stream truncated after {consumed} of {len} bytes")]
    Truncated {
        /// Input bytes the engine consumed.
        consumed: usize,
        /// Input bytes supplied.
        len: usize,
    },

    /// The engine stopped consuming input while output space was available.
    #[error("compression engine stalled after {consumed} input bytes")]
    Stalled {
        /// Input bytes consumed before the stall.
        consumed: usize,
    },

    /// The negotiated compression code has no implementation.
    #[error("unsupported compression type {code}")]
    Unsupported {
        /// Code received from the peer.
        code: u8,
    },
}
