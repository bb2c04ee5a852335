//! Zlib adapter over `flate2`'s streaming engines.
//!
//! Each call resets the engine and produces one complete zlib stream, so
//! every frame can be decompressed on its own.

use flate2::{Compress, Compression, Decompress, FlushCompress, FlushDecompress, Status};

use super::{CompressionError, Compressor};

const GROW_STEP: usize = 1024;

fn counter(total: u64) -> usize { usize::try_from(total).unwrap_or(usize::MAX) }

/// Zlib compressor with a reusable output buffer.
///
/// # Examples
///
/// ```
/// use ripcframe::compression::{Compressor, ZlibCompressor};
///
/// let mut zlib = ZlibCompressor::new(6);
/// let packed = zlib.compress(b"aaaaaaaaaaaaaaaaaaaaaaaa").expect("compress").to_vec();
/// let mut plain = Vec::new();
/// let len = zlib.decompress(&packed, &mut plain).expect("decompress");
/// assert_eq!(&plain[..len], b"aaaaaaaaaaaaaaaaaaaaaaaa");
/// ```
pub struct ZlibCompressor {
    deflate: Compress,
    inflate: Decompress,
    scratch: Vec<u8>,
    level: u32,
}

impl ZlibCompressor {
    /// Create a compressor at `level` (0 to 9, clamped).
    #[must_use]
    pub fn new(level: u32) -> Self {
        let level = level.min(9);
        Self {
            deflate: Compress::new(Compression::new(level), true),
            inflate: Decompress::new(true),
            scratch: Vec::new(),
            level,
        }
    }

    /// Compression level in use.
    #[must_use]
    pub fn level(&self) -> u32 { self.level }
}

impl std::fmt::Debug for ZlibCompressor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZlibCompressor")
            .field("level", &self.level)
            .finish_non_exhaustive()
    }
}

impl Compressor for ZlibCompressor {
    fn compress(&mut self, src: &[u8]) -> Result<&[u8], CompressionError> {
        self.deflate.reset();
        self.scratch.clear();
        self.scratch.reserve(src.len() / 2 + 16);
        loop {
            let consumed = counter(self.deflate.total_in());
            let produced = self.deflate.total_out();
            if self.scratch.len() == self.scratch.capacity() {
                self.scratch.reserve(GROW_STEP);
            }
            let input = src.get(consumed..).unwrap_or_default();
            match self
                .deflate
                .compress_vec(input, &mut self.scratch, FlushCompress::Finish)?
            {
                Status::StreamEnd => break,
                Status::Ok | Status::BufError => {
                    let stalled = counter(self.deflate.total_in()) == consumed
                        && self.deflate.total_out() == produced;
                    if stalled {
                        return Err(CompressionError::Stalled { consumed });
                    }
                }
            }
        }
        Ok(&self.scratch)
    }

    fn decompress(&mut self, src: &[u8], dst: &mut Vec<u8>) -> Result<usize, CompressionError> {
        self.inflate.reset(true);
        dst.clear();
        dst.reserve(src.len().saturating_mul(2).max(GROW_STEP));
        loop {
            let consumed = counter(self.inflate.total_in());
            let produced = self.inflate.total_out();
            if dst.len() == dst.capacity() {
                dst.reserve(GROW_STEP.max(dst.len()));
            }
            let input = src.get(consumed..).unwrap_or_default();
            match self
                .inflate
                .decompress_vec(input, dst, FlushDecompress::None)?
            {
                Status::StreamEnd => break,
                Status::Ok | Status::BufError => {
                    let now = counter(self.inflate.total_in());
                    if now == consumed && self.inflate.total_out() == produced {
                        return Err(if now >= src.len() {
                            CompressionError::Truncated {
                                consumed: now,
                                len: src.len(),
                            }
                        } else {
                            CompressionError::Stalled { consumed: now }
                        });
                    }
                }
            }
        }
        Ok(dst.len())
    }
}
