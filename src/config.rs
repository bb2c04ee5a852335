//! Per-channel configuration.
//!
//! [`ChannelConfig`] gathers the values negotiated or chosen when a channel
//! is set up: buffer sizes, the frame size, the protocol version and the
//! compression settings. Builders never fail; call
//! [`ChannelConfig::validate`] before handing the configuration to a
//! [`Channel`](crate::channel::Channel).

use thiserror::Error;

use crate::{
    compression::CompressionType,
    fragment::FragmentIdWidth,
    protocol::{FragmentHeader, HEADER_LEN, MAX_FRAME_LEN, RipcVersion},
};

/// Default receive buffer capacity.
pub const DEFAULT_RECEIVE_BUFFER_SIZE: usize = 65_536;
/// Default frame size, the RIPC default internal fragment size.
pub const DEFAULT_MAX_FRAME_LEN: usize = 6144;
/// Default limit on the announced length of a fragmented message.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;
/// Default compression level.
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;
/// Default size below which messages are sent uncompressed.
pub const DEFAULT_COMPRESSION_THRESHOLD: usize = 30;
/// Default number of output buffers reserved for one channel.
pub const DEFAULT_GUARANTEED_OUTPUT_BUFFERS: usize = 50;
/// Default number of output buffers a channel may hold in total.
pub const DEFAULT_MAX_OUTPUT_BUFFERS: usize = 100;

/// Smallest payload room a frame must leave after the largest header.
const MIN_FRAME_PAYLOAD: usize = 16;

/// Invalid combinations rejected by [`ChannelConfig::validate`].
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The frame size is outside the representable range.
    #[error("frame size {size} outside {min}..={max}")]
    FrameSize {
        /// Configured frame size.
        size: usize,
        /// Smallest usable frame.
        min: usize,
        /// Largest encodable frame.
        max: usize,
    },
    /// The receive buffer cannot hold one full frame.
    #[error("receive buffer of {size} bytes is smaller than the {frame}-byte frame size")]
    ReceiveBuffer {
        /// Configured receive buffer size.
        size: usize,
        /// Configured frame size.
        frame: usize,
    },
    /// More guaranteed buffers than the channel may hold.
    #[error("{guaranteed} guaranteed output buffers exceed the maximum of {max}")]
    OutputBuffers {
        /// Guaranteed buffer count.
        guaranteed: usize,
        /// Maximum buffer count.
        max: usize,
    },
    /// The compression level is above 9.
    #[error("compression level {level} is above 9")]
    CompressionLevel {
        /// Configured level.
        level: u32,
    },
}

/// Settings for one channel.
///
/// # Examples
///
/// ```
/// use ripcframe::{compression::CompressionType, config::ChannelConfig};
///
/// let config = ChannelConfig::default()
///     .with_max_frame_len(4096)
///     .with_compression(CompressionType::Zlib)
///     .validate()
///     .expect("valid settings");
/// assert_eq!(config.max_frame_len(), 4096);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChannelConfig {
    receive_buffer_size: usize,
    max_frame_len: usize,
    max_message_size: usize,
    version: RipcVersion,
    compression: CompressionType,
    compression_level: u32,
    compression_threshold: usize,
    guaranteed_output_buffers: usize,
    max_output_buffers: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            receive_buffer_size: DEFAULT_RECEIVE_BUFFER_SIZE,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            version: RipcVersion::LATEST,
            compression: CompressionType::None,
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            compression_threshold: DEFAULT_COMPRESSION_THRESHOLD,
            guaranteed_output_buffers: DEFAULT_GUARANTEED_OUTPUT_BUFFERS,
            max_output_buffers: DEFAULT_MAX_OUTPUT_BUFFERS,
        }
    }
}

impl ChannelConfig {
    /// Set the initial receive buffer capacity.
    #[must_use]
    pub fn with_receive_buffer_size(mut self, size: usize) -> Self {
        self.receive_buffer_size = size;
        self
    }

    /// Set the largest frame written, headers included.
    #[must_use]
    pub fn with_max_frame_len(mut self, len: usize) -> Self {
        self.max_frame_len = len;
        self
    }

    /// Set the largest fragmented message accepted from the peer.
    #[must_use]
    pub fn with_max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    /// Set the negotiated protocol version.
    #[must_use]
    pub fn with_version(mut self, version: RipcVersion) -> Self {
        self.version = version;
        self
    }

    /// Set the negotiated compression algorithm.
    #[must_use]
    pub fn with_compression(mut self, compression: CompressionType) -> Self {
        self.compression = compression;
        self
    }

    /// Set the compression level, 0 to 9.
    #[must_use]
    pub fn with_compression_level(mut self, level: u32) -> Self {
        self.compression_level = level;
        self
    }

    /// Send messages shorter than `threshold` bytes uncompressed.
    #[must_use]
    pub fn with_compression_threshold(mut self, threshold: usize) -> Self {
        self.compression_threshold = threshold;
        self
    }

    /// Set how many output buffers are reserved for the channel.
    #[must_use]
    pub fn with_guaranteed_output_buffers(mut self, count: usize) -> Self {
        self.guaranteed_output_buffers = count;
        self
    }

    /// Set how many output buffers the channel may hold in total.
    #[must_use]
    pub fn with_max_output_buffers(mut self, count: usize) -> Self {
        self.max_output_buffers = count;
        self
    }

    /// Initial receive buffer capacity.
    #[must_use]
    pub fn receive_buffer_size(&self) -> usize { self.receive_buffer_size }

    /// Largest frame written.
    #[must_use]
    pub fn max_frame_len(&self) -> usize { self.max_frame_len }

    /// Largest fragmented message accepted.
    #[must_use]
    pub fn max_message_size(&self) -> usize { self.max_message_size }

    /// Negotiated protocol version.
    #[must_use]
    pub fn version(&self) -> RipcVersion { self.version }

    /// Negotiated compression algorithm.
    #[must_use]
    pub fn compression(&self) -> CompressionType { self.compression }

    /// Compression level.
    #[must_use]
    pub fn compression_level(&self) -> u32 { self.compression_level }

    /// Size below which messages are sent uncompressed.
    #[must_use]
    pub fn compression_threshold(&self) -> usize { self.compression_threshold }

    /// Output buffers reserved for the channel.
    #[must_use]
    pub fn guaranteed_output_buffers(&self) -> usize { self.guaranteed_output_buffers }

    /// Output buffers the channel may hold in total.
    #[must_use]
    pub fn max_output_buffers(&self) -> usize { self.max_output_buffers }

    /// Smallest frame size accepted by [`validate`](Self::validate).
    #[must_use]
    pub const fn min_frame_len() -> usize {
        HEADER_LEN + FragmentHeader::first_len(FragmentIdWidth::TwoBytes) + MIN_FRAME_PAYLOAD
    }

    /// Check the settings are usable together.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the first offending setting.
    pub fn validate(self) -> Result<Self, ConfigError> {
        let min = Self::min_frame_len();
        if !(min..=MAX_FRAME_LEN).contains(&self.max_frame_len) {
            return Err(ConfigError::FrameSize {
                size: self.max_frame_len,
                min,
                max: MAX_FRAME_LEN,
            });
        }
        if self.receive_buffer_size < self.max_frame_len {
            return Err(ConfigError::ReceiveBuffer {
                size: self.receive_buffer_size,
                frame: self.max_frame_len,
            });
        }
        if self.guaranteed_output_buffers > self.max_output_buffers {
            return Err(ConfigError::OutputBuffers {
                guaranteed: self.guaranteed_output_buffers,
                max: self.max_output_buffers,
            });
        }
        if self.compression_level > 9 {
            return Err(ConfigError::CompressionLevel {
                level: self.compression_level,
            });
        }
        Ok(self)
    }
}
