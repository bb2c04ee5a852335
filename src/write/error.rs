use thiserror::Error;

use crate::{compression::CompressionError, fragment::FragmentationError, protocol::FramingError};

/// Errors produced while building outbound frames.
#[derive(Debug, Error)]
pub enum WriteError {
    /// Empty messages cannot be told apart from pings.
    #[error("refusing to write an empty message")]
    EmptyMessage,

    /// Compressing the payload failed.
    #[error("compression failed: {0}")]
    Compression(#[from] CompressionError),

    /// The payload could not be split into fragments.
    #[error(transparent)]
    Fragmentation(#[from] FragmentationError),

    /// A frame would exceed the configured size.
    #[error(transparent)]
    Framing(#[from] FramingError),

    /// The packed frame has no room for the bytes offered.
    #[error("packed frame full: {needed} bytes needed, {available} available")]
    PackedFrameFull {
        /// Bytes the caller tried to add.
        needed: usize,
        /// Bytes still free.
        available: usize,
    },

    /// A packed sub-message was started while another is open.
    #[error("a packed message is already open")]
    MessageOpen,

    /// Bytes were added to a packed frame with no open sub-message.
    #[error("no packed message is open")]
    NoOpenMessage,
}
