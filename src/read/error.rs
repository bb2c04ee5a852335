use thiserror::Error;

use super::ReadState;
use crate::{
    compression::CompressionError,
    fragment::{FragmentId, ReassemblyError},
    protocol::FramingError,
};

/// Errors produced by the read state machine.
///
/// Apart from [`ReadError::Framing`], every error is confined to one frame:
/// the machine stays [`Complete`](ReadState::Complete) with no message
/// exposed, and the next application read moves past the offending frame.
#[derive(Debug, Error)]
pub enum ReadError {
    /// The frame layout is corrupt; the stream has no usable boundary.
    #[error(transparent)]
    Framing(#[from] FramingError),

    /// A compressed payload failed to decompress.
    #[error("decompression failed: {0}")]
    Compression(#[from] CompressionError),

    /// A compressed frame arrived on a channel without compression.
    #[error("compressed frame received but compression is disabled")]
    CompressionDisabled,

    /// A fragment carried more bytes than its message announced.
    #[error("fragment {id} overflows its message: {attempted} > {total} bytes")]
    FragmentOverflow {
        /// Identifier of the discarded message.
        id: FragmentId,
        /// Length announced by the first fragment.
        total: usize,
        /// Length the message would have reached.
        attempted: usize,
    },

    /// A first fragment announced a message above the configured limit.
    #[error("fragment {id} announces {total} bytes, limit is {limit}")]
    MessageTooLarge {
        /// Identifier of the rejected message.
        id: FragmentId,
        /// Announced length.
        total: usize,
        /// Largest accepted message.
        limit: usize,
    },

    /// A packed sub-message runs past the end of its frame.
    #[error("packed message at {offset} declares {declared} bytes, {available} remain")]
    PackedOverrun {
        /// Offset of the length prefix within the packed body.
        offset: usize,
        /// Declared sub-message length.
        declared: usize,
        /// Bytes left in the body after the prefix.
        available: usize,
    },

    /// An application read was attempted with no message ready.
    #[error("no message to consume in state {state}")]
    NotComplete {
        /// State the machine was in.
        state: ReadState,
    },
}

impl From<ReassemblyError> for ReadError {
    fn from(error: ReassemblyError) -> Self {
        match error {
            ReassemblyError::Overflow {
                id,
                total,
                attempted,
            } => Self::FragmentOverflow {
                id,
                total,
                attempted,
            },
            ReassemblyError::MessageTooLarge { id, total, limit } => {
                Self::MessageTooLarge { id, total, limit }
            }
        }
    }
}

impl ReadError {
    /// Whether the channel can keep reading after this error.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool { !matches!(self, Self::Framing(_)) }
}
