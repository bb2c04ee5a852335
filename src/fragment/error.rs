//! Error and status types emitted by the fragmentation layer.

use thiserror::Error;

use super::FragmentId;

/// Result of feeding a fragment into a [`Reassembler`](super::Reassembler).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FragmentStatus {
    /// The message still expects more fragments.
    Incomplete,
    /// The fragment filled the reassembly buffer.
    Complete,
    /// The continuation named an identifier with no reassembly in progress
    /// and was dropped.
    Unknown,
}

/// Errors produced while reassembling inbound fragments.
///
/// Either error discards the affected reassembly; other identifiers are
/// unaffected.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ReassemblyError {
    /// A fragment carried more bytes than the first fragment announced.
    #[error("fragment {id} overflows its message: {attempted} > {total} bytes")]
    Overflow {
        /// Identifier of the discarded message.
        id: FragmentId,
        /// Length announced by the first fragment.
        total: usize,
        /// Length the message would have reached.
        attempted: usize,
    },
    /// The announced length exceeds the configured message limit.
    #[error("fragment {id} announces {total} bytes, limit is {limit}")]
    MessageTooLarge {
        /// Identifier of the rejected message.
        id: FragmentId,
        /// Length announced by the first fragment.
        total: usize,
        /// Largest message the reassembler accepts.
        limit: usize,
    },
}

/// Errors produced while splitting outbound messages.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum FragmentationError {
    /// The message length does not fit the 32-bit total-length field.
    #[error("message of {len} bytes cannot be fragmented")]
    MessageTooLarge {
        /// Length of the rejected message.
        len: usize,
    },
    /// A frame has no room for payload after its fragment header.
    #[error("frame leaves no room for fragment payload")]
    NoPayloadRoom,
}
