//! Canonical error and result types for channel operations.
//!
//! Each layer has its own error enum; [`ChannelError`] wraps them together
//! with transport failures so callers driving a
//! [`Channel`](crate::channel::Channel) handle a single type.

use std::io;

use thiserror::Error;

use crate::{config::ConfigError, protocol::RipcVersion, read::ReadError, write::WriteError};

/// Top-level error type exposed by `ripcframe` channels.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The underlying stream failed.
    #[error("transport error: {0}")]
    Io(#[from] io::Error),

    /// The inbound byte stream could not be interpreted.
    #[error("read error: {0}")]
    Read(#[from] ReadError),

    /// An outbound message could not be framed.
    #[error("write error: {0}")]
    Write(#[from] WriteError),

    /// The channel configuration is unusable.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The selected protocol variant does not speak the negotiated version.
    #[error("protocol variant does not support {version}")]
    UnsupportedVersion {
        /// Negotiated version.
        version: RipcVersion,
    },

    /// Every output buffer is in flight; flush before writing more.
    #[error("no output buffers available")]
    NoBuffers,

    /// The peer closed the stream.
    #[error("end of stream")]
    EndOfStream,
}

impl ChannelError {
    /// Whether the channel can keep being used after this error.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Read(error) => error.is_recoverable(),
            Self::Write(_) | Self::NoBuffers => true,
            Self::Io(_) | Self::Config(_) | Self::UnsupportedVersion { .. } | Self::EndOfStream => {
                false
            }
        }
    }
}

/// Canonical result alias used by `ripcframe` channel APIs.
pub type Result<T> = std::result::Result<T, ChannelError>;
