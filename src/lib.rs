#![doc(html_root_url = "https://docs.rs/ripcframe/latest")]
//! Public API for the `ripcframe` library.
//!
//! This crate implements the RIPC channel framing layer: incremental frame
//! detection over a caller-owned receive buffer, fragmentation and
//! reassembly of large messages, packed frames, payload compression, pooled
//! output buffers and an async [`Channel`] tying them to a byte stream.

pub mod buffer;
pub mod byte_order;
pub mod channel;
pub mod cipher;
pub mod compression;
pub mod config;
pub mod error;
pub mod fragment;
pub mod metrics;
pub mod pool;
pub mod protocol;
pub mod read;
pub mod write;

#[cfg(test)]
mod test_helpers;

pub use buffer::ReceiveBuffer;
pub use channel::{Channel, ReadEvent, ReadStats};
pub use config::ChannelConfig;
pub use error::{ChannelError, Result};
pub use metrics::{Direction, FRAMES_PROCESSED, MESSAGES_DELIVERED};
pub use protocol::{LegacyRipcFunctions, ProtocolFunctions, RipcFunctions, RipcVersion};
pub use read::{ReadBufferStateMachine, ReadState};
pub use write::{FrameWriter, PackedFrame};
