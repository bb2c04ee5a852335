//! Write side of a channel: from application messages to frames.

mod error;
mod packing;
mod writer;

pub use error::WriteError;
pub use packing::PackedFrame;
pub use writer::FrameWriter;
