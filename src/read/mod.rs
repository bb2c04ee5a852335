//! Read side of a channel: from received bytes to application messages.
//!
//! [`ReadBufferStateMachine`] classifies the receive buffer after every
//! socket read, routes complete frames through packing, fragmentation and
//! compression handling, and exposes one message at a time.

mod error;
mod machine;
mod packed;
mod state;

pub use error::ReadError;
pub use machine::ReadBufferStateMachine;
pub use packed::PACKED_PREFIX_LEN;
pub(crate) use packed::PackedCursor;
pub use state::{ReadOutcome, ReadState, ReadSubState};

#[cfg(test)]
mod tests;
