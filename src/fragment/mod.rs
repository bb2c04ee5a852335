//! Fragmentation of messages larger than one frame.
//!
//! Outbound, a [`Fragmenter`] allocates identifiers and cuts payloads into
//! chunks. Inbound, a [`Reassembler`] collects chunks per identifier until
//! the announced length has arrived.

pub mod error;
pub mod fragmenter;
pub mod id;
pub mod reassembler;

pub use error::{FragmentStatus, FragmentationError, ReassemblyError};
pub use fragmenter::{FragmentChunks, Fragmenter};
pub use id::{FragmentId, FragmentIdWidth};
pub use reassembler::Reassembler;

#[cfg(test)]
mod tests;
