//! RIPC wire format: flags, headers and per-version framing rules.
//!
//! Everything in this module is stateless. The read state machine and the
//! frame writer build on these primitives to move between bytes and frames.

pub mod error;
pub mod flags;
pub mod functions;
pub mod header;
pub mod version;

pub use error::FramingError;
pub use flags::{ExtendedFlags, RipcFlags};
pub use functions::{LegacyRipcFunctions, ProtocolFunctions, RipcFunctions};
pub use header::{FragmentHeader, FrameHeader, HEADER_LEN, MAX_FRAME_LEN};
pub use version::RipcVersion;
