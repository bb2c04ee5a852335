//! Utilities for driving `ripcframe` read and write paths in tests.
//!
//! [`wire`] encodes messages into frames and replays them into a
//! [`ReadBufferStateMachine`](ripcframe::read::ReadBufferStateMachine) in
//! arbitrary chunks. [`channel`] connects two channels over an in-memory
//! duplex stream. [`recorder`] captures metrics emitted while a closure runs.
//!
//! ```rust
//! use ripcframe::protocol::RipcFunctions;
//! use ripcframe_testing::{encode_messages, replay_in_chunks};
//!
//! let bytes = encode_messages(RipcFunctions::default(), 64, None, &[b"hi".as_slice()]);
//! let delivered = replay_in_chunks(RipcFunctions::default(), None, &bytes, &[1, 2, 4]);
//! assert_eq!(delivered, vec![b"hi".to_vec()]);
//! ```

pub mod channel;
pub mod macros;
pub mod recorder;
pub mod wire;

pub use channel::{channel_pair, config};
pub use recorder::{CapturedMetrics, capture_metrics};
pub use wire::{encode_messages, noise, replay_in_chunks};
