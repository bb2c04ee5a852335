//! Metric helpers for `ripcframe`.
//!
//! This module defines metric names and simple helper functions wrapping the
//! [`metrics`](https://docs.rs/metrics) crate. With the `metrics` feature
//! disabled the helpers do nothing.

#[cfg(feature = "metrics")]
use metrics::{counter, gauge};

/// Name of the counter tracking processed frames.
pub const FRAMES_PROCESSED: &str = "ripcframe_frames_processed_total";
/// Name of the counter tracking messages handed to the application.
pub const MESSAGES_DELIVERED: &str = "ripcframe_messages_delivered_total";
/// Name of the counter tracking fragments discarded by reassembly.
pub const FRAGMENTS_DROPPED: &str = "ripcframe_fragments_dropped_total";
/// Name of the counter tracking payloads that failed to decompress.
pub const DECOMPRESSION_FAILURES: &str = "ripcframe_decompression_failures_total";
/// Name of the counter tracking buffer requests refused by exhausted pools.
pub const POOL_EXHAUSTED: &str = "ripcframe_pool_exhausted_total";
/// Name of the gauge tracking reassemblies in progress.
pub const REASSEMBLIES_IN_FLIGHT: &str = "ripcframe_reassemblies_in_flight";

/// Direction of frame processing.
#[derive(Clone, Copy, Debug)]
pub enum Direction {
    /// Frames parsed from the receive buffer.
    Inbound,
    /// Frames built for the peer.
    Outbound,
}

impl Direction {
    #[cfg_attr(not(feature = "metrics"), allow(dead_code))]
    fn as_str(self) -> &'static str {
        match self {
            Direction::Inbound => "inbound",
            Direction::Outbound => "outbound",
        }
    }
}

/// Why a fragment never reached a completed message.
#[derive(Clone, Copy, Debug)]
pub enum DropReason {
    /// Continuation for an identifier with no reassembly in progress.
    UnknownId,
    /// Fragment that would overrun the announced total length.
    Overflow,
    /// Reassembly replaced by a new first fragment with the same identifier.
    Replaced,
}

impl DropReason {
    #[cfg_attr(not(feature = "metrics"), allow(dead_code))]
    fn as_str(self) -> &'static str {
        match self {
            DropReason::UnknownId => "unknown_id",
            DropReason::Overflow => "overflow",
            DropReason::Replaced => "replaced",
        }
    }
}

/// Record a processed frame for the given direction.
pub fn inc_frames(direction: Direction) {
    #[cfg(feature = "metrics")]
    counter!(FRAMES_PROCESSED, "direction" => direction.as_str()).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = direction;
}

/// Record a message exposed to the application.
pub fn inc_messages() {
    #[cfg(feature = "metrics")]
    counter!(MESSAGES_DELIVERED).increment(1);
}

/// Record a discarded fragment.
pub fn inc_fragments_dropped(reason: DropReason) {
    #[cfg(feature = "metrics")]
    counter!(FRAGMENTS_DROPPED, "reason" => reason.as_str()).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = reason;
}

/// Record a payload that failed to decompress.
pub fn inc_decompression_failures() {
    #[cfg(feature = "metrics")]
    counter!(DECOMPRESSION_FAILURES).increment(1);
}

/// Record a refused buffer request.
pub fn inc_pool_exhausted() {
    #[cfg(feature = "metrics")]
    counter!(POOL_EXHAUSTED).increment(1);
}

/// Increment the in-flight reassembly gauge.
pub fn inc_reassemblies() {
    #[cfg(feature = "metrics")]
    gauge!(REASSEMBLIES_IN_FLIGHT).increment(1.0);
}

/// Decrement the in-flight reassembly gauge by `count`.
pub fn dec_reassemblies(count: usize) {
    #[cfg(feature = "metrics")]
    {
        #[expect(
            clippy::cast_precision_loss,
            reason = "reassembly counts stay far below f64 precision limits"
        )]
        let count = count as f64;
        gauge!(REASSEMBLIES_IN_FLIGHT).decrement(count);
    }
    #[cfg(not(feature = "metrics"))]
    let _ = count;
}
