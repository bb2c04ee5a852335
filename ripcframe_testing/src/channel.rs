//! Channel pairs over in-memory duplex streams.

use ripcframe::{Channel, ChannelConfig, ProtocolFunctions};
use rstest::fixture;
use tokio::io::{DuplexStream, duplex};

/// Small-frame configuration that exercises fragmentation quickly.
#[fixture]
#[allow(
    unused_braces,
    reason = "rustc false positive for single line rstest fixtures"
)]
pub fn config() -> ChannelConfig {
    ChannelConfig::default()
        .with_receive_buffer_size(256)
        .with_max_frame_len(128)
        .with_guaranteed_output_buffers(8)
        .with_max_output_buffers(16)
}

/// Connect two standalone channels, sender first.
///
/// # Panics
///
/// Panics if either configuration is rejected.
#[must_use]
pub fn channel_pair<P: ProtocolFunctions>(
    sender: ChannelConfig,
    receiver: ChannelConfig,
) -> (Channel<DuplexStream, P>, Channel<DuplexStream, P>) {
    let (left, right) = duplex(256 * 1024);
    (
        Channel::standalone(left, sender).expect("sender config should be valid"),
        Channel::standalone(right, receiver).expect("receiver config should be valid"),
    )
}
