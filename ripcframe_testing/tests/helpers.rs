//! Integration coverage for `ripcframe_testing` helpers.

use ripcframe::{compression::CompressionType, protocol::RipcFunctions};
use ripcframe_testing::{capture_metrics, encode_messages, noise, replay_in_chunks};

#[test]
fn noise_is_deterministic() {
    assert_eq!(noise(32, 5), noise(32, 5));
    assert_ne!(noise(32, 5), noise(32, 6));
}

#[test]
fn replay_grows_from_a_header_sized_buffer() {
    let payload = noise(500, 2);
    let bytes = encode_messages(
        RipcFunctions::default(),
        1024,
        Some((CompressionType::Zlib, 1024)),
        &[payload.as_slice()],
    );
    assert_eq!(bytes.len(), 503);

    let delivered = replay_in_chunks(RipcFunctions::default(), None, &bytes, &[64]);
    assert_eq!(delivered, vec![payload]);
}

#[test]
fn captured_metrics_sum_counters() {
    let ((), captured) = capture_metrics(|| {
        ripcframe::metrics::inc_messages();
        ripcframe::metrics::inc_messages();
    });
    assert_eq!(captured.counter(ripcframe::metrics::MESSAGES_DELIVERED, &[]), 2);
    assert_eq!(captured.counter("missing", &[]), 0);
}
