//! Writer output read back through the state machine under arbitrary
//! delivery patterns.

use proptest::{prelude::*, test_runner::TestRunner};
use ripcframe::{
    compression::CompressionType,
    protocol::{LegacyRipcFunctions, RipcFunctions},
};
use ripcframe_testing::{encode_messages, noise, replay_in_chunks};
use rstest::rstest;

fn message() -> impl Strategy<Value = Vec<u8>> {
    prop_oneof![
        prop::collection::vec(any::<u8>(), 1..300),
        (1_usize..600, any::<u8>()).prop_map(|(len, byte)| vec![byte; len]),
    ]
}

#[test]
fn messages_survive_any_chunking() {
    let strategy = (
        prop::collection::vec(message(), 1..6),
        26_usize..160,
        any::<bool>(),
        prop::collection::vec(1_usize..40, 1..8),
    );
    let mut runner = TestRunner::deterministic();
    runner
        .run(&strategy, |(messages, max_frame, compress, chunks)| {
            let compression = compress.then_some(CompressionType::Zlib);
            let slices: Vec<&[u8]> = messages.iter().map(Vec::as_slice).collect();
            let bytes = encode_messages(
                RipcFunctions::default(),
                max_frame,
                compression.map(|kind| (kind, 0)),
                &slices,
            );
            let delivered =
                replay_in_chunks(RipcFunctions::default(), compression, &bytes, &chunks);
            prop_assert_eq!(delivered, messages);
            Ok(())
        })
        .expect("every chunking delivers the written messages");
}

#[test]
fn every_split_offset_delivers_the_same_messages() {
    let big = noise(400, 21);
    let messages: [&[u8]; 3] = [b"first", &big, b"last"];
    let bytes = encode_messages(
        RipcFunctions::default(),
        64,
        Some((CompressionType::Zlib, 0)),
        &messages,
    );

    for split in 1..bytes.len() {
        let delivered = replay_in_chunks(
            RipcFunctions::default(),
            Some(CompressionType::Zlib),
            &bytes,
            &[split, bytes.len()],
        );
        assert_eq!(delivered, messages, "split at {split}");
    }
}

#[rstest]
#[case::one_byte_chunks(&[1])]
#[case::uneven(&[3, 7, 2])]
#[case::whole(&[4096])]
fn legacy_stream_round_trips(#[case] chunks: &[usize]) {
    let messages: Vec<Vec<u8>> = (1..=4_u8)
        .map(|seed| noise(70 * usize::from(seed), u32::from(seed)))
        .collect();
    let slices: Vec<&[u8]> = messages.iter().map(Vec::as_slice).collect();
    let bytes = encode_messages(LegacyRipcFunctions::default(), 48, None, &slices);

    let delivered = replay_in_chunks(LegacyRipcFunctions::default(), None, &bytes, chunks);
    assert_eq!(delivered, messages);
}
