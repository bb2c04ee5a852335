//! Zlib adapter round trips and failure reporting.

use rstest::{fixture, rstest};

use super::{CompressionError, CompressionType, Compressor, ZlibCompressor};

#[fixture]
fn zlib() -> ZlibCompressor { ZlibCompressor::new(6) }

fn patterned(len: usize) -> Vec<u8> {
    (0..len)
        .map(|i| u8::try_from(i % 251).expect("below 256"))
        .collect()
}

#[rstest]
#[case::empty(0)]
#[case::single_byte(1)]
#[case::one_frame(6_000)]
#[case::several_frames(200_000)]
fn payloads_survive_a_round_trip(mut zlib: ZlibCompressor, #[case] len: usize) {
    let payload = patterned(len);
    let packed = zlib.compress(&payload).expect("compress").to_vec();
    let mut plain = vec![0xaa; 3];
    let written = zlib.decompress(&packed, &mut plain).expect("decompress");
    assert_eq!(written, len);
    assert_eq!(plain, payload);
}

#[rstest]
fn repeated_bytes_shrink(mut zlib: ZlibCompressor) {
    let payload = vec![b'x'; 4096];
    assert!(zlib.compress(&payload).expect("compress").len() < 64);
}

#[rstest]
fn each_call_is_an_independent_stream(mut zlib: ZlibCompressor) {
    let first = zlib.compress(b"first message").expect("compress").to_vec();
    let second = zlib.compress(b"second message").expect("compress").to_vec();

    let mut fresh = ZlibCompressor::new(6);
    let mut plain = Vec::new();
    fresh.decompress(&second, &mut plain).expect("decompress");
    assert_eq!(plain, b"second message");
    fresh.decompress(&first, &mut plain).expect("decompress");
    assert_eq!(plain, b"first message");
}

#[rstest]
fn truncated_stream_is_rejected(mut zlib: ZlibCompressor) {
    let packed = zlib.compress(&patterned(500)).expect("compress").to_vec();
    let mut plain = Vec::new();
    let err = zlib
        .decompress(&packed[..packed.len() / 2], &mut plain)
        .expect_err("half a stream must not decompress");
    assert!(matches!(err, CompressionError::Truncated { .. }), "{err:?}");
}

#[rstest]
fn garbage_is_rejected(mut zlib: ZlibCompressor) {
    let mut plain = Vec::new();
    assert!(zlib.decompress(b"not zlib at all", &mut plain).is_err());
}

#[rstest]
#[case::none(0, CompressionType::None)]
#[case::zlib(1, CompressionType::Zlib)]
fn handshake_codes_map_to_types(#[case] code: u8, #[case] expected: CompressionType) {
    let kind = CompressionType::from_code(code).expect("known code");
    assert_eq!(kind, expected);
    assert_eq!(kind.code(), code);
}

#[test]
fn unknown_code_is_unsupported() {
    assert!(matches!(
        CompressionType::from_code(2),
        Err(CompressionError::Unsupported { code: 2 })
    ));
}

#[test]
fn only_zlib_builds_a_compressor() {
    assert!(CompressionType::None.compressor(6).is_none());
    assert!(CompressionType::Zlib.compressor(6).is_some());
}
