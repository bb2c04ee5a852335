//! Frame detection, delivery modes and recovery of the read state machine.

use bytes::BytesMut;
use rstest::{fixture, rstest};
use tracing_test::traced_test;

use super::{ReadBufferStateMachine, ReadError, ReadOutcome, ReadState, ReadSubState};
use crate::{
    buffer::ReceiveBuffer,
    byte_order::read_u16_at,
    compression::ZlibCompressor,
    fragment::FragmentId,
    protocol::{FramingError, LegacyRipcFunctions, ProtocolFunctions, RipcFunctions},
    test_helpers::{drain, feed, noise},
    write::FrameWriter,
};

#[fixture]
fn machine() -> ReadBufferStateMachine<RipcFunctions> {
    ReadBufferStateMachine::new(RipcFunctions::default())
        .with_compressor(Box::new(ZlibCompressor::new(6)))
}

fn writer(max_frame: usize) -> FrameWriter<RipcFunctions> {
    FrameWriter::new(RipcFunctions::default(), max_frame)
}

fn compressing_writer(max_frame: usize) -> FrameWriter<RipcFunctions> {
    writer(max_frame).with_compressor(Box::new(ZlibCompressor::new(6)), 0)
}

fn encode<P: ProtocolFunctions>(writer: &mut FrameWriter<P>, messages: &[&[u8]]) -> Vec<u8> {
    let mut out = BytesMut::new();
    for message in messages {
        writer
            .write_message(message, &mut out)
            .expect("message should frame");
    }
    out.to_vec()
}

#[rstest]
fn single_frame_is_exposed_in_place(mut machine: ReadBufferStateMachine<RipcFunctions>) {
    let mut recv = ReceiveBuffer::with_capacity(64);
    let mut frame = vec![0x00, 0x0e, 0x02];
    frame.extend_from_slice(b"HELLO WORLD");

    feed(&mut machine, &mut recv, &frame);

    assert_eq!(machine.state(), ReadState::Complete);
    assert_eq!(machine.sub_state(), ReadSubState::Normal);
    assert_eq!(machine.current_message(&recv), Some(&b"HELLO WORLD"[..]));
    assert!(!machine.is_ping());

    machine
        .advance_on_application_read(&recv)
        .expect("message was ready");
    assert_eq!(machine.state(), ReadState::NoData);
    assert_eq!(machine.consumed(), 14);
}

#[rstest]
fn pipelined_frames_are_delivered_in_order(mut machine: ReadBufferStateMachine<RipcFunctions>) {
    let bytes = encode(&mut writer(128), &[b"one", b"two", b"three"]);
    let mut recv = ReceiveBuffer::with_capacity(128);

    feed(&mut machine, &mut recv, &bytes);

    assert_eq!(
        drain(&mut machine, &recv),
        vec![b"one".to_vec(), b"two".to_vec(), b"three".to_vec()]
    );
    assert_eq!(machine.state(), ReadState::NoData);
}

#[rstest]
fn byte_at_a_time_delivery_matches_bulk(mut machine: ReadBufferStateMachine<RipcFunctions>) {
    let bytes = encode(&mut writer(128), &[b"alpha", b"beta"]);
    let mut recv = ReceiveBuffer::with_capacity(128);
    let mut messages = Vec::new();

    for byte in &bytes {
        feed(&mut machine, &mut recv, std::slice::from_ref(byte));
        assert!(!machine.state().is_insufficient());
        messages.extend(drain(&mut machine, &recv));
    }

    assert_eq!(messages, vec![b"alpha".to_vec(), b"beta".to_vec()]);
}

#[rstest]
fn partial_header_waits_for_more(mut machine: ReadBufferStateMachine<RipcFunctions>) {
    let mut recv = ReceiveBuffer::with_capacity(16);
    feed(&mut machine, &mut recv, &[0x00]);
    assert_eq!(machine.state(), ReadState::LengthUnknownIncomplete);

    feed(&mut machine, &mut recv, &[0x06, 0x02]);
    assert_eq!(machine.state(), ReadState::LengthKnownIncomplete);
    assert!(machine.current_message(&recv).is_none());

    feed(&mut machine, &mut recv, b"abc");
    assert_eq!(machine.current_message(&recv), Some(&b"abc"[..]));
}

#[rstest]
fn would_block_changes_nothing(mut machine: ReadBufferStateMachine<RipcFunctions>) {
    let mut recv = ReceiveBuffer::with_capacity(16);
    feed(&mut machine, &mut recv, &[0x00, 0x06]);
    let before = machine.state();

    machine
        .advance_on_socket_read(&recv, ReadOutcome::WouldBlock)
        .expect("no new bytes to parse");
    assert_eq!(machine.state(), before);
}

#[rstest]
fn ping_is_reported_without_message(mut machine: ReadBufferStateMachine<RipcFunctions>) {
    let mut recv = ReceiveBuffer::with_capacity(16);
    let mut out = BytesMut::new();
    writer(64).write_ping(&mut out);
    assert_eq!(&out[..], &[0x00, 0x03, 0x02]);

    feed(&mut machine, &mut recv, &out);

    assert_eq!(machine.state(), ReadState::Complete);
    assert!(machine.is_ping());
    assert!(machine.current_message(&recv).is_none());
    machine
        .advance_on_application_read(&recv)
        .expect("ping was ready");
    assert!(!machine.is_ping());
    assert_eq!(machine.state(), ReadState::NoData);
}

#[rstest]
fn packed_frame_yields_each_sub_message(mut machine: ReadBufferStateMachine<RipcFunctions>) {
    let mut writer = writer(64);
    let mut packed = writer.packed_frame();
    packed.push(b"AB").expect("fits");
    packed.push(b"CDE").expect("fits");
    let mut out = BytesMut::new();
    writer.write_packed(&packed, &mut out).expect("fits");
    let mut recv = ReceiveBuffer::with_capacity(64);

    feed(&mut machine, &mut recv, &out);
    assert_eq!(machine.sub_state(), ReadSubState::Packed);
    assert_eq!(machine.current_message(&recv), Some(&b"AB"[..]));

    machine
        .advance_on_application_read(&recv)
        .expect("second sub-message");
    assert_eq!(machine.state(), ReadState::Complete);
    assert_eq!(machine.current_message(&recv), Some(&b"CDE"[..]));

    machine
        .advance_on_application_read(&recv)
        .expect("packed frame drained");
    assert_eq!(machine.state(), ReadState::NoData);
}

#[rstest]
fn compressed_packed_frame_is_unpacked(mut machine: ReadBufferStateMachine<RipcFunctions>) {
    let mut writer = compressing_writer(256);
    let mut packed = writer.packed_frame();
    packed.push(&[b'x'; 40]).expect("fits");
    packed.push(&[b'y'; 40]).expect("fits");
    let mut out = BytesMut::new();
    writer.write_packed(&packed, &mut out).expect("fits");
    let mut recv = ReceiveBuffer::with_capacity(256);

    feed(&mut machine, &mut recv, &out);
    assert_eq!(machine.sub_state(), ReadSubState::PackedCompressed);
    assert_eq!(
        drain(&mut machine, &recv),
        vec![vec![b'x'; 40], vec![b'y'; 40]]
    );
}

#[rstest]
fn highly_compressible_message_inflates_past_its_frame(
    mut machine: ReadBufferStateMachine<RipcFunctions>,
) {
    let payload = vec![b'A'; 4096];
    let bytes = encode(&mut compressing_writer(6144), &[payload.as_slice()]);
    assert_eq!(bytes[2], 0x06);
    assert!(bytes.len() < 64, "repeated bytes should shrink");
    let mut recv = ReceiveBuffer::with_capacity(256);

    feed(&mut machine, &mut recv, &bytes);

    assert_eq!(machine.sub_state(), ReadSubState::Normal);
    assert_eq!(machine.current_message(&recv), Some(&payload[..]));
}

#[rstest]
fn compressed_packed_frame_split_by_comp_fragment(
    mut machine: ReadBufferStateMachine<RipcFunctions>,
) {
    let first = noise(28, 21);
    let second = noise(28, 22);
    let mut writer = compressing_writer(64);
    let mut packed = writer.packed_frame();
    packed.push(&first).expect("fits");
    packed.push(&second).expect("fits");
    let mut out = BytesMut::new();
    let count = writer.write_packed(&packed, &mut out).expect("fits");
    assert_eq!(count, 2);
    assert_eq!(out[2], 0x1e, "first part keeps the packing flag");
    let mut recv = ReceiveBuffer::with_capacity(256);

    feed(&mut machine, &mut recv, &out);

    assert_eq!(machine.state(), ReadState::Complete);
    assert_eq!(machine.sub_state(), ReadSubState::PackedCompressed);
    assert_eq!(drain(&mut machine, &recv), vec![first, second]);
    assert_eq!(machine.abandoned_comp_fragment_count(), 0);
}

#[rstest]
fn packed_overrun_is_rejected(mut machine: ReadBufferStateMachine<RipcFunctions>) {
    let mut recv = ReceiveBuffer::with_capacity(16);
    recv.extend_from_slice(&[0x00, 0x07, 0x12, 0x00, 0x05, b'a', b'b']);

    let err = machine
        .advance_on_socket_read(&recv, ReadOutcome::Data(7))
        .expect_err("sub-message runs past the frame");
    assert!(matches!(
        err,
        ReadError::PackedOverrun {
            offset: 0,
            declared: 5,
            available: 2
        }
    ));
}

#[rstest]
fn fragments_are_reassembled(mut machine: ReadBufferStateMachine<RipcFunctions>) {
    let payload: Vec<u8> = (0..=99).collect();
    let bytes = encode(&mut writer(32), &[payload.as_slice()]);
    let mut recv = ReceiveBuffer::with_capacity(256);

    feed(&mut machine, &mut recv, &bytes);

    assert_eq!(machine.sub_state(), ReadSubState::FragmentCompleteReassembled);
    assert_eq!(machine.fragments_in_progress(), 1);
    assert_eq!(machine.current_message(&recv), Some(&payload[..]));
    machine
        .advance_on_application_read(&recv)
        .expect("message was ready");
    assert_eq!(machine.fragments_in_progress(), 0);
}

#[rstest]
fn fragmented_message_waits_for_its_last_fragment(
    mut machine: ReadBufferStateMachine<RipcFunctions>,
) {
    let payload: Vec<u8> = (0..=99).collect();
    let bytes = encode(&mut writer(32), &[payload.as_slice()]);
    let mut frames = Vec::new();
    let mut offset = 0;
    while let Some(length) = read_u16_at(&bytes, offset) {
        frames.push(&bytes[offset..offset + usize::from(length)]);
        offset += usize::from(length);
    }
    assert_eq!(frames.len(), 4);
    let mut recv = ReceiveBuffer::with_capacity(256);

    let (last, leading) = frames.split_last().expect("several fragments");
    for frame in leading {
        feed(&mut machine, &mut recv, frame);
        assert_ne!(machine.state(), ReadState::Complete);
        assert_eq!(machine.current_message(&recv), None);
        assert_eq!(machine.fragments_in_progress(), 1);
    }

    feed(&mut machine, &mut recv, last);
    assert_eq!(machine.state(), ReadState::Complete);
    assert_eq!(machine.sub_state(), ReadSubState::FragmentCompleteReassembled);
    assert_eq!(machine.current_message(&recv), Some(&payload[..]));
}

#[test]
fn legacy_fragments_use_one_byte_ids() {
    let protocol = LegacyRipcFunctions::default();
    let payload = noise(90, 7);
    let mut out = BytesMut::new();
    FrameWriter::new(protocol, 32)
        .write_message(&payload, &mut out)
        .expect("fragments");
    let mut machine = ReadBufferStateMachine::new(protocol);
    let mut recv = ReceiveBuffer::with_capacity(256);

    feed(&mut machine, &mut recv, &out);

    assert_eq!(drain(&mut machine, &recv), vec![payload]);
}

#[rstest]
fn compressed_fragments_are_reassembled(mut machine: ReadBufferStateMachine<RipcFunctions>) {
    let payload = vec![b'z'; 500];
    let bytes = encode(&mut compressing_writer(64), &[payload.as_slice()]);
    let mut recv = ReceiveBuffer::with_capacity(1024);

    feed(&mut machine, &mut recv, &bytes);

    assert_eq!(drain(&mut machine, &recv), vec![payload]);
}

#[rstest]
fn comp_fragment_pair_is_joined(mut machine: ReadBufferStateMachine<RipcFunctions>) {
    let payload = noise(61, 3);
    let bytes = encode(&mut compressing_writer(64), &[payload.as_slice()]);
    assert_eq!(bytes[2], 0x0e, "first frame should be a CompFragment");
    let mut recv = ReceiveBuffer::with_capacity(256);

    feed(&mut machine, &mut recv, &bytes);

    assert_eq!(machine.sub_state(), ReadSubState::Normal);
    assert_eq!(drain(&mut machine, &recv), vec![payload]);
}

#[rstest]
fn incompressible_fragments_use_comp_fragment_pairs(
    mut machine: ReadBufferStateMachine<RipcFunctions>,
) {
    let payload = noise(300, 11);
    let bytes = encode(&mut compressing_writer(64), &[payload.as_slice(), b"after"]);
    let mut recv = ReceiveBuffer::with_capacity(1024);

    feed(&mut machine, &mut recv, &bytes);

    assert_eq!(
        drain(&mut machine, &recv),
        vec![payload, b"after".to_vec()]
    );
    assert_eq!(machine.abandoned_comp_fragment_count(), 0);
}

#[rstest]
#[traced_test]
fn unknown_continuation_is_dropped(mut machine: ReadBufferStateMachine<RipcFunctions>) {
    let mut recv = ReceiveBuffer::with_capacity(32);
    let bytes = [
        0x00, 0x08, 0x03, 0x08, 0x00, 0x09, b'x', b'y', 0x00, 0x05, 0x02, b'o', b'k',
    ];

    feed(&mut machine, &mut recv, &bytes);

    assert_eq!(machine.current_message(&recv), Some(&b"ok"[..]));
    assert_eq!(machine.unknown_fragment_count(), 1);
    assert!(logs_contain("dropped fragment for unknown id"));
}

#[rstest]
fn fragment_overflow_is_reported_and_skipped(mut machine: ReadBufferStateMachine<RipcFunctions>) {
    let mut recv = ReceiveBuffer::with_capacity(64);
    let first = [
        0x00, 0x0c, 0x03, 0x04, 0x00, 0x00, 0x00, 0x04, 0x00, 0x01, b'a', b'b',
    ];
    let overflow = [0x00, 0x0b, 0x03, 0x08, 0x00, 0x01, b'c', b'd', b'e', b'f', b'g'];
    feed(&mut machine, &mut recv, &first);
    assert_eq!(machine.fragments_in_progress(), 1);

    recv.extend_from_slice(&overflow);
    recv.extend_from_slice(&[0x00, 0x03, 0x02]);
    let err = machine
        .advance_on_socket_read(&recv, ReadOutcome::Data(overflow.len() + 3))
        .expect_err("continuation exceeds the total");
    assert!(matches!(
        err,
        ReadError::FragmentOverflow {
            total: 4,
            attempted: 7,
            ..
        }
    ));
    assert!(err.is_recoverable());
    assert_eq!(machine.fragments_in_progress(), 0);
    assert_eq!(machine.state(), ReadState::Complete);
    assert!(machine.current_message(&recv).is_none());

    machine
        .advance_on_application_read(&recv)
        .expect("the failed frame is skipped");
    assert!(machine.is_ping());
}

#[test]
fn oversized_announcement_is_rejected() {
    let mut machine = ReadBufferStateMachine::new(RipcFunctions::default()).with_max_message_size(3);
    let mut recv = ReceiveBuffer::with_capacity(32);
    recv.extend_from_slice(&[
        0x00, 0x0c, 0x03, 0x04, 0x00, 0x00, 0x00, 0x04, 0x00, 0x02, b'a', b'b',
    ]);

    let err = machine
        .advance_on_socket_read(&recv, ReadOutcome::Data(12))
        .expect_err("total exceeds the limit");
    assert!(matches!(
        err,
        ReadError::MessageTooLarge {
            id,
            total: 4,
            limit: 3
        } if id == FragmentId::new(2)
    ));
}

#[rstest]
fn corrupt_payload_is_skipped(mut machine: ReadBufferStateMachine<RipcFunctions>) {
    let mut recv = ReceiveBuffer::with_capacity(32);
    recv.extend_from_slice(&[0x00, 0x06, 0x06, 1, 2, 3, 0x00, 0x04, 0x02, b'!']);

    let err = machine
        .advance_on_socket_read(&recv, ReadOutcome::Data(10))
        .expect_err("garbage does not inflate");
    assert!(matches!(err, ReadError::Compression(_)));
    assert!(machine.current_message(&recv).is_none());

    machine
        .advance_on_application_read(&recv)
        .expect("the failed frame is skipped");
    assert_eq!(machine.current_message(&recv), Some(&b"!"[..]));
}

#[test]
fn compressed_frame_without_compressor_is_rejected() {
    let mut machine = ReadBufferStateMachine::new(RipcFunctions::default());
    let mut recv = ReceiveBuffer::with_capacity(16);
    recv.extend_from_slice(&[0x00, 0x05, 0x06, 1, 2]);

    let err = machine
        .advance_on_socket_read(&recv, ReadOutcome::Data(5))
        .expect_err("compression is off");
    assert!(matches!(err, ReadError::CompressionDisabled));
}

#[rstest]
#[traced_test]
fn stray_comp_fragment_is_abandoned(mut machine: ReadBufferStateMachine<RipcFunctions>) {
    let mut recv = ReceiveBuffer::with_capacity(32);
    let bytes = [0x00, 0x05, 0x0e, 0x78, 0x9c, 0x00, 0x05, 0x02, b'o', b'k'];

    feed(&mut machine, &mut recv, &bytes);

    assert_eq!(machine.current_message(&recv), Some(&b"ok"[..]));
    assert_eq!(machine.abandoned_comp_fragment_count(), 1);
    assert!(logs_contain("abandoned unfinished CompFragment sequence"));
}

#[rstest]
#[case::zero(&[0x00, 0x00, 0x02], 0)]
#[case::two(&[0x00, 0x02, 0x02], 2)]
fn short_length_is_a_framing_error(
    mut machine: ReadBufferStateMachine<RipcFunctions>,
    #[case] bytes: &[u8],
    #[case] length: usize,
) {
    let mut recv = ReceiveBuffer::with_capacity(16);
    recv.extend_from_slice(bytes);

    let err = machine
        .advance_on_socket_read(&recv, ReadOutcome::Data(bytes.len()))
        .expect_err("length cannot hold the header");
    assert!(matches!(
        err,
        ReadError::Framing(FramingError::InvalidFrameLength { length: l, minimum: 3 }) if l == length
    ));
    assert!(!err.is_recoverable());
}

#[rstest]
fn closed_stream_is_terminal(mut machine: ReadBufferStateMachine<RipcFunctions>) {
    let recv = ReceiveBuffer::with_capacity(16);
    machine
        .advance_on_socket_read(&recv, ReadOutcome::Closed)
        .expect("closing never fails");
    assert_eq!(machine.state(), ReadState::EndOfStream);

    let err = machine
        .advance_on_application_read(&recv)
        .expect_err("nothing to read");
    assert!(matches!(
        err,
        ReadError::NotComplete {
            state: ReadState::EndOfStream
        }
    ));
}

#[rstest]
fn large_frame_needs_compaction_and_growth(mut machine: ReadBufferStateMachine<RipcFunctions>) {
    let big = [b'q'; 27];
    let bytes = encode(&mut writer(64), &[b"hi", big.as_slice()]);
    assert_eq!(bytes.len(), 35);
    let mut recv = ReceiveBuffer::with_capacity(16);

    feed(&mut machine, &mut recv, &bytes[..16]);
    assert_eq!(machine.current_message(&recv), Some(&b"hi"[..]));
    machine
        .advance_on_application_read(&recv)
        .expect("message was ready");
    assert_eq!(machine.state(), ReadState::LengthKnownInsufficient);
    assert_eq!(machine.consumed(), 5);
    assert_eq!(machine.required_capacity(), 30);

    recv.compact(machine.consumed());
    recv.grow(machine.required_capacity());
    machine
        .advance_on_compact(&recv)
        .expect("relocated frame parses");
    assert_eq!(machine.consumed(), 0);
    assert_eq!(machine.state(), ReadState::LengthKnownIncomplete);

    feed(&mut machine, &mut recv, &bytes[16..]);
    assert_eq!(machine.current_message(&recv), Some(&big[..]));
}

#[rstest]
fn header_straddling_the_end_is_insufficient(mut machine: ReadBufferStateMachine<RipcFunctions>) {
    let bytes = encode(&mut writer(64), &[b"abcde", b"xyz"]);
    let mut recv = ReceiveBuffer::with_capacity(9);

    feed(&mut machine, &mut recv, &bytes[..9]);
    machine
        .advance_on_application_read(&recv)
        .expect("first message was ready");
    assert_eq!(machine.state(), ReadState::LengthUnknownInsufficient);

    recv.compact(machine.consumed());
    machine
        .advance_on_compact(&recv)
        .expect("partial header is kept");
    assert_eq!(machine.state(), ReadState::LengthUnknownIncomplete);

    feed(&mut machine, &mut recv, &bytes[9..]);
    assert_eq!(machine.current_message(&recv), Some(&b"xyz"[..]));
}

#[rstest]
fn compaction_keeps_packed_cursor(mut machine: ReadBufferStateMachine<RipcFunctions>) {
    let mut writer = writer(64);
    let mut out = BytesMut::new();
    writer.write_message(b"lead", &mut out).expect("fits");
    let mut packed = writer.packed_frame();
    packed.push(b"one").expect("fits");
    packed.push(b"two").expect("fits");
    writer.write_packed(&packed, &mut out).expect("fits");
    let mut recv = ReceiveBuffer::with_capacity(64);

    feed(&mut machine, &mut recv, &out);
    machine
        .advance_on_application_read(&recv)
        .expect("lead message read");
    assert_eq!(machine.current_message(&recv), Some(&b"one"[..]));

    recv.compact(machine.consumed());
    machine
        .advance_on_compact(&recv)
        .expect("complete frames stay put");
    assert_eq!(machine.current_message(&recv), Some(&b"one"[..]));
    machine
        .advance_on_application_read(&recv)
        .expect("second sub-message");
    assert_eq!(machine.current_message(&recv), Some(&b"two"[..]));
}

#[rstest]
fn reading_when_not_complete_fails(mut machine: ReadBufferStateMachine<RipcFunctions>) {
    let recv = ReceiveBuffer::with_capacity(8);
    assert!(matches!(
        machine.advance_on_application_read(&recv),
        Err(ReadError::NotComplete {
            state: ReadState::NoData
        })
    ));
}
