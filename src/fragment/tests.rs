//! Identifier allocation, chunk planning and reassembly bookkeeping.

use rstest::{fixture, rstest};
use tracing_test::traced_test;

use super::{
    FragmentId,
    FragmentIdWidth,
    FragmentStatus,
    FragmentationError,
    Fragmenter,
    Reassembler,
    ReassemblyError,
};
use crate::protocol::FragmentHeader;

#[fixture]
fn reassembler() -> Reassembler { Reassembler::new(1024) }

#[rstest]
#[case::one_byte(FragmentIdWidth::OneByte, 255)]
#[case::two_bytes(FragmentIdWidth::TwoBytes, 65_535)]
fn identifiers_wrap_past_zero(#[case] width: FragmentIdWidth, #[case] max: u16) {
    let mut fragmenter = Fragmenter::new(width);
    assert_eq!(fragmenter.next_id(), FragmentId::new(1));
    for _ in 2..max {
        fragmenter.next_id();
    }
    assert_eq!(fragmenter.next_id(), FragmentId::new(max));
    assert_eq!(fragmenter.next_id(), FragmentId::new(1));
}

#[test]
fn split_plans_first_then_continuations() {
    let mut fragmenter = Fragmenter::new(FragmentIdWidth::TwoBytes);
    let payload: Vec<u8> = (0..10).collect();
    let chunks: Vec<_> = fragmenter
        .split(&payload, 4, 3)
        .expect("rooms are non-zero")
        .collect();

    let id = FragmentId::new(1);
    assert_eq!(
        chunks,
        vec![
            (FragmentHeader::First { total_len: 10, id }, &payload[..4]),
            (FragmentHeader::Continuation { id }, &payload[4..7]),
            (FragmentHeader::Continuation { id }, &payload[7..]),
        ]
    );
}

#[test]
fn each_split_takes_a_new_identifier() {
    let mut fragmenter = Fragmenter::new(FragmentIdWidth::OneByte);
    let first = fragmenter.split(b"abc", 2, 2).expect("valid rooms").id();
    let second = fragmenter.split(b"abc", 2, 2).expect("valid rooms").id();
    assert_ne!(first, second);
}

#[test]
fn split_rejects_zero_room() {
    let mut fragmenter = Fragmenter::new(FragmentIdWidth::TwoBytes);
    assert_eq!(
        fragmenter.split(b"abc", 0, 2).map(|chunks| chunks.count()),
        Err(FragmentationError::NoPayloadRoom)
    );
}

#[rstest]
fn message_completes_when_buffer_is_full(mut reassembler: Reassembler) {
    let id = FragmentId::new(7);
    assert_eq!(reassembler.start(id, 6, b"ab"), Ok(FragmentStatus::Incomplete));
    assert!(reassembler.completed(id).is_none());
    assert_eq!(reassembler.append(id, b"cd"), Ok(FragmentStatus::Incomplete));
    assert_eq!(reassembler.progress(id), Some((4, 6)));
    assert_eq!(reassembler.append(id, b"ef"), Ok(FragmentStatus::Complete));
    assert_eq!(reassembler.completed(id), Some(&b"abcdef"[..]));

    reassembler.release(id);
    assert_eq!(reassembler.in_flight(), 0);
}

#[rstest]
fn interleaved_identifiers_reassemble_independently(mut reassembler: Reassembler) {
    let (left, right) = (FragmentId::new(1), FragmentId::new(2));
    reassembler.start(left, 4, b"ab").expect("within limit");
    reassembler.start(right, 3, b"x").expect("within limit");
    assert_eq!(reassembler.append(right, b"yz"), Ok(FragmentStatus::Complete));
    assert_eq!(reassembler.append(left, b"cd"), Ok(FragmentStatus::Complete));
    assert_eq!(reassembler.completed(left), Some(&b"abcd"[..]));
    assert_eq!(reassembler.completed(right), Some(&b"xyz"[..]));
}

#[rstest]
#[traced_test]
fn unknown_continuation_is_dropped_and_counted(mut reassembler: Reassembler) {
    assert_eq!(
        reassembler.append(FragmentId::new(9), b"orphan"),
        Ok(FragmentStatus::Unknown)
    );
    assert_eq!(reassembler.unknown_dropped(), 1);
    assert_eq!(reassembler.in_flight(), 0);
    assert!(logs_contain("dropped fragment for unknown id"));
}

#[rstest]
#[traced_test]
fn new_first_fragment_replaces_unfinished_message(mut reassembler: Reassembler) {
    let id = FragmentId::new(3);
    reassembler.start(id, 10, b"stale").expect("within limit");
    assert_eq!(reassembler.start(id, 2, b"ok"), Ok(FragmentStatus::Complete));
    assert_eq!(reassembler.completed(id), Some(&b"ok"[..]));
    assert_eq!(reassembler.replaced(), 1);
    assert_eq!(reassembler.in_flight(), 1);
    assert!(logs_contain("replaced an unfinished reassembly"));
}

#[rstest]
fn overflow_discards_the_message(mut reassembler: Reassembler) {
    let id = FragmentId::new(4);
    reassembler.start(id, 3, b"ab").expect("within limit");
    assert_eq!(
        reassembler.append(id, b"cd"),
        Err(ReassemblyError::Overflow {
            id,
            total: 3,
            attempted: 4,
        })
    );
    assert_eq!(reassembler.in_flight(), 0);
    assert_eq!(reassembler.append(id, b"c"), Ok(FragmentStatus::Unknown));
}

#[rstest]
fn announced_length_is_capped(mut reassembler: Reassembler) {
    let id = FragmentId::new(5);
    assert_eq!(
        reassembler.start(id, 4096, b"a"),
        Err(ReassemblyError::MessageTooLarge {
            id,
            total: 4096,
            limit: 1024,
        })
    );
    assert_eq!(reassembler.in_flight(), 0);
}

#[rstest]
fn empty_message_completes_at_once(mut reassembler: Reassembler) {
    let id = FragmentId::new(6);
    assert_eq!(reassembler.start(id, 0, b""), Ok(FragmentStatus::Complete));
    assert_eq!(reassembler.completed(id), Some(&b""[..]));
}
