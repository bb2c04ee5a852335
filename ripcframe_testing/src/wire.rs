//! Building frame streams and replaying them through a read state machine.

use bytes::BytesMut;
use ripcframe::{
    buffer::ReceiveBuffer,
    compression::CompressionType,
    protocol::ProtocolFunctions,
    read::{ReadBufferStateMachine, ReadOutcome, ReadState},
    write::FrameWriter,
};

/// Deterministic bytes that compress poorly, seeded by `seed`.
#[must_use]
pub fn noise(len: usize, seed: u32) -> Vec<u8> {
    let mut state = seed.max(1);
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            state.to_le_bytes()[0]
        })
        .collect()
}

/// Frame `messages` with a fresh writer.
///
/// `compression` is `(algorithm, threshold)`.
///
/// # Panics
///
/// Panics if a message cannot be framed.
#[must_use]
pub fn encode_messages<P: ProtocolFunctions>(
    protocol: P,
    max_frame: usize,
    compression: Option<(CompressionType, usize)>,
    messages: &[&[u8]],
) -> Vec<u8> {
    let mut writer = FrameWriter::new(protocol, max_frame);
    if let Some((compressor, threshold)) =
        compression.and_then(|(kind, threshold)| Some((kind.compressor(6)?, threshold)))
    {
        writer = writer.with_compressor(compressor, threshold);
    }
    let mut out = BytesMut::new();
    for message in messages {
        writer
            .write_message(message, &mut out)
            .expect("test message should frame");
    }
    out.to_vec()
}

/// Feed `bytes` to a fresh machine in chunks of the given sizes, cycling
/// through `chunks`, and return every message delivered.
///
/// The receive buffer starts at the smallest size that can hold a header,
/// so every compaction and growth path is taken along the way.
///
/// # Panics
///
/// Panics if the stream is malformed or `chunks` contains zero.
#[must_use]
pub fn replay_in_chunks<P: ProtocolFunctions>(
    protocol: P,
    compression: Option<CompressionType>,
    bytes: &[u8],
    chunks: &[usize],
) -> Vec<Vec<u8>> {
    assert!(!chunks.contains(&0), "chunk sizes must be positive");
    let mut machine = ReadBufferStateMachine::new(protocol);
    machine.set_compressor(compression.and_then(|kind| kind.compressor(6)));
    let mut recv = ReceiveBuffer::with_capacity(protocol.header_len());
    let mut delivered = Vec::new();
    let mut offset = 0;

    for size in chunks.iter().cycle() {
        drain(&mut machine, &recv, &mut delivered);
        if offset == bytes.len() {
            break;
        }
        if machine.state().is_insufficient() || recv.remaining() == 0 {
            recv.compact(machine.consumed());
            recv.grow(machine.required_capacity().max(recv.filled() + 1));
            machine
                .advance_on_compact(&recv)
                .expect("compaction keeps frames intact");
            continue;
        }
        let end = (offset + size).min(bytes.len());
        let count = recv.extend_from_slice(&bytes[offset..end]);
        offset += count;
        machine
            .advance_on_socket_read(&recv, ReadOutcome::Data(count))
            .expect("replayed stream should be well formed");
    }
    delivered
}

fn drain<P: ProtocolFunctions>(
    machine: &mut ReadBufferStateMachine<P>,
    recv: &ReceiveBuffer,
    delivered: &mut Vec<Vec<u8>>,
) {
    while machine.state() == ReadState::Complete {
        if let Some(message) = machine.current_message(recv) {
            delivered.push(message.to_vec());
        }
        machine
            .advance_on_application_read(recv)
            .expect("queued frames should be well formed");
    }
}
