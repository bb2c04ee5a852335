#![cfg(test)]
//! Shared helpers for unit tests.

use crate::{
    buffer::ReceiveBuffer,
    protocol::ProtocolFunctions,
    read::{ReadBufferStateMachine, ReadOutcome, ReadState},
};

pub(crate) use ripcframe_testing::noise;

/// Append `bytes` to `recv` and report them to `machine`.
pub(crate) fn feed<P: ProtocolFunctions>(
    machine: &mut ReadBufferStateMachine<P>,
    recv: &mut ReceiveBuffer,
    bytes: &[u8],
) {
    let count = recv.extend_from_slice(bytes);
    assert_eq!(count, bytes.len(), "receive buffer too small for test input");
    machine
        .advance_on_socket_read(recv, ReadOutcome::Data(count))
        .expect("test input should be well formed");
}

/// Collect every message the machine can deliver without more input.
pub(crate) fn drain<P: ProtocolFunctions>(
    machine: &mut ReadBufferStateMachine<P>,
    recv: &ReceiveBuffer,
) -> Vec<Vec<u8>> {
    let mut messages = Vec::new();
    while machine.state() == ReadState::Complete {
        if let Some(message) = machine.current_message(recv) {
            messages.push(message.to_vec());
        }
        machine
            .advance_on_application_read(recv)
            .expect("queued frames should be well formed");
    }
    messages
}
