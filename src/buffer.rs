//! Fixed-capacity receive buffer shared by the socket and the read path.
//!
//! The buffer has two cursors. The *filled* cursor marks the end of bytes
//! received from the socket; everything in `[0, filled)` is readable. Space in
//! `[filled, capacity)` is handed to the socket for the next receive. The
//! consumption cursor lives in the
//! [`ReadBufferStateMachine`](crate::read::ReadBufferStateMachine), which
//! tells the owner how much of the front can be discarded by
//! [`ReceiveBuffer::compact`].
//!
//! Capacity only changes through [`ReceiveBuffer::grow`], so running out of
//! room is visible to the state machine as an "insufficient space" state
//! instead of a silent reallocation.

use tracing::debug;

/// Receive buffer owned by a channel and lent to its state machine.
#[derive(Debug)]
pub struct ReceiveBuffer {
    bytes: Vec<u8>,
    filled: usize,
}

impl ReceiveBuffer {
    /// Allocate a zeroed buffer of `capacity` bytes.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: vec![0; capacity],
            filled: 0,
        }
    }

    /// Build a buffer whose readable region is `bytes`, with no spare room.
    #[must_use]
    pub fn from_filled(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.to_vec(),
            filled: bytes.len(),
        }
    }

    /// Total bytes the buffer can hold.
    #[must_use]
    pub fn capacity(&self) -> usize { self.bytes.len() }

    /// Write position: number of received bytes.
    #[must_use]
    pub fn filled(&self) -> usize { self.filled }

    /// Space left for the next receive.
    #[must_use]
    pub fn remaining(&self) -> usize { self.capacity() - self.filled }

    /// All received bytes.
    #[must_use]
    pub fn as_filled(&self) -> &[u8] { &self.bytes[..self.filled] }

    /// Spare space for the socket to receive into.
    ///
    /// Call [`commit`](Self::commit) with the number of bytes written.
    pub fn unfilled_mut(&mut self) -> &mut [u8] { &mut self.bytes[self.filled..] }

    /// Mark `count` bytes of the spare space as received.
    ///
    /// # Panics
    ///
    /// Panics if `count` exceeds [`remaining`](Self::remaining), which means
    /// the caller reported more bytes than it was given room for.
    pub fn commit(&mut self, count: usize) {
        assert!(
            count <= self.remaining(),
            "committed {count} bytes with only {} free",
            self.remaining()
        );
        self.filled += count;
    }

    /// Copy `data` into the spare space, returning how many bytes fitted.
    pub fn extend_from_slice(&mut self, data: &[u8]) -> usize {
        let count = data.len().min(self.remaining());
        let start = self.filled;
        self.bytes[start..start + count].copy_from_slice(&data[..count]);
        self.filled += count;
        count
    }

    /// Discard everything before `consumed`, moving unread bytes to the front.
    ///
    /// `consumed` is clamped to the filled region.
    pub fn compact(&mut self, consumed: usize) {
        let consumed = consumed.min(self.filled);
        if consumed == 0 {
            return;
        }
        self.bytes.copy_within(consumed..self.filled, 0);
        self.filled -= consumed;
        debug!(
            discarded = consumed,
            retained = self.filled,
            "compacted receive buffer"
        );
    }

    /// Enlarge the buffer to at least `capacity` bytes, keeping its contents.
    pub fn grow(&mut self, capacity: usize) {
        if capacity <= self.capacity() {
            return;
        }
        debug!(
            from = self.capacity(),
            to = capacity,
            "growing receive buffer"
        );
        self.bytes.resize(capacity, 0);
    }

    /// Forget all received bytes.
    pub fn clear(&mut self) { self.filled = 0; }
}
