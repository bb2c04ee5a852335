//! Outbound helper that splits messages into fragment frames.
//!
//! [`Fragmenter`] allocates fragment identifiers for one channel direction
//! and plans how a payload is cut into a first fragment followed by
//! continuations. It never touches frame bytes; the frame writer pairs each
//! planned chunk with its header.

use super::{FragmentId, FragmentIdWidth, FragmentationError};
use crate::protocol::FragmentHeader;

/// Fragment identifier allocator.
///
/// Identifiers start at one, increase per fragmented message, wrap within
/// the negotiated width and skip zero.
#[derive(Clone, Debug)]
pub struct Fragmenter {
    width: FragmentIdWidth,
    next: u16,
}

impl Fragmenter {
    /// Create an allocator for identifiers of `width`.
    #[must_use]
    pub const fn new(width: FragmentIdWidth) -> Self { Self { width, next: 1 } }

    /// Width of the identifiers handed out.
    #[must_use]
    pub const fn width(&self) -> FragmentIdWidth { self.width }

    /// Hand out the next identifier.
    pub fn next_id(&mut self) -> FragmentId {
        let id = self.next;
        self.next = if id >= self.width.max_id().get() {
            1
        } else {
            id + 1
        };
        FragmentId::new(id)
    }

    /// Cut `payload` into fragments under a fresh identifier.
    ///
    /// The first chunk holds at most `first_room` bytes and every later
    /// chunk at most `continuation_room` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`FragmentationError::MessageTooLarge`] when the payload
    /// length does not fit a `u32`, and
    /// [`FragmentationError::NoPayloadRoom`] when either room is zero.
    pub fn split<'a>(
        &mut self,
        payload: &'a [u8],
        first_room: usize,
        continuation_room: usize,
    ) -> Result<FragmentChunks<'a>, FragmentationError> {
        let total_len = u32::try_from(payload.len())
            .map_err(|_| FragmentationError::MessageTooLarge { len: payload.len() })?;
        if first_room == 0 || continuation_room == 0 {
            return Err(FragmentationError::NoPayloadRoom);
        }
        Ok(FragmentChunks {
            id: self.next_id(),
            total_len,
            remaining: payload,
            first_room,
            continuation_room,
            started: false,
        })
    }
}

/// Iterator over the `(header, chunk)` pairs of one fragmented message.
#[derive(Clone, Debug)]
pub struct FragmentChunks<'a> {
    id: FragmentId,
    total_len: u32,
    remaining: &'a [u8],
    first_room: usize,
    continuation_room: usize,
    started: bool,
}

impl FragmentChunks<'_> {
    /// Identifier shared by every chunk.
    #[must_use]
    pub const fn id(&self) -> FragmentId { self.id }
}

impl<'a> Iterator for FragmentChunks<'a> {
    type Item = (FragmentHeader, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        let (header, room) = if self.started {
            if self.remaining.is_empty() {
                return None;
            }
            (FragmentHeader::Continuation { id: self.id }, self.continuation_room)
        } else {
            self.started = true;
            (
                FragmentHeader::First {
                    total_len: self.total_len,
                    id: self.id,
                },
                self.first_room,
            )
        };
        let (chunk, rest) = self.remaining.split_at(room.min(self.remaining.len()));
        self.remaining = rest;
        Some((header, chunk))
    }
}
