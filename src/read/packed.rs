//! Walking the length-prefixed sub-messages of a packed body.

use super::ReadError;
use crate::byte_order::read_u16_at;

/// Size of the length prefix in front of each packed sub-message.
pub const PACKED_PREFIX_LEN: usize = 2;

/// Position within a packed body.
///
/// Offsets are relative to whichever buffer holds the body; the machine
/// shifts them when that buffer is compacted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct PackedCursor {
    next: usize,
    end: usize,
}

impl PackedCursor {
    /// Validate every prefix in `bytes[start..end]` and return a cursor at
    /// the first one, or `None` when the body holds no sub-message.
    pub(crate) fn scan(bytes: &[u8], start: usize, end: usize) -> Result<Option<Self>, ReadError> {
        let mut offset = start;
        let mut found = false;
        while offset + PACKED_PREFIX_LEN <= end {
            let declared = match read_u16_at(bytes, offset) {
                Some(0) | None => break,
                Some(declared) => usize::from(declared),
            };
            let available = end - offset - PACKED_PREFIX_LEN;
            if declared > available {
                return Err(ReadError::PackedOverrun {
                    offset: offset - start,
                    declared,
                    available,
                });
            }
            found = true;
            offset += PACKED_PREFIX_LEN + declared;
        }
        Ok(found.then_some(Self { next: start, end }))
    }

    /// Step to the next sub-message, returning its `(position, length)`.
    pub(crate) fn advance(&mut self, bytes: &[u8]) -> Option<(usize, usize)> {
        if self.next + PACKED_PREFIX_LEN > self.end {
            return None;
        }
        let len = usize::from(read_u16_at(bytes, self.next)?);
        if len == 0 {
            self.next = self.end;
            return None;
        }
        let position = self.next + PACKED_PREFIX_LEN;
        self.next = position + len;
        Some((position, len))
    }

    /// Rebase offsets after `by` bytes were removed from the buffer front.
    pub(crate) fn shift(&mut self, by: usize) {
        self.next -= by;
        self.end -= by;
    }
}
