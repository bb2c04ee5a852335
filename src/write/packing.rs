//! Building packed frames one sub-message at a time.

use bytes::{BufMut, BytesMut};

use super::WriteError;
use crate::{byte_order::patch_u16_at, read::PACKED_PREFIX_LEN};

/// Body of a packed frame under construction.
///
/// Each sub-message is preceded by a two-byte length prefix reserved by
/// [`begin_message`](Self::begin_message) and filled in by
/// [`finish_message`](Self::finish_message). A sub-message finished with no
/// bytes is removed again, since a zero prefix ends a packed frame.
///
/// # Examples
///
/// ```
/// use ripcframe::write::PackedFrame;
///
/// let mut frame = PackedFrame::new(32);
/// frame.push(b"AB").expect("fits");
/// frame.push(b"CDE").expect("fits");
/// assert_eq!(frame.body(), &[0, 2, b'A', b'B', 0, 3, b'C', b'D', b'E']);
/// assert_eq!(frame.message_count(), 2);
/// ```
#[derive(Clone, Debug)]
pub struct PackedFrame {
    body: BytesMut,
    max_body: usize,
    open: Option<usize>,
    messages: usize,
}

impl PackedFrame {
    /// Start an empty body that may grow to `max_body` bytes.
    #[must_use]
    pub fn new(max_body: usize) -> Self {
        Self {
            body: BytesMut::with_capacity(max_body),
            max_body,
            open: None,
            messages: 0,
        }
    }

    /// Bytes a new sub-message could hold after its length prefix.
    #[must_use]
    pub fn room_for_next(&self) -> usize {
        self.max_body
            .saturating_sub(self.body.len() + PACKED_PREFIX_LEN)
            .min(usize::from(u16::MAX))
    }

    /// Whether another sub-message with at least one byte fits.
    #[must_use]
    pub fn has_room(&self) -> bool { self.room_for_next() > 0 }

    /// Bytes the open sub-message can still take.
    #[must_use]
    pub fn remaining(&self) -> usize {
        match self.open {
            Some(prefix) => {
                let written = self.body.len() - prefix - PACKED_PREFIX_LEN;
                self.max_body
                    .saturating_sub(self.body.len())
                    .min(usize::from(u16::MAX) - written)
            }
            None => 0,
        }
    }

    /// Reserve the length prefix of a new sub-message.
    ///
    /// # Errors
    ///
    /// Returns [`WriteError::MessageOpen`] if a sub-message is open and
    /// [`WriteError::PackedFrameFull`] if no byte would fit after the
    /// prefix.
    pub fn begin_message(&mut self) -> Result<(), WriteError> {
        if self.open.is_some() {
            return Err(WriteError::MessageOpen);
        }
        if !self.has_room() {
            return Err(WriteError::PackedFrameFull {
                needed: PACKED_PREFIX_LEN + 1,
                available: self.max_body.saturating_sub(self.body.len()),
            });
        }
        self.open = Some(self.body.len());
        self.body.put_u16(0);
        Ok(())
    }

    /// Append bytes to the open sub-message.
    ///
    /// # Errors
    ///
    /// Returns [`WriteError::NoOpenMessage`] without an open sub-message and
    /// [`WriteError::PackedFrameFull`] when `bytes` does not fit.
    pub fn extend(&mut self, bytes: &[u8]) -> Result<(), WriteError> {
        if self.open.is_none() {
            return Err(WriteError::NoOpenMessage);
        }
        let available = self.remaining();
        if bytes.len() > available {
            return Err(WriteError::PackedFrameFull {
                needed: bytes.len(),
                available,
            });
        }
        self.body.put_slice(bytes);
        Ok(())
    }

    /// Close the open sub-message by writing its length prefix.
    ///
    /// # Errors
    ///
    /// Returns [`WriteError::NoOpenMessage`] without an open sub-message.
    pub fn finish_message(&mut self) -> Result<(), WriteError> {
        let prefix = self.open.take().ok_or(WriteError::NoOpenMessage)?;
        let written = self.body.len() - prefix - PACKED_PREFIX_LEN;
        if written == 0 {
            self.body.truncate(prefix);
            return Ok(());
        }
        let length = u16::try_from(written).map_err(|_| WriteError::PackedFrameFull {
            needed: written,
            available: usize::from(u16::MAX),
        })?;
        if patch_u16_at(&mut self.body, prefix, length).is_none() {
            return Err(WriteError::NoOpenMessage);
        }
        self.messages += 1;
        Ok(())
    }

    /// Add a whole sub-message.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`begin_message`](Self::begin_message) and
    /// [`extend`](Self::extend). On error the frame is left as it was.
    pub fn push(&mut self, message: &[u8]) -> Result<(), WriteError> {
        if message.len() > self.room_for_next() {
            return Err(WriteError::PackedFrameFull {
                needed: PACKED_PREFIX_LEN + message.len(),
                available: self.max_body.saturating_sub(self.body.len()),
            });
        }
        self.begin_message()?;
        self.extend(message)?;
        self.finish_message()
    }

    /// Encoded body written so far.
    #[must_use]
    pub fn body(&self) -> &[u8] { &self.body }

    /// Finished sub-messages.
    #[must_use]
    pub fn message_count(&self) -> usize { self.messages }

    /// Whether no sub-message has been finished.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.messages == 0 }

    /// Whether a sub-message is open.
    #[must_use]
    pub fn is_open(&self) -> bool { self.open.is_some() }

    /// Discard all sub-messages, keeping the allocation.
    pub fn clear(&mut self) {
        self.body.clear();
        self.open = None;
        self.messages = 0;
    }
}
