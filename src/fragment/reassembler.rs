//! Inbound helper that stitches fragments back into complete messages.
//!
//! Each reassembly owns a buffer whose capacity is the total length
//! announced by the first fragment; the message is complete exactly when the
//! buffer is full. Completed buffers stay in the map until the reader has
//! consumed them and calls [`Reassembler::release`].

use std::collections::{HashMap, hash_map::Entry};

use tracing::{debug, warn};

use super::{FragmentId, FragmentStatus, ReassemblyError};
use crate::metrics::{self, DropReason};

#[derive(Debug)]
struct Assembly {
    buffer: Vec<u8>,
    total: usize,
}

impl Assembly {
    fn new(total: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(total),
            total,
        }
    }

    fn is_complete(&self) -> bool { self.buffer.len() == self.total }

    fn status(&self) -> FragmentStatus {
        if self.is_complete() {
            FragmentStatus::Complete
        } else {
            FragmentStatus::Incomplete
        }
    }
}

/// Per-identifier fragment reassembly.
#[derive(Debug)]
pub struct Reassembler {
    max_message_size: usize,
    assemblies: HashMap<FragmentId, Assembly>,
    unknown_dropped: u64,
    replaced: u64,
}

impl Reassembler {
    /// Create a reassembler that rejects messages announced larger than
    /// `max_message_size` bytes.
    #[must_use]
    pub fn new(max_message_size: usize) -> Self {
        Self {
            max_message_size,
            assemblies: HashMap::new(),
            unknown_dropped: 0,
            replaced: 0,
        }
    }

    /// Begin reassembling message `id` of `total` bytes with the payload of
    /// its first fragment.
    ///
    /// An assembly already in progress for `id` is discarded and replaced.
    ///
    /// # Errors
    ///
    /// Returns [`ReassemblyError::MessageTooLarge`] when `total` exceeds the
    /// configured limit and [`ReassemblyError::Overflow`] when `payload` is
    /// longer than `total`.
    pub fn start(
        &mut self,
        id: FragmentId,
        total: usize,
        payload: &[u8],
    ) -> Result<FragmentStatus, ReassemblyError> {
        if total > self.max_message_size {
            self.discard(id);
            return Err(ReassemblyError::MessageTooLarge {
                id,
                total,
                limit: self.max_message_size,
            });
        }
        match self.assemblies.entry(id) {
            Entry::Occupied(mut occupied) => {
                warn!(
                    fragment_id = %id,
                    abandoned = occupied.get().buffer.len(),
                    "first fragment replaced an unfinished reassembly"
                );
                self.replaced += 1;
                metrics::inc_fragments_dropped(DropReason::Replaced);
                occupied.insert(Assembly::new(total));
            }
            Entry::Vacant(vacant) => {
                vacant.insert(Assembly::new(total));
                metrics::inc_reassemblies();
            }
        }
        debug!(fragment_id = %id, total, "reassembly started");
        self.append(id, payload)
    }

    /// Append the payload of a continuation fragment.
    ///
    /// A continuation for an identifier with no reassembly in progress is
    /// dropped, logged and counted, and reported as
    /// [`FragmentStatus::Unknown`].
    ///
    /// # Errors
    ///
    /// Returns [`ReassemblyError::Overflow`] and discards the reassembly when
    /// `payload` would exceed the announced total.
    pub fn append(
        &mut self,
        id: FragmentId,
        payload: &[u8],
    ) -> Result<FragmentStatus, ReassemblyError> {
        let Some(assembly) = self.assemblies.get_mut(&id) else {
            self.unknown_dropped += 1;
            metrics::inc_fragments_dropped(DropReason::UnknownId);
            warn!(
                fragment_id = %id,
                len = payload.len(),
                "dropped fragment for unknown id"
            );
            return Ok(FragmentStatus::Unknown);
        };
        let attempted = assembly.buffer.len().saturating_add(payload.len());
        if attempted > assembly.total {
            let total = assembly.total;
            self.discard(id);
            metrics::inc_fragments_dropped(DropReason::Overflow);
            warn!(fragment_id = %id, total, attempted, "fragment overflowed its message");
            return Err(ReassemblyError::Overflow {
                id,
                total,
                attempted,
            });
        }
        assembly.buffer.extend_from_slice(payload);
        Ok(assembly.status())
    }

    /// Borrow the payload of a completed message.
    #[must_use]
    pub fn completed(&self, id: FragmentId) -> Option<&[u8]> {
        self.assemblies
            .get(&id)
            .filter(|assembly| assembly.is_complete())
            .map(|assembly| assembly.buffer.as_slice())
    }

    /// Free the buffer of message `id`, complete or not.
    pub fn release(&mut self, id: FragmentId) { self.discard(id); }

    /// Reassemblies currently held, completed ones included.
    #[must_use]
    pub fn in_flight(&self) -> usize { self.assemblies.len() }

    /// Bytes received so far and announced total for message `id`.
    #[must_use]
    pub fn progress(&self, id: FragmentId) -> Option<(usize, usize)> {
        self.assemblies
            .get(&id)
            .map(|assembly| (assembly.buffer.len(), assembly.total))
    }

    /// Continuations dropped because their identifier was unknown.
    #[must_use]
    pub fn unknown_dropped(&self) -> u64 { self.unknown_dropped }

    /// Unfinished reassemblies replaced by a new first fragment.
    #[must_use]
    pub fn replaced(&self) -> u64 { self.replaced }

    /// Largest message accepted.
    #[must_use]
    pub fn max_message_size(&self) -> usize { self.max_message_size }

    fn discard(&mut self, id: FragmentId) {
        if self.assemblies.remove(&id).is_some() {
            metrics::dec_reassemblies(1);
        }
    }
}

impl Drop for Reassembler {
    fn drop(&mut self) {
        if !self.assemblies.is_empty() {
            metrics::dec_reassemblies(self.assemblies.len());
        }
    }
}
