//! Incremental frame detection over a caller-owned receive buffer.
//!
//! The machine never owns the receive buffer. Every operation borrows it,
//! so the channel can append socket bytes, compact and grow between calls.
//! Offsets into the buffer are absolute until the caller compacts, after
//! which [`ReadBufferStateMachine::advance_on_compact`] rebases them.
//!
//! Frames that expose nothing to the application (continuation fragments,
//! first halves of a CompFragment pair, empty packed frames) are consumed
//! internally, so [`ReadState::Complete`] always means a message or a ping
//! is ready, unless the frame failed and is waiting to be skipped.

use tracing::{debug, trace, warn};

use super::{PackedCursor, ReadError, ReadOutcome, ReadState, ReadSubState};
use crate::{
    buffer::ReceiveBuffer,
    compression::Compressor,
    config::DEFAULT_MAX_MESSAGE_SIZE,
    fragment::{FragmentId, FragmentStatus, Reassembler, ReassemblyError},
    metrics::{self, Direction},
    protocol::{FragmentHeader, FrameHeader, ProtocolFunctions, RipcFlags},
};

/// Buffer a data view points into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Source {
    Receive,
    Decompressed,
    Fragment(FragmentId),
}

#[derive(Clone, Copy, Debug)]
struct DataView {
    source: Source,
    position: usize,
    length: usize,
}

/// First half of a compressed payload split across two frames.
#[derive(Debug)]
struct PendingCompFragment {
    buffer: Vec<u8>,
    fragment_id: Option<FragmentId>,
    packed: bool,
}

enum Dispatch {
    Exposed,
    Consumed,
}

/// Second half of a CompFragment pair: plain compressed data.
fn is_comp_fragment_tail(flags: RipcFlags) -> bool {
    flags.is_compressed()
        && !flags.is_comp_fragment()
        && !flags.is_packed()
        && !flags.has_optional_flags()
}

fn announced_len(total_len: u32) -> usize { usize::try_from(total_len).unwrap_or(usize::MAX) }

/// Read-side RIPC state machine for one channel.
///
/// # Examples
///
/// ```
/// use ripcframe::{
///     buffer::ReceiveBuffer,
///     protocol::RipcFunctions,
///     read::{ReadBufferStateMachine, ReadOutcome, ReadState},
/// };
///
/// let mut recv = ReceiveBuffer::with_capacity(64);
/// let mut machine = ReadBufferStateMachine::new(RipcFunctions::default());
///
/// recv.extend_from_slice(&[0x00, 0x05, 0x02, b'h', b'i']);
/// machine
///     .advance_on_socket_read(&recv, ReadOutcome::Data(5))
///     .expect("well-formed frame");
/// assert_eq!(machine.state(), ReadState::Complete);
/// assert_eq!(machine.current_message(&recv), Some(&b"hi"[..]));
///
/// machine.advance_on_application_read(&recv).expect("message was ready");
/// assert_eq!(machine.state(), ReadState::NoData);
/// ```
#[derive(Debug)]
pub struct ReadBufferStateMachine<P: ProtocolFunctions> {
    protocol: P,
    state: ReadState,
    sub_state: ReadSubState,
    frame_start: usize,
    header: Option<FrameHeader>,
    view: Option<DataView>,
    packed: Option<(Source, PackedCursor)>,
    ping: bool,
    reassembler: Reassembler,
    pending: Option<PendingCompFragment>,
    decompressed: Vec<u8>,
    compressor: Option<Box<dyn Compressor>>,
    abandoned_comp_fragments: u64,
}

impl<P: ProtocolFunctions> ReadBufferStateMachine<P> {
    /// Create a machine for `protocol` with compression disabled.
    #[must_use]
    pub fn new(protocol: P) -> Self {
        Self {
            protocol,
            state: ReadState::NoData,
            sub_state: ReadSubState::Normal,
            frame_start: 0,
            header: None,
            view: None,
            packed: None,
            ping: false,
            reassembler: Reassembler::new(DEFAULT_MAX_MESSAGE_SIZE),
            pending: None,
            decompressed: Vec::new(),
            compressor: None,
            abandoned_comp_fragments: 0,
        }
    }

    /// Decompress compressed frames with `compressor`.
    #[must_use]
    pub fn with_compressor(mut self, compressor: Box<dyn Compressor>) -> Self {
        self.compressor = Some(compressor);
        self
    }

    /// Reject fragmented messages announced larger than `limit` bytes.
    ///
    /// Reassemblies in progress are discarded.
    #[must_use]
    pub fn with_max_message_size(mut self, limit: usize) -> Self {
        self.reassembler = Reassembler::new(limit);
        self
    }

    /// Install or remove the decompressor.
    pub fn set_compressor(&mut self, compressor: Option<Box<dyn Compressor>>) {
        self.compressor = compressor;
    }

    /// Record the outcome of a receive into `recv`.
    ///
    /// A closed stream is terminal. New bytes, or unread bytes left behind
    /// by the previous frame, are parsed when the machine is waiting for a
    /// header or for the rest of a known-length frame. In any other state the
    /// call changes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`ReadError::Framing`] when a header is corrupt. Other errors
    /// concern one frame, which the next
    /// [`advance_on_application_read`](Self::advance_on_application_read)
    /// skips.
    pub fn advance_on_socket_read(
        &mut self,
        recv: &ReceiveBuffer,
        outcome: ReadOutcome,
    ) -> Result<(), ReadError> {
        let received = match outcome {
            ReadOutcome::Closed => {
                debug!(state = %self.state, "peer closed the stream");
                self.state = ReadState::EndOfStream;
                return Ok(());
            }
            ReadOutcome::Data(count) => count > 0,
            ReadOutcome::WouldBlock => false,
        };
        match self.state {
            ReadState::LengthKnownIncomplete if received => self.update_state(recv),
            ReadState::NoData | ReadState::LengthUnknownIncomplete
                if received || self.frame_start < recv.filled() =>
            {
                self.update_state(recv)
            }
            _ => Ok(()),
        }
    }

    /// Move past the message the application has just read.
    ///
    /// Packed frames step to their next sub-message. Otherwise the frame is
    /// released (a completed reassembly is freed) and the next frame in the
    /// buffer is parsed.
    ///
    /// # Errors
    ///
    /// Returns [`ReadError::NotComplete`] unless the state is
    /// [`ReadState::Complete`], and any error raised while parsing the next
    /// frame.
    pub fn advance_on_application_read(&mut self, recv: &ReceiveBuffer) -> Result<(), ReadError> {
        if self.state != ReadState::Complete {
            return Err(ReadError::NotComplete { state: self.state });
        }
        if let Some(view) = self.next_packed(recv) {
            self.view = Some(view);
            metrics::inc_messages();
            return Ok(());
        }
        if let Some(DataView {
            source: Source::Fragment(id),
            ..
        }) = self.view
        {
            self.reassembler.release(id);
        }
        self.finish_frame();
        self.update_state(recv)
    }

    /// Rebase offsets after the caller compacted `recv`.
    ///
    /// Call this right after `recv.compact(self.consumed())`; the current
    /// frame now starts at offset zero. Waiting states are recomputed
    /// against the new capacity.
    ///
    /// # Errors
    ///
    /// Returns any error raised while parsing the relocated frame.
    pub fn advance_on_compact(&mut self, recv: &ReceiveBuffer) -> Result<(), ReadError> {
        let shift = self.frame_start;
        self.frame_start = 0;
        if let Some(view) = self
            .view
            .as_mut()
            .filter(|view| view.source == Source::Receive)
        {
            view.position -= shift;
        }
        if let Some((Source::Receive, cursor)) = self.packed.as_mut() {
            cursor.shift(shift);
        }
        debug!(shift, state = %self.state, capacity = recv.capacity(), "rebased after compaction");
        match self.state {
            ReadState::Complete | ReadState::EndOfStream => Ok(()),
            _ => self.update_state(recv),
        }
    }

    /// Bytes of the message ready for the application.
    ///
    /// The slice borrows either `recv` or a buffer owned by the machine and
    /// is valid until the next advance.
    #[must_use]
    pub fn current_message<'a>(&'a self, recv: &'a ReceiveBuffer) -> Option<&'a [u8]> {
        if self.state != ReadState::Complete {
            return None;
        }
        let view = self.view?;
        self.source_bytes(recv, view.source)
            .get(view.position..view.position + view.length)
    }

    /// Whether the complete frame is a ping.
    #[must_use]
    pub fn is_ping(&self) -> bool { self.state == ReadState::Complete && self.ping }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> ReadState { self.state }

    /// How the current frame is delivered.
    #[must_use]
    pub fn sub_state(&self) -> ReadSubState { self.sub_state }

    /// Bytes at the front of the receive buffer that may be compacted away.
    #[must_use]
    pub fn consumed(&self) -> usize { self.frame_start }

    /// Capacity the receive buffer needs once compacted to make progress.
    #[must_use]
    pub fn required_capacity(&self) -> usize {
        self.header
            .map_or(self.protocol.header_len(), FrameHeader::length)
    }

    /// Protocol variant in use.
    #[must_use]
    pub fn protocol(&self) -> &P { &self.protocol }

    /// Reassemblies in progress.
    #[must_use]
    pub fn fragments_in_progress(&self) -> usize { self.reassembler.in_flight() }

    /// Continuation fragments dropped for an unknown identifier.
    #[must_use]
    pub fn unknown_fragment_count(&self) -> u64 { self.reassembler.unknown_dropped() }

    /// Unfinished reassemblies replaced by a new first fragment.
    #[must_use]
    pub fn replaced_fragment_count(&self) -> u64 { self.reassembler.replaced() }

    /// CompFragment first halves abandoned because the next frame was not
    /// their second half.
    #[must_use]
    pub fn abandoned_comp_fragment_count(&self) -> u64 { self.abandoned_comp_fragments }

    fn update_state(&mut self, recv: &ReceiveBuffer) -> Result<(), ReadError> {
        loop {
            let header = match self.header {
                Some(header) => header,
                None => match self.update_state_length_unknown(recv)? {
                    Some(header) => header,
                    None => return Ok(()),
                },
            };
            let end = self.frame_start + header.length();
            if end > recv.filled() {
                self.state = if end <= recv.capacity() {
                    ReadState::LengthKnownIncomplete
                } else {
                    ReadState::LengthKnownInsufficient
                };
                return Ok(());
            }

            self.state = ReadState::Complete;
            metrics::inc_frames(Direction::Inbound);
            match self.dispatch(recv, header, end) {
                Ok(Dispatch::Exposed) => return Ok(()),
                Ok(Dispatch::Consumed) => self.finish_frame(),
                Err(err) => {
                    self.view = None;
                    self.packed = None;
                    self.ping = false;
                    return Err(err);
                }
            }
        }
    }

    fn update_state_length_unknown(
        &mut self,
        recv: &ReceiveBuffer,
    ) -> Result<Option<FrameHeader>, ReadError> {
        if self.frame_start >= recv.filled() {
            self.state = ReadState::NoData;
            return Ok(None);
        }
        let Some(header) = self.protocol.frame_header(recv.as_filled(), self.frame_start) else {
            self.state = if self.frame_start + self.protocol.header_len() <= recv.capacity() {
                ReadState::LengthUnknownIncomplete
            } else {
                ReadState::LengthUnknownInsufficient
            };
            return Ok(None);
        };
        let header = header.validate()?;
        self.header = Some(header);
        Ok(Some(header))
    }

    fn finish_frame(&mut self) {
        if let Some(header) = self.header.take() {
            self.frame_start += header.length();
        }
        self.view = None;
        self.packed = None;
        self.ping = false;
        self.sub_state = ReadSubState::Normal;
    }

    fn dispatch(
        &mut self,
        recv: &ReceiveBuffer,
        header: FrameHeader,
        end: usize,
    ) -> Result<Dispatch, ReadError> {
        let flags = header.flags();
        let body_start = self.frame_start + self.protocol.header_len();
        let frame = recv.as_filled().get(self.frame_start..end).unwrap_or_default();
        let body = recv.as_filled().get(body_start..end).unwrap_or_default();
        trace!(
            start = self.frame_start,
            length = header.length(),
            flags = ?flags,
            "dispatching frame"
        );

        if header.is_ping() {
            self.ping = true;
            self.sub_state = ReadSubState::Normal;
            return Ok(Dispatch::Exposed);
        }
        if let Some(pending) = self.pending.take() {
            if is_comp_fragment_tail(flags) {
                return self.complete_comp_fragment(recv, pending, body);
            }
            self.abandoned_comp_fragments += 1;
            warn!(
                fragment_id = ?pending.fragment_id,
                buffered = pending.buffer.len(),
                flags = ?flags,
                "abandoned unfinished CompFragment sequence"
            );
        }
        if flags.is_packed() {
            if !flags.is_compressed() {
                let Some(cursor) = PackedCursor::scan(recv.as_filled(), body_start, end)? else {
                    return Ok(Dispatch::Consumed);
                };
                return Ok(self.start_packed(recv, Source::Receive, cursor, ReadSubState::Packed));
            }
            if flags.is_comp_fragment() {
                self.hold_comp_fragment(body, None, true);
                return Ok(Dispatch::Consumed);
            }
            let length = self.decompress(body)?;
            return self.dispatch_packed_decompressed(recv, length);
        }
        if flags.has_optional_flags() {
            return self.dispatch_fragment(frame, flags);
        }
        if flags.is_compressed() {
            if flags.is_comp_fragment() {
                self.hold_comp_fragment(body, None, false);
                return Ok(Dispatch::Consumed);
            }
            let length = self.decompress(body)?;
            return Ok(self.expose(Source::Decompressed, 0, length, ReadSubState::Normal));
        }
        Ok(self.expose(
            Source::Receive,
            body_start,
            end - body_start,
            ReadSubState::Normal,
        ))
    }

    fn dispatch_fragment(&mut self, frame: &[u8], flags: RipcFlags) -> Result<Dispatch, ReadError> {
        let fragment = self.protocol.fragment_header(frame)?;
        let offset =
            self.protocol.header_len() + fragment.encoded_len(self.protocol.fragment_id_width());
        let payload = frame.get(offset..).unwrap_or_default();
        let id = fragment.id();

        if !flags.is_compressed() {
            self.sub_state = ReadSubState::Fragmented;
            let status = Self::feed(&mut self.reassembler, fragment, payload)?;
            return Ok(self.fragment_status(id, status));
        }
        self.sub_state = ReadSubState::FragmentedCompressed;
        if flags.is_comp_fragment() {
            if let FragmentHeader::First { total_len, .. } = fragment {
                self.reassembler.start(id, announced_len(total_len), &[])?;
            }
            self.hold_comp_fragment(payload, Some(id), false);
            return Ok(Dispatch::Consumed);
        }
        self.decompress(payload)?;
        let status = Self::feed(&mut self.reassembler, fragment, &self.decompressed)?;
        Ok(self.fragment_status(id, status))
    }

    fn dispatch_packed_decompressed(
        &mut self,
        recv: &ReceiveBuffer,
        length: usize,
    ) -> Result<Dispatch, ReadError> {
        let Some(cursor) = PackedCursor::scan(&self.decompressed, 0, length)? else {
            return Ok(Dispatch::Consumed);
        };
        Ok(self.start_packed(
            recv,
            Source::Decompressed,
            cursor,
            ReadSubState::PackedCompressed,
        ))
    }

    fn complete_comp_fragment(
        &mut self,
        recv: &ReceiveBuffer,
        pending: PendingCompFragment,
        tail: &[u8],
    ) -> Result<Dispatch, ReadError> {
        let PendingCompFragment {
            mut buffer,
            fragment_id,
            packed,
        } = pending;
        buffer.extend_from_slice(tail);
        let length = self.decompress(&buffer)?;
        trace!(
            fragment_id = ?fragment_id,
            packed,
            compressed = buffer.len(),
            length,
            "completed CompFragment pair"
        );
        if let Some(id) = fragment_id {
            self.sub_state = ReadSubState::FragmentedCompressed;
            let status = self.reassembler.append(id, &self.decompressed)?;
            return Ok(self.fragment_status(id, status));
        }
        if packed {
            return self.dispatch_packed_decompressed(recv, length);
        }
        Ok(self.expose(Source::Decompressed, 0, length, ReadSubState::Normal))
    }

    fn hold_comp_fragment(&mut self, bytes: &[u8], fragment_id: Option<FragmentId>, packed: bool) {
        self.pending = Some(PendingCompFragment {
            buffer: bytes.to_vec(),
            fragment_id,
            packed,
        });
    }

    fn feed(
        reassembler: &mut Reassembler,
        fragment: FragmentHeader,
        data: &[u8],
    ) -> Result<FragmentStatus, ReassemblyError> {
        match fragment {
            FragmentHeader::First { total_len, id } => {
                reassembler.start(id, announced_len(total_len), data)
            }
            FragmentHeader::Continuation { id } => reassembler.append(id, data),
        }
    }

    fn fragment_status(&mut self, id: FragmentId, status: FragmentStatus) -> Dispatch {
        match (status, self.reassembler.progress(id)) {
            (FragmentStatus::Complete, Some((length, _))) => self.expose(
                Source::Fragment(id),
                0,
                length,
                ReadSubState::FragmentCompleteReassembled,
            ),
            _ => Dispatch::Consumed,
        }
    }

    fn start_packed(
        &mut self,
        recv: &ReceiveBuffer,
        source: Source,
        cursor: PackedCursor,
        sub_state: ReadSubState,
    ) -> Dispatch {
        self.packed = Some((source, cursor));
        match self.next_packed(recv) {
            Some(view) => self.expose(view.source, view.position, view.length, sub_state),
            None => Dispatch::Consumed,
        }
    }

    fn next_packed(&mut self, recv: &ReceiveBuffer) -> Option<DataView> {
        let (source, mut cursor) = self.packed?;
        let next = cursor.advance(self.source_bytes(recv, source));
        self.packed = Some((source, cursor));
        let (position, length) = next?;
        Some(DataView {
            source,
            position,
            length,
        })
    }

    fn expose(
        &mut self,
        source: Source,
        position: usize,
        length: usize,
        sub_state: ReadSubState,
    ) -> Dispatch {
        self.view = Some(DataView {
            source,
            position,
            length,
        });
        self.sub_state = sub_state;
        metrics::inc_messages();
        Dispatch::Exposed
    }

    fn decompress(&mut self, src: &[u8]) -> Result<usize, ReadError> {
        let Some(compressor) = self.compressor.as_mut() else {
            return Err(ReadError::CompressionDisabled);
        };
        compressor
            .decompress(src, &mut self.decompressed)
            .map_err(|err| {
                metrics::inc_decompression_failures();
                warn!(error = %err, len = src.len(), "failed to decompress frame payload");
                ReadError::from(err)
            })
    }

    fn source_bytes<'a>(&'a self, recv: &'a ReceiveBuffer, source: Source) -> &'a [u8] {
        match source {
            Source::Receive => recv.as_filled(),
            Source::Decompressed => &self.decompressed,
            Source::Fragment(id) => self.reassembler.completed(id).unwrap_or_default(),
        }
    }
}
