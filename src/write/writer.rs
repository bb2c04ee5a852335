//! Turning outbound messages into RIPC frames.

use bytes::{BufMut, BytesMut};
use tracing::trace;

use super::{PackedFrame, WriteError};
use crate::{
    compression::Compressor,
    fragment::{FragmentIdWidth, Fragmenter},
    metrics::{self, Direction},
    protocol::{FragmentHeader, FrameHeader, FramingError, ProtocolFunctions, RipcFlags},
};

/// Append one frame made of `flags`, an optional fragment header and `data`.
fn put_frame(
    out: &mut BytesMut,
    max_frame: usize,
    header_len: usize,
    flags: RipcFlags,
    fragment: Option<(FragmentHeader, FragmentIdWidth)>,
    data: &[u8],
) -> Result<(), WriteError> {
    let optional = fragment.map_or(0, |(header, width)| header.encoded_len(width));
    let size = header_len + optional + data.len();
    let length = u16::try_from(size)
        .ok()
        .filter(|_| size <= max_frame)
        .ok_or(FramingError::FrameTooLarge {
            size,
            max: max_frame,
        })?;
    out.reserve(size);
    let flags = if fragment.is_some() {
        flags | RipcFlags::HAS_OPTIONAL_FLAGS
    } else {
        flags
    };
    FrameHeader::new(length, flags).encode(out);
    if let Some((header, width)) = fragment {
        header.encode(width, out);
    }
    out.put_slice(data);
    metrics::inc_frames(Direction::Outbound);
    Ok(())
}

/// Write `compressed` as a CompFragment pair: the first `room` bytes in a
/// frame flagged `first_flags | COMP_FRAGMENT`, the rest in a plain
/// compressed frame.
fn put_comp_fragment_pair(
    out: &mut BytesMut,
    max_frame: usize,
    header_len: usize,
    first_flags: RipcFlags,
    fragment: Option<(FragmentHeader, FragmentIdWidth)>,
    room: usize,
    compressed: &[u8],
) -> Result<usize, WriteError> {
    let (head, tail) = compressed.split_at(room.min(compressed.len()));
    put_frame(
        out,
        max_frame,
        header_len,
        first_flags | RipcFlags::COMPRESSION | RipcFlags::COMP_FRAGMENT,
        fragment,
        head,
    )?;
    put_frame(
        out,
        max_frame,
        header_len,
        RipcFlags::DATA | RipcFlags::COMPRESSION,
        None,
        tail,
    )?;
    Ok(2)
}

/// Frame builder for one channel direction.
///
/// Holds the negotiated frame size, the fragment identifier allocator and
/// the optional compressor. Every `write_*` call appends complete frames to
/// the output buffer and returns how many it wrote.
///
/// # Examples
///
/// ```
/// use bytes::BytesMut;
/// use ripcframe::{protocol::RipcFunctions, write::FrameWriter};
///
/// let mut writer = FrameWriter::new(RipcFunctions::default(), 6144);
/// let mut out = BytesMut::new();
/// writer.write_message(b"HELLO WORLD", &mut out).expect("fits one frame");
/// assert_eq!(&out[..3], &[0x00, 0x0e, 0x02]);
/// assert_eq!(&out[3..], b"HELLO WORLD");
/// ```
#[derive(Debug)]
pub struct FrameWriter<P: ProtocolFunctions> {
    protocol: P,
    max_frame: usize,
    fragmenter: Fragmenter,
    compressor: Option<Box<dyn Compressor>>,
    threshold: usize,
}

impl<P: ProtocolFunctions> FrameWriter<P> {
    /// Create a writer producing frames of at most `max_frame` bytes.
    #[must_use]
    pub fn new(protocol: P, max_frame: usize) -> Self {
        Self {
            fragmenter: Fragmenter::new(protocol.fragment_id_width()),
            protocol,
            max_frame,
            compressor: None,
            threshold: 0,
        }
    }

    /// Compress messages of at least `threshold` bytes with `compressor`.
    #[must_use]
    pub fn with_compressor(mut self, compressor: Box<dyn Compressor>, threshold: usize) -> Self {
        self.compressor = Some(compressor);
        self.threshold = threshold;
        self
    }

    /// Largest frame written.
    #[must_use]
    pub fn max_frame(&self) -> usize { self.max_frame }

    /// Largest packed body that fits one frame.
    #[must_use]
    pub fn max_packed_body(&self) -> usize { self.max_frame.saturating_sub(self.protocol.header_len()) }

    /// Start a packed frame sized for this writer.
    #[must_use]
    pub fn packed_frame(&self) -> PackedFrame { PackedFrame::new(self.max_packed_body()) }

    /// Append a ping frame.
    pub fn write_ping(&mut self, out: &mut BytesMut) {
        FrameHeader::ping().encode(out);
        metrics::inc_frames(Direction::Outbound);
    }

    /// Append the frames carrying `payload`.
    ///
    /// Small payloads become one data frame. With compression on, payloads
    /// at or above the threshold are always compressed; compressed bytes
    /// that overflow one frame become a CompFragment pair when the plain
    /// payload would have fitted. Anything larger is fragmented.
    ///
    /// # Errors
    ///
    /// Returns [`WriteError::EmptyMessage`] for an empty payload and any
    /// compression, fragmentation or framing failure. Frames appended
    /// before a failure stay in `out`.
    pub fn write_message(&mut self, payload: &[u8], out: &mut BytesMut) -> Result<usize, WriteError> {
        if payload.is_empty() {
            return Err(WriteError::EmptyMessage);
        }
        let header_len = self.protocol.header_len();
        let room = self.max_frame.saturating_sub(header_len);
        let compress = payload.len() >= self.threshold;

        if payload.len() > room {
            let compressing = compress && self.compressor.is_some();
            return self.write_fragments(payload, out, compressing);
        }
        if let Some(compressor) = self.compressor.as_mut().filter(|_| compress) {
            let compressed = compressor.compress(payload)?;
            trace!(
                plain = payload.len(),
                compressed = compressed.len(),
                "compressed message"
            );
            if compressed.len() > room {
                return put_comp_fragment_pair(
                    out,
                    self.max_frame,
                    header_len,
                    RipcFlags::DATA,
                    None,
                    room,
                    compressed,
                );
            }
            put_frame(
                out,
                self.max_frame,
                header_len,
                RipcFlags::DATA | RipcFlags::COMPRESSION,
                None,
                compressed,
            )?;
            return Ok(1);
        }
        put_frame(out, self.max_frame, header_len, RipcFlags::DATA, None, payload)?;
        Ok(1)
    }

    /// Append the frame carrying a finished packed body.
    ///
    /// # Errors
    ///
    /// Returns [`WriteError::MessageOpen`] while a sub-message is open,
    /// [`WriteError::EmptyMessage`] for a frame with no sub-message, and any
    /// compression or framing failure.
    pub fn write_packed(&mut self, frame: &PackedFrame, out: &mut BytesMut) -> Result<usize, WriteError> {
        if frame.is_open() {
            return Err(WriteError::MessageOpen);
        }
        if frame.is_empty() {
            return Err(WriteError::EmptyMessage);
        }
        let header_len = self.protocol.header_len();
        let room = self.max_packed_body();
        let flags = RipcFlags::DATA | RipcFlags::PACKING;
        let body = frame.body();

        match self.compressor.as_mut() {
            Some(compressor) if body.len() >= self.threshold => {
                let compressed = compressor.compress(body)?;
                if compressed.len() <= room {
                    put_frame(
                        out,
                        self.max_frame,
                        header_len,
                        flags | RipcFlags::COMPRESSION,
                        None,
                        compressed,
                    )?;
                    return Ok(1);
                }
                put_comp_fragment_pair(out, self.max_frame, header_len, flags, None, room, compressed)
            }
            _ => {
                put_frame(out, self.max_frame, header_len, flags, None, body)?;
                Ok(1)
            }
        }
    }

    fn write_fragments(
        &mut self,
        payload: &[u8],
        out: &mut BytesMut,
        compress: bool,
    ) -> Result<usize, WriteError> {
        let Self {
            protocol,
            max_frame,
            fragmenter,
            compressor: engine,
            ..
        } = self;
        let max_frame = *max_frame;
        let header_len = protocol.header_len();
        let width = protocol.fragment_id_width();
        let first_room = max_frame.saturating_sub(protocol.first_fragment_header_len());
        let continuation_room = max_frame.saturating_sub(protocol.continuation_header_len());
        let chunks = fragmenter.split(payload, first_room, continuation_room)?;
        trace!(
            fragment_id = %chunks.id(),
            len = payload.len(),
            compress,
            "fragmenting message"
        );

        let mut frames = 0;
        for (header, chunk) in chunks {
            let room = max_frame.saturating_sub(header_len + header.encoded_len(width));
            let fragment = Some((header, width));
            match engine.as_mut().filter(|_| compress) {
                Some(compressor) => {
                    let compressed = compressor.compress(chunk)?;
                    if compressed.len() <= room {
                        put_frame(
                            out,
                            max_frame,
                            header_len,
                            RipcFlags::DATA | RipcFlags::COMPRESSION,
                            fragment,
                            compressed,
                        )?;
                        frames += 1;
                    } else {
                        frames += put_comp_fragment_pair(
                            out,
                            max_frame,
                            header_len,
                            RipcFlags::DATA,
                            fragment,
                            room,
                            compressed,
                        )?;
                    }
                }
                None => {
                    put_frame(out, max_frame, header_len, RipcFlags::DATA, fragment, chunk)?;
                    frames += 1;
                }
            }
        }
        Ok(frames)
    }
}
