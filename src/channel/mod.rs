//! Async channel tying the read and write paths to a byte stream.
//!
//! A [`Channel`] owns the receive buffer, the read state machine, the frame
//! writer and the channel's output buffers. [`Channel::read`] pulls bytes
//! from the stream until a message or ping is ready, compacting or growing
//! the receive buffer when a frame does not fit. Writes are framed into
//! pooled buffers and queued; [`Channel::flush`] sends them and returns
//! the buffers to their pools.

use std::collections::VecDeque;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, trace};

use crate::{
    buffer::ReceiveBuffer,
    config::ChannelConfig,
    error::{ChannelError, Result},
    pool::{ChannelBufferPool, Pool, Pooled},
    protocol::{ProtocolFunctions, RipcFunctions},
    read::{ReadBufferStateMachine, ReadOutcome, ReadState},
    write::{FrameWriter, PackedFrame},
};

/// Item returned by [`Channel::read`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadEvent<'a> {
    /// An application message, valid until the next read.
    Message(&'a [u8]),
    /// The peer sent a ping.
    Ping,
}

/// Read-side counters of one channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReadStats {
    /// Messages delivered.
    pub messages: u64,
    /// Pings received.
    pub pings: u64,
    /// Bytes received from the stream.
    pub bytes: u64,
}

/// RIPC channel over a byte stream `S` using protocol variant `P`.
pub struct Channel<S, P: ProtocolFunctions = RipcFunctions> {
    stream: S,
    config: ChannelConfig,
    recv: ReceiveBuffer,
    reader: ReadBufferStateMachine<P>,
    writer: FrameWriter<P>,
    buffers: ChannelBufferPool,
    queued: VecDeque<Pooled<BytesMut>>,
    delivered: bool,
    stats: ReadStats,
}

impl<S, P: ProtocolFunctions> Channel<S, P> {
    /// Wrap `stream`, drawing output buffers beyond the guaranteed ones
    /// from `shared`.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Config`] when `config` fails validation and
    /// [`ChannelError::UnsupportedVersion`] when `P` does not speak the
    /// configured version.
    pub fn new(stream: S, config: ChannelConfig, shared: Pool<BytesMut>) -> Result<Self> {
        let config = config.validate()?;
        let protocol = P::for_version(config.version()).ok_or(ChannelError::UnsupportedVersion {
            version: config.version(),
        })?;

        let mut reader =
            ReadBufferStateMachine::new(protocol).with_max_message_size(config.max_message_size());
        let mut writer = FrameWriter::new(protocol, config.max_frame_len());
        let level = config.compression_level();
        reader.set_compressor(config.compression().compressor(level));
        if let Some(compressor) = config.compression().compressor(level) {
            writer = writer.with_compressor(compressor, config.compression_threshold());
        }
        debug!(
            version = %config.version(),
            max_frame_len = config.max_frame_len(),
            compression = %config.compression(),
            "channel created"
        );

        Ok(Self {
            stream,
            recv: ReceiveBuffer::with_capacity(config.receive_buffer_size()),
            reader,
            writer,
            buffers: ChannelBufferPool::new(
                shared,
                config.guaranteed_output_buffers(),
                config.max_frame_len(),
            ),
            queued: VecDeque::new(),
            delivered: false,
            stats: ReadStats::default(),
            config,
        })
    }

    /// Wrap `stream` with a private shared pool holding the buffers above
    /// the guaranteed count.
    ///
    /// # Errors
    ///
    /// As for [`new`](Self::new).
    pub fn standalone(stream: S, config: ChannelConfig) -> Result<Self> {
        let extra = config
            .max_output_buffers()
            .saturating_sub(config.guaranteed_output_buffers());
        let shared = Pool::buffers(extra, config.max_frame_len());
        Self::new(stream, config, shared)
    }

    /// Frame `payload` into a pooled buffer and queue it.
    ///
    /// Returns the number of frames queued.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::NoBuffers`] when every buffer is in flight
    /// and [`ChannelError::Write`] when the payload cannot be framed.
    pub fn write(&mut self, payload: &[u8]) -> Result<usize> {
        let mut buffer = self.acquire()?;
        let frames = self.writer.write_message(payload, &mut buffer)?;
        self.queued.push_back(buffer);
        Ok(frames)
    }

    /// Start a packed frame sized for this channel.
    #[must_use]
    pub fn packed_frame(&self) -> PackedFrame { self.writer.packed_frame() }

    /// Queue a finished packed frame.
    ///
    /// # Errors
    ///
    /// As for [`write`](Self::write).
    pub fn write_packed(&mut self, frame: &PackedFrame) -> Result<usize> {
        let mut buffer = self.acquire()?;
        let frames = self.writer.write_packed(frame, &mut buffer)?;
        self.queued.push_back(buffer);
        Ok(frames)
    }

    /// Queue a ping.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::NoBuffers`] when every buffer is in flight.
    pub fn ping(&mut self) -> Result<()> {
        let mut buffer = self.acquire()?;
        self.writer.write_ping(&mut buffer);
        self.queued.push_back(buffer);
        Ok(())
    }

    /// Resize the guaranteed output pool, returning the resulting size.
    pub fn set_guaranteed_buffers(&mut self, count: usize) -> usize {
        self.buffers.set_guaranteed_buffers(count)
    }

    /// Buffers queued and not yet flushed.
    #[must_use]
    pub fn queued_buffers(&self) -> usize { self.queued.len() }

    /// Read-side counters.
    #[must_use]
    pub fn stats(&self) -> ReadStats { self.stats }

    /// Validated configuration.
    #[must_use]
    pub fn config(&self) -> &ChannelConfig { &self.config }

    /// Read state machine, for inspection.
    #[must_use]
    pub fn reader(&self) -> &ReadBufferStateMachine<P> { &self.reader }

    /// Output buffers of this channel.
    #[must_use]
    pub fn buffers(&self) -> &ChannelBufferPool { &self.buffers }

    /// Current receive buffer capacity.
    #[must_use]
    pub fn receive_capacity(&self) -> usize { self.recv.capacity() }

    /// Borrow the underlying stream.
    #[must_use]
    pub fn get_ref(&self) -> &S { &self.stream }

    /// Release the stream, dropping unread data and queued writes.
    #[must_use]
    pub fn into_inner(self) -> S { self.stream }

    fn acquire(&self) -> Result<Pooled<BytesMut>> {
        self.buffers.acquire().ok_or(ChannelError::NoBuffers)
    }

    fn make_room(&mut self) -> Result<()> {
        self.recv.compact(self.reader.consumed());
        let required = self.reader.required_capacity();
        self.recv.grow(required);
        self.reader.advance_on_compact(&self.recv)?;
        Ok(())
    }
}

impl<S: AsyncRead + Unpin, P: ProtocolFunctions> Channel<S, P> {
    /// Wait for the next message or ping.
    ///
    /// The returned message borrows the channel and is released by the next
    /// call. A frame that failed to decode is reported once and skipped by
    /// the following call.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::EndOfStream`] once the peer has closed,
    /// [`ChannelError::Io`] on transport failure and [`ChannelError::Read`]
    /// for frames that cannot be decoded.
    pub async fn read(&mut self) -> Result<ReadEvent<'_>> {
        if std::mem::take(&mut self.delivered) {
            self.reader.advance_on_application_read(&self.recv)?;
        }
        loop {
            match self.reader.state() {
                ReadState::Complete => {
                    if self.reader.is_ping() || self.reader.current_message(&self.recv).is_some() {
                        break;
                    }
                    self.reader.advance_on_application_read(&self.recv)?;
                }
                ReadState::EndOfStream => return Err(ChannelError::EndOfStream),
                state if state.is_insufficient() => self.make_room()?,
                _ => self.fill().await?,
            }
        }

        self.delivered = true;
        if self.reader.is_ping() {
            self.stats.pings += 1;
            return Ok(ReadEvent::Ping);
        }
        self.stats.messages += 1;
        Ok(ReadEvent::Message(
            self.reader.current_message(&self.recv).unwrap_or_default(),
        ))
    }

    async fn fill(&mut self) -> Result<()> {
        if self.recv.remaining() == 0 {
            self.make_room()?;
        }
        let count = self.stream.read(self.recv.unfilled_mut()).await?;
        let outcome = if count == 0 {
            ReadOutcome::Closed
        } else {
            self.recv.commit(count);
            self.stats.bytes += count as u64;
            ReadOutcome::Data(count)
        };
        trace!(count, "received bytes");
        self.reader.advance_on_socket_read(&self.recv, outcome)?;
        Ok(())
    }
}

impl<S: AsyncWrite + Unpin, P: ProtocolFunctions> Channel<S, P> {
    /// Send every queued buffer, returning each to its pool once written.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Io`] if the stream fails; unsent buffers stay
    /// queued.
    pub async fn flush(&mut self) -> Result<()> {
        let mut sent = 0;
        while let Some(buffer) = self.queued.front() {
            self.stream.write_all(buffer).await?;
            sent += buffer.len();
            self.queued.pop_front();
        }
        self.stream.flush().await?;
        trace!(sent, "flushed output buffers");
        Ok(())
    }

    /// Flush queued writes and shut the stream down.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Io`] if flushing or shutdown fails.
    pub async fn close(mut self) -> Result<()> {
        self.flush().await?;
        self.stream.shutdown().await?;
        debug!(
            messages = self.stats.messages,
            in_flight = self.reader.fragments_in_progress(),
            "channel closed"
        );
        Ok(())
    }
}
