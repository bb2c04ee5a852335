//! Write buffers available to one channel.

use bytes::BytesMut;
use tracing::debug;

use super::{Locker, MutexLocker, Pool, Pooled};
use crate::metrics;

/// Guaranteed buffers reserved for one channel, backed by a shared pool.
///
/// [`acquire`](Self::acquire) draws from the guaranteed pool first and
/// borrows from the shared pool only once the channel's own buffers are all
/// in flight. Buffers always return to the pool they were taken from.
#[derive(Debug)]
pub struct ChannelBufferPool<L: Locker = MutexLocker> {
    guaranteed: Pool<BytesMut, L>,
    shared: Pool<BytesMut, L>,
    buffer_size: usize,
}

impl<L: Locker> ChannelBufferPool<L> {
    /// Reserve `guaranteed` preallocated buffers of `buffer_size` bytes and
    /// fall back to `shared` when they run out.
    #[must_use]
    pub fn new(shared: Pool<BytesMut, L>, guaranteed: usize, buffer_size: usize) -> Self {
        Self {
            guaranteed: Pool::preallocated(guaranteed, move || {
                BytesMut::with_capacity(buffer_size)
            }),
            shared,
            buffer_size,
        }
    }

    /// Take a buffer, or `None` when both pools are exhausted.
    #[must_use]
    pub fn acquire(&self) -> Option<Pooled<BytesMut, L>> {
        let buffer = self.guaranteed.acquire().or_else(|| self.shared.acquire());
        if buffer.is_none() {
            metrics::inc_pool_exhausted();
        }
        buffer
    }

    /// Resize the guaranteed pool to `count` buffers by trading capacity
    /// with the shared pool.
    ///
    /// Growing takes capacity from the shared pool and is limited by what
    /// it can spare. Shrinking hands free guaranteed buffers back; buffers
    /// still in flight are not reclaimed. Returns the resulting guaranteed
    /// limit.
    pub fn set_guaranteed_buffers(&self, count: usize) -> usize {
        let current = self.guaranteed.limit();
        if count > current {
            Pool::transfer(&self.shared, &self.guaranteed, count - current);
        } else if count < current {
            Pool::transfer(&self.guaranteed, &self.shared, current - count);
        }
        let resized = self.guaranteed.limit();
        debug!(
            requested = count,
            previous = current,
            resized,
            "resized guaranteed output buffers"
        );
        resized
    }

    /// Buffers reserved for this channel.
    #[must_use]
    pub fn guaranteed(&self) -> &Pool<BytesMut, L> { &self.guaranteed }

    /// Pool shared with other channels.
    #[must_use]
    pub fn shared(&self) -> &Pool<BytesMut, L> { &self.shared }

    /// Capacity each guaranteed buffer is allocated with.
    #[must_use]
    pub fn buffer_size(&self) -> usize { self.buffer_size }
}
