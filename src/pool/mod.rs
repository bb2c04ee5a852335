//! Pooled buffers with explicit ownership and pluggable locking.
//!
//! A [`Pool`] owns a FIFO free list of nodes. [`Pool::acquire`] hands out a
//! [`Pooled`] handle that remembers its owning pool through a weak
//! reference; dropping the handle recycles the node and parks it at the tail
//! of that pool. If the pool has already been dropped the node is simply
//! freed. Because the handle is moved into the pool on release, a node can
//! never be parked twice or sit in two pools at once.
//!
//! Pools never block. Exhaustion is reported as `None` and the caller
//! decides whether to flush pending writes and retry.

mod channel_buffers;
mod locker;
mod queue;

use std::{
    fmt,
    ops::{Deref, DerefMut},
    sync::{Arc, Weak},
};

use bytes::BytesMut;
pub use channel_buffers::ChannelBufferPool;
pub use locker::{Locker, MutexLocker, NoLocker};
use queue::FreeQueue;

/// Reset hook run before a node is parked again.
///
/// `Default` supplies the cheap placeholder left in a handle while its node
/// travels back to the pool.
pub trait Recycle: Default {
    /// Clear any state left by the previous user.
    fn recycle(&mut self);
}

impl Recycle for BytesMut {
    fn recycle(&mut self) { self.clear(); }
}

impl Recycle for Vec<u8> {
    fn recycle(&mut self) { self.clear(); }
}

type Factory<T> = Box<dyn Fn() -> T + Send + Sync>;

struct PoolShared<T, L: Locker> {
    queue: L::Cell<FreeQueue<T>>,
    factory: Factory<T>,
}

impl<T, L: Locker> PoolShared<T, L> {
    fn with<R>(&self, f: impl FnOnce(&mut FreeQueue<T>) -> R) -> R { L::with(&self.queue, f) }
}

/// Free-list pool of reusable nodes.
///
/// Cloning a `Pool` clones the handle; all clones share one free list.
///
/// # Examples
///
/// ```
/// use ripcframe::pool::{MutexLocker, Pool};
///
/// let pool: Pool<Vec<u8>, MutexLocker> = Pool::new(2, Vec::new);
/// let first = pool.acquire().expect("pool grows on demand");
/// let _second = pool.acquire().expect("still below the limit");
/// assert!(pool.acquire().is_none());
/// drop(first);
/// assert_eq!(pool.free_len(), 1);
/// ```
pub struct Pool<T: Recycle, L: Locker = MutexLocker> {
    shared: Arc<PoolShared<T, L>>,
}

impl<T: Recycle, L: Locker> Pool<T, L> {
    /// Create an empty pool that allocates up to `limit` nodes on demand.
    pub fn new(limit: usize, factory: impl Fn() -> T + Send + Sync + 'static) -> Self {
        Self {
            shared: Arc::new(PoolShared {
                queue: L::new_cell(FreeQueue::new(limit)),
                factory: Box::new(factory),
            }),
        }
    }

    /// Create a pool with all `limit` nodes allocated up front.
    pub fn preallocated(limit: usize, factory: impl Fn() -> T + Send + Sync + 'static) -> Self {
        let pool = Self::new(limit, factory);
        pool.shared.with(|queue| {
            for _ in 0..limit {
                queue.push((pool.shared.factory)());
            }
        });
        pool
    }

    /// Take the head node, allocating one if the free list is empty and the
    /// pool is below its limit.
    ///
    /// Returns `None` when the pool is exhausted.
    #[must_use]
    pub fn acquire(&self) -> Option<Pooled<T, L>> {
        let parked = self.shared.with(|queue| match queue.pop() {
            Some(node) => Some(Some(node)),
            None => queue.reserve_new().then_some(None),
        })?;
        let node = parked.unwrap_or_else(|| (self.shared.factory)());
        Some(Pooled {
            node,
            home: Arc::downgrade(&self.shared),
        })
    }

    /// Move up to `count` units of capacity from `from` to `to`.
    ///
    /// Free nodes travel first; unallocated headroom covers the rest. Nodes
    /// already checked out stay with their original pool. Returns the number
    /// of units moved.
    pub fn transfer(from: &Self, to: &Self, count: usize) -> usize {
        if Arc::ptr_eq(&from.shared, &to.shared) {
            return 0;
        }
        let (moved, nodes) = from.shared.with(|queue| queue.surrender(count));
        to.shared.with(|queue| queue.absorb(moved, nodes));
        moved
    }

    /// Nodes parked in the free list.
    #[must_use]
    pub fn free_len(&self) -> usize { self.shared.with(|queue| queue.free_len()) }

    /// Nodes currently checked out.
    #[must_use]
    pub fn outstanding(&self) -> usize { self.shared.with(|queue| queue.outstanding()) }

    /// Nodes owned by the pool, parked or checked out.
    #[must_use]
    pub fn size(&self) -> usize { self.shared.with(|queue| queue.owned()) }

    /// Most nodes the pool may own.
    #[must_use]
    pub fn limit(&self) -> usize { self.shared.with(|queue| queue.limit()) }

    /// Whether `node` was acquired from this pool.
    #[must_use]
    pub fn owns(&self, node: &Pooled<T, L>) -> bool {
        std::ptr::eq(node.home.as_ptr(), Arc::as_ptr(&self.shared))
    }
}

impl Pool<BytesMut, MutexLocker> {
    /// Thread-safe pool of write buffers of `buffer_size` bytes.
    #[must_use]
    pub fn buffers(limit: usize, buffer_size: usize) -> Self {
        Self::new(limit, move || BytesMut::with_capacity(buffer_size))
    }
}

impl<T: Recycle, L: Locker> Clone for Pool<T, L> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Recycle, L: Locker> fmt::Debug for Pool<T, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.shared.with(|queue| {
            f.debug_struct("Pool")
                .field("free", &queue.free_len())
                .field("outstanding", &queue.outstanding())
                .field("limit", &queue.limit())
                .finish()
        })
    }
}

/// Node checked out of a [`Pool`].
///
/// Dereferences to the node. Dropping the handle returns the node to the
/// pool it came from.
pub struct Pooled<T: Recycle, L: Locker = MutexLocker> {
    node: T,
    home: Weak<PoolShared<T, L>>,
}

impl<T: Recycle, L: Locker> Pooled<T, L> {
    /// Return the node to its pool now.
    pub fn release(self) { drop(self); }
}

impl<T: Recycle, L: Locker> Deref for Pooled<T, L> {
    type Target = T;

    fn deref(&self) -> &T { &self.node }
}

impl<T: Recycle, L: Locker> DerefMut for Pooled<T, L> {
    fn deref_mut(&mut self) -> &mut T { &mut self.node }
}

impl<T: Recycle, L: Locker> Drop for Pooled<T, L> {
    fn drop(&mut self) {
        if let Some(pool) = self.home.upgrade() {
            let mut node = std::mem::take(&mut self.node);
            node.recycle();
            pool.with(|queue| queue.give_back(node));
        }
    }
}

impl<T: Recycle + fmt::Debug, L: Locker> fmt::Debug for Pooled<T, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pooled").field(&self.node).finish()
    }
}
