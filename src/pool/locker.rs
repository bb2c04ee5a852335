//! Locking policies for pools shared between channels.
//!
//! A pool stores its free list inside `L::Cell`. [`MutexLocker`] makes the
//! pool safe to share across threads; [`NoLocker`] swaps the mutex for a
//! `RefCell`, which removes locking cost and makes the pool `!Sync` so the
//! compiler holds the embedder to single-threaded use.

use std::cell::RefCell;

use parking_lot::Mutex;

/// Strategy deciding how a pool serialises access to its free list.
pub trait Locker: 'static {
    /// Container guarding a value of type `T`.
    type Cell<T>;

    /// Wrap `value` in the policy's container.
    fn new_cell<T>(value: T) -> Self::Cell<T>;

    /// Run `f` with exclusive access to the guarded value.
    fn with<T, R>(cell: &Self::Cell<T>, f: impl FnOnce(&mut T) -> R) -> R;
}

/// Guard the free list with a `parking_lot` mutex.
#[derive(Debug)]
pub enum MutexLocker {}

impl Locker for MutexLocker {
    type Cell<T> = Mutex<T>;

    fn new_cell<T>(value: T) -> Self::Cell<T> { Mutex::new(value) }

    fn with<T, R>(cell: &Self::Cell<T>, f: impl FnOnce(&mut T) -> R) -> R { f(&mut cell.lock()) }
}

/// Skip locking for pools confined to one thread.
#[derive(Debug)]
pub enum NoLocker {}

impl Locker for NoLocker {
    type Cell<T> = RefCell<T>;

    fn new_cell<T>(value: T) -> Self::Cell<T> { RefCell::new(value) }

    fn with<T, R>(cell: &Self::Cell<T>, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut cell.borrow_mut())
    }
}
