//! FIFO free list backing a [`Pool`](super::Pool).

use std::collections::VecDeque;

/// Free nodes plus the capacity accounting of one pool.
///
/// `limit` is the number of nodes the pool may own in total. Nodes are
/// either parked in `free` or checked out (`outstanding`); the difference
/// between `limit` and the owned count is headroom that `acquire` may fill by
/// allocating.
#[derive(Debug)]
pub(crate) struct FreeQueue<T> {
    free: VecDeque<T>,
    limit: usize,
    outstanding: usize,
}

impl<T> FreeQueue<T> {
    pub(crate) fn new(limit: usize) -> Self {
        Self {
            free: VecDeque::with_capacity(limit),
            limit,
            outstanding: 0,
        }
    }

    /// Nodes owned by the pool, parked or checked out.
    pub(crate) fn owned(&self) -> usize { self.free.len() + self.outstanding }

    pub(crate) fn free_len(&self) -> usize { self.free.len() }

    pub(crate) fn limit(&self) -> usize { self.limit }

    pub(crate) fn outstanding(&self) -> usize { self.outstanding }

    pub(crate) fn headroom(&self) -> usize { self.limit.saturating_sub(self.owned()) }

    /// Park a node at the tail. Used for pre-allocation and returns.
    pub(crate) fn push(&mut self, node: T) { self.free.push_back(node); }

    /// Take the head node, counting it as checked out.
    pub(crate) fn pop(&mut self) -> Option<T> {
        let node = self.free.pop_front()?;
        self.outstanding += 1;
        Some(node)
    }

    /// Reserve headroom for a node the caller is about to allocate.
    pub(crate) fn reserve_new(&mut self) -> bool {
        if self.headroom() == 0 {
            return false;
        }
        self.outstanding += 1;
        true
    }

    /// Return a checked-out node to the tail.
    pub(crate) fn give_back(&mut self, node: T) {
        self.outstanding = self.outstanding.saturating_sub(1);
        self.free.push_back(node);
    }

    /// Give up to `count` units of capacity, free nodes first.
    pub(crate) fn surrender(&mut self, count: usize) -> (usize, Vec<T>) {
        let headroom = self.headroom();
        let take = count.min(self.free.len());
        let nodes: Vec<T> = self.free.drain(..take).collect();
        let spare = (count - take).min(headroom);
        let moved = take + spare;
        self.limit -= moved;
        (moved, nodes)
    }

    /// Accept capacity and free nodes surrendered by another pool.
    pub(crate) fn absorb(&mut self, moved: usize, nodes: Vec<T>) {
        self.limit += moved;
        self.free.extend(nodes);
    }
}
