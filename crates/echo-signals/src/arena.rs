// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Slab storage for connection records and sender lists.
//!
//! Both registry indices refer to records by [`Handle`] rather than by
//! reference, so neither index owns a record and no ownership cycle forms
//! between the two linked lists.
//!
//! Handles carry no generation. The registry frees an entry only once no
//! list, chain, or in-flight emission can still reach it: compaction runs on
//! a list with no walker, and only frees records already unlinked from their
//! receiver chain.

/// Stable handle into an [`Arena`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub(crate) struct Handle(usize);

/// Slab of `T` with a free list.
#[derive(Debug)]
pub(crate) struct Arena<T> {
    entries: Vec<Option<T>>,
    free: Vec<usize>,
    len: usize,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}

impl<T> Arena<T> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            free: Vec::new(),
            len: 0,
        }
    }

    /// Number of occupied entries.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn insert(&mut self, value: T) -> Handle {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            self.entries[index] = Some(value);
            return Handle(index);
        }
        self.entries.push(Some(value));
        Handle(self.entries.len() - 1)
    }

    #[inline]
    pub(crate) fn get(&self, handle: Handle) -> Option<&T> {
        self.entries.get(handle.0).and_then(Option::as_ref)
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        self.entries.get_mut(handle.0).and_then(Option::as_mut)
    }

    /// Releases the entry behind `handle` and queues its slot for reuse.
    pub(crate) fn remove(&mut self, handle: Handle) -> Option<T> {
        let value = self.entries.get_mut(handle.0)?.take()?;
        self.free.push(handle.0);
        self.len -= 1;
        Some(value)
    }

    /// Iterates occupied values in slab order.
    pub(crate) fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().filter_map(Option::as_ref)
    }
}
