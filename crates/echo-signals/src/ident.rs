// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Identity tokens for senders, receivers, signals, and slots.
//!
//! Every token is minted from one process-wide monotonic counter, so ids of
//! different kinds never share a value and a freshly minted id is never equal
//! to any id handed out before it.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

#[inline]
fn mint() -> u64 {
    NEXT_TOKEN.fetch_add(1, Ordering::Relaxed)
}

/// Opaque identity of an object taking part in signal traffic as a sender,
/// a receiver context, or both.
///
/// The hub keys its indices by this id and never owns the object itself.
/// Objects typically mint one at construction and keep it for their whole
/// lifetime; before the object goes away its owner is expected to call
/// [`SignalHub::clear_signal_data`](crate::SignalHub::clear_signal_data).
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct ObjectId(u64);

impl ObjectId {
    /// Mints a new, process-unique object id.
    pub fn fresh() -> Self {
        Self(mint())
    }

    /// Returns the raw token value (diagnostics only).
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "object#{}", self.0)
    }
}

/// Opaque identity of a signal declaration. See [`Signal`](crate::Signal).
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct SignalId(u64);

impl SignalId {
    pub(crate) fn fresh() -> Self {
        Self(mint())
    }

    /// Returns the raw token value (diagnostics only).
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SignalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "signal#{}", self.0)
    }
}

/// Identity of a callback. Clones of one [`Slot`](crate::Slot) share it.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct SlotId(u64);

impl SlotId {
    pub(crate) fn fresh() -> Self {
        Self(mint())
    }

    /// Returns the raw token value (diagnostics only).
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot#{}", self.0)
    }
}

/// Receiver identity used to key the receiver index.
///
/// A connection made with an explicit context is attributed to that context
/// object; without one, the callback itself is the receiver.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum ReceiverId {
    /// An explicit receiver context object.
    Object(ObjectId),
    /// A context-free callback acting as its own receiver.
    Slot(SlotId),
}

impl ReceiverId {
    /// Resolves the receiver identity for a `(slot, context)` pair.
    #[inline]
    pub fn resolve(slot: SlotId, context: Option<ObjectId>) -> Self {
        context.map_or(Self::Slot(slot), Self::Object)
    }
}

impl From<ObjectId> for ReceiverId {
    fn from(id: ObjectId) -> Self {
        Self::Object(id)
    }
}

impl From<SlotId> for ReceiverId {
    fn from(id: SlotId) -> Self {
        Self::Slot(id)
    }
}

impl fmt::Display for ReceiverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Object(id) => id.fmt(f),
            Self::Slot(id) => id.fmt(f),
        }
    }
}
