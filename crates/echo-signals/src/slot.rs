// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Callbacks with identity, and their type-erased storage form.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use crate::ident::{ObjectId, SlotId};

/// Error a slot may return to abort an emission.
pub type SlotError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result returned by every slot invocation.
pub type SlotResult = Result<(), SlotError>;

type SlotFn<A> = dyn Fn(ObjectId, &A) -> SlotResult;

/// A callback receiving `(sender, &payload)`.
///
/// Each `Slot::new` mints a fresh [`SlotId`]; clones share it. Connection
/// identity compares slots by that id, so disconnecting requires a clone of
/// the slot that was connected, exactly as a function reference would.
pub struct Slot<A: ?Sized + 'static> {
    id: SlotId,
    func: Rc<SlotFn<A>>,
}

impl<A: ?Sized + 'static> Slot<A> {
    /// Wraps a fallible callback. An `Err` aborts the emission that invoked it.
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(ObjectId, &A) -> SlotResult + 'static,
    {
        Self {
            id: SlotId::fresh(),
            func: Rc::new(func),
        }
    }

    /// Wraps a callback that never fails.
    pub fn infallible<F>(func: F) -> Self
    where
        F: Fn(ObjectId, &A) + 'static,
    {
        Self::new(move |sender, args| {
            func(sender, args);
            Ok(())
        })
    }

    /// Returns the slot identity.
    #[inline]
    pub fn id(&self) -> SlotId {
        self.id
    }

    /// Invokes the callback directly, bypassing any hub.
    #[inline]
    pub fn call(&self, sender: ObjectId, args: &A) -> SlotResult {
        (self.func)(sender, args)
    }
}

impl<A: ?Sized + 'static> Clone for Slot<A> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            func: Rc::clone(&self.func),
        }
    }
}

impl<A: ?Sized + 'static> PartialEq for Slot<A> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<A: ?Sized + 'static> Eq for Slot<A> {}

impl<A: ?Sized + 'static> fmt::Debug for Slot<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot").field("id", &self.id).finish()
    }
}

/// Type-erased slot as stored in a connection record.
///
/// The concrete value is always a `Slot<A>` for the payload type of the
/// signal the record was connected under.
#[derive(Clone)]
pub(crate) struct ErasedSlot {
    id: SlotId,
    inner: Rc<dyn Any>,
}

impl ErasedSlot {
    pub(crate) fn new<A: ?Sized + 'static>(slot: &Slot<A>) -> Self {
        Self {
            id: slot.id,
            inner: Rc::new(slot.clone()),
        }
    }

    #[inline]
    pub(crate) fn id(&self) -> SlotId {
        self.id
    }

    /// Invokes the slot if it was erased from a `Slot<A>`.
    ///
    /// Returns `None` on a payload type mismatch, which signal-id matching
    /// rules out for every record reachable through the public API.
    pub(crate) fn invoke<A: ?Sized + 'static>(
        &self,
        sender: ObjectId,
        args: &A,
    ) -> Option<SlotResult> {
        self.inner
            .downcast_ref::<Slot<A>>()
            .map(|slot| slot.call(sender, args))
    }
}

impl fmt::Debug for ErasedSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErasedSlot").field("id", &self.id).finish()
    }
}
