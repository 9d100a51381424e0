// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Typed signal declarations.

use std::fmt;
use std::marker::PhantomData;

use crate::bound::BoundSignal;
use crate::hub::SignalHub;
use crate::ident::{ObjectId, SignalId};

/// A signal declaration carrying payload type `A`.
///
/// A `Signal` owns no connections; it is only the key the hub filters
/// dispatch by. Two signals are equal iff they share a [`SignalId`], which is
/// only the case for copies of the same declaration. The payload type is
/// fixed at declaration, so every slot connected through a `Signal<A>` is a
/// `Slot<A>` and receives `&A` on emission.
///
/// Whether a signal lives as a field on its sender or is created on demand
/// and stored elsewhere makes no difference to the hub.
pub struct Signal<A: ?Sized + 'static> {
    id: SignalId,
    name: &'static str,
    _payload: PhantomData<fn(&A)>,
}

impl<A: ?Sized + 'static> Signal<A> {
    /// Declares a new signal. `name` is used in diagnostics only.
    pub fn new(name: &'static str) -> Self {
        Self {
            id: SignalId::fresh(),
            name,
            _payload: PhantomData,
        }
    }

    /// Returns the signal identity.
    #[inline]
    pub fn id(&self) -> SignalId {
        self.id
    }

    /// Returns the diagnostic name given at declaration.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Binds this signal to `sender` on `hub`.
    ///
    /// Binding creates no index entries; only connecting does.
    pub fn bind(&self, hub: &SignalHub, sender: ObjectId) -> BoundSignal<A> {
        BoundSignal::new(hub.clone(), sender, *self)
    }
}

impl<A: ?Sized + 'static> Clone for Signal<A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<A: ?Sized + 'static> Copy for Signal<A> {}

impl<A: ?Sized + 'static> PartialEq for Signal<A> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<A: ?Sized + 'static> Eq for Signal<A> {}

impl<A: ?Sized + 'static> fmt::Debug for Signal<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copies_compare_equal_declarations_do_not() {
        let a: Signal<u32> = Signal::new("changed");
        let b: Signal<u32> = Signal::new("changed");
        let a2 = a;
        assert_eq!(a, a2);
        assert_ne!(a, b);
        assert_eq!(a.name(), b.name());
    }

    #[test]
    fn unsized_payloads_are_allowed() {
        let s: Signal<str> = Signal::new("text");
        assert_eq!(s.name(), "text");
    }
}
