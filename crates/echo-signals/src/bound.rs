// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Signal bound to a sender.

use std::fmt;

use crate::error::EmitError;
use crate::hub::SignalHub;
use crate::ident::ObjectId;
use crate::signal::Signal;
use crate::slot::Slot;

/// A [`Signal`] paired with one sender on one hub.
///
/// Forwards `connect`/`disconnect`/`emit` to the hub with the sender filled
/// in. Creating one has no side effects and allocates no index entries, so
/// objects can hand them out per call:
///
/// ```rust
/// use echo_signals::{BoundSignal, ObjectId, Signal, SignalHub, Slot};
///
/// struct Counter {
///     id: ObjectId,
///     changed: Signal<u64>,
/// }
///
/// impl Counter {
///     fn changed(&self, hub: &SignalHub) -> BoundSignal<u64> {
///         self.changed.bind(hub, self.id)
///     }
/// }
///
/// let hub = SignalHub::new();
/// let counter = Counter { id: ObjectId::fresh(), changed: Signal::new("changed") };
/// let printer = Slot::infallible(|_, value: &u64| assert_eq!(*value, 7));
///
/// assert!(counter.changed(&hub).connect(&printer, None));
/// counter.changed(&hub).emit(&7).unwrap();
/// ```
pub struct BoundSignal<A: ?Sized + 'static> {
    hub: SignalHub,
    sender: ObjectId,
    signal: Signal<A>,
}

impl<A: ?Sized + 'static> BoundSignal<A> {
    pub(crate) fn new(hub: SignalHub, sender: ObjectId, signal: Signal<A>) -> Self {
        Self {
            hub,
            sender,
            signal,
        }
    }

    /// The bound sender.
    #[inline]
    pub fn sender(&self) -> ObjectId {
        self.sender
    }

    /// The bound signal.
    #[inline]
    pub fn signal(&self) -> Signal<A> {
        self.signal
    }

    /// See [`SignalHub::connect`].
    pub fn connect(&self, slot: &Slot<A>, context: Option<ObjectId>) -> bool {
        self.hub.connect(self.sender, &self.signal, slot, context)
    }

    /// See [`SignalHub::disconnect`].
    pub fn disconnect(&self, slot: &Slot<A>, context: Option<ObjectId>) -> bool {
        self.hub.disconnect(self.sender, &self.signal, slot, context)
    }

    /// See [`SignalHub::emit`].
    pub fn emit(&self, args: &A) -> Result<(), EmitError> {
        self.hub.emit(self.sender, &self.signal, args)
    }

    /// See [`SignalHub::is_connected`].
    pub fn is_connected(&self, slot: &Slot<A>, context: Option<ObjectId>) -> bool {
        self.hub
            .is_connected(self.sender, &self.signal, slot, context)
    }
}

impl<A: ?Sized + 'static> Clone for BoundSignal<A> {
    fn clone(&self) -> Self {
        Self {
            hub: self.hub.clone(),
            sender: self.sender,
            signal: self.signal,
        }
    }
}

impl<A: ?Sized + 'static> fmt::Debug for BoundSignal<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundSignal")
            .field("sender", &self.sender)
            .field("signal", &self.signal)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::registry::HubStats;

    #[test]
    fn binding_creates_no_entries() {
        let hub = SignalHub::new();
        let sig: Signal<()> = Signal::new("bound");
        let bound = sig.bind(&hub, ObjectId::fresh());
        let _again = hub.bind(bound.sender(), &sig);
        assert_eq!(hub.stats(), HubStats::default());
        assert_eq!(bound.signal(), sig);
    }

    #[test]
    fn bound_and_unbound_calls_address_the_same_connection() {
        let hub = SignalHub::new();
        let sender = ObjectId::fresh();
        let sig: Signal<()> = Signal::new("bound");
        let slot = Slot::infallible(|_, _: &()| {});

        let bound = sig.bind(&hub, sender);
        assert!(bound.connect(&slot, None));
        assert!(!hub.connect(sender, &sig, &slot, None));
        assert!(bound.is_connected(&slot, None));
        assert!(hub.disconnect(sender, &sig, &slot, None));
        assert!(!bound.disconnect(&slot, None));
    }
}
