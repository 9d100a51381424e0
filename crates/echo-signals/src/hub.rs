// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The emission engine.
//!
//! [`SignalHub`] is the public face of the connection registry. It is a
//! shared, single-threaded handle: slots capture a clone (or a
//! [`WeakSignalHub`]) and may connect, disconnect, emit, or tear down from
//! inside an emission.
//!
//! # Emission protocol
//!
//! 1. The sender's list gains one in-flight emission and its current tail is
//!    recorded as the boundary.
//! 2. Records are visited in connection order up to and including the
//!    boundary. Dead records are skipped; live records subscribed to the
//!    emitted signal are invoked. No registry borrow is held during a call.
//! 3. Leaving the walk (normally, via a slot error, or by unwinding from a
//!    slot panic) drops an `EmitScope` guard, which retires the emission. The
//!    last emission out compacts the list if any walk over it, nested ones
//!    included, saw dead records.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{error, trace, warn};

use crate::arena::Handle;
use crate::bound::BoundSignal;
use crate::config::HubConfig;
use crate::error::EmitError;
use crate::ident::{ObjectId, ReceiverId};
use crate::registry::{ConnectionKey, HubStats, Registry};
use crate::signal::Signal;
use crate::slot::{ErasedSlot, Slot};

/// Shared handle to a signal/slot connection registry.
///
/// Cloning is cheap and every clone addresses the same registry. The hub is
/// `!Send`: delivery is synchronous on the calling thread.
///
/// Sender and receiver objects are referenced by [`ObjectId`] only. Before
/// an object is discarded, call [`SignalHub::clear_signal_data`] (or the
/// narrower [`disconnect_sender`](SignalHub::disconnect_sender) /
/// [`disconnect_receiver`](SignalHub::disconnect_receiver)) to drop its
/// connections.
#[derive(Clone)]
pub struct SignalHub {
    inner: Rc<RefCell<Registry>>,
}

impl Default for SignalHub {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalHub {
    /// Creates an empty hub with [`HubConfig::default`].
    pub fn new() -> Self {
        Self::with_config(HubConfig::default())
    }

    /// Creates an empty hub with the given configuration.
    pub fn with_config(config: HubConfig) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Registry::new(config))),
        }
    }

    /// Returns the configuration in effect, after `max_emit_depth` is raised
    /// to at least 1.
    pub fn config(&self) -> HubConfig {
        *self.inner.borrow().config()
    }

    /// Returns a weak handle that does not keep the registry alive.
    ///
    /// Slots stored in the hub should capture this instead of a strong clone;
    /// a strong clone inside a connected slot forms a reference cycle.
    pub fn downgrade(&self) -> WeakSignalHub {
        WeakSignalHub {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Binds `signal` to `sender`. See [`BoundSignal`].
    pub fn bind<A: ?Sized + 'static>(
        &self,
        sender: ObjectId,
        signal: &Signal<A>,
    ) -> BoundSignal<A> {
        signal.bind(self, sender)
    }

    /// Connects `slot` to `signal` on `sender`.
    ///
    /// The receiver identity is `context` when given, otherwise the slot
    /// itself. Returns `false` without side effects if the same
    /// `(signal, slot, context)` is already connected to `sender`.
    ///
    /// A connection made while `sender` is emitting is not invoked by that
    /// emission, only by later ones.
    pub fn connect<A: ?Sized + 'static>(
        &self,
        sender: ObjectId,
        signal: &Signal<A>,
        slot: &Slot<A>,
        context: Option<ObjectId>,
    ) -> bool {
        let key = ConnectionKey {
            signal: signal.id(),
            slot: slot.id(),
            context,
        };
        let connected = self
            .inner
            .borrow_mut()
            .connect(sender, key, ErasedSlot::new(slot));
        if connected {
            trace!(%sender, signal = signal.name(), slot = %slot.id(), "connected");
        } else {
            trace!(%sender, signal = signal.name(), slot = %slot.id(), "duplicate connection rejected");
        }
        connected
    }

    /// Disconnects `slot` from `signal` on `sender`.
    ///
    /// Returns `false` if no such live connection exists. The connection is
    /// removed from its receiver immediately; its place in the sender's list
    /// is reclaimed later. A connection removed while `sender` is emitting is
    /// not invoked for the remainder of that emission.
    pub fn disconnect<A: ?Sized + 'static>(
        &self,
        sender: ObjectId,
        signal: &Signal<A>,
        slot: &Slot<A>,
        context: Option<ObjectId>,
    ) -> bool {
        let key = ConnectionKey {
            signal: signal.id(),
            slot: slot.id(),
            context,
        };
        let released = self.inner.borrow_mut().disconnect(sender, &key);
        let found = released.is_some();
        // Dropped here, outside the borrow: slot captures may call back in.
        drop(released);
        if found {
            trace!(%sender, signal = signal.name(), slot = %slot.id(), "disconnected");
        }
        found
    }

    /// Emits `signal` from `sender`, invoking every slot connected to it on
    /// that sender, in connection order, with `(sender, args)`.
    ///
    /// Only connections that existed when the emission started are visited.
    /// A no-op if `sender` has no connections.
    ///
    /// # Errors
    ///
    /// [`EmitError::SlotFailed`] carries the first slot error; later slots are
    /// not invoked. [`EmitError::DepthExceeded`] is returned if `sender` is
    /// already being emitted [`HubConfig::max_emit_depth`] levels deep.
    /// Panics from a slot propagate unchanged. In every case the hub's
    /// bookkeeping for the aborted emission is completed.
    pub fn emit<A: ?Sized + 'static>(
        &self,
        sender: ObjectId,
        signal: &Signal<A>,
        args: &A,
    ) -> Result<(), EmitError> {
        let entered = self.inner.borrow_mut().begin_emit(sender);
        let window = match entered {
            Ok(Some(window)) => window,
            Ok(None) => return Ok(()),
            Err(depth) => {
                warn!(%sender, signal = signal.name(), depth, "emission nesting limit reached");
                return Err(EmitError::DepthExceeded {
                    signal_name: signal.name(),
                    sender,
                    depth,
                });
            }
        };
        trace!(%sender, signal = signal.name(), "emit");

        let mut scope = EmitScope {
            hub: self,
            list: window.list,
            saw_dead: false,
        };
        let mut cursor = window.first;
        while let Some(record) = cursor {
            let step = self.inner.borrow().step(record, &window, signal.id());
            cursor = step.next;
            scope.saw_dead |= step.dead;
            let Some(slot) = step.slot else {
                continue;
            };
            if let Some(Err(source)) = slot.invoke(sender, args) {
                return Err(EmitError::SlotFailed {
                    signal: signal.id(),
                    signal_name: signal.name(),
                    sender,
                    slot: slot.id(),
                    source,
                });
            }
        }
        Ok(())
    }

    /// Disconnects every connection whose sender is `sender`, regardless of
    /// signal or receiver, and forgets the sender.
    pub fn disconnect_sender(&self, sender: ObjectId) {
        let released = self.inner.borrow_mut().disconnect_sender(sender);
        drop(released);
    }

    /// Disconnects every connection attributed to `receiver`, on every
    /// sender.
    ///
    /// `receiver` is either a context object or, for connections made without
    /// one, the slot's id.
    pub fn disconnect_receiver(&self, receiver: impl Into<ReceiverId>) {
        let released = self.inner.borrow_mut().disconnect_receiver(receiver.into());
        drop(released);
    }

    /// Removes `object` from both indices: every connection it sends and
    /// every connection it receives as a context. A no-op for unknown ids.
    pub fn clear_signal_data(&self, object: ObjectId) {
        self.disconnect_sender(object);
        self.disconnect_receiver(object);
    }

    /// Returns `true` if the given connection is live.
    pub fn is_connected<A: ?Sized + 'static>(
        &self,
        sender: ObjectId,
        signal: &Signal<A>,
        slot: &Slot<A>,
        context: Option<ObjectId>,
    ) -> bool {
        let key = ConnectionKey {
            signal: signal.id(),
            slot: slot.id(),
            context,
        };
        self.inner.borrow().is_connected(sender, &key)
    }

    /// Number of live connections on `sender`, across all signals.
    pub fn connection_count(&self, sender: ObjectId) -> usize {
        self.inner.borrow().connection_count(sender)
    }

    /// Number of live connections attributed to `receiver`.
    pub fn receiver_connection_count(&self, receiver: impl Into<ReceiverId>) -> usize {
        self.inner
            .borrow()
            .receiver_connection_count(receiver.into())
    }

    /// Returns `true` while at least one emission is walking `sender`'s
    /// connections.
    pub fn is_emitting(&self, sender: ObjectId) -> bool {
        self.inner.borrow().is_emitting(sender)
    }

    /// Reclaims dead connection records on `sender` now instead of at its
    /// next emission. Returns the number reclaimed; does nothing while the
    /// sender is emitting.
    pub fn compact(&self, sender: ObjectId) -> usize {
        self.inner.borrow_mut().compact_sender(sender)
    }

    /// Snapshot of index sizes.
    pub fn stats(&self) -> HubStats {
        self.inner.borrow().stats()
    }
}

impl fmt::Debug for SignalHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_borrow() {
            Ok(reg) => f
                .debug_struct("SignalHub")
                .field("stats", &reg.stats())
                .finish(),
            Err(_) => f.debug_struct("SignalHub").finish_non_exhaustive(),
        }
    }
}

/// Non-owning counterpart of [`SignalHub`].
#[derive(Clone, Default)]
pub struct WeakSignalHub {
    inner: Weak<RefCell<Registry>>,
}

impl WeakSignalHub {
    /// Returns the hub if it is still alive.
    pub fn upgrade(&self) -> Option<SignalHub> {
        self.inner.upgrade().map(|inner| SignalHub { inner })
    }
}

impl fmt::Debug for WeakSignalHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakSignalHub")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

/// Retires one in-flight emission when dropped, including on unwind.
struct EmitScope<'h> {
    hub: &'h SignalHub,
    list: Handle,
    saw_dead: bool,
}

impl Drop for EmitScope<'_> {
    fn drop(&mut self) {
        match self.hub.inner.try_borrow_mut() {
            Ok(mut reg) => reg.end_emit(self.list, self.saw_dead),
            Err(_) => error!("registry borrowed while retiring an emission; list left in flight"),
        }
    }
}
