// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Connection registry: the record arena plus the sender and receiver indices.
//!
//! Every connection record is threaded onto two lists at once:
//!
//! ```text
//!   senders[S] ──► SenderList { first ─► r1 ─► r2 ─► r3 ◄─ last }   (next_in_sender)
//!
//!   receivers[R] ─► r3 ⇄ r1        (prev_for_receiver / next_for_receiver,
//!                                   most recently connected first)
//! ```
//!
//! Removal from the receiver chain is eager. Removal from the sender list is
//! lazy: a disconnected record only loses its slot (it becomes *dead*) and is
//! physically unlinked by [`Registry::compact`] once no emission is walking
//! that list. Nothing in this module invokes a slot; emission is driven by
//! the hub, which calls [`Registry::begin_emit`], [`Registry::step`], and
//! [`Registry::end_emit`] without holding a borrow across slot calls.

use rustc_hash::{FxBuildHasher, FxHashMap};
use tracing::debug;

use crate::arena::{Arena, Handle};
use crate::config::HubConfig;
use crate::ident::{ObjectId, ReceiverId, SignalId, SlotId};
use crate::slot::ErasedSlot;

/// The `(signal, slot, context)` triple connections are deduplicated on.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) struct ConnectionKey {
    pub signal: SignalId,
    pub slot: SlotId,
    pub context: Option<ObjectId>,
}

impl ConnectionKey {
    #[inline]
    pub(crate) fn receiver(&self) -> ReceiverId {
        ReceiverId::resolve(self.slot, self.context)
    }
}

/// One subscription of one slot to one signal on one sender.
#[derive(Debug)]
struct ConnectionRecord {
    signal: SignalId,
    /// `None` once disconnected.
    slot: Option<ErasedSlot>,
    context: Option<ObjectId>,
    receiver: ReceiverId,
    next_in_sender: Option<Handle>,
    prev_for_receiver: Option<Handle>,
    next_for_receiver: Option<Handle>,
}

impl ConnectionRecord {
    #[inline]
    fn is_live(&self) -> bool {
        self.slot.is_some()
    }

    fn matches(&self, key: &ConnectionKey) -> bool {
        self.signal == key.signal
            && self.context == key.context
            && self.slot.as_ref().is_some_and(|s| s.id() == key.slot)
    }
}

/// Insertion-ordered connection list of one sender.
#[derive(Debug)]
struct SenderList {
    sender: ObjectId,
    first: Option<Handle>,
    last: Option<Handle>,
    /// Emissions currently walking this list.
    refs: u32,
    /// Set when the sender was bulk-disconnected mid-emission; the list is no
    /// longer indexed and is released by the last emission leaving it.
    detached: bool,
    /// A nested emission saw dead records it was not allowed to reclaim.
    needs_compaction: bool,
}

/// What an emission walks: the list and its bounds at emission start.
#[derive(Clone, Copy, Debug)]
pub(crate) struct EmitWindow {
    pub list: Handle,
    pub first: Option<Handle>,
    /// Last record that existed when the emission began. Records appended
    /// after it are never visited by this emission.
    pub boundary: Option<Handle>,
}

/// One iteration of an emission walk.
#[derive(Debug, Default)]
pub(crate) struct Step {
    /// Slot to invoke, if the record is live and subscribed to the signal.
    pub slot: Option<ErasedSlot>,
    /// The record was dead.
    pub dead: bool,
    pub next: Option<Handle>,
}

/// Index sizes reported by [`SignalHub::stats`](crate::SignalHub::stats).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HubStats {
    /// Senders with a connection list.
    pub senders: usize,
    /// Receivers with a non-empty receiver chain.
    pub receivers: usize,
    /// Connection records held, including dead ones awaiting compaction.
    pub records: usize,
    /// Connection records that are still connected.
    pub live_records: usize,
}

#[derive(Debug)]
pub(crate) struct Registry {
    records: Arena<ConnectionRecord>,
    lists: Arena<SenderList>,
    senders: FxHashMap<ObjectId, Handle>,
    receivers: FxHashMap<ReceiverId, Handle>,
    config: HubConfig,
}

impl Registry {
    pub(crate) fn new(config: HubConfig) -> Self {
        let config = HubConfig {
            max_emit_depth: config.max_emit_depth.max(1),
            ..config
        };
        Self {
            records: Arena::with_capacity(config.connection_capacity),
            lists: Arena::with_capacity(config.sender_capacity),
            senders: FxHashMap::with_capacity_and_hasher(config.sender_capacity, FxBuildHasher),
            receivers: FxHashMap::with_capacity_and_hasher(
                config.receiver_capacity,
                FxBuildHasher,
            ),
            config,
        }
    }

    #[inline]
    pub(crate) fn config(&self) -> &HubConfig {
        &self.config
    }

    // ── connect / disconnect ────────────────────────────────────────────

    /// Appends a new connection unless the triple is already connected.
    pub(crate) fn connect(
        &mut self,
        sender: ObjectId,
        key: ConnectionKey,
        slot: ErasedSlot,
    ) -> bool {
        let existing = self.senders.get(&sender).copied();
        if let Some(list) = existing {
            if self.find_live(list, &key).is_some() {
                return false;
            }
        }

        let record = self.records.insert(ConnectionRecord {
            signal: key.signal,
            slot: Some(slot),
            context: key.context,
            receiver: key.receiver(),
            next_in_sender: None,
            prev_for_receiver: None,
            next_for_receiver: None,
        });

        let list = match existing {
            Some(list) => list,
            None => {
                let list = self.lists.insert(SenderList {
                    sender,
                    first: None,
                    last: None,
                    refs: 0,
                    detached: false,
                    needs_compaction: false,
                });
                self.senders.insert(sender, list);
                list
            }
        };
        self.append(list, record);
        self.link_receiver(record);
        true
    }

    /// Marks the matching live connection dead and returns its slot so the
    /// caller can drop it outside any registry borrow.
    pub(crate) fn disconnect(
        &mut self,
        sender: ObjectId,
        key: &ConnectionKey,
    ) -> Option<ErasedSlot> {
        let list = self.senders.get(&sender).copied()?;
        let record = self.find_live(list, key)?;
        self.kill(record)
    }

    pub(crate) fn is_connected(&self, sender: ObjectId, key: &ConnectionKey) -> bool {
        self.senders
            .get(&sender)
            .is_some_and(|&list| self.find_live(list, key).is_some())
    }

    fn find_live(&self, list: Handle, key: &ConnectionKey) -> Option<Handle> {
        let mut cursor = self.lists.get(list)?.first;
        while let Some(handle) = cursor {
            let record = self.records.get(handle)?;
            if record.matches(key) {
                return Some(handle);
            }
            cursor = record.next_in_sender;
        }
        None
    }

    fn append(&mut self, list: Handle, record: Handle) {
        let Some(list) = self.lists.get_mut(list) else {
            return;
        };
        match list.last.replace(record) {
            Some(tail) => {
                if let Some(tail) = self.records.get_mut(tail) {
                    tail.next_in_sender = Some(record);
                }
            }
            None => list.first = Some(record),
        }
    }

    /// Pushes `record` onto the head of its receiver chain.
    fn link_receiver(&mut self, record: Handle) {
        let Some(receiver) = self.records.get(record).map(|r| r.receiver) else {
            return;
        };
        let old_head = self.receivers.insert(receiver, record);
        if let Some(old) = old_head.and_then(|h| self.records.get_mut(h)) {
            old.prev_for_receiver = Some(record);
        }
        if let Some(rec) = self.records.get_mut(record) {
            rec.prev_for_receiver = None;
            rec.next_for_receiver = old_head;
        }
    }

    /// Splices `record` out of its receiver chain, dropping the index entry
    /// when the chain empties.
    fn unlink_receiver(&mut self, record: Handle) {
        let Some(rec) = self.records.get_mut(record) else {
            return;
        };
        let receiver = rec.receiver;
        let prev = rec.prev_for_receiver.take();
        let next = rec.next_for_receiver.take();

        if let Some(n) = next.and_then(|h| self.records.get_mut(h)) {
            n.prev_for_receiver = prev;
        }
        match prev {
            Some(prev) => {
                if let Some(p) = self.records.get_mut(prev) {
                    p.next_for_receiver = next;
                }
            }
            None if self.receivers.get(&receiver) == Some(&record) => match next {
                Some(next) => {
                    self.receivers.insert(receiver, next);
                }
                None => {
                    self.receivers.remove(&receiver);
                }
            },
            None => {}
        }
    }

    /// Unlinks a live record from its receiver and marks it dead. The record
    /// stays on its sender list.
    fn kill(&mut self, record: Handle) -> Option<ErasedSlot> {
        if !self.records.get(record)?.is_live() {
            return None;
        }
        self.unlink_receiver(record);
        let rec = self.records.get_mut(record)?;
        rec.context = None;
        rec.slot.take()
    }

    // ── bulk teardown ───────────────────────────────────────────────────

    /// Kills every connection of `sender` and drops its index entry.
    pub(crate) fn disconnect_sender(&mut self, sender: ObjectId) -> Vec<ErasedSlot> {
        let Some(list) = self.senders.remove(&sender) else {
            return Vec::new();
        };
        let mut released = Vec::new();
        let mut cursor = self.lists.get(list).and_then(|l| l.first);
        while let Some(handle) = cursor {
            cursor = self.records.get(handle).and_then(|r| r.next_in_sender);
            released.extend(self.kill(handle));
        }

        let in_flight = match self.lists.get_mut(list) {
            Some(l) if l.refs > 0 => {
                l.detached = true;
                true
            }
            _ => false,
        };
        if in_flight {
            debug!(%sender, released = released.len(), "sender detached mid-emission");
        } else {
            self.compact(list);
            debug!(%sender, released = released.len(), "sender disconnected");
        }
        released
    }

    /// Kills every connection attributed to `receiver`. Records stay on their
    /// sender lists until those are next compacted.
    pub(crate) fn disconnect_receiver(&mut self, receiver: ReceiverId) -> Vec<ErasedSlot> {
        let mut released = Vec::new();
        let mut cursor = self.receivers.remove(&receiver);
        while let Some(handle) = cursor {
            let Some(rec) = self.records.get_mut(handle) else {
                break;
            };
            cursor = rec.next_for_receiver.take();
            rec.prev_for_receiver = None;
            rec.context = None;
            released.extend(rec.slot.take());
        }
        if !released.is_empty() {
            debug!(%receiver, released = released.len(), "receiver disconnected");
        }
        released
    }

    // ── emission protocol ───────────────────────────────────────────────

    /// Registers an emission on `sender`'s list and snapshots its bounds.
    ///
    /// Returns `Ok(None)` when the sender has no list, and `Err(depth)` when
    /// the list is already walked by `max_emit_depth` emissions.
    pub(crate) fn begin_emit(&mut self, sender: ObjectId) -> Result<Option<EmitWindow>, u32> {
        let Some(&handle) = self.senders.get(&sender) else {
            return Ok(None);
        };
        let max_depth = self.config.max_emit_depth;
        let Some(list) = self.lists.get_mut(handle) else {
            return Ok(None);
        };
        if list.refs >= max_depth {
            return Err(list.refs);
        }
        list.refs += 1;
        Ok(Some(EmitWindow {
            list: handle,
            first: list.first,
            boundary: list.last,
        }))
    }

    /// Reads one record of an emission walk.
    pub(crate) fn step(&self, record: Handle, window: &EmitWindow, signal: SignalId) -> Step {
        let Some(rec) = self.records.get(record) else {
            return Step::default();
        };
        let next = if Some(record) == window.boundary {
            None
        } else {
            rec.next_in_sender
        };
        match &rec.slot {
            None => Step {
                slot: None,
                dead: true,
                next,
            },
            Some(slot) if rec.signal == signal => Step {
                slot: Some(slot.clone()),
                dead: false,
                next,
            },
            Some(_) => Step {
                slot: None,
                dead: false,
                next,
            },
        }
    }

    /// Unregisters an emission. The last emission out compacts the list if
    /// any walk over it saw dead records, or if the list was detached.
    pub(crate) fn end_emit(&mut self, list: Handle, saw_dead: bool) {
        let Some(l) = self.lists.get_mut(list) else {
            return;
        };
        l.refs = l.refs.saturating_sub(1);
        l.needs_compaction |= saw_dead;
        if l.refs == 0 && (l.needs_compaction || l.detached) {
            self.compact(list);
        }
    }

    #[inline]
    pub(crate) fn is_emitting(&self, sender: ObjectId) -> bool {
        self.senders
            .get(&sender)
            .and_then(|&h| self.lists.get(h))
            .is_some_and(|l| l.refs > 0)
    }

    // ── compaction ──────────────────────────────────────────────────────

    /// Compacts `sender`'s list if no emission is walking it.
    pub(crate) fn compact_sender(&mut self, sender: ObjectId) -> usize {
        match self.senders.get(&sender).copied() {
            Some(list) if !self.is_emitting(sender) => self.compact(list),
            _ => 0,
        }
    }

    /// Frees every dead record on `list` and relinks the survivors. An emptied
    /// list is released together with its sender index entry. Must only run
    /// while no emission walks the list.
    fn compact(&mut self, list: Handle) -> usize {
        let Some(l) = self.lists.get(list) else {
            return 0;
        };
        let sender = l.sender;
        let mut cursor = l.first;
        let mut first = None;
        let mut last: Option<Handle> = None;
        let mut reclaimed = 0usize;

        while let Some(handle) = cursor {
            let Some(rec) = self.records.get(handle) else {
                break;
            };
            cursor = rec.next_in_sender;
            if rec.is_live() {
                match last.and_then(|h| self.records.get_mut(h)) {
                    Some(prev) => prev.next_in_sender = Some(handle),
                    None => first = Some(handle),
                }
                last = Some(handle);
            } else {
                self.records.remove(handle);
                reclaimed += 1;
            }
        }
        if let Some(tail) = last.and_then(|h| self.records.get_mut(h)) {
            tail.next_in_sender = None;
        }

        if first.is_none() {
            self.lists.remove(list);
            if self.senders.get(&sender) == Some(&list) {
                self.senders.remove(&sender);
            }
        } else if let Some(l) = self.lists.get_mut(list) {
            l.first = first;
            l.last = last;
            l.needs_compaction = false;
        }
        if reclaimed > 0 {
            debug!(%sender, reclaimed, "compacted sender list");
        }
        reclaimed
    }

    // ── introspection ───────────────────────────────────────────────────

    pub(crate) fn connection_count(&self, sender: ObjectId) -> usize {
        let mut count = 0;
        let mut cursor = self
            .senders
            .get(&sender)
            .and_then(|&h| self.lists.get(h))
            .and_then(|l| l.first);
        while let Some(rec) = cursor.and_then(|h| self.records.get(h)) {
            count += usize::from(rec.is_live());
            cursor = rec.next_in_sender;
        }
        count
    }

    pub(crate) fn receiver_connection_count(&self, receiver: ReceiverId) -> usize {
        let mut count = 0;
        let mut cursor = self.receivers.get(&receiver).copied();
        while let Some(rec) = cursor.and_then(|h| self.records.get(h)) {
            count += 1;
            cursor = rec.next_for_receiver;
        }
        count
    }

    pub(crate) fn stats(&self) -> HubStats {
        HubStats {
            senders: self.senders.len(),
            receivers: self.receivers.len(),
            records: self.records.len(),
            live_records: self.records.values().filter(|r| r.is_live()).count(),
        }
    }
}
