// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(missing_docs)]
#![allow(clippy::expect_used, clippy::unwrap_used)]
mod common;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use common::{entries, log, recorder, Widget};
use echo_signals::{EmitError, HubConfig, ObjectId, Signal, SignalHub, Slot};

#[test]
fn slot_connected_during_emit_runs_only_on_next_emit() {
    let hub = SignalHub::new();
    let w = Rc::new(Widget::new());
    let log = log();
    let late = recorder(&log, "late");

    let weak = hub.downgrade();
    let (w2, log2, late2) = (Rc::clone(&w), Rc::clone(&log), late.clone());
    let adder = Slot::infallible(move |sender, _: &()| {
        log2.borrow_mut().push("adder".into());
        let hub = weak.upgrade().expect("hub alive");
        hub.connect(sender, &w2.changed, &late2, None);
    });
    hub.connect(w.id, &w.changed, &adder, None);

    w.emit_changed(&hub);
    assert_eq!(entries(&log), ["adder"]);
    assert!(hub.is_connected(w.id, &w.changed, &late, None));

    w.emit_changed(&hub);
    assert_eq!(entries(&log), ["adder", "adder", "late"]);
}

#[test]
fn slot_disconnected_during_emit_is_skipped_for_the_rest_of_it() {
    let hub = SignalHub::new();
    let w = Rc::new(Widget::new());
    let log = log();
    let victim = recorder(&log, "victim");

    let weak = hub.downgrade();
    let (w2, log2, victim2) = (Rc::clone(&w), Rc::clone(&log), victim.clone());
    let killer = Slot::infallible(move |sender, _: &()| {
        log2.borrow_mut().push("killer".into());
        let hub = weak.upgrade().expect("hub alive");
        assert!(hub.disconnect(sender, &w2.changed, &victim2, None));
    });
    hub.connect(w.id, &w.changed, &killer, None);
    hub.connect(w.id, &w.changed, &victim, None);

    w.emit_changed(&hub);
    assert_eq!(entries(&log), ["killer"]);
    assert_eq!(hub.connection_count(w.id), 1);
    // The dead slot was seen by the walk and reclaimed when it finished.
    assert_eq!(hub.stats().records, 1);
}

#[test]
fn slot_may_disconnect_itself() {
    let hub = SignalHub::new();
    let w = Rc::new(Widget::new());
    let count = Rc::new(Cell::new(0u32));

    let me: Rc<RefCell<Option<Slot<()>>>> = Rc::new(RefCell::new(None));
    let weak = hub.downgrade();
    let (w2, count2, me2) = (Rc::clone(&w), Rc::clone(&count), Rc::clone(&me));
    let once = Slot::infallible(move |sender, _: &()| {
        count2.set(count2.get() + 1);
        let hub = weak.upgrade().expect("hub alive");
        if let Some(slot) = me2.borrow_mut().take() {
            hub.disconnect(sender, &w2.changed, &slot, None);
        }
    });
    *me.borrow_mut() = Some(once.clone());
    hub.connect(w.id, &w.changed, &once, None);

    w.emit_changed(&hub);
    w.emit_changed(&hub);
    assert_eq!(count.get(), 1);
    assert_eq!(hub.stats().records, 0);
}

#[test]
fn nested_emit_on_same_sender_sees_its_own_snapshot() {
    let hub = SignalHub::new();
    let sender = ObjectId::fresh();
    let outer: Signal<()> = Signal::new("outer");
    let inner: Signal<()> = Signal::new("inner");
    let log = log();

    let weak = hub.downgrade();
    let log2 = Rc::clone(&log);
    let relay = Slot::infallible(move |sender, _: &()| {
        log2.borrow_mut().push("relay".into());
        let hub = weak.upgrade().expect("hub alive");
        assert!(hub.is_emitting(sender));
        hub.emit(sender, &inner, &()).expect("inner emit");
    });
    hub.connect(sender, &outer, &relay, None);
    hub.connect(sender, &inner, &recorder(&log, "inner"), None);
    hub.connect(sender, &outer, &recorder(&log, "after"), None);

    hub.emit(sender, &outer, &()).expect("outer emit");
    assert_eq!(entries(&log), ["relay", "inner", "after"]);
    assert!(!hub.is_emitting(sender));
}

#[test]
fn compaction_waits_for_outermost_emission() {
    let hub = SignalHub::new();
    let sender = ObjectId::fresh();
    let outer: Signal<()> = Signal::new("outer");
    let inner: Signal<()> = Signal::new("inner");
    let log = log();
    let doomed = recorder(&log, "doomed");

    let weak = hub.downgrade();
    let doomed2 = doomed.clone();
    let records_mid_walk = Rc::new(Cell::new(0usize));
    let probe = Rc::clone(&records_mid_walk);
    let driver = Slot::infallible(move |sender, _: &()| {
        let hub = weak.upgrade().expect("hub alive");
        hub.disconnect(sender, &inner, &doomed2, None);
        // The inner emission walks past the dead record but must not compact.
        hub.emit(sender, &inner, &()).expect("inner emit");
        probe.set(hub.stats().records);
        assert_eq!(hub.compact(sender), 0, "compaction refused mid-emission");
    });
    hub.connect(sender, &inner, &doomed, None);
    hub.connect(sender, &outer, &driver, None);

    hub.emit(sender, &outer, &()).expect("outer emit");
    assert!(entries(&log).is_empty());
    assert_eq!(records_mid_walk.get(), 2);
    // The outer walk saw the record live; the inner walk's sighting is what
    // gets it reclaimed once the outermost emission leaves.
    assert_eq!(hub.stats().records, 1);
}

#[test]
fn runaway_recursion_hits_the_depth_limit() {
    let hub = SignalHub::with_config(HubConfig::default().with_max_emit_depth(3));
    let sender = ObjectId::fresh();
    let sig: Signal<()> = Signal::new("echo");
    let depth = Rc::new(Cell::new(0u32));

    let weak = hub.downgrade();
    let depth2 = Rc::clone(&depth);
    let recurse = Slot::new(move |sender, _: &()| {
        depth2.set(depth2.get() + 1);
        let hub = weak.upgrade().expect("hub alive");
        hub.emit(sender, &sig, &())?;
        Ok(())
    });
    hub.connect(sender, &sig, &recurse, None);

    let err = hub.emit(sender, &sig, &()).unwrap_err();
    assert_eq!(depth.get(), 3);
    assert!(matches!(err, EmitError::SlotFailed { .. }));

    // Unwrap the chain down to the innermost rejection.
    let mut source: &(dyn std::error::Error + 'static) = &err;
    while let Some(next) = source.source() {
        source = next;
    }
    let innermost = source
        .downcast_ref::<EmitError>()
        .expect("innermost error is the depth rejection");
    assert!(matches!(innermost, EmitError::DepthExceeded { depth: 3, .. }));
    assert!(!hub.is_emitting(sender));
}

#[test]
fn sender_teardown_mid_emission_stops_remaining_slots() {
    let hub = SignalHub::new();
    let w = Widget::new();
    let log = log();

    let weak = hub.downgrade();
    let log2 = Rc::clone(&log);
    let teardown = Slot::infallible(move |sender, _: &()| {
        log2.borrow_mut().push("teardown".into());
        weak.upgrade().expect("hub alive").disconnect_sender(sender);
    });
    hub.connect(w.id, &w.changed, &teardown, None);
    hub.connect(w.id, &w.changed, &recorder(&log, "never"), None);

    w.emit_changed(&hub);
    assert_eq!(entries(&log), ["teardown"]);
    assert_eq!(hub.connection_count(w.id), 0);
    assert_eq!(hub.stats(), Default::default());
}

#[test]
fn reconnect_after_sender_teardown_mid_emission_uses_a_fresh_list() {
    let hub = SignalHub::new();
    let w = Rc::new(Widget::new());
    let log = log();
    let fresh = recorder(&log, "fresh");

    let weak = hub.downgrade();
    let (w2, fresh2) = (Rc::clone(&w), fresh.clone());
    let rewire = Slot::infallible(move |sender, _: &()| {
        let hub = weak.upgrade().expect("hub alive");
        hub.disconnect_sender(sender);
        hub.connect(sender, &w2.changed, &fresh2, None);
    });
    hub.connect(w.id, &w.changed, &rewire, None);
    hub.connect(w.id, &w.changed, &recorder(&log, "stale"), None);

    w.emit_changed(&hub);
    assert!(entries(&log).is_empty());
    assert_eq!(hub.stats().records, 1);

    w.emit_changed(&hub);
    assert_eq!(entries(&log), ["fresh"]);
}

#[test]
fn receiver_teardown_mid_emission_skips_its_later_slots() {
    let hub = SignalHub::new();
    let w = Widget::new();
    let listener = ObjectId::fresh();
    let log = log();

    let weak = hub.downgrade();
    let log2 = Rc::clone(&log);
    let leave = Slot::infallible(move |_, _: &()| {
        log2.borrow_mut().push("leave".into());
        weak.upgrade().expect("hub alive").disconnect_receiver(listener);
    });
    hub.connect(w.id, &w.changed, &leave, Some(listener));
    hub.connect(w.id, &w.changed, &recorder(&log, "listener"), Some(listener));
    hub.connect(w.id, &w.changed, &recorder(&log, "bystander"), None);

    w.emit_changed(&hub);
    assert_eq!(entries(&log), ["leave", "bystander"]);
    assert_eq!(hub.receiver_connection_count(listener), 0);
    assert_eq!(hub.connection_count(w.id), 1);
}

#[test]
fn emitting_another_sender_from_a_slot_is_independent() {
    let hub = SignalHub::new();
    let (a, b) = (Rc::new(Widget::new()), Rc::new(Widget::new()));
    let log = log();

    let weak = hub.downgrade();
    let b2 = Rc::clone(&b);
    let forward = Slot::infallible(move |_, _: &()| {
        b2.emit_changed(&weak.upgrade().expect("hub alive"));
    });
    hub.connect(a.id, &a.changed, &forward, None);
    hub.connect(b.id, &b.changed, &recorder(&log, "b"), None);

    a.emit_changed(&hub);
    assert_eq!(entries(&log), ["b"]);
    assert!(!hub.is_emitting(a.id) && !hub.is_emitting(b.id));
}
