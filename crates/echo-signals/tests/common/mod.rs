// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use echo_signals::{ObjectId, Signal, SignalHub, Slot};

/// Shared append-only log slots write into.
pub type Log = Rc<RefCell<Vec<String>>>;

/// Payload type of signals whose slots append to the emitted list.
pub type Sink = RefCell<Vec<&'static str>>;

pub fn log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

pub fn entries(log: &Log) -> Vec<String> {
    log.borrow().clone()
}

/// Slot that records `label` into `log` on every invocation.
pub fn recorder(log: &Log, label: &str) -> Slot<()> {
    let log = Rc::clone(log);
    let label = label.to_owned();
    Slot::infallible(move |_, _: &()| log.borrow_mut().push(label.clone()))
}

/// Slot that appends `word` to the emitted sink.
pub fn appender(word: &'static str) -> Slot<Sink> {
    Slot::infallible(move |_, out: &Sink| out.borrow_mut().push(word))
}

/// A sender that declares its signals as fields, the way UI objects do.
pub struct Widget {
    pub id: ObjectId,
    pub changed: Signal<()>,
    pub three: Signal<Sink>,
}

impl Widget {
    pub fn new() -> Self {
        Self {
            id: ObjectId::fresh(),
            changed: Signal::new("changed"),
            three: Signal::new("three"),
        }
    }

    pub fn emit_changed(&self, hub: &SignalHub) {
        hub.emit(self.id, &self.changed, &())
            .expect("changed slots are infallible");
    }
}
