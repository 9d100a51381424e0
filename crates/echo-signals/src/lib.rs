// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! echo-signals: in-process typed signal/slot engine.
//!
//! Objects declare [`Signal`]s; [`Slot`]s are connected to a signal on a
//! particular sender and run synchronously, in connection order, whenever
//! that sender emits it. Either side can be bulk-disconnected without
//! knowledge of the other.
//!
//! The [`SignalHub`] keeps two views over the same connection records: a
//! sender index (insertion-ordered list per sender, walked by `emit`) and a
//! receiver index (per-receiver chain, walked by receiver teardown). Slots
//! may connect, disconnect, and emit re-entrantly; an emission only ever sees
//! the connections that existed when it began, and skips any removed while
//! it runs.
//!
//! ```rust
//! use std::cell::RefCell;
//! use echo_signals::{ObjectId, Signal, SignalHub, Slot};
//!
//! let hub = SignalHub::new();
//! let button = ObjectId::fresh();
//! let clicked: Signal<RefCell<Vec<&'static str>>> = Signal::new("clicked");
//!
//! let foo = Slot::infallible(|_, out: &RefCell<Vec<&'static str>>| out.borrow_mut().push("foo"));
//! let bar = Slot::infallible(|_, out: &RefCell<Vec<&'static str>>| out.borrow_mut().push("bar"));
//! hub.connect(button, &clicked, &foo, None);
//! hub.connect(button, &clicked, &bar, None);
//!
//! let out = RefCell::new(Vec::new());
//! hub.emit(button, &clicked, &out).unwrap();
//! assert_eq!(*out.borrow(), ["foo", "bar"]);
//!
//! hub.clear_signal_data(button);
//! assert_eq!(hub.connection_count(button), 0);
//! ```
//!
//! There are no finalizers: owners call [`SignalHub::clear_signal_data`]
//! (or the sender/receiver variants) before discarding an object.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::missing_const_for_fn,
    clippy::redundant_pub_crate,
    clippy::module_name_repetitions,
    clippy::use_self
)]

mod arena;
mod bound;
mod config;
mod error;
mod hub;
mod ident;
mod registry;
mod signal;
mod slot;

pub use bound::BoundSignal;
pub use config::{HubConfig, DEFAULT_MAX_EMIT_DEPTH};
pub use error::EmitError;
pub use hub::{SignalHub, WeakSignalHub};
pub use ident::{ObjectId, ReceiverId, SignalId, SlotId};
pub use registry::HubStats;
pub use signal::Signal;
pub use slot::{Slot, SlotError, SlotResult};
