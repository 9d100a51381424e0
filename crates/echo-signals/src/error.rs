// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Emission failures.
//!
//! Duplicate connects and unmatched disconnects are not errors; those
//! operations report them through their `bool` return.

use thiserror::Error;

use crate::ident::{ObjectId, SignalId, SlotId};
use crate::slot::SlotError;

/// Error returned by [`SignalHub::emit`](crate::SignalHub::emit).
#[derive(Debug, Error)]
pub enum EmitError {
    /// A connected slot returned an error. Slots after it in connection order
    /// were not invoked by this emission.
    #[error("slot {slot} failed handling `{signal_name}` ({signal}) from {sender}: {source}")]
    SlotFailed {
        /// Signal being emitted.
        signal: SignalId,
        /// Diagnostic name of that signal.
        signal_name: &'static str,
        /// Sender the emission was for.
        sender: ObjectId,
        /// The failing slot.
        slot: SlotId,
        /// Error returned by the slot.
        #[source]
        source: SlotError,
    },
    /// Re-entrant emission on one sender nested deeper than the configured
    /// limit. No slot was invoked by the rejected emission.
    #[error("emission of `{signal_name}` on {sender} exceeded nesting depth {depth}")]
    DepthExceeded {
        /// Diagnostic name of the signal.
        signal_name: &'static str,
        /// Sender the emission was for.
        sender: ObjectId,
        /// Emissions already walking the sender's list.
        depth: u32,
    },
}

impl EmitError {
    /// Returns the failing slot for [`EmitError::SlotFailed`].
    pub fn slot(&self) -> Option<SlotId> {
        match self {
            Self::SlotFailed { slot, .. } => Some(*slot),
            Self::DepthExceeded { .. } => None,
        }
    }
}
