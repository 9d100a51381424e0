// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Hub tuning knobs.

/// Default nesting limit for re-entrant emission on a single sender.
pub const DEFAULT_MAX_EMIT_DEPTH: u32 = 256;

/// Configuration for a [`SignalHub`](crate::SignalHub).
///
/// Capacities are initial allocation hints only; every structure grows on
/// demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HubConfig {
    /// Initial capacity of the connection record arena.
    pub connection_capacity: usize,
    /// Initial capacity of the sender index.
    pub sender_capacity: usize,
    /// Initial capacity of the receiver index.
    pub receiver_capacity: usize,
    /// Maximum number of emissions that may be walking one sender's list at
    /// once. Emitting past it fails with
    /// [`EmitError::DepthExceeded`](crate::EmitError::DepthExceeded).
    /// A hub treats `0` as `1`: a top-level emission is always allowed.
    pub max_emit_depth: u32,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            connection_capacity: 64,
            sender_capacity: 16,
            receiver_capacity: 16,
            max_emit_depth: DEFAULT_MAX_EMIT_DEPTH,
        }
    }
}

impl HubConfig {
    /// Returns a copy with `max_emit_depth` replaced.
    pub fn with_max_emit_depth(mut self, depth: u32) -> Self {
        self.max_emit_depth = depth;
        self
    }
}
