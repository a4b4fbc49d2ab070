//! Checkpoint records — the data-driven merge-safety protocol.
//!
//! A checkpoint is a per-vehicle `(edge, ratio, flags, target)` record laid
//! down at route-assignment time.  As the vehicle's geometric cursor crosses
//! a checkpoint, the lock manager applies the flagged effects.  What would
//! otherwise be per-vehicle control flow ("request the merge → wait for the
//! grant → pass → release") is encoded as this flat sequence, which also
//! survives a vehicle overshooting a short edge in one tick: the actions are
//! bound to `target`, not to wherever the vehicle happens to stand when they
//! are caught up.

use crate::EdgeId;

bitflags::bitflags! {
    /// Effects a checkpoint carries.  One checkpoint may legitimately combine
    /// several (e.g. `MOVE_PREPARE | LOCK_REQUEST` on the approach to a merge).
    ///
    /// Processing order is fixed: `MOVE_PREPARE`, `LOCK_RELEASE`,
    /// `LOCK_REQUEST`, `LOCK_WAIT`.
    #[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct CheckpointFlags: u8 {
        /// Load the lookahead slots from the path buffer up to `target`.
        const MOVE_PREPARE = 1 << 0;
        /// Enqueue for the merge ahead of `target`; register auto-release.
        const LOCK_REQUEST = 1 << 1;
        /// Stop here unless this vehicle holds the merge ahead of `target`.
        const LOCK_WAIT    = 1 << 2;
        /// Release the merge behind `target` if this vehicle still holds it.
        const LOCK_RELEASE = 1 << 3;
    }
}

/// One checkpoint on a vehicle's route.
///
/// `edge == EdgeId::NONE` doubles as the "no checkpoint loaded" state of a
/// vehicle's materialized current-checkpoint slot.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Checkpoint {
    /// Edge on which the checkpoint fires.
    pub edge: EdgeId,
    /// Position on `edge` at which it fires, in `[0, 1]`.
    pub ratio: f32,
    /// Effects still pending.  Bits are cleared as they are applied.
    pub flags: CheckpointFlags,
    /// The edge *after* the merge this checkpoint serves.  All flag handlers
    /// key on this, so catch-up after an overshot edge stays semantically
    /// attached to the right merge.
    pub target: EdgeId,
}

impl Checkpoint {
    /// The cleared slot value.
    pub const NONE: Checkpoint = Checkpoint {
        edge:   EdgeId::NONE,
        ratio:  0.0,
        flags:  CheckpointFlags::empty(),
        target: EdgeId::NONE,
    };

    #[inline]
    pub fn is_none(&self) -> bool {
        self.edge.is_none()
    }
}
