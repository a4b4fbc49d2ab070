//! Per-vehicle control-state enums and flag sets.

// ── MovingStatus ──────────────────────────────────────────────────────────────

/// Whether the integrator advances this vehicle.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MovingStatus {
    Moving,
    #[default]
    Stopped,
    /// Host-requested hold; the kernel never enters or leaves this state on
    /// its own.
    Paused,
}

// ── NextEdgeState ─────────────────────────────────────────────────────────────

/// Fill state of the 5-slot lookahead buffer.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NextEdgeState {
    /// No next edge loaded.
    #[default]
    Empty,
    /// A refill was requested from the transfer manager this tick.
    Pending,
    /// Slot 0 holds the edge to transition onto.
    Ready,
}

// ── TrafficState ──────────────────────────────────────────────────────────────

/// Where the vehicle stands in the merge protocol for its upcoming merge.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TrafficState {
    /// Not involved with any merge right now.
    #[default]
    Free,
    /// Queued on a merge another vehicle holds.
    Waiting,
    /// Holder of the merge ahead.
    Acquired,
}

// ── HitZone ───────────────────────────────────────────────────────────────────

/// Proximity classification written by the (external) sensor subsystem.
///
/// The wire values are the original sensor codes: -1 no contact, 0 approach,
/// 1 brake, 2 stop.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(i8)]
pub enum HitZone {
    #[default]
    None = -1,
    Approach = 0,
    Brake = 1,
    Stop = 2,
}

impl HitZone {
    /// `true` for any zone that demands deceleration (code ≥ 0).
    #[inline]
    pub fn is_contact(self) -> bool {
        self != HitZone::None
    }

    #[inline]
    pub fn is_stop(self) -> bool {
        self == HitZone::Stop
    }

    /// Decode a raw sensor code; unknown codes read as no contact.
    pub fn from_code(code: i8) -> Self {
        match code {
            0 => HitZone::Approach,
            1 => HitZone::Brake,
            2 => HitZone::Stop,
            _ => HitZone::None,
        }
    }
}

// ── StopReason ────────────────────────────────────────────────────────────────

bitflags::bitflags! {
    /// Why a vehicle is currently held at zero velocity.  Independent causes
    /// are independent bits; the vehicle moves again only when the owning
    /// subsystem clears its bit.
    #[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct StopReason: u8 {
        /// Held at a waiting point by the lock manager.
        const LOCKED   = 1 << 0;
        /// Held by the sensor stop zone.
        const SENSORED = 1 << 1;
    }
}
