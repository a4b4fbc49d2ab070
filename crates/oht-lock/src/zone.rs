//! Deadlock-zone policy hook.
//!
//! Some layouts contain short cyclic sections where two vehicles queued on
//! each other's merges can stall forever.  The lock manager can break such a
//! stall by letting a vehicle *inside* the marked zone preempt a holder that
//! is outside it.  Which edges count as zone-internal is a property of the
//! map tooling, not of the kernel, so it arrives through this trait.

use oht_core::EdgeId;

/// Classifies edges as inside or outside a deadlock-relief zone.
pub trait DeadlockZonePolicy {
    /// `true` if `edge` lies inside a deadlock-relief zone.
    fn is_zone_internal(&self, edge: EdgeId) -> bool;
}

/// The default policy: no edge is zone-internal, preemption never fires.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoZones;

impl DeadlockZonePolicy for NoZones {
    #[inline]
    fn is_zone_internal(&self, _edge: EdgeId) -> bool {
        false
    }
}

/// A policy backed by an explicit edge list (host-configured zones).
#[derive(Clone, Debug, Default)]
pub struct EdgeListZones {
    edges: Vec<EdgeId>,
}

impl EdgeListZones {
    pub fn new(mut edges: Vec<EdgeId>) -> Self {
        edges.sort_unstable();
        edges.dedup();
        Self { edges }
    }
}

impl DeadlockZonePolicy for EdgeListZones {
    #[inline]
    fn is_zone_internal(&self, edge: EdgeId) -> bool {
        self.edges.binary_search(&edge).is_ok()
    }
}
