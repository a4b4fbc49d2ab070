//! The lock manager: merge-node mutual exclusion with deterministic,
//! progress-preserving behaviour.
//!
//! # Protocol
//!
//! A vehicle approaching a merge crosses its `LOCK_REQUEST` checkpoint and
//! joins the merge's FIFO queue; the queue head is always the holder.  At
//! the `LOCK_WAIT` checkpoint the vehicle either passes (it holds the merge,
//! or nobody does) or is force-stopped until the holder changes.  Release is
//! geometric: requesting registers a `(node, post-merge edge)` pair, and the
//! moment the vehicle's `current_edge` equals that trigger edge the lock is
//! released — whether noticed by the motion integrator's transition hook or
//! by the per-tick sweep.  A `LOCK_RELEASE` checkpoint on the post-merge
//! edge backstops both.
//!
//! # Catch-up
//!
//! Checkpoints a vehicle flew past (a short edge crossed in one tick, or a
//! truncated checkpoint list) are still executed when discovered — except
//! `LOCK_WAIT`, which is pointless once the wait point is behind the
//! vehicle.  Actions bind to the checkpoint's `target` edge rather than the
//! vehicle's current position, so a late `LOCK_REQUEST` still queues on the
//! right merge.
//!
//! All operations are total: ids that resolve to no merge pass through
//! silently, missing checkpoint data logs and never panics.

use std::collections::VecDeque;

use rustc_hash::FxHashMap;
use tracing::debug;

use oht_core::{Checkpoint, CheckpointFlags, EdgeId, NodeId, VehicleId};
use oht_graph::RailGraph;
use oht_vehicle::{MovingStatus, NextEdgeState, StopReason, TrafficState, VehicleStore, LOOKAHEAD_SLOTS};

use crate::zone::DeadlockZonePolicy;

/// Bound on checkpoints processed per vehicle per tick.  Keeps a corrupted
/// checkpoint list from wedging the tick; ten is far beyond what geometric
/// progress can produce.
const CATCH_UP_LIMIT: usize = 10;

// ── MergeLock ─────────────────────────────────────────────────────────────────

/// Per-merge-node grant state.  Invariant: when `holder` is set it equals
/// `queue[0]`; when it is `None` the queue is empty.
#[derive(Default, Debug)]
struct MergeLock {
    holder: Option<VehicleId>,
    queue: VecDeque<VehicleId>,
}

// ── Snapshot ──────────────────────────────────────────────────────────────────

/// Introspection view of one merge node's lock state.
#[derive(Clone, Debug)]
pub struct LockSnapshot {
    pub node: String,
    pub holder: Option<VehicleId>,
    /// Edge the holder currently occupies (`NONE` when no holder).
    pub holder_edge: EdgeId,
    /// Queued vehicles (holder first) with their current edges.
    pub waiters: Vec<(VehicleId, EdgeId)>,
}

// ── LockManager ───────────────────────────────────────────────────────────────

/// Merge-lock tables and the per-tick checkpoint processor for one fab.
pub struct LockManager<Z: DeadlockZonePolicy> {
    zone: Z,
    locks: FxHashMap<NodeId, MergeLock>,
    /// Auto-release registry: vehicle → `(node, trigger edge)` pairs.
    pending: FxHashMap<VehicleId, Vec<(NodeId, EdgeId)>>,
    /// Reused per-sweep scratch of nodes to release.
    fired: Vec<NodeId>,
}

impl<Z: DeadlockZonePolicy> LockManager<Z> {
    pub fn new(zone: Z) -> Self {
        Self {
            zone,
            locks: FxHashMap::default(),
            pending: FxHashMap::default(),
            fired: Vec::new(),
        }
    }

    // ── Per-tick entry point ──────────────────────────────────────────────

    /// Run one tick of lock processing: the auto-release sweep followed by
    /// per-vehicle checkpoint processing in ascending id order.
    pub fn update_all(&mut self, store: &mut VehicleStore, graph: &RailGraph) {
        self.sweep_auto_releases(store);
        for v in 0..store.count as u32 {
            self.process_vehicle(VehicleId(v), store, graph);
        }
    }

    // ── Auto-release sweep ────────────────────────────────────────────────

    /// Fire every registered `(node, trigger)` pair whose trigger edge the
    /// vehicle has reached: holders release (promoting the next in line),
    /// queued non-holders are cancelled.
    pub fn sweep_auto_releases(&mut self, store: &mut VehicleStore) {
        for vi in 0..store.count {
            let veh = VehicleId(vi as u32);
            let cur = store.current_edge[vi];
            let Some(entries) = self.pending.get_mut(&veh) else { continue };

            self.fired.clear();
            entries.retain(|&(node, trigger)| {
                if trigger == cur {
                    self.fired.push(node);
                    false
                } else {
                    true
                }
            });
            if entries.is_empty() {
                self.pending.remove(&veh);
            }
            // `fired` is owned scratch; entries borrow is over.
            let fired = std::mem::take(&mut self.fired);
            for &node in &fired {
                self.release_or_cancel(node, veh, store);
            }
            self.fired = fired;
        }
    }

    /// Transition hook called by the motion integrator when a vehicle
    /// crosses a merge node: fires that node's auto-release immediately
    /// instead of waiting for the next sweep.
    pub fn notify_merge_crossed(&mut self, veh: VehicleId, node: NodeId, store: &mut VehicleStore) {
        if let Some(entries) = self.pending.get_mut(&veh) {
            entries.retain(|&(n, _)| n != node);
            if entries.is_empty() {
                self.pending.remove(&veh);
            }
        }
        self.release_or_cancel(node, veh, store);
    }

    /// Remove a vehicle from every queue and registry (route cleared or
    /// vehicle torn down).  Held merges are released and handed on.
    pub fn clear_vehicle(&mut self, veh: VehicleId, store: &mut VehicleStore) {
        self.pending.remove(&veh);
        let nodes: Vec<NodeId> = self
            .locks
            .iter()
            .filter(|(_, l)| l.queue.contains(&veh))
            .map(|(&n, _)| n)
            .collect();
        for node in nodes {
            self.release_or_cancel(node, veh, store);
        }
        if store.contains(veh) {
            store.traffic_state[veh.index()] = TrafficState::Free;
            store.stop_reason[veh.index()].remove(StopReason::LOCKED);
        }
    }

    fn release_or_cancel(&mut self, node: NodeId, veh: VehicleId, store: &mut VehicleStore) {
        let Some(lock) = self.locks.get_mut(&node) else { return };
        if lock.holder == Some(veh) {
            lock.queue.pop_front();
            lock.holder = lock.queue.front().copied();
            if let Some(next) = lock.holder {
                if store.contains(next) {
                    store.traffic_state[next.index()] = TrafficState::Acquired;
                }
            }
        } else if let Some(pos) = lock.queue.iter().position(|&q| q == veh) {
            lock.queue.remove(pos);
        }
    }

    // ── Checkpoint processing ─────────────────────────────────────────────

    /// Walk one vehicle's checkpoints up to its geometric cursor, applying
    /// flag effects, with bounded catch-up for overflown edges.
    fn process_vehicle(&mut self, veh: VehicleId, store: &mut VehicleStore, graph: &RailGraph) {
        let i = veh.index();
        for _ in 0..CATCH_UP_LIMIT {
            if store.current_cp[i].is_none() {
                let head = store.cp_head[i];
                if head >= store.checkpoints[i].len() {
                    return; // route fully processed
                }
                store.current_cp[i] = store.checkpoints[i][head];
                store.cp_head[i] = head + 1;
            }

            let cp = store.current_cp[i];
            let cur = store.current_edge[i];

            if cp.edge != cur {
                if store.path[i].contains(cp.edge) {
                    return; // still ahead of the vehicle
                }
                // Missed: the edge was overflown.  Execute everything except
                // the wait — the wait point is already behind the vehicle.
                debug!(veh = %veh, edge = %cp.edge, target = %cp.target, "catching up missed checkpoint");
                self.execute_flags(veh, cp, store, graph, false);
                store.current_cp[i] = Checkpoint::NONE;
                continue;
            }

            if store.edge_ratio[i] < cp.ratio {
                return; // not reached yet
            }

            let blocked = self.execute_flags(veh, cp, store, graph, true);
            if blocked {
                return; // held at the wait point; re-evaluated next tick
            }
            store.current_cp[i] = Checkpoint::NONE;
        }
    }

    /// Apply a checkpoint's pending flags in protocol order, clearing each
    /// bit as it executes.  Returns `true` when the vehicle is blocked on a
    /// `LOCK_WAIT` (the wait bit is left set for re-evaluation).
    fn execute_flags(
        &mut self,
        veh: VehicleId,
        cp: Checkpoint,
        store: &mut VehicleStore,
        graph: &RailGraph,
        include_wait: bool,
    ) -> bool {
        let i = veh.index();
        let mut flags = cp.flags;

        if flags.contains(CheckpointFlags::MOVE_PREPARE) {
            self.apply_move_prepare(veh, cp.target, store);
            flags.remove(CheckpointFlags::MOVE_PREPARE);
        }
        if flags.contains(CheckpointFlags::LOCK_RELEASE) {
            self.apply_lock_release(veh, cp.target, store, graph);
            flags.remove(CheckpointFlags::LOCK_RELEASE);
        }
        if flags.contains(CheckpointFlags::LOCK_REQUEST) {
            self.apply_lock_request(veh, cp.target, store, graph);
            flags.remove(CheckpointFlags::LOCK_REQUEST);
        }
        if flags.contains(CheckpointFlags::LOCK_WAIT) {
            if include_wait {
                if self.apply_lock_wait(veh, cp.target, store, graph) {
                    // Still blocked: persist the cleared non-wait bits and
                    // keep the wait bit for next tick.
                    store.current_cp[i].flags = flags;
                    return true;
                }
            }
            flags.remove(CheckpointFlags::LOCK_WAIT);
        }

        store.current_cp[i].flags = flags;
        false
    }

    // ── Flag handlers ─────────────────────────────────────────────────────

    /// Fill the lookahead slots from the path buffer up to and including
    /// `target`; zero the rest.
    fn apply_move_prepare(&mut self, veh: VehicleId, target: EdgeId, store: &mut VehicleStore) {
        let i = veh.index();
        let mut slots = [EdgeId::NONE; LOOKAHEAD_SLOTS];
        let mut n = 0;
        for &e in store.path[i].as_slice() {
            if n == LOOKAHEAD_SLOTS {
                break;
            }
            slots[n] = e;
            n += 1;
            if e == target {
                break;
            }
        }
        store.next_edges[i] = slots;
        store.next_edge_state[i] = if slots[0].is_some() {
            NextEdgeState::Ready
        } else {
            NextEdgeState::Empty
        };
    }

    /// Join the queue for the merge ahead of `target`; first in an empty
    /// house becomes holder outright.  Registers the geometric auto-release.
    fn apply_lock_request(
        &mut self,
        veh: VehicleId,
        target: EdgeId,
        store: &mut VehicleStore,
        graph: &RailGraph,
    ) {
        let Some(node) = graph.merge_node_of(target) else { return };

        let lock = self.locks.entry(node).or_default();
        if !lock.queue.contains(&veh) {
            lock.queue.push_back(veh);
        }
        if lock.holder.is_none() {
            lock.holder = lock.queue.front().copied();
        }
        store.traffic_state[veh.index()] = if lock.holder == Some(veh) {
            TrafficState::Acquired
        } else {
            TrafficState::Waiting
        };

        let entries = self.pending.entry(veh).or_default();
        if !entries.contains(&(node, target)) {
            entries.push((node, target));
        }
    }

    /// Release the merge behind `target` if this vehicle still holds it.
    /// A no-op when the geometric auto-release already fired.
    fn apply_lock_release(
        &mut self,
        veh: VehicleId,
        target: EdgeId,
        store: &mut VehicleStore,
        graph: &RailGraph,
    ) {
        let Some(node) = graph.merge_node_of(target) else { return };
        if let Some(entries) = self.pending.get_mut(&veh) {
            entries.retain(|&(n, _)| n != node);
            if entries.is_empty() {
                self.pending.remove(&veh);
            }
        }
        if self.locks.get(&node).is_some_and(|l| l.holder == Some(veh)) {
            self.release_or_cancel(node, veh, store);
        }
    }

    /// Evaluate the waiting point.  Returns `true` when the vehicle must
    /// hold (another vehicle owns the merge and no preemption applies).
    fn apply_lock_wait(
        &mut self,
        veh: VehicleId,
        target: EdgeId,
        store: &mut VehicleStore,
        graph: &RailGraph,
    ) -> bool {
        let i = veh.index();
        let Some(node) = graph.merge_node_of(target) else { return false };

        let holder = self.locks.get(&node).and_then(|l| l.holder);
        match holder {
            Some(h) if h != veh => {
                // Deadlock-zone preemption: a vehicle physically inside the
                // zone outranks a holder outside it.
                let self_inside = self.zone.is_zone_internal(store.current_edge[i]);
                let holder_inside =
                    store.contains(h) && self.zone.is_zone_internal(store.current_edge[h.index()]);
                if self_inside && !holder_inside {
                    debug!(veh = %veh, from = %h, "deadlock-zone preemption");
                    if let Some(lock) = self.locks.get_mut(&node) {
                        if let Some(pos) = lock.queue.iter().position(|&q| q == veh) {
                            lock.queue.remove(pos);
                        }
                        lock.queue.push_front(veh);
                        lock.holder = Some(veh);
                    }
                    store.traffic_state[i] = TrafficState::Acquired;
                    self.grant(veh, store);
                    return false;
                }

                store.velocity[i] = 0.0;
                store.moving_status[i] = MovingStatus::Stopped;
                store.stop_reason[i] |= StopReason::LOCKED;
                store.traffic_state[i] = TrafficState::Waiting;
                true
            }
            _ => {
                // Holder is self or nobody: pass.
                if holder == Some(veh) {
                    store.traffic_state[i] = TrafficState::Acquired;
                }
                self.grant(veh, store);
                false
            }
        }
    }

    fn grant(&mut self, veh: VehicleId, store: &mut VehicleStore) {
        let i = veh.index();
        store.stop_reason[i].remove(StopReason::LOCKED);
        store.moving_status[i] = MovingStatus::Moving;
    }

    // ── Introspection ─────────────────────────────────────────────────────

    pub fn holder_of(&self, node: NodeId) -> Option<VehicleId> {
        self.locks.get(&node).and_then(|l| l.holder)
    }

    pub fn queue_of(&self, node: NodeId) -> Vec<VehicleId> {
        self.locks
            .get(&node)
            .map(|l| l.queue.iter().copied().collect())
            .unwrap_or_default()
    }

    /// `true` if the vehicle has a registered auto-release for `node`.
    pub fn has_pending_release(&self, veh: VehicleId, node: NodeId) -> bool {
        self.pending
            .get(&veh)
            .is_some_and(|entries| entries.iter().any(|&(n, _)| n == node))
    }

    /// Deterministic (name-ordered) view of every non-empty merge lock.
    pub fn snapshot(&self, store: &VehicleStore, graph: &RailGraph) -> Vec<LockSnapshot> {
        let edge_of = |veh: VehicleId| {
            if store.contains(veh) {
                store.current_edge[veh.index()]
            } else {
                EdgeId::NONE
            }
        };
        let mut out: Vec<LockSnapshot> = self
            .locks
            .iter()
            .filter(|(_, l)| l.holder.is_some() || !l.queue.is_empty())
            .map(|(&node, l)| LockSnapshot {
                node: graph.node_name(node).to_owned(),
                holder: l.holder,
                holder_edge: l.holder.map(edge_of).unwrap_or(EdgeId::NONE),
                waiters: l.queue.iter().map(|&v| (v, edge_of(v))).collect(),
            })
            .collect();
        out.sort_by(|a, b| a.node.cmp(&b.node));
        out
    }

    /// Invariant check used by tests: every holder heads its own queue, and
    /// a holderless lock has an empty queue.
    pub fn queues_are_consistent(&self) -> bool {
        self.locks.values().all(|l| match l.holder {
            Some(h) => l.queue.front() == Some(&h),
            None    => l.queue.is_empty(),
        })
    }
}
