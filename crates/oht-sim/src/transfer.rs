//! The transfer manager: command intake, path buffers, and lookahead refills.
//!
//! Everything that *writes* a vehicle's route goes through here: multi-edge
//! path plans, single-next-edge reservations, and same-edge target moves.
//! Command validation is strict and silent — a plan that is not connected
//! edge-to-edge from the vehicle's current position is dropped whole, with a
//! `debug!` event and no state change.
//!
//! The manager also services the motion integrator's refill requests:
//! vehicles that entered an edge with an empty lookahead are flagged
//! `Pending` during motion and topped up from their path buffer after
//! motion, in the same tick.

use std::collections::VecDeque;

use tracing::debug;

use oht_core::{Checkpoint, EdgeId, SimParams, VehicleId};
use oht_graph::RailGraph;
use oht_route::build_route_checkpoints;
use oht_vehicle::{MovingStatus, NextEdgeState, StopReason, VehicleStore, LOOKAHEAD_SLOTS};

// ── Command ───────────────────────────────────────────────────────────────────

/// One step of a multi-edge plan.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PathStep {
    pub edge: EdgeId,
    /// Stop position on this edge; only the final step's value is honoured.
    pub target_ratio: Option<f32>,
}

impl PathStep {
    pub fn new(edge: EdgeId) -> Self {
        Self { edge, target_ratio: None }
    }

    pub fn with_target(edge: EdgeId, ratio: f32) -> Self {
        Self { edge, target_ratio: Some(ratio) }
    }
}

/// A runtime movement command for one vehicle.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Multi-edge plan.  May start with the vehicle's current edge (it is
    /// stripped); every following step must be `next_edges`-connected.
    Path(Vec<PathStep>),
    /// Reserve a single next edge, appended once it connects to the route
    /// tail.
    NextEdge { edge: EdgeId, target_ratio: Option<f32> },
    /// Move along the current edge to `ratio` without changing the route.
    TargetRatio { ratio: f32 },
}

// ── TransferManager ───────────────────────────────────────────────────────────

/// Per-fab command and path-buffer owner.
pub struct TransferManager {
    params: SimParams,
    /// Reserved single edges per vehicle, merged into the path buffer during
    /// the post-motion drain.
    reservations: Vec<VecDeque<(EdgeId, Option<f32>)>>,
    /// Vehicles flagged by the motion integrator as needing a lookahead
    /// refill this tick.
    pub(crate) refill_queue: Vec<VehicleId>,
}

impl TransferManager {
    pub fn new(vehicle_count: usize, params: SimParams) -> Self {
        Self {
            params,
            reservations: vec![VecDeque::new(); vehicle_count],
            refill_queue: Vec::new(),
        }
    }

    /// `true` when the vehicle has neither queued path edges nor reserved
    /// edges — the auto-router's definition of "idle".
    pub fn is_idle(&self, veh: VehicleId, store: &VehicleStore) -> bool {
        !store.has_path(veh) && self.reservations[veh.index()].is_empty()
    }

    pub fn reserved_len(&self, veh: VehicleId) -> usize {
        self.reservations[veh.index()].len()
    }

    /// Forget the vehicle's reserved edges (route teardown).
    pub fn clear_vehicle(&mut self, veh: VehicleId) {
        if let Some(q) = self.reservations.get_mut(veh.index()) {
            q.clear();
        }
        self.refill_queue.retain(|&v| v != veh);
    }

    // ── Command intake ────────────────────────────────────────────────────

    /// Validate and apply `command`.  Invalid commands drop silently.
    pub fn assign_command(
        &mut self,
        veh: VehicleId,
        command: Command,
        store: &mut VehicleStore,
        graph: &RailGraph,
    ) {
        if !store.contains(veh) {
            debug!(veh = %veh, "command for unknown vehicle dropped");
            return;
        }
        match command {
            Command::Path(steps) => self.assign_path(veh, steps, store, graph),
            Command::NextEdge { edge, target_ratio } => {
                self.reservations[veh.index()].push_back((edge, target_ratio));
            }
            Command::TargetRatio { ratio } => {
                if !(0.0..=1.0).contains(&ratio) {
                    debug!(veh = %veh, ratio, "target ratio out of range; dropped");
                    return;
                }
                store.target_ratio[veh.index()] = ratio;
                wake(store, veh);
            }
        }
    }

    fn assign_path(
        &mut self,
        veh: VehicleId,
        steps: Vec<PathStep>,
        store: &mut VehicleStore,
        graph: &RailGraph,
    ) {
        let i = veh.index();
        let current = store.current_edge[i];
        if current.is_none() {
            debug!(veh = %veh, "path command for unplaced vehicle dropped");
            return;
        }

        // Connectivity check, walking from the current edge.  A leading step
        // equal to the current edge is tolerated and stripped.
        let mut edges: Vec<EdgeId> = Vec::with_capacity(steps.len());
        let mut final_ratio: Option<f32> = None;
        let mut prev = current;
        for (k, step) in steps.iter().enumerate() {
            if k == 0 && step.edge == current {
                final_ratio = step.target_ratio;
                continue;
            }
            if !graph.contains_edge(step.edge) || !graph.next_of(prev).contains(&step.edge) {
                debug!(veh = %veh, from = %prev, to = %step.edge, "disconnected path command dropped");
                return;
            }
            edges.push(step.edge);
            prev = step.edge;
            final_ratio = step.target_ratio;
        }
        if edges.len() > self.params.max_path_length {
            debug!(veh = %veh, len = edges.len(), "path exceeds buffer capacity; dropped");
            return;
        }
        if edges.is_empty() {
            // Same-edge plan: degenerate to a target-ratio move.
            if let Some(r) = final_ratio {
                store.target_ratio[i] = r.clamp(0.0, 1.0);
                wake(store, veh);
            }
            return;
        }

        self.install_route(veh, &edges, final_ratio, store, graph);
    }

    /// Write the route into the vehicle: path buffer, lookahead,
    /// checkpoints, destination — then wake it.
    fn install_route(
        &mut self,
        veh: VehicleId,
        edges: &[EdgeId],
        final_ratio: Option<f32>,
        store: &mut VehicleStore,
        graph: &RailGraph,
    ) {
        let i = veh.index();
        store.path[i].assign(edges);
        store.path_remaining[i] = edges.len() as u32;
        store.destination_edge[i] = edges[edges.len() - 1];
        store.target_ratio[i] = final_ratio.unwrap_or(1.0).clamp(0.0, 1.0);

        fill_lookahead(store, veh);

        // Checkpoints run over the occupied edge plus the new route.
        let mut full = Vec::with_capacity(edges.len() + 1);
        full.push(store.current_edge[i]);
        full.extend_from_slice(edges);
        store.checkpoints[i] = build_route_checkpoints(graph, &self.params, &full);
        store.cp_head[i] = 0;
        store.current_cp[i] = Checkpoint::NONE;

        wake(store, veh);
    }

    // ── Post-motion processing ────────────────────────────────────────────

    /// Drain refill requests and merge matured reservations.  Runs after
    /// motion, so a vehicle stalled at an edge end gets its lookahead the
    /// same tick.
    pub fn process_pending(&mut self, store: &mut VehicleStore, graph: &RailGraph) {
        let refills = std::mem::take(&mut self.refill_queue);
        for veh in refills {
            if store.contains(veh) && store.next_edge_state[veh.index()] == NextEdgeState::Pending {
                fill_lookahead(store, veh);
            }
        }

        for v in 0..store.count as u32 {
            let veh = VehicleId(v);
            if !self.reservations[veh.index()].is_empty() {
                self.drain_reservations(veh, store, graph);
            }
        }
    }

    /// Append reserved edges that connect to the route tail; drop the rest.
    fn drain_reservations(&mut self, veh: VehicleId, store: &mut VehicleStore, graph: &RailGraph) {
        let i = veh.index();
        let mut appended = false;
        let mut final_ratio = None;
        while let Some((edge, ratio)) = self.reservations[i].pop_front() {
            let tail = if store.path[i].is_empty() {
                store.current_edge[i]
            } else {
                store.path[i].last()
            };
            if tail.is_none()
                || !graph.contains_edge(edge)
                || !graph.next_of(tail).contains(&edge)
                || !store.path[i].push(edge)
            {
                debug!(veh = %veh, edge = %edge, "unconnectable reserved edge dropped");
                continue;
            }
            appended = true;
            final_ratio = ratio;
        }
        if !appended {
            return;
        }

        let path: Vec<EdgeId> = store.path[i].as_slice().to_vec();
        self.install_route(veh, &path, final_ratio.or(Some(store.target_ratio[i])), store, graph);
    }
}

// ── Shared helpers ────────────────────────────────────────────────────────────

/// Load the lookahead slots from the front of the path buffer.
fn fill_lookahead(store: &mut VehicleStore, veh: VehicleId) {
    let i = veh.index();
    let mut slots = [EdgeId::NONE; LOOKAHEAD_SLOTS];
    for (slot, &e) in slots.iter_mut().zip(store.path[i].as_slice()) {
        *slot = e;
    }
    store.next_edges[i] = slots;
    store.next_edge_state[i] = if slots[0].is_some() {
        NextEdgeState::Ready
    } else {
        NextEdgeState::Empty
    };
}

/// Resume a vehicle unless some stop reason still pins it.
fn wake(store: &mut VehicleStore, veh: VehicleId) {
    let i = veh.index();
    if store.moving_status[i] == MovingStatus::Stopped && store.stop_reason[i] == StopReason::empty()
    {
        store.moving_status[i] = MovingStatus::Moving;
    }
}
