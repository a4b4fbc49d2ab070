//! `VehicleStore` — dense column-oriented storage for all per-vehicle state.
//!
//! Every `Vec` field has exactly `count` elements; the `VehicleId` value is
//! the index into all of them, so motion integration is a tight loop with
//! predictable memory access:
//!
//! ```ignore
//! let ratio = store.edge_ratio[veh.index()];  // O(1), cache-friendly
//! ```
//!
//! The store owns no behaviour.  Each column has exactly one writing
//! subsystem (the integrator owns kinematics, the lock manager owns
//! `stop_reason::LOCKED`, the transfer manager owns the path buffer, …);
//! the store is the shared substrate they all index into.

use oht_core::{Checkpoint, EdgeId, Pose, VehicleId};

use crate::path::PathBuffer;
use crate::state::{HitZone, MovingStatus, NextEdgeState, StopReason, TrafficState};

/// Number of lookahead slots per vehicle (`next_edge_0..4`).
pub const LOOKAHEAD_SLOTS: usize = 5;

/// All per-vehicle state, one column per field.
pub struct VehicleStore {
    /// Number of vehicles.  Equals the length of every column.
    pub count: usize,

    // ── Kinematics ────────────────────────────────────────────────────────
    /// Interpolated world pose, written back by the integrator each tick.
    pub pose: Vec<Pose>,
    /// Current speed (m/s), ≥ 0.
    pub velocity: Vec<f32>,
    /// Base acceleration (m/s²) for this vehicle on linear rail.
    pub acceleration: Vec<f32>,
    /// Base service deceleration (m/s²).
    pub deceleration: Vec<f32>,
    pub moving_status: Vec<MovingStatus>,

    // ── Position on the graph ─────────────────────────────────────────────
    /// Occupied edge; `EdgeId::NONE` when unplaced.
    pub current_edge: Vec<EdgeId>,
    /// Position along `current_edge` in `[0, 1]`.
    pub edge_ratio: Vec<f32>,
    /// Lookahead buffer; slot 0 is the edge to transition onto.
    pub next_edges: Vec<[EdgeId; LOOKAHEAD_SLOTS]>,
    pub next_edge_state: Vec<NextEdgeState>,
    /// Stop position on the final path edge.
    pub target_ratio: Vec<f32>,

    // ── Path buffer ───────────────────────────────────────────────────────
    pub path: Vec<PathBuffer>,

    // ── Checkpoint cursor ─────────────────────────────────────────────────
    /// Route checkpoints in path order, rebuilt on every route assignment.
    pub checkpoints: Vec<Vec<Checkpoint>>,
    /// Index of the next unread entry in `checkpoints`.
    pub cp_head: Vec<usize>,
    /// Materialized checkpoint under processing; `edge == NONE` means none
    /// loaded.
    pub current_cp: Vec<Checkpoint>,

    // ── Control state ─────────────────────────────────────────────────────
    pub stop_reason: Vec<StopReason>,
    pub traffic_state: Vec<TrafficState>,
    /// Written by the external sensor subsystem between ticks.
    pub hit_zone: Vec<HitZone>,
    /// Curve pre-brake engaged (integrator-owned).
    pub pre_brake: Vec<bool>,

    // ── Destination ───────────────────────────────────────────────────────
    pub destination_edge: Vec<EdgeId>,
    /// Edges left to traverse, maintained on transitions.
    pub path_remaining: Vec<u32>,
}

impl VehicleStore {
    /// Allocate columns for `count` vehicles with path buffers of
    /// `path_capacity` edges.  All vehicles start unplaced and stopped.
    pub fn new(count: usize, path_capacity: usize) -> Self {
        Self {
            count,

            pose: vec![Pose::default(); count],
            velocity: vec![0.0; count],
            acceleration: vec![0.0; count],
            deceleration: vec![0.0; count],
            moving_status: vec![MovingStatus::Stopped; count],

            current_edge: vec![EdgeId::NONE; count],
            edge_ratio: vec![0.0; count],
            next_edges: vec![[EdgeId::NONE; LOOKAHEAD_SLOTS]; count],
            next_edge_state: vec![NextEdgeState::Empty; count],
            target_ratio: vec![1.0; count],

            path: (0..count).map(|_| PathBuffer::new(path_capacity)).collect(),

            checkpoints: vec![Vec::new(); count],
            cp_head: vec![0; count],
            current_cp: vec![Checkpoint::NONE; count],

            stop_reason: vec![StopReason::empty(); count],
            traffic_state: vec![TrafficState::Free; count],
            hit_zone: vec![HitZone::None; count],
            pre_brake: vec![false; count],

            destination_edge: vec![EdgeId::NONE; count],
            path_remaining: vec![0; count],
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// `true` for ids addressing a real vehicle.
    #[inline]
    pub fn contains(&self, veh: VehicleId) -> bool {
        veh.index() < self.count
    }

    /// Iterator over all `VehicleId`s in ascending index order — the
    /// processing order every subsystem uses.
    pub fn vehicle_ids(&self) -> impl Iterator<Item = VehicleId> + '_ {
        (0..self.count as u32).map(VehicleId)
    }

    /// `true` if the vehicle has upcoming edges queued.
    #[inline]
    pub fn has_path(&self, veh: VehicleId) -> bool {
        !self.path[veh.index()].is_empty()
    }

    // ── Placement / teardown ──────────────────────────────────────────────

    /// Put a vehicle on the rail (initial placement or host repositioning).
    pub fn place(&mut self, veh: VehicleId, edge: EdgeId, ratio: f32) {
        let i = veh.index();
        self.current_edge[i] = edge;
        self.edge_ratio[i] = ratio.clamp(0.0, 1.0);
        self.velocity[i] = 0.0;
        self.moving_status[i] = MovingStatus::Stopped;
    }

    /// Wipe everything route-related for one vehicle: path, lookahead,
    /// checkpoints, destination.  Kinematic position is kept.
    pub fn clear_route(&mut self, veh: VehicleId) {
        let i = veh.index();
        self.path[i].clear();
        self.next_edges[i] = [EdgeId::NONE; LOOKAHEAD_SLOTS];
        self.next_edge_state[i] = NextEdgeState::Empty;
        self.target_ratio[i] = 1.0;
        self.checkpoints[i].clear();
        self.cp_head[i] = 0;
        self.current_cp[i] = Checkpoint::NONE;
        self.destination_edge[i] = EdgeId::NONE;
        self.path_remaining[i] = 0;
        self.pre_brake[i] = false;
    }

    /// Teardown hook: return every column to its initial state without
    /// reallocating.
    pub fn reset(&mut self) {
        for v in 0..self.count as u32 {
            let veh = VehicleId(v);
            self.clear_route(veh);
            let i = veh.index();
            self.pose[i] = Pose::default();
            self.velocity[i] = 0.0;
            self.moving_status[i] = MovingStatus::Stopped;
            self.current_edge[i] = EdgeId::NONE;
            self.edge_ratio[i] = 0.0;
            self.stop_reason[i] = StopReason::empty();
            self.traffic_state[i] = TrafficState::Free;
            self.hit_zone[i] = HitZone::None;
        }
    }
}
