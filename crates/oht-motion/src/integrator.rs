//! The motion integrator.
//!
//! For every vehicle in `MOVING` state, one call to
//! [`MotionIntegrator::update_all`] advances speed and edge ratio, resolves
//! any number of edge-to-edge transitions (bounded by the lookahead depth),
//! and writes back the interpolated pose.  The interlock with the merge
//! protocol is indirect: the lock manager has already force-stopped vehicles
//! held at waiting points, so the integrator only ever reads
//! `stop_reason & LOCKED` through `moving_status`.
//!
//! # Braking sources, strongest first
//!
//! 1. sensor stop zone (`hit_zone == Stop`): hard zero, skip the tick,
//! 2. sensor approach/brake zones: base deceleration,
//! 3. arrival braking: stop exactly at `target_ratio` on the final edge,
//! 4. curve pre-brake: bleed down to curve speed ahead of an upcoming curve,
//! 5. otherwise: accelerate toward the rail-kind speed cap.

use tracing::trace;

use oht_core::{EdgeId, SimParams, VehicleId};
use oht_graph::RailGraph;
use oht_lock::{DeadlockZonePolicy, LockManager};
use oht_vehicle::{MovingStatus, NextEdgeState, StopReason, TrafficState, VehicleStore, LOOKAHEAD_SLOTS};

/// How many path-buffer edges the curve pre-brake scan looks ahead.
const CURVE_SCAN_EDGES: usize = 8;

/// Per-fab motion integrator.  Owns nothing but its parameters and the tick
/// counter used to stagger the pre-brake scans.
pub struct MotionIntegrator {
    params: SimParams,
    tick: u64,
}

impl MotionIntegrator {
    pub fn new(params: SimParams) -> Self {
        Self { params, tick: 0 }
    }

    /// Advance every moving vehicle by `dt` seconds.
    ///
    /// Vehicles that enter an edge with an empty lookahead are pushed onto
    /// `transfer_queue` (deduplicated via the `Pending` state) for the
    /// transfer manager to refill after motion.
    pub fn update_all<Z: DeadlockZonePolicy>(
        &mut self,
        dt: f32,
        store: &mut VehicleStore,
        graph: &RailGraph,
        locks: &mut LockManager<Z>,
        transfer_queue: &mut Vec<VehicleId>,
    ) {
        self.tick += 1;
        for v in 0..store.count as u32 {
            self.update_vehicle(VehicleId(v), dt, store, graph, locks, transfer_queue);
        }
    }

    fn update_vehicle<Z: DeadlockZonePolicy>(
        &mut self,
        veh: VehicleId,
        dt: f32,
        store: &mut VehicleStore,
        graph: &RailGraph,
        locks: &mut LockManager<Z>,
        transfer_queue: &mut Vec<VehicleId>,
    ) {
        let i = veh.index();
        let mut edge = store.current_edge[i];
        if edge.is_none() || store.moving_status[i] != MovingStatus::Moving {
            return;
        }

        // ── Sensor stop zone: hard hold, nothing else this tick ───────────
        if store.hit_zone[i].is_stop() {
            store.velocity[i] = 0.0;
            store.stop_reason[i] |= StopReason::SENSORED;
            return;
        }
        store.stop_reason[i].remove(StopReason::SENSORED);

        // ── Effective acceleration and speed cap ──────────────────────────
        let on_curve = graph.is_curve(edge);
        if on_curve {
            // The pre-brake did its job; normal curve control takes over.
            store.pre_brake[i] = false;
        }

        let vmax = if on_curve {
            self.params.curve_max_speed
        } else {
            self.params.linear_max_speed
        };

        let sensor_braking = store.hit_zone[i].is_contact();
        let pre_braking = store.pre_brake[i] && !on_curve && !sensor_braking;
        let arrival_braking = !sensor_braking
            && store.path[i].is_empty()
            && within_stop_distance(
                store.velocity[i],
                store.deceleration[i],
                (store.target_ratio[i] - store.edge_ratio[i]).max(0.0) * graph.distance(edge),
            );

        let accel = if sensor_braking || arrival_braking {
            -store.deceleration[i]
        } else if pre_braking {
            -self.params.linear_pre_brake_deceleration
        } else if on_curve {
            self.params.curve_acceleration
        } else {
            store.acceleration[i]
        };

        // ── Integrate velocity ────────────────────────────────────────────
        let mut v_next = (store.velocity[i] + accel * dt).clamp(0.0, vmax);
        if pre_braking {
            // Bleed down to curve entry speed, not to a crawl.
            v_next = v_next.max(self.params.curve_max_speed.min(vmax));
        }

        // ── Advance ratio ─────────────────────────────────────────────────
        let mut ratio = store.edge_ratio[i] + v_next * dt / graph.distance(edge);

        // ── Transfer trigger: ask for a refill as soon as the edge is
        //    entered with nothing loaded ──────────────────────────────────
        if store.next_edge_state[i] == NextEdgeState::Empty && store.has_path(veh) {
            store.next_edge_state[i] = NextEdgeState::Pending;
            transfer_queue.push(veh);
        }

        // ── Edge transition loop ──────────────────────────────────────────
        // Bounded by the lookahead depth: each transition consumes a slot.
        while ratio >= 1.0 {
            if store.next_edge_state[i] != NextEdgeState::Ready
                || store.next_edges[i][0].is_none()
            {
                ratio = 1.0; // stalled at the edge end until a refill arrives
                break;
            }

            let overflow_m = (ratio - 1.0) * graph.distance(edge);
            let prev = edge;
            edge = store.next_edges[i][0];

            // Consume one lookahead slot.
            store.next_edges[i].copy_within(1.., 0);
            store.next_edges[i][LOOKAHEAD_SLOTS - 1] = EdgeId::NONE;
            if store.next_edges[i][0].is_none() {
                store.next_edge_state[i] = NextEdgeState::Empty;
            }

            // Path bookkeeping: the front of the path buffer is the edge we
            // just moved onto.
            if store.path[i].first() == edge {
                store.path[i].shift_left();
            }
            store.path_remaining[i] = store.path[i].len() as u32;
            store.current_edge[i] = edge;
            ratio = overflow_m / graph.distance(edge);
            if graph.is_curve(edge) {
                store.pre_brake[i] = false;
            }

            // Per-edge traffic state resets on entry.
            store.traffic_state[i] = TrafficState::Free;
            store.stop_reason[i].remove(StopReason::LOCKED);

            let crossed = graph.to_node(prev);
            if graph.is_merge_node(crossed) {
                locks.notify_merge_crossed(veh, crossed, store);
            }
            trace!(veh = %veh, from = %prev, to = %edge, "edge transition");
        }

        // ── Arrival at the route's final stop position ────────────────────
        if store.path[i].is_empty() && ratio >= store.target_ratio[i] {
            ratio = store.target_ratio[i];
            v_next = 0.0;
            store.moving_status[i] = MovingStatus::Stopped;
            store.pre_brake[i] = false;
            store.destination_edge[i] = EdgeId::NONE;
            store.path_remaining[i] = 0;
        }

        // ── Write back ────────────────────────────────────────────────────
        store.velocity[i] = v_next;
        store.edge_ratio[i] = ratio.clamp(0.0, 1.0);
        store.pose[i] = graph.interpolate(edge, store.edge_ratio[i]);

        // ── Curve pre-brake scan (throttled, staggered per vehicle) ───────
        let interval = self.params.curve_pre_brake_check_interval.max(1) as u64;
        if !on_curve && (self.tick + veh.0 as u64) % interval == 0 {
            let engage = self.should_pre_brake(veh, store, graph);
            store.pre_brake[i] = engage;
        }
    }

    /// Decide whether decelerating now is needed to reach curve entry speed
    /// by the time the next curve on the reserved path arrives.
    fn should_pre_brake(&self, veh: VehicleId, store: &VehicleStore, graph: &RailGraph) -> bool {
        let i = veh.index();
        let v = store.velocity[i];
        if v <= self.params.curve_max_speed {
            return false;
        }

        let edge = store.current_edge[i];
        let mut dist_to_curve = (1.0 - store.edge_ratio[i]).max(0.0) * graph.distance(edge);
        let mut found = false;
        for &e in store.path[i].as_slice().iter().take(CURVE_SCAN_EDGES) {
            if graph.is_curve(e) {
                found = true;
                break;
            }
            dist_to_curve += graph.distance(e);
        }
        if !found {
            return false;
        }

        // Distance needed to bleed from v down to curve speed.
        let dec = self.params.linear_pre_brake_deceleration.max(f32::EPSILON);
        let needed =
            (v * v - self.params.curve_max_speed * self.params.curve_max_speed) / (2.0 * dec);
        dist_to_curve <= needed
    }
}

/// `true` when braking at `deceleration` must begin within `distance_m` to
/// stop in time.
#[inline]
fn within_stop_distance(velocity: f32, deceleration: f32, distance_m: f32) -> bool {
    if velocity <= 0.0 {
        return false;
    }
    let dec = deceleration.max(f32::EPSILON);
    distance_m <= velocity * velocity / (2.0 * dec)
}
