//! The `Fab` — one complete, independent simulation core instance.
//!
//! A fab owns every subsystem outright (graph, vehicle columns, lock
//! tables, integrator, transfer manager, auto-router, path finder) and
//! advances them in the fixed per-tick order:
//!
//! ```text
//! tick(dt):
//!   ① auto-router    — dispatch idle vehicles (AutoRoute mode only)
//!   ② lock manager   — auto-release sweep, then checkpoint processing
//!   ③ motion         — speed, ratio, edge transitions, pose write-back
//!   ④ transfer       — lookahead refills and reservation merges
//! ```
//!
//! Nothing yields mid-tick and every iteration order is defined, so a fab is
//! a pure function of (initial state, inputs, seed, tick sequence).  Fabs
//! share no state; run several side by side for multi-fab hosts.

use oht_core::{EdgeId, Pose, SimParams, SimRng, VehicleId};
use oht_graph::RailGraph;
use oht_lock::{DeadlockZonePolicy, LockManager, LockSnapshot, NoZones};
use oht_motion::MotionIntegrator;
use oht_route::{PathFinder, PathFinderStats};
use oht_vehicle::{HitZone, VehicleStore};

use crate::router::{AutoRouter, RouteMode};
use crate::transfer::{Command, TransferManager};

/// One fab: the full simulation kernel for a single rail layout.
pub struct Fab<Z: DeadlockZonePolicy = NoZones> {
    pub(crate) params: SimParams,
    pub(crate) graph: RailGraph,
    pub(crate) store: VehicleStore,
    pub(crate) locks: LockManager<Z>,
    pub(crate) motion: MotionIntegrator,
    pub(crate) transfer: TransferManager,
    pub(crate) router: AutoRouter,
    pub(crate) finder: PathFinder,
    pub(crate) mode: RouteMode,
    tick_index: u64,
    sim_time_secs: f64,
}

impl<Z: DeadlockZonePolicy> Fab<Z> {
    pub(crate) fn assemble(
        params: SimParams,
        graph: RailGraph,
        store: VehicleStore,
        zone: Z,
        mode: RouteMode,
    ) -> Self {
        let vehicle_count = store.count;
        Self {
            locks: LockManager::new(zone),
            motion: MotionIntegrator::new(params.clone()),
            transfer: TransferManager::new(vehicle_count, params.clone()),
            router: AutoRouter::new(params.clone(), SimRng::new(params.seed)),
            finder: PathFinder::new(),
            graph,
            store,
            params,
            mode,
            tick_index: 0,
            sim_time_secs: 0.0,
        }
    }

    // ── The tick ──────────────────────────────────────────────────────────

    /// Advance the whole fab by `dt` seconds (clamped to `max_delta`).
    pub fn tick(&mut self, dt: f32) {
        let dt = dt.clamp(0.0, self.params.max_delta);
        self.tick_index += 1;
        self.sim_time_secs += dt as f64;

        if self.mode == RouteMode::AutoRoute {
            self.router
                .run(&mut self.store, &self.graph, &mut self.finder, &mut self.transfer);
        }

        self.locks.update_all(&mut self.store, &self.graph);

        self.motion.update_all(
            dt,
            &mut self.store,
            &self.graph,
            &mut self.locks,
            &mut self.transfer.refill_queue,
        );

        self.transfer.process_pending(&mut self.store, &self.graph);
    }

    // ── Command surface ───────────────────────────────────────────────────

    /// Apply a movement command.  Validation failures drop silently;
    /// inspect state to observe the effect.
    pub fn assign_command(&mut self, veh: VehicleId, command: Command) {
        self.transfer
            .assign_command(veh, command, &mut self.store, &self.graph);
    }

    /// Drop the vehicle's route, reservations, and lock involvement.
    pub fn clear_vehicle_path(&mut self, veh: VehicleId) {
        if !self.store.contains(veh) {
            return;
        }
        self.locks.clear_vehicle(veh, &mut self.store);
        self.store.clear_route(veh);
        self.transfer.clear_vehicle(veh);
    }

    /// Sensor subsystem write surface: proximity classification for one
    /// vehicle, consumed by the next tick's integration.
    pub fn set_hit_zone(&mut self, veh: VehicleId, zone: HitZone) {
        if self.store.contains(veh) {
            self.store.hit_zone[veh.index()] = zone;
        }
    }

    pub fn set_mode(&mut self, mode: RouteMode) {
        self.mode = mode;
    }

    // ── Introspection ─────────────────────────────────────────────────────

    pub fn mode(&self) -> RouteMode {
        self.mode
    }

    pub fn vehicle_count(&self) -> usize {
        self.store.count
    }

    pub fn tick_index(&self) -> u64 {
        self.tick_index
    }

    /// Simulated seconds elapsed across all ticks.
    pub fn sim_time_secs(&self) -> f64 {
        self.sim_time_secs
    }

    /// The vehicle's destination edge, if a route is active.
    pub fn get_destination(&self, veh: VehicleId) -> Option<EdgeId> {
        if !self.store.contains(veh) {
            return None;
        }
        let dest = self.store.destination_edge[veh.index()];
        dest.is_some().then_some(dest)
    }

    pub fn pose(&self, veh: VehicleId) -> Option<Pose> {
        self.store.contains(veh).then(|| self.store.pose[veh.index()])
    }

    /// Name-ordered view of every contended merge node.
    pub fn lock_snapshot(&self) -> Vec<LockSnapshot> {
        self.locks.snapshot(&self.store, &self.graph)
    }

    pub fn path_finder_stats(&self) -> PathFinderStats {
        self.finder.stats()
    }

    /// Borrow the shared state for host-side inspection.
    pub fn store(&self) -> &VehicleStore {
        &self.store
    }

    pub fn graph(&self) -> &RailGraph {
        &self.graph
    }

    pub fn params(&self) -> &SimParams {
        &self.params
    }
}
