//! The auto-router: keeps idle vehicles busy with random station runs.
//!
//! Runs first in the tick, only in [`RouteMode::AutoRoute`].  A round-robin
//! cursor walks the fleet; each idle vehicle gets up to `max_attempts` tries
//! at a random station in its own region.  The per-tick budget counts
//! `shortest_path` *invocations* (successful or not), so path-finding cost
//! is bounded regardless of fleet size; vehicles left over simply wait for
//! the next tick.

use tracing::trace;

use oht_core::{SimRng, SimParams, VehicleId};
use oht_graph::RailGraph;
use oht_route::PathFinder;
use oht_vehicle::{MovingStatus, VehicleStore};

use crate::transfer::{Command, PathStep, TransferManager};

/// Whether the fab assigns work on its own or only via external commands.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum RouteMode {
    /// Vehicles move only on explicit commands.
    #[default]
    Manual,
    /// Idle vehicles are dispatched to random in-region stations.
    AutoRoute,
}

/// Round-robin random-station dispatcher.
pub struct AutoRouter {
    params: SimParams,
    rng: SimRng,
    cursor: u32,
}

impl AutoRouter {
    pub fn new(params: SimParams, rng: SimRng) -> Self {
        Self { params, rng, cursor: 0 }
    }

    /// Current round-robin position (introspection / tests).
    pub fn cursor(&self) -> VehicleId {
        VehicleId(self.cursor)
    }

    /// One tick of dispatching.  Stops after `max_path_finds_per_frame`
    /// path-find attempts or one full lap over the fleet.
    pub fn run(
        &mut self,
        store: &mut VehicleStore,
        graph: &RailGraph,
        finder: &mut PathFinder,
        transfer: &mut TransferManager,
    ) {
        let n = store.count as u32;
        if n == 0 {
            return;
        }
        self.cursor %= n;
        let mut budget = self.params.max_path_finds_per_frame;

        for _ in 0..n {
            if budget == 0 {
                return;
            }
            let veh = VehicleId(self.cursor);
            let completed = self.dispatch_vehicle(veh, store, graph, finder, transfer, &mut budget);
            if !completed {
                // Budget saturated mid-vehicle: the cursor stays put so this
                // vehicle goes first next tick.
                return;
            }
            self.cursor = (self.cursor + 1) % n;
        }
    }

    /// Try to assign one vehicle.  Returns `false` only when the frame
    /// budget ran out before the vehicle's candidates were exhausted.
    fn dispatch_vehicle(
        &mut self,
        veh: VehicleId,
        store: &mut VehicleStore,
        graph: &RailGraph,
        finder: &mut PathFinder,
        transfer: &mut TransferManager,
        budget: &mut u32,
    ) -> bool {
        let i = veh.index();
        let current = store.current_edge[i];
        if current.is_none()
            || store.moving_status[i] == MovingStatus::Paused
            || !transfer.is_idle(veh, store)
        {
            return true;
        }

        let stations = graph.stations_in_region(current);
        if stations.is_empty() {
            return true;
        }

        for _ in 0..self.params.max_attempts {
            if *budget == 0 {
                return false;
            }
            let pick = stations[self.rng.gen_range(0..stations.len())];
            let dest = graph.station(pick).edge;
            if dest == current {
                continue; // pointless trip; costs an attempt but no path-find
            }

            *budget -= 1;
            let Some(path) = finder.shortest_path(graph, current, dest) else {
                continue;
            };

            let steps: Vec<PathStep> = path.iter().map(|&e| PathStep::new(e)).collect();
            transfer.assign_command(veh, Command::Path(steps), store, graph);
            trace!(veh = %veh, station = %graph.station(pick).name, edges = path.len(), "auto-routed");
            return true;
        }
        true
    }
}
