//! Fluent builder for constructing a [`Fab`].

use oht_core::{EdgeId, SimParams, VehicleId};
use oht_graph::RailGraph;
use oht_lock::{DeadlockZonePolicy, NoZones};
use oht_vehicle::VehicleStore;

use crate::fab::Fab;
use crate::router::RouteMode;
use crate::{SimError, SimResult};

/// Initial position of one vehicle (the vector index is its id).
#[derive(Copy, Clone, Debug)]
pub struct VehiclePlacement {
    pub edge: EdgeId,
    pub ratio: f32,
}

impl VehiclePlacement {
    pub fn new(edge: EdgeId, ratio: f32) -> Self {
        Self { edge, ratio }
    }
}

/// Fluent builder for [`Fab<Z>`].
///
/// # Required inputs
///
/// - a built [`RailGraph`] (from [`oht_graph::RailGraphBuilder`])
/// - [`SimParams`]
/// - vehicle placements (one per vehicle, in id order)
///
/// # Optional inputs (have defaults)
///
/// | Method            | Default       |
/// |-------------------|---------------|
/// | `.mode(m)`        | `Manual`      |
/// | `.zone_policy(z)` | `NoZones`     |
///
/// # Example
///
/// ```rust,ignore
/// let fab = FabBuilder::new(graph, SimParams::default())
///     .vehicles(vec![VehiclePlacement::new(EdgeId(1), 0.0)])
///     .mode(RouteMode::AutoRoute)
///     .build()?;
/// ```
pub struct FabBuilder<Z: DeadlockZonePolicy = NoZones> {
    graph: RailGraph,
    params: SimParams,
    placements: Vec<VehiclePlacement>,
    mode: RouteMode,
    zone: Z,
}

impl FabBuilder<NoZones> {
    pub fn new(graph: RailGraph, params: SimParams) -> Self {
        Self {
            graph,
            params,
            placements: Vec::new(),
            mode: RouteMode::Manual,
            zone: NoZones,
        }
    }
}

impl<Z: DeadlockZonePolicy> FabBuilder<Z> {
    /// Supply the initial placement for each vehicle.
    pub fn vehicles(mut self, placements: Vec<VehiclePlacement>) -> Self {
        self.placements = placements;
        self
    }

    pub fn mode(mut self, mode: RouteMode) -> Self {
        self.mode = mode;
        self
    }

    /// Swap in a deadlock-zone policy (default: none).
    pub fn zone_policy<Z2: DeadlockZonePolicy>(self, zone: Z2) -> FabBuilder<Z2> {
        FabBuilder {
            graph: self.graph,
            params: self.params,
            placements: self.placements,
            mode: self.mode,
            zone,
        }
    }

    /// Validate placements and assemble a ready-to-tick [`Fab`].
    pub fn build(self) -> SimResult<Fab<Z>> {
        let count = self.placements.len();
        let mut store = VehicleStore::new(count, self.params.max_path_length);

        for (idx, placement) in self.placements.iter().enumerate() {
            let veh = VehicleId(idx as u32);
            if !self.graph.contains_edge(placement.edge) {
                return Err(SimError::PlacementOnUnknownEdge {
                    veh,
                    edge: placement.edge,
                });
            }
            store.place(veh, placement.edge, placement.ratio);
            store.acceleration[idx] = self.params.linear_acceleration;
            store.deceleration[idx] = self.params.linear_deceleration;
            store.pose[idx] = self.graph.interpolate(placement.edge, placement.ratio);
        }

        Ok(Fab::assemble(self.params, self.graph, store, self.zone, self.mode))
    }
}
