//! loopline — smallest runnable demo of the ohtsim kernel.
//!
//! Four vehicles auto-route between three stations on a looped track with
//! one contended merge.  Run with `RUST_LOG=info` (or `debug` to watch the
//! lock protocol) and see periodic fleet reports plus a final summary.

mod network;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use oht_core::{EdgeId, SimParams, VehicleId};
use oht_sim::{FabBuilder, RouteMode, VehiclePlacement};

// ── Constants ─────────────────────────────────────────────────────────────────

const VEHICLE_COUNT: usize = 4;
const SEED: u64 = 42;
const DT: f32 = 0.05; // 20 Hz
const TOTAL_TICKS: u64 = 40_000; // ~33 simulated minutes
const REPORT_EVERY: u64 = 4_000;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let graph = network::build_graph()?;
    info!(
        edges = graph.edge_count(),
        nodes = graph.node_count(),
        stations = graph.station_count(),
        "loopline network built"
    );

    let placements = (0..VEHICLE_COUNT)
        .map(|i| VehiclePlacement::new(EdgeId((1 + 2 * i) as u32), 0.1))
        .collect();

    let params = SimParams { seed: SEED, ..SimParams::default() };
    let mut fab = FabBuilder::new(graph, params)
        .vehicles(placements)
        .mode(RouteMode::AutoRoute)
        .build()?;

    for t in 1..=TOTAL_TICKS {
        fab.tick(DT);
        if t % REPORT_EVERY == 0 {
            report(&fab, t);
        }
    }

    let stats = fab.path_finder_stats();
    info!(
        sim_secs = format!("{:.0}", fab.sim_time_secs()),
        path_finds = stats.calls,
        cache_hits = stats.cache_hits,
        "run complete"
    );
    Ok(())
}

fn report(fab: &oht_sim::Fab, tick: u64) {
    for v in 0..fab.vehicle_count() {
        let veh = VehicleId(v as u32);
        let store = fab.store();
        info!(
            tick,
            veh = v,
            edge = %store.current_edge[v],
            ratio = format!("{:.2}", store.edge_ratio[v]),
            speed = format!("{:.2}", store.velocity[v]),
            dest = ?fab.get_destination(veh),
            "fleet"
        );
    }
    for lock in fab.lock_snapshot() {
        info!(tick, node = %lock.node, holder = ?lock.holder, waiters = lock.waiters.len(), "merge");
    }
}
