//! Hand-built demo layout: a ten-edge loop with a bypass that rejoins the
//! loop at a merge node.
//!
//! ```text
//!        n0 ─e1─ n1 ─e2─ n2 ─e3─ n3
//!        │                │       │
//!       e10              e11     e4 (curve)
//!        │                │       │
//!        n9 ─e9─ n8 ─e8─ n7 ─e7─ n6* ─ … via e5 (curve), e6
//!                         └──────── n6* fed by e6 and e11 → merge
//! ```
//!
//! Vehicles circulate clockwise; the bypass e11 gives the router a second
//! way to reach the far side and makes `n6` a contended merge.

use oht_core::EdgeId;
use oht_graph::{EdgeDef, RailGraph, RailGraphBuilder, StationDef};

/// Rectangle corner coordinates for the ring nodes, metres.
const NODE_XY: [[f32; 2]; 10] = [
    [0.0, 0.0],
    [12.0, 0.0],
    [24.0, 0.0],
    [36.0, 0.0],
    [39.0, 3.0],
    [39.0, 15.0],
    [36.0, 18.0],
    [24.0, 18.0],
    [12.0, 18.0],
    [0.0, 18.0],
];

fn line(from: usize, to: usize) -> Vec<[f32; 3]> {
    let a = NODE_XY[from];
    let b = NODE_XY[to];
    vec![[a[0], a[1], 0.0], [b[0], b[1], 0.0]]
}

pub fn build_graph() -> anyhow::Result<RailGraph> {
    let mut b = RailGraphBuilder::new();

    // Ring edges e1..e10: n(i-1) → n(i mod 10).
    for i in 1_usize..=10 {
        let from = i - 1;
        let to = i % 10;
        let next_ring = (i % 10 + 1) as u32;
        let def = match i {
            // Two short curves take the loop around the right-hand side.
            4 | 5 => EdgeDef::curve(format!("n{from}"), format!("n{to}"), 4.5)
                .with_radius(3.0)
                .with_next([next_ring])
                .with_polyline(line(from, to)),
            // n2 diverges: continue the ring or take the bypass.
            2 => EdgeDef::linear("n1", "n2", 12.0)
                .with_next([3, 11])
                .with_polyline(line(1, 2)),
            // e6 runs into the merge at n6; stop a little short when queued.
            6 => EdgeDef::linear("n5", "n6", 12.0)
                .with_waiting_offset(2.0)
                .with_next([7])
                .with_polyline(line(5, 6)),
            _ => EdgeDef::linear(format!("n{from}"), format!("n{to}"), 12.0)
                .with_next([next_ring])
                .with_polyline(line(from, to)),
        };
        b.add_edge(def);
    }

    // e11: the bypass n2 → n6, second feeder of the merge.
    b.add_edge(
        EdgeDef::linear("n2", "n6", 30.0)
            .with_waiting_offset(2.0)
            .with_next([7])
            .with_polyline(line(2, 6)),
    );

    b.add_station(StationDef::new("st_load", EdgeId(1)));
    b.add_station(StationDef::new("st_port", EdgeId(8)));
    b.add_station(StationDef::new("st_out", EdgeId(10)));

    Ok(b.build()?)
}
