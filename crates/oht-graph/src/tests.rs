//! Unit tests for oht-graph.
//!
//! All tests use hand-crafted edge tables; no map files involved.

mod helpers {
    use crate::{EdgeDef, RailGraph, RailGraphBuilder, StationDef};
    use oht_core::EdgeId;

    /// Y-shaped merge:
    ///
    ///   A ──e1──▶ M ──e3──▶ X
    ///   B ──e2──▶ M
    ///
    /// M has in-degree 2 → merge node.
    pub fn merge_y() -> RailGraph {
        let mut b = RailGraphBuilder::new();
        b.add_edge(EdgeDef::linear("A", "M", 10.0).with_next([3]));
        b.add_edge(EdgeDef::linear("B", "M", 10.0).with_next([3]));
        b.add_edge(EdgeDef::linear("M", "X", 10.0));
        b.build().unwrap()
    }

    /// The merge Y plus a disconnected two-edge loop P ⇄ Q.
    pub fn two_regions() -> RailGraph {
        let mut b = RailGraphBuilder::new();
        b.add_edge(EdgeDef::linear("A", "M", 10.0).with_next([3]));
        b.add_edge(EdgeDef::linear("B", "M", 10.0).with_next([3]));
        b.add_edge(EdgeDef::linear("M", "X", 10.0));
        b.add_edge(EdgeDef::linear("P", "Q", 4.0).with_next([5]));
        b.add_edge(EdgeDef::linear("Q", "P", 4.0).with_next([4]));
        b.add_station(StationDef::new("st_main", EdgeId(3)));
        b.add_station(StationDef::new("st_loop", EdgeId(4)));
        b.build().unwrap()
    }
}

// ── Builder validation ────────────────────────────────────────────────────────

mod builder {
    use crate::{EdgeDef, GraphError, RailGraphBuilder};

    #[test]
    fn ids_are_one_based() {
        let mut b = RailGraphBuilder::new();
        let first = b.add_edge(EdgeDef::linear("A", "B", 1.0));
        assert_eq!(first.0, 1);
        let second = b.add_edge(EdgeDef::linear("B", "C", 1.0));
        assert_eq!(second.0, 2);
    }

    #[test]
    fn dangling_next_edge_is_fatal() {
        let mut b = RailGraphBuilder::new();
        b.add_edge(EdgeDef::linear("A", "B", 1.0).with_next([7]));
        assert!(matches!(b.build(), Err(GraphError::DanglingNextEdge { .. })));
    }

    #[test]
    fn zero_next_edge_is_fatal() {
        let mut b = RailGraphBuilder::new();
        b.add_edge(EdgeDef::linear("A", "B", 1.0).with_next([0]));
        assert!(matches!(b.build(), Err(GraphError::DanglingNextEdge { .. })));
    }

    #[test]
    fn node_inconsistent_next_edge_is_fatal() {
        let mut b = RailGraphBuilder::new();
        // e2 starts at C, not at e1's end node B.
        b.add_edge(EdgeDef::linear("A", "B", 1.0).with_next([2]));
        b.add_edge(EdgeDef::linear("C", "D", 1.0));
        assert!(matches!(b.build(), Err(GraphError::DisconnectedNextEdge { .. })));
    }

    #[test]
    fn non_positive_distance_is_fatal() {
        let mut b = RailGraphBuilder::new();
        b.add_edge(EdgeDef::linear("A", "B", 0.0));
        assert!(matches!(b.build(), Err(GraphError::BadDistance { .. })));
    }
}

// ── Derived tables ────────────────────────────────────────────────────────────

mod derived {
    use super::helpers;
    use oht_core::EdgeId;

    #[test]
    fn merge_set() {
        let g = helpers::merge_y();
        let m = g.node_id("M").unwrap();
        let a = g.node_id("A").unwrap();
        assert!(g.is_merge_node(m));
        assert!(!g.is_merge_node(a));
        // Entering e3 passes through M.
        assert_eq!(g.merge_node_of(EdgeId(3)), Some(m));
        assert_eq!(g.merge_node_of(EdgeId(1)), None);
    }

    #[test]
    fn reverse_index() {
        let g = helpers::merge_y();
        // e3's from node is M; both e1 and e2 end there.
        assert_eq!(g.incoming_of(EdgeId(3)), &[EdgeId(1), EdgeId(2)]);
        assert!(g.incoming_of(EdgeId(1)).is_empty());
    }

    #[test]
    fn diverge_flags() {
        let mut b = crate::RailGraphBuilder::new();
        b.add_edge(crate::EdgeDef::linear("A", "B", 1.0).with_next([2, 3]));
        b.add_edge(crate::EdgeDef::linear("B", "C", 1.0));
        b.add_edge(crate::EdgeDef::linear("B", "D", 1.0));
        let g = b.build().unwrap();
        assert!(g.to_node_is_diverge(EdgeId(1)));
        assert!(!g.to_node_is_diverge(EdgeId(2)));
    }

    #[test]
    fn regions_label_connected_components() {
        let g = helpers::two_regions();
        assert_eq!(g.region_count(), 2);
        // The Y (1, 2, 3) is one component even though e2 → e3 is the only
        // directed link from e2 — the projection is undirected.
        assert_eq!(g.region_of(EdgeId(1)), g.region_of(EdgeId(2)));
        assert_eq!(g.region_of(EdgeId(2)), g.region_of(EdgeId(3)));
        assert_ne!(g.region_of(EdgeId(3)), g.region_of(EdgeId(4)));
        assert_eq!(g.region_of(EdgeId(4)), g.region_of(EdgeId(5)));
    }
}

// ── Stations ──────────────────────────────────────────────────────────────────

mod stations {
    use super::helpers;
    use crate::{EdgeDef, RailGraphBuilder, StationDef};
    use oht_core::EdgeId;

    #[test]
    fn stations_inherit_region_of_their_edge() {
        let g = helpers::two_regions();
        let in_y = g.stations_in_region(EdgeId(1));
        assert_eq!(in_y.len(), 1);
        assert_eq!(g.station(in_y[0]).name, "st_main");

        let in_loop = g.stations_in_region(EdgeId(5));
        assert_eq!(in_loop.len(), 1);
        assert_eq!(g.station(in_loop[0]).name, "st_loop");
    }

    #[test]
    fn station_on_unknown_edge_is_dropped() {
        let mut b = RailGraphBuilder::new();
        b.add_edge(EdgeDef::linear("A", "B", 1.0));
        b.add_station(StationDef::new("ghost", EdgeId(9)));
        let g = b.build().unwrap();
        assert_eq!(g.station_count(), 0);
    }

    #[test]
    fn unknown_edge_queries_are_empty() {
        let g = helpers::merge_y();
        assert!(g.stations_in_region(EdgeId::NONE).is_empty());
        assert!(g.stations_in_region(EdgeId(99)).is_empty());
    }
}

// ── Interpolation ─────────────────────────────────────────────────────────────

mod interpolate {
    use crate::{EdgeDef, RailGraphBuilder};
    use oht_core::EdgeId;

    fn graph_with_polyline() -> crate::RailGraph {
        let mut b = RailGraphBuilder::new();
        b.add_edge(
            EdgeDef::linear("A", "B", 10.0)
                .with_polyline(vec![[0.0, 0.0, 0.0], [10.0, 0.0, 0.0]]),
        );
        b.add_edge(
            // L-shaped polyline: 10 m east then 10 m north.
            EdgeDef::linear("B", "C", 20.0)
                .with_polyline(vec![[10.0, 0.0, 0.0], [20.0, 0.0, 0.0], [20.0, 10.0, 0.0]]),
        );
        b.build().unwrap()
    }

    #[test]
    fn endpoints_and_midpoint() {
        let g = graph_with_polyline();
        let start = g.interpolate(EdgeId(1), 0.0);
        assert_eq!((start.x, start.y), (0.0, 0.0));
        let end = g.interpolate(EdgeId(1), 1.0);
        assert_eq!((end.x, end.y), (10.0, 0.0));
        let mid = g.interpolate(EdgeId(1), 0.5);
        assert!((mid.x - 5.0).abs() < 1e-4);
    }

    #[test]
    fn multi_segment_heading_changes() {
        let g = graph_with_polyline();
        // 25% of a 20 m L-path: 5 m into the eastbound leg.
        let p = g.interpolate(EdgeId(2), 0.25);
        assert!((p.x - 15.0).abs() < 1e-4);
        assert!(p.heading.abs() < 1e-4);
        // 75%: 5 m into the northbound leg, heading ≈ π/2.
        let p = g.interpolate(EdgeId(2), 0.75);
        assert!((p.y - 5.0).abs() < 1e-4);
        assert!((p.heading - std::f32::consts::FRAC_PI_2).abs() < 1e-4);
    }

    #[test]
    fn ratio_is_clamped() {
        let g = graph_with_polyline();
        let over = g.interpolate(EdgeId(1), 1.5);
        assert_eq!((over.x, over.y), (10.0, 0.0));
        let under = g.interpolate(EdgeId(1), -0.5);
        assert_eq!((under.x, under.y), (0.0, 0.0));
    }

    #[test]
    fn missing_polyline_degrades_gracefully() {
        let mut b = RailGraphBuilder::new();
        b.add_edge(EdgeDef::linear("A", "B", 5.0));
        let g = b.build().unwrap();
        let p = g.interpolate(EdgeId(1), 0.5);
        assert_eq!((p.x, p.y, p.z), (0.0, 0.0, 0.0));
    }
}
