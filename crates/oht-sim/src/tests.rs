//! Integration tests for oht-sim: full-stack tick scenarios.

use oht_core::{EdgeId, SimParams, VehicleId};
use oht_graph::{EdgeDef, RailGraph, RailGraphBuilder, StationDef};
use oht_vehicle::{MovingStatus, NextEdgeState, StopReason};

use crate::{Command, Fab, FabBuilder, FabSet, PathStep, RouteMode, VehiclePlacement};

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Merge-free chain of 10 m edges.
fn chain(n: u32) -> RailGraph {
    let mut b = RailGraphBuilder::new();
    for i in 0..n {
        let mut def = EdgeDef::linear(format!("N{i}"), format!("N{}", i + 1), 10.0);
        if i + 1 < n {
            def = def.with_next([i + 2]);
        }
        b.add_edge(def);
    }
    b.build().unwrap()
}

/// Y-merge: e1 A→M, e2 B→M (10 m each), e3 M→X (10 m).
fn merge_y() -> RailGraph {
    let mut b = RailGraphBuilder::new();
    b.add_edge(EdgeDef::linear("A", "M", 10.0).with_next([3]));
    b.add_edge(EdgeDef::linear("B", "M", 10.0).with_next([3]));
    b.add_edge(EdgeDef::linear("M", "X", 10.0));
    b.build().unwrap()
}

/// One-way ring of twelve 10 m edges with four stations.
fn ring_with_stations() -> RailGraph {
    let mut b = RailGraphBuilder::new();
    for i in 1_u32..=12 {
        let next = if i == 12 { 1 } else { i + 1 };
        b.add_edge(
            EdgeDef::linear(format!("R{}", i - 1), format!("R{}", i % 12), 10.0)
                .with_next([next]),
        );
    }
    for (k, edge) in [2_u32, 5, 8, 11].into_iter().enumerate() {
        b.add_station(StationDef::new(format!("st{k}"), EdgeId(edge)));
    }
    b.build().unwrap()
}

fn steps(raw: &[u32]) -> Vec<PathStep> {
    raw.iter().map(|&e| PathStep::new(EdgeId(e))).collect()
}

fn assert_invariants(fab: &Fab) {
    for v in 0..fab.vehicle_count() {
        let r = fab.store().edge_ratio[v];
        assert!((0.0..=1.0).contains(&r), "vehicle {v} ratio {r} out of range");
    }
    assert!(fab.locks.queues_are_consistent());
}

// ── Scenario: straight corridor ───────────────────────────────────────────────

mod corridor {
    use super::*;

    #[test]
    fn accelerates_transitions_and_arrives() {
        let params = SimParams {
            linear_max_speed: 2.0,
            linear_acceleration: 1.0,
            ..SimParams::default()
        };
        let mut fab = FabBuilder::new(chain(3), params)
            .vehicles(vec![VehiclePlacement::new(EdgeId(1), 0.0)])
            .build()
            .unwrap();

        fab.assign_command(VehicleId(0), Command::Path(steps(&[2, 3])));
        assert_eq!(fab.get_destination(VehicleId(0)), Some(EdgeId(3)));

        // 5 s of 1 m/s² toward a 2 m/s cap ≈ 8 m: still on the first edge.
        for _ in 0..50 {
            fab.tick(0.1);
            assert_invariants(&fab);
        }
        assert_eq!(fab.store().current_edge[0], EdgeId(1));
        assert!((fab.store().edge_ratio[0] - 0.81).abs() < 1e-3);

        // Run to completion: stops at the end of the final edge.
        for _ in 0..300 {
            fab.tick(0.1);
            if fab.store().moving_status[0] == MovingStatus::Stopped {
                break;
            }
        }
        assert_eq!(fab.store().current_edge[0], EdgeId(3));
        assert_eq!(fab.store().edge_ratio[0], 1.0);
        assert_eq!(fab.store().moving_status[0], MovingStatus::Stopped);
        assert_eq!(fab.get_destination(VehicleId(0)), None);
    }

    #[test]
    fn dt_is_clamped_to_max_delta() {
        let params = SimParams::default(); // max_delta = 0.1
        let mut fab = FabBuilder::new(chain(2), params)
            .vehicles(vec![VehiclePlacement::new(EdgeId(1), 0.0)])
            .build()
            .unwrap();
        fab.assign_command(VehicleId(0), Command::Path(steps(&[2])));

        // A host stall hands us a huge dt; only max_delta seconds advance.
        fab.tick(30.0);
        let after_clamped = fab.store().edge_ratio[0];

        let mut reference = FabBuilder::new(chain(2), SimParams::default())
            .vehicles(vec![VehiclePlacement::new(EdgeId(1), 0.0)])
            .build()
            .unwrap();
        reference.assign_command(VehicleId(0), Command::Path(steps(&[2])));
        reference.tick(0.1);
        assert_eq!(after_clamped, reference.store().edge_ratio[0]);
    }
}

// ── Scenario: two vehicles through one merge ──────────────────────────────────

mod merge_fifo {
    use super::*;

    fn merge_fab() -> Fab {
        let mut fab = FabBuilder::new(merge_y(), SimParams::default())
            .vehicles(vec![
                VehiclePlacement::new(EdgeId(1), 0.5),
                VehiclePlacement::new(EdgeId(2), 0.45),
            ])
            .build()
            .unwrap();
        fab.assign_command(VehicleId(0), Command::Path(steps(&[3])));
        fab.assign_command(VehicleId(1), Command::Path(steps(&[3])));
        fab
    }

    #[test]
    fn first_requester_holds_second_waits_then_inherits() {
        let mut fab = merge_fab();

        // Phase 1: run until veh1 is held at its waiting point.
        let mut held_tick = None;
        for t in 0..600 {
            fab.tick(0.1);
            assert_invariants(&fab);
            if fab.store().stop_reason[1].contains(StopReason::LOCKED) {
                held_tick = Some(t);
                break;
            }
        }
        assert!(held_tick.is_some(), "veh1 never hit the waiting point");
        // The holder is veh0, which is still short of the merge.
        let snap = fab.lock_snapshot();
        assert_eq!(snap.len(), 1);
        assert_eq!(snap[0].node, "M");
        assert_eq!(snap[0].holder, Some(VehicleId(0)));
        assert_ne!(fab.store().current_edge[0], EdgeId(3));
        assert_eq!(fab.store().velocity[1], 0.0);

        // Phase 2: run until veh0 crosses onto the post-merge edge; the
        // lock hands over within the same tick.
        for _ in 0..600 {
            fab.tick(0.1);
            assert_invariants(&fab);
            if fab.store().current_edge[0] == EdgeId(3) {
                break;
            }
        }
        assert_eq!(fab.store().current_edge[0], EdgeId(3));
        let snap = fab.lock_snapshot();
        assert_eq!(snap.len(), 1);
        assert_eq!(snap[0].holder, Some(VehicleId(1)));
        // veh1 is still stopped — the grant is consumed next tick.
        assert!(fab.store().stop_reason[1].contains(StopReason::LOCKED));

        fab.tick(0.1);
        assert!(!fab.store().stop_reason[1].contains(StopReason::LOCKED));
        assert_eq!(fab.store().moving_status[1], MovingStatus::Moving);

        // Phase 3: veh1 crosses too; all locks drain.
        for _ in 0..600 {
            fab.tick(0.1);
            assert_invariants(&fab);
            if fab.store().current_edge[1] == EdgeId(3)
                && fab.store().moving_status[1] == MovingStatus::Stopped
            {
                break;
            }
        }
        assert_eq!(fab.store().current_edge[1], EdgeId(3));
        assert!(fab.lock_snapshot().is_empty(), "all merge locks released");
    }
}

// ── Scenario: auto-router frame budget ────────────────────────────────────────

mod auto_route {
    use super::*;

    fn ring_fab(vehicles: usize, seed: u64) -> Fab {
        let placements = (0..vehicles)
            .map(|i| VehiclePlacement::new(EdgeId(1), (i as f32) * 1e-4))
            .collect();
        FabBuilder::new(ring_with_stations(), SimParams { seed, ..SimParams::default() })
            .vehicles(placements)
            .mode(RouteMode::AutoRoute)
            .build()
            .unwrap()
    }

    #[test]
    fn path_find_budget_caps_one_tick() {
        let mut fab = ring_fab(100, 7);
        fab.tick(0.1);

        // Exactly ten shortest_path invocations; ten vehicles routed; the
        // round-robin cursor sits just past them.
        assert_eq!(fab.path_finder_stats().calls, 10);
        let routed = (0..100)
            .filter(|&i| fab.get_destination(VehicleId(i as u32)).is_some())
            .count();
        assert_eq!(routed, 10);
        assert_eq!(fab.router.cursor(), VehicleId(10));

        // Next tick serves the next ten.
        fab.tick(0.1);
        assert_eq!(fab.path_finder_stats().calls, 20);
        assert_eq!(fab.router.cursor(), VehicleId(20));
    }

    #[test]
    fn busy_vehicles_are_skipped_without_budget_cost() {
        let mut fab = ring_fab(5, 7);
        fab.tick(0.1); // all five routed (≤ 10 budget)
        let calls_after_first = fab.path_finder_stats().calls;
        assert_eq!(calls_after_first, 5);

        // Everyone is en route now; the next tick finds nobody idle.
        fab.tick(0.1);
        assert_eq!(fab.path_finder_stats().calls, calls_after_first);
    }

    #[test]
    fn paused_vehicles_are_not_dispatched() {
        let mut fab = ring_fab(1, 7);
        fab.store.moving_status[0] = MovingStatus::Paused;
        fab.tick(0.1);
        assert_eq!(fab.path_finder_stats().calls, 0);
        assert_eq!(fab.get_destination(VehicleId(0)), None);
    }

    #[test]
    fn long_run_keeps_fleet_cycling() {
        let mut fab = ring_fab(8, 21);
        for _ in 0..2_000 {
            fab.tick(0.1);
        }
        assert_invariants(&fab);
        // The fleet keeps getting work: after one more dispatch round at
        // least one vehicle is mid-route.
        fab.tick(0.1);
        let en_route = (0..8).any(|i| fab.get_destination(VehicleId(i)).is_some());
        assert!(en_route);
    }
}

// ── Determinism ───────────────────────────────────────────────────────────────

mod determinism {
    use super::*;

    fn spread_fab(seed: u64) -> Fab {
        let placements = (0..20)
            .map(|i| VehiclePlacement::new(EdgeId((i % 12) + 1), 0.1))
            .collect();
        FabBuilder::new(ring_with_stations(), SimParams { seed, ..SimParams::default() })
            .vehicles(placements)
            .mode(RouteMode::AutoRoute)
            .build()
            .unwrap()
    }

    #[test]
    fn same_seed_same_observable_state() {
        let mut a = spread_fab(123);
        let mut b = spread_fab(123);
        for _ in 0..300 {
            a.tick(0.1);
            b.tick(0.1);
        }
        assert_eq!(a.store().current_edge, b.store().current_edge);
        assert_eq!(a.store().edge_ratio, b.store().edge_ratio);
        assert_eq!(a.store().velocity, b.store().velocity);
        assert_eq!(a.store().moving_status, b.store().moving_status);

        let snap_a: Vec<_> = a.lock_snapshot().iter().map(|s| (s.node.clone(), s.holder)).collect();
        let snap_b: Vec<_> = b.lock_snapshot().iter().map(|s| (s.node.clone(), s.holder)).collect();
        assert_eq!(snap_a, snap_b);
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = spread_fab(1);
        let mut b = spread_fab(2);
        for _ in 0..300 {
            a.tick(0.1);
            b.tick(0.1);
        }
        let same = a.store().current_edge == b.store().current_edge
            && a.store().edge_ratio == b.store().edge_ratio;
        assert!(!same, "independent seeds should pick different stations");
    }
}

// ── Command surface ───────────────────────────────────────────────────────────

mod commands {
    use super::*;

    fn chain_fab() -> Fab {
        FabBuilder::new(chain(4), SimParams::default())
            .vehicles(vec![VehiclePlacement::new(EdgeId(1), 0.0)])
            .build()
            .unwrap()
    }

    #[test]
    fn disconnected_path_is_dropped_silently() {
        let mut fab = chain_fab();
        fab.assign_command(VehicleId(0), Command::Path(steps(&[3])));
        assert!(!fab.store().has_path(VehicleId(0)));
        assert_eq!(fab.get_destination(VehicleId(0)), None);
        assert_eq!(fab.store().moving_status[0], MovingStatus::Stopped);
    }

    #[test]
    fn leading_current_edge_is_stripped() {
        let mut fab = chain_fab();
        fab.assign_command(VehicleId(0), Command::Path(steps(&[1, 2, 3])));
        assert_eq!(fab.store().path[0].as_slice(), &[EdgeId(2), EdgeId(3)]);
        assert_eq!(fab.get_destination(VehicleId(0)), Some(EdgeId(3)));
        assert_eq!(fab.store().next_edge_state[0], NextEdgeState::Ready);
    }

    #[test]
    fn over_length_path_is_dropped() {
        let params = SimParams { max_path_length: 2, ..SimParams::default() };
        let mut fab = FabBuilder::new(chain(5), params)
            .vehicles(vec![VehiclePlacement::new(EdgeId(1), 0.0)])
            .build()
            .unwrap();
        fab.assign_command(VehicleId(0), Command::Path(steps(&[2, 3, 4, 5])));
        assert!(!fab.store().has_path(VehicleId(0)));
    }

    #[test]
    fn next_edge_reservation_merges_after_motion() {
        let mut fab = chain_fab();
        fab.assign_command(
            VehicleId(0),
            Command::NextEdge { edge: EdgeId(2), target_ratio: Some(0.5) },
        );
        // Reserved, not yet part of the route.
        assert_eq!(fab.transfer.reserved_len(VehicleId(0)), 1);
        assert!(!fab.store().has_path(VehicleId(0)));

        fab.tick(0.1);
        assert_eq!(fab.transfer.reserved_len(VehicleId(0)), 0);
        assert_eq!(fab.store().path[0].first(), EdgeId(2));
        assert_eq!(fab.get_destination(VehicleId(0)), Some(EdgeId(2)));

        // Rides to the reserved edge and stops at its target ratio.
        for _ in 0..400 {
            fab.tick(0.1);
            if fab.store().moving_status[0] == MovingStatus::Stopped {
                break;
            }
        }
        assert_eq!(fab.store().current_edge[0], EdgeId(2));
        assert_eq!(fab.store().edge_ratio[0], 0.5);
    }

    #[test]
    fn unconnectable_reservation_is_dropped() {
        let mut fab = chain_fab();
        fab.assign_command(
            VehicleId(0),
            Command::NextEdge { edge: EdgeId(4), target_ratio: None },
        );
        fab.tick(0.1);
        assert_eq!(fab.transfer.reserved_len(VehicleId(0)), 0);
        assert!(!fab.store().has_path(VehicleId(0)));
    }

    #[test]
    fn target_ratio_moves_within_edge() {
        let mut fab = chain_fab();
        fab.assign_command(VehicleId(0), Command::TargetRatio { ratio: 0.6 });
        assert_eq!(fab.store().moving_status[0], MovingStatus::Moving);
        for _ in 0..400 {
            fab.tick(0.1);
            if fab.store().moving_status[0] == MovingStatus::Stopped {
                break;
            }
        }
        assert_eq!(fab.store().current_edge[0], EdgeId(1));
        assert_eq!(fab.store().edge_ratio[0], 0.6);
    }

    #[test]
    fn clear_vehicle_path_releases_everything() {
        let mut fab = FabBuilder::new(merge_y(), SimParams::default())
            .vehicles(vec![
                VehiclePlacement::new(EdgeId(1), 0.6),
                VehiclePlacement::new(EdgeId(2), 0.6),
            ])
            .build()
            .unwrap();
        fab.assign_command(VehicleId(0), Command::Path(steps(&[3])));
        fab.assign_command(VehicleId(1), Command::Path(steps(&[3])));
        fab.tick(0.1); // both request; veh0 holds

        let m = fab.graph().node_id("M").unwrap();
        assert_eq!(fab.locks.holder_of(m), Some(VehicleId(0)));

        fab.clear_vehicle_path(VehicleId(0));
        assert_eq!(fab.locks.holder_of(m), Some(VehicleId(1)));
        assert!(!fab.store().has_path(VehicleId(0)));
        assert_eq!(fab.get_destination(VehicleId(0)), None);
        assert!(fab.locks.queues_are_consistent());
    }

    #[test]
    fn pending_refill_recovers_wiped_lookahead() {
        let mut fab = chain_fab();
        fab.assign_command(VehicleId(0), Command::Path(steps(&[2, 3])));

        // Simulate a missed MOVE_PREPARE: lookahead gone, path intact.
        fab.store.next_edges[0] = [EdgeId::NONE; oht_vehicle::LOOKAHEAD_SLOTS];
        fab.store.next_edge_state[0] = NextEdgeState::Empty;

        fab.tick(0.1);
        assert_eq!(fab.store().next_edge_state[0], NextEdgeState::Ready);
        assert_eq!(fab.store().next_edges[0][0], EdgeId(2));
    }
}

// ── Builder & fab set ─────────────────────────────────────────────────────────

mod assembly {
    use super::*;
    use crate::SimError;

    #[test]
    fn placement_on_unknown_edge_is_fatal() {
        let result = FabBuilder::new(chain(2), SimParams::default())
            .vehicles(vec![VehiclePlacement::new(EdgeId(9), 0.0)])
            .build();
        assert!(matches!(result, Err(SimError::PlacementOnUnknownEdge { .. })));
    }

    #[test]
    fn placements_seed_kinematics_from_params() {
        let params = SimParams { linear_acceleration: 3.5, linear_deceleration: 4.5, ..SimParams::default() };
        let fab = FabBuilder::new(chain(2), params)
            .vehicles(vec![VehiclePlacement::new(EdgeId(2), 0.25)])
            .build()
            .unwrap();
        assert_eq!(fab.store().current_edge[0], EdgeId(2));
        assert_eq!(fab.store().edge_ratio[0], 0.25);
        assert_eq!(fab.store().acceleration[0], 3.5);
        assert_eq!(fab.store().deceleration[0], 4.5);
    }

    #[test]
    fn fab_set_ticks_every_member() {
        let make = || {
            FabBuilder::new(chain(2), SimParams::default())
                .vehicles(vec![VehiclePlacement::new(EdgeId(1), 0.0)])
                .build()
                .unwrap()
        };
        let mut set = FabSet::new(vec![make(), make()]);
        set.tick_all(0.1);
        assert_eq!(set.fab(0).unwrap().tick_index(), 1);
        assert_eq!(set.fab(1).unwrap().tick_index(), 1);
    }
}
