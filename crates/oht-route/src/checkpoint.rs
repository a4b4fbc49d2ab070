//! Route checkpoint construction.
//!
//! Given a path (first edge already occupied), lay down the checkpoint
//! sequence that drives the merge protocol as the vehicle advances:
//!
//! - lookahead slots are refilled (`MOVE_PREPARE`) far enough ahead of every
//!   edge-to-edge transition,
//! - merges are requested (`LOCK_REQUEST`) in advance of arrival,
//! - a waiting point (`LOCK_WAIT`) sits *before* each merge for the case the
//!   grant has not arrived,
//! - the merge is released (`LOCK_RELEASE`) just after clearing it.
//!
//! # Placement rules
//!
//! The anchor for a target edge is found by walking *backward* through the
//! path from the target's start node, accumulating distance until the
//! required lookahead is covered.  Curves pin the point to their midpoint
//! instead — curve traversal speed is hard to predict, so the point is fixed
//! geometrically rather than by distance.  A path too short to cover the
//! distance anchors at the very first edge, ratio 0.

use tracing::warn;

use oht_core::{Checkpoint, CheckpointFlags, EdgeId, SimParams};
use oht_graph::RailGraph;

/// Build the ordered checkpoint list for `path`.
///
/// `path[0]` is the edge the vehicle currently occupies; transitions are
/// planned for every later element.  The result is sorted by path position
/// (primary) and ratio (secondary) and truncated at
/// `params.max_checkpoints_per_vehicle` with a warning.
pub fn build_route_checkpoints(
    graph: &RailGraph,
    params: &SimParams,
    path: &[EdgeId],
) -> Vec<Checkpoint> {
    let mut cps: Vec<Checkpoint> = Vec::new();

    for i in 1..path.len() {
        let target = path[i];
        let incoming = path[i - 1];
        let into_merge = graph.is_merge_node(graph.from_node(target));
        let required = if graph.is_curve(target) {
            params.curve_request_distance
        } else {
            params.straight_request_distance
        };

        // ── Prepare / request points ──────────────────────────────────────
        if graph.is_curve(incoming) && into_merge {
            // Entering the merge off a curve: the prepare point pins to the
            // curve midpoint; the request gets its own (short) walk.
            let (edge, ratio) = walk_back(graph, path, i, required);
            cps.push(cp(edge, ratio, CheckpointFlags::MOVE_PREPARE, target));
            let (edge, ratio) = walk_back(graph, path, i, params.curve_request_distance);
            cps.push(cp(edge, ratio, CheckpointFlags::LOCK_REQUEST, target));
        } else if !graph.is_curve(incoming) && into_merge && graph.is_curve(target) {
            // Straight approach into a curve behind a merge: prepare late
            // (curve distance), request early (straight distance).
            let (edge, ratio) = walk_back(graph, path, i, params.curve_request_distance);
            cps.push(cp(edge, ratio, CheckpointFlags::MOVE_PREPARE, target));
            let (edge, ratio) = walk_back(graph, path, i, params.straight_request_distance);
            cps.push(cp(edge, ratio, CheckpointFlags::LOCK_REQUEST, target));
        } else {
            let (edge, ratio) = walk_back(graph, path, i, required);
            let mut flags = CheckpointFlags::MOVE_PREPARE;
            if into_merge {
                flags |= CheckpointFlags::LOCK_REQUEST;
            }
            cps.push(cp(edge, ratio, flags, target));
        }

        // ── Waiting point + release ───────────────────────────────────────
        if into_merge {
            let (edge, ratio) = if graph.is_curve(incoming) {
                // Stop at the curve's start; holding mid-curve is not allowed.
                (incoming, 0.0)
            } else {
                let offset = graph
                    .waiting_offset(incoming)
                    .unwrap_or(params.default_waiting_offset);
                walk_back_plain(graph, path, i, offset)
            };
            cps.push(cp(edge, ratio, CheckpointFlags::LOCK_WAIT, target));
            cps.push(cp(target, params.release_ratio, CheckpointFlags::LOCK_RELEASE, target));
        }
    }

    sort_by_path_position(path, &mut cps);

    if cps.len() > params.max_checkpoints_per_vehicle {
        warn!(
            count = cps.len(),
            capacity = params.max_checkpoints_per_vehicle,
            "checkpoint overflow; truncating tail — later merges fall back to catch-up handling"
        );
        cps.truncate(params.max_checkpoints_per_vehicle);
    }
    cps
}

#[inline]
fn cp(edge: EdgeId, ratio: f32, flags: CheckpointFlags, target: EdgeId) -> Checkpoint {
    Checkpoint { edge, ratio, flags, target }
}

/// Walk backward from `path[i]`'s start node until `required` metres are
/// covered.  A curve encountered on the way claims the point at its midpoint.
fn walk_back(graph: &RailGraph, path: &[EdgeId], i: usize, required: f32) -> (EdgeId, f32) {
    let mut acc = 0.0_f32;
    for j in (0..i).rev() {
        let edge = path[j];
        if graph.is_curve(edge) {
            return (edge, 0.5);
        }
        let len = graph.distance(edge);
        acc += len;
        if acc >= required {
            return (edge, (acc - required) / len);
        }
    }
    (path[0], 0.0)
}

/// Distance-only backward walk (no curve pinning) — used for waiting points,
/// which must sit exactly `required` metres short of the merge.
fn walk_back_plain(graph: &RailGraph, path: &[EdgeId], i: usize, required: f32) -> (EdgeId, f32) {
    let mut acc = 0.0_f32;
    for j in (0..i).rev() {
        let edge = path[j];
        let len = graph.distance(edge);
        acc += len;
        if acc >= required {
            return (edge, (acc - required) / len);
        }
    }
    (path[0], 0.0)
}

/// Sort by (first occurrence of `edge` in `path`, ratio ascending).
///
/// Checkpoints on edges not in the path (cannot happen for builder output,
/// but kept total) sort last.
fn sort_by_path_position(path: &[EdgeId], cps: &mut [Checkpoint]) {
    let pos = |edge: EdgeId| -> usize {
        path.iter().position(|&e| e == edge).unwrap_or(usize::MAX)
    };
    cps.sort_by(|a, b| {
        pos(a.edge)
            .cmp(&pos(b.edge))
            .then(a.ratio.total_cmp(&b.ratio))
    });
}
