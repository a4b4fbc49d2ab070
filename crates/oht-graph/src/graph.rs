//! The immutable rail graph and its builder.
//!
//! # Data layout
//!
//! Per-edge data is column-oriented and **1-based**: every table carries a
//! dead row at index 0 so an `EdgeId` indexes directly without adjustment
//! (`EdgeId::NONE == 0` is the shared "no edge" sentinel of the vehicle
//! columns and checkpoint records).
//!
//! Adjacency is stored as the declared `next_edges` list per edge plus a
//! derived reverse index (`incoming_edges[e]` = edges whose `to` node is
//! `e`'s `from` node).  Node names are interned to `NodeId` handles at build
//! time; the merge set and lock tables key on the handle, never the string.
//!
//! # Derived facts
//!
//! - **merge node** — a node with in-degree ≥ 2,
//! - **region** — connected component of the undirected projection of the
//!   edge graph (breadth-first over forward ∪ reverse adjacency),
//! - **diverge** — an edge whose `to` node has more than one outgoing edge.
//!
//! All lookups exposed to the per-tick subsystems are O(1).

use rustc_hash::FxHashMap;
use tracing::warn;

use oht_core::{EdgeId, NodeId, RegionId, StationId};

use crate::edge::{EdgeDef, RailKind, StationDef};
use crate::GraphError;

// ── Station ───────────────────────────────────────────────────────────────────

/// A validated station: name, pinned edge, and the region inherited from it.
#[derive(Clone, Debug)]
pub struct Station {
    pub name: String,
    pub edge: EdgeId,
    pub region: RegionId,
}

// ── RailGraph ─────────────────────────────────────────────────────────────────

/// Immutable edge/node/station tables.  Built once via [`RailGraphBuilder`];
/// never mutated afterwards.
pub struct RailGraph {
    // ── Node data (0-based, by NodeId) ────────────────────────────────────
    node_names: Vec<String>,
    node_ids: FxHashMap<String, NodeId>,
    /// `true` for nodes with in-degree ≥ 2.
    merge_node: Vec<bool>,

    // ── Edge data (1-based, slot 0 dead) ──────────────────────────────────
    edge_from: Vec<NodeId>,
    edge_to: Vec<NodeId>,
    edge_distance: Vec<f32>,
    edge_kind: Vec<RailKind>,
    edge_radius: Vec<Option<f32>>,
    edge_waiting_offset: Vec<Option<f32>>,
    next_edges: Vec<Vec<EdgeId>>,
    incoming_edges: Vec<Vec<EdgeId>>,
    to_node_diverge: Vec<bool>,
    edge_region: Vec<RegionId>,
    pub(crate) polylines: Vec<Vec<[f32; 3]>>,
    /// Cumulative polyline segment lengths, cached for interpolation.
    pub(crate) cum_lengths: Vec<Vec<f32>>,

    // ── Stations ──────────────────────────────────────────────────────────
    stations: Vec<Station>,
    stations_by_region: Vec<Vec<StationId>>,

    region_count: u32,
}

impl RailGraph {
    // ── Dimensions ────────────────────────────────────────────────────────

    /// Number of real edges (ids 1..=edge_count).
    pub fn edge_count(&self) -> usize {
        self.edge_from.len() - 1
    }

    pub fn node_count(&self) -> usize {
        self.node_names.len()
    }

    pub fn station_count(&self) -> usize {
        self.stations.len()
    }

    pub fn region_count(&self) -> usize {
        self.region_count as usize
    }

    /// `true` for ids addressing a real edge.
    #[inline]
    pub fn contains_edge(&self, edge: EdgeId) -> bool {
        edge.is_some() && edge.index() <= self.edge_count()
    }

    // ── Edge lookups (all O(1)) ───────────────────────────────────────────

    #[inline]
    pub fn from_node(&self, edge: EdgeId) -> NodeId {
        self.edge_from[edge.index()]
    }

    #[inline]
    pub fn to_node(&self, edge: EdgeId) -> NodeId {
        self.edge_to[edge.index()]
    }

    /// Length in metres.
    #[inline]
    pub fn distance(&self, edge: EdgeId) -> f32 {
        self.edge_distance[edge.index()]
    }

    #[inline]
    pub fn kind(&self, edge: EdgeId) -> RailKind {
        self.edge_kind[edge.index()]
    }

    #[inline]
    pub fn is_curve(&self, edge: EdgeId) -> bool {
        self.edge_kind[edge.index()].is_curve()
    }

    #[inline]
    pub fn radius(&self, edge: EdgeId) -> Option<f32> {
        self.edge_radius[edge.index()]
    }

    /// The edge's own waiting offset, if the map declared one.
    #[inline]
    pub fn waiting_offset(&self, edge: EdgeId) -> Option<f32> {
        self.edge_waiting_offset[edge.index()]
    }

    /// Outgoing edges from this edge's `to` node, in declared order.
    #[inline]
    pub fn next_of(&self, edge: EdgeId) -> &[EdgeId] {
        &self.next_edges[edge.index()]
    }

    /// Edges whose `to` node is this edge's `from` node.
    #[inline]
    pub fn incoming_of(&self, edge: EdgeId) -> &[EdgeId] {
        &self.incoming_edges[edge.index()]
    }

    /// `true` iff the edge's `to` node has more than one outgoing edge.
    #[inline]
    pub fn to_node_is_diverge(&self, edge: EdgeId) -> bool {
        self.to_node_diverge[edge.index()]
    }

    #[inline]
    pub fn region_of(&self, edge: EdgeId) -> RegionId {
        self.edge_region[edge.index()]
    }

    // ── Node lookups ──────────────────────────────────────────────────────

    #[inline]
    pub fn is_merge_node(&self, node: NodeId) -> bool {
        node != NodeId::INVALID && self.merge_node[node.index()]
    }

    pub fn node_name(&self, node: NodeId) -> &str {
        &self.node_names[node.index()]
    }

    pub fn node_id(&self, name: &str) -> Option<NodeId> {
        self.node_ids.get(name).copied()
    }

    /// The merge node a vehicle entering `edge` passes through, if any.
    #[inline]
    pub fn merge_node_of(&self, edge: EdgeId) -> Option<NodeId> {
        if !self.contains_edge(edge) {
            return None;
        }
        let node = self.from_node(edge);
        self.merge_node[node.index()].then_some(node)
    }

    // ── Stations ──────────────────────────────────────────────────────────

    pub fn station(&self, station: StationId) -> &Station {
        &self.stations[station.index()]
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    /// Stations sharing a region with `edge`, in insertion order.
    pub fn stations_in_region(&self, edge: EdgeId) -> &[StationId] {
        if !self.contains_edge(edge) {
            return &[];
        }
        let region = self.edge_region[edge.index()];
        &self.stations_by_region[region.index()]
    }
}

// ── RailGraphBuilder ──────────────────────────────────────────────────────────

/// Accumulates edge and station records, then validates and freezes them
/// into a [`RailGraph`].
///
/// Edge ids are assigned sequentially from 1 in insertion order.  `build()`
/// fails on dangling or node-inconsistent `next_edges` (the fatal class of
/// init errors); stations pointing at unknown edges are dropped with a
/// warning (the recoverable class).
pub struct RailGraphBuilder {
    edges: Vec<EdgeDef>,
    stations: Vec<StationDef>,
}

impl RailGraphBuilder {
    pub fn new() -> Self {
        Self { edges: Vec::new(), stations: Vec::new() }
    }

    pub fn with_capacity(edges: usize) -> Self {
        Self { edges: Vec::with_capacity(edges), stations: Vec::new() }
    }

    /// Add an edge and return its 1-based id.
    pub fn add_edge(&mut self, def: EdgeDef) -> EdgeId {
        self.edges.push(def);
        EdgeId(self.edges.len() as u32)
    }

    pub fn add_station(&mut self, def: StationDef) -> &mut Self {
        self.stations.push(def);
        self
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Validate, derive the reverse index / merge set / regions, and freeze.
    pub fn build(self) -> Result<RailGraph, GraphError> {
        let edge_count = self.edges.len();
        let table_len = edge_count + 1;

        // ── Intern node names ─────────────────────────────────────────────
        fn intern(
            name: &str,
            node_names: &mut Vec<String>,
            node_ids: &mut FxHashMap<String, NodeId>,
        ) -> NodeId {
            if let Some(&id) = node_ids.get(name) {
                return id;
            }
            let id = NodeId(node_names.len() as u32);
            node_names.push(name.to_owned());
            node_ids.insert(name.to_owned(), id);
            id
        }
        let mut node_ids: FxHashMap<String, NodeId> = FxHashMap::default();
        let mut node_names: Vec<String> = Vec::new();

        let mut edge_from = vec![NodeId::INVALID; table_len];
        let mut edge_to = vec![NodeId::INVALID; table_len];
        let mut edge_distance = vec![0.0_f32; table_len];
        let mut edge_kind = vec![RailKind::Linear; table_len];
        let mut edge_radius = vec![None; table_len];
        let mut edge_waiting_offset = vec![None; table_len];
        let mut next_edges: Vec<Vec<EdgeId>> = vec![Vec::new(); table_len];
        let mut polylines: Vec<Vec<[f32; 3]>> = vec![Vec::new(); table_len];

        for (i, def) in self.edges.iter().enumerate() {
            let id = i + 1;
            if !(def.distance_m > 0.0) {
                return Err(GraphError::BadDistance { edge: EdgeId(id as u32), distance_m: def.distance_m });
            }
            edge_from[id] = intern(&def.from, &mut node_names, &mut node_ids);
            edge_to[id] = intern(&def.to, &mut node_names, &mut node_ids);
            edge_distance[id] = def.distance_m;
            edge_kind[id] = def.kind;
            edge_radius[id] = def.radius_m;
            edge_waiting_offset[id] = def.waiting_offset_m;
            next_edges[id] = def.next_edges.clone();
            polylines[id] = def.rendering_points.clone();
        }

        // ── Validate forward adjacency ────────────────────────────────────
        for id in 1..table_len {
            let edge = EdgeId(id as u32);
            for &next in &next_edges[id] {
                if next.is_none() || next.index() >= table_len {
                    return Err(GraphError::DanglingNextEdge { edge, next });
                }
                if edge_from[next.index()] != edge_to[id] {
                    return Err(GraphError::DisconnectedNextEdge { edge, next });
                }
            }
        }

        // ── Reverse index: predecessors of each edge ──────────────────────
        // incoming_edges[e] = all g with g.to == e.from, i.e. g such that
        // e ∈ next_edges[g] once adjacency is validated.  Built from the
        // node tables directly so edges with no declared successors still
        // get predecessors.
        let mut edges_into_node: Vec<Vec<EdgeId>> = vec![Vec::new(); node_names.len()];
        for id in 1..table_len {
            edges_into_node[edge_to[id].index()].push(EdgeId(id as u32));
        }
        let mut incoming_edges: Vec<Vec<EdgeId>> = vec![Vec::new(); table_len];
        for id in 1..table_len {
            incoming_edges[id] = edges_into_node[edge_from[id].index()].clone();
        }

        // ── Merge set: nodes with in-degree ≥ 2 ───────────────────────────
        let merge_node: Vec<bool> = edges_into_node.iter().map(|v| v.len() >= 2).collect();

        // ── Diverge flags ─────────────────────────────────────────────────
        let to_node_diverge: Vec<bool> = (0..table_len)
            .map(|id| next_edges[id].len() > 1)
            .collect();

        // ── Region labelling: BFS over the undirected projection ──────────
        let mut edge_region = vec![RegionId::INVALID; table_len];
        let mut region_count = 0_u32;
        let mut queue: Vec<EdgeId> = Vec::new();
        for seed in 1..table_len {
            if edge_region[seed] != RegionId::INVALID {
                continue;
            }
            let region = RegionId(region_count);
            region_count += 1;
            edge_region[seed] = region;
            queue.clear();
            queue.push(EdgeId(seed as u32));
            let mut head = 0;
            while head < queue.len() {
                let e = queue[head];
                head += 1;
                for &n in next_edges[e.index()].iter().chain(&incoming_edges[e.index()]) {
                    if edge_region[n.index()] == RegionId::INVALID {
                        edge_region[n.index()] = region;
                        queue.push(n);
                    }
                }
            }
        }

        // ── Stations: validate, inherit region ────────────────────────────
        let mut stations: Vec<Station> = Vec::new();
        let mut stations_by_region: Vec<Vec<StationId>> = vec![Vec::new(); region_count as usize];
        for def in self.stations {
            if def.nearest_edge.is_none() || def.nearest_edge.index() >= table_len {
                warn!(station = %def.name, edge = %def.nearest_edge, "dropping station on unknown edge");
                continue;
            }
            let region = edge_region[def.nearest_edge.index()];
            let id = StationId(stations.len() as u32);
            stations.push(Station { name: def.name, edge: def.nearest_edge, region });
            stations_by_region[region.index()].push(id);
        }

        // ── Interpolation cache ───────────────────────────────────────────
        let cum_lengths = crate::interpolate::cumulative_lengths(&polylines);

        Ok(RailGraph {
            node_names,
            node_ids,
            merge_node,
            edge_from,
            edge_to,
            edge_distance,
            edge_kind,
            edge_radius,
            edge_waiting_offset,
            next_edges,
            incoming_edges,
            to_node_diverge,
            edge_region,
            polylines,
            cum_lengths,
            stations,
            stations_by_region,
            region_count,
        })
    }
}

impl Default for RailGraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}
