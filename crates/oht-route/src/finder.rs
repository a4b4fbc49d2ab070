//! Shortest-path engine over the edge-as-node graph.
//!
//! # Model
//!
//! Edges are the graph *nodes*: the neighbours of edge `u` are
//! `graph.next_of(u)`, and stepping to a neighbour costs that neighbour's
//! `distance` — you pay to *enter* an edge.  The returned path includes both
//! endpoints, so consecutive elements always satisfy the `next_of` adjacency.
//!
//! # Steady-state allocation
//!
//! All scratch state (the flat binary heap, `dist`/`prev`, visit stamps) is
//! owned by the finder and reused across calls.  Stale `dist` entries are
//! invalidated by bumping a per-call epoch instead of rewriting the arrays.
//! After warm-up the only allocation per call is the reconstructed path.
//!
//! # Cache
//!
//! Successful results are kept in an LRU cache of 2000 `(start, end)` keys;
//! a hit returns a clone.  The finder never invalidates on its own — a host
//! that swaps the graph calls [`PathFinder::invalidate_cache`].

use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;

use oht_core::EdgeId;
use oht_graph::RailGraph;

/// Result-cache capacity (distinct `(start, end)` keys).
const CACHE_CAPACITY: NonZeroUsize = NonZeroUsize::new(2000).unwrap();

// ── Stats ─────────────────────────────────────────────────────────────────────

/// Advisory timing stats.  Never feeds back into results.
#[derive(Copy, Clone, Debug)]
pub struct PathFinderStats {
    /// Calls serviced, cache hits included.
    pub calls: u64,
    /// Calls answered from the LRU cache.
    pub cache_hits: u64,
    pub total: Duration,
    pub min: Duration,
    pub max: Duration,
}

impl Default for PathFinderStats {
    fn default() -> Self {
        Self {
            calls: 0,
            cache_hits: 0,
            total: Duration::ZERO,
            min: Duration::MAX,
            max: Duration::ZERO,
        }
    }
}

impl PathFinderStats {
    fn record(&mut self, elapsed: Duration) {
        self.calls += 1;
        self.total += elapsed;
        self.min = self.min.min(elapsed);
        self.max = self.max.max(elapsed);
    }
}

// ── Heap scratch ──────────────────────────────────────────────────────────────

/// One heap slot: priority pair plus an insertion sequence number so equal
/// costs pop in insertion order (deterministic tie-breaking).
#[derive(Copy, Clone)]
struct HeapEntry {
    cost: f32,
    seq: u32,
    edge: EdgeId,
}

impl HeapEntry {
    #[inline]
    fn key(&self) -> (f32, u32) {
        (self.cost, self.seq)
    }
}

/// A binary min-heap in a flat reusable array.
#[derive(Default)]
struct MinHeap {
    slots: Vec<HeapEntry>,
}

impl MinHeap {
    fn clear(&mut self) {
        self.slots.clear();
    }

    fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn push(&mut self, entry: HeapEntry) {
        self.slots.push(entry);
        let mut i = self.slots.len() - 1;
        while i > 0 {
            let parent = (i - 1) / 2;
            if self.slots[i].key() < self.slots[parent].key() {
                self.slots.swap(i, parent);
                i = parent;
            } else {
                break;
            }
        }
    }

    fn pop(&mut self) -> Option<HeapEntry> {
        if self.slots.is_empty() {
            return None;
        }
        let top = self.slots.swap_remove(0);
        let len = self.slots.len();
        let mut i = 0;
        loop {
            let l = 2 * i + 1;
            let r = 2 * i + 2;
            let mut smallest = i;
            if l < len && self.slots[l].key() < self.slots[smallest].key() {
                smallest = l;
            }
            if r < len && self.slots[r].key() < self.slots[smallest].key() {
                smallest = r;
            }
            if smallest == i {
                break;
            }
            self.slots.swap(i, smallest);
            i = smallest;
        }
        Some(top)
    }
}

// ── PathFinder ────────────────────────────────────────────────────────────────

/// Dijkstra over edges with reusable scratch and an LRU result cache.
pub struct PathFinder {
    cache: LruCache<(EdgeId, EdgeId), Vec<EdgeId>>,

    // Scratch, sized to the edge table (1-based, slot 0 dead).
    dist: Vec<f32>,
    prev: Vec<EdgeId>,
    /// `dist[i]`/`prev[i]` are valid only while `stamp[i] == epoch`.
    stamp: Vec<u32>,
    epoch: u32,
    heap: MinHeap,

    stats: PathFinderStats,
}

impl PathFinder {
    pub fn new() -> Self {
        Self {
            cache: LruCache::new(CACHE_CAPACITY),
            dist: Vec::new(),
            prev: Vec::new(),
            stamp: Vec::new(),
            epoch: 0,
            heap: MinHeap::default(),
            stats: PathFinderStats::default(),
        }
    }

    /// Shortest path from `start` to `end`, both endpoints included.
    ///
    /// `None` for out-of-range endpoints or an unreachable `end`;
    /// `Some([start])` when the endpoints coincide.
    pub fn shortest_path(
        &mut self,
        graph: &RailGraph,
        start: EdgeId,
        end: EdgeId,
    ) -> Option<Vec<EdgeId>> {
        let t0 = Instant::now();
        let result = self.shortest_path_inner(graph, start, end);
        self.stats.record(t0.elapsed());
        result
    }

    fn shortest_path_inner(
        &mut self,
        graph: &RailGraph,
        start: EdgeId,
        end: EdgeId,
    ) -> Option<Vec<EdgeId>> {
        if !graph.contains_edge(start) || !graph.contains_edge(end) {
            return None;
        }
        if start == end {
            return Some(vec![start]);
        }
        if let Some(cached) = self.cache.get(&(start, end)) {
            self.stats.cache_hits += 1;
            return Some(cached.clone());
        }

        self.prepare_scratch(graph.edge_count() + 1);

        self.mark(start, 0.0, EdgeId::NONE);
        self.heap.clear();
        let mut seq = 0_u32;
        self.heap.push(HeapEntry { cost: 0.0, seq, edge: start });

        let mut found = false;
        while let Some(entry) = self.heap.pop() {
            let e = entry.edge;
            // Early exit: popping the destination settles it.
            if e == end {
                found = true;
                break;
            }
            // Skip stale entries superseded by a cheaper relaxation.
            if entry.cost > self.dist[e.index()] {
                continue;
            }
            for &n in graph.next_of(e) {
                let ncost = entry.cost + graph.distance(n);
                if !self.is_settled_or_better(n, ncost) {
                    self.mark(n, ncost, e);
                    seq += 1;
                    self.heap.push(HeapEntry { cost: ncost, seq, edge: n });
                }
            }
        }
        if !found {
            return None;
        }

        // Reconstruct forward by following prev[] from the destination.
        let mut path = Vec::new();
        let mut cur = end;
        while cur.is_some() {
            path.push(cur);
            cur = self.prev[cur.index()];
        }
        path.reverse();
        debug_assert_eq!(path.first().copied(), Some(start));

        self.cache.put((start, end), path.clone());
        Some(path)
    }

    /// Timing stats for `path_finder_stats()` introspection.
    pub fn stats(&self) -> PathFinderStats {
        self.stats
    }

    /// Number of cached results (introspection / tests).
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Drop all cached paths.  Call after replacing the graph.
    pub fn invalidate_cache(&mut self) {
        self.cache.clear();
    }

    // ── Scratch management ────────────────────────────────────────────────

    fn prepare_scratch(&mut self, table_len: usize) {
        if self.dist.len() < table_len {
            self.dist.resize(table_len, f32::INFINITY);
            self.prev.resize(table_len, EdgeId::NONE);
            self.stamp.resize(table_len, 0);
        }
        self.epoch = match self.epoch.checked_add(1) {
            Some(e) => e,
            None => {
                // Epoch wrapped: wipe stamps once and restart from 1.
                self.stamp.fill(0);
                1
            }
        };
    }

    #[inline]
    fn mark(&mut self, edge: EdgeId, cost: f32, prev: EdgeId) {
        let i = edge.index();
        self.dist[i] = cost;
        self.prev[i] = prev;
        self.stamp[i] = self.epoch;
    }

    /// `true` if `edge` already has a recorded cost ≤ `cost` this epoch.
    #[inline]
    fn is_settled_or_better(&self, edge: EdgeId, cost: f32) -> bool {
        self.stamp[edge.index()] == self.epoch && self.dist[edge.index()] <= cost
    }
}

impl Default for PathFinder {
    fn default() -> Self {
        Self::new()
    }
}
