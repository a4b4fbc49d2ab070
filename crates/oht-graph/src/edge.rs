//! Edge and station input records.
//!
//! These are the records the graph builder consumes.  The embedding
//! application produces them from whatever map format it uses (file parsing
//! is outside the kernel); tests construct them by hand.

use oht_core::EdgeId;

// ── RailKind ──────────────────────────────────────────────────────────────────

/// Geometric class of a rail edge.  Anything non-linear counts as a curve for
/// kinematics and checkpoint placement.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RailKind {
    #[default]
    Linear,
    CurveLeft,
    CurveRight,
}

impl RailKind {
    #[inline]
    pub fn is_curve(self) -> bool {
        !matches!(self, RailKind::Linear)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RailKind::Linear     => "linear",
            RailKind::CurveLeft  => "curve_left",
            RailKind::CurveRight => "curve_right",
        }
    }
}

impl std::fmt::Display for RailKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── EdgeDef ───────────────────────────────────────────────────────────────────

/// One directed rail segment as handed to the builder.
///
/// Edge ids are assigned sequentially from 1 in insertion order, so
/// `next_edges` refers to edges by their (known-ahead) insertion position.
/// Node names are free-form strings, interned by the builder.
#[derive(Clone, Debug)]
pub struct EdgeDef {
    pub from: String,
    pub to: String,
    /// Physical length in metres.  Must be > 0.
    pub distance_m: f32,
    pub kind: RailKind,
    /// Curve radius in metres, where the map provides one.
    pub radius_m: Option<f32>,
    /// Stop-short distance (m) before this edge's `to` node for a vehicle
    /// waiting on a merge there.  Falls back to the fab-wide default.
    pub waiting_offset_m: Option<f32>,
    /// Outgoing edges from `to`, in declared order.
    pub next_edges: Vec<EdgeId>,
    /// World-space polyline for pose interpolation.  May be empty; the
    /// kernel is otherwise blind to it.
    pub rendering_points: Vec<[f32; 3]>,
}

impl EdgeDef {
    /// A linear segment with no geometry attached.
    pub fn linear(from: impl Into<String>, to: impl Into<String>, distance_m: f32) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            distance_m,
            kind: RailKind::Linear,
            radius_m: None,
            waiting_offset_m: None,
            next_edges: Vec::new(),
            rendering_points: Vec::new(),
        }
    }

    /// A curve segment (direction defaults to left; kinematics only care
    /// about curve-vs-linear).
    pub fn curve(from: impl Into<String>, to: impl Into<String>, distance_m: f32) -> Self {
        Self { kind: RailKind::CurveLeft, ..Self::linear(from, to, distance_m) }
    }

    pub fn with_next(mut self, next: impl IntoIterator<Item = u32>) -> Self {
        self.next_edges = next.into_iter().map(EdgeId).collect();
        self
    }

    pub fn with_waiting_offset(mut self, offset_m: f32) -> Self {
        self.waiting_offset_m = Some(offset_m);
        self
    }

    pub fn with_radius(mut self, radius_m: f32) -> Self {
        self.radius_m = Some(radius_m);
        self
    }

    pub fn with_polyline(mut self, points: Vec<[f32; 3]>) -> Self {
        self.rendering_points = points;
        self
    }
}

// ── StationDef ────────────────────────────────────────────────────────────────

/// A named stop position, pinned to its nearest edge by the map tooling.
#[derive(Clone, Debug)]
pub struct StationDef {
    pub name: String,
    pub nearest_edge: EdgeId,
}

impl StationDef {
    pub fn new(name: impl Into<String>, nearest_edge: EdgeId) -> Self {
        Self { name: name.into(), nearest_edge }
    }
}
