//! Pose interpolation along edge polylines.
//!
//! The kernel treats `rendering_points` as opaque geometry: the only
//! operation is mapping an `(edge, ratio)` pair to a world-space [`Pose`].
//! Cumulative segment lengths are cached at build time so each lookup is a
//! binary search plus one lerp.

use oht_core::{EdgeId, Pose};

use crate::RailGraph;

/// Precompute cumulative lengths for every polyline (index 0 row stays empty).
pub(crate) fn cumulative_lengths(polylines: &[Vec<[f32; 3]>]) -> Vec<Vec<f32>> {
    polylines
        .iter()
        .map(|points| {
            if points.len() < 2 {
                return Vec::new();
            }
            let mut cum = Vec::with_capacity(points.len());
            cum.push(0.0);
            let mut total = 0.0_f32;
            for pair in points.windows(2) {
                total += segment_length(pair[0], pair[1]);
                cum.push(total);
            }
            cum
        })
        .collect()
}

#[inline]
fn segment_length(a: [f32; 3], b: [f32; 3]) -> f32 {
    let dx = b[0] - a[0];
    let dy = b[1] - a[1];
    let dz = b[2] - a[2];
    (dx * dx + dy * dy + dz * dz).sqrt()
}

impl RailGraph {
    /// World-space pose at `ratio` along `edge`.
    ///
    /// Ratio is clamped to `[0, 1]`.  Heading is taken from the active
    /// polyline segment.  Edges without a polyline (or with a degenerate
    /// one) interpolate to the origin — harmless for headless runs, which
    /// never read the pose columns.
    pub fn interpolate(&self, edge: EdgeId, ratio: f32) -> Pose {
        if !self.contains_edge(edge) {
            return Pose::default();
        }
        let points = &self.polylines[edge.index()];
        let cum = &self.cum_lengths[edge.index()];
        if points.len() < 2 {
            return match points.first() {
                Some(p) => Pose::new(p[0], p[1], p[2], 0.0),
                None    => Pose::default(),
            };
        }

        let total = *cum.last().unwrap_or(&0.0);
        if total <= 0.0 {
            let p = points[0];
            return Pose::new(p[0], p[1], p[2], 0.0);
        }

        let target = ratio.clamp(0.0, 1.0) * total;
        // First segment whose cumulative end covers `target`.
        let seg = match cum.binary_search_by(|c| c.total_cmp(&target)) {
            Ok(i)  => i.min(points.len() - 2),
            Err(i) => i.saturating_sub(1).min(points.len() - 2),
        };

        let seg_start = cum[seg];
        let seg_len = cum[seg + 1] - seg_start;
        let t = if seg_len > 0.0 { (target - seg_start) / seg_len } else { 0.0 };

        let a = points[seg];
        let b = points[seg + 1];
        let x = a[0] + (b[0] - a[0]) * t;
        let y = a[1] + (b[1] - a[1]) * t;
        let z = a[2] + (b[2] - a[2]) * t;
        let heading = (b[1] - a[1]).atan2(b[0] - a[0]);

        Pose::new(x, y, z, heading)
    }
}
