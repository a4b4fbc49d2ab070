//! Tunable simulation parameters.
//!
//! One `SimParams` value per fab, constructed by the embedding application
//! (config-file parsing is out of scope for the kernel) and passed to the fab
//! builder.  Every knob the kernel recognizes lives here with its default, so
//! a `SimParams::default()` fab is runnable as-is.
//!
//! Units: metres, seconds, m/s, m/s².  Intervals are in ticks.

/// All recognized tunables for one fab instance.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimParams {
    // ── Kinematics ────────────────────────────────────────────────────────
    /// Hard speed cap on linear edges (m/s).
    pub linear_max_speed: f32,
    /// Hard speed cap on curve edges (m/s).
    pub curve_max_speed: f32,
    /// Default acceleration on linear edges (m/s²).
    pub linear_acceleration: f32,
    /// Default service deceleration (m/s²), used for sensor braking and
    /// stopping at a target ratio.
    pub linear_deceleration: f32,
    /// Acceleration while on a curve edge (m/s²).
    pub curve_acceleration: f32,
    /// Deceleration used when pre-braking ahead of an upcoming curve (m/s²).
    pub linear_pre_brake_deceleration: f32,

    // ── Tick control ──────────────────────────────────────────────────────
    /// Upper clamp on the `dt` passed to `tick` (s).  Protects the
    /// integration from huge steps after a host stall.
    pub max_delta: f32,
    /// Cadence (ticks) of the external collision/sensor scan.  Carried here
    /// because the sensor subsystem reads it; the kernel itself only stores it.
    pub collision_check_interval: u32,
    /// Cadence (ticks, per vehicle) of the curve pre-brake lookahead scan.
    pub curve_pre_brake_check_interval: u32,

    // ── Vehicle body (consumed by external sensor geometry) ───────────────
    pub body_length: f32,
    pub body_width: f32,

    // ── Checkpoint geometry ───────────────────────────────────────────────
    /// Lookahead distance (m) required before entering a straight edge.
    pub straight_request_distance: f32,
    /// Lookahead distance (m) required before entering a curve edge.
    pub curve_request_distance: f32,
    /// Ratio on the post-merge edge at which the release checkpoint fires.
    pub release_ratio: f32,
    /// Fallback stop-short distance (m) before a merge when an edge carries
    /// no `waiting_offset` of its own.
    pub default_waiting_offset: f32,

    // ── Auto-router budgets ───────────────────────────────────────────────
    /// Max `shortest_path` invocations per tick (successful or not).
    pub max_path_finds_per_frame: u32,
    /// Max candidate stations tried per vehicle before giving up this tick.
    pub max_attempts: u32,

    // ── Capacities ────────────────────────────────────────────────────────
    /// Per-vehicle path buffer capacity (edges).
    pub max_path_length: usize,
    /// Per-vehicle checkpoint array capacity; overflow truncates with a warning.
    pub max_checkpoints_per_vehicle: usize,

    // ── Determinism ───────────────────────────────────────────────────────
    /// Master RNG seed.  The same seed always produces identical results.
    pub seed: u64,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            linear_max_speed:              5.0,
            curve_max_speed:               1.5,
            linear_acceleration:           2.0,
            linear_deceleration:           3.0,
            curve_acceleration:            1.0,
            linear_pre_brake_deceleration: 1.5,

            max_delta:                     0.1,
            collision_check_interval:      3,
            curve_pre_brake_check_interval: 10,

            body_length:                   1.2,
            body_width:                    0.6,

            straight_request_distance:     5.1,
            curve_request_distance:        1.0,
            release_ratio:                 0.01,
            default_waiting_offset:        1.89,

            max_path_finds_per_frame:      10,
            max_attempts:                  5,

            max_path_length:               100,
            max_checkpoints_per_vehicle:   256,

            seed:                          0,
        }
    }
}
