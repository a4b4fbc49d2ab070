//! `oht-core` — foundational types for the `ohtsim` fleet simulation kernel.
//!
//! This crate is a dependency of every other `oht-*` crate.  It intentionally
//! has no `oht-*` dependencies and minimal external ones (`rand`, `thiserror`,
//! `bitflags`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module         | Contents                                               |
//! |----------------|--------------------------------------------------------|
//! | [`ids`]        | `VehicleId`, `EdgeId`, `NodeId`, `StationId`, `RegionId` |
//! | [`checkpoint`] | `Checkpoint`, `CheckpointFlags`                        |
//! | [`params`]     | `SimParams` — every recognized tunable with defaults   |
//! | [`pose`]       | `Pose` — interpolated world position + heading         |
//! | [`rng`]        | `SimRng` — per-fab deterministic RNG                   |
//! | [`error`]      | `OhtError`, `OhtResult`                                |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                      |
//! |---------|-------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.         |

pub mod checkpoint;
pub mod error;
pub mod ids;
pub mod params;
pub mod pose;
pub mod rng;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use checkpoint::{Checkpoint, CheckpointFlags};
pub use error::{OhtError, OhtResult};
pub use ids::{EdgeId, NodeId, RegionId, StationId, VehicleId};
pub use params::SimParams;
pub use pose::Pose;
pub use rng::SimRng;
