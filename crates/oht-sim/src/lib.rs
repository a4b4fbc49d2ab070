//! `oht-sim` — fab assembly and tick orchestration for the ohtsim kernel.
//!
//! # Per-tick phase order
//!
//! ```text
//! Fab::tick(dt):
//!   ① AutoRouter      — assign random station runs to idle vehicles
//!                       (AutoRoute mode, budgeted path-finds per tick)
//!   ② LockManager     — auto-release sweep, then per-vehicle checkpoint
//!                       processing (merge requests, waits, releases)
//!   ③ MotionIntegrator— velocity, ratio, edge transitions, pose
//!   ④ TransferManager — lookahead refills + reserved-edge merges
//! ```
//!
//! # Crate layout
//!
//! | Module       | Contents                                              |
//! |--------------|-------------------------------------------------------|
//! | [`fab`]      | `Fab<Z>` — one complete core instance                 |
//! | [`builder`]  | `FabBuilder`, `VehiclePlacement`                      |
//! | [`transfer`] | `TransferManager`, `Command`, `PathStep`              |
//! | [`router`]   | `AutoRouter`, `RouteMode`                             |
//! | [`fabs`]     | `FabSet` — independent fabs, optionally Rayon-ticked  |
//! | [`error`]    | `SimError`, `SimResult<T>`                            |
//!
//! # Cargo features
//!
//! | Feature    | Effect                                           |
//! |------------|--------------------------------------------------|
//! | `parallel` | `FabSet::tick_all` runs fabs on Rayon's pool.    |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use oht_core::SimParams;
//! use oht_sim::{FabBuilder, RouteMode, VehiclePlacement};
//!
//! let mut fab = FabBuilder::new(graph, SimParams::default())
//!     .vehicles(placements)
//!     .mode(RouteMode::AutoRoute)
//!     .build()?;
//! for _ in 0..10_000 {
//!     fab.tick(0.1);
//! }
//! ```

pub mod builder;
pub mod error;
pub mod fab;
pub mod fabs;
pub mod router;
pub mod transfer;

#[cfg(test)]
mod tests;

pub use builder::{FabBuilder, VehiclePlacement};
pub use error::{SimError, SimResult};
pub use fab::Fab;
pub use fabs::FabSet;
pub use router::{AutoRouter, RouteMode};
pub use transfer::{Command, PathStep, TransferManager};
