//! `oht-vehicle` — column-oriented vehicle state storage.
//!
//! # Crate layout
//!
//! | Module    | Contents                                                     |
//! |-----------|--------------------------------------------------------------|
//! | [`store`] | `VehicleStore` — one dense column per §3 field               |
//! | [`path`]  | `PathBuffer` — fixed-capacity upcoming-edge queue            |
//! | [`state`] | `MovingStatus`, `NextEdgeState`, `TrafficState`, `HitZone`, `StopReason` |
//!
//! The store holds data, not behaviour.  The lock manager, motion
//! integrator, and transfer manager each own a disjoint set of columns and
//! borrow the store mutably in turn within a tick.

pub mod path;
pub mod state;
pub mod store;

#[cfg(test)]
mod tests;

pub use path::PathBuffer;
pub use state::{HitZone, MovingStatus, NextEdgeState, StopReason, TrafficState};
pub use store::{VehicleStore, LOOKAHEAD_SLOTS};
