//! `oht-lock` — merge-node mutual exclusion for the ohtsim kernel.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                  |
//! |-------------|-----------------------------------------------------------|
//! | [`manager`] | `LockManager` — grant queues, auto-release, checkpoint processing |
//! | [`zone`]    | `DeadlockZonePolicy` hook (`NoZones`, `EdgeListZones`)    |
//!
//! One `LockManager` exists per fab.  It owns the lock tables and the
//! pending-release registry outright; vehicle state is borrowed per call.
//! Processing order (ascending vehicle id, FIFO queues) is fully defined, so
//! runs are reproducible.

pub mod manager;
pub mod zone;


pub use manager::{LockManager, LockSnapshot};
pub use zone::{DeadlockZonePolicy, EdgeListZones, NoZones};
