//! `oht-graph` — the immutable rail graph for the ohtsim kernel.
//!
//! # Crate layout
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`edge`]        | `EdgeDef`, `StationDef`, `RailKind` input records     |
//! | [`graph`]       | `RailGraph` tables + `RailGraphBuilder`               |
//! | [`interpolate`] | `(edge, ratio) → Pose` over cached polylines          |
//! | [`error`]       | `GraphError`, `GraphResult<T>`                        |
//!
//! The graph is built once from edge records and never mutated.  Everything
//! the per-tick subsystems ask of it — successor lists, merge membership,
//! regions, stations per region — is a precomputed O(1) lookup.

pub mod edge;
pub mod error;
pub mod graph;
pub mod interpolate;

#[cfg(test)]
mod tests;

pub use edge::{EdgeDef, RailKind, StationDef};
pub use error::{GraphError, GraphResult};
pub use graph::{RailGraph, RailGraphBuilder, Station};
