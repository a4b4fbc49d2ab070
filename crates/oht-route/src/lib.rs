//! `oht-route` — path finding and route checkpoint construction.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                |
//! |----------------|---------------------------------------------------------|
//! | [`finder`]     | `PathFinder` — Dijkstra over edges, LRU-cached, reusable scratch |
//! | [`checkpoint`] | `build_route_checkpoints` — path → ordered checkpoint list |
//!
//! Both halves are pure with respect to vehicle state: the finder reads only
//! the graph, the builder reads the graph and the parameter set.  Installing
//! the results into vehicles is the transfer manager's job.

pub mod checkpoint;
pub mod finder;


pub use checkpoint::build_route_checkpoints;
pub use finder::{PathFinder, PathFinderStats};
