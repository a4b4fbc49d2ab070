//! Kernel error base.
//!
//! Sub-crates define their own error enums and either convert into `OhtError`
//! via `From` impls or wrap it as one variant.  Per-tick operations never
//! return errors at all — the kernel's failure policy is "self-heal or log" —
//! so error types only appear on init-time and command surfaces.

use thiserror::Error;

use crate::{EdgeId, VehicleId};

/// The top-level error type for `oht-core` and a common base for sub-crates.
#[derive(Debug, Error)]
pub enum OhtError {
    #[error("vehicle {0} out of range")]
    VehicleOutOfRange(VehicleId),

    #[error("unknown edge {0}")]
    UnknownEdge(EdgeId),

    #[error("unknown node '{0}'")]
    UnknownNode(String),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Shorthand result type for `oht-*` crates that use the base error.
pub type OhtResult<T> = Result<T, OhtError>;
