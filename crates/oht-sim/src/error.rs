use oht_core::{EdgeId, VehicleId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("vehicle {veh} placed on unknown edge {edge}")]
    PlacementOnUnknownEdge { veh: VehicleId, edge: EdgeId },

    #[error("simulation configuration error: {0}")]
    Config(String),
}

pub type SimResult<T> = Result<T, SimError>;
