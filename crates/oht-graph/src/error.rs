use oht_core::EdgeId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("edge {edge} declares non-existent next edge {next}")]
    DanglingNextEdge { edge: EdgeId, next: EdgeId },

    #[error("edge {edge} declares next edge {next} that does not start at its end node")]
    DisconnectedNextEdge { edge: EdgeId, next: EdgeId },

    #[error("edge {edge} has non-positive distance {distance_m}")]
    BadDistance { edge: EdgeId, distance_m: f32 },
}

pub type GraphResult<T> = Result<T, GraphError>;
