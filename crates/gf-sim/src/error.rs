use gf_core::{AgentId, GfError, GridCoord};
use gf_mobility::MobilityError;
use gf_spatial::SpatialError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation configuration error: {0}")]
    Config(String),

    #[error("{agent} starts at {cell}, outside the grid bounds")]
    AgentOutOfBounds {
        agent: AgentId,
        cell:  GridCoord,
    },

    #[error("{0} does not exist")]
    AgentNotFound(AgentId),

    #[error(transparent)]
    Spatial(#[from] SpatialError),

    #[error("mobility error: {0}")]
    Mobility(#[from] MobilityError),
}

impl From<GfError> for SimError {
    fn from(e: GfError) -> Self {
        match e {
            GfError::Config(msg)          => SimError::Config(msg),
            GfError::AgentNotFound(agent) => SimError::AgentNotFound(agent),
            other                         => SimError::Spatial(SpatialError::Core(other)),
        }
    }
}

pub type SimResult<T> = Result<T, SimError>;
