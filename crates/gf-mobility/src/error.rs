use gf_core::{AgentId, GridCoord};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MobilityError {
    #[error("cell {cell} is held by {holder}, cannot start {agent} there")]
    CellTaken {
        cell:   GridCoord,
        agent:  AgentId,
        holder: AgentId,
    },

    #[error("{0} has no flow field bound")]
    NoField(AgentId),
}

pub type MobilityResult<T> = Result<T, MobilityError>;
