use thiserror::Error;

use crate::ids::{ClientId, Id};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("malformed event: {0}")]
    MalformedEvent(String),
    #[error("block not found: {0}")]
    NotFound(Id),
    #[error("position {pos} out of bounds for sequence with length {len}")]
    PositionOutOfBounds { pos: usize, len: usize },
    #[error("client {0} has authored blocks still waiting on prerequisites")]
    OwnBlocksPending(ClientId),
    #[error("inconsistent state: {0}")]
    InconsistentState(String),
    #[error("serialization error: {0}")]
    Serialization(String),
}
