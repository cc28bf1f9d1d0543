//! Session-level error types.

use board_core::{MoveError, PositionError};
use thiserror::Error;

use crate::events::InteractionMode;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("Board is in {active} mode, cannot switch to {requested}")]
    ModeConflict {
        active: InteractionMode,
        requested: InteractionMode,
    },

    #[error(transparent)]
    Board(#[from] MoveError),

    #[error(transparent)]
    Position(#[from] PositionError),

    #[error("Coach request failed: {0}")]
    Fetch(String),

    #[error("{0} not loaded")]
    NotLoaded(&'static str),

    #[error("No wizard step at index {0}")]
    NoSuchStep(usize),

    #[error("No plan is being recorded")]
    NoActivePlan,
}
