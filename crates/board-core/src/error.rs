//! Position and move error types.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PositionError {
    #[error("Invalid FEN: {0}")]
    InvalidFen(String),

    #[error("Illegal position setup: {0}")]
    IllegalSetup(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoveError {
    #[error(transparent)]
    Position(#[from] PositionError),

    #[error("Unparsable move: {0}")]
    Unparsable(String),

    #[error("Illegal move {input} in {fen}")]
    Illegal { input: String, fen: String },
}
