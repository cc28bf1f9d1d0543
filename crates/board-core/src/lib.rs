//! Chess position state, move validation, and board annotations for the
//! coaching session layer. Everything speaks FEN/SAN/UCI strings at the
//! boundary; shakmaty stays an implementation detail apart from the square,
//! role, and color types re-exported here.

pub mod annotations;
pub mod error;
pub mod position;
pub mod validator;

pub use shakmaty::{Color, Role, Square};

pub use annotations::{AnnotationOverlay, ArrowSpec};
pub use error::{MoveError, PositionError};
pub use position::PositionModel;
pub use validator::{
    apply_move, is_terminal, legal_moves, side_to_move, validate_fen, AppliedMove, MoveInput,
    MoveRecord, TerminalState, STARTING_FEN,
};
