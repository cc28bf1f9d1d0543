//! Canonical board position with move history and replay-based undo.

use shakmaty::Color;
use tracing::warn;

use crate::error::{MoveError, PositionError};
use crate::validator::{self, AppliedMove, MoveInput, MoveRecord, STARTING_FEN};

/// Owns the position a renderer displays: current FEN, the snapshot it was
/// loaded from, and the moves played since. The FEN is always valid; bad
/// input falls back to the standard starting position.
#[derive(Debug, Clone)]
pub struct PositionModel {
    initial_fen: String,
    fen: String,
    history: Vec<MoveRecord>,
    orientation: Color,
}

impl Default for PositionModel {
    fn default() -> Self {
        Self::new()
    }
}

impl PositionModel {
    pub fn new() -> Self {
        Self {
            initial_fen: STARTING_FEN.to_string(),
            fen: STARTING_FEN.to_string(),
            history: Vec::new(),
            orientation: Color::White,
        }
    }

    /// Falls back to the starting position when `fen` does not parse.
    pub fn from_fen(fen: &str) -> Self {
        let mut model = Self::new();
        let _ = model.set_fen(fen);
        model
    }

    /// Load a new snapshot. History is cleared either way; on invalid input
    /// the model falls back to the starting position, logs, and returns the
    /// error so the caller can surface it. The model is never left invalid.
    pub fn set_fen(&mut self, fen: &str) -> Result<(), PositionError> {
        self.history.clear();
        match validator::validate_fen(fen) {
            Ok(()) => {
                let fen = fen.trim().to_string();
                self.initial_fen = fen.clone();
                self.fen = fen;
                Ok(())
            }
            Err(err) => {
                warn!(fen = %fen, error = %err, "rejected FEN, falling back to starting position");
                self.initial_fen = STARTING_FEN.to_string();
                self.fen = STARTING_FEN.to_string();
                Err(err)
            }
        }
    }

    /// Validate and play a move. On error nothing changes.
    pub fn apply_move(&mut self, input: &MoveInput) -> Result<MoveRecord, MoveError> {
        let AppliedMove { fen, mv } = validator::apply_move(&self.fen, input)?;
        self.fen = fen;
        self.history.push(mv.clone());
        Ok(mv)
    }

    /// Remove the most recent move. The FEN is recomputed by replaying the
    /// remaining history from the loaded snapshot, never by inverse-applying.
    pub fn undo_last(&mut self) -> Option<MoveRecord> {
        let removed = self.history.pop()?;
        self.fen = replay(&self.initial_fen, &self.history);
        Some(removed)
    }

    /// Back to the loaded snapshot.
    pub fn reset(&mut self) {
        self.fen = self.initial_fen.clone();
        self.history.clear();
    }

    pub fn fen(&self) -> &str {
        &self.fen
    }

    pub fn initial_fen(&self) -> &str {
        &self.initial_fen
    }

    pub fn history(&self) -> &[MoveRecord] {
        &self.history
    }

    pub fn side_to_move(&self) -> Color {
        validator::side_to_move(&self.fen).unwrap_or(Color::White)
    }

    pub fn orientation(&self) -> Color {
        self.orientation
    }

    pub fn set_orientation(&mut self, orientation: Color) {
        self.orientation = orientation;
    }
}

/// Replay a recorded line from a snapshot and return the resulting FEN.
/// Entries were legal when recorded, so a failure means the snapshot no
/// longer matches; replay stops there.
pub fn replay(initial_fen: &str, moves: &[MoveRecord]) -> String {
    let mut fen = initial_fen.to_string();
    for mv in moves {
        match validator::apply_move(&fen, &MoveInput::Text(mv.uci.clone())) {
            Ok(applied) => fen = applied.fen,
            Err(err) => {
                warn!(uci = %mv.uci, error = %err, "replay stopped at unplayable entry");
                break;
            }
        }
    }
    fen
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_and_undo_by_replay() {
        let mut model = PositionModel::new();
        model.apply_move(&MoveInput::from("e4")).unwrap();
        model.apply_move(&MoveInput::from("e5")).unwrap();
        let after_two = model.fen().to_string();
        model.apply_move(&MoveInput::from("Nf3")).unwrap();

        let undone = model.undo_last().unwrap();
        assert_eq!(undone.san, "Nf3");
        assert_eq!(model.fen(), after_two);
        assert_eq!(model.history().len(), 2);
    }

    #[test]
    fn test_undo_on_empty_history() {
        let mut model = PositionModel::new();
        assert!(model.undo_last().is_none());
        assert_eq!(model.fen(), STARTING_FEN);
    }

    #[test]
    fn test_set_fen_falls_back_on_garbage() {
        let mut model = PositionModel::new();
        model.apply_move(&MoveInput::from("e4")).unwrap();

        let err = model.set_fen("garbage").unwrap_err();
        assert!(matches!(err, PositionError::InvalidFen(_)));
        assert_eq!(model.fen(), STARTING_FEN);
        assert!(model.history().is_empty());
    }

    #[test]
    fn test_set_fen_clears_history() {
        let mut model = PositionModel::new();
        model.apply_move(&MoveInput::from("d4")).unwrap();
        let fen = "7k/5Q2/6K1/8/8/8/8/8 b - - 0 1";
        model.set_fen(fen).unwrap();
        assert_eq!(model.fen(), fen);
        assert_eq!(model.initial_fen(), fen);
        assert!(model.history().is_empty());
    }

    #[test]
    fn test_reset_returns_to_snapshot() {
        let fen = "r1bqkbnr/pppp1ppp/2n5/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 4 4";
        let mut model = PositionModel::from_fen(fen);
        model.apply_move(&MoveInput::from("O-O")).unwrap();
        model.reset();
        assert_eq!(model.fen(), fen);
        assert!(model.history().is_empty());
    }

    #[test]
    fn test_side_to_move_tracks_fen() {
        let mut model = PositionModel::new();
        assert_eq!(model.side_to_move(), Color::White);
        model.apply_move(&MoveInput::from("e4")).unwrap();
        assert_eq!(model.side_to_move(), Color::Black);
    }

    #[test]
    fn test_orientation_is_pure_view_state() {
        let mut model = PositionModel::new();
        model.set_orientation(Color::Black);
        model.apply_move(&MoveInput::from("e4")).unwrap();
        model.reset();
        assert_eq!(model.orientation(), Color::Black);
    }
}
