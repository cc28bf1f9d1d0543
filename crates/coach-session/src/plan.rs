//! Plan recording state: a candidate line sketched on a shadow position
//! while the canonical board stays put.

use board_core::{position, validator, MoveError, MoveInput, MoveRecord};

#[derive(Debug, Clone)]
pub(crate) struct PlanState {
    /// Canonical FEN when recording started. Anchor for every replay.
    pub base_fen: String,
    /// Position after the recorded line. What a renderer draws while the
    /// plan is being sketched.
    pub shadow_fen: String,
    pub moves: Vec<MoveRecord>,
}

impl PlanState {
    pub fn new(base_fen: String) -> Self {
        Self {
            shadow_fen: base_fen.clone(),
            base_fen,
            moves: Vec::new(),
        }
    }

    /// Validate against the shadow position and record on success. The
    /// canonical position is never involved.
    pub fn try_record(&mut self, input: &MoveInput) -> Result<MoveRecord, MoveError> {
        let applied = validator::apply_move(&self.shadow_fen, input)?;
        self.shadow_fen = applied.fen;
        self.moves.push(applied.mv.clone());
        Ok(applied.mv)
    }

    /// Pop the last recorded move. The shadow FEN is recomputed by replaying
    /// the remaining line from the base, never by inverse-applying.
    pub fn undo(&mut self) -> Option<MoveRecord> {
        let removed = self.moves.pop()?;
        self.shadow_fen = position::replay(&self.base_fen, &self.moves);
        Some(removed)
    }

    pub fn sans(&self) -> Vec<String> {
        self.moves.iter().map(|m| m.san.clone()).collect()
    }
}
