//! Interaction modes and the event stream the board publishes to its UI.

use std::fmt;

use board_core::MoveRecord;
use serde::Serialize;

/// What the board currently does with user moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionMode {
    /// Free play. Legal moves are applied and kept in history.
    Idle,
    /// A drill is armed. Moves are graded against the expected answers.
    Drill,
    /// A plan is being recorded. Moves are collected, not judged.
    Plan,
}

impl fmt::Display for InteractionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            InteractionMode::Idle => "idle",
            InteractionMode::Drill => "drill",
            InteractionMode::Plan => "plan",
        };
        write!(f, "{label}")
    }
}

/// Events emitted to subscribers after each state change.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BoardEvent {
    MoveApplied {
        mv: MoveRecord,
        fen: String,
    },
    PositionReset {
        fen: String,
    },
    SequenceFinished {
        completed: usize,
        failed_at: Option<usize>,
    },
    DrillResult {
        correct: bool,
        played_move: MoveRecord,
    },
    PlanMove {
        mv: MoveRecord,
        all_moves: Vec<String>,
    },
    ModeChanged {
        mode: InteractionMode,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_serialize_tagged() {
        let event = BoardEvent::ModeChanged {
            mode: InteractionMode::Drill,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "mode_changed");
        assert_eq!(json["mode"], "drill");

        let event = BoardEvent::SequenceFinished {
            completed: 2,
            failed_at: Some(2),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "sequence_finished");
        assert_eq!(json["completed"], 2);
        assert_eq!(json["failed_at"], 2);
    }
}
