//! Drill state: the armed position and the answers a user move is graded
//! against.

use board_core::{validator, MoveInput, MoveRecord};
use tracing::debug;

#[derive(Debug, Clone)]
pub(crate) struct DrillState {
    /// FEN the drill was armed on. Stable key for recording results.
    pub fen: String,
    /// Accepted answers exactly as supplied ("Nf3", "g1f3", "e8=Q").
    pub expected: Vec<String>,
    /// UCI forms of the answers that resolved against the armed position.
    pub expected_uci: Vec<String>,
    /// Set once a correct answer lands. The drill stops grading input and
    /// waits for the exit timer.
    pub resolved: bool,
}

impl DrillState {
    /// Resolve the expected answers against the armed position up front, so
    /// grading later is a string compare. Answers that do not resolve keep
    /// working through the text fallback in [`DrillState::matches`].
    pub fn arm(fen: &str, expected: Vec<String>) -> Self {
        let expected_uci = expected
            .iter()
            .filter_map(
                |answer| match validator::apply_move(fen, &MoveInput::from(answer.as_str())) {
                    Ok(applied) => Some(applied.mv.uci),
                    Err(err) => {
                        debug!(answer = %answer, error = %err, "drill answer did not resolve, will compare as text");
                        None
                    }
                },
            )
            .collect();
        Self {
            fen: fen.to_string(),
            expected,
            expected_uci,
            resolved: false,
        }
    }

    /// A played move counts when its UCI matches a resolved answer, or when
    /// its SAN or UCI text matches an answer up to check marks and case.
    pub fn matches(&self, played: &MoveRecord) -> bool {
        if self.expected_uci.iter().any(|uci| *uci == played.uci) {
            return true;
        }
        self.expected
            .iter()
            .any(|raw| loose_eq(raw, &played.san) || loose_eq(raw, &played.uci))
    }
}

fn loose_eq(a: &str, b: &str) -> bool {
    let strip = |s: &str| s.trim_end_matches(['+', '#']).to_ascii_lowercase();
    strip(a) == strip(b)
}
