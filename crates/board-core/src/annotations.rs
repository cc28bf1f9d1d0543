//! Arrow and square-highlight overlay, independent of position state.

use serde::{Deserialize, Serialize};
use shakmaty::Square;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrowSpec {
    #[serde(with = "crate::validator::square_str")]
    pub from: Square,
    #[serde(with = "crate::validator::square_str")]
    pub to: Square,
    pub color: String,
}

impl ArrowSpec {
    pub fn new(from: Square, to: Square, color: impl Into<String>) -> Self {
        Self {
            from,
            to,
            color: color.into(),
        }
    }
}

/// Visual annotations layered over the board. Survives position changes;
/// each layer clears only when asked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationOverlay {
    arrows: Vec<ArrowSpec>,
    #[serde(serialize_with = "squares_as_strings")]
    highlights: Vec<Square>,
}

impl AnnotationOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole arrow set.
    pub fn draw_arrows(&mut self, arrows: Vec<ArrowSpec>) {
        self.arrows = arrows;
    }

    pub fn clear_arrows(&mut self) {
        self.arrows.clear();
    }

    /// Replaces the whole highlight set.
    pub fn highlight_squares(&mut self, squares: Vec<Square>) {
        self.highlights = squares;
    }

    pub fn clear_highlights(&mut self) {
        self.highlights.clear();
    }

    pub fn clear_all(&mut self) {
        self.arrows.clear();
        self.highlights.clear();
    }

    pub fn arrows(&self) -> &[ArrowSpec] {
        &self.arrows
    }

    pub fn highlights(&self) -> &[Square] {
        &self.highlights
    }

    pub fn is_empty(&self) -> bool {
        self.arrows.is_empty() && self.highlights.is_empty()
    }
}

fn squares_as_strings<S>(squares: &[Square], ser: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    ser.collect_seq(squares.iter().map(|sq| sq.to_string()))
}
