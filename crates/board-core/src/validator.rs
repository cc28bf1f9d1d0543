//! Pure move validation and application over FEN strings.
//! No state lives here; every function takes a FEN and returns a value.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use shakmaty::{
    fen::Fen,
    san::{San, SanPlus},
    uci::UciMove,
    CastlingMode, Chess, Color, EnPassantMode, Move, Position, Role, Square,
};

use crate::error::{MoveError, PositionError};

pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// A validated move in every notation a consumer might want.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRecord {
    pub san: String,
    pub uci: String,
    #[serde(with = "square_str")]
    pub from: Square,
    #[serde(with = "square_str")]
    pub to: Square,
}

/// A move as supplied by a user gesture or a scripted line, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveInput {
    /// SAN ("Nf3") or UCI ("g1f3") text. SAN is tried first.
    Text(String),
    /// Coordinate form from a drag or click pair.
    Coords {
        from: Square,
        to: Square,
        promotion: Option<Role>,
    },
}

impl From<&str> for MoveInput {
    fn from(s: &str) -> Self {
        MoveInput::Text(s.to_string())
    }
}

impl From<String> for MoveInput {
    fn from(s: String) -> Self {
        MoveInput::Text(s)
    }
}

/// Successor position plus the normalized record of the move that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMove {
    pub fen: String,
    pub mv: MoveRecord,
}

/// Game-over flags for a position. `draw` covers stalemate, insufficient
/// material, and the halfmove clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminalState {
    pub checkmate: bool,
    pub stalemate: bool,
    pub draw: bool,
}

impl TerminalState {
    pub fn is_over(&self) -> bool {
        self.checkmate || self.draw
    }
}

fn fen_shape() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(?:[pnbrqkPNBRQK1-8]+/){7}[pnbrqkPNBRQK1-8]+ [wb] (?:[KQkq]{1,4}|-) (?:[a-h][36]|-) \d+ \d+$",
        )
        .unwrap()
    })
}

fn parse_position(fen: &str) -> Result<Chess, PositionError> {
    let trimmed = fen.trim();
    if !fen_shape().is_match(trimmed) {
        return Err(PositionError::InvalidFen(trimmed.to_string()));
    }
    let parsed: Fen = trimmed
        .parse()
        .map_err(|e| PositionError::InvalidFen(format!("{trimmed}: {e}")))?;
    parsed
        .into_position::<Chess>(CastlingMode::Standard)
        .map_err(|e| PositionError::IllegalSetup(format!("{e}")))
}

/// Check that a FEN parses and describes a reachable-enough position to play
/// from. Distinguishes malformed text from an illegal piece setup.
pub fn validate_fen(fen: &str) -> Result<(), PositionError> {
    parse_position(fen).map(|_| ())
}

/// Side to move encoded in the FEN.
pub fn side_to_move(fen: &str) -> Result<Color, PositionError> {
    Ok(parse_position(fen)?.turn())
}

/// All legal moves in the position, as normalized records.
pub fn legal_moves(fen: &str) -> Result<Vec<MoveRecord>, PositionError> {
    let pos = parse_position(fen)?;
    Ok(pos
        .legal_moves()
        .iter()
        .map(|mv| record_move(&pos, mv))
        .collect())
}

/// Validate `input` against the position and apply it. Returns the successor
/// FEN and the normalized move record; the caller's state is untouched on error.
pub fn apply_move(fen: &str, input: &MoveInput) -> Result<AppliedMove, MoveError> {
    let mut pos = parse_position(fen)?;
    let mv = resolve_move(&pos, input, fen)?;
    let uci = mv.to_uci(CastlingMode::Standard);
    let (from, to) = uci_squares(&uci, &mv);
    let san = SanPlus::from_move_and_play_unchecked(&mut pos, mv).to_string();
    Ok(AppliedMove {
        fen: Fen::from_position(&pos, EnPassantMode::Legal).to_string(),
        mv: MoveRecord {
            san,
            uci: uci.to_string(),
            from,
            to,
        },
    })
}

/// Game-over detection for a position.
pub fn is_terminal(fen: &str) -> Result<TerminalState, PositionError> {
    let pos = parse_position(fen)?;
    let stalemate = pos.is_stalemate();
    Ok(TerminalState {
        checkmate: pos.is_checkmate(),
        stalemate,
        draw: stalemate || pos.is_insufficient_material() || pos.halfmoves() >= 100,
    })
}

fn record_move(pos: &Chess, mv: &Move) -> MoveRecord {
    let uci = mv.to_uci(CastlingMode::Standard);
    let (from, to) = uci_squares(&uci, mv);
    MoveRecord {
        san: SanPlus::from_move(pos.clone(), mv.clone()).to_string(),
        uci: uci.to_string(),
        from,
        to,
    }
}

// Castling renders king-to-castled-square (e1g1) in standard mode, so the
// squares come from the UCI form rather than Move::from/to.
fn uci_squares(uci: &UciMove, mv: &Move) -> (Square, Square) {
    match uci {
        UciMove::Normal { from, to, .. } => (*from, *to),
        _ => (mv.from().unwrap_or(mv.to()), mv.to()),
    }
}

fn resolve_move(pos: &Chess, input: &MoveInput, fen: &str) -> Result<Move, MoveError> {
    match input {
        MoveInput::Text(text) => {
            let text = text.trim();
            if text.is_empty() {
                return Err(MoveError::Unparsable(text.to_string()));
            }
            let mut parsed = false;
            if let Ok(san) = text.parse::<San>() {
                parsed = true;
                if let Ok(mv) = san.to_move(pos) {
                    return Ok(mv);
                }
            }
            if let Ok(uci) = text.parse::<UciMove>() {
                parsed = true;
                if let Ok(mv) = uci.to_move(pos) {
                    return Ok(mv);
                }
            }
            if parsed {
                Err(MoveError::Illegal {
                    input: text.to_string(),
                    fen: fen.to_string(),
                })
            } else {
                Err(MoveError::Unparsable(text.to_string()))
            }
        }
        MoveInput::Coords {
            from,
            to,
            promotion,
        } => pos
            .legal_moves()
            .into_iter()
            .find(|mv| coords_match(mv, *from, *to, *promotion))
            .ok_or_else(|| MoveError::Illegal {
                input: format!("{from}{to}"),
                fen: fen.to_string(),
            }),
    }
}

fn coords_match(mv: &Move, from: Square, to: Square, requested: Option<Role>) -> bool {
    match mv.to_uci(CastlingMode::Standard) {
        UciMove::Normal {
            from: f,
            to: t,
            promotion,
        } => f == from && t == to && promotion_matches(promotion, requested),
        _ => false,
    }
}

// A drag without an explicit promotion piece promotes to a queen.
fn promotion_matches(actual: Option<Role>, requested: Option<Role>) -> bool {
    match (actual, requested) {
        (None, None) => true,
        (Some(a), Some(r)) => a == r,
        (Some(Role::Queen), None) => true,
        _ => false,
    }
}

pub(crate) mod square_str {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use shakmaty::Square;

    pub fn serialize<S: Serializer>(sq: &Square, ser: S) -> Result<S::Ok, S::Error> {
        sq.to_string().serialize(ser)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Square, D::Error> {
        let raw = String::deserialize(de)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
