//! Wire types for the coaching backend API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity of a reviewed move, as classified by the backend's analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvaluationType {
    Blunder,
    Mistake,
    Inaccuracy,
    Good,
}

/// A selectable reflection prompt attached to a milestone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextualOption {
    pub tag: String,
    pub label: String,
}

/// A key moment of a reviewed game. `move_number` is stable across refetches
/// and keys all per-milestone session state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    pub move_number: u32,
    pub fen: String,
    pub user_move: String,
    pub best_move: String,
    pub cp_loss: i32,
    pub evaluation_type: EvaluationType,
    #[serde(default)]
    pub threat: Option<String>,
    #[serde(default)]
    pub principal_variation_after_best: Option<Vec<String>>,
    #[serde(default)]
    pub contextual_options: Vec<ContextualOption>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// A practice position. The FEN doubles as the drill's stable identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Drill {
    pub fen: String,
    pub correct_moves: Vec<String>,
    #[serde(default)]
    pub hint: Option<String>,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
}

/// Narrative summary shown on the opening step of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusSummary {
    pub headline: String,
    pub narrative: String,
    #[serde(default)]
    pub anchor_fen: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplainMoveRequest {
    pub fen: String,
    pub move_played: String,
    pub best_move: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveExplanation {
    pub human_explanation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DescribePlanRequest {
    pub fen: String,
    pub moves: Vec<String>,
    pub user_color: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanDescription {
    pub plan_description: String,
}

/// A saved reflection for one milestone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReflectionNote {
    pub move_number: u32,
    pub selected_tags: Vec<String>,
    pub free_text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncState {
    Idle,
    Syncing,
    Error,
}

/// Progress of the backend's game import pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub state: SyncState,
    #[serde(default)]
    pub last_synced_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub pending_games: u32,
}
