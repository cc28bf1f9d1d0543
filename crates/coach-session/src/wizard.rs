//! Multi-step coaching wizard: fetches each step's content once, drives the
//! board to match, and keeps per-item session state keyed by stable
//! identities so regenerated content lines back up.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use board_core::{validator, ArrowSpec, Color, MoveInput, MoveRecord};
use coach_client::{
    CoachBackend, DescribePlanRequest, Drill, ExplainMoveRequest, FocusSummary, Milestone,
    MoveExplanation, PlanDescription, ReflectionNote,
};
use tracing::{debug, info, warn};

use crate::controller::{BoardController, JumpOptions, UserMoveOutcome, DEFAULT_DRILL_AUTO_EXIT};
use crate::error::SessionError;

/// Pages of the coaching flow, in presentation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStep {
    Focus,
    Reflect,
    Practice,
}

/// Session-wide knobs for one wizard run.
#[derive(Debug, Clone)]
pub struct WizardConfig {
    pub steps: Vec<WizardStep>,
    pub game_id: String,
    /// Which side the learner played. Controls board orientation and the
    /// plan description request.
    pub user_color: Color,
    /// Delay between scripted moves when animating lines.
    pub animation_delay: Duration,
    /// How long a solved drill stays up before returning to idle.
    pub drill_auto_exit: Duration,
}

impl WizardConfig {
    pub fn new(game_id: impl Into<String>, user_color: Color) -> Self {
        Self {
            steps: vec![WizardStep::Focus, WizardStep::Reflect, WizardStep::Practice],
            game_id: game_id.into(),
            user_color,
            animation_delay: Duration::from_millis(500),
            drill_auto_exit: DEFAULT_DRILL_AUTO_EXIT,
        }
    }
}

/// Fetch state for one step's payload. Loaded once per session; a failure
/// stays visible until retried and never blocks navigation.
#[derive(Debug, Clone, PartialEq)]
pub enum StepSlot<T> {
    NotLoaded,
    Ready(T),
    Failed(String),
}

impl<T> StepSlot<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, StepSlot::Ready(_))
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            StepSlot::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            StepSlot::Failed(message) => Some(message),
            _ => None,
        }
    }
}

/// In-progress reflection for one milestone, keyed by its move number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MilestoneNote {
    pub selected_tags: BTreeSet<String>,
    pub free_text: String,
}

/// Owns the board and the per-session coaching state. Single writer: the
/// page task calls `&mut self` methods; only the board's internals are
/// shared with background tasks.
pub struct WizardOrchestrator {
    config: WizardConfig,
    backend: Arc<dyn CoachBackend>,
    board: BoardController,
    step_index: usize,
    focus: StepSlot<FocusSummary>,
    milestones: StepSlot<Vec<Milestone>>,
    drills: StepSlot<Vec<Drill>>,
    milestone_index: usize,
    drill_index: usize,
    notes: HashMap<u32, MilestoneNote>,
    drill_results: HashMap<String, bool>,
}

impl WizardOrchestrator {
    pub fn new(mut config: WizardConfig, backend: Arc<dyn CoachBackend>) -> Self {
        if config.steps.is_empty() {
            warn!("wizard configured with no steps, using the default order");
            config.steps = vec![WizardStep::Focus, WizardStep::Reflect, WizardStep::Practice];
        }
        let board = BoardController::with_auto_exit(config.drill_auto_exit);
        Self {
            config,
            backend,
            board,
            step_index: 0,
            focus: StepSlot::NotLoaded,
            milestones: StepSlot::NotLoaded,
            drills: StepSlot::NotLoaded,
            milestone_index: 0,
            drill_index: 0,
            notes: HashMap::new(),
            drill_results: HashMap::new(),
        }
    }

    /// Enter the first configured step.
    pub async fn start(&mut self) -> Result<(), SessionError> {
        self.goto_step(0).await
    }

    /// Jump to any step. Navigation is advisory: nothing is gated on
    /// completeness, only the index is checked.
    pub async fn goto_step(&mut self, index: usize) -> Result<(), SessionError> {
        if index >= self.config.steps.len() {
            return Err(SessionError::NoSuchStep(index));
        }
        self.step_index = index;
        self.enter_current().await;
        Ok(())
    }

    pub async fn next_step(&mut self) -> Result<(), SessionError> {
        if self.step_index + 1 < self.config.steps.len() {
            self.goto_step(self.step_index + 1).await?;
        }
        Ok(())
    }

    pub async fn prev_step(&mut self) -> Result<(), SessionError> {
        if self.step_index > 0 {
            self.goto_step(self.step_index - 1).await?;
        }
        Ok(())
    }

    /// Clear a failed slot and fetch the current step again. Ready content
    /// is left alone.
    pub async fn retry_current_step(&mut self) {
        match self.current_step() {
            WizardStep::Focus => {
                if !self.focus.is_ready() {
                    self.focus = StepSlot::NotLoaded;
                }
            }
            WizardStep::Reflect => {
                if !self.milestones.is_ready() {
                    self.milestones = StepSlot::NotLoaded;
                }
            }
            WizardStep::Practice => {
                if !self.drills.is_ready() {
                    self.drills = StepSlot::NotLoaded;
                }
            }
        }
        self.enter_current().await;
    }

    /// Drop the current step's cached payload and fetch fresh content.
    /// Notes and drill results are keyed by stable identities, so they
    /// re-attach to matching items in the regenerated list.
    pub async fn regenerate_current_step(&mut self) {
        match self.current_step() {
            WizardStep::Focus => self.focus = StepSlot::NotLoaded,
            WizardStep::Reflect => self.milestones = StepSlot::NotLoaded,
            WizardStep::Practice => self.drills = StepSlot::NotLoaded,
        }
        self.enter_current().await;
    }

    pub fn current_step(&self) -> WizardStep {
        self.config.steps[self.step_index]
    }

    pub fn step_index(&self) -> usize {
        self.step_index
    }

    pub fn steps(&self) -> &[WizardStep] {
        &self.config.steps
    }

    pub fn board(&self) -> &BoardController {
        &self.board
    }

    pub fn focus(&self) -> &StepSlot<FocusSummary> {
        &self.focus
    }

    pub fn milestones(&self) -> &StepSlot<Vec<Milestone>> {
        &self.milestones
    }

    pub fn drills(&self) -> &StepSlot<Vec<Drill>> {
        &self.drills
    }

    async fn enter_current(&mut self) {
        // Whatever interaction the previous step left behind ends here.
        self.board.stop_drill();
        self.board.cancel_plan_mode();

        let step = self.current_step();
        info!(step = ?step, index = self.step_index, "entering wizard step");
        match step {
            WizardStep::Focus => self.enter_focus().await,
            WizardStep::Reflect => self.enter_reflect().await,
            WizardStep::Practice => self.enter_practice().await,
        }
    }

    async fn enter_focus(&mut self) {
        if matches!(self.focus, StepSlot::NotLoaded) {
            self.focus = match self.backend.fetch_focus(&self.config.game_id).await {
                Ok(summary) => StepSlot::Ready(summary),
                Err(err) => {
                    warn!(error = %err, "focus summary fetch failed");
                    StepSlot::Failed(err.to_string())
                }
            };
        }
        if let Some(anchor) = self.focus.value().and_then(|s| s.anchor_fen.as_deref()) {
            let _ = self.board.jump_to_fen(
                anchor,
                JumpOptions {
                    highlights: Vec::new(),
                    orientation: Some(self.config.user_color),
                },
            );
        }
    }

    async fn enter_reflect(&mut self) {
        if matches!(self.milestones, StepSlot::NotLoaded) {
            self.milestones = match self.backend.fetch_milestones(&self.config.game_id).await {
                Ok(list) => {
                    info!(count = list.len(), "milestones loaded");
                    StepSlot::Ready(list)
                }
                Err(err) => {
                    warn!(error = %err, "milestone fetch failed");
                    StepSlot::Failed(err.to_string())
                }
            };
            self.milestone_index = 0;
        }
        self.show_milestone();
    }

    async fn enter_practice(&mut self) {
        if matches!(self.drills, StepSlot::NotLoaded) {
            self.drills = match self.backend.fetch_drills(&self.config.game_id).await {
                Ok(list) => {
                    info!(count = list.len(), "drills loaded");
                    StepSlot::Ready(list)
                }
                Err(err) => {
                    warn!(error = %err, "drill fetch failed");
                    StepSlot::Failed(err.to_string())
                }
            };
            self.drill_index = 0;
        }
        self.show_drill();
    }

    // ---- reflect step ----

    pub fn current_milestone(&self) -> Option<&Milestone> {
        self.milestones.value()?.get(self.milestone_index)
    }

    pub fn milestone_index(&self) -> usize {
        self.milestone_index
    }

    /// Drive the board to the current milestone: jump there, highlight the
    /// played move, arrow the played move red and the engine move green.
    pub fn show_milestone(&self) {
        let index = self.milestone_index;
        let milestone = match self.milestones.value().and_then(|list| list.get(index)) {
            Some(m) => m,
            None => return,
        };

        let played = resolve_on(&milestone.fen, &milestone.user_move);
        let best = resolve_on(&milestone.fen, &milestone.best_move);

        let highlights = played
            .as_ref()
            .map(|mv| vec![mv.from, mv.to])
            .unwrap_or_default();
        let _ = self.board.jump_to_fen(
            &milestone.fen,
            JumpOptions {
                highlights,
                orientation: Some(self.config.user_color),
            },
        );

        let mut arrows = Vec::new();
        if let Some(mv) = &played {
            arrows.push(ArrowSpec::new(mv.from, mv.to, "red"));
        }
        if let Some(mv) = &best {
            arrows.push(ArrowSpec::new(mv.from, mv.to, "green"));
        }
        self.board.draw_arrows(arrows);
    }

    pub fn next_milestone(&mut self) {
        let len = self.milestones.value().map(|l| l.len()).unwrap_or(0);
        if len != 0 && self.milestone_index + 1 < len {
            self.milestone_index += 1;
            self.show_milestone();
        }
    }

    pub fn prev_milestone(&mut self) {
        if self.milestone_index > 0 {
            self.milestone_index -= 1;
            self.show_milestone();
        }
    }

    /// The note being drafted for the current milestone, if any exists yet.
    pub fn current_note(&self) -> Option<&MilestoneNote> {
        let key = self.current_milestone()?.move_number;
        self.notes.get(&key)
    }

    pub fn note_for(&self, move_number: u32) -> Option<&MilestoneNote> {
        self.notes.get(&move_number)
    }

    pub fn toggle_tag(&mut self, tag: &str) {
        let Some(key) = self.current_milestone().map(|m| m.move_number) else {
            return;
        };
        let note = self.notes.entry(key).or_default();
        if !note.selected_tags.remove(tag) {
            note.selected_tags.insert(tag.to_string());
        }
    }

    pub fn set_free_text(&mut self, text: impl Into<String>) {
        let Some(key) = self.current_milestone().map(|m| m.move_number) else {
            return;
        };
        self.notes.entry(key).or_default().free_text = text.into();
    }

    /// Persist the current milestone's note, then advance: next milestone,
    /// or the following wizard step after the last one. A failed save
    /// advances nothing; the draft stays local either way.
    pub async fn save_and_next(&mut self) -> Result<(), SessionError> {
        let Some(milestone) = self.current_milestone().cloned() else {
            return Err(SessionError::NotLoaded("milestones"));
        };
        let note = self
            .notes
            .get(&milestone.move_number)
            .cloned()
            .unwrap_or_default();
        let payload = ReflectionNote {
            move_number: milestone.move_number,
            selected_tags: note.selected_tags.into_iter().collect(),
            free_text: note.free_text,
        };
        self.backend
            .save_reflection(&self.config.game_id, &payload)
            .await
            .map_err(|err| SessionError::Fetch(err.to_string()))?;
        debug!(move_number = milestone.move_number, "reflection saved");

        let len = self.milestones.value().map(|l| l.len()).unwrap_or(0);
        if self.milestone_index + 1 < len {
            self.milestone_index += 1;
            self.show_milestone();
        } else if self.step_index + 1 < self.config.steps.len() {
            self.goto_step(self.step_index + 1).await?;
        }
        Ok(())
    }

    /// Animate the engine's continuation: the best move, then the stored
    /// line after it, from a fresh jump to the milestone position.
    pub fn show_best_line(&self) -> Result<(), SessionError> {
        let Some(milestone) = self.current_milestone() else {
            return Err(SessionError::NotLoaded("milestones"));
        };
        let Some(line) = milestone.principal_variation_after_best.clone() else {
            return Err(SessionError::NotLoaded("principal variation"));
        };
        let best_move = milestone.best_move.clone();
        let fen = milestone.fen.clone();

        self.board.jump_to_fen(
            &fen,
            JumpOptions {
                highlights: Vec::new(),
                orientation: Some(self.config.user_color),
            },
        )?;
        let mut moves = vec![MoveInput::from(best_move)];
        moves.extend(line.into_iter().map(MoveInput::from));
        self.board
            .play_move_sequence(moves, self.config.animation_delay);
        Ok(())
    }

    /// Ask the backend to explain the played move against the engine move.
    pub async fn explain_current(&self) -> Result<MoveExplanation, SessionError> {
        let Some(milestone) = self.current_milestone() else {
            return Err(SessionError::NotLoaded("milestones"));
        };
        let req = ExplainMoveRequest {
            fen: milestone.fen.clone(),
            move_played: milestone.user_move.clone(),
            best_move: milestone.best_move.clone(),
        };
        self.backend
            .explain_move(&req)
            .await
            .map_err(|err| SessionError::Fetch(err.to_string()))
    }

    // ---- practice step ----

    pub fn current_drill(&self) -> Option<&Drill> {
        self.drills.value()?.get(self.drill_index)
    }

    pub fn drill_index(&self) -> usize {
        self.drill_index
    }

    /// Outcome of the first graded attempt per drill, keyed by drill FEN.
    pub fn drill_results(&self) -> &HashMap<String, bool> {
        &self.drill_results
    }

    /// Jump to the current drill position and arm it.
    pub fn show_drill(&self) {
        let index = self.drill_index;
        let drill = match self.drills.value().and_then(|list| list.get(index)) {
            Some(d) => d,
            None => return,
        };
        let _ = self.board.jump_to_fen(
            &drill.fen,
            JumpOptions {
                highlights: Vec::new(),
                orientation: Some(self.config.user_color),
            },
        );
        if let Err(err) = self.board.start_drill(drill.correct_moves.clone()) {
            warn!(error = %err, "could not arm drill");
        }
    }

    pub fn next_drill(&mut self) {
        let len = self.drills.value().map(|l| l.len()).unwrap_or(0);
        if len != 0 && self.drill_index + 1 < len {
            self.drill_index += 1;
            self.show_drill();
        }
    }

    pub fn prev_drill(&mut self) {
        if self.drill_index > 0 {
            self.drill_index -= 1;
            self.show_drill();
        }
    }

    // ---- board bridging ----

    /// Forward a user gesture to the board. The first graded attempt of
    /// each drill is recorded as that drill's result.
    pub fn user_move(&mut self, input: &MoveInput) -> Result<UserMoveOutcome, SessionError> {
        let outcome = self.board.user_move(input)?;
        let graded = match &outcome {
            UserMoveOutcome::DrillCorrect(_) => Some(true),
            UserMoveOutcome::DrillIncorrect(_) => Some(false),
            _ => None,
        };
        if let Some(correct) = graded {
            if let Some(fen) = self.current_drill().map(|d| d.fen.clone()) {
                self.drill_results.entry(fen).or_insert(correct);
            }
        }
        Ok(outcome)
    }

    /// Finish the active plan recording and ask the backend to narrate it.
    pub async fn describe_recorded_plan(&mut self) -> Result<PlanDescription, SessionError> {
        let Some(moves) = self.board.finish_plan() else {
            return Err(SessionError::NoActivePlan);
        };
        let req = DescribePlanRequest {
            fen: self.board.fen(),
            moves,
            user_color: match self.config.user_color {
                Color::White => "white",
                Color::Black => "black",
            }
            .to_string(),
        };
        self.backend
            .describe_plan(&req)
            .await
            .map_err(|err| SessionError::Fetch(err.to_string()))
    }
}

/// Resolve a SAN/UCI string on a milestone FEN for arrow endpoints. Backend
/// data that does not resolve only costs the annotation.
fn resolve_on(fen: &str, text: &str) -> Option<MoveRecord> {
    match validator::apply_move(fen, &MoveInput::from(text)) {
        Ok(applied) => Some(applied.mv),
        Err(err) => {
            debug!(fen = %fen, mv = %text, error = %err, "cannot resolve move for annotation");
            None
        }
    }
}
