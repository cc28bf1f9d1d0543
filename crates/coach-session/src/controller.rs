//! The interactive board a session owns: canonical position, annotation
//! overlay, interaction mode, and the event stream renderers subscribe to.
//!
//! Command methods lock a plain mutex and return synchronously. Scripted
//! playback and the drill auto-exit timer run as spawned tasks holding only
//! a [`Weak`](std::sync::Weak) reference plus a staleness token, so dropping
//! the controller tears everything down.

use std::mem;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use board_core::{
    validator, AnnotationOverlay, ArrowSpec, Color, MoveInput, MoveRecord, PositionError,
    PositionModel, Square,
};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time;
use tracing::debug;

use crate::drill::DrillState;
use crate::error::SessionError;
use crate::events::{BoardEvent, InteractionMode};
use crate::plan::PlanState;
use crate::sequencer;

/// How long a solved drill stays on screen before the board returns to idle.
pub const DEFAULT_DRILL_AUTO_EXIT: Duration = Duration::from_millis(1500);

/// How a user move was handled, reported synchronously to the caller. The
/// matching [`BoardEvent`]s go to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserMoveOutcome {
    /// Idle mode: validated and committed.
    Applied(MoveRecord),
    /// Drill answer matched. The move is committed and the drill will
    /// auto-exit shortly.
    DrillCorrect(MoveRecord),
    /// Legal but not an expected answer. Nothing committed; retry allowed.
    DrillIncorrect(MoveRecord),
    /// Drill already solved; gestures during the exit window are ignored.
    DrillIgnored,
    /// Appended to the plan's shadow line.
    PlanRecorded(MoveRecord),
    /// Not playable on the plan's shadow position. Ignored.
    PlanRejected,
}

/// View adjustments applied together with a position jump.
#[derive(Debug, Clone, Default)]
pub struct JumpOptions {
    /// Highlights for the fresh overlay; the jump wipes whatever was drawn
    /// on the previous position first.
    pub highlights: Vec<Square>,
    pub orientation: Option<Color>,
}

pub(crate) enum ModeState {
    Idle,
    Drill(DrillState),
    Plan(PlanState),
}

impl ModeState {
    pub(crate) fn kind(&self) -> InteractionMode {
        match self {
            ModeState::Idle => InteractionMode::Idle,
            ModeState::Drill(_) => InteractionMode::Drill,
            ModeState::Plan(_) => InteractionMode::Plan,
        }
    }
}

enum PostAction {
    None,
    ScheduleAutoExit { session: u64 },
}

pub(crate) struct BoardInner {
    pub(crate) position: PositionModel,
    pub(crate) overlay: AnnotationOverlay,
    pub(crate) mode: ModeState,
    /// Bumped whenever scripted playback must stop touching the board.
    pub(crate) generation: u64,
    /// Bumped whenever the armed drill stops being the current one.
    pub(crate) drill_session: u64,
    subscribers: Vec<UnboundedSender<BoardEvent>>,
}

impl BoardInner {
    fn new() -> Self {
        Self {
            position: PositionModel::new(),
            overlay: AnnotationOverlay::new(),
            mode: ModeState::Idle,
            generation: 0,
            drill_session: 0,
            subscribers: Vec::new(),
        }
    }

    pub(crate) fn emit(&mut self, event: BoardEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Leave drill mode if armed. Pending auto-exit timers go stale.
    fn exit_drill(&mut self) {
        if matches!(self.mode, ModeState::Drill(_)) {
            self.mode = ModeState::Idle;
            self.drill_session += 1;
            self.emit(BoardEvent::ModeChanged {
                mode: InteractionMode::Idle,
            });
        }
    }

    /// Drop whatever interactive mode is active before the position is
    /// replaced out from under it.
    fn force_idle(&mut self) {
        if !matches!(self.mode, ModeState::Idle) {
            debug!(mode = %self.mode.kind(), "interactive mode dropped by position change");
            self.mode = ModeState::Idle;
            self.drill_session += 1;
            self.emit(BoardEvent::ModeChanged {
                mode: InteractionMode::Idle,
            });
        }
    }

    fn handle_user_move(
        &mut self,
        input: &MoveInput,
    ) -> Result<(UserMoveOutcome, PostAction), SessionError> {
        let mut events = Vec::new();
        let outcome = match &mut self.mode {
            ModeState::Idle => {
                let mv = self.position.apply_move(input)?;
                events.push(BoardEvent::MoveApplied {
                    mv: mv.clone(),
                    fen: self.position.fen().to_string(),
                });
                (UserMoveOutcome::Applied(mv), PostAction::None)
            }
            ModeState::Drill(drill) if drill.resolved => {
                debug!("drill already solved, input ignored until exit");
                (UserMoveOutcome::DrillIgnored, PostAction::None)
            }
            ModeState::Drill(drill) => {
                // Graded against the armed position. Illegal input is an
                // error, a legal wrong move is a graded attempt.
                let probe = validator::apply_move(&drill.fen, input)?;
                if drill.matches(&probe.mv) {
                    drill.resolved = true;
                    let session = self.drill_session;
                    let mv = self.position.apply_move(input)?;
                    events.push(BoardEvent::MoveApplied {
                        mv: mv.clone(),
                        fen: self.position.fen().to_string(),
                    });
                    events.push(BoardEvent::DrillResult {
                        correct: true,
                        played_move: mv.clone(),
                    });
                    (
                        UserMoveOutcome::DrillCorrect(mv),
                        PostAction::ScheduleAutoExit { session },
                    )
                } else {
                    events.push(BoardEvent::DrillResult {
                        correct: false,
                        played_move: probe.mv.clone(),
                    });
                    (UserMoveOutcome::DrillIncorrect(probe.mv), PostAction::None)
                }
            }
            ModeState::Plan(plan) => match plan.try_record(input) {
                Ok(mv) => {
                    events.push(BoardEvent::PlanMove {
                        mv: mv.clone(),
                        all_moves: plan.sans(),
                    });
                    (UserMoveOutcome::PlanRecorded(mv), PostAction::None)
                }
                Err(err) => {
                    debug!(error = %err, "plan input not playable, ignored");
                    (UserMoveOutcome::PlanRejected, PostAction::None)
                }
            },
        };
        for event in events {
            self.emit(event);
        }
        Ok(outcome)
    }
}

/// Shared-state handle for one interactive board.
pub struct BoardController {
    inner: Arc<Mutex<BoardInner>>,
    auto_exit: Duration,
}

impl Default for BoardController {
    fn default() -> Self {
        Self::new()
    }
}

impl BoardController {
    pub fn new() -> Self {
        Self::with_auto_exit(DEFAULT_DRILL_AUTO_EXIT)
    }

    pub fn with_auto_exit(auto_exit: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(BoardInner::new())),
            auto_exit,
        }
    }

    fn lock(&self) -> MutexGuard<'_, BoardInner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Event stream for a renderer. Dropped receivers are pruned on the
    /// next emit.
    pub fn subscribe(&self) -> UnboundedReceiver<BoardEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().subscribers.push(tx);
        rx
    }

    /// The FEN a renderer should draw: the plan's shadow position while
    /// recording, the canonical position otherwise.
    pub fn fen(&self) -> String {
        let inner = self.lock();
        match &inner.mode {
            ModeState::Plan(plan) => plan.shadow_fen.clone(),
            _ => inner.position.fen().to_string(),
        }
    }

    pub fn initial_fen(&self) -> String {
        self.lock().position.initial_fen().to_string()
    }

    /// Canonical move history. Plan recordings live on the shadow line and
    /// never appear here.
    pub fn history(&self) -> Vec<MoveRecord> {
        self.lock().position.history().to_vec()
    }

    pub fn mode(&self) -> InteractionMode {
        self.lock().mode.kind()
    }

    pub fn side_to_move(&self) -> Color {
        self.lock().position.side_to_move()
    }

    pub fn orientation(&self) -> Color {
        self.lock().position.orientation()
    }

    pub fn set_orientation(&self, orientation: Color) {
        self.lock().position.set_orientation(orientation);
    }

    pub fn draw_arrows(&self, arrows: Vec<ArrowSpec>) {
        self.lock().overlay.draw_arrows(arrows);
    }

    pub fn clear_arrows(&self) {
        self.lock().overlay.clear_arrows();
    }

    pub fn highlight_squares(&self, squares: Vec<Square>) {
        self.lock().overlay.highlight_squares(squares);
    }

    pub fn clear_highlights(&self) {
        self.lock().overlay.clear_highlights();
    }

    /// Overlay snapshot for the render layer.
    pub fn overlay(&self) -> AnnotationOverlay {
        self.lock().overlay.clone()
    }

    /// Load a new position. Cancels any running sequence, drops any active
    /// mode, clears both annotation layers, and falls back to the starting
    /// position on invalid input (the error is returned, the board stays
    /// usable).
    pub fn set_fen(&self, fen: &str) -> Result<(), PositionError> {
        let mut inner = self.lock();
        inner.generation += 1;
        inner.force_idle();
        let result = inner.position.set_fen(fen);
        inner.overlay.clear_all();
        let fen = inner.position.fen().to_string();
        inner.emit(BoardEvent::PositionReset { fen });
        result
    }

    /// [`set_fen`](Self::set_fen) plus the view adjustments a coaching jump
    /// wants: the requested highlights on a fresh overlay, and optionally a
    /// flipped orientation.
    pub fn jump_to_fen(&self, fen: &str, options: JumpOptions) -> Result<(), PositionError> {
        let mut inner = self.lock();
        inner.generation += 1;
        inner.force_idle();
        let result = inner.position.set_fen(fen);
        inner.overlay.clear_all();
        inner.overlay.highlight_squares(options.highlights);
        if let Some(orientation) = options.orientation {
            inner.position.set_orientation(orientation);
        }
        let fen = inner.position.fen().to_string();
        inner.emit(BoardEvent::PositionReset { fen });
        result
    }

    /// Back to the loaded snapshot. Cancels any running sequence.
    pub fn reset(&self) {
        let mut inner = self.lock();
        inner.generation += 1;
        inner.force_idle();
        inner.position.reset();
        let fen = inner.position.fen().to_string();
        inner.emit(BoardEvent::PositionReset { fen });
    }

    /// Take back the last canonical move. Only meaningful in idle mode;
    /// drills and plans own their own undo semantics.
    pub fn undo_move(&self) -> Result<Option<MoveRecord>, SessionError> {
        let mut inner = self.lock();
        let active = inner.mode.kind();
        if active != InteractionMode::Idle {
            return Err(SessionError::ModeConflict {
                active,
                requested: InteractionMode::Idle,
            });
        }
        match inner.position.undo_last() {
            Some(mv) => {
                let fen = inner.position.fen().to_string();
                inner.emit(BoardEvent::PositionReset { fen });
                Ok(Some(mv))
            }
            None => Ok(None),
        }
    }

    /// Route a user gesture through the active mode.
    pub fn user_move(&self, input: &MoveInput) -> Result<UserMoveOutcome, SessionError> {
        let (outcome, post) = self.lock().handle_user_move(input)?;
        if let PostAction::ScheduleAutoExit { session } = post {
            self.schedule_auto_exit(session);
        }
        Ok(outcome)
    }

    /// Animate a move line. Any sequence already running is superseded;
    /// step `i` lands after `i * step_delay`.
    pub fn play_move_sequence(&self, moves: Vec<MoveInput>, step_delay: Duration) {
        let generation = {
            let mut inner = self.lock();
            inner.generation += 1;
            inner.generation
        };
        sequencer::spawn(Arc::downgrade(&self.inner), moves, step_delay, generation);
    }

    /// One scripted move, immediately, under the same supersession rules.
    pub fn play_single_move(&self, input: MoveInput) {
        self.play_move_sequence(vec![input], Duration::ZERO);
    }

    /// Arm a drill on the current position: user moves are graded against
    /// `expected` (SAN or UCI). Re-arming replaces the previous drill; an
    /// active plan recording is a conflict.
    pub fn start_drill(&self, expected: Vec<String>) -> Result<(), SessionError> {
        let mut inner = self.lock();
        if matches!(inner.mode, ModeState::Plan(_)) {
            return Err(SessionError::ModeConflict {
                active: InteractionMode::Plan,
                requested: InteractionMode::Drill,
            });
        }
        let fen = inner.position.fen().to_string();
        inner.mode = ModeState::Drill(DrillState::arm(&fen, expected));
        inner.drill_session += 1;
        inner.emit(BoardEvent::ModeChanged {
            mode: InteractionMode::Drill,
        });
        Ok(())
    }

    /// Disarm. No-op when no drill is active; the position keeps whatever
    /// was committed.
    pub fn stop_drill(&self) {
        self.lock().exit_drill();
    }

    /// Start recording a candidate line from the current position. The
    /// canonical position stays untouched until the plan is finished or
    /// cancelled; an armed drill is a conflict. Restarts the recording when
    /// already planning.
    pub fn start_plan_mode(&self) -> Result<(), SessionError> {
        let mut inner = self.lock();
        if matches!(inner.mode, ModeState::Drill(_)) {
            return Err(SessionError::ModeConflict {
                active: InteractionMode::Drill,
                requested: InteractionMode::Plan,
            });
        }
        let base = inner.position.fen().to_string();
        inner.mode = ModeState::Plan(PlanState::new(base));
        inner.emit(BoardEvent::ModeChanged {
            mode: InteractionMode::Plan,
        });
        Ok(())
    }

    /// Pop the last recorded plan move. Callers re-read
    /// [`fen`](Self::fen) for the new shadow position.
    pub fn undo_plan_move(&self) -> Option<MoveRecord> {
        let mut inner = self.lock();
        match &mut inner.mode {
            ModeState::Plan(plan) => plan.undo(),
            _ => None,
        }
    }

    /// The line recorded so far, without leaving plan mode.
    pub fn plan_moves(&self) -> Option<Vec<String>> {
        let inner = self.lock();
        match &inner.mode {
            ModeState::Plan(plan) => Some(plan.sans()),
            _ => None,
        }
    }

    /// Exit plan mode and return the recorded SAN line. The board snaps
    /// back to the canonical position; nothing is committed.
    pub fn finish_plan(&self) -> Option<Vec<String>> {
        let mut inner = self.lock();
        match mem::replace(&mut inner.mode, ModeState::Idle) {
            ModeState::Plan(plan) => {
                let fen = inner.position.fen().to_string();
                inner.emit(BoardEvent::PositionReset { fen });
                inner.emit(BoardEvent::ModeChanged {
                    mode: InteractionMode::Idle,
                });
                Some(plan.sans())
            }
            other => {
                inner.mode = other;
                None
            }
        }
    }

    /// Discard the recording and re-sync renderers to the canonical
    /// position. No-op outside plan mode.
    pub fn cancel_plan_mode(&self) {
        let mut inner = self.lock();
        if matches!(inner.mode, ModeState::Plan(_)) {
            inner.mode = ModeState::Idle;
            let fen = inner.position.fen().to_string();
            inner.emit(BoardEvent::PositionReset { fen });
            inner.emit(BoardEvent::ModeChanged {
                mode: InteractionMode::Idle,
            });
        }
    }

    fn schedule_auto_exit(&self, session: u64) {
        let weak = Arc::downgrade(&self.inner);
        let delay = self.auto_exit;
        tokio::spawn(async move {
            time::sleep(delay).await;
            let inner = match weak.upgrade() {
                Some(inner) => inner,
                None => return,
            };
            let mut guard = match inner.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            if guard.drill_session == session {
                guard.exit_drill();
            }
        });
    }
}

impl Drop for BoardController {
    fn drop(&mut self) {
        let mut inner = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        inner.generation += 1;
        inner.drill_session += 1;
    }
}
