//! Session layer on top of [`board_core`]: a shareable board controller with
//! idle, drill, and plan interaction modes, timed playback of scripted
//! lines, and the wizard that sequences coach content through the steps of
//! a review.

pub mod controller;
pub mod error;
pub mod events;
pub mod wizard;

mod drill;
mod plan;
mod sequencer;

pub use controller::{BoardController, JumpOptions, UserMoveOutcome, DEFAULT_DRILL_AUTO_EXIT};
pub use error::SessionError;
pub use events::{BoardEvent, InteractionMode};
pub use wizard::{MilestoneNote, StepSlot, WizardConfig, WizardOrchestrator, WizardStep};
