//! Typed client for the coaching backend: wire types, the `CoachBackend`
//! trait the session layer consumes, the HTTP implementation, and a
//! background sync-status poller.

pub mod client;
pub mod config;
pub mod error;
pub mod poller;
pub mod types;

pub use client::{CoachBackend, CoachClient};
pub use config::ClientConfig;
pub use error::ClientError;
pub use poller::SyncPoller;
pub use types::{
    ContextualOption, DescribePlanRequest, Difficulty, Drill, EvaluationType, ExplainMoveRequest,
    FocusSummary, Milestone, MoveExplanation, PlanDescription, ReflectionNote, SyncState,
    SyncStatus,
};
