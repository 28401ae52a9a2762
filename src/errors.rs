//! Typed error hierarchy for the release lifecycle.
//!
//! Every failure surfaced by the library is a [`WorkflowError`]. Variants are
//! grouped into four kinds (see [`ErrorKind`]):
//! - `State`: the operation is invalid for the current run/lock state
//! - `Precondition`: a domain invariant is not met
//! - `Conflict`: a write-once value was written twice
//! - `InvalidArgument`: the caller asked for something that does not exist
//!
//! Failures inside a pipeline step never show up here; the step template turns
//! them into a recorded outcome instead.

use thiserror::Error;

/// Coarse classification of a [`WorkflowError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    State,
    Precondition,
    Conflict,
    InvalidArgument,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::State => "state",
            ErrorKind::Precondition => "precondition",
            ErrorKind::Conflict => "conflict",
            ErrorKind::InvalidArgument => "invalid_argument",
        };
        f.write_str(name)
    }
}

/// Errors from backlog, pipeline and sprint operations.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Pipeline '{pipeline}' is already running")]
    PipelineAlreadyRunning { pipeline: String },

    #[error("Cannot add steps while pipeline '{pipeline}' is running")]
    StepsLocked { pipeline: String },

    #[error("Cannot {operation} release while pipeline is still running")]
    ReleasePipelineRunning { operation: String },

    #[error("Cannot replace the pipeline of sprint '{sprint}' while it is running")]
    PipelineInUse { sprint: String },

    #[error("Cannot {operation} release in state {state}")]
    InvalidTransition { state: String, operation: String },

    #[error("Cannot change {field} of sprint '{sprint}' after it has started")]
    SprintLocked { sprint: String, field: String },

    #[error("Cannot finish sprint '{sprint}' that hasn't started")]
    SprintNotStarted { sprint: String },

    #[error("No async runtime available to run pipeline '{pipeline}'")]
    NoRuntime { pipeline: String },

    #[error("Cannot move '{item}' to Done state: not all activities are completed")]
    ActivitiesIncomplete { item: String },

    #[error("Cannot start release before sprint '{sprint}' is finished")]
    SprintNotFinished { sprint: String },

    #[error("Cannot {operation} release without a pipeline")]
    MissingPipeline { operation: String },

    #[error("Cannot start release - not all backlog items are done")]
    BacklogIncomplete { sprint: String },

    #[error("Cannot start sprint '{sprint}' without a Scrum Master")]
    MissingScrumMaster { sprint: String },

    #[error("Cannot start sprint '{sprint}' without team members")]
    EmptyTeam { sprint: String },

    #[error("Backlog item '{item}' already has an assigned developer ({developer})")]
    DeveloperAlreadyAssigned { item: String, developer: String },

    #[error("Unknown step type: {0}")]
    UnknownStepKind(String),

    #[error("Unknown run strategy: {0}")]
    UnknownStrategy(String),
}

impl WorkflowError {
    /// The error kind this variant belongs to.
    pub fn kind(&self) -> ErrorKind {
        use WorkflowError::*;
        match self {
            PipelineAlreadyRunning { .. }
            | StepsLocked { .. }
            | ReleasePipelineRunning { .. }
            | PipelineInUse { .. }
            | InvalidTransition { .. }
            | SprintLocked { .. }
            | SprintNotStarted { .. }
            | NoRuntime { .. } => ErrorKind::State,
            ActivitiesIncomplete { .. }
            | SprintNotFinished { .. }
            | MissingPipeline { .. }
            | BacklogIncomplete { .. }
            | MissingScrumMaster { .. }
            | EmptyTeam { .. } => ErrorKind::Precondition,
            DeveloperAlreadyAssigned { .. } => ErrorKind::Conflict,
            UnknownStepKind(_) | UnknownStrategy(_) => ErrorKind::InvalidArgument,
        }
    }

    pub(crate) fn invalid_transition(state: impl ToString, operation: &str) -> Self {
        WorkflowError::InvalidTransition {
            state: state.to_string(),
            operation: operation.to_string(),
        }
    }
}
