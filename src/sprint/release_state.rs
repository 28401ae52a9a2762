use crate::errors::WorkflowError;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a release sprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseState {
    #[default]
    Created,
    InProgress,
    /// The pipeline has been (or is about to be) dispatched
    Releasing,
    /// Pipeline dispatched; waiting to be finalized
    Finished,
    Released,
    Cancelled,
    Closed,
}

/// Operations that drive the release state machine. `close` is not one of
/// them: closing is allowed from every state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReleaseAction {
    Start,
    Perform,
    Retry,
    Cancel,
}

impl ReleaseAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReleaseAction::Start => "start",
            ReleaseAction::Perform => "perform",
            ReleaseAction::Retry => "retry",
            ReleaseAction::Cancel => "cancel",
        }
    }
}

impl std::fmt::Display for ReleaseAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ReleaseState {
    pub fn all() -> &'static [ReleaseState] {
        &[
            ReleaseState::Created,
            ReleaseState::InProgress,
            ReleaseState::Releasing,
            ReleaseState::Finished,
            ReleaseState::Released,
            ReleaseState::Cancelled,
            ReleaseState::Closed,
        ]
    }

    /// Target state of `action`, or a state error if this state rejects it.
    ///
    /// Guards that depend on the sprint (finished, pipeline attached, backlog
    /// done) are checked by the caller before this.
    pub fn transition(self, action: ReleaseAction) -> Result<ReleaseState, WorkflowError> {
        use ReleaseAction::*;
        use ReleaseState::*;
        let next = match (self, action) {
            (Created, Start) => InProgress,
            (InProgress, Perform | Retry) => Releasing,
            (Releasing, Perform) => Finished,
            (Finished, Perform) => Released,
            (InProgress | Releasing | Finished, Cancel) => Cancelled,
            (state, action) => {
                return Err(WorkflowError::invalid_transition(state, action.as_str()));
            }
        };
        Ok(next)
    }

    /// No operation other than `close` is accepted.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ReleaseState::Released | ReleaseState::Cancelled | ReleaseState::Closed
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReleaseState::Created => "Created",
            ReleaseState::InProgress => "In Progress",
            ReleaseState::Releasing => "Releasing",
            ReleaseState::Finished => "Finished",
            ReleaseState::Released => "Released",
            ReleaseState::Cancelled => "Cancelled",
            ReleaseState::Closed => "Closed",
        }
    }
}

impl std::fmt::Display for ReleaseState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
