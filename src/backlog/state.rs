use serde::{Deserialize, Serialize};

/// Lifecycle state of a backlog item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BacklogState {
    /// Not picked up yet
    #[default]
    Todo,
    /// A developer is working on it
    Doing,
    /// Development finished, waiting for a tester
    ReadyForTesting,
    /// Being tested
    Testing,
    /// Testing passed
    Tested,
    /// Accepted and complete
    Done,
}

impl BacklogState {
    /// All states in lifecycle order.
    pub fn all() -> &'static [BacklogState] {
        &[
            BacklogState::Todo,
            BacklogState::Doing,
            BacklogState::ReadyForTesting,
            BacklogState::Testing,
            BacklogState::Tested,
            BacklogState::Done,
        ]
    }

    /// The single forward successor, or `None` for `Done`.
    pub fn successor(self) -> Option<BacklogState> {
        use BacklogState::*;
        match self {
            Todo => Some(Doing),
            Doing => Some(ReadyForTesting),
            ReadyForTesting => Some(Testing),
            Testing => Some(Tested),
            Tested => Some(Done),
            Done => None,
        }
    }

    /// Whether leaving this state forward requires every activity to be done.
    pub fn guards_completion(self) -> bool {
        matches!(self, BacklogState::Tested)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, BacklogState::Done)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BacklogState::Todo => "Todo",
            BacklogState::Doing => "Doing",
            BacklogState::ReadyForTesting => "Ready for Testing",
            BacklogState::Testing => "Testing",
            BacklogState::Tested => "Tested",
            BacklogState::Done => "Done",
        }
    }
}

impl std::fmt::Display for BacklogState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
