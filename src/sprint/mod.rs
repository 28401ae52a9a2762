//! Sprints and the release state machine.
//!
//! A [`Sprint`] is the time box: dates, backlog and team, frozen once it
//! starts. A [`ReleaseSprint`] wraps a sprint with a [`ReleaseState`] and an
//! attached pipeline:
//!
//! ```text
//! Created --start--> InProgress --perform/retry--> Releasing --perform--> Finished --perform--> Released
//!                        |                            |                      |
//!                        +----------cancel------------+--------cancel--------+--> Cancelled
//!
//! any state --close--> Closed
//! ```

mod release;
mod release_state;
mod timebox;

pub use release::ReleaseSprint;
pub use release_state::{ReleaseAction, ReleaseState};
pub use timebox::Sprint;
