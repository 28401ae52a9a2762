//! Backlog items and their lifecycle.
//!
//! A [`BacklogItem`] moves through a fixed sequence of [`BacklogState`]s:
//!
//! ```text
//! Todo -> Doing -> ReadyForTesting -> Testing -> Tested -> Done
//! ```
//!
//! Any state can be reverted to `Todo`. The `Tested -> Done` step is guarded:
//! every [`Activity`] on the item must be done first.

mod activity;
mod item;
mod state;

pub use activity::Activity;
pub use item::{BacklogItem, SharedBacklogItem};
pub use state::BacklogState;
