//! Backlog and release lifecycle engine.
//!
//! - [`backlog`]: backlog items, activities and their state machine
//! - [`sprint`]: sprints and the release state machine
//! - [`pipeline`]: release pipelines, run strategies and async execution
//! - [`observer`] and [`team`]: notifications and the people receiving them
//! - [`config`] and [`logging`]: `shipyard.toml` and tracing setup for the CLI

pub mod backlog;
pub mod config;
pub mod errors;
pub mod logging;
pub mod observer;
pub mod pipeline;
pub mod sprint;
pub mod team;

pub use errors::{ErrorKind, WorkflowError};
