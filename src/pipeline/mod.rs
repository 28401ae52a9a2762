//! Release pipelines.
//!
//! - [`step`]: the [`PipelineStep`] trait, the step template and built-in kinds
//! - [`strategy`]: how a run reacts to a failing step
//! - [`engine`]: the [`Pipeline`] that runs steps asynchronously
//!
//! # Example
//!
//! ```no_run
//! use shipyard::pipeline::{Pipeline, RunStrategy};
//!
//! # async fn demo() -> Result<(), shipyard::errors::WorkflowError> {
//! let pipeline = Pipeline::new("release", RunStrategy::FailFast).shared();
//! pipeline.create_and_add_step("build").await?;
//! pipeline.create_and_add_step("deploy").await?;
//!
//! let run = pipeline.run_all_steps()?;
//! let success = run.wait().await;
//! # let _ = success;
//! # Ok(())
//! # }
//! ```

pub mod engine;
pub mod step;
pub mod strategy;

pub use engine::{CompletionListener, Pipeline, PipelineRun, RunSummary};
pub use step::{
    PipelineStep, StepKind, StepOutcome, StepPhase, StepReport, StepRunner, StubStep, create_step,
};
pub use strategy::RunStrategy;
