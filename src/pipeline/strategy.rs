use super::step::StepRunner;
use crate::errors::WorkflowError;
use serde::{Deserialize, Serialize};

/// Continuation policy for a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStrategy {
    /// Stop at the first failing step
    #[default]
    FailFast,
    /// Run every step; succeed only if all of them did
    AlwaysContinue,
}

impl RunStrategy {
    /// Run `steps` in order and return the overall verdict.
    ///
    /// An empty step list is a successful run.
    pub async fn run(&self, steps: &mut [StepRunner]) -> bool {
        self.run_with(steps, |_, _| {}).await
    }

    /// Like [`RunStrategy::run`], calling `on_step` with the index of each
    /// step as soon as it has run.
    pub async fn run_with<F>(&self, steps: &mut [StepRunner], mut on_step: F) -> bool
    where
        F: FnMut(usize, &StepRunner) + Send,
    {
        let mut all_succeeded = true;
        for (index, step) in steps.iter_mut().enumerate() {
            let succeeded = step.run().await;
            on_step(index, step);
            if succeeded {
                continue;
            }
            all_succeeded = false;
            match self {
                RunStrategy::FailFast => {
                    tracing::warn!(step = %step.name(), "Step failed. Aborting pipeline execution.");
                    return false;
                }
                RunStrategy::AlwaysContinue => {
                    tracing::warn!(step = %step.name(), "Step failed. Continuing with next steps.");
                }
            }
        }
        all_succeeded
    }

    pub fn aborts_on_failure(&self) -> bool {
        matches!(self, RunStrategy::FailFast)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunStrategy::FailFast => "fail_fast",
            RunStrategy::AlwaysContinue => "always_continue",
        }
    }
}

impl std::fmt::Display for RunStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RunStrategy {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "fail_fast" | "failfast" => Ok(RunStrategy::FailFast),
            "always_continue" | "alwayscontinue" => Ok(RunStrategy::AlwaysContinue),
            _ => Err(WorkflowError::UnknownStrategy(s.to_string())),
        }
    }
}
