//! Pipeline steps and the template that runs them.
//!
//! A step is anything implementing [`PipelineStep`]. The engine never calls
//! the three phases directly; it wraps each step in a [`StepRunner`], whose
//! [`StepRunner::run`] executes `initialize -> execute -> publish_results` in
//! that order and turns any error or panic into a recorded [`StepOutcome`].

use crate::errors::WorkflowError;
use anyhow::bail;
use async_trait::async_trait;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::panic::AssertUnwindSafe;

/// One unit of pipeline work.
#[async_trait]
pub trait PipelineStep: Send {
    fn name(&self) -> &str;

    async fn initialize(&mut self) -> anyhow::Result<()>;

    async fn execute(&mut self) -> anyhow::Result<()>;

    async fn publish_results(&mut self) -> anyhow::Result<()>;
}

/// The three phases of the step template, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepPhase {
    Initialize,
    Execute,
    PublishResults,
}

impl StepPhase {
    pub const ORDER: [StepPhase; 3] = [
        StepPhase::Initialize,
        StepPhase::Execute,
        StepPhase::PublishResults,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StepPhase::Initialize => "initialize",
            StepPhase::Execute => "execute",
            StepPhase::PublishResults => "publish_results",
        }
    }
}

impl std::fmt::Display for StepPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of the most recent run of a step.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    /// Never run
    #[default]
    Pending,
    Succeeded,
    Failed { phase: StepPhase, reason: String },
}

impl StepOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, StepOutcome::Succeeded)
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, StepOutcome::Pending)
    }
}

/// A step plus the outcome of its last run.
pub struct StepRunner {
    step: Box<dyn PipelineStep>,
    outcome: StepOutcome,
}

impl StepRunner {
    pub fn new(step: Box<dyn PipelineStep>) -> Self {
        Self {
            step,
            outcome: StepOutcome::Pending,
        }
    }

    pub fn name(&self) -> &str {
        self.step.name()
    }

    pub fn outcome(&self) -> &StepOutcome {
        &self.outcome
    }

    pub fn is_successful(&self) -> bool {
        self.outcome.is_success()
    }

    /// Forget the previous outcome before a new run.
    pub fn reset(&mut self) {
        self.outcome = StepOutcome::Pending;
    }

    pub fn report(&self) -> StepReport {
        StepReport {
            name: self.name().to_string(),
            outcome: self.outcome.clone(),
        }
    }

    /// Run the template once, overwriting the previous outcome.
    ///
    /// Never fails: errors and panics from any phase become
    /// [`StepOutcome::Failed`] and the return value is `false`.
    pub async fn run(&mut self) -> bool {
        let name = self.step.name().to_string();
        tracing::info!(step = %name, "Running step");

        let mut current = StepPhase::Initialize;
        let attempt = {
            let step = &mut self.step;
            let current = &mut current;
            AssertUnwindSafe(async move {
                for phase in StepPhase::ORDER {
                    *current = phase;
                    match phase {
                        StepPhase::Initialize => step.initialize().await?,
                        StepPhase::Execute => step.execute().await?,
                        StepPhase::PublishResults => step.publish_results().await?,
                    }
                }
                Ok::<(), anyhow::Error>(())
            })
            .catch_unwind()
            .await
        };

        self.outcome = match attempt {
            Ok(Ok(())) => StepOutcome::Succeeded,
            Ok(Err(err)) => StepOutcome::Failed {
                phase: current,
                reason: format!("{err:#}"),
            },
            Err(payload) => StepOutcome::Failed {
                phase: current,
                reason: panic_message(payload.as_ref()),
            },
        };

        if let StepOutcome::Failed { phase, reason } = &self.outcome {
            tracing::warn!(step = %name, %phase, %reason, "Error in step");
        }
        self.outcome.is_success()
    }
}

/// Name and last outcome of a step, detached from the step itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    pub name: String,
    pub outcome: StepOutcome,
}

impl std::fmt::Debug for StepRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepRunner")
            .field("name", &self.name())
            .field("outcome", &self.outcome)
            .finish()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}

/// The built-in step kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    Source,
    Package,
    Build,
    Test,
    Analyze,
    Deploy,
    Utility,
}

impl StepKind {
    pub fn all() -> &'static [StepKind] {
        &[
            StepKind::Source,
            StepKind::Package,
            StepKind::Build,
            StepKind::Test,
            StepKind::Analyze,
            StepKind::Deploy,
            StepKind::Utility,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StepKind::Source => "Source",
            StepKind::Package => "Package",
            StepKind::Build => "Build",
            StepKind::Test => "Test",
            StepKind::Analyze => "Analyze",
            StepKind::Deploy => "Deploy",
            StepKind::Utility => "Utility",
        }
    }

    /// What the step does during its execute phase.
    pub fn description(&self) -> &'static str {
        match self {
            StepKind::Source => "Fetching source code",
            StepKind::Package => "Installing packages",
            StepKind::Build => "Compiling sources",
            StepKind::Test => "Running test suite",
            StepKind::Analyze => "Running static analysis",
            StepKind::Deploy => "Deploying artifacts",
            StepKind::Utility => "Running utility commands",
        }
    }
}

impl std::fmt::Display for StepKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StepKind {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "source" => Ok(StepKind::Source),
            "package" => Ok(StepKind::Package),
            "build" => Ok(StepKind::Build),
            "test" => Ok(StepKind::Test),
            "analyze" => Ok(StepKind::Analyze),
            "deploy" => Ok(StepKind::Deploy),
            "utility" => Ok(StepKind::Utility),
            _ => Err(WorkflowError::UnknownStepKind(s.to_string())),
        }
    }
}

/// Behavioural stand-in for a real build/deploy step.
///
/// It only logs what it would do. [`StubStep::failing`] makes it fail in a
/// chosen phase, which is how failed releases are rehearsed.
#[derive(Debug, Clone)]
pub struct StubStep {
    kind: StepKind,
    fail_in: Option<StepPhase>,
}

impl StubStep {
    pub fn new(kind: StepKind) -> Self {
        Self {
            kind,
            fail_in: None,
        }
    }

    pub fn failing(kind: StepKind, phase: StepPhase) -> Self {
        Self {
            kind,
            fail_in: Some(phase),
        }
    }

    fn phase(&self, phase: StepPhase, detail: &str) -> anyhow::Result<()> {
        tracing::debug!(step = %self.kind, %phase, "{detail}");
        if self.fail_in == Some(phase) {
            bail!("{} step failed during {}", self.kind, phase);
        }
        Ok(())
    }
}

#[async_trait]
impl PipelineStep for StubStep {
    fn name(&self) -> &str {
        self.kind.as_str()
    }

    async fn initialize(&mut self) -> anyhow::Result<()> {
        self.phase(StepPhase::Initialize, "Preparing step")
    }

    async fn execute(&mut self) -> anyhow::Result<()> {
        self.phase(StepPhase::Execute, self.kind.description())
    }

    async fn publish_results(&mut self) -> anyhow::Result<()> {
        self.phase(StepPhase::PublishResults, "Publishing results")
    }
}

/// Create a built-in step from its kind name (case-insensitive).
pub fn create_step(kind: &str) -> Result<Box<dyn PipelineStep>, WorkflowError> {
    let kind: StepKind = kind.parse()?;
    Ok(Box::new(StubStep::new(kind)))
}
