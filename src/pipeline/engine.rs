//! Pipeline execution engine.
//!
//! A [`Pipeline`] owns an ordered list of steps and a [`RunStrategy`]. A run is
//! dispatched onto a tokio task by [`Pipeline::run_all_steps`]; the caller gets
//! a [`PipelineRun`] handle back immediately and may await it or drop it.
//!
//! The `running` flag is claimed by the caller and released by a guard owned
//! by the task, so it is cleared on every exit path. The same guard writes the
//! final log line and calls the attached [`CompletionListener`].
//!
//! The step list is held by the run task for the whole run. Queries read a
//! separate roster of [`StepReport`]s that is updated as each step finishes,
//! so they never wait on a run.

use super::step::{PipelineStep, StepOutcome, StepReport, StepRunner};
use super::strategy::RunStrategy;
use crate::errors::WorkflowError;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::Instrument;
use uuid::Uuid;

/// Receives the verdict when a pipeline run ends.
pub trait CompletionListener: Send + Sync {
    fn pipeline_finished(&self, success: bool);
}

#[derive(Debug, Default)]
struct RunRecord {
    run_id: Option<Uuid>,
    last_run_time: Option<DateTime<Local>>,
    duration: Duration,
    logs: Vec<String>,
}

/// An ordered sequence of steps executed under a [`RunStrategy`].
pub struct Pipeline {
    name: String,
    strategy: RunStrategy,
    steps: tokio::sync::Mutex<Vec<StepRunner>>,
    roster: Mutex<Vec<StepReport>>,
    running: AtomicBool,
    last_run_successful: AtomicBool,
    record: Mutex<RunRecord>,
    listener: Mutex<Option<Weak<dyn CompletionListener>>>,
}

impl Pipeline {
    pub fn new(name: impl Into<String>, strategy: RunStrategy) -> Self {
        Self::with_steps(name, strategy, Vec::new())
    }

    /// Create a pipeline that starts out with `steps`.
    pub fn with_steps(
        name: impl Into<String>,
        strategy: RunStrategy,
        steps: Vec<Box<dyn PipelineStep>>,
    ) -> Self {
        let steps: Vec<StepRunner> = steps.into_iter().map(StepRunner::new).collect();
        Self {
            name: name.into(),
            strategy,
            roster: Mutex::new(steps.iter().map(StepRunner::report).collect()),
            steps: tokio::sync::Mutex::new(steps),
            running: AtomicBool::new(false),
            last_run_successful: AtomicBool::new(false),
            record: Mutex::new(RunRecord::default()),
            listener: Mutex::new(None),
        }
    }

    pub fn shared(self) -> Arc<Pipeline> {
        Arc::new(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn strategy(&self) -> RunStrategy {
        self.strategy
    }

    /// Append a step. Rejected while a run is in flight.
    pub async fn add_step(&self, step: Box<dyn PipelineStep>) -> Result<(), WorkflowError> {
        self.ensure_idle()?;
        let mut steps = self.steps.lock().await;
        self.ensure_idle()?;
        let runner = StepRunner::new(step);
        lock(&self.roster).push(runner.report());
        steps.push(runner);
        Ok(())
    }

    /// Build a step from its kind name (case-insensitive) and append it.
    pub async fn create_and_add_step(&self, kind: &str) -> Result<(), WorkflowError> {
        self.ensure_idle()?;
        let step = super::step::create_step(kind)?;
        self.add_step(step).await
    }

    fn ensure_idle(&self) -> Result<(), WorkflowError> {
        if self.is_running() {
            return Err(WorkflowError::StepsLocked {
                pipeline: self.name.clone(),
            });
        }
        Ok(())
    }

    /// Attach the party to call back when a run ends.
    pub fn set_completion_listener(&self, listener: Weak<dyn CompletionListener>) {
        *lock(&self.listener) = Some(listener);
    }

    pub fn clear_completion_listener(&self) {
        *lock(&self.listener) = None;
    }

    /// Start a run on a new tokio task and return without waiting for it.
    ///
    /// Fails if a run is already in flight or if no tokio runtime is active.
    pub fn run_all_steps(self: &Arc<Self>) -> Result<PipelineRun, WorkflowError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| WorkflowError::NoRuntime {
            pipeline: self.name.clone(),
        })?;
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(WorkflowError::PipelineAlreadyRunning {
                pipeline: self.name.clone(),
            });
        }

        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("pipeline_run", %run_id, pipeline = %self.name);
        let pipeline = Arc::clone(self);
        let task = runtime.spawn(async move { pipeline.execute(run_id).await }.instrument(span));

        Ok(PipelineRun { run_id, task })
    }

    async fn execute(&self, run_id: Uuid) -> bool {
        let guard = RunGuard { pipeline: self };

        self.last_run_successful.store(false, Ordering::SeqCst);
        {
            let mut record = lock(&self.record);
            record.logs.clear();
            record.run_id = Some(run_id);
            record.last_run_time = Some(Local::now());
            record.duration = Duration::ZERO;
        }
        self.log(format!("Starting pipeline: {}", self.name));

        let started = Instant::now();
        let success = {
            let mut steps = self.steps.lock().await;
            steps.iter_mut().for_each(StepRunner::reset);
            *lock(&self.roster) = steps.iter().map(StepRunner::report).collect();

            let verdict = self
                .strategy
                .run_with(&mut steps, |index, step| {
                    if let Some(slot) = lock(&self.roster).get_mut(index) {
                        *slot = step.report();
                    }
                })
                .await;
            self.log_step_outcomes(&steps);
            verdict
        };
        let elapsed = started.elapsed();

        lock(&self.record).duration = elapsed;
        self.last_run_successful.store(success, Ordering::SeqCst);
        self.log(format!(
            "Pipeline execution finished in {} seconds",
            elapsed.as_secs()
        ));

        drop(guard);
        success
    }

    fn log_step_outcomes(&self, steps: &[StepRunner]) {
        let mut aborted_at = None;
        for step in steps {
            match step.outcome() {
                StepOutcome::Succeeded => self.log(format!("Step {} succeeded", step.name())),
                StepOutcome::Failed { phase, reason } => {
                    self.log(format!(
                        "Step {} failed during {}: {}",
                        step.name(),
                        phase,
                        reason
                    ));
                    if self.strategy.aborts_on_failure() && aborted_at.is_none() {
                        aborted_at = Some(step.name().to_string());
                    }
                }
                StepOutcome::Pending => self.log(format!("Step {} was not run", step.name())),
            }
        }
        if let Some(step) = aborted_at {
            self.log(format!("Aborted pipeline after step {} failed", step));
        }
    }

    fn log(&self, message: String) {
        tracing::info!(pipeline = %self.name, "{message}");
        let entry = format!("{} - {}", Local::now().format("%Y-%m-%d %H:%M:%S"), message);
        lock(&self.record).logs.push(entry);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn was_last_run_successful(&self) -> bool {
        self.last_run_successful.load(Ordering::SeqCst)
    }

    /// Snapshot of the log trail of the current or most recent run.
    pub fn execution_logs(&self) -> Vec<String> {
        lock(&self.record).logs.clone()
    }

    pub fn last_run_time(&self) -> Option<DateTime<Local>> {
        lock(&self.record).last_run_time
    }

    pub fn last_run_id(&self) -> Option<Uuid> {
        lock(&self.record).run_id
    }

    pub fn execution_duration(&self) -> Duration {
        lock(&self.record).duration
    }

    pub fn execution_duration_seconds(&self) -> u64 {
        self.execution_duration().as_secs()
    }

    pub fn step_count(&self) -> usize {
        lock(&self.roster).len()
    }

    pub fn successful_step_count(&self) -> usize {
        lock(&self.roster)
            .iter()
            .filter(|s| s.outcome.is_success())
            .count()
    }

    /// Whether a step with this name exists (case-insensitive).
    pub fn has_step_of_type(&self, name: &str) -> bool {
        lock(&self.roster)
            .iter()
            .any(|s| s.name.eq_ignore_ascii_case(name))
    }

    pub fn step_names(&self) -> Vec<String> {
        lock(&self.roster).iter().map(|s| s.name.clone()).collect()
    }

    /// Serializable snapshot of the pipeline and its current or most recent run.
    pub fn run_summary(&self) -> RunSummary {
        let steps = lock(&self.roster).clone();
        let record = lock(&self.record);
        RunSummary {
            pipeline: self.name.clone(),
            strategy: self.strategy,
            run_id: record.run_id,
            running: self.is_running(),
            success: self.was_last_run_successful(),
            last_run_time: record.last_run_time,
            duration_ms: record.duration.as_millis() as u64,
            steps,
            logs: record.logs.clone(),
        }
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.name)
            .field("strategy", &self.strategy)
            .field("running", &self.is_running())
            .field("last_run_successful", &self.was_last_run_successful())
            .finish()
    }
}

/// Releases the run on drop: final log line, `running = false`, listener call.
struct RunGuard<'a> {
    pipeline: &'a Pipeline,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        let pipeline = self.pipeline;
        let success = pipeline.was_last_run_successful();
        pipeline.log(format!(
            "Pipeline completed with status: {}",
            if success { "SUCCESS" } else { "FAILURE" }
        ));
        pipeline.running.store(false, Ordering::SeqCst);

        let listener = lock(&pipeline.listener).as_ref().and_then(Weak::upgrade);
        if let Some(listener) = listener {
            listener.pipeline_finished(success);
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle to a dispatched run.
#[derive(Debug)]
pub struct PipelineRun {
    run_id: Uuid,
    task: JoinHandle<bool>,
}

impl PipelineRun {
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Wait for the run to end and return its verdict. A task that was
    /// cancelled or panicked counts as a failed run.
    pub async fn wait(self) -> bool {
        match self.task.await {
            Ok(success) => success,
            Err(err) => {
                tracing::error!(run_id = %self.run_id, error = %err, "pipeline task did not complete");
                false
            }
        }
    }
}

/// Serializable view of a pipeline after (or during) a run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub pipeline: String,
    pub strategy: RunStrategy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<Uuid>,
    pub running: bool,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_run_time: Option<DateTime<Local>>,
    pub duration_ms: u64,
    pub steps: Vec<StepReport>,
    pub logs: Vec<String>,
}
