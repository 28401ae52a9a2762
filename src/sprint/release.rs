use super::release_state::{ReleaseAction, ReleaseState};
use super::timebox::Sprint;
use crate::backlog::SharedBacklogItem;
use crate::errors::WorkflowError;
use crate::observer::{Observable, SharedObserver, observer_id};
use crate::pipeline::{CompletionListener, Pipeline, PipelineRun};
use crate::team::{Role, TeamMember};
use chrono::NaiveDate;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

struct ReleaseInner {
    sprint: Sprint,
    state: ReleaseState,
    pipeline: Option<Arc<Pipeline>>,
    observers: Observable,
}

impl ReleaseInner {
    /// Observers, scrum master and product owners, each exactly once.
    fn audience(&self) -> Vec<SharedObserver> {
        let mut recipients: Vec<SharedObserver> = self.observers.observers().to_vec();
        let staff = self
            .sprint
            .scrum_master()
            .into_iter()
            .chain(self.sprint.members_with_role(Role::ProductOwner));
        for member in staff {
            recipients.push(Arc::clone(member) as SharedObserver);
        }

        let mut seen = Vec::with_capacity(recipients.len());
        recipients.retain(|r| {
            let id = observer_id(r);
            if seen.contains(&id) {
                false
            } else {
                seen.push(id);
                true
            }
        });
        recipients
    }
}

/// A message waiting to go out once the sprint lock has been released.
struct Announcement {
    recipients: Vec<SharedObserver>,
    message: String,
}

impl Announcement {
    fn deliver(self) {
        for recipient in &self.recipients {
            recipient.update(&self.message);
        }
    }
}

/// A sprint whose goal is shipping a release through a [`Pipeline`].
///
/// Created with [`ReleaseSprint::new`], which hands out an `Arc` so the
/// attached pipeline can call back through a weak reference when a run ends.
/// All methods take `&self`; notifications go out after the internal lock is
/// dropped, so observers may query the sprint while handling them.
pub struct ReleaseSprint {
    inner: Mutex<ReleaseInner>,
    pipeline_running: AtomicBool,
    this: Weak<ReleaseSprint>,
}

impl ReleaseSprint {
    pub fn new(name: impl Into<String>, start_date: NaiveDate, end_date: NaiveDate) -> Arc<Self> {
        let sprint = Sprint::new(name, start_date, end_date);
        Arc::new_cyclic(|this| ReleaseSprint {
            inner: Mutex::new(ReleaseInner {
                sprint,
                state: ReleaseState::Created,
                pipeline: None,
                observers: Observable::new(),
            }),
            pipeline_running: AtomicBool::new(false),
            this: this.clone(),
        })
    }

    fn lock(&self) -> MutexGuard<'_, ReleaseInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn name(&self) -> String {
        self.lock().sprint.name().to_string()
    }

    pub fn state(&self) -> ReleaseState {
        self.lock().state
    }

    pub fn is_pipeline_running(&self) -> bool {
        self.pipeline_running.load(Ordering::SeqCst)
    }

    pub fn pipeline(&self) -> Option<Arc<Pipeline>> {
        self.lock().pipeline.clone()
    }

    /// Read access to the underlying sprint.
    pub fn with_sprint<R>(&self, f: impl FnOnce(&Sprint) -> R) -> R {
        f(&self.lock().sprint)
    }

    pub fn backlog_items(&self) -> Vec<SharedBacklogItem> {
        self.lock().sprint.backlog().to_vec()
    }

    pub fn subscribe(&self, observer: SharedObserver) {
        self.lock().observers.subscribe(observer);
    }

    pub fn unsubscribe(&self, observer: &SharedObserver) -> bool {
        self.lock().observers.unsubscribe(observer)
    }

    /// Attach the pipeline this release runs, replacing any previous one.
    pub fn set_pipeline(&self, pipeline: Arc<Pipeline>) -> Result<(), WorkflowError> {
        let mut inner = self.lock();
        if self.is_pipeline_running() {
            return Err(WorkflowError::PipelineInUse {
                sprint: inner.sprint.name().to_string(),
            });
        }
        if let Some(previous) = inner.pipeline.take() {
            previous.clear_completion_listener();
        }
        let listener: Weak<dyn CompletionListener> = self.this.clone();
        pipeline.set_completion_listener(listener);
        inner.pipeline = Some(pipeline);
        Ok(())
    }

    /// Move the sprint's dates. Only allowed before the sprint starts.
    pub fn reschedule(&self, start: NaiveDate, end: NaiveDate) -> Result<(), WorkflowError> {
        let mut inner = self.lock();
        inner.sprint.set_start_date(start)?;
        inner.sprint.set_end_date(end)
    }

    pub fn add_backlog_item(&self, item: SharedBacklogItem) -> Result<(), WorkflowError> {
        self.lock().sprint.add_backlog_item(item)
    }

    pub fn add_team_member(&self, member: Arc<TeamMember>) -> Result<(), WorkflowError> {
        self.lock().sprint.add_team_member(member)
    }

    /// Set the scrum master and subscribe them to sprint notifications.
    pub fn set_scrum_master(&self, member: Arc<TeamMember>) -> Result<(), WorkflowError> {
        let mut inner = self.lock();
        let previous = inner.sprint.scrum_master().cloned();
        inner.sprint.set_scrum_master(Arc::clone(&member))?;
        if let Some(previous) = previous {
            let previous: SharedObserver = previous;
            inner.observers.unsubscribe(&previous);
        }
        inner.observers.subscribe(member);
        Ok(())
    }

    pub fn start_sprint(&self) -> Result<(), WorkflowError> {
        let mut inner = self.lock();
        let message = inner.sprint.start()?;
        let announcement = Announcement {
            recipients: inner.audience(),
            message,
        };
        drop(inner);
        announcement.deliver();
        Ok(())
    }

    pub fn finish_sprint(&self) -> Result<(), WorkflowError> {
        let mut inner = self.lock();
        let message = inner.sprint.finish()?;
        let announcement = Announcement {
            recipients: inner.audience(),
            message,
        };
        drop(inner);
        announcement.deliver();
        Ok(())
    }

    /// Finish the sprint if `today` is past its end date. Returns whether it
    /// was finished by this call.
    pub fn check_deadline(&self, today: NaiveDate) -> bool {
        let mut inner = self.lock();
        let Some(message) = inner.sprint.check_deadline(today) else {
            return false;
        };
        let announcement = Announcement {
            recipients: inner.audience(),
            message,
        };
        drop(inner);
        announcement.deliver();
        true
    }

    /// `Created -> InProgress`. Requires a finished sprint, an attached
    /// pipeline and a non-empty backlog whose items are all done.
    pub fn start_release(&self) -> Result<(), WorkflowError> {
        let inner = self.lock();
        let next = inner.state.transition(ReleaseAction::Start)?;
        let sprint = inner.sprint.name().to_string();
        if !inner.sprint.is_finished() {
            return Err(WorkflowError::SprintNotFinished { sprint });
        }
        if inner.pipeline.is_none() {
            return Err(WorkflowError::MissingPipeline {
                operation: ReleaseAction::Start.to_string(),
            });
        }
        if !inner.sprint.all_backlog_items_done() {
            return Err(WorkflowError::BacklogIncomplete { sprint });
        }
        self.change_state(inner, next);
        Ok(())
    }

    /// Advance the release.
    ///
    /// From `Releasing` this dispatches the pipeline and moves to `Finished`
    /// right away, without waiting for the run. The returned handle can be
    /// awaited for the verdict; other transitions return `None`.
    pub fn perform_release(&self) -> Result<Option<PipelineRun>, WorkflowError> {
        let inner = self.lock();
        let Some(pipeline) = inner.pipeline.clone() else {
            return Err(WorkflowError::MissingPipeline {
                operation: ReleaseAction::Perform.to_string(),
            });
        };
        let next = inner.state.transition(ReleaseAction::Perform)?;

        let mut run = None;
        if inner.state == ReleaseState::Releasing {
            self.pipeline_running.store(true, Ordering::SeqCst);
            match pipeline.run_all_steps() {
                Ok(handle) => {
                    tracing::info!(sprint = %inner.sprint.name(), run_id = %handle.run_id(), "release pipeline dispatched");
                    run = Some(handle);
                }
                Err(err) => {
                    self.pipeline_running.store(false, Ordering::SeqCst);
                    return Err(err);
                }
            }
        }

        self.change_state(inner, next);
        Ok(run)
    }

    /// `InProgress -> Releasing`. Rejected while the pipeline is running.
    pub fn retry_release(&self) -> Result<(), WorkflowError> {
        self.guarded_transition(ReleaseAction::Retry)
    }

    /// Cancel from `InProgress`, `Releasing` or `Finished`. Rejected while the
    /// pipeline is running.
    pub fn cancel_release(&self) -> Result<(), WorkflowError> {
        self.guarded_transition(ReleaseAction::Cancel)
    }

    fn guarded_transition(&self, action: ReleaseAction) -> Result<(), WorkflowError> {
        let inner = self.lock();
        if self.is_pipeline_running() {
            return Err(WorkflowError::ReleasePipelineRunning {
                operation: action.to_string(),
            });
        }
        let next = inner.state.transition(action)?;
        self.change_state(inner, next);
        Ok(())
    }

    /// Move to `Closed` from any state, even while the pipeline is running.
    /// Closing an already closed release announces `Closed` to `Closed` again.
    pub fn close_release(&self) {
        let inner = self.lock();
        tracing::info!(sprint = %inner.sprint.name(), "closing release");
        self.change_state(inner, ReleaseState::Closed);
    }

    /// Completion callback for the release pipeline.
    pub fn finish_release(&self, success: bool) {
        self.pipeline_running.store(false, Ordering::SeqCst);
        let inner = self.lock();
        let message = if success {
            format!(
                "Release pipeline for sprint '{}' completed successfully.",
                inner.sprint.name()
            )
        } else {
            format!(
                "Release pipeline for sprint '{}' failed. Check the pipeline logs.",
                inner.sprint.name()
            )
        };
        tracing::info!(sprint = %inner.sprint.name(), success, "release pipeline finished");
        let announcement = Announcement {
            recipients: inner.audience(),
            message,
        };
        drop(inner);
        announcement.deliver();
    }

    fn change_state(&self, mut inner: MutexGuard<'_, ReleaseInner>, next: ReleaseState) {
        let previous = inner.state;
        inner.state = next;
        tracing::info!(sprint = %inner.sprint.name(), from = %previous, to = %next, "release state changed");
        let announcement = Announcement {
            message: format!(
                "Release sprint '{}' state changed from {} to {}",
                inner.sprint.name(),
                previous,
                next
            ),
            recipients: inner.audience(),
        };
        drop(inner);
        announcement.deliver();
    }
}

impl CompletionListener for ReleaseSprint {
    fn pipeline_finished(&self, success: bool) {
        self.finish_release(success);
    }
}

impl std::fmt::Debug for ReleaseSprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("ReleaseSprint")
            .field("name", &inner.sprint.name())
            .field("state", &inner.state)
            .field("pipeline", &inner.pipeline.as_ref().map(|p| p.name().to_string()))
            .field("pipeline_running", &self.is_pipeline_running())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backlog::{BacklogItem, BacklogState};
    use crate::errors::ErrorKind;
    use crate::observer::Observer;
    use crate::pipeline::{PipelineStep, RunStrategy, StepKind, StepPhase, StubStep};
    use crate::team::NotificationChannel;
    use tokio::sync::Notify;

    #[derive(Default)]
    struct Recorder {
        messages: Mutex<Vec<String>>,
    }

    impl Observer for Recorder {
        fn update(&self, message: &str) {
            self.messages.lock().unwrap().push(message.to_string());
        }
    }

    impl Recorder {
        fn messages(&self) -> Vec<String> {
            self.messages.lock().unwrap().clone()
        }
    }

    #[derive(Clone, Default)]
    struct Inbox(Arc<Mutex<Vec<String>>>);

    impl NotificationChannel for Inbox {
        fn name(&self) -> &str {
            "inbox"
        }

        fn send(&self, message: &str) {
            self.0.lock().unwrap().push(message.to_string());
        }
    }

    impl Inbox {
        fn messages(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }

        fn count(&self, needle: &str) -> usize {
            self.messages().iter().filter(|m| m.contains(needle)).count()
        }
    }

    struct GateStep {
        release: Arc<Notify>,
    }

    #[async_trait::async_trait]
    impl PipelineStep for GateStep {
        fn name(&self) -> &str {
            "Gate"
        }

        async fn initialize(&mut self) -> anyhow::Result<()> {
            Ok(())
        }

        async fn execute(&mut self) -> anyhow::Result<()> {
            self.release.notified().await;
            Ok(())
        }

        async fn publish_results(&mut self) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, d).unwrap()
    }

    fn done_item(title: &str) -> SharedBacklogItem {
        let mut item = BacklogItem::new(title);
        while item.state() != BacklogState::Done {
            item.move_to_next().unwrap();
        }
        item.shared()
    }

    struct Fixture {
        sprint: Arc<ReleaseSprint>,
        scrum_master: Inbox,
        product_owner: Inbox,
    }

    /// Staffed sprint with one done item, started but not finished.
    fn fixture() -> Fixture {
        let scrum_master = Inbox::default();
        let product_owner = Inbox::default();
        let sprint = ReleaseSprint::new("R1", date(1), date(14));
        sprint
            .set_scrum_master(
                TeamMember::scrum_master("Sam")
                    .with_channel(Box::new(scrum_master.clone()))
                    .shared(),
            )
            .unwrap();
        sprint
            .add_team_member(TeamMember::developer("Alice").shared())
            .unwrap();
        sprint
            .add_team_member(
                TeamMember::product_owner("Pat")
                    .with_channel(Box::new(product_owner.clone()))
                    .shared(),
            )
            .unwrap();
        sprint.add_backlog_item(done_item("Login")).unwrap();
        sprint.start_sprint().unwrap();
        Fixture {
            sprint,
            scrum_master,
            product_owner,
        }
    }

    fn stub_pipeline(strategy: RunStrategy, steps: Vec<Box<dyn PipelineStep>>) -> Arc<Pipeline> {
        Pipeline::with_steps("release", strategy, steps).shared()
    }

    fn ready_sprint(pipeline: Arc<Pipeline>) -> Fixture {
        let fx = fixture();
        fx.sprint.finish_sprint().unwrap();
        fx.sprint.set_pipeline(pipeline).unwrap();
        fx
    }

    #[test]
    fn test_start_release_guards() {
        let fx = fixture();
        let err = fx.sprint.start_release().unwrap_err();
        assert!(matches!(err, WorkflowError::SprintNotFinished { .. }));

        fx.sprint.finish_sprint().unwrap();
        let err = fx.sprint.start_release().unwrap_err();
        assert!(matches!(err, WorkflowError::MissingPipeline { .. }));
        assert_eq!(err.kind(), ErrorKind::Precondition);
        assert_eq!(fx.sprint.state(), ReleaseState::Created);
    }

    #[test]
    fn test_start_release_requires_done_backlog() {
        let sprint = ReleaseSprint::new("R2", date(1), date(14));
        sprint
            .set_scrum_master(TeamMember::scrum_master("Sam").shared())
            .unwrap();
        sprint
            .add_team_member(TeamMember::developer("Alice").shared())
            .unwrap();
        let item = BacklogItem::new("Search").shared();
        sprint.add_backlog_item(item.clone()).unwrap();
        sprint.start_sprint().unwrap();
        sprint.finish_sprint().unwrap();
        sprint
            .set_pipeline(Pipeline::new("release", RunStrategy::FailFast).shared())
            .unwrap();

        let err = sprint.start_release().unwrap_err();
        assert!(matches!(err, WorkflowError::BacklogIncomplete { .. }));

        {
            let mut item = item.lock().unwrap();
            while item.state() != BacklogState::Done {
                item.move_to_next().unwrap();
            }
        }
        sprint.start_release().unwrap();
        assert_eq!(sprint.state(), ReleaseState::InProgress);
    }

    #[test]
    fn test_empty_backlog_blocks_release() {
        let sprint = ReleaseSprint::new("R3", date(1), date(14));
        sprint
            .set_scrum_master(TeamMember::scrum_master("Sam").shared())
            .unwrap();
        sprint
            .add_team_member(TeamMember::developer("Alice").shared())
            .unwrap();
        sprint.start_sprint().unwrap();
        sprint.finish_sprint().unwrap();
        sprint
            .set_pipeline(Pipeline::new("release", RunStrategy::FailFast).shared())
            .unwrap();

        let err = sprint.start_release().unwrap_err();
        assert!(matches!(err, WorkflowError::BacklogIncomplete { .. }));
    }

    #[test]
    fn test_perform_without_pipeline_is_a_precondition_error() {
        let fx = fixture();
        let err = fx.sprint.perform_release().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Precondition);
    }

    #[test]
    fn test_created_rejects_perform_retry_cancel() {
        let fx = ready_sprint(Pipeline::new("release", RunStrategy::FailFast).shared());
        assert_eq!(fx.sprint.perform_release().unwrap_err().kind(), ErrorKind::State);
        assert_eq!(fx.sprint.retry_release().unwrap_err().kind(), ErrorKind::State);
        assert_eq!(fx.sprint.cancel_release().unwrap_err().kind(), ErrorKind::State);
        assert_eq!(fx.sprint.state(), ReleaseState::Created);
    }

    #[tokio::test]
    async fn test_full_release_notifies_once_per_recipient() {
        let pipeline = stub_pipeline(
            RunStrategy::FailFast,
            vec![
                Box::new(StubStep::new(StepKind::Build)),
                Box::new(StubStep::new(StepKind::Deploy)),
            ],
        );
        let fx = ready_sprint(pipeline.clone());
        let observer = Arc::new(Recorder::default());
        fx.sprint.subscribe(observer.clone());

        fx.sprint.start_release().unwrap();
        fx.sprint.perform_release().unwrap();
        let run = fx.sprint.perform_release().unwrap().expect("pipeline dispatched");
        assert_eq!(fx.sprint.state(), ReleaseState::Finished);

        assert!(run.wait().await);
        assert!(!fx.sprint.is_pipeline_running());
        fx.sprint.perform_release().unwrap();
        assert_eq!(fx.sprint.state(), ReleaseState::Released);

        assert_eq!(fx.scrum_master.count("completed successfully"), 1);
        assert_eq!(fx.product_owner.count("completed successfully"), 1);
        assert_eq!(
            observer
                .messages()
                .iter()
                .filter(|m| m.contains("completed successfully"))
                .count(),
            1
        );
        assert_eq!(fx.scrum_master.count("state changed from"), 4);
        assert!(
            fx.scrum_master
                .messages()
                .contains(&"[Sam] Release sprint 'R1' state changed from Created to In Progress".to_string())
        );
    }

    #[tokio::test]
    async fn test_failed_pipeline_reports_failure() {
        let pipeline = stub_pipeline(
            RunStrategy::AlwaysContinue,
            vec![Box::new(StubStep::failing(StepKind::Test, StepPhase::Execute))],
        );
        let fx = ready_sprint(pipeline.clone());
        fx.sprint.start_release().unwrap();
        fx.sprint.perform_release().unwrap();
        let run = fx.sprint.perform_release().unwrap().unwrap();

        assert!(!run.wait().await);
        assert_eq!(fx.scrum_master.count("failed"), 1);
        assert_eq!(fx.scrum_master.count("completed successfully"), 0);
        assert!(!pipeline.was_last_run_successful());
    }

    #[tokio::test]
    async fn test_perform_moves_to_finished_before_pipeline_completes() {
        let gate = Arc::new(Notify::new());
        let pipeline = stub_pipeline(
            RunStrategy::FailFast,
            vec![Box::new(GateStep {
                release: gate.clone(),
            })],
        );
        let fx = ready_sprint(pipeline.clone());
        fx.sprint.start_release().unwrap();
        fx.sprint.retry_release().unwrap();
        assert_eq!(fx.sprint.state(), ReleaseState::Releasing);

        let run = fx.sprint.perform_release().unwrap().unwrap();
        assert_eq!(fx.sprint.state(), ReleaseState::Finished);
        assert!(fx.sprint.is_pipeline_running());

        let err = fx.sprint.cancel_release().unwrap_err();
        assert_eq!(err.to_string(), "Cannot cancel release while pipeline is still running");
        let err = fx.sprint.retry_release().unwrap_err();
        assert!(matches!(err, WorkflowError::ReleasePipelineRunning { .. }));
        let err = fx
            .sprint
            .set_pipeline(Pipeline::new("other", RunStrategy::FailFast).shared())
            .unwrap_err();
        assert!(matches!(err, WorkflowError::PipelineInUse { .. }));
        assert_eq!(fx.scrum_master.count("completed"), 0);

        gate.notify_one();
        assert!(run.wait().await);
        assert!(!fx.sprint.is_pipeline_running());
        assert_eq!(fx.scrum_master.count("completed successfully"), 1);

        fx.sprint.cancel_release().unwrap();
        assert_eq!(fx.sprint.state(), ReleaseState::Cancelled);
    }

    #[tokio::test]
    async fn test_close_is_allowed_mid_flight() {
        let gate = Arc::new(Notify::new());
        let pipeline = stub_pipeline(
            RunStrategy::FailFast,
            vec![Box::new(GateStep {
                release: gate.clone(),
            })],
        );
        let fx = ready_sprint(pipeline);
        fx.sprint.start_release().unwrap();
        fx.sprint.perform_release().unwrap();
        let run = fx.sprint.perform_release().unwrap().unwrap();

        fx.sprint.close_release();
        assert_eq!(fx.sprint.state(), ReleaseState::Closed);

        gate.notify_one();
        run.wait().await;
        assert!(!fx.sprint.is_pipeline_running());
        assert_eq!(fx.scrum_master.count("completed successfully"), 1);
        assert_eq!(fx.sprint.perform_release().unwrap_err().kind(), ErrorKind::State);
    }

    #[test]
    fn test_terminal_states_reject_operations_but_allow_close() {
        let fx = ready_sprint(Pipeline::new("release", RunStrategy::FailFast).shared());
        fx.sprint.start_release().unwrap();
        fx.sprint.cancel_release().unwrap();

        assert!(fx.sprint.start_release().is_err());
        assert!(fx.sprint.retry_release().is_err());
        assert!(fx.sprint.cancel_release().is_err());
        assert!(fx.sprint.perform_release().is_err());

        fx.sprint.close_release();
        assert_eq!(fx.sprint.state(), ReleaseState::Closed);
        assert!(fx.sprint.cancel_release().is_err());
    }

    #[test]
    fn test_closing_twice_announces_both_changes() {
        let fx = fixture();
        fx.sprint.close_release();
        fx.sprint.close_release();

        assert_eq!(fx.scrum_master.count("state changed from Created to Closed"), 1);
        assert_eq!(fx.scrum_master.count("state changed from Closed to Closed"), 1);
        assert_eq!(fx.product_owner.count("state changed"), 2);
    }

    #[test]
    fn test_replacing_pipeline_detaches_the_old_one() {
        let fx = fixture();
        let first = Pipeline::new("first", RunStrategy::FailFast).shared();
        let second = Pipeline::new("second", RunStrategy::FailFast).shared();
        fx.sprint.set_pipeline(first.clone()).unwrap();
        fx.sprint.set_pipeline(second).unwrap();

        assert_eq!(fx.sprint.pipeline().unwrap().name(), "second");
        fx.sprint.finish_sprint().unwrap();
        let before = fx.scrum_master.messages().len();

        // A stray run of the detached pipeline no longer reaches the sprint.
        let rt = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        rt.block_on(async { first.run_all_steps().unwrap().wait().await });
        assert_eq!(fx.scrum_master.messages().len(), before);
    }

    #[test]
    fn test_sprint_announcements_reach_the_audience() {
        let fx = fixture();
        assert_eq!(fx.scrum_master.count("has started"), 1);
        assert_eq!(fx.product_owner.count("has started"), 1);

        assert!(!fx.sprint.check_deadline(date(14)));
        assert!(fx.sprint.check_deadline(date(15)));
        assert_eq!(fx.scrum_master.count("has finished"), 1);
        assert!(fx.sprint.with_sprint(|s| s.is_finished()));
    }

    #[test]
    fn test_reschedule_before_start_only() {
        let sprint = ReleaseSprint::new("R2", date(1), date(14));
        sprint.reschedule(date(3), date(17)).unwrap();
        assert_eq!(
            sprint.with_sprint(|s| (s.start_date(), s.end_date())),
            (date(3), date(17))
        );

        let fx = fixture();
        let err = fx.sprint.reschedule(date(2), date(20)).unwrap_err();
        assert!(matches!(err, WorkflowError::SprintLocked { .. }));
        assert_eq!(fx.sprint.with_sprint(|s| s.end_date()), date(14));
    }

    #[test]
    fn test_composition_is_locked_after_sprint_start() {
        let fx = fixture();
        let err = fx.sprint.add_backlog_item(done_item("Late")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::State);
        assert!(
            fx.sprint
                .set_scrum_master(TeamMember::scrum_master("Other").shared())
                .is_err()
        );
        assert_eq!(fx.sprint.backlog_items().len(), 1);
    }

    #[test]
    fn test_replacing_scrum_master_moves_the_subscription() {
        let sprint = ReleaseSprint::new("R4", date(1), date(14));
        let first = Inbox::default();
        let second = Inbox::default();
        sprint
            .set_scrum_master(TeamMember::scrum_master("A").with_channel(Box::new(first.clone())).shared())
            .unwrap();
        sprint
            .set_scrum_master(TeamMember::scrum_master("B").with_channel(Box::new(second.clone())).shared())
            .unwrap();
        sprint
            .add_team_member(TeamMember::developer("Alice").shared())
            .unwrap();
        sprint.start_sprint().unwrap();

        assert!(first.messages().is_empty());
        assert_eq!(second.count("has started"), 1);
    }
}
