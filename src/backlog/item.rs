use super::{Activity, BacklogState};
use crate::errors::WorkflowError;
use crate::observer::{Observable, SharedObserver};
use crate::team::TeamMember;
use std::sync::{Arc, Mutex};

/// A backlog item shared between its sprint and the code driving it.
pub type SharedBacklogItem = Arc<Mutex<BacklogItem>>;

/// A unit of delivery tracked from `Todo` to `Done`.
#[derive(Debug)]
pub struct BacklogItem {
    title: String,
    state: BacklogState,
    assigned_developer: Option<Arc<TeamMember>>,
    activities: Vec<Activity>,
    observers: Observable,
}

impl BacklogItem {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            state: BacklogState::Todo,
            assigned_developer: None,
            activities: Vec::new(),
            observers: Observable::new(),
        }
    }

    /// Wrap into a handle that a sprint can hold.
    pub fn shared(self) -> SharedBacklogItem {
        Arc::new(Mutex::new(self))
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn state(&self) -> BacklogState {
        self.state
    }

    pub fn subscribe(&mut self, observer: SharedObserver) {
        self.observers.subscribe(observer);
    }

    pub fn unsubscribe(&mut self, observer: &SharedObserver) -> bool {
        self.observers.unsubscribe(observer)
    }

    /// Advance to the next lifecycle state.
    ///
    /// `Done` stays `Done`. Leaving `Tested` fails with a precondition error,
    /// leaving the state untouched, unless every activity is done.
    pub fn move_to_next(&mut self) -> Result<BacklogState, WorkflowError> {
        let Some(next) = self.state.successor() else {
            return Ok(self.state);
        };
        if self.state.guards_completion() && !self.all_activities_done() {
            return Err(WorkflowError::ActivitiesIncomplete {
                item: self.title.clone(),
            });
        }
        self.set_state(next);
        Ok(next)
    }

    /// Send the item back to `Todo` from wherever it is.
    pub fn revert_to_todo(&mut self) {
        self.set_state(BacklogState::Todo);
    }

    fn set_state(&mut self, next: BacklogState) {
        let previous = self.state;
        self.state = next;
        if previous == next {
            return;
        }
        tracing::debug!(item = %self.title, from = %previous, to = %next, "backlog item moved");

        match (previous, next) {
            (BacklogState::Doing, BacklogState::ReadyForTesting) => {
                self.observers
                    .notify(&format!("Backlog item '{}' is ready for testing.", self.title));
            }
            (_, BacklogState::Todo) => {
                self.observers.notify(&format!(
                    "Backlog item '{}' has been moved back to Todo.",
                    self.title
                ));
            }
            _ => {}
        }
    }

    pub fn add_activity(&mut self, activity: Activity) {
        self.activities.push(activity);
    }

    /// Read-only view of the activities, in insertion order.
    pub fn activities(&self) -> &[Activity] {
        &self.activities
    }

    pub fn activity_mut(&mut self, index: usize) -> Option<&mut Activity> {
        self.activities.get_mut(index)
    }

    /// Mark the first activity with `title` as done. Returns whether one matched.
    pub fn complete_activity(&mut self, title: &str) -> bool {
        match self.activities.iter_mut().find(|a| a.title() == title) {
            Some(activity) => {
                activity.set_done(true);
                true
            }
            None => false,
        }
    }

    pub fn activity_count(&self) -> usize {
        self.activities.len()
    }

    pub fn total_estimated_hours(&self) -> u32 {
        self.activities.iter().map(Activity::estimated_hours).sum()
    }

    /// True when there are no activities, or all of them are done.
    pub fn all_activities_done(&self) -> bool {
        self.activities.iter().all(Activity::is_done)
    }

    /// Done state with every activity completed.
    pub fn is_done(&self) -> bool {
        self.state == BacklogState::Done && self.all_activities_done()
    }

    /// Assign the developer responsible for this item. Only one assignment is
    /// allowed for the item's lifetime; split the work into activities instead.
    pub fn assign_developer(&mut self, developer: Arc<TeamMember>) -> Result<(), WorkflowError> {
        if let Some(existing) = &self.assigned_developer {
            return Err(WorkflowError::DeveloperAlreadyAssigned {
                item: self.title.clone(),
                developer: existing.name().to_string(),
            });
        }

        let message = format!(
            "Developer {} assigned to backlog item '{}'.",
            developer.name(),
            self.title
        );
        self.assigned_developer = Some(developer);
        self.observers.notify(&message);
        Ok(())
    }

    pub fn assigned_developer(&self) -> Option<&Arc<TeamMember>> {
        self.assigned_developer.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::observer::Observer;

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

    fn observed_item(title: &str) -> (BacklogItem, Arc<Recorder>) {
        let recorder = Arc::new(Recorder::default());
        let mut item = BacklogItem::new(title);
        item.subscribe(recorder.clone());
        (item, recorder)
    }

    fn advance_to(item: &mut BacklogItem, target: BacklogState) {
        while item.state() != target {
            item.move_to_next().unwrap();
        }
    }

    #[test]
    fn test_walks_the_full_lifecycle() {
        let mut item = BacklogItem::new("Checkout flow");
        let mut seen = vec![item.state()];
        while !item.state().is_terminal() {
            seen.push(item.move_to_next().unwrap());
        }
        assert_eq!(seen, BacklogState::all());
        assert!(item.is_done());
    }

    #[test]
    fn test_done_to_done_is_a_noop() {
        let (mut item, recorder) = observed_item("Checkout flow");
        advance_to(&mut item, BacklogState::Done);
        let before = recorder.messages().len();

        assert_eq!(item.move_to_next().unwrap(), BacklogState::Done);
        assert_eq!(recorder.messages().len(), before);
    }

    #[test]
    fn test_tested_to_done_requires_all_activities() {
        let mut item = BacklogItem::new("Search");
        item.add_activity(Activity::new("Index", 3));
        item.add_activity(Activity::new("UI", 2));
        advance_to(&mut item, BacklogState::Tested);

        item.complete_activity("Index");
        let err = item.move_to_next().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Precondition);
        assert_eq!(item.state(), BacklogState::Tested);

        item.complete_activity("UI");
        assert_eq!(item.move_to_next().unwrap(), BacklogState::Done);
        assert!(item.is_done());
    }

    #[test]
    fn test_is_done_rechecks_activities() {
        let mut item = BacklogItem::new("Search");
        item.add_activity(Activity::new("Index", 3));
        item.complete_activity("Index");
        advance_to(&mut item, BacklogState::Done);
        assert!(item.is_done());

        item.activity_mut(0).unwrap().set_done(false);
        assert_eq!(item.state(), BacklogState::Done);
        assert!(!item.is_done());
    }

    #[test]
    fn test_only_doing_to_ready_for_testing_notifies_forward() {
        let (mut item, recorder) = observed_item("Profile page");
        advance_to(&mut item, BacklogState::Done);

        assert_eq!(
            recorder.messages(),
            vec!["Backlog item 'Profile page' is ready for testing.".to_string()]
        );
    }

    #[test]
    fn test_revert_to_todo_notifies_only_on_change() {
        let (mut item, recorder) = observed_item("Profile page");
        item.revert_to_todo();
        assert!(recorder.messages().is_empty());

        advance_to(&mut item, BacklogState::Testing);
        item.revert_to_todo();
        item.revert_to_todo();

        assert_eq!(item.state(), BacklogState::Todo);
        let reverts: Vec<_> = recorder
            .messages()
            .into_iter()
            .filter(|m| m.contains("moved back to Todo"))
            .collect();
        assert_eq!(reverts.len(), 1);
    }

    #[test]
    fn test_revert_from_done_reopens_the_item() {
        let mut item = BacklogItem::new("Billing");
        advance_to(&mut item, BacklogState::Done);
        item.revert_to_todo();
        assert_eq!(item.state(), BacklogState::Todo);
        assert!(!item.is_done());
    }

    #[test]
    fn test_developer_can_be_assigned_once() {
        let (mut item, recorder) = observed_item("Billing");
        let alice = TeamMember::developer("Alice").shared();
        let bob = TeamMember::developer("Bob").shared();

        item.assign_developer(alice).unwrap();
        let err = item.assign_developer(bob).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(item.assigned_developer().unwrap().name(), "Alice");
        assert_eq!(
            recorder.messages(),
            vec!["Developer Alice assigned to backlog item 'Billing'.".to_string()]
        );
    }

    #[test]
    fn test_activity_bookkeeping() {
        let mut item = BacklogItem::new("Reports");
        assert!(item.all_activities_done());
        item.add_activity(Activity::new("Query", 5));
        item.add_activity(Activity::new("Export", 3));

        assert_eq!(item.activity_count(), 2);
        assert_eq!(item.total_estimated_hours(), 8);
        assert!(!item.complete_activity("Missing"));
        assert_eq!(item.activities()[0].title(), "Query");
    }
}
