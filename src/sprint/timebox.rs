use crate::backlog::SharedBacklogItem;
use crate::errors::WorkflowError;
use crate::team::{Role, TeamMember};
use chrono::NaiveDate;
use std::sync::{Arc, PoisonError};

/// A time-boxed iteration: its dates, backlog and team.
///
/// Composition can only change before the sprint starts. `start` and `finish`
/// return the announcement to publish; the owner decides who hears it.
#[derive(Debug, Clone)]
pub struct Sprint {
    name: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    backlog: Vec<SharedBacklogItem>,
    team: Vec<Arc<TeamMember>>,
    scrum_master: Option<Arc<TeamMember>>,
    started: bool,
    finished: bool,
}

impl Sprint {
    pub fn new(name: impl Into<String>, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            name: name.into(),
            start_date,
            end_date,
            backlog: Vec::new(),
            team: Vec::new(),
            scrum_master: None,
            started: false,
            finished: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn ensure_editable(&self, field: &str) -> Result<(), WorkflowError> {
        if self.started {
            return Err(WorkflowError::SprintLocked {
                sprint: self.name.clone(),
                field: field.to_string(),
            });
        }
        Ok(())
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> Result<(), WorkflowError> {
        self.ensure_editable("name")?;
        self.name = name.into();
        Ok(())
    }

    pub fn set_start_date(&mut self, date: NaiveDate) -> Result<(), WorkflowError> {
        self.ensure_editable("start date")?;
        self.start_date = date;
        Ok(())
    }

    pub fn set_end_date(&mut self, date: NaiveDate) -> Result<(), WorkflowError> {
        self.ensure_editable("end date")?;
        self.end_date = date;
        Ok(())
    }

    pub fn add_backlog_item(&mut self, item: SharedBacklogItem) -> Result<(), WorkflowError> {
        self.ensure_editable("backlog")?;
        self.backlog.push(item);
        Ok(())
    }

    /// Remove `item` by identity. Returns whether it was present.
    pub fn remove_backlog_item(&mut self, item: &SharedBacklogItem) -> Result<bool, WorkflowError> {
        self.ensure_editable("backlog")?;
        let before = self.backlog.len();
        self.backlog.retain(|held| !Arc::ptr_eq(held, item));
        Ok(self.backlog.len() != before)
    }

    pub fn backlog(&self) -> &[SharedBacklogItem] {
        &self.backlog
    }

    pub fn add_team_member(&mut self, member: Arc<TeamMember>) -> Result<(), WorkflowError> {
        self.ensure_editable("team")?;
        self.team.push(member);
        Ok(())
    }

    pub fn team(&self) -> &[Arc<TeamMember>] {
        &self.team
    }

    /// Team members holding `role`.
    pub fn members_with_role(&self, role: Role) -> impl Iterator<Item = &Arc<TeamMember>> {
        self.team.iter().filter(move |m| m.role() == role)
    }

    pub fn set_scrum_master(&mut self, member: Arc<TeamMember>) -> Result<(), WorkflowError> {
        self.ensure_editable("scrum master")?;
        self.scrum_master = Some(member);
        Ok(())
    }

    pub fn scrum_master(&self) -> Option<&Arc<TeamMember>> {
        self.scrum_master.as_ref()
    }

    /// Start the sprint. Requires a scrum master and at least one team member.
    pub fn start(&mut self) -> Result<String, WorkflowError> {
        if self.scrum_master.is_none() {
            return Err(WorkflowError::MissingScrumMaster {
                sprint: self.name.clone(),
            });
        }
        if self.team.is_empty() {
            return Err(WorkflowError::EmptyTeam {
                sprint: self.name.clone(),
            });
        }
        self.started = true;
        tracing::info!(sprint = %self.name, "sprint started");
        Ok(format!("Sprint '{}' has started.", self.name))
    }

    pub fn finish(&mut self) -> Result<String, WorkflowError> {
        if !self.started {
            return Err(WorkflowError::SprintNotStarted {
                sprint: self.name.clone(),
            });
        }
        self.finished = true;
        tracing::info!(sprint = %self.name, "sprint finished");
        Ok(format!("Sprint '{}' has finished.", self.name))
    }

    /// Finish the sprint if it is running and `today` is past its end date.
    /// Returns the announcement when that happened.
    pub fn check_deadline(&mut self, today: NaiveDate) -> Option<String> {
        if self.started && !self.finished && today > self.end_date {
            return self.finish().ok();
        }
        None
    }

    /// True when the backlog is non-empty and every item is done.
    pub fn all_backlog_items_done(&self) -> bool {
        !self.backlog.is_empty()
            && self.backlog.iter().all(|item| {
                item.lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .is_done()
            })
    }
}
