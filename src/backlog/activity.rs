use serde::{Deserialize, Serialize};

/// A unit of work on a backlog item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    title: String,
    estimated_hours: u32,
    done: bool,
}

impl Activity {
    pub fn new(title: impl Into<String>, estimated_hours: u32) -> Self {
        Self {
            title: title.into(),
            estimated_hours,
            done: false,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn estimated_hours(&self) -> u32 {
        self.estimated_hours
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn set_done(&mut self, done: bool) {
        self.done = done;
    }
}
