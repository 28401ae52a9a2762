//! Team members and the channels they are notified through.
//!
//! A [`TeamMember`] is an [`Observer`]: every message it receives is prefixed
//! with the member's name and forwarded to each configured
//! [`NotificationChannel`]. Roles are plain data; a product owner is a team
//! member whose role is [`Role::ProductOwner`].

use crate::observer::Observer;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Role a member plays in the team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Developer,
    LeadDeveloper,
    Tester,
    ScrumMaster,
    ProductOwner,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Developer => "Developer",
            Role::LeadDeveloper => "LeadDeveloper",
            Role::Tester => "Tester",
            Role::ScrumMaster => "ScrumMaster",
            Role::ProductOwner => "ProductOwner",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A sink that delivers a notification somewhere outside the process.
pub trait NotificationChannel: Send + Sync {
    /// Short channel identifier, e.g. `"email"`.
    fn name(&self) -> &str;

    fn send(&self, message: &str);
}

/// Delivers notifications by e-mail.
#[derive(Debug, Default, Clone)]
pub struct EmailChannel;

impl NotificationChannel for EmailChannel {
    fn name(&self) -> &str {
        "email"
    }

    fn send(&self, message: &str) {
        tracing::info!(target: "shipyard::notify", channel = "email", "{message}");
    }
}

/// Posts notifications to Slack.
#[derive(Debug, Default, Clone)]
pub struct SlackChannel;

impl NotificationChannel for SlackChannel {
    fn name(&self) -> &str {
        "slack"
    }

    fn send(&self, message: &str) {
        tracing::info!(target: "shipyard::notify", channel = "slack", "{message}");
    }
}

/// Look up a built-in channel by name (case-insensitive).
pub fn channel_from_name(name: &str) -> Option<Box<dyn NotificationChannel>> {
    match name.trim().to_lowercase().as_str() {
        "email" | "mail" => Some(Box::new(EmailChannel)),
        "slack" => Some(Box::new(SlackChannel)),
        _ => None,
    }
}

/// A named member of the team.
pub struct TeamMember {
    name: String,
    role: Role,
    channels: Vec<Box<dyn NotificationChannel>>,
}

impl TeamMember {
    pub fn new(name: impl Into<String>, role: Role) -> Self {
        Self {
            name: name.into(),
            role,
            channels: Vec::new(),
        }
    }

    pub fn developer(name: impl Into<String>) -> Self {
        Self::new(name, Role::Developer)
    }

    pub fn scrum_master(name: impl Into<String>) -> Self {
        Self::new(name, Role::ScrumMaster)
    }

    pub fn product_owner(name: impl Into<String>) -> Self {
        Self::new(name, Role::ProductOwner)
    }

    /// Add a notification channel.
    pub fn with_channel(mut self, channel: Box<dyn NotificationChannel>) -> Self {
        self.channels.push(channel);
        self
    }

    pub fn add_channel(&mut self, channel: Box<dyn NotificationChannel>) {
        self.channels.push(channel);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn channel_names(&self) -> Vec<&str> {
        self.channels.iter().map(|c| c.name()).collect()
    }

    /// Wrap into a shared handle usable as an observer.
    pub fn shared(self) -> Arc<TeamMember> {
        Arc::new(self)
    }
}

impl Observer for TeamMember {
    fn update(&self, message: &str) {
        let addressed = format!("[{}] {}", self.name, message);
        for channel in &self.channels {
            channel.send(&addressed);
        }
    }
}

impl std::fmt::Display for TeamMember {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{{name='{}'}}", self.role, self.name)
    }
}

impl std::fmt::Debug for TeamMember {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TeamMember")
            .field("name", &self.name)
            .field("role", &self.role)
            .field("channels", &self.channel_names())
            .finish()
    }
}
