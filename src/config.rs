//! `shipyard.toml` configuration.
//!
//! ```toml
//! [pipeline]
//! name = "release"
//! strategy = "fail_fast"
//! steps = ["source", "package", "build", "test", "analyze", "deploy"]
//!
//! [notifications]
//! channels = ["email", "slack"]
//!
//! [logging]
//! level = "info"
//! json = false
//! dir = "logs"
//! ```
//!
//! Every section and field is optional. `SHIPYARD_STRATEGY` and `SHIPYARD_LOG`
//! override `pipeline.strategy` and `logging.level` respectively.

use crate::errors::WorkflowError;
use crate::pipeline::{Pipeline, PipelineStep, RunStrategy, StepKind, create_step};
use crate::team::channel_from_name;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name looked up by [`ShipyardToml::load_or_default`].
pub const CONFIG_FILE: &str = "shipyard.toml";

pub const STRATEGY_ENV: &str = "SHIPYARD_STRATEGY";
pub const LOG_LEVEL_ENV: &str = "SHIPYARD_LOG";

/// The release pipeline to build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSection {
    #[serde(default = "default_pipeline_name")]
    pub name: String,
    /// `fail_fast` or `always_continue`
    #[serde(default = "default_strategy")]
    pub strategy: String,
    /// Step kinds in execution order
    #[serde(default = "default_steps")]
    pub steps: Vec<String>,
}

fn default_pipeline_name() -> String {
    "release".to_string()
}

fn default_strategy() -> String {
    RunStrategy::default().as_str().to_string()
}

fn default_steps() -> Vec<String> {
    [
        StepKind::Source,
        StepKind::Package,
        StepKind::Build,
        StepKind::Test,
        StepKind::Analyze,
        StepKind::Deploy,
    ]
    .iter()
    .map(|k| k.as_str().to_lowercase())
    .collect()
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            name: default_pipeline_name(),
            strategy: default_strategy(),
            steps: default_steps(),
        }
    }
}

impl PipelineSection {
    pub fn run_strategy(&self) -> Result<RunStrategy, WorkflowError> {
        self.strategy.parse()
    }

    /// Instantiate the configured steps, failing on the first unknown kind.
    pub fn create_steps(&self) -> Result<Vec<Box<dyn PipelineStep>>, WorkflowError> {
        self.steps.iter().map(|kind| create_step(kind)).collect()
    }
}

/// Where team members receive notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationsSection {
    #[serde(default = "default_channels")]
    pub channels: Vec<String>,
}

fn default_channels() -> Vec<String> {
    vec!["email".to_string()]
}

impl Default for NotificationsSection {
    fn default() -> Self {
        Self {
            channels: default_channels(),
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSection {
    /// Filter directive, e.g. `info` or `shipyard=debug`
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines instead of human-readable text
    #[serde(default)]
    pub json: bool,
    /// Also write a daily-rotated log file into this directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            dir: None,
        }
    }
}

/// The complete shipyard.toml configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ShipyardToml {
    #[serde(default)]
    pub pipeline: PipelineSection,
    #[serde(default)]
    pub notifications: NotificationsSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

impl ShipyardToml {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse shipyard.toml")
    }

    /// Load `shipyard.toml` from `dir`, or defaults if there is none.
    pub fn load_or_default(dir: &Path) -> Result<Self> {
        let config_path = dir.join(CONFIG_FILE);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).context("Failed to serialize shipyard.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Apply `SHIPYARD_STRATEGY` and `SHIPYARD_LOG` when they are set.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(strategy) = std::env::var(STRATEGY_ENV)
            && !strategy.trim().is_empty()
        {
            self.pipeline.strategy = strategy;
        }
        if let Ok(level) = std::env::var(LOG_LEVEL_ENV)
            && !level.trim().is_empty()
        {
            self.logging.level = level;
        }
        self
    }

    /// Problems that would make a release fail or behave unexpectedly.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.pipeline.name.trim().is_empty() {
            warnings.push("Pipeline name is empty".to_string());
        }

        if let Err(err) = self.pipeline.run_strategy() {
            warnings.push(format!(
                "{err}: expected 'fail_fast' or 'always_continue'"
            ));
        }

        for step in &self.pipeline.steps {
            if let Err(err) = step.parse::<StepKind>() {
                warnings.push(err.to_string());
            }
        }
        if self.pipeline.steps.is_empty() {
            warnings.push("Pipeline has no steps; every release will trivially succeed".to_string());
        }

        for channel in &self.notifications.channels {
            if channel_from_name(channel).is_none() {
                warnings.push(format!("Unknown notification channel: {channel}"));
            }
        }

        if tracing_subscriber::EnvFilter::try_new(&self.logging.level).is_err() {
            warnings.push(format!("Invalid log level '{}'", self.logging.level));
        }

        warnings
    }
}

impl Pipeline {
    /// Build a pipeline from its configuration section.
    pub fn from_config(section: &PipelineSection) -> Result<Pipeline, WorkflowError> {
        let strategy = section.run_strategy()?;
        let steps = section.create_steps()?;
        Ok(Pipeline::with_steps(section.name.clone(), strategy, steps))
    }
}
