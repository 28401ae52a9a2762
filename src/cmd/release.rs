//! Simulated release run: `shipyard release`.
//!
//! Builds a staffed sprint, drives every backlog item to Done and ships it
//! through the configured pipeline.

use anyhow::{Context, Result, bail};
use chrono::{Duration, Local, NaiveDate};
use serde::Serialize;
use shipyard::backlog::{Activity, BacklogItem, BacklogState, SharedBacklogItem};
use shipyard::config::ShipyardToml;
use shipyard::pipeline::{Pipeline, PipelineStep, RunStrategy, RunSummary, StepKind, StepPhase, StubStep};
use shipyard::sprint::{ReleaseSprint, ReleaseState};
use shipyard::team::{NotificationChannel, TeamMember, channel_from_name};
use std::sync::{Arc, PoisonError};

/// Flags of the `release` command.
#[derive(Debug, Clone, Default)]
pub struct ReleaseOptions {
    pub strategy: Option<String>,
    pub steps: Option<Vec<String>>,
    pub fail_step: Option<String>,
    pub items: usize,
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct ReleaseReport {
    sprint: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    state: ReleaseState,
    terminal: bool,
    backlog_items: usize,
    pipeline: RunSummary,
}

pub async fn cmd_release(config: &ShipyardToml, options: ReleaseOptions) -> Result<()> {
    let mut section = config.pipeline.clone();
    if let Some(strategy) = &options.strategy {
        section.strategy = strategy.clone();
    }
    if let Some(steps) = &options.steps {
        section.steps = steps.clone();
    }
    let strategy: RunStrategy = section.run_strategy()?;

    let fail_kind = options
        .fail_step
        .as_deref()
        .map(str::parse::<StepKind>)
        .transpose()?;
    let steps = build_steps(&section.steps, fail_kind)?;
    let pipeline = Pipeline::with_steps(section.name.clone(), strategy, steps).shared();

    let sprint = staffed_sprint(config)?;
    for index in 1..=options.items {
        sprint.add_backlog_item(BacklogItem::new(format!("Feature {index}")).shared())?;
    }

    sprint.start_sprint()?;
    let developer = TeamMember::developer("Dana").shared();
    for item in sprint.backlog_items() {
        complete_item(&item, &developer)?;
    }
    sprint.finish_sprint()?;

    sprint.set_pipeline(pipeline.clone())?;
    sprint
        .start_release()
        .context("Release could not be started")?;
    sprint.perform_release()?;
    let run = sprint
        .perform_release()?
        .context("Release pipeline was not dispatched")?;
    let success = run.wait().await;

    if success {
        sprint.perform_release()?;
    } else {
        sprint.cancel_release()?;
    }

    let summary = pipeline.run_summary();
    if options.json {
        let (start_date, end_date) = sprint.with_sprint(|s| (s.start_date(), s.end_date()));
        let state = sprint.state();
        let report = ReleaseReport {
            sprint: sprint.name(),
            start_date,
            end_date,
            state,
            terminal: state.is_terminal(),
            backlog_items: options.items,
            pipeline: summary,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_text_report(&sprint, &summary);
    }

    if !success {
        bail!("Release pipeline '{}' failed", pipeline.name());
    }
    Ok(())
}

fn build_steps(
    kinds: &[String],
    fail_kind: Option<StepKind>,
) -> Result<Vec<Box<dyn PipelineStep>>> {
    let kinds = kinds
        .iter()
        .map(|k| k.parse::<StepKind>())
        .collect::<Result<Vec<_>, _>>()?;
    if let Some(fail) = fail_kind
        && !kinds.contains(&fail)
    {
        bail!("--fail-step {} is not part of the pipeline", fail);
    }

    Ok(kinds
        .into_iter()
        .map(|kind| -> Box<dyn PipelineStep> {
            if Some(kind) == fail_kind {
                Box::new(StubStep::failing(kind, StepPhase::Execute))
            } else {
                Box::new(StubStep::new(kind))
            }
        })
        .collect())
}

fn channels(config: &ShipyardToml) -> Result<Vec<Box<dyn NotificationChannel>>> {
    config
        .notifications
        .channels
        .iter()
        .map(|name| {
            channel_from_name(name)
                .with_context(|| format!("Unknown notification channel: {name}"))
        })
        .collect()
}

fn staffed_sprint(config: &ShipyardToml) -> Result<Arc<ReleaseSprint>> {
    let today = Local::now().date_naive();
    let sprint = ReleaseSprint::new(
        format!("Release {}", today.format("%Y-%m-%d")),
        today - Duration::days(14),
        today,
    );

    let mut scrum_master = TeamMember::scrum_master("Sam");
    for channel in channels(config)? {
        scrum_master.add_channel(channel);
    }
    let mut product_owner = TeamMember::product_owner("Pat");
    for channel in channels(config)? {
        product_owner.add_channel(channel);
    }

    sprint.set_scrum_master(scrum_master.shared())?;
    sprint.add_team_member(product_owner.shared())?;
    sprint.add_team_member(TeamMember::developer("Dana").shared())?;
    Ok(sprint)
}

/// Work an item from Todo to Done, completing its activity on the way.
fn complete_item(item: &SharedBacklogItem, developer: &Arc<TeamMember>) -> Result<()> {
    let mut item = item.lock().unwrap_or_else(PoisonError::into_inner);
    item.add_activity(Activity::new("Implement", 4));
    item.assign_developer(Arc::clone(developer))?;
    while item.state() != BacklogState::Done {
        if item.state() == BacklogState::Tested {
            item.complete_activity("Implement");
        }
        item.move_to_next()?;
    }
    Ok(())
}

fn print_text_report(sprint: &ReleaseSprint, summary: &RunSummary) {
    let (start, end) = sprint.with_sprint(|s| (s.start_date(), s.end_date()));
    println!();
    println!("Sprint: {} ({} to {})", sprint.name(), start, end);
    println!(
        "{}",
        console::style(format!("Pipeline: {} ({})", summary.pipeline, summary.strategy))
            .bold()
            .cyan()
    );
    println!();
    for line in &summary.logs {
        println!("  {}", line);
    }
    println!();

    let verdict = if summary.success {
        console::style("SUCCESS").green().bold()
    } else {
        console::style("FAILURE").red().bold()
    };
    println!("Pipeline result: {}", verdict);
    let state = sprint.state();
    if state.is_terminal() {
        println!("Release state: {} (final)", state);
    } else {
        println!("Release state: {}", state);
    }
    println!();
}
