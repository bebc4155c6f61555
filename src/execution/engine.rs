//! Action Execution Engine
//!
//! Orchestrates one run of an action tree:
//! - Optional dry run that only reports the actions that would be visited
//! - Timeline recording through the actions' lifecycle hooks
//! - A serializable [`RunReport`] summarising what happened

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::rc::Rc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use log::{error, info};
use serde::Serialize;

use crate::action::Action;
use crate::error::ActionError;
use crate::monitoring::{EventType, ExecutionTimeline, TimelineEvent};

/// Action execution engine.
///
/// # Example
///
/// ```
/// use actiontree::action::{make_action, Action, Outcome};
/// use actiontree::execution::Engine;
///
/// let root = Action::group("release")
///     .with_child(make_action("build", || Ok(Outcome::success())))
///     .build()
///     .unwrap();
///
/// let mut engine = Engine::new(root);
/// let report = engine.run().unwrap();
/// assert_eq!(report.outcome.as_deref(), Some("done"));
/// assert!(!report.cancelled);
/// ```
pub struct Engine {
    root: Action,
    standalone: bool,
    dry_run: bool,
}

/// One entry of an execution plan.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct PlannedAction {
    pub name: String,
    /// Depth below the root (root is 0)
    pub depth: usize,
    pub enabled: bool,
    pub valid: bool,
}

/// Summary of a finished run.
#[derive(Serialize, Debug, Clone)]
pub struct RunReport {
    pub root: String,
    pub standalone: bool,
    pub dry_run: bool,
    /// Label of the root's own outcome; `None` for a dry run
    pub outcome: Option<String>,
    /// True if any action in the run was cancelled
    pub cancelled: bool,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    pub counts: BTreeMap<EventType, usize>,
    /// Keyed by action path, see [`ExecutionTimeline::attach`]
    pub durations_ms: BTreeMap<String, u64>,
    pub events: Vec<TimelineEvent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub plan: Vec<PlannedAction>,
    /// ASCII Gantt chart of the run; empty for a dry run
    #[serde(skip)]
    pub gantt_chart: String,
}

impl Engine {
    /// Creates a new engine for a root action.
    pub fn new(root: Action) -> Self {
        Self {
            root,
            standalone: false,
            dry_run: false,
        }
    }

    /// Runs only the root when enabled.
    pub fn set_standalone(&mut self, standalone: bool) {
        self.standalone = standalone;
    }

    /// Enables or disables dry run mode.
    pub fn set_dry_run(&mut self, dry_run: bool) {
        self.dry_run = dry_run;
    }

    pub fn root(&self) -> &Action {
        &self.root
    }

    /// Actions a run would visit, in execution order.
    pub fn plan(&self) -> Vec<PlannedAction> {
        let base_depth = self.root.ancestors().len();
        let mut actions = vec![self.root.clone()];
        if !self.standalone {
            actions.extend(self.root.descendants());
        }

        actions
            .into_iter()
            .map(|action| PlannedAction {
                name: action.name().to_string(),
                depth: action.ancestors().len() - base_depth,
                enabled: action.enabled(),
                valid: action.valid(),
            })
            .collect()
    }

    /// Executes the root action.
    ///
    /// # Returns
    ///
    /// * `Ok(RunReport)` - The run finished (including cancel and skip)
    /// * `Err` - A behavior failed
    pub fn run(&mut self) -> Result<RunReport, ActionError> {
        let started_at = Utc::now();
        let start_time = Instant::now();

        info!(
            "Starting execution of '{}' (standalone: {}, dry run: {})",
            self.root.name(),
            self.standalone,
            self.dry_run
        );

        if self.dry_run {
            let plan = self.plan();
            for entry in &plan {
                info!(
                    "[DRY RUN] {}{} (enabled: {}, valid: {})",
                    "  ".repeat(entry.depth),
                    entry.name,
                    entry.enabled,
                    entry.valid
                );
            }

            return Ok(RunReport {
                root: self.root.name().to_string(),
                standalone: self.standalone,
                dry_run: true,
                outcome: None,
                cancelled: false,
                started_at,
                elapsed_ms: start_time.elapsed().as_millis() as u64,
                counts: BTreeMap::new(),
                durations_ms: BTreeMap::new(),
                events: Vec::new(),
                plan,
                gantt_chart: String::new(),
            });
        }

        let timeline = Rc::new(RefCell::new(ExecutionTimeline::new()));
        let attachment = ExecutionTimeline::attach(&timeline, &self.root);
        let result = self.root.execute(self.standalone);
        drop(attachment);

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Execution of '{}' failed: {}", self.root.name(), e);
                return Err(e);
            }
        };

        let timeline = timeline.borrow();
        let report = RunReport {
            root: self.root.name().to_string(),
            standalone: self.standalone,
            dry_run: false,
            outcome: Some(outcome.label()),
            cancelled: timeline.was_cancelled(),
            started_at,
            elapsed_ms: start_time.elapsed().as_millis() as u64,
            counts: timeline.counts(),
            durations_ms: timeline
                .get_durations()
                .into_iter()
                .map(|(name, ms)| (name, ms as u64))
                .collect(),
            events: timeline.get_events().to_vec(),
            plan: Vec::new(),
            gantt_chart: timeline.gantt_chart(),
        };

        info!(
            "Execution of '{}' finished: {} ({} events)",
            report.root,
            report.outcome.as_deref().unwrap_or("-"),
            report.events.len()
        );

        Ok(report)
    }
}

impl RunReport {
    /// Number of events of the given type.
    pub fn count(&self, event_type: EventType) -> usize {
        self.counts.get(&event_type).copied().unwrap_or(0)
    }

    /// Writes the report as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ActionError> {
        let path = path.as_ref();
        let json =
            serde_json::to_string_pretty(self).map_err(|e| ActionError::Report(e.to_string()))?;
        fs::write(path, json)
            .map_err(|e| ActionError::Report(format!("{}: {}", path.display(), e)))?;

        info!("Saved run report to {}", path.display());
        Ok(())
    }

    /// Human-readable summary.
    pub fn get_summary(&self) -> String {
        if self.dry_run {
            return format!(
                "Dry run of '{}': {} actions planned",
                self.root,
                self.plan.len()
            );
        }

        format!(
            "Run of '{}': {}\n  \
             started: {}  completed: {}  skipped: {}  cancelled: {}  failed: {}\n  \
             elapsed: {} ms",
            self.root,
            self.outcome.as_deref().unwrap_or("-"),
            self.count(EventType::Started),
            self.count(EventType::Completed),
            self.count(EventType::Skipped),
            self.count(EventType::Cancelled),
            self.count(EventType::Failed),
            self.elapsed_ms
        )
    }
}
