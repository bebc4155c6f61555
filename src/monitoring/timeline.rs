//! Execution Timeline
//!
//! Records action lifecycle events for execution reports and timing charts.
//! A timeline is fed either directly through [`ExecutionTimeline::add_event`]
//! or by subscribing it to an action tree with [`ExecutionTimeline::attach`].

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::action::{Action, HandlerId};

/// Type of timeline event.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    /// Action started running
    Started,
    /// Action was skipped (disabled, returned skip, or under a skipped parent)
    Skipped,
    /// Action completed successfully
    Completed,
    /// Action failed
    Failed,
    /// Action was cancelled
    Cancelled,
}

impl EventType {
    /// True for every event that ends an action's turn.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Started)
    }
}

/// A single event in the execution timeline.
#[derive(Serialize, Debug, Clone)]
pub struct TimelineEvent {
    /// Name of the action
    pub action: String,
    /// Ancestry path of the action, unique within one attachment
    pub path: String,
    /// Type of event
    pub event_type: EventType,
    /// Milliseconds since the timeline was created
    pub elapsed_ms: u64,
    /// Wall-clock time of the event
    pub recorded_at: DateTime<Utc>,
    /// Payload label or error message, when there is one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip)]
    pub timestamp: Instant,
}

/// Tracks the execution timeline of an action tree.
#[derive(Debug, Clone)]
pub struct ExecutionTimeline {
    events: Vec<TimelineEvent>,
    start_time: Instant,
}

impl ExecutionTimeline {
    /// Creates a new timeline starting now.
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            start_time: Instant::now(),
        }
    }

    /// Records an event for an action.
    ///
    /// The action name doubles as its path.
    pub fn add_event(&mut self, action: impl Into<String>, event_type: EventType) {
        let action = action.into();
        self.push(action.clone(), action, event_type, None);
    }

    /// Records an event carrying a payload label or error message.
    pub fn add_event_with_detail(
        &mut self,
        action: impl Into<String>,
        event_type: EventType,
        detail: impl Into<String>,
    ) {
        let action = action.into();
        self.push(action.clone(), action, event_type, Some(detail.into()));
    }

    fn push(
        &mut self,
        action: String,
        path: String,
        event_type: EventType,
        detail: Option<String>,
    ) {
        let timestamp = Instant::now();
        self.events.push(TimelineEvent {
            action,
            path,
            event_type,
            elapsed_ms: timestamp.duration_since(self.start_time).as_millis() as u64,
            recorded_at: Utc::now(),
            detail,
            timestamp,
        });
    }

    /// Returns all recorded events.
    pub fn get_events(&self) -> &[TimelineEvent] {
        &self.events
    }

    /// Returns the total elapsed time since timeline creation.
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Number of events of each type.
    pub fn counts(&self) -> BTreeMap<EventType, usize> {
        let mut counts = BTreeMap::new();
        for event in &self.events {
            *counts.entry(event.event_type).or_insert(0) += 1;
        }
        counts
    }

    /// Returns true if any action was cancelled.
    pub fn was_cancelled(&self) -> bool {
        self.events
            .iter()
            .any(|e| e.event_type == EventType::Cancelled)
    }

    /// Subscribes this timeline to `root` and every descendant present now.
    ///
    /// Events are keyed by the action's ancestry path (`release/build/test`).
    /// Siblings sharing a name get a `#n` suffix so every action keeps its
    /// own durations.
    ///
    /// The returned [`TimelineAttachment`] disconnects all handlers when
    /// dropped.
    pub fn attach(timeline: &Rc<RefCell<Self>>, root: &Action) -> TimelineAttachment {
        let mut actions = vec![root.clone()];
        actions.extend(root.descendants());

        let mut seen: HashMap<String, usize> = HashMap::new();
        let subscriptions = actions
            .into_iter()
            .map(|action| {
                let path = action_path(&action);
                let count = seen.entry(path.clone()).or_insert(0);
                *count += 1;
                let key = if *count == 1 {
                    path
                } else {
                    format!("{}#{}", path, count)
                };

                let ids = connect_all(timeline, &action, key);
                (action, ids)
            })
            .collect::<Vec<_>>();

        debug!("Timeline attached to {} actions", subscriptions.len());
        TimelineAttachment { subscriptions }
    }

    /// Generates an ASCII Gantt chart representation.
    ///
    /// Each action is shown as a bar indicating when it ran
    /// relative to the total execution time.
    pub fn gantt_chart(&self) -> String {
        let mut output = String::from("\nExecution Timeline:\n\n");

        let total_time = Instant::now().duration_since(self.start_time).as_millis();

        if total_time == 0 {
            return output;
        }

        // Scale to 50 characters width
        let scale = 50.0 / total_time as f64;

        let mut spans: Vec<(String, u128, u128)> = self
            .spans()
            .into_iter()
            .filter(|(_, start, end)| end > start)
            .collect();
        spans.sort_by_key(|(_, start, _)| *start);

        for (action, start, end) in spans {
            let start_pos = (start as f64 * scale) as usize;
            let duration = ((end - start) as f64 * scale).max(1.0) as usize;

            let mut bar = " ".repeat(start_pos);
            bar.push_str(&"#".repeat(duration));

            output.push_str(&format!(
                "{:12} |{}| ({} ms)\n",
                truncate(&action, 12),
                bar,
                end - start
            ));
        }

        output.push_str(&format!("\nTotal: {} ms\n", total_time));
        output
    }

    /// Returns action durations in milliseconds, keyed by path.
    ///
    /// Only actions that started and then reached a terminal event appear.
    pub fn get_durations(&self) -> HashMap<String, u128> {
        self.spans()
            .into_iter()
            .map(|(action, start, end)| (action, end - start))
            .collect()
    }

    /// (path, start, end) in milliseconds since the timeline started.
    fn spans(&self) -> Vec<(String, u128, u128)> {
        let mut starts: HashMap<&str, u128> = HashMap::new();
        let mut spans = Vec::new();

        for event in &self.events {
            let elapsed = event.timestamp.duration_since(self.start_time).as_millis();

            if !event.event_type.is_terminal() {
                starts.insert(event.path.as_str(), elapsed);
            } else if let Some(start) = starts.remove(event.path.as_str()) {
                spans.push((event.path.clone(), start, elapsed));
            }
        }

        spans
    }
}

impl Default for ExecutionTimeline {
    fn default() -> Self {
        Self::new()
    }
}

/// `grandparent/parent/name` for an action.
fn action_path(action: &Action) -> String {
    let mut names: Vec<String> = action
        .ancestors()
        .iter()
        .rev()
        .map(|a| a.name().to_string())
        .collect();
    names.push(action.name().to_string());
    names.join("/")
}

fn connect_all(
    timeline: &Rc<RefCell<ExecutionTimeline>>,
    action: &Action,
    key: String,
) -> [HandlerId; 5] {
    let hooks = action.hooks();
    let record = {
        let sink = Rc::clone(timeline);
        move |a: &Action, event_type: EventType, detail: Option<String>| {
            sink.borrow_mut()
                .push(a.name().to_string(), key.clone(), event_type, detail)
        }
    };

    let on_event = record.clone();
    let started = hooks
        .started
        .connect(move |a| on_event(a, EventType::Started, None));

    let on_event = record.clone();
    let skipped = hooks
        .skipped
        .connect(move |a| on_event(a, EventType::Skipped, None));

    let on_event = record.clone();
    let completed = hooks.completed.connect(move |a, payload| {
        on_event(a, EventType::Completed, Some(payload.label()))
    });

    let on_event = record.clone();
    let failed = hooks
        .failed
        .connect(move |a, error| on_event(a, EventType::Failed, Some(error.to_string())));

    let cancelled = hooks
        .cancelled
        .connect(move |a| record(a, EventType::Cancelled, None));

    [started, skipped, completed, failed, cancelled]
}

/// Live subscription of a timeline to an action tree.
pub struct TimelineAttachment {
    subscriptions: Vec<(Action, [HandlerId; 5])>,
}

impl TimelineAttachment {
    /// Number of actions being watched.
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}

impl Drop for TimelineAttachment {
    fn drop(&mut self) {
        for (action, [started, skipped, completed, failed, cancelled]) in &self.subscriptions {
            let hooks = action.hooks();
            hooks.started.disconnect(*started);
            hooks.skipped.disconnect(*skipped);
            hooks.completed.disconnect(*completed);
            hooks.failed.disconnect(*failed);
            hooks.cancelled.disconnect(*cancelled);
        }
    }
}

/// Truncates a string to a maximum length.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        format!("{:width$}", s, width = max_len)
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{make_action, Outcome};
    use std::thread;

    #[test]
    fn test_timeline_creation() {
        let timeline = ExecutionTimeline::new();
        assert!(timeline.events.is_empty());
        assert!(!timeline.was_cancelled());
    }

    #[test]
    fn test_add_events() {
        let mut timeline = ExecutionTimeline::new();
        timeline.add_event("build", EventType::Started);
        thread::sleep(Duration::from_millis(10));
        timeline.add_event_with_detail("build", EventType::Completed, "done");

        assert_eq!(timeline.events.len(), 2);
        assert_eq!(timeline.events[1].detail.as_deref(), Some("done"));
        assert!(timeline.events[1].elapsed_ms >= 10);
    }

    #[test]
    fn test_get_durations() {
        let mut timeline = ExecutionTimeline::new();
        timeline.add_event("build", EventType::Started);
        thread::sleep(Duration::from_millis(50));
        timeline.add_event("build", EventType::Completed);

        let durations = timeline.get_durations();
        assert!(*durations.get("build").unwrap() >= 50);
    }

    #[test]
    fn test_durations_end_on_cancel() {
        let mut timeline = ExecutionTimeline::new();
        timeline.add_event("deploy", EventType::Started);
        timeline.add_event("deploy", EventType::Cancelled);
        timeline.add_event("never", EventType::Cancelled);

        let durations = timeline.get_durations();
        assert!(durations.contains_key("deploy"));
        assert!(!durations.contains_key("never"));
        assert!(timeline.was_cancelled());
    }

    #[test]
    fn test_get_durations_only_started() {
        let mut timeline = ExecutionTimeline::new();
        timeline.add_event("build", EventType::Started);

        assert!(timeline.get_durations().is_empty());
    }

    #[test]
    fn test_counts() {
        let mut timeline = ExecutionTimeline::new();
        timeline.add_event("a", EventType::Started);
        timeline.add_event("a", EventType::Completed);
        timeline.add_event("b", EventType::Skipped);
        timeline.add_event("c", EventType::Skipped);

        let counts = timeline.counts();
        assert_eq!(counts.get(&EventType::Skipped), Some(&2));
        assert_eq!(counts.get(&EventType::Started), Some(&1));
        assert!(counts.get(&EventType::Failed).is_none());
    }

    #[test]
    fn test_gantt_chart_generation() {
        let mut timeline = ExecutionTimeline::new();

        timeline.add_event("compile", EventType::Started);
        thread::sleep(Duration::from_millis(50));
        timeline.add_event("compile", EventType::Completed);

        timeline.add_event("a_very_long_action_name", EventType::Started);
        thread::sleep(Duration::from_millis(50));
        timeline.add_event("a_very_long_action_name", EventType::Failed);

        let chart = timeline.gantt_chart();
        assert!(chart.contains("compile"));
        assert!(chart.contains("a_very_lo..."));
        assert!(chart.contains("Total:"));
    }

    #[test]
    fn test_gantt_chart_empty() {
        let timeline = ExecutionTimeline::new();
        assert!(timeline.gantt_chart().contains("Timeline"));
    }

    #[test]
    fn test_event_type_terminal() {
        assert!(!EventType::Started.is_terminal());
        assert!(EventType::Skipped.is_terminal());
        assert!(EventType::Cancelled.is_terminal());
    }

    #[test]
    fn test_attach_records_tree_events() {
        let child = make_action("child", || Ok(Outcome::payload(5)));
        let off = make_action("off", || Ok(Outcome::none()));
        off.disable();
        let root = Action::group("root")
            .with_children([child, off])
            .build()
            .unwrap();

        let timeline = Rc::new(RefCell::new(ExecutionTimeline::new()));
        let attachment = ExecutionTimeline::attach(&timeline, &root);
        assert_eq!(attachment.len(), 3);

        root.execute(false).unwrap();

        let recorded: Vec<(String, EventType)> = timeline
            .borrow()
            .get_events()
            .iter()
            .map(|e| (e.action.clone(), e.event_type))
            .collect();
        assert_eq!(
            recorded,
            vec![
                ("root".to_string(), EventType::Started),
                ("root".to_string(), EventType::Completed),
                ("child".to_string(), EventType::Started),
                ("child".to_string(), EventType::Completed),
                ("off".to_string(), EventType::Skipped),
            ]
        );
        assert_eq!(timeline.borrow().get_events()[3].detail.as_deref(), Some("5"));
    }

    #[test]
    fn test_same_named_actions_keep_separate_durations() {
        let frontend = Action::group("frontend")
            .with_child(make_action("test", || Ok(Outcome::none())))
            .build()
            .unwrap();
        let backend = Action::group("backend")
            .with_child(make_action("test", || Ok(Outcome::none())))
            .build()
            .unwrap();
        let root = Action::group("root")
            .with_children([frontend, backend])
            .build()
            .unwrap();

        let timeline = Rc::new(RefCell::new(ExecutionTimeline::new()));
        let _attachment = ExecutionTimeline::attach(&timeline, &root);
        root.execute(false).unwrap();

        let durations = timeline.borrow().get_durations();
        assert_eq!(durations.len(), 5);
        assert!(durations.contains_key("root/frontend/test"));
        assert!(durations.contains_key("root/backend/test"));
    }

    #[test]
    fn test_same_named_siblings_get_suffix() {
        let root = Action::group("root")
            .with_children([
                make_action("retry", || Ok(Outcome::none())),
                make_action("retry", || Ok(Outcome::none())),
            ])
            .build()
            .unwrap();

        let timeline = Rc::new(RefCell::new(ExecutionTimeline::new()));
        let _attachment = ExecutionTimeline::attach(&timeline, &root);
        root.execute(false).unwrap();

        let timeline = timeline.borrow();
        let paths: Vec<&str> = timeline
            .get_events()
            .iter()
            .filter(|e| e.event_type == EventType::Started)
            .map(|e| e.path.as_str())
            .collect();
        assert_eq!(paths, vec!["root", "root/retry", "root/retry#2"]);
        assert_eq!(timeline.get_durations().len(), 3);
    }

    #[test]
    fn test_detach_on_drop() {
        let action = make_action("solo", || Ok(Outcome::none()));
        let timeline = Rc::new(RefCell::new(ExecutionTimeline::new()));

        let attachment = ExecutionTimeline::attach(&timeline, &action);
        assert_eq!(action.hooks().started.len(), 1);
        drop(attachment);
        assert!(action.hooks().started.is_empty());

        action.execute(true).unwrap();
        assert!(timeline.borrow().get_events().is_empty());
    }

    #[test]
    fn test_event_serialization() {
        let mut timeline = ExecutionTimeline::new();
        timeline.add_event("build", EventType::Cancelled);

        let json = serde_json::to_value(&timeline.get_events()[0]).unwrap();
        assert_eq!(json["action"], "build");
        assert_eq!(json["path"], "build");
        assert_eq!(json["event_type"], "cancelled");
        assert!(json.get("detail").is_none());
        assert!(json.get("timestamp").is_none());
    }
}
