//! Execution Monitoring Module
//!
//! Records what happened during a run.
//!
//! # Components
//!
//! - [`ExecutionTimeline`]: Action lifecycle events and timing for charts and reports

pub mod timeline;

pub use timeline::{EventType, ExecutionTimeline, TimelineAttachment, TimelineEvent};
