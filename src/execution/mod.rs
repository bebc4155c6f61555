//! Action Execution Module
//!
//! Runs action trees and reports on the result.
//!
//! # Architecture
//!
//! - [`step`]: `execute`, `execute_standalone` and `execute_with_children`
//!   on a single [`Action`](crate::action::Action)
//! - [`engine`]: Orchestrator that runs a root action with a timeline attached

pub mod engine;
pub mod step;

pub use engine::{Engine, PlannedAction, RunReport};
