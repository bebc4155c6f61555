//! ActionTree - Hierarchical Action Execution Engine
//!
//! Builds trees of actions and runs them depth by depth: an action runs its
//! own behavior, then, unless it cancelled or skipped, each of its
//! descendants in turn. Enabled and valid flags propagate through the tree,
//! and every action broadcasts lifecycle events to its subscribers.
//!
//! # Architecture
//!
//! The library is organized into three main modules:
//!
//! - [`action`]: The action tree, behaviors, status values and event hooks
//! - [`execution`]: Execution algorithm and the run orchestrator
//! - [`monitoring`]: Execution timeline fed by the event hooks
//!
//! # Example
//!
//! ```rust
//! use actiontree::action::{make_action, Action, Outcome};
//! use actiontree::execution::Engine;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let build = make_action("build", || Ok(Outcome::success()));
//!     let deploy = make_action("deploy", || Ok(Outcome::cancel()));
//!     let cleanup = make_action("cleanup", || Ok(Outcome::none()));
//!
//!     let release = Action::group("release")
//!         .with_children([build, deploy, cleanup.clone()])
//!         .build()?;
//!
//!     let report = Engine::new(release).run()?;
//!     assert!(report.cancelled);
//!     assert!(cleanup.payload().is_none());
//!     Ok(())
//! }
//! ```

pub mod action;
pub mod error;
pub mod execution;
pub mod monitoring;
pub mod sample;

// Re-export commonly used types
pub use action::{make_action, Action, ActionStatus, Outcome, Runnable};
pub use error::{ActionError, BehaviorError};
pub use execution::engine::Engine;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "ActionTree";
