//! Error Types
//!
//! Failures that surface from building or executing an action tree.
//! Cancel and skip are not errors; they travel as [`Outcome`] values.
//!
//! [`Outcome`]: crate::action::Outcome

use std::error::Error as StdError;

use thiserror::Error;

/// Error returned by a behavior's `run` method.
pub type BehaviorError = Box<dyn StdError + 'static>;

/// Errors produced by the action engine.
#[derive(Debug, Error)]
pub enum ActionError {
    /// A behavior returned an error. The behavior's error is kept as `source`.
    #[error("Action '{action}' failed: {source}")]
    Failed {
        action: String,
        #[source]
        source: BehaviorError,
    },

    /// The node already belongs to a different parent.
    #[error("Action '{action}' already belongs to '{parent}'")]
    AlreadyParented { action: String, parent: String },

    /// Inserting the node would make the tree cyclic.
    #[error("Adding '{child}' under '{parent}' would create a cycle")]
    Cycle { parent: String, child: String },

    /// The node's behavior is already running further up the call stack.
    #[error("Action '{0}' is already running")]
    Reentrant(String),

    /// Writing a run report failed.
    #[error("Failed to write report: {0}")]
    Report(String),
}

impl ActionError {
    /// Returns the behavior's own error for [`ActionError::Failed`].
    pub fn behavior_error(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Failed { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }

    /// Name of the action the error refers to.
    pub fn action_name(&self) -> Option<&str> {
        match self {
            Self::Failed { action, .. }
            | Self::AlreadyParented { action, .. }
            | Self::Reentrant(action) => Some(action),
            Self::Cycle { child, .. } => Some(child),
            Self::Report(_) => None,
        }
    }
}
