//! Action Status
//!
//! Values a behavior hands back to the engine. `Cancel` and `Skip` steer
//! execution; everything else counts as success and becomes the action's
//! payload.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Status codes a behavior may return.
///
/// `Cancel` stops the whole remaining walk. `Skip` skips the action (and,
/// when returned by the action being executed, all of its descendants) while
/// siblings continue. `Error` and `Success` get no special treatment.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ActionStatus {
    Cancel,
    Skip,
    Error,
    Success,
}

impl fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancel => write!(f, "cancel"),
            Self::Skip => write!(f, "skip"),
            Self::Error => write!(f, "error"),
            Self::Success => write!(f, "success"),
        }
    }
}

/// Result of running a behavior.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// One of the control signals.
    Status(ActionStatus),
    /// Opaque success value. `Value::Null` means the behavior returned nothing.
    Payload(Value),
}

impl Outcome {
    pub fn cancel() -> Self {
        Self::Status(ActionStatus::Cancel)
    }

    pub fn skip() -> Self {
        Self::Status(ActionStatus::Skip)
    }

    pub fn success() -> Self {
        Self::Status(ActionStatus::Success)
    }

    pub fn error() -> Self {
        Self::Status(ActionStatus::Error)
    }

    /// A success that carries no value.
    pub fn none() -> Self {
        Self::Payload(Value::Null)
    }

    /// Wraps any serializable value as a payload.
    pub fn payload(value: impl Into<Value>) -> Self {
        Self::Payload(value.into())
    }

    pub fn is_cancel(&self) -> bool {
        matches!(self, Self::Status(ActionStatus::Cancel))
    }

    pub fn is_skip(&self) -> bool {
        matches!(self, Self::Status(ActionStatus::Skip))
    }

    /// True for anything other than `Cancel` or `Skip`.
    pub fn is_success(&self) -> bool {
        !self.is_cancel() && !self.is_skip()
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Payload(value) => Some(value),
            Self::Status(_) => None,
        }
    }

    /// Short label used in logs and reports.
    pub fn label(&self) -> String {
        match self {
            Self::Status(status) => status.to_string(),
            Self::Payload(Value::Null) => "done".to_string(),
            Self::Payload(value) => value.to_string(),
        }
    }
}

impl From<ActionStatus> for Outcome {
    fn from(status: ActionStatus) -> Self {
        Self::Status(status)
    }
}

impl From<Value> for Outcome {
    fn from(value: Value) -> Self {
        Self::Payload(value)
    }
}

impl From<()> for Outcome {
    fn from(_: ()) -> Self {
        Self::none()
    }
}
