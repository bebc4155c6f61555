//! Action Execution
//!
//! Runs a single action, or an action followed by its descendants:
//! - Disabled actions are skipped without running their behavior
//! - `Cancel` from the executed action cancels every descendant
//! - `Skip` from the executed action skips every descendant
//! - Otherwise descendants run one by one, and a `Cancel` from any of them
//!   stops the walk
//! - A behavior error fires `failed` and is returned to the caller
//!
//! Subscribers must not rely on tree changes made during a walk: the
//! descendant list is captured before the first descendant runs.

use log::{debug, error, info};

use crate::action::{Action, Outcome};
use crate::error::ActionError;

impl Action {
    /// Runs this action, and its descendants unless `standalone` is set.
    ///
    /// Accessory actions are never run; execute them separately.
    pub fn execute(&self, standalone: bool) -> Result<Outcome, ActionError> {
        if standalone {
            self.execute_standalone()
        } else {
            self.execute_with_children()
        }
    }

    /// Runs this action and then its descendants.
    ///
    /// Returns this action's own outcome, not the outcome of the last
    /// descendant.
    pub fn execute_with_children(&self) -> Result<Outcome, ActionError> {
        let result = self.execute_standalone()?;
        let descendants = self.descendants();

        if result.is_cancel() {
            info!(
                "'{}' cancelled - cancelling {} descendants",
                self.name(),
                descendants.len()
            );
            for action in &descendants {
                action.hooks().cancelled.emit(action);
            }
            return Ok(result);
        }

        if result.is_skip() {
            debug!(
                "'{}' skipped - skipping {} descendants",
                self.name(),
                descendants.len()
            );
            for action in &descendants {
                action.hooks().skipped.emit(action);
            }
            return Ok(result);
        }

        for action in &descendants {
            let status = action.execute_standalone()?;
            if status.is_cancel() {
                info!("'{}' cancelled - stopping '{}'", action.name(), self.name());
                break;
            }
            // A skipped descendant does not stop the walk; its own children
            // decide for themselves through their enabled flag.
        }

        Ok(result)
    }

    /// Runs only this action, ignoring its children.
    pub fn execute_standalone(&self) -> Result<Outcome, ActionError> {
        if !self.enabled() {
            debug!("'{}' is disabled - skipping", self.name());
            self.hooks().skipped.emit(self);
            return Ok(Outcome::skip());
        }

        if self.behavior().try_borrow_mut().is_err() {
            return Err(ActionError::Reentrant(self.name().to_string()));
        }

        debug!("Starting action: {}", self.name());
        self.hooks().started.emit(self);

        let result = {
            let mut behavior = self
                .behavior()
                .try_borrow_mut()
                .map_err(|_| ActionError::Reentrant(self.name().to_string()))?;
            behavior.run()
        };

        match result {
            Err(source) => {
                error!("Action '{}' failed: {}", self.name(), source);
                self.hooks().failed.emit(self, source.as_ref());
                Err(ActionError::Failed {
                    action: self.name().to_string(),
                    source,
                })
            }
            Ok(outcome) if outcome.is_cancel() => {
                debug!("'{}' returned cancel", self.name());
                self.hooks().cancelled.emit(self);
                Ok(outcome)
            }
            Ok(outcome) if outcome.is_skip() => {
                debug!("'{}' returned skip", self.name());
                self.hooks().skipped.emit(self);
                Ok(outcome)
            }
            Ok(outcome) => {
                debug!("'{}' completed: {}", self.name(), outcome.label());
                self.store_payload(outcome.clone());
                self.hooks().completed.emit(self, &outcome);
                Ok(outcome)
            }
        }
    }
}
