//! Scoped temporary disable.

use super::model::Action;

/// Keeps an action disabled until dropped, then restores its previous flag.
///
/// Only the action's own flag is touched; descendants read as disabled
/// through inheritance while the guard is alive.
#[must_use = "the action is re-enabled as soon as the guard is dropped"]
pub struct DisableGuard {
    action: Action,
    previous: bool,
}

impl Action {
    /// Disables this action for the lifetime of the returned guard.
    ///
    /// ```
    /// use actiontree::action::{make_action, Outcome};
    ///
    /// let action = make_action("save", || Ok(Outcome::none()));
    /// {
    ///     let _guard = action.disabled_scope();
    ///     assert!(!action.enabled());
    /// }
    /// assert!(action.enabled());
    /// ```
    pub fn disabled_scope(&self) -> DisableGuard {
        let previous = self.enabled_self();
        self.set_enabled_self(false);
        DisableGuard {
            action: self.clone(),
            previous,
        }
    }
}

impl Drop for DisableGuard {
    fn drop(&mut self) {
        self.action.set_enabled_self(self.previous);
    }
}
