//! Action Behaviors
//!
//! The work an action performs is supplied through the [`Runnable`] trait.
//! `run` is required; `configure` and `is_valid` have defaults.

use log::debug;

use crate::error::BehaviorError;

use super::model::Action;
use super::status::Outcome;

/// The behavior attached to an action.
///
/// # Example
///
/// ```
/// use actiontree::action::{Action, Outcome, Runnable};
/// use actiontree::error::BehaviorError;
///
/// struct Compile {
///     target: String,
/// }
///
/// impl Runnable for Compile {
///     fn run(&mut self) -> Result<Outcome, BehaviorError> {
///         Ok(Outcome::payload(format!("built {}", self.target)))
///     }
/// }
///
/// let action = Action::builder("compile", Compile { target: "lib".into() })
///     .build()
///     .unwrap();
/// assert_eq!(
///     action.execute(false).unwrap(),
///     Outcome::payload("built lib")
/// );
/// ```
pub trait Runnable {
    /// Performs the action's work.
    ///
    /// Return [`Outcome::cancel`] to abort the whole remaining walk, or
    /// [`Outcome::skip`] to skip this action. Any other value is stored as
    /// the action's payload.
    fn run(&mut self) -> Result<Outcome, BehaviorError>;

    /// Called once after the action is built and its children are wired.
    fn configure(&mut self, _action: &Action) {}

    /// Dynamic validity check. Combined with the construction flag and the
    /// parent's validity.
    fn is_valid(&self) -> bool {
        true
    }
}

/// Behavior backed by a closure.
pub struct Callback<F> {
    callback: F,
}

impl<F> Callback<F>
where
    F: FnMut() -> Result<Outcome, BehaviorError>,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> Runnable for Callback<F>
where
    F: FnMut() -> Result<Outcome, BehaviorError>,
{
    fn run(&mut self) -> Result<Outcome, BehaviorError> {
        (self.callback)()
    }
}

/// A container action that does nothing itself.
#[derive(Debug, Default, Clone, Copy)]
pub struct Group;

impl Runnable for Group {
    fn run(&mut self) -> Result<Outcome, BehaviorError> {
        Ok(Outcome::none())
    }
}

/// Wraps a closure into an action without defining a behavior type.
pub fn make_action<F>(name: impl Into<String>, callback: F) -> Action
where
    F: FnMut() -> Result<Outcome, BehaviorError> + 'static,
{
    let name = name.into();
    debug!("Creating callback action '{}'", name);
    Action::new(name, Callback::new(callback))
}
