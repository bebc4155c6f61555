//! Action Definition Module
//!
//! Data structures for building trees of actions.
//!
//! # Structure
//!
//! - [`model`]: The [`Action`] node, its builder and tree operations
//! - [`behavior`]: The [`Runnable`] trait and ready-made behaviors
//! - [`status`]: Values a behavior returns ([`ActionStatus`], [`Outcome`])
//! - [`hooks`]: Per-action lifecycle event hooks
//! - [`guard`]: Scoped temporary disable

pub mod behavior;
pub mod guard;
pub mod hooks;
pub mod model;
pub mod status;

pub use behavior::{make_action, Callback, Group, Runnable};
pub use guard::DisableGuard;
pub use hooks::{ActionHooks, EventHook, HandlerId};
pub use model::{Action, ActionBuilder};
pub use status::{ActionStatus, Outcome};
