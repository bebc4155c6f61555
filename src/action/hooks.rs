//! Lifecycle Event Hooks
//!
//! Every [`Action`] owns one [`ActionHooks`] set. Hooks are scoped per
//! instance: subscribing to one action never fires for another. To watch a
//! whole tree, subscribe to each node (see
//! [`ExecutionTimeline::attach`](crate::monitoring::ExecutionTimeline::attach)).
//!
//! Emission is synchronous. Handlers run in subscription order and all of
//! them finish before `emit` returns. Handlers cannot fail; a panic inside
//! one propagates to the caller of `emit`.

use std::cell::{Cell, RefCell};
use std::error::Error;
use std::fmt;
use std::rc::Rc;

use log::warn;

use super::model::Action;
use super::status::Outcome;

/// Handler for `started`, `skipped` and `cancelled`.
pub type ActionHandler = dyn FnMut(&Action);

/// Handler for `completed`, receiving the stored payload.
pub type CompletedHandler = dyn FnMut(&Action, &Outcome);

/// Handler for `failed`, receiving the behavior's error.
pub type FailedHandler = dyn FnMut(&Action, &(dyn Error + 'static));

/// Identifies a subscription so it can be disconnected later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

type Slot<F> = Rc<RefCell<Box<F>>>;

/// A multi-subscriber broadcast channel.
pub struct EventHook<F: ?Sized> {
    name: &'static str,
    next_id: Cell<u64>,
    handlers: RefCell<Vec<(HandlerId, Slot<F>)>>,
}

impl<F: ?Sized> EventHook<F> {
    /// Creates an empty hook.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            next_id: Cell::new(0),
            handlers: RefCell::new(Vec::new()),
        }
    }

    /// Event name, e.g. `"started"`.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Subscribes an already boxed handler.
    pub fn connect_boxed(&self, handler: Box<F>) -> HandlerId {
        let id = HandlerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.handlers
            .borrow_mut()
            .push((id, Rc::new(RefCell::new(handler))));
        id
    }

    /// Removes a subscription. Returns false if it was not connected.
    pub fn disconnect(&self, id: HandlerId) -> bool {
        let mut handlers = self.handlers.borrow_mut();
        let before = handlers.len();
        handlers.retain(|(handler_id, _)| *handler_id != id);
        handlers.len() != before
    }

    /// Removes every subscription.
    pub fn clear(&self) {
        self.handlers.borrow_mut().clear();
    }

    /// Number of connected handlers.
    pub fn len(&self) -> usize {
        self.handlers.borrow().len()
    }

    /// Returns true if nothing is connected.
    pub fn is_empty(&self) -> bool {
        self.handlers.borrow().is_empty()
    }

    /// Copies the handler list so handlers may (dis)connect while we emit.
    fn snapshot(&self) -> Vec<Slot<F>> {
        self.handlers
            .borrow()
            .iter()
            .map(|(_, slot)| Rc::clone(slot))
            .collect()
    }

    fn dispatch(&self, mut call: impl FnMut(&mut F)) {
        for slot in self.snapshot() {
            match slot.try_borrow_mut() {
                Ok(mut handler) => call(&mut **handler),
                Err(_) => warn!("Skipping re-entrant '{}' handler", self.name),
            }
        }
    }
}

impl EventHook<ActionHandler> {
    /// Subscribes a handler.
    pub fn connect(&self, handler: impl FnMut(&Action) + 'static) -> HandlerId {
        self.connect_boxed(Box::new(handler))
    }

    /// Calls every handler with the action.
    pub fn emit(&self, action: &Action) {
        self.dispatch(|handler| handler(action));
    }
}

impl EventHook<CompletedHandler> {
    /// Subscribes a handler.
    pub fn connect(&self, handler: impl FnMut(&Action, &Outcome) + 'static) -> HandlerId {
        self.connect_boxed(Box::new(handler))
    }

    /// Calls every handler with the action and its payload.
    pub fn emit(&self, action: &Action, payload: &Outcome) {
        self.dispatch(|handler| handler(action, payload));
    }
}

impl EventHook<FailedHandler> {
    /// Subscribes a handler.
    pub fn connect(
        &self,
        handler: impl FnMut(&Action, &(dyn Error + 'static)) + 'static,
    ) -> HandlerId {
        self.connect_boxed(Box::new(handler))
    }

    /// Calls every handler with the action and the error it raised.
    pub fn emit(&self, action: &Action, error: &(dyn Error + 'static)) {
        self.dispatch(|handler| handler(action, error));
    }
}

impl<F: ?Sized> fmt::Debug for EventHook<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHook")
            .field("name", &self.name)
            .field("handlers", &self.len())
            .finish()
    }
}

/// The five lifecycle hooks of one action.
#[derive(Debug)]
pub struct ActionHooks {
    pub started: EventHook<ActionHandler>,
    pub skipped: EventHook<ActionHandler>,
    pub completed: EventHook<CompletedHandler>,
    pub failed: EventHook<FailedHandler>,
    pub cancelled: EventHook<ActionHandler>,
}

impl ActionHooks {
    pub fn new() -> Self {
        Self {
            started: EventHook::new("started"),
            skipped: EventHook::new("skipped"),
            completed: EventHook::new("completed"),
            failed: EventHook::new("failed"),
            cancelled: EventHook::new("cancelled"),
        }
    }

    /// Disconnects every handler on every hook.
    pub fn clear(&self) {
        self.started.clear();
        self.skipped.clear();
        self.completed.clear();
        self.failed.clear();
        self.cancelled.clear();
    }
}

impl Default for ActionHooks {
    fn default() -> Self {
        Self::new()
    }
}
