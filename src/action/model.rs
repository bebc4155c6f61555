//! Action Data Model
//!
//! An [`Action`] is a named unit of work arranged in a tree. Each action owns
//! a behavior, an ordered list of child actions (run after it), an ordered
//! list of accessory actions (grouped with it but never run automatically),
//! tags for grouping and search, and two flags that propagate down the tree:
//! `enabled` and `valid`.
//!
//! # Example
//!
//! ```
//! use actiontree::action::{make_action, Action, Outcome};
//!
//! let compile = make_action("compile", || Ok(Outcome::none()));
//! let test = make_action("test", || Ok(Outcome::none()));
//!
//! let build = Action::group("build")
//!     .with_children([compile.clone(), test.clone()])
//!     .with_primary_tag("ci")
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(build.children(), vec![compile.clone(), test]);
//! assert_eq!(compile.parent(), Some(build));
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use log::debug;

use crate::error::ActionError;

use super::behavior::{Group, Runnable};
use super::hooks::ActionHooks;
use super::status::Outcome;

/// Handle to a node in an action tree.
///
/// Cloning is cheap and yields another handle to the same node. Equality is
/// identity: two handles are equal when they point at the same node.
#[derive(Clone)]
pub struct Action {
    inner: Rc<ActionInner>,
}

struct ActionInner {
    name: String,
    behavior: RefCell<Box<dyn Runnable>>,
    payload: RefCell<Option<Outcome>>,
    children: RefCell<Vec<Action>>,
    accessories: RefCell<Vec<Action>>,
    parent: RefCell<Weak<ActionInner>>,
    primary_tag: RefCell<Option<String>>,
    secondary_tags: RefCell<Vec<String>>,
    enabled: Cell<bool>,
    valid: bool,
    hooks: ActionHooks,
}

#[derive(Debug, Clone, Copy)]
enum Slot {
    Child,
    Accessory,
}

impl Action {
    /// Creates an action with no children and runs its `configure` hook.
    pub fn new(name: impl Into<String>, behavior: impl Runnable + 'static) -> Self {
        let action = Self::from_parts(
            name.into(),
            Box::new(behavior),
            None,
            Vec::new(),
            true,
            true,
        );
        action.configure();
        action
    }

    /// Starts building an action around a behavior.
    pub fn builder(name: impl Into<String>, behavior: impl Runnable + 'static) -> ActionBuilder {
        ActionBuilder::new(name, Box::new(behavior))
    }

    /// Starts building a container action whose own run does nothing.
    pub fn group(name: impl Into<String>) -> ActionBuilder {
        ActionBuilder::new(name, Box::new(Group))
    }

    fn from_parts(
        name: String,
        behavior: Box<dyn Runnable>,
        primary_tag: Option<String>,
        secondary_tags: Vec<String>,
        enabled: bool,
        valid: bool,
    ) -> Self {
        Self {
            inner: Rc::new(ActionInner {
                name,
                behavior: RefCell::new(behavior),
                payload: RefCell::new(None),
                children: RefCell::new(Vec::new()),
                accessories: RefCell::new(Vec::new()),
                parent: RefCell::new(Weak::new()),
                primary_tag: RefCell::new(primary_tag),
                secondary_tags: RefCell::new(secondary_tags),
                enabled: Cell::new(enabled),
                valid,
                hooks: ActionHooks::new(),
            }),
        }
    }

    fn configure(&self) {
        self.inner.behavior.borrow_mut().configure(self);
    }

    /// Name of the action. Not required to be unique.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Last successful outcome, or `None` before the first successful run.
    pub fn payload(&self) -> Option<Outcome> {
        self.inner.payload.borrow().clone()
    }

    /// Lifecycle hooks of this action.
    pub fn hooks(&self) -> &ActionHooks {
        &self.inner.hooks
    }

    pub fn primary_tag(&self) -> Option<String> {
        self.inner.primary_tag.borrow().clone()
    }

    pub fn set_primary_tag(&self, tag: Option<String>) {
        *self.inner.primary_tag.borrow_mut() = tag;
    }

    pub fn secondary_tags(&self) -> Vec<String> {
        self.inner.secondary_tags.borrow().clone()
    }

    pub fn add_secondary_tag(&self, tag: impl Into<String>) {
        let tag = tag.into();
        let mut tags = self.inner.secondary_tags.borrow_mut();
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }

    /// True if `tag` is the primary tag or one of the secondary tags.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.inner.primary_tag.borrow().as_deref() == Some(tag)
            || self.inner.secondary_tags.borrow().iter().any(|t| t == tag)
    }

    /// Returns true if both handles refer to the same node.
    pub fn ptr_eq(&self, other: &Action) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    // ---- tree structure ----

    /// Child actions in execution order.
    pub fn children(&self) -> Vec<Action> {
        self.inner.children.borrow().clone()
    }

    /// Accessory actions. These are never run by the engine.
    pub fn accessories(&self) -> Vec<Action> {
        self.inner.accessories.borrow().clone()
    }

    /// The action this one was added to, if any.
    pub fn parent(&self) -> Option<Action> {
        self.inner
            .parent
            .borrow()
            .upgrade()
            .map(|inner| Action { inner })
    }

    /// Parent, grandparent, and so on up to the root.
    pub fn ancestors(&self) -> Vec<Action> {
        let mut ancestors = Vec::new();
        let mut current = self.parent();
        while let Some(action) = current {
            current = action.parent();
            ancestors.push(action);
        }
        ancestors
    }

    /// Every action below this one, not including accessories.
    ///
    /// Children come first, then each child's children appended in turn, so
    /// a parent always precedes its own children and siblings keep their
    /// left-to-right order.
    pub fn descendants(&self) -> Vec<Action> {
        let mut descendants = self.children();
        let mut index = 0;
        while index < descendants.len() {
            let grandchildren = descendants[index].children();
            descendants.extend(grandchildren);
            index += 1;
        }
        descendants
    }

    /// First descendant with the given name.
    pub fn find_descendant(&self, name: &str) -> Option<Action> {
        self.descendants().into_iter().find(|a| a.name() == name)
    }

    /// Descendants carrying `tag` as primary or secondary tag.
    pub fn descendants_with_tag(&self, tag: &str) -> Vec<Action> {
        self.descendants()
            .into_iter()
            .filter(|a| a.has_tag(tag))
            .collect()
    }

    /// Appends a child, or inserts it at `position`.
    ///
    /// Adding a child that is already present is a no-op. A node that
    /// belongs to another parent, or that would close a cycle, is rejected.
    pub fn add_child(
        &self,
        action: Action,
        position: Option<usize>,
    ) -> Result<(), ActionError> {
        self.insert(Slot::Child, action, position)
    }

    /// Appends several children in order.
    pub fn add_children(
        &self,
        actions: impl IntoIterator<Item = Action>,
    ) -> Result<(), ActionError> {
        for action in actions {
            self.add_child(action, None)?;
        }
        Ok(())
    }

    /// Appends an accessory, or inserts it at `position`.
    pub fn add_accessory(
        &self,
        action: Action,
        position: Option<usize>,
    ) -> Result<(), ActionError> {
        self.insert(Slot::Accessory, action, position)
    }

    /// Appends several accessories in order.
    pub fn add_accessories(
        &self,
        actions: impl IntoIterator<Item = Action>,
    ) -> Result<(), ActionError> {
        for action in actions {
            self.add_accessory(action, None)?;
        }
        Ok(())
    }

    fn insert(
        &self,
        slot: Slot,
        action: Action,
        position: Option<usize>,
    ) -> Result<(), ActionError> {
        let list = match slot {
            Slot::Child => &self.inner.children,
            Slot::Accessory => &self.inner.accessories,
        };

        if list.borrow().iter().any(|existing| existing.ptr_eq(&action)) {
            debug!("'{}' already in {:?} list of '{}'", action.name(), slot, self.name());
            return Ok(());
        }

        if action.ptr_eq(self) || self.ancestors().iter().any(|a| a.ptr_eq(&action)) {
            return Err(ActionError::Cycle {
                parent: self.name().to_string(),
                child: action.name().to_string(),
            });
        }

        if let Some(parent) = action.parent() {
            if !parent.ptr_eq(self) {
                return Err(ActionError::AlreadyParented {
                    action: action.name().to_string(),
                    parent: parent.name().to_string(),
                });
            }
        }

        *action.inner.parent.borrow_mut() = Rc::downgrade(&self.inner);

        let mut list = list.borrow_mut();
        let index = position.map_or(list.len(), |p| p.min(list.len()));
        list.insert(index, action);
        Ok(())
    }

    // ---- enabled / valid ----

    /// Whether this action will run. False if it or any ancestor is disabled.
    pub fn enabled(&self) -> bool {
        self.inner.enabled.get() && self.parent().map_or(true, |p| p.enabled())
    }

    /// Sets the enabled state.
    ///
    /// The value is written to this action and every descendant. Enabling
    /// also enables every ancestor. Siblings and cousins are left alone.
    pub fn set_enabled(&self, value: bool) {
        self.inner.enabled.set(value);

        // Write the raw flags so descendants don't walk their ancestors again.
        for descendant in self.descendants() {
            descendant.inner.enabled.set(value);
        }

        if value {
            for ancestor in self.ancestors() {
                ancestor.inner.enabled.set(true);
            }
        }
    }

    pub fn enable(&self) {
        self.set_enabled(true);
    }

    pub fn disable(&self) {
        self.set_enabled(false);
    }

    /// Whether this action is valid. An invalid action invalidates its subtree.
    ///
    /// While the behavior itself is running only the construction flag is
    /// consulted for this node.
    pub fn valid(&self) -> bool {
        let behavior_valid = self
            .inner
            .behavior
            .try_borrow()
            .map_or(true, |behavior| behavior.is_valid());

        self.inner.valid && behavior_valid && self.parent().map_or(true, |p| p.valid())
    }

    pub(crate) fn enabled_self(&self) -> bool {
        self.inner.enabled.get()
    }

    pub(crate) fn set_enabled_self(&self, value: bool) {
        self.inner.enabled.set(value);
    }

    pub(crate) fn behavior(&self) -> &RefCell<Box<dyn Runnable>> {
        &self.inner.behavior
    }

    pub(crate) fn store_payload(&self, outcome: Outcome) {
        *self.inner.payload.borrow_mut() = Some(outcome);
    }
}

impl PartialEq for Action {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Action {}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Action \"{}\" at {:p}>", self.name(), Rc::as_ptr(&self.inner))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Builder for an [`Action`] with its initial children, accessories and tags.
pub struct ActionBuilder {
    name: String,
    behavior: Box<dyn Runnable>,
    children: Vec<Action>,
    accessories: Vec<Action>,
    primary_tag: Option<String>,
    secondary_tags: Vec<String>,
    enabled: bool,
    valid: bool,
}

impl ActionBuilder {
    fn new(name: impl Into<String>, behavior: Box<dyn Runnable>) -> Self {
        Self {
            name: name.into(),
            behavior,
            children: Vec::new(),
            accessories: Vec::new(),
            primary_tag: None,
            secondary_tags: Vec::new(),
            enabled: true,
            valid: true,
        }
    }

    /// Adds a child action.
    pub fn with_child(mut self, action: Action) -> Self {
        self.children.push(action);
        self
    }

    /// Adds several child actions in order.
    pub fn with_children(mut self, actions: impl IntoIterator<Item = Action>) -> Self {
        self.children.extend(actions);
        self
    }

    /// Adds an accessory action.
    pub fn with_accessory(mut self, action: Action) -> Self {
        self.accessories.push(action);
        self
    }

    /// Adds several accessory actions in order.
    pub fn with_accessories(mut self, actions: impl IntoIterator<Item = Action>) -> Self {
        self.accessories.extend(actions);
        self
    }

    pub fn with_primary_tag(mut self, tag: impl Into<String>) -> Self {
        self.primary_tag = Some(tag.into());
        self
    }

    pub fn with_secondary_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.secondary_tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Initial enabled flag for this node only (default true).
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Initial validity flag (default true).
    pub fn with_valid(mut self, valid: bool) -> Self {
        self.valid = valid;
        self
    }

    /// Wires the children and accessories, then runs the behavior's
    /// `configure` hook.
    pub fn build(self) -> Result<Action, ActionError> {
        let action = Action::from_parts(
            self.name,
            self.behavior,
            self.primary_tag,
            self.secondary_tags,
            self.enabled,
            self.valid,
        );

        action.add_accessories(self.accessories)?;
        action.add_children(self.children)?;
        action.configure();

        Ok(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::make_action;

    fn leaf(name: &str) -> Action {
        make_action(name, || Ok(Outcome::none()))
    }

    /// parent -> [child -> [grandchild], sibling]
    fn family() -> (Action, Action, Action, Action) {
        let grandchild = leaf("grandchild");
        let child = Action::group("child")
            .with_child(grandchild.clone())
            .build()
            .unwrap();
        let sibling = leaf("sibling");
        let parent = Action::group("parent")
            .with_children([child.clone(), sibling.clone()])
            .build()
            .unwrap();
        (parent, child, sibling, grandchild)
    }

    #[test]
    fn test_builder_initialization() {
        let (a, b, c) = (leaf("a"), leaf("b"), leaf("c"));
        let (d, e, f) = (leaf("d"), leaf("e"), leaf("f"));

        let action = Action::group("my_action")
            .with_accessories([a.clone(), b.clone(), c.clone()])
            .with_children([d.clone(), e.clone(), f.clone()])
            .with_primary_tag("8")
            .with_secondary_tags(["9", "10", "11"])
            .build()
            .unwrap();

        assert_eq!(action.name(), "my_action");
        assert_eq!(action.accessories(), vec![a.clone(), b, c]);
        assert_eq!(action.children(), vec![d.clone(), e, f]);
        assert_eq!(a.parent(), Some(action.clone()));
        assert_eq!(d.parent(), Some(action.clone()));
        assert_eq!(action.primary_tag(), Some("8".to_string()));
        assert_eq!(action.secondary_tags(), vec!["9", "10", "11"]);
        assert!(action.payload().is_none());
    }

    #[test]
    fn test_add_child_twice_is_noop() {
        let parent = Action::group("parent").build().unwrap();
        let child = leaf("child");

        parent.add_child(child.clone(), None).unwrap();
        parent.add_child(child.clone(), None).unwrap();

        assert_eq!(parent.children().len(), 1);
    }

    #[test]
    fn test_add_child_at_position() {
        let (a, b, c) = (leaf("a"), leaf("b"), leaf("c"));
        let parent = Action::group("parent")
            .with_children([a.clone(), b.clone()])
            .build()
            .unwrap();

        parent.add_child(c.clone(), Some(0)).unwrap();
        assert_eq!(parent.children(), vec![c, a, b.clone()]);

        let d = leaf("d");
        parent.add_child(d.clone(), Some(99)).unwrap();
        assert_eq!(parent.children().last(), Some(&d));
    }

    #[test]
    fn test_add_accessory_sets_parent() {
        let parent = Action::group("parent").build().unwrap();
        let save_as = leaf("save_as");

        parent.add_accessory(save_as.clone(), None).unwrap();
        parent.add_accessory(save_as.clone(), None).unwrap();

        assert_eq!(parent.accessories(), vec![save_as.clone()]);
        assert_eq!(save_as.parent(), Some(parent.clone()));
        assert!(parent.descendants().is_empty());
    }

    #[test]
    fn test_reparenting_is_rejected() {
        let first = Action::group("first").build().unwrap();
        let second = Action::group("second").build().unwrap();
        let child = leaf("child");

        first.add_child(child.clone(), None).unwrap();
        let err = second.add_child(child.clone(), None).unwrap_err();

        assert!(matches!(err, ActionError::AlreadyParented { .. }));
        assert!(second.children().is_empty());
        assert_eq!(child.parent(), Some(first));
    }

    #[test]
    fn test_same_parent_child_and_accessory() {
        let parent = Action::group("parent").build().unwrap();
        let node = leaf("node");

        parent.add_child(node.clone(), None).unwrap();
        assert!(parent.add_accessory(node.clone(), None).is_ok());
        assert_eq!(parent.accessories().len(), 1);
    }

    #[test]
    fn test_cycles_are_rejected() {
        let (parent, child, _, grandchild) = family();

        assert!(matches!(
            grandchild.add_child(parent.clone(), None),
            Err(ActionError::Cycle { .. })
        ));
        assert!(matches!(
            child.add_child(child.clone(), None),
            Err(ActionError::Cycle { .. })
        ));
        assert!(grandchild.children().is_empty());
    }

    #[test]
    fn test_builder_rejects_parented_child() {
        let child = leaf("child");
        let _first = Action::group("first")
            .with_child(child.clone())
            .build()
            .unwrap();

        let result = Action::group("second").with_child(child).build();
        assert!(matches!(result, Err(ActionError::AlreadyParented { .. })));
    }

    #[test]
    fn test_dropped_parent_releases_child() {
        let child = leaf("child");
        let first = Action::group("first")
            .with_child(child.clone())
            .build()
            .unwrap();
        assert_eq!(child.parent(), Some(first.clone()));

        drop(first);
        assert!(child.parent().is_none());
        assert!(child.ancestors().is_empty());

        let second = Action::group("second")
            .with_child(child.clone())
            .build()
            .unwrap();
        assert_eq!(child.parent(), Some(second));
    }

    #[test]
    fn test_ancestors() {
        let (parent, child, sibling, grandchild) = family();

        assert!(parent.ancestors().is_empty());
        assert_eq!(sibling.ancestors(), vec![parent.clone()]);
        assert_eq!(grandchild.ancestors(), vec![child, parent]);
    }

    #[test]
    fn test_descendants_order() {
        let (parent, child, sibling, grandchild) = family();

        assert_eq!(parent.descendants(), vec![child.clone(), sibling, grandchild.clone()]);
        assert_eq!(child.descendants(), vec![grandchild]);
    }

    #[test]
    fn test_find_and_tag_search() {
        let tagged = Action::builder("lint", crate::action::Group)
            .with_secondary_tags(["ci"])
            .build()
            .unwrap();
        let primary = Action::group("deploy")
            .with_primary_tag("ci")
            .build()
            .unwrap();
        let root = Action::group("root")
            .with_children([tagged.clone(), leaf("docs"), primary.clone()])
            .build()
            .unwrap();

        assert_eq!(
            root.find_descendant("docs").map(|a| a.name().to_string()),
            Some("docs".to_string())
        );
        assert!(root.find_descendant("missing").is_none());
        assert_eq!(root.descendants_with_tag("ci"), vec![tagged.clone(), primary]);

        tagged.add_secondary_tag("ci");
        assert_eq!(tagged.secondary_tags().len(), 1);
    }

    #[test]
    fn test_disable_propagates_down() {
        let (parent, child, sibling, grandchild) = family();

        child.disable();

        assert!(parent.enabled());
        assert!(!child.enabled());
        assert!(!grandchild.enabled());
        assert!(sibling.enabled());
    }

    #[test]
    fn test_disable_grandchild_does_not_propagate_up() {
        let (parent, child, _, grandchild) = family();

        grandchild.set_enabled(false);

        assert!(parent.enabled());
        assert!(child.enabled());
        assert!(!grandchild.enabled());
    }

    #[test]
    fn test_enable_propagates_up_not_sideways() {
        let (parent, child, sibling, grandchild) = family();

        parent.disable();
        assert!(!sibling.enabled());

        grandchild.enable();

        assert!(grandchild.enabled());
        assert!(child.enabled());
        assert!(parent.enabled());
        assert!(!sibling.enabled());
    }

    #[test]
    fn test_reenabling_restores_subtree() {
        let (_, child, _, grandchild) = family();

        child.disable();
        assert!(!grandchild.enabled());

        child.enable();
        assert!(grandchild.enabled());
    }

    #[test]
    fn test_inherited_disable_from_builder_flag() {
        let inner = leaf("inner");
        let outer = Action::group("outer")
            .with_child(inner.clone())
            .with_enabled(false)
            .build()
            .unwrap();

        assert!(!outer.enabled());
        assert!(!inner.enabled());
        assert!(inner.enabled_self());
    }

    #[test]
    fn test_valid_propagates_down() {
        let grandchild = leaf("grandchild");
        let child = Action::group("child")
            .with_child(grandchild.clone())
            .with_valid(false)
            .build()
            .unwrap();
        let sibling = leaf("sibling");
        let parent = Action::group("parent")
            .with_children([child.clone(), sibling.clone()])
            .build()
            .unwrap();

        assert!(parent.valid());
        assert!(!child.valid());
        assert!(sibling.valid());
        assert!(!grandchild.valid());
    }

    #[test]
    fn test_debug_and_display() {
        let action = leaf("render");
        assert!(format!("{:?}", action).starts_with("<Action \"render\" at "));
        assert_eq!(action.to_string(), "render");
    }

    #[test]
    fn test_identity_equality() {
        let a = leaf("same");
        let b = leaf("same");
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }
}
