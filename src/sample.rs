//! Sample Action Tree
//!
//! A small release pipeline used by the command-line runner to demonstrate
//! execution, cancel/skip propagation and enable/disable handling:
//!
//! ```text
//! release
//! ├── build
//! │   ├── compile
//! │   └── test
//! ├── package
//! │   └── checksum
//! └── publish            (accessory: publish-preview)
//! ```

use std::collections::HashSet;

use log::debug;
use serde_json::json;
use thiserror::Error;

use crate::action::{Action, Outcome, Runnable};
use crate::error::{ActionError, BehaviorError};

/// Failure injected into a sample step.
#[derive(Debug, Error)]
#[error("step '{0}' was asked to fail")]
pub struct InjectedFailure(pub String);

/// Which sample steps should return skip, return cancel or fail.
#[derive(Debug, Default, Clone)]
pub struct SampleOptions {
    pub skip: HashSet<String>,
    pub cancel: HashSet<String>,
    pub fail: HashSet<String>,
}

impl SampleOptions {
    /// Every name mentioned by the options.
    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.skip.iter().chain(&self.cancel).chain(&self.fail)
    }
}

/// One step of the sample pipeline.
struct SampleStep {
    name: String,
    summary: &'static str,
    options: SampleOptions,
    runs: usize,
}

impl SampleStep {
    fn new(name: &str, summary: &'static str, options: &SampleOptions) -> Self {
        Self {
            name: name.to_string(),
            summary,
            options: options.clone(),
            runs: 0,
        }
    }
}

impl Runnable for SampleStep {
    fn run(&mut self) -> Result<Outcome, BehaviorError> {
        self.runs += 1;
        debug!("Sample step '{}' run #{}", self.name, self.runs);

        if self.options.fail.contains(&self.name) {
            return Err(InjectedFailure(self.name.clone()).into());
        }
        if self.options.cancel.contains(&self.name) {
            return Ok(Outcome::cancel());
        }
        if self.options.skip.contains(&self.name) {
            return Ok(Outcome::skip());
        }

        Ok(Outcome::payload(json!({
            "step": self.name,
            "summary": self.summary,
            "runs": self.runs,
        })))
    }
}

fn step(name: &str, summary: &'static str, options: &SampleOptions) -> Action {
    Action::new(name, SampleStep::new(name, summary, options))
}

/// Builds the sample release pipeline.
pub fn build_sample_tree(options: &SampleOptions) -> Result<Action, ActionError> {
    let build = Action::builder("build", SampleStep::new("build", "prepared build", options))
        .with_primary_tag("ci")
        .with_children([
            step("compile", "compiled sources", options),
            step("test", "ran test suite", options),
        ])
        .build()?;

    let package = SampleStep::new("package", "created archive", options);
    let package = Action::builder("package", package)
        .with_primary_tag("ci")
        .with_child(step("checksum", "wrote checksums", options))
        .build()?;

    let publish = SampleStep::new("publish", "uploaded archive", options);
    let publish = Action::builder("publish", publish)
        .with_secondary_tags(["network"])
        .with_accessory(step("publish-preview", "previewed upload", options))
        .build()?;

    Action::builder("release", SampleStep::new("release", "started release", options))
        .with_primary_tag("release")
        .with_children([build, package, publish])
        .build()
}

/// Finds `name` in the tree rooted at `root`, including the root itself
/// and accessories.
pub fn find_action(root: &Action, name: &str) -> Option<Action> {
    if root.name() == name {
        return Some(root.clone());
    }

    let mut candidates = root.accessories();
    for action in root.descendants() {
        candidates.extend(action.accessories());
        candidates.push(action);
    }

    candidates.into_iter().find(|a| a.name() == name)
}
