//! The seam to the incremental build engine.
//!
//! Rule construction never runs anything: it hands [`Rule`]s to a
//! [`BuildEngine`], which owns scheduling, caching and execution.
//! [`ActionGraph`] is the in-memory engine used by the CLI and the tests.

pub mod action;
mod graph;

use std::path::PathBuf;

use serde::Serialize;

use crate::error::Result;

pub use action::{ActionSpec, Arg, Deferred, ResolvedAction};
pub use graph::{ActionGraph, ScheduledRule};

/// How the engine treats a rule's target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleMode {
    /// Target stays in the build directory.
    #[default]
    Standard,
    /// Target is copied back into the source tree.
    Promote,
}

/// A registered build step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    /// Directory the rule belongs to.
    pub dir: PathBuf,
    pub action: ActionSpec,
    pub target: PathBuf,
    pub mode: RuleMode,
}

/// Registers build rules.
///
/// Implementations must accept registrations from several threads at once.
pub trait BuildEngine: Send + Sync {
    /// # Errors
    /// Implementations may reject a rule, e.g. when another rule already
    /// produces the same target.
    fn add_rule(&self, rule: Rule) -> Result<()>;
}
